//! HTTP API handlers for codecamp-api

pub mod camps;
pub mod health;
pub mod links;
pub mod talks;

pub use camps::{create_camp, delete_camp, get_camp, get_camps, search_by_date, update_camp};
pub use health::health_routes;
pub use talks::{create_talk, delete_talk, get_talk, get_talks, update_talk};

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::repository::CampRepository;

/// JSON body extractor whose failures are reported as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose failures are reported as [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `?includeTalks=` flag shared by the camp list and search endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeTalksQuery {
    #[serde(default)]
    pub include_talks: bool,
}

/// 201 response carrying the new resource and its location
#[derive(Debug)]
pub struct Created<T> {
    pub location: String,
    pub body: T,
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::LOCATION, self.location)],
            Json(self.body),
        )
            .into_response()
    }
}

/// Commit staged changes, turning a no-effect commit into a 400
pub(crate) async fn commit(repo: &mut dyn CampRepository) -> ApiResult<()> {
    if repo.save_changes().await? {
        Ok(())
    } else {
        warn!("Commit affected no rows");
        Err(ApiError::PersistenceRejected(
            "Failed to save changes".to_string(),
        ))
    }
}
