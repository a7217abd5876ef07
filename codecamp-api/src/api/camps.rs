//! Camp endpoints
//!
//! `/api/camps` collection, search-by-date and single-camp routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{commit, links, ApiJson, ApiQuery, Created, IncludeTalksQuery};
use crate::error::{ApiError, ApiResult};
use crate::mapping::{apply_camp_model, camp_from_model, camp_to_model};
use crate::models::{parse_event_date, CampModel};
use crate::AppState;

/// Query parameters for GET /api/camps/search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub date: Option<String>,
    #[serde(default)]
    pub include_talks: bool,
}

/// GET /api/camps
pub async fn get_camps(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IncludeTalksQuery>,
) -> ApiResult<Json<Vec<CampModel>>> {
    let repo = state.repository();
    let camps = repo.get_all_camps(query.include_talks).await?;

    Ok(Json(camps.iter().map(camp_to_model).collect()))
}

/// GET /api/camps/:moniker
pub async fn get_camp(
    State(state): State<AppState>,
    Path(moniker): Path<String>,
) -> ApiResult<Json<CampModel>> {
    let repo = state.repository();
    let camp = repo
        .get_camp(&moniker)
        .await?
        .ok_or_else(|| ApiError::NotFound("Camp not found.".to_string()))?;

    Ok(Json(camp_to_model(&camp)))
}

/// GET /api/camps/search?date=
///
/// Matches on the calendar date only. No match is a 404, and a search
/// without a date matches nothing.
pub async fn search_by_date(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<CampModel>>> {
    let Some(raw_date) = query.date.as_deref() else {
        return Err(ApiError::NotFound("No camps found.".to_string()));
    };
    let date = parse_event_date(raw_date)
        .ok_or_else(|| ApiError::validation("The date parameter must be a valid date."))?
        .date();

    let repo = state.repository();
    let camps = repo
        .get_camps_by_event_date(date, query.include_talks)
        .await?;

    if camps.is_empty() {
        debug!("No camps on {}", date);
        return Err(ApiError::NotFound(format!("No camps found on {}.", date)));
    }

    Ok(Json(camps.iter().map(camp_to_model).collect()))
}

/// POST /api/camps
pub async fn create_camp(
    State(state): State<AppState>,
    ApiJson(model): ApiJson<CampModel>,
) -> ApiResult<Created<CampModel>> {
    model.validate().map_err(ApiError::Validation)?;

    let mut repo = state.repository();
    if repo.get_camp(&model.moniker).await?.is_some() {
        return Err(ApiError::validation("Moniker in use"));
    }

    let location = links::camp_path(&model.moniker)
        .ok_or_else(|| ApiError::validation("Could not use current moniker."))?;

    let camp = camp_from_model(&model);
    repo.add(camp.clone().into());
    commit(repo.as_mut()).await?;

    info!("Created camp {}", camp.moniker);
    Ok(Created {
        location,
        body: camp_to_model(&camp),
    })
}

/// PUT /api/camps/:moniker
pub async fn update_camp(
    State(state): State<AppState>,
    Path(moniker): Path<String>,
    ApiJson(model): ApiJson<CampModel>,
) -> ApiResult<Json<CampModel>> {
    model.validate().map_err(ApiError::Validation)?;

    let mut repo = state.repository();
    let mut camp = repo
        .get_camp(&moniker)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Camp with {} does not exist.", moniker)))?;

    apply_camp_model(&model, &mut camp);
    repo.update(camp.clone().into());
    commit(repo.as_mut()).await?;

    info!("Updated camp {}", moniker);
    Ok(Json(camp_to_model(&camp)))
}

/// DELETE /api/camps/:moniker
///
/// Talks of the camp go with it.
pub async fn delete_camp(
    State(state): State<AppState>,
    Path(moniker): Path<String>,
) -> ApiResult<StatusCode> {
    let mut repo = state.repository();
    let camp = repo.get_camp(&moniker).await?.ok_or_else(|| {
        ApiError::NotFound(format!("No camps exist with {} moniker.", moniker))
    })?;

    repo.delete(camp.into());
    commit(repo.as_mut()).await?;

    info!("Deleted camp {}", moniker);
    Ok(StatusCode::OK)
}
