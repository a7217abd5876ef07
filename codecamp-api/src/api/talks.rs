//! Talk endpoints, nested under a camp
//!
//! Talks are always scoped to the camp in the path. A talk id that is not an
//! integer never matches a talk.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use codecamp_common::Talk;
use tracing::{debug, info};

use super::{commit, links, ApiJson, Created};
use crate::error::{ApiError, ApiResult};
use crate::mapping::{apply_talk_model, talk_from_model, talk_to_model};
use crate::models::TalkModel;
use crate::repository::{Entity, RepositoryError};
use crate::AppState;

fn talk_not_found() -> ApiError {
    ApiError::NotFound("Talk not found.".to_string())
}

fn parse_talk_id(id: &str) -> Option<i64> {
    id.parse().ok()
}

/// GET /api/camps/:moniker/talks
pub async fn get_talks(
    State(state): State<AppState>,
    Path(moniker): Path<String>,
) -> ApiResult<Json<Vec<TalkModel>>> {
    let repo = state.repository();
    let talks = repo.get_talks_for_camp(&moniker, true).await?;

    if talks.is_empty() {
        return Err(ApiError::NotFound("No talks by that moniker.".to_string()));
    }

    Ok(Json(talks.iter().map(talk_to_model).collect()))
}

/// GET /api/camps/:moniker/talks/:id
pub async fn get_talk(
    State(state): State<AppState>,
    Path((moniker, id)): Path<(String, String)>,
) -> ApiResult<Json<TalkModel>> {
    let talk_id = parse_talk_id(&id).ok_or_else(talk_not_found)?;

    let repo = state.repository();
    let talk = repo
        .get_talk(&moniker, talk_id, true)
        .await?
        .ok_or_else(talk_not_found)?;

    Ok(Json(talk_to_model(&talk)))
}

/// POST /api/camps/:moniker/talks
///
/// The body must name an existing speaker by `speaker.speakerId`.
pub async fn create_talk(
    State(state): State<AppState>,
    Path(moniker): Path<String>,
    ApiJson(model): ApiJson<TalkModel>,
) -> ApiResult<Created<TalkModel>> {
    model.validate().map_err(ApiError::Validation)?;

    let mut repo = state.repository();
    let camp = repo
        .get_camp(&moniker)
        .await?
        .ok_or_else(|| ApiError::validation("Camp not found."))?;

    let speaker_id = model
        .speaker
        .as_ref()
        .map(|speaker| speaker.speaker_id)
        .ok_or_else(|| ApiError::validation("SpeakerId is required"))?;
    let speaker = repo
        .get_speaker(speaker_id)
        .await?
        .ok_or_else(|| ApiError::validation("Speaker not found."))?;

    if !links::is_routable(&camp.moniker) {
        return Err(ApiError::validation("Could not use current moniker."));
    }

    let mut talk = talk_from_model(&model);
    talk.attach_camp(&camp);
    talk.set_speaker(speaker);

    let token = repo.add(talk.into());
    commit(repo.as_mut()).await?;

    let talk = repo
        .entry(token)
        .and_then(Entity::as_talk)
        .cloned()
        .ok_or_else(|| {
            RepositoryError::InvalidEntity("committed talk missing from unit of work".to_string())
        })?;
    let location = links::talk_path(&camp.moniker, talk.talk_id)
        .ok_or_else(|| ApiError::validation("Could not use current moniker."))?;

    info!("Created talk {} for camp {}", talk.talk_id, camp.moniker);
    Ok(Created {
        location,
        body: talk_to_model(&talk),
    })
}

/// PUT /api/camps/:moniker/talks/:id
///
/// A speaker that cannot be resolved leaves the current one in place.
pub async fn update_talk(
    State(state): State<AppState>,
    Path((moniker, id)): Path<(String, String)>,
    ApiJson(model): ApiJson<TalkModel>,
) -> ApiResult<Json<TalkModel>> {
    model.validate().map_err(ApiError::Validation)?;
    let talk_id = parse_talk_id(&id).ok_or_else(talk_not_found)?;

    let mut repo = state.repository();
    let mut talk: Talk = repo
        .get_talk(&moniker, talk_id, true)
        .await?
        .ok_or_else(talk_not_found)?;

    apply_talk_model(&model, &mut talk);

    if let Some(requested) = &model.speaker {
        match repo.get_speaker(requested.speaker_id).await? {
            Some(speaker) => talk.set_speaker(speaker),
            None => debug!(
                "Speaker {} not found, keeping speaker of talk {}",
                requested.speaker_id, talk_id
            ),
        }
    }

    repo.update(talk.clone().into());
    commit(repo.as_mut()).await?;

    info!("Updated talk {} for camp {}", talk_id, moniker);
    Ok(Json(talk_to_model(&talk)))
}

/// DELETE /api/camps/:moniker/talks/:id
pub async fn delete_talk(
    State(state): State<AppState>,
    Path((moniker, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let not_found = || {
        ApiError::NotFound(format!(
            "No talks exist for moniker: {} and id: {}",
            moniker, id
        ))
    };
    let talk_id = parse_talk_id(&id).ok_or_else(not_found)?;

    let mut repo = state.repository();
    let talk = repo
        .get_talk(&moniker, talk_id, false)
        .await?
        .ok_or_else(not_found)?;

    repo.delete(talk.into());
    commit(repo.as_mut()).await?;

    info!("Deleted talk {} for camp {}", talk_id, moniker);
    Ok(StatusCode::OK)
}
