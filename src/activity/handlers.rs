use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    activity::{
        dto::{ActivityPatch, NewActivity},
        repo::Activity,
    },
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
};

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schedule/:id_schedule/activity",
            post(create_activity),
        )
        .route(
            "/schedule/:id_schedule/activities",
            post(create_activities),
        )
        .route(
            "/schedule/:id_schedule/activity/:id_activity",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}

fn validate_ids(ids: &[i64]) -> Result<(), ApiError> {
    if ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::Validation(
            "Invalid IDs. They must be positive numbers.".into(),
        ));
    }
    Ok(())
}

fn validate_activity_name(name: &str) -> Result<(), ApiError> {
    if name.len() < 3 || name.len() > 50 {
        warn!(%name, "activity name out of range");
        return Err(ApiError::Validation(
            "name must be between 3 and 50 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn get_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id_schedule, id_activity)): Path<(i64, i64)>,
) -> Result<Json<Activity>, ApiError> {
    validate_ids(&[id_schedule, id_activity])?;
    let activity = Activity::find_owned(&state.db, user_id, id_schedule, id_activity).await?;
    Ok(Json(activity))
}

#[instrument(skip(state, payload))]
pub async fn create_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id_schedule): Path<i64>,
    Json(payload): Json<NewActivity>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    validate_ids(&[id_schedule])?;
    validate_activity_name(&payload.name)?;
    let activity = Activity::create(&state.db, user_id, id_schedule, payload).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

#[instrument(skip(state, payload))]
pub async fn create_activities(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id_schedule): Path<i64>,
    Json(payload): Json<Vec<NewActivity>>,
) -> Result<(StatusCode, Json<Vec<Activity>>), ApiError> {
    validate_ids(&[id_schedule])?;
    if payload.is_empty() {
        return Err(ApiError::Validation("activities must be non-empty".into()));
    }
    for input in &payload {
        validate_activity_name(&input.name)?;
    }
    let activities = Activity::create_many(&state.db, user_id, id_schedule, &payload).await?;
    Ok((StatusCode::CREATED, Json(activities)))
}

#[instrument(skip(state, patch))]
pub async fn update_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id_schedule, id_activity)): Path<(i64, i64)>,
    Json(patch): Json<ActivityPatch>,
) -> Result<Json<Activity>, ApiError> {
    validate_ids(&[id_schedule, id_activity])?;
    if let Some(name) = patch.name.as_deref() {
        validate_activity_name(name)?;
    }
    let activity =
        Activity::update(&state.db, user_id, id_schedule, id_activity, patch).await?;
    Ok(Json(activity))
}

#[instrument(skip(state))]
pub async fn delete_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id_schedule, id_activity)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    validate_ids(&[id_schedule, id_activity])?;
    Activity::delete(&state.db, user_id, id_schedule, id_activity).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_all_be_positive() {
        assert!(validate_ids(&[1, 2]).is_ok());
        assert!(validate_ids(&[0, 2]).is_err());
        assert!(validate_ids(&[1, -2]).is_err());
    }

    #[test]
    fn activity_name_bounds() {
        assert!(validate_activity_name("Standup").is_ok());
        assert!(validate_activity_name("ab").is_err());
        assert!(validate_activity_name(&"x".repeat(51)).is_err());
    }
}
