use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    pagination::Pagination,
    schedule::{
        dto::{CreateScheduleRequest, PageQuery, SchedulePatch, ScheduleWithActivities},
        repo::Schedule,
    },
    state::AppState,
};

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/schedule", get(list_schedules).post(create_schedule))
        .route(
            "/schedule/:id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}

fn is_valid_url(url: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://\S+$").unwrap();
    }
    URL_RE.is_match(url)
}

fn validate_id(id: i64) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::Validation(
            "Invalid ID. It must be a positive number.".into(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.len() < 3 || name.len() > 50 {
        warn!(%name, "schedule name out of range");
        return Err(ApiError::Validation(
            "name must be between 3 and 50 characters".into(),
        ));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ApiError> {
    if !is_valid_url(url) {
        warn!(%url, "invalid schedule url");
        return Err(ApiError::Validation("url must be a valid URL".into()));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_schedules(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    let schedules = Schedule::list_by_owner(&state.db, user_id).await?;
    Ok(Json(schedules))
}

#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ScheduleWithActivities>, ApiError> {
    validate_id(id)?;
    let pagination = Pagination::new(q.page, q.page_size);
    let page = Schedule::find_owned_with_activities(&state.db, user_id, id, pagination).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload))]
pub async fn create_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    validate_name(&payload.name)?;
    validate_url(&payload.url)?;
    let schedule = Schedule::create(&state.db, user_id, &payload.name, &payload.url).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[instrument(skip(state, patch))]
pub async fn update_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(patch): Json<SchedulePatch>,
) -> Result<Json<Schedule>, ApiError> {
    validate_id(id)?;
    if let Some(name) = patch.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(url) = patch.url.as_deref() {
        validate_url(url)?;
    }
    let schedule = Schedule::update(&state.db, user_id, id, patch).await?;
    Ok(Json(schedule))
}

#[instrument(skip(state))]
pub async fn delete_schedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    validate_id(id)?;
    Schedule::delete(&state.db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(is_valid_url("http://example.com"));
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("http://with spaces.com"));
    }

    #[test]
    fn id_must_be_positive() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-5).is_err());
    }

    #[test]
    fn name_bounds_shared_by_create_and_update() {
        assert!(validate_name("My Schedule").is_ok());
        assert!(validate_name("ab").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn url_field_rejects_non_urls() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("not-a-url").is_err());
    }
}
