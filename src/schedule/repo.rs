use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};

use crate::activity::repo::Activity;
use crate::error::ApiError;
use crate::pagination::{Pagination, PaginationMeta};
use crate::schedule::dto::{ScheduleWithActivities, SchedulePatch};

/// Schedule record. `id_owner` is stamped at creation and never changes;
/// every lookup filters by it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub id_owner: i64,
}

impl Schedule {
    /// All schedules belonging to the owner, unpaginated.
    pub async fn list_by_owner(db: &PgPool, id_owner: i64) -> Result<Vec<Schedule>, ApiError> {
        sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, name, url, id_owner
            FROM schedule
            WHERE id_owner = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id_owner)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, %id_owner, "list schedules failed");
            ApiError::ScheduleQuery(id_owner)
        })
    }

    /// Authorize-and-load: resolves a schedule by (owner, id). A schedule
    /// that exists but belongs to someone else yields the same not-found
    /// error as a missing row.
    pub async fn find_owned(db: &PgPool, id_owner: i64, id: i64) -> Result<Schedule, ApiError> {
        sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, name, url, id_owner
            FROM schedule
            WHERE id = $1 AND id_owner = $2
            "#,
        )
        .bind(id)
        .bind(id_owner)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::ScheduleNotFound(id))
    }

    /// Resolves a schedule and one page of its activities, with totals
    /// computed from a count query scoped to the same schedule.
    pub async fn find_owned_with_activities(
        db: &PgPool,
        id_owner: i64,
        id: i64,
        pagination: Pagination,
    ) -> Result<ScheduleWithActivities, ApiError> {
        let schedule = Schedule::find_owned(db, id_owner, id).await?;
        let total_items = Activity::count_for_schedule(db, schedule.id).await?;
        let activities = Activity::list_page(db, schedule.id, pagination).await?;
        Ok(ScheduleWithActivities {
            schedule,
            activities,
            meta: PaginationMeta::new(pagination, total_items),
        })
    }

    pub async fn create(
        db: &PgPool,
        id_owner: i64,
        name: &str,
        url: &str,
    ) -> Result<Schedule, ApiError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedule (name, url, id_owner)
            VALUES ($1, $2, $3)
            RETURNING id, name, url, id_owner
            "#,
        )
        .bind(name)
        .bind(url)
        .bind(id_owner)
        .fetch_one(db)
        .await?;
        info!(schedule_id = %schedule.id, %id_owner, "schedule created");
        Ok(schedule)
    }

    /// Shallow merge: fields present in the patch overwrite, absent fields
    /// keep their stored value.
    pub fn apply(&mut self, patch: SchedulePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
    }

    pub async fn update(
        db: &PgPool,
        id_owner: i64,
        id: i64,
        patch: SchedulePatch,
    ) -> Result<Schedule, ApiError> {
        let mut schedule = Schedule::find_owned(db, id_owner, id).await?;
        schedule.apply(patch);

        let updated = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedule
            SET name = $1, url = $2
            WHERE id = $3 AND id_owner = $4
            RETURNING id, name, url, id_owner
            "#,
        )
        .bind(&schedule.name)
        .bind(&schedule.url)
        .bind(id)
        .bind(id_owner)
        .fetch_one(db)
        .await?;
        info!(schedule_id = %id, "schedule updated");
        Ok(updated)
    }

    /// Cascade delete: removes the schedule's activities first, then the
    /// schedule itself, inside one transaction. Returns the removed
    /// schedule with its pre-deletion activities for audit.
    pub async fn delete(
        db: &PgPool,
        id_owner: i64,
        id: i64,
    ) -> Result<(Schedule, Vec<Activity>), ApiError> {
        let schedule = Schedule::find_owned(db, id_owner, id).await?;
        let activities = Activity::list_for_schedule(db, schedule.id).await?;

        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM activity WHERE schedule_id = $1")
            .bind(schedule.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM schedule WHERE id = $1 AND id_owner = $2")
            .bind(schedule.id)
            .bind(id_owner)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            schedule_id = %id,
            activities = activities.len(),
            "schedule deleted with its activities"
        );
        Ok((schedule, activities))
    }
}
