use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;

use crate::activity::dto::{ActivityPatch, NewActivity};
use crate::error::ApiError;
use crate::pagination::Pagination;
use crate::schedule::repo::Schedule;

/// Activity record. `id_owner` always equals the owning schedule's owner:
/// activities are only created through a schedule already resolved via
/// `Schedule::find_owned`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub id_owner: i64,
    pub schedule_id: i64,
}

impl Activity {
    /// Authorize-and-load: the triple (activity, owner, schedule) must
    /// match exactly; any mismatch yields the same not-found error.
    pub async fn find_owned(
        db: &PgPool,
        id_owner: i64,
        schedule_id: i64,
        id: i64,
    ) -> Result<Activity, ApiError> {
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, name, start_date, end_date, id_owner, schedule_id
            FROM activity
            WHERE id = $1 AND id_owner = $2 AND schedule_id = $3
            "#,
        )
        .bind(id)
        .bind(id_owner)
        .bind(schedule_id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::ActivityNotFound(id))
    }

    /// Creates a batch of activities for an owned schedule inside one
    /// transaction: either every row is persisted or none is. Results come
    /// back in input order.
    pub async fn create_many(
        db: &PgPool,
        id_owner: i64,
        schedule_id: i64,
        inputs: &[NewActivity],
    ) -> Result<Vec<Activity>, ApiError> {
        // Authorization gate: propagates ScheduleNotFound for an absent or
        // foreign schedule before anything is written.
        let schedule = Schedule::find_owned(db, id_owner, schedule_id).await?;

        let mut tx = db.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let activity = sqlx::query_as::<_, Activity>(
                r#"
                INSERT INTO activity (name, start_date, end_date, id_owner, schedule_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, start_date, end_date, id_owner, schedule_id
                "#,
            )
            .bind(&input.name)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(id_owner)
            .bind(schedule.id)
            .fetch_one(&mut *tx)
            .await?;
            created.push(activity);
        }
        tx.commit().await?;

        info!(
            count = created.len(),
            schedule_id = %schedule.id,
            "activities created"
        );
        Ok(created)
    }

    /// Single-item convenience over `create_many`, same transactional and
    /// error semantics.
    pub async fn create(
        db: &PgPool,
        id_owner: i64,
        schedule_id: i64,
        input: NewActivity,
    ) -> Result<Activity, ApiError> {
        let mut created =
            Activity::create_many(db, id_owner, schedule_id, std::slice::from_ref(&input)).await?;
        created
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("empty batch result")))
    }

    /// One page of a schedule's activities in insertion order.
    pub async fn list_page(
        db: &PgPool,
        schedule_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Activity>, ApiError> {
        let rows = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, name, start_date, end_date, id_owner, schedule_id
            FROM activity
            WHERE schedule_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(schedule_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Full activity collection of a schedule, used by the cascade delete.
    pub async fn list_for_schedule(
        db: &PgPool,
        schedule_id: i64,
    ) -> Result<Vec<Activity>, ApiError> {
        let rows = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, name, start_date, end_date, id_owner, schedule_id
            FROM activity
            WHERE schedule_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(schedule_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_schedule(db: &PgPool, schedule_id: i64) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activity WHERE schedule_id = $1")
                .bind(schedule_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    /// Shallow merge: fields present in the patch overwrite, absent fields
    /// keep their stored value.
    pub fn apply(&mut self, patch: ActivityPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
    }

    pub async fn update(
        db: &PgPool,
        id_owner: i64,
        schedule_id: i64,
        id: i64,
        patch: ActivityPatch,
    ) -> Result<Activity, ApiError> {
        let mut activity = Activity::find_owned(db, id_owner, schedule_id, id).await?;
        activity.apply(patch);

        let updated = sqlx::query_as::<_, Activity>(
            r#"
            UPDATE activity
            SET name = $1, start_date = $2, end_date = $3
            WHERE id = $4 AND id_owner = $5 AND schedule_id = $6
            RETURNING id, name, start_date, end_date, id_owner, schedule_id
            "#,
        )
        .bind(&activity.name)
        .bind(activity.start_date)
        .bind(activity.end_date)
        .bind(id)
        .bind(id_owner)
        .bind(schedule_id)
        .fetch_one(db)
        .await?;
        info!(activity_id = %id, "activity updated");
        Ok(updated)
    }

    /// Removes the activity and returns the removed record.
    pub async fn delete(
        db: &PgPool,
        id_owner: i64,
        schedule_id: i64,
        id: i64,
    ) -> Result<Activity, ApiError> {
        let activity = Activity::find_owned(db, id_owner, schedule_id, id).await?;
        sqlx::query("DELETE FROM activity WHERE id = $1 AND id_owner = $2 AND schedule_id = $3")
            .bind(id)
            .bind(id_owner)
            .bind(schedule_id)
            .execute(db)
            .await?;
        info!(activity_id = %id, "activity deleted");
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use time::macros::datetime;

    fn activity() -> Activity {
        Activity {
            id: 1,
            name: "Standup".into(),
            start_date: datetime!(2024-05-01 09:00 UTC),
            end_date: datetime!(2024-05-01 09:15 UTC),
            id_owner: 9,
            schedule_id: 4,
        }
    }

    #[test]
    fn apply_with_only_name_keeps_dates() {
        let mut a = activity();
        a.apply(ActivityPatch {
            name: Some("X".into()),
            start_date: None,
            end_date: None,
        });
        assert_eq!(a.name, "X");
        assert_eq!(a.start_date, datetime!(2024-05-01 09:00 UTC));
        assert_eq!(a.end_date, datetime!(2024-05-01 09:15 UTC));
    }

    #[test]
    fn apply_can_move_both_dates() {
        let mut a = activity();
        a.apply(ActivityPatch {
            name: None,
            start_date: Some(datetime!(2024-05-02 10:00 UTC)),
            end_date: Some(datetime!(2024-05-02 11:00 UTC)),
        });
        assert_eq!(a.name, "Standup");
        assert_eq!(a.start_date, datetime!(2024-05-02 10:00 UTC));
        assert_eq!(a.end_date, datetime!(2024-05-02 11:00 UTC));
    }

    #[test]
    fn activity_serializes_camel_case_rfc3339() {
        let json = serde_json::to_value(activity()).unwrap();
        assert_eq!(json["idOwner"], 9);
        assert_eq!(json["scheduleId"], 4);
        assert_eq!(json["startDate"], "2024-05-01T09:00:00Z");
        assert_eq!(json["endDate"], "2024-05-01T09:15:00Z");
    }

    async fn seed_user(db: &PgPool, email: &str) -> i64 {
        User::create(db, email, "digest").await.expect("create user").id
    }

    async fn seed_schedule(db: &PgPool, id_owner: i64) -> Schedule {
        Schedule::create(db, id_owner, "Test plan", "http://example.com")
            .await
            .expect("create schedule")
    }

    fn inputs(n: usize) -> Vec<NewActivity> {
        (1..=n)
            .map(|i| NewActivity {
                name: format!("Activity {i}"),
                start_date: datetime!(2024-05-01 09:00 UTC) + time::Duration::hours(i as i64),
                end_date: datetime!(2024-05-01 10:00 UTC) + time::Duration::hours(i as i64),
            })
            .collect()
    }

    #[sqlx::test]
    async fn batch_rows_are_stamped_and_ordered(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com").await;
        let s = seed_schedule(&pool, owner).await;

        let created = Activity::create_many(&pool, owner, s.id, &inputs(5))
            .await
            .expect("create batch");
        assert_eq!(created.len(), 5);
        for (i, a) in created.iter().enumerate() {
            assert_eq!(a.id_owner, owner);
            assert_eq!(a.schedule_id, s.id);
            assert_eq!(a.name, format!("Activity {}", i + 1));
        }
        assert_eq!(
            Activity::count_for_schedule(&pool, s.id).await.expect("count"),
            5
        );
    }

    #[sqlx::test]
    async fn failed_batch_leaves_no_rows(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com").await;
        let s = seed_schedule(&pool, owner).await;

        let mut batch = inputs(3);
        // Third row exceeds the VARCHAR(50) column and fails mid-batch.
        batch[2].name = "x".repeat(60);

        let err = Activity::create_many(&pool, owner, s.id, &batch).await.unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(
            Activity::count_for_schedule(&pool, s.id).await.expect("count"),
            0
        );
    }

    #[sqlx::test]
    async fn batch_requires_an_owned_schedule(pool: PgPool) {
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;
        let s = seed_schedule(&pool, alice).await;

        let err = Activity::create_many(&pool, bob, s.id, &inputs(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::ScheduleNotFound(id) if id == s.id));
        assert_eq!(
            Activity::count_for_schedule(&pool, s.id).await.expect("count"),
            0
        );
    }

    #[sqlx::test]
    async fn lookup_requires_the_exact_triple(pool: PgPool) {
        let alice = seed_user(&pool, "alice@example.com").await;
        let bob = seed_user(&pool, "bob@example.com").await;
        let s = seed_schedule(&pool, alice).await;
        let other = Schedule::create(&pool, alice, "Other plan", "http://example.com")
            .await
            .expect("create schedule");
        let a = Activity::create(&pool, alice, s.id, inputs(1).remove(0))
            .await
            .expect("create activity");

        let wrong_owner = Activity::find_owned(&pool, bob, s.id, a.id).await.unwrap_err();
        let wrong_schedule = Activity::find_owned(&pool, alice, other.id, a.id)
            .await
            .unwrap_err();
        let missing = Activity::find_owned(&pool, alice, s.id, 999_999).await.unwrap_err();

        assert!(matches!(wrong_owner, ApiError::ActivityNotFound(id) if id == a.id));
        assert!(matches!(wrong_schedule, ApiError::ActivityNotFound(id) if id == a.id));
        assert!(matches!(missing, ApiError::ActivityNotFound(999_999)));
        assert_eq!(wrong_owner.name(), missing.name());
        assert_eq!(wrong_owner.status(), missing.status());
    }

    #[sqlx::test]
    async fn update_persists_the_partial_merge(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com").await;
        let s = seed_schedule(&pool, owner).await;
        let a = Activity::create(&pool, owner, s.id, inputs(1).remove(0))
            .await
            .expect("create activity");

        let updated = Activity::update(
            &pool,
            owner,
            s.id,
            a.id,
            ActivityPatch {
                name: Some("Renamed".into()),
                start_date: None,
                end_date: None,
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.start_date, a.start_date);
        assert_eq!(updated.end_date, a.end_date);

        let reloaded = Activity::find_owned(&pool, owner, s.id, a.id)
            .await
            .expect("reload");
        assert_eq!(reloaded.name, "Renamed");
        assert_eq!(reloaded.start_date, a.start_date);
    }

    #[sqlx::test]
    async fn delete_returns_the_removed_record(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com").await;
        let s = seed_schedule(&pool, owner).await;
        let a = Activity::create(&pool, owner, s.id, inputs(1).remove(0))
            .await
            .expect("create activity");

        let removed = Activity::delete(&pool, owner, s.id, a.id).await.expect("delete");
        assert_eq!(removed.id, a.id);

        let err = Activity::find_owned(&pool, owner, s.id, a.id).await.unwrap_err();
        assert!(matches!(err, ApiError::ActivityNotFound(id) if id == a.id));
    }
}
