use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One climbing attempt logged by a member
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub profile_id: Option<Uuid>, // null once the member is removed
    pub route_id: Option<Uuid>,   // null once the route is removed
    pub progress_hold_count: i64,
    pub is_completed: bool,
    pub logged_at: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateExerciseLog {
    pub profile_id: Uuid,
    pub route_id: Uuid,
    pub progress_hold_count: i64,
    pub is_completed: bool,
    pub logged_at: NaiveDate,
}

impl ExerciseLog {
    pub async fn create(pool: &SqlitePool, data: &CreateExerciseLog) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, ExerciseLog>(
            r#"INSERT INTO exercise_logs (id, profile_id, route_id, progress_hold_count, is_completed, logged_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, profile_id, route_id, progress_hold_count, is_completed, logged_at, created_at"#,
        )
        .bind(id)
        .bind(data.profile_id)
        .bind(data.route_id)
        .bind(data.progress_hold_count)
        .bind(data.is_completed)
        .bind(data.logged_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseLog>(
            r#"SELECT id, profile_id, route_id, progress_hold_count, is_completed, logged_at, created_at
               FROM exercise_logs
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
