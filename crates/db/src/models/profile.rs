use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Gym member
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Profile>(
            r#"INSERT INTO profiles (id, name)
               VALUES ($1, $2)
               RETURNING id, name, created_at"#,
        )
        .bind(id)
        .bind(name.trim())
        .fetch_one(pool)
        .await
    }
}
