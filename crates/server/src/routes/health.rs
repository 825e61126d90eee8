use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use services::services::database_validator::{DatabaseValidator, ValidationResult};
use ts_rs::TS;

use crate::{AppState, error::ApiError, response::ApiResponse};

#[derive(Debug, Clone, Serialize, TS)]
pub struct HealthStatus {
    pub status: String,
    pub data_source: String,
    pub database: Option<ValidationResult>,
}

/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    let database = match &state.db {
        Some(db) => Some(DatabaseValidator::new(db.pool.clone()).validate().await?),
        None => None,
    };
    let status = if database.as_ref().is_none_or(ValidationResult::is_ok) {
        "ok"
    } else {
        "degraded"
    };

    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        status: status.to_string(),
        data_source: state.data_source.to_string(),
        database,
    })))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;
    use db::DBService;
    use services::services::{
        completers::CompletersService, completion_source::SqliteCompletionSource,
        config::DataSourceKind,
    };

    use super::*;

    #[tokio::test]
    async fn test_health_reports_migrated_store() {
        let db = DBService::new_in_memory().await.unwrap();
        let state = AppState {
            completers: CompletersService::new(
                Arc::new(SqliteCompletionSource::new(db.clone())),
                FixedOffset::east_opt(0).unwrap(),
            ),
            db: Some(db),
            data_source: DataSourceKind::Sqlite,
            leaderboard_size: 3,
        };

        let ResponseJson(body) = health_check(State(state)).await.unwrap();
        let health = body.into_data().unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.data_source, "sqlite");
        assert!(health.database.unwrap().missing_tables.is_empty());
    }
}
