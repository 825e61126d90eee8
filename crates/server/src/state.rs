use std::sync::Arc;

use db::DBService;
use services::services::{
    completers::CompletersService,
    completion_source::{CompletionSource, SqliteCompletionSource},
    config::{Config, DataSource, DataSourceKind},
    database_validator::DatabaseValidator,
    rest_store::RestCompletionSource,
};
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub completers: CompletersService,
    /// Present only when the local SQLite store backs the leaderboard.
    pub db: Option<DBService>,
    pub data_source: DataSourceKind,
    pub leaderboard_size: usize,
}

impl AppState {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (source, db): (Arc<dyn CompletionSource>, Option<DBService>) = match &config.data_source {
            DataSource::Sqlite { database_url } => {
                let db = DBService::new(database_url).await?;
                let validation = DatabaseValidator::new(db.pool.clone()).validate().await?;
                if validation.is_ok() {
                    info!("{}", validation.summary());
                } else {
                    warn!("{}", validation.summary());
                }
                let source: Arc<dyn CompletionSource> =
                    Arc::new(SqliteCompletionSource::new(db.clone()));
                (source, Some(db))
            }
            DataSource::Rest(rest) => {
                let source = RestCompletionSource::new(rest)?;
                info!(endpoint = %source.endpoint(), "Using hosted completion source");
                let source: Arc<dyn CompletionSource> = Arc::new(source);
                (source, None)
            }
        };

        info!(
            data_source = %config.data_source.kind(),
            utc_offset = %config.utc_offset,
            leaderboard_size = config.leaderboard_size,
            "Leaderboard configured"
        );

        Ok(Self {
            completers: CompletersService::new(source, config.utc_offset),
            db,
            data_source: config.data_source.kind(),
            leaderboard_size: config.leaderboard_size,
        })
    }
}
