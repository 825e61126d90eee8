//! Data-access boundary for completion records.

use async_trait::async_trait;
use db::{DBService, models::completion::CompletionRecord};
use thiserror::Error;

use super::completers::DateWindow;

#[derive(Debug, Error)]
pub enum CompletionSourceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Where completed exercise logs come from.
///
/// Implementations return every completed log inside `window` joined to its
/// route and member, with to-one joins already normalized to `Option`.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn fetch_completed(
        &self,
        window: DateWindow,
    ) -> Result<Vec<CompletionRecord>, CompletionSourceError>;
}

/// Reads completions from the local SQLite store
#[derive(Clone)]
pub struct SqliteCompletionSource {
    db: DBService,
}

impl SqliteCompletionSource {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CompletionSource for SqliteCompletionSource {
    async fn fetch_completed(
        &self,
        window: DateWindow,
    ) -> Result<Vec<CompletionRecord>, CompletionSourceError> {
        let records =
            CompletionRecord::find_completed_between(&self.db.pool, window.start, window.end)
                .await?;
        Ok(records)
    }
}
