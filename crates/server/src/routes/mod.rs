use axum::Router;

use crate::AppState;

pub mod completers;
pub mod health;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router(state))
        .merge(completers::router(state))
}
