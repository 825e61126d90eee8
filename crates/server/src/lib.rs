use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
