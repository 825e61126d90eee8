//! Routes for the completion leaderboards shown on the home page.

use axum::{
    Router,
    extract::{FromRequestParts, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::Deserialize;
use services::services::completers::{CompleterDisplay, Leaderboard};

use crate::{AppState, error::ApiError, response::ApiResponse};

/// `?max=N`; malformed values are answered with the JSON error envelope.
#[derive(Debug, Default, Deserialize, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct LeaderboardQuery {
    pub max: Option<usize>,
}

impl LeaderboardQuery {
    fn max_count(&self, state: &AppState) -> Result<usize, ApiError> {
        match self.max {
            Some(0) => Err(ApiError::BadRequest(
                "max must be a positive integer".to_string(),
            )),
            Some(max) => Ok(max),
            None => Ok(state.leaderboard_size),
        }
    }
}

/// GET /api/completers/today
pub async fn get_today_completers(
    State(state): State<AppState>,
    query: LeaderboardQuery,
) -> Result<ResponseJson<ApiResponse<Vec<CompleterDisplay>>>, ApiError> {
    let max_count = query.max_count(&state)?;
    let completers = state.completers.top_completers_today(max_count).await;
    Ok(ResponseJson(ApiResponse::success(completers)))
}

/// GET /api/completers/week
pub async fn get_weekly_completers(
    State(state): State<AppState>,
    query: LeaderboardQuery,
) -> Result<ResponseJson<ApiResponse<Vec<CompleterDisplay>>>, ApiError> {
    let max_count = query.max_count(&state)?;
    let completers = state.completers.top_completers_this_week(max_count).await;
    Ok(ResponseJson(ApiResponse::success(completers)))
}

/// GET /api/completers
/// Today and this week together, fetched concurrently
pub async fn get_leaderboard(
    State(state): State<AppState>,
    query: LeaderboardQuery,
) -> Result<ResponseJson<ApiResponse<Leaderboard>>, ApiError> {
    let max_count = query.max_count(&state)?;
    let leaderboard = state.completers.leaderboard(max_count).await;
    Ok(ResponseJson(ApiResponse::success(leaderboard)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/completers", get(get_leaderboard))
        .route("/completers/today", get(get_today_completers))
        .route("/completers/week", get(get_weekly_completers))
}
