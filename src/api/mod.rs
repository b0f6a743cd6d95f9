pub mod health;
pub mod history;
pub mod search;

use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(history::router())
        .merge(search::router())
}
