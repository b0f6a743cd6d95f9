//! Technical and fundamental report for one symbol.

use axum::{extract::State, routing::post, Form, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::types::HistoryReport;
use crate::AppState;

/// Form body of `POST /history`.
#[derive(Debug, Deserialize)]
pub struct HistoryForm {
    /// Exchange symbol, with or without the exchange suffix.
    pub symbol: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/history", post(get_history))
}

async fn get_history(
    State(state): State<AppState>,
    Form(form): Form<HistoryForm>,
) -> Result<Json<Arc<HistoryReport>>, AppError> {
    debug!(symbol = %form.symbol, "History requested");
    let report = state.analysis.history(&form.symbol).await?;
    Ok(Json(report))
}
