//! Company name to exchange symbol lookup.

use axum::{extract::State, routing::post, Form, Json, Router};
use serde::Deserialize;

use crate::error::AppError;
use crate::types::SearchResponse;
use crate::AppState;

/// Form body of `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub company_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", post(search_company))
}

async fn search_company(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.analysis.search(&form.company_name).await?;
    Ok(Json(SearchResponse {
        results,
        company_name: form.company_name,
    }))
}
