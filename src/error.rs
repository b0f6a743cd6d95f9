use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

/// A price series that breaks the loader contract. These are fatal for the
/// request: indicators are never computed over a malformed series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("dates out of order at row {index}: {current} follows {previous}")]
    UnorderedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("{field} is not finite on {date}")]
    NonFinite { date: NaiveDate, field: &'static str },

    #[error("{field} must be positive on {date}, got {value}")]
    NonPositivePrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("high/low do not bound open/close on {date}")]
    BrokenEnvelope { date: NaiveDate },

    #[error("negative volume {volume} on {date}")]
    NegativeVolume { date: NaiveDate, volume: f64 },
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Invalid price series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidSeries(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Reqwest(_) => StatusCode::BAD_GATEWAY,
            AppError::SerdeJson(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg)
            | AppError::ExternalApi(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
