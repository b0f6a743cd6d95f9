//! tickerlens - technical indicator and fundamentals server for listed equities

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result, SeriesError};
pub use services::AnalysisService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: Arc<AnalysisService>,
}
