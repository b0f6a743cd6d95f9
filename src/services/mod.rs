pub mod analysis;
pub mod beta;
pub mod cache;
pub mod classifier;
pub mod indicators;
pub mod report;

pub use analysis::{build_report, AnalysisService};
pub use beta::{beta_between, compute_beta, daily_returns, DailyReturn};
pub use cache::{Cache, ReportKey};
pub use classifier::{SignalTables, TableError, ThresholdBand, ThresholdTable};
pub use indicators::{compute_indicators, IndicatorEngine};
pub use report::{assemble_report, technical_signals};
