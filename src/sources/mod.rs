pub mod yahoo;

pub use yahoo::{SearchQuery, YahooEndpoints, YahooFinanceClient};
