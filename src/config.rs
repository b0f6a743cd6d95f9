use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Symbol search settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Yahoo search region.
    pub region: String,
    /// Yahoo search language.
    pub lang: String,
    /// Maximum number of quotes requested.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            region: "IN".to_string(),
            lang: "en-IN".to_string(),
            limit: 10,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Exchange name used to filter search hits (e.g. "NSE").
    pub exchange: String,
    /// Yahoo suffix for symbols on the exchange (e.g. ".NS").
    pub exchange_suffix: String,
    /// Exchange time zone as minutes east of UTC (330 for IST).
    pub exchange_utc_offset_minutes: i32,
    /// Index used as the market for beta.
    pub benchmark_symbol: String,
    /// Yahoo range for daily history.
    pub history_range: String,
    pub search: SearchConfig,
    /// Timeout for outbound HTTP calls, in seconds.
    pub http_timeout_secs: u64,
    /// Report cache TTL in seconds (0 = disabled).
    pub report_cache_ttl_secs: u64,
    /// Optional JSON file overriding the RSI/ADX threshold tables.
    pub signal_tables_path: Option<PathBuf>,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = SearchConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8000),
            exchange: env::var("EXCHANGE").unwrap_or_else(|_| "NSE".to_string()),
            exchange_suffix: env::var("EXCHANGE_SUFFIX").unwrap_or_else(|_| ".NS".to_string()),
            exchange_utc_offset_minutes: parsed("EXCHANGE_UTC_OFFSET_MINUTES", 330),
            benchmark_symbol: env::var("BENCHMARK_SYMBOL").unwrap_or_else(|_| "^NSEI".to_string()),
            history_range: env::var("HISTORY_RANGE").unwrap_or_else(|_| "1y".to_string()),
            search: SearchConfig {
                region: env::var("SEARCH_REGION").unwrap_or(defaults.region),
                lang: env::var("SEARCH_LANG").unwrap_or(defaults.lang),
                limit: parsed("SEARCH_LIMIT", defaults.limit),
            },
            http_timeout_secs: parsed("HTTP_TIMEOUT_SECS", 30),
            report_cache_ttl_secs: parsed("REPORT_CACHE_TTL_SECS", 300),
            signal_tables_path: env::var("SIGNAL_TABLES_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Yahoo symbol for `symbol` on the configured exchange. The suffix is
    /// appended unless the symbol already carries it.
    pub fn exchange_symbol(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_uppercase();
        let suffix = self.exchange_suffix.to_uppercase();
        if suffix.is_empty() || symbol.ends_with(&suffix) {
            symbol
        } else {
            format!("{}{}", symbol, suffix)
        }
    }

    /// Trading date on the exchange at `now`. An offset outside ±24h is
    /// treated as UTC.
    pub fn exchange_date(&self, now: DateTime<Utc>) -> NaiveDate {
        match FixedOffset::east_opt(self.exchange_utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }

    pub fn exchange_today(&self) -> NaiveDate {
        self.exchange_date(Utc::now())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// `None` when the report cache is disabled.
    pub fn report_cache_ttl(&self) -> Option<Duration> {
        (self.report_cache_ttl_secs > 0).then(|| Duration::from_secs(self.report_cache_ttl_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8000,
            exchange: "NSE".to_string(),
            exchange_suffix: ".NS".to_string(),
            exchange_utc_offset_minutes: 330,
            benchmark_symbol: "^NSEI".to_string(),
            history_range: "1y".to_string(),
            search: SearchConfig::default(),
            http_timeout_secs: 10,
            report_cache_ttl_secs: 300,
            signal_tables_path: None,
        }
    }

    // =========================================================================
    // exchange_symbol Tests
    // =========================================================================

    #[test]
    fn test_exchange_symbol_appends_suffix() {
        assert_eq!(config().exchange_symbol("tcs"), "TCS.NS");
        assert_eq!(config().exchange_symbol(" INFY "), "INFY.NS");
    }

    #[test]
    fn test_exchange_symbol_keeps_existing_suffix() {
        assert_eq!(config().exchange_symbol("TCS.NS"), "TCS.NS");
        assert_eq!(config().exchange_symbol("tcs.ns"), "TCS.NS");
    }

    #[test]
    fn test_exchange_symbol_without_suffix() {
        let config = Config {
            exchange_suffix: String::new(),
            ..config()
        };
        assert_eq!(config.exchange_symbol("aapl"), "AAPL");
    }

    // =========================================================================
    // Exchange date Tests
    // =========================================================================

    #[test]
    fn test_exchange_date_rolls_over_before_utc() {
        // 20:00 UTC is 01:30 the next day in IST.
        let now = "2025-01-01T20:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            config().exchange_date(now),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );

        let morning = "2025-01-01T03:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            config().exchange_date(morning),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_exchange_date_west_of_utc() {
        let new_york = Config {
            exchange_utc_offset_minutes: -300,
            ..config()
        };
        let now = "2025-01-02T02:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            new_york.exchange_date(now),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_exchange_date_invalid_offset_is_utc() {
        let broken = Config {
            exchange_utc_offset_minutes: 100_000,
            ..config()
        };
        let now = "2025-01-01T20:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            broken.exchange_date(now),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    // =========================================================================
    // Duration helpers
    // =========================================================================

    #[test]
    fn test_report_cache_ttl() {
        assert_eq!(config().report_cache_ttl(), Some(Duration::from_secs(300)));
        let disabled = Config {
            report_cache_ttl_secs: 0,
            ..config()
        };
        assert_eq!(disabled.report_cache_ttl(), None);
    }

    #[test]
    fn test_http_timeout() {
        assert_eq!(config().http_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_search_defaults() {
        let search = SearchConfig::default();
        assert_eq!(search.region, "IN");
        assert_eq!(search.lang, "en-IN");
        assert_eq!(search.limit, 10);
    }
}
