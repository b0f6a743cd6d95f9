use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{round2, TechnicalSignal};

/// Fundamental readings for a symbol as returned by the market-data
/// provider, before rounding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalSnapshot {
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub book_value: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub price_to_book: Option<f64>,
    pub roce: Option<f64>,
}

/// Fundamental section of a history report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub beta: Option<f64>,
    #[serde(rename = "PE")]
    pub pe: Option<f64>,
    #[serde(rename = "EPS")]
    pub eps: Option<f64>,
    #[serde(rename = "LTP")]
    pub ltp: Option<f64>,
    /// Market capitalisation in crores, thousands-separated. "0" when the
    /// provider has no reading.
    #[serde(rename = "MarketCap")]
    pub market_cap: String,
    #[serde(rename = "bookValue")]
    pub book_value: Option<f64>,
    #[serde(rename = "debtToEquity")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "priceToBook")]
    pub price_to_book: Option<f64>,
    pub roce: Option<f64>,
}

/// Rupees per crore.
const CRORE: f64 = 10_000_000.0;

impl Default for Fundamentals {
    fn default() -> Self {
        Self {
            beta: None,
            pe: None,
            eps: None,
            ltp: None,
            market_cap: "0".to_string(),
            book_value: None,
            debt_to_equity: None,
            price_to_book: None,
            roce: None,
        }
    }
}

impl Fundamentals {
    /// Round and format provider readings for the response. Zero readings
    /// are reported as absent, matching how the provider signals "unknown".
    pub fn from_snapshot(beta: Option<f64>, snapshot: &FundamentalSnapshot) -> Self {
        let present = |v: Option<f64>| v.filter(|x| x.is_finite() && *x != 0.0).map(round2);

        Self {
            beta: present(beta),
            pe: present(snapshot.trailing_pe),
            eps: present(snapshot.trailing_eps),
            ltp: present(snapshot.current_price),
            market_cap: format_thousands(
                snapshot
                    .market_cap
                    .filter(|cap| cap.is_finite() && *cap >= 0.0)
                    .map_or(0, |cap| (cap / CRORE).trunc() as u64),
            ),
            book_value: present(snapshot.book_value),
            debt_to_equity: present(snapshot.debt_to_equity),
            price_to_book: present(snapshot.price_to_book),
            roce: present(snapshot.roce),
        }
    }
}

/// Format an integer with comma thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Response of the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub technical: Vec<TechnicalSignal>,
    pub fundamentals: Fundamentals,
}

/// A single symbol search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub shortname: Option<String>,
    pub longname: Option<String>,
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub quote_type: Option<String>,
}

/// Response of the search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SymbolMatch>,
    pub company_name: String,
}
