//! Signal classifier: raw indicator readings to [`SignalLabel`]s.
//!
//! Single-value indicators (RSI, ADX) are classified through a
//! [`ThresholdTable`], an ordered list of bands that can be loaded from JSON.
//! Indicator pairs (MACD/Signal, MA7/MA13, close vs MA100/MA200) use fixed
//! comparison rules.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ColorTier, SignalLabel};

#[derive(Error, Debug)]
pub enum TableError {
    #[error("threshold table is empty")]
    Empty,

    #[error("band {index} upper bound is not above the previous band")]
    Unordered { index: usize },

    #[error("only the last band may be unbounded (band {index})")]
    UnboundedBeforeEnd { index: usize },

    #[error("last band must be unbounded so every reading is classified")]
    MissingCatchAll,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Readings strictly below `below` fall in this band; `None` catches the
/// rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub below: Option<f64>,
    pub tier: ColorTier,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ThresholdBand {
    fn new(below: Option<f64>, tier: ColorTier, label: &str, note: Option<&str>) -> Self {
        Self {
            below,
            tier,
            label: label.to_string(),
            note: note.map(str::to_string),
        }
    }
}

/// Ascending bands with a final catch-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ThresholdBand>", into = "Vec<ThresholdBand>")]
pub struct ThresholdTable {
    bands: Vec<ThresholdBand>,
}

impl TryFrom<Vec<ThresholdBand>> for ThresholdTable {
    type Error = TableError;

    fn try_from(bands: Vec<ThresholdBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<ThresholdTable> for Vec<ThresholdBand> {
    fn from(table: ThresholdTable) -> Self {
        table.bands
    }
}

impl ThresholdTable {
    pub fn new(bands: Vec<ThresholdBand>) -> Result<Self, TableError> {
        let last = bands.len().checked_sub(1).ok_or(TableError::Empty)?;

        let mut floor = f64::NEG_INFINITY;
        for (index, band) in bands.iter().enumerate() {
            match band.below {
                Some(_) if index == last => return Err(TableError::MissingCatchAll),
                Some(bound) => {
                    if bound.is_nan() || bound <= floor {
                        return Err(TableError::Unordered { index });
                    }
                    floor = bound;
                }
                None if index != last => return Err(TableError::UnboundedBeforeEnd { index }),
                None => {}
            }
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }

    /// Label for `value`. NaN falls through to the catch-all band.
    pub fn classify(&self, value: f64) -> SignalLabel {
        // Tables always end in an unbounded band.
        let catch_all = self.bands.len() - 1;
        let band = self.bands[..catch_all]
            .iter()
            .find(|band| band.below.is_some_and(|bound| value < bound))
            .unwrap_or(&self.bands[catch_all]);

        SignalLabel::new(band.tier, band.label.clone(), band.note.clone())
    }
}

/// The full classification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTables {
    pub rsi: ThresholdTable,
    pub adx: ThresholdTable,
}

impl Default for SignalTables {
    fn default() -> Self {
        Self::canonical()
    }
}

impl SignalTables {
    /// The granular RSI / ADX bands.
    pub fn canonical() -> Self {
        use ColorTier::*;

        let rsi = vec![
            ThresholdBand::new(Some(30.0), StrongSell, "Strong Sell", None),
            ThresholdBand::new(Some(40.0), Sell, "Sell", None),
            ThresholdBand::new(Some(60.0), Buy, "Buy", None),
            ThresholdBand::new(Some(70.0), StrongBuy, "Strong Buy", None),
            ThresholdBand::new(None, Sell, "Sell", Some("apply stop loss")),
        ];
        let adx = vec![
            ThresholdBand::new(Some(20.0), Sell, "Sell", Some("weak trend")),
            ThresholdBand::new(Some(25.0), Buy, "Buy", Some("small size")),
            ThresholdBand::new(Some(40.0), Buy, "Buy", None),
            ThresholdBand::new(Some(50.0), StrongBuy, "Strong Buy", None),
            ThresholdBand::new(None, Neutral, "Strong Trend", Some("caution")),
        ];

        Self {
            rsi: ThresholdTable { bands: rsi },
            adx: ThresholdTable { bands: adx },
        }
    }

    /// Load tables from a JSON file of the form
    /// `{"rsi": [{"below": 30, "tier": "strong-sell", "label": "..."}, ...], "adx": [...]}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn classify_rsi(&self, rsi: f64) -> SignalLabel {
        self.rsi.classify(rsi)
    }

    pub fn classify_adx(&self, adx: f64) -> SignalLabel {
        self.adx.classify(adx)
    }
}

/// MACD line against its signal line.
pub fn classify_macd(macd: f64, signal: f64) -> SignalLabel {
    let tier = if macd > signal {
        if macd > 0.0 && signal > 0.0 {
            ColorTier::StrongBuy
        } else {
            ColorTier::Buy
        }
    } else if macd < signal {
        if macd < 0.0 && signal < 0.0 {
            ColorTier::StrongSell
        } else {
            ColorTier::Sell
        }
    } else {
        ColorTier::Neutral
    };
    SignalLabel::from_tier(tier)
}

/// Short-term average crossover: MA13 above MA7 is bearish.
pub fn classify_ma_cross(ma7: f64, ma13: f64) -> SignalLabel {
    if ma13 > ma7 {
        SignalLabel::from_tier(ColorTier::Sell)
    } else {
        SignalLabel::from_tier(ColorTier::Buy)
    }
}

/// Close against the long-term averages.
pub fn classify_long_term(close: f64, ma100: f64, ma200: f64) -> SignalLabel {
    if close > ma100 && close > ma200 {
        SignalLabel::from_tier(ColorTier::StrongBuy)
    } else if ma200 > ma100 {
        SignalLabel::from_tier(ColorTier::Buy)
    } else {
        SignalLabel::from_tier(ColorTier::Sell)
    }
}
