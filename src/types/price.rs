use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// Check the single-row invariants: finite positive prices, a consistent
    /// high/low envelope and non-negative volume.
    pub fn validate(&self) -> Result<(), SeriesError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, value) in prices {
            if !value.is_finite() {
                return Err(SeriesError::NonFinite {
                    date: self.date,
                    field,
                });
            }
            if value <= 0.0 {
                return Err(SeriesError::NonPositivePrice {
                    date: self.date,
                    field,
                    value,
                });
            }
        }

        if self.high < self.low
            || self.high < self.open.max(self.close)
            || self.low > self.open.min(self.close)
        {
            return Err(SeriesError::BrokenEnvelope { date: self.date });
        }

        if !self.volume.is_finite() {
            return Err(SeriesError::NonFinite {
                date: self.date,
                field: "volume",
            });
        }
        if self.volume < 0.0 {
            return Err(SeriesError::NegativeVolume {
                date: self.date,
                volume: self.volume,
            });
        }

        Ok(())
    }
}

/// Daily price history for one symbol, ascending by date with unique dates.
///
/// The only way to build one is [`PriceSeries::new`], so every series seen
/// by the indicator engine and the beta calculator has already passed
/// validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate `points` and wrap them as a series. Fails on the first row
    /// that breaks ordering or the per-row invariants.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (index, point) in points.iter().enumerate() {
            point.validate()?;
            if index == 0 {
                continue;
            }
            let previous = points[index - 1].date;
            if point.date == previous {
                return Err(SeriesError::DuplicateDate(point.date));
            }
            if point.date < previous {
                return Err(SeriesError::UnorderedDates {
                    index,
                    previous,
                    current: point.date,
                });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// The trailing `months` calendar months ending at the last row.
    ///
    /// The cut-off date itself is excluded, so a 12-month window over a
    /// series ending 2025-06-30 starts after 2024-06-30.
    pub fn trailing_months(&self, months: u32) -> PriceSeries {
        let Some(last) = self.points.last() else {
            return self.clone();
        };
        let Some(cutoff) = last.date.checked_sub_months(Months::new(months)) else {
            return self.clone();
        };

        let start = self.points.partition_point(|p| p.date <= cutoff);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }
}
