use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Severity of a classified signal. Each tier maps to one front-end colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorTier {
    Neutral,
    Buy,
    StrongBuy,
    Sell,
    StrongSell,
}

impl ColorTier {
    /// Colour name the front-end renders this tier with.
    pub fn color(&self) -> &'static str {
        match self {
            ColorTier::Neutral => "gray",
            ColorTier::Buy => "lightgreen",
            ColorTier::StrongBuy => "darkgreen",
            ColorTier::Sell => "lightred",
            ColorTier::StrongSell => "darkred",
        }
    }

    /// Default display text for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            ColorTier::Neutral => "Neutral",
            ColorTier::Buy => "Buy",
            ColorTier::StrongBuy => "Strong Buy",
            ColorTier::Sell => "Sell",
            ColorTier::StrongSell => "Strong Sell",
        }
    }
}

/// Classification attached to an indicator reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalLabel {
    pub tier: ColorTier,
    pub color: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SignalLabel {
    pub fn new(tier: ColorTier, text: impl Into<String>, note: Option<String>) -> Self {
        Self {
            tier,
            color: tier.color(),
            text: text.into(),
            note,
        }
    }

    /// Label using the tier's default text and no note.
    pub fn from_tier(tier: ColorTier) -> Self {
        Self::new(tier, tier.label(), None)
    }

    pub fn neutral() -> Self {
        Self::from_tier(ColorTier::Neutral)
    }
}

/// Raw OHLCV column reported alongside the indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// One entry of the technical section of a report. Each variant carries the
/// raw reading(s) it was classified from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TechnicalSignal {
    Date {
        value: NaiveDate,
        label: SignalLabel,
    },
    Price {
        field: PriceField,
        value: f64,
        label: SignalLabel,
    },
    Rsi {
        value: f64,
        label: SignalLabel,
    },
    Adx {
        value: f64,
        label: SignalLabel,
    },
    /// Short-term crossover of MA7 against MA13.
    MovingAverageCross {
        close: f64,
        ma7: f64,
        ma13: f64,
        label: SignalLabel,
    },
    /// Close against the long-term MA100 / MA200 pair.
    LongTermTrend {
        close: f64,
        ma100: f64,
        ma200: f64,
        label: SignalLabel,
    },
    MacdCrossover {
        macd: f64,
        signal: f64,
        label: SignalLabel,
    },
}

impl TechnicalSignal {
    /// Display key the front-end shows for this entry.
    pub fn key(&self) -> &'static str {
        match self {
            TechnicalSignal::Date { .. } => "Date",
            TechnicalSignal::Price { field, .. } => match field {
                PriceField::Open => "Open",
                PriceField::High => "High",
                PriceField::Low => "Low",
                PriceField::Close => "Close",
                PriceField::Volume => "Volume",
            },
            TechnicalSignal::Rsi { .. } => "RSI",
            TechnicalSignal::Adx { .. } => "ADX",
            TechnicalSignal::MovingAverageCross { .. } => "Price/MA7/MA13",
            TechnicalSignal::LongTermTrend { .. } => "Price/MA100/MA200",
            TechnicalSignal::MacdCrossover { .. } => "MACD/Signal",
        }
    }

    pub fn label(&self) -> &SignalLabel {
        match self {
            TechnicalSignal::Date { label, .. }
            | TechnicalSignal::Price { label, .. }
            | TechnicalSignal::Rsi { label, .. }
            | TechnicalSignal::Adx { label, .. }
            | TechnicalSignal::MovingAverageCross { label, .. }
            | TechnicalSignal::LongTermTrend { label, .. }
            | TechnicalSignal::MacdCrossover { label, .. } => label,
        }
    }
}
