//! Response assembly for the history endpoint.

use crate::services::classifier::{
    classify_long_term, classify_ma_cross, classify_macd, SignalTables,
};
use crate::types::{
    Fundamentals, HistoryReport, IndicatorRow, PriceField, SignalLabel, TechnicalSignal,
};

/// Technical entries for one row.
///
/// The row is rounded to two decimals first and classified at that
/// precision, so a MACD and signal line that display equal are reported as
/// Neutral. Indicators without enough history are left out.
pub fn technical_signals(row: &IndicatorRow, tables: &SignalTables) -> Vec<TechnicalSignal> {
    let row = row.rounded();

    let mut signals = vec![TechnicalSignal::Date {
        value: row.date,
        label: SignalLabel::neutral(),
    }];

    let prices = [
        (PriceField::Open, row.open),
        (PriceField::High, row.high),
        (PriceField::Low, row.low),
        (PriceField::Close, row.close),
        (PriceField::Volume, row.volume),
    ];
    signals.extend(prices.into_iter().map(|(field, value)| TechnicalSignal::Price {
        field,
        value,
        label: SignalLabel::neutral(),
    }));

    if let Some(rsi) = row.rsi {
        signals.push(TechnicalSignal::Rsi {
            value: rsi,
            label: tables.classify_rsi(rsi),
        });
    }
    if let Some(adx) = row.adx {
        signals.push(TechnicalSignal::Adx {
            value: adx,
            label: tables.classify_adx(adx),
        });
    }
    if let (Some(ma7), Some(ma13)) = (row.ma7, row.ma13) {
        signals.push(TechnicalSignal::MovingAverageCross {
            close: row.close,
            ma7,
            ma13,
            label: classify_ma_cross(ma7, ma13),
        });
    }
    if let (Some(ma100), Some(ma200)) = (row.ma100, row.ma200) {
        signals.push(TechnicalSignal::LongTermTrend {
            close: row.close,
            ma100,
            ma200,
            label: classify_long_term(row.close, ma100, ma200),
        });
    }
    if let (Some(macd), Some(signal)) = (row.macd, row.signal) {
        signals.push(TechnicalSignal::MacdCrossover {
            macd,
            signal,
            label: classify_macd(macd, signal),
        });
    }

    signals
}

/// Build the report from the latest indicator row. `None` for an empty
/// table.
pub fn assemble_report(
    symbol: &str,
    rows: &[IndicatorRow],
    tables: &SignalTables,
    fundamentals: Fundamentals,
) -> Option<HistoryReport> {
    let last = rows.last()?;
    Some(HistoryReport {
        symbol: symbol.to_string(),
        as_of: last.date,
        technical: technical_signals(last, tables),
        fundamentals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorTier, PricePoint};
    use chrono::NaiveDate;

    fn row() -> IndicatorRow {
        IndicatorRow::from_point(&PricePoint {
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 104.0,
            volume: 12_345.0,
        })
    }

    fn find<'a>(signals: &'a [TechnicalSignal], key: &str) -> Option<&'a TechnicalSignal> {
        signals.iter().find(|s| s.key() == key)
    }

    #[test]
    fn test_price_only_row() {
        let signals = technical_signals(&row(), &SignalTables::canonical());
        let keys: Vec<_> = signals.iter().map(TechnicalSignal::key).collect();
        assert_eq!(keys, vec!["Date", "Open", "High", "Low", "Close", "Volume"]);
        assert!(signals.iter().all(|s| s.label().tier == ColorTier::Neutral));
    }

    #[test]
    fn test_full_row() {
        let full = IndicatorRow {
            macd: Some(1.234),
            signal: Some(0.9),
            ma7: Some(103.0),
            ma13: Some(101.0),
            ma100: Some(95.0),
            ma200: Some(90.0),
            rsi: Some(45.0),
            adx: Some(22.0),
            ..row()
        };
        let signals = technical_signals(&full, &SignalTables::canonical());
        assert_eq!(signals.len(), 11);

        assert_eq!(find(&signals, "RSI").unwrap().label().tier, ColorTier::Buy);
        assert_eq!(find(&signals, "ADX").unwrap().label().note.as_deref(), Some("small size"));
        assert_eq!(find(&signals, "Price/MA7/MA13").unwrap().label().tier, ColorTier::Buy);
        assert_eq!(
            find(&signals, "Price/MA100/MA200").unwrap().label().tier,
            ColorTier::StrongBuy
        );
        match find(&signals, "MACD/Signal").unwrap() {
            TechnicalSignal::MacdCrossover { macd, signal, label } => {
                assert_eq!(*macd, 1.23);
                assert_eq!(*signal, 0.9);
                assert_eq!(label.tier, ColorTier::StrongBuy);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_macd_equal_after_rounding_is_neutral() {
        let r = IndicatorRow {
            macd: Some(0.501),
            signal: Some(0.499),
            ..row()
        };
        let signals = technical_signals(&r, &SignalTables::canonical());
        assert_eq!(find(&signals, "MACD/Signal").unwrap().label().tier, ColorTier::Neutral);
    }

    #[test]
    fn test_assemble_report_uses_last_row() {
        let mut later = row();
        later.date = NaiveDate::from_ymd_opt(2025, 2, 4).unwrap();
        let report = assemble_report(
            "TCS.NS",
            &[row(), later],
            &SignalTables::canonical(),
            Fundamentals::default(),
        )
        .unwrap();
        assert_eq!(report.symbol, "TCS.NS");
        assert_eq!(report.as_of, later.date);
    }

    #[test]
    fn test_assemble_report_empty() {
        assert!(assemble_report("X", &[], &SignalTables::canonical(), Fundamentals::default())
            .is_none());
    }
}
