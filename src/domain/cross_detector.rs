use crate::domain::time::recent_slice;
use crate::domain::types::{Candle, CrossDirection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub const DEFAULT_LOOKBACK: usize = 10;

/// Outcome of testing a candle sequence against a reference level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossOutcome {
    pub has_crossed: bool,
    pub cross_time: Option<DateTime<Utc>>,
}

/// Deterministically detects the first directional crossing of
/// `reference_level` within the most recent `lookback` candles.
pub struct CrossDetector;

impl CrossDetector {
    pub fn detect(
        candles: &[Candle],
        reference_level: Decimal,
        direction: CrossDirection,
        lookback: usize,
    ) -> CrossOutcome {
        let window = recent_slice(candles, lookback);
        if window.len() < 2 {
            return CrossOutcome {
                has_crossed: false,
                cross_time: None,
            };
        }

        for pair in window.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let crossed = match direction {
                CrossDirection::CrossOver => prev.close <= reference_level && curr.close > reference_level,
                CrossDirection::CrossUnder => prev.close >= reference_level && curr.close < reference_level,
            };
            if crossed {
                return CrossOutcome {
                    has_crossed: true,
                    cross_time: Some(curr.open_time),
                };
            }
        }

        CrossOutcome {
            has_crossed: false,
            cross_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn candle(hour: u32, close: Decimal) -> Candle {
        let open_time = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        Candle {
            symbol: "EURUSD".to_string(),
            open_time,
            close_time: open_time + Duration::hours(1) - Duration::milliseconds(1),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
            trades: None,
        }
    }

    #[test]
    fn test_trivial_two_candle_cross_under() {
        // §8 scenario 1.
        let c1 = Candle {
            symbol: "EURUSD".to_string(),
            open_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            close_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 59, 59).unwrap(),
            open: dec!(1.1000),
            high: dec!(1.1020),
            low: dec!(1.0980),
            close: dec!(1.1050),
            volume: dec!(1),
            trades: None,
        };
        let c2 = Candle {
            symbol: "EURUSD".to_string(),
            open_time: Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
            close_time: Utc.with_ymd_and_hms(2024, 1, 1, 1, 59, 59).unwrap(),
            open: dec!(1.1050),
            high: dec!(1.1060),
            low: dec!(1.0990),
            close: dec!(1.0990),
            volume: dec!(1),
            trades: None,
        };
        let outcome =
            CrossDetector::detect(&[c1, c2.clone()], dec!(1.1000), CrossDirection::CrossUnder, 10);
        assert!(outcome.has_crossed);
        assert_eq!(outcome.cross_time, Some(c2.open_time));
    }

    #[test]
    fn test_equality_at_previous_counts_as_wrong_side() {
        let c1 = candle(0, dec!(1.1000));
        let c2 = candle(1, dec!(1.0999));
        let outcome =
            CrossDetector::detect(&[c1, c2], dec!(1.1000), CrossDirection::CrossUnder, 10);
        assert!(outcome.has_crossed);
    }

    #[test]
    fn test_equality_at_current_does_not_count() {
        let c1 = candle(0, dec!(1.1010));
        let c2 = candle(1, dec!(1.1000));
        let outcome =
            CrossDetector::detect(&[c1, c2], dec!(1.1000), CrossDirection::CrossUnder, 10);
        assert!(!outcome.has_crossed);
    }

    #[test]
    fn test_fewer_than_two_candles_no_crossing() {
        let c1 = candle(0, dec!(1.1000));
        let outcome =
            CrossDetector::detect(&[c1], dec!(1.1000), CrossDirection::CrossUnder, 10);
        assert!(!outcome.has_crossed);
        assert_eq!(outcome.cross_time, None);
    }
}
