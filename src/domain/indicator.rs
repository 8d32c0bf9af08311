use crate::domain::errors::CoreError;
use crate::domain::period_resolver::PeriodResolver;
use crate::domain::time::detect_interval;
use crate::domain::types::{Candle, HighLowResult, PeriodSpec, TimeZoneId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

/// Parameters for one high/low calculation.
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    pub symbol: String,
    pub period: PeriodSpec,
    pub use_body_high_low: bool,
    pub timezone: TimeZoneId,
}

/// Filters a candle sequence through the period resolver, enriches it with
/// body/wick fields, and scans once for the high/low extremes.
pub struct HighLowIndicator;

impl HighLowIndicator {
    pub fn calculate(
        candles: &[Candle],
        config: &IndicatorConfig,
        now: DateTime<Utc>,
    ) -> Result<HighLowResult, CoreError> {
        if candles.is_empty() {
            return Err(CoreError::InvalidCandleData {
                symbol: config.symbol.clone(),
                reason: "candle sequence is empty".to_string(),
            });
        }
        for c in candles {
            if !c.is_valid() {
                return Err(CoreError::InvalidCandleData {
                    symbol: config.symbol.clone(),
                    reason: format!(
                        "candle at {} violates OHLC invariants",
                        c.open_time
                    ),
                });
            }
        }

        let filtered =
            PeriodResolver::resolve(candles, &config.period, config.timezone, now);
        if filtered.is_empty() {
            return Err(CoreError::EmptyPeriod {
                symbol: config.symbol.clone(),
            });
        }

        let mut highest = if config.use_body_high_low {
            filtered[0].body_high()
        } else {
            filtered[0].high
        };
        let mut lowest = if config.use_body_high_low {
            filtered[0].body_low()
        } else {
            filtered[0].low
        };
        let mut high_time = filtered[0].open_time;
        let mut low_time = filtered[0].open_time;

        for candle in filtered.iter().skip(1) {
            let (candle_high, candle_low) = if config.use_body_high_low {
                (candle.body_high(), candle.body_low())
            } else {
                (candle.high, candle.low)
            };
            // Ties resolve to the first occurrence: strictly-greater/less only.
            if candle_high > highest {
                highest = candle_high;
                high_time = candle.open_time;
            }
            if candle_low < lowest {
                lowest = candle_low;
                low_time = candle.open_time;
            }
        }

        let range = highest - lowest;
        let range_percent = if lowest > Decimal::ZERO {
            (range / lowest * Decimal::from(100))
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        debug!(
            symbol = %config.symbol,
            high = %highest,
            low = %lowest,
            "high/low indicator calculated"
        );

        Ok(HighLowResult {
            symbol: config.symbol.clone(),
            interval_detected: detect_interval(&filtered),
            period: format!("{:?}", config.period),
            high: highest,
            low: lowest,
            high_time,
            low_time,
            range,
            range_percent,
            calculated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Interval;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn hourly_candle(hour: u32, high: Decimal, low: Decimal) -> Candle {
        let open_time = Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap();
        Candle {
            symbol: "EURUSD".to_string(),
            open_time,
            close_time: open_time + Duration::hours(1) - Duration::milliseconds(1),
            open: low,
            high,
            low,
            close: low,
            volume: dec!(1),
            trades: None,
        }
    }

    #[test]
    fn test_prev_day_high_low_scenario() {
        // §8 scenario 2: hourly candles spanning yesterday UTC.
        let mut candles = vec![];
        for h in 0..24u32 {
            let (high, low) = match h {
                14 => (dec!(110), dec!(100)),
                3 => (dec!(100), dec!(95)),
                _ => (dec!(105), dec!(100)),
            };
            candles.push(hourly_candle_on(9, h, high, low));
        }
        // Current day candle so prev_day filter excludes it.
        candles.push(hourly_candle_on(10, 12, dec!(500), dec!(500)));

        let config = IndicatorConfig {
            symbol: "EURUSD".to_string(),
            period: PeriodSpec::Named(crate::domain::types::CalendarPeriod::PrevDay),
            use_body_high_low: false,
            timezone: TimeZoneId::Utc,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
        let result = HighLowIndicator::calculate(&candles, &config, now).unwrap();

        assert_eq!(result.high, dec!(110));
        assert_eq!(result.low, dec!(95));
        assert_eq!(result.range, dec!(15));
        assert!((result.range_percent - 15.789_473_684).abs() < 1e-6);
    }

    fn hourly_candle_on(day: u32, hour: u32, high: Decimal, low: Decimal) -> Candle {
        let open_time = Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap();
        Candle {
            symbol: "EURUSD".to_string(),
            open_time,
            close_time: open_time + Duration::hours(1) - Duration::milliseconds(1),
            open: low,
            high,
            low,
            close: low,
            volume: dec!(1),
            trades: None,
        }
    }

    #[test]
    fn test_empty_period_is_error() {
        let candles = vec![hourly_candle(0, dec!(1), dec!(1))];
        let config = IndicatorConfig {
            symbol: "X".to_string(),
            period: PeriodSpec::Custom {
                start_time: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(2099, 1, 2, 0, 0, 0).unwrap(),
            },
            use_body_high_low: false,
            timezone: TimeZoneId::Utc,
        };
        let now = Utc::now();
        let err = HighLowIndicator::calculate(&candles, &config, now).unwrap_err();
        assert!(matches!(err, CoreError::EmptyPeriod { .. }));
    }

    #[test]
    fn test_body_high_low_collapses_doji() {
        let open_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candle = Candle {
            symbol: "X".to_string(),
            open_time,
            close_time: open_time + Duration::hours(1) - Duration::milliseconds(1),
            open: dec!(100),
            high: dec!(102),
            low: dec!(98),
            close: dec!(100),
            volume: dec!(1),
            trades: None,
        };
        let config = IndicatorConfig {
            symbol: "X".to_string(),
            period: PeriodSpec::Standard(Interval::OneHour),
            use_body_high_low: true,
            timezone: TimeZoneId::Utc,
        };
        let result = HighLowIndicator::calculate(&[candle], &config, Utc::now()).unwrap();
        assert_eq!(result.high, result.low);
        assert_eq!(result.high, dec!(100));
    }

    #[test]
    fn test_repeat_calculation_is_identical_except_timestamp() {
        let candles = vec![
            hourly_candle(0, dec!(105), dec!(100)),
            hourly_candle(1, dec!(108), dec!(101)),
        ];
        let config = IndicatorConfig {
            symbol: "EURUSD".to_string(),
            period: PeriodSpec::Standard(Interval::OneHour),
            use_body_high_low: false,
            timezone: TimeZoneId::Utc,
        };
        let first = HighLowIndicator::calculate(&candles, &config, Utc::now()).unwrap();
        let second =
            HighLowIndicator::calculate(&candles, &config, Utc::now() + Duration::seconds(5))
                .unwrap();

        assert_eq!(first.high, second.high);
        assert_eq!(first.low, second.low);
        assert_eq!(first.range, second.range);
        assert_ne!(first.calculated_at, second.calculated_at);
    }
}
