//! Strategy configuration parsing from environment variables: which assets
//! to watch, which period and direction define the reference level, and the
//! thresholds that gate a signal.

use crate::domain::types::{CalendarPeriod, CrossDirection, Interval, PeriodSpec, TimeZoneId};
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct StrategyEnvConfig {
    pub primary_assets: Vec<String>,
    pub period: PeriodSpec,
    pub direction: CrossDirection,
    pub use_body_high_low: bool,
    pub timezone: Option<TimeZoneId>,
    pub min_correlated_assets: usize,
    pub market_data_interval: Interval,
    pub candles_limit: usize,
}

impl StrategyEnvConfig {
    pub fn from_env() -> Result<Self> {
        let primary_assets: Vec<String> = env::var("PRIMARY_ASSETS")
            .unwrap_or_else(|_| "BTCUSDT,ETHUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let period = parse_period_spec(&env::var("PERIOD").unwrap_or_else(|_| "prev_day".to_string()))
            .context("Failed to parse PERIOD")?;

        let direction_str = env::var("DIRECTION").unwrap_or_else(|_| "cross_under".to_string());
        let direction = match direction_str.to_lowercase().as_str() {
            "cross_under" => CrossDirection::CrossUnder,
            "cross_over" => CrossDirection::CrossOver,
            other => anyhow::bail!("Invalid DIRECTION: {other}. Must be 'cross_under' or 'cross_over'"),
        };

        let use_body_high_low = env::var("USE_BODY_HIGH_LOW")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let timezone = match env::var("TIMEZONE") {
            Ok(tz) => Some(TimeZoneId::from_str(&tz).context("Failed to parse TIMEZONE")?),
            Err(_) => None,
        };

        let min_correlated_assets = env::var("MIN_CORRELATED_ASSETS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let market_data_interval = Interval::from_str(
            &env::var("MARKET_DATA_INTERVAL").unwrap_or_else(|_| "5m".to_string()),
        )
        .unwrap_or(Interval::FiveMin);

        let candles_limit = env::var("CANDLES_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        Ok(Self {
            primary_assets,
            period,
            direction,
            use_body_high_low,
            timezone,
            min_correlated_assets,
            market_data_interval,
            candles_limit,
        })
    }
}

fn parse_period_spec(raw: &str) -> Result<PeriodSpec> {
    Ok(match raw.to_lowercase().as_str() {
        "prev_day" => PeriodSpec::Named(CalendarPeriod::PrevDay),
        "prev_week" => PeriodSpec::Named(CalendarPeriod::PrevWeek),
        "prev_month" => PeriodSpec::Named(CalendarPeriod::PrevMonth),
        "current_day" => PeriodSpec::Named(CalendarPeriod::CurrentDay),
        "current_week" => PeriodSpec::Named(CalendarPeriod::CurrentWeek),
        "current_month" => PeriodSpec::Named(CalendarPeriod::CurrentMonth),
        other => match Interval::from_str(other) {
            Ok(interval) => PeriodSpec::Standard(interval),
            Err(_) => anyhow::bail!("Invalid PERIOD: {other}"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_spec_named() {
        assert_eq!(
            parse_period_spec("prev_day").unwrap(),
            PeriodSpec::Named(CalendarPeriod::PrevDay)
        );
    }

    #[test]
    fn test_parse_period_spec_standard_interval() {
        assert_eq!(
            parse_period_spec("1h").unwrap(),
            PeriodSpec::Standard(Interval::OneHour)
        );
    }
}
