use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete candle interval, mirroring the venue-agnostic interval table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneMin,
    ThreeMin,
    FiveMin,
    FifteenMin,
    ThirtyMin,
    OneHour,
    TwoHour,
    FourHour,
    SixHour,
    EightHour,
    TwelveHour,
    OneDay,
    ThreeDay,
    OneWeek,
    OneMonth,
}

impl Interval {
    /// Canonical duration in milliseconds. Months are nominal (30 days).
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match self {
            Interval::OneMin => MINUTE,
            Interval::ThreeMin => 3 * MINUTE,
            Interval::FiveMin => 5 * MINUTE,
            Interval::FifteenMin => 15 * MINUTE,
            Interval::ThirtyMin => 30 * MINUTE,
            Interval::OneHour => HOUR,
            Interval::TwoHour => 2 * HOUR,
            Interval::FourHour => 4 * HOUR,
            Interval::SixHour => 6 * HOUR,
            Interval::EightHour => 8 * HOUR,
            Interval::TwelveHour => 12 * HOUR,
            Interval::OneDay => DAY,
            Interval::ThreeDay => 3 * DAY,
            Interval::OneWeek => 7 * DAY,
            Interval::OneMonth => 30 * DAY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMin => "1m",
            Interval::ThreeMin => "3m",
            Interval::FiveMin => "5m",
            Interval::FifteenMin => "15m",
            Interval::ThirtyMin => "30m",
            Interval::OneHour => "1h",
            Interval::TwoHour => "2h",
            Interval::FourHour => "4h",
            Interval::SixHour => "6h",
            Interval::EightHour => "8h",
            Interval::TwelveHour => "12h",
            Interval::OneDay => "1d",
            Interval::ThreeDay => "3d",
            Interval::OneWeek => "1w",
            Interval::OneMonth => "1M",
        }
    }

    /// All intervals in ascending duration order, used by interval detection.
    pub fn all() -> &'static [Interval] {
        &[
            Interval::OneMin,
            Interval::ThreeMin,
            Interval::FiveMin,
            Interval::FifteenMin,
            Interval::ThirtyMin,
            Interval::OneHour,
            Interval::TwoHour,
            Interval::FourHour,
            Interval::SixHour,
            Interval::EightHour,
            Interval::TwelveHour,
            Interval::OneDay,
            Interval::ThreeDay,
            Interval::OneWeek,
            Interval::OneMonth,
        ]
    }
}

impl FromStr for Interval {
    type Err = std::convert::Infallible;

    /// Unknown interval strings default to `1m`, per the provider contract.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "1m" => Interval::OneMin,
            "3m" => Interval::ThreeMin,
            "5m" => Interval::FiveMin,
            "15m" => Interval::FifteenMin,
            "30m" => Interval::ThirtyMin,
            "1h" => Interval::OneHour,
            "2h" => Interval::TwoHour,
            "4h" => Interval::FourHour,
            "6h" => Interval::SixHour,
            "8h" => Interval::EightHour,
            "12h" => Interval::TwelveHour,
            "1d" => Interval::OneDay,
            "3d" => Interval::ThreeDay,
            "1w" => Interval::OneWeek,
            "1M" => Interval::OneMonth,
            _ => Interval::OneMin,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported IANA-ish timezone identifiers. The offset table backing these
/// is static (see `domain::time`); DST transitions are out of scope (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeZoneId {
    Utc,
    AmericaNewYork,
    EuropeLondon,
    AsiaTokyo,
}

impl Default for TimeZoneId {
    fn default() -> Self {
        TimeZoneId::AmericaNewYork
    }
}

impl FromStr for TimeZoneId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UTC" => Ok(TimeZoneId::Utc),
            "America/New_York" => Ok(TimeZoneId::AmericaNewYork),
            "Europe/London" => Ok(TimeZoneId::EuropeLondon),
            "Asia/Tokyo" => Ok(TimeZoneId::AsiaTokyo),
            other => Err(anyhow::anyhow!("Unsupported timezone: '{}'", other)),
        }
    }
}

/// A named calendar window, resolved relative to an effective timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarPeriod {
    PrevDay,
    PrevWeek,
    PrevMonth,
    CurrentDay,
    CurrentWeek,
    CurrentMonth,
}

/// An intraday trading session window, possibly straddling midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub start_hour: u32,
    pub end_hour: u32,
    pub start_minute: u32,
    pub end_minute: u32,
    pub timezone: TimeZoneId,
}

impl SessionSpec {
    pub fn new(
        start_hour: u32,
        end_hour: u32,
        start_minute: u32,
        end_minute: u32,
        timezone: TimeZoneId,
    ) -> Self {
        Self {
            start_hour,
            end_hour,
            start_minute,
            end_minute,
            timezone,
        }
    }

    pub fn start_minutes_of_day(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    pub fn end_minutes_of_day(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }
}

/// Tagged variant over every way a reference window can be described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodSpec {
    Named(CalendarPeriod),
    Standard(Interval),
    Custom {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    Rolling {
        periods: usize,
        interval: Interval,
    },
    Session(SessionSpec),
}

/// Immutable OHLCV bar for a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trades: Option<u64>,
}

impl Candle {
    /// `low ≤ min(open, close) ≤ max(open, close) ≤ high` and `openTime < closeTime`.
    pub fn is_valid(&self) -> bool {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        self.low <= body_low && body_high <= self.high && self.open_time < self.close_time
    }

    pub fn body_high(&self) -> Decimal {
        self.open.max(self.close)
    }

    pub fn body_low(&self) -> Decimal {
        self.open.min(self.close)
    }

    pub fn upper_wick(&self) -> Decimal {
        self.high - self.body_high()
    }

    pub fn lower_wick(&self) -> Decimal {
        self.body_low() - self.low
    }

    pub fn is_green(&self) -> bool {
        self.close > self.open
    }
}

/// A point-in-time snapshot of an instrument's price and volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
    pub change_24h: Option<Decimal>,
    pub change_percent_24h: Option<Decimal>,
}

/// Aggregate 24-hour statistics for an instrument. Fields a venue does not
/// provide are zero-filled rather than left absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker24h {
    pub symbol: String,
    pub last: Decimal,
    pub base_volume: Decimal,
    pub quote_volume: Decimal,
    pub change: Decimal,
    pub percentage: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub vwap: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Result of the high/low indicator over a resolved period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighLowResult {
    pub symbol: String,
    pub interval_detected: Option<Interval>,
    pub period: String,
    pub high: Decimal,
    pub low: Decimal,
    pub high_time: DateTime<Utc>,
    pub low_time: DateTime<Utc>,
    pub range: Decimal,
    pub range_percent: f64,
    pub calculated_at: DateTime<Utc>,
}

/// Directional traversal of a reference price level by consecutive closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossDirection {
    CrossOver,
    CrossUnder,
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossDirection::CrossOver => write!(f, "CROSS_OVER"),
            CrossDirection::CrossUnder => write!(f, "CROSS_UNDER"),
        }
    }
}

/// Outcome of testing one instrument's recent candles against its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCondition {
    pub symbol: String,
    pub has_crossed: bool,
    pub cross_direction: Option<CrossDirection>,
    pub current_price: Decimal,
    pub reference_level: Decimal,
    pub cross_time: Option<DateTime<Utc>>,
}

/// A fired correlation-crack pattern, ready for delivery to a notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub trigger_asset: String,
    pub direction: CrossDirection,
    pub correlated_assets: Vec<String>,
    pub reference_level: Decimal,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub per_asset_conditions: Vec<AssetCondition>,
}
