use crate::domain::errors::CoreError;
use crate::domain::types::{Candle, Interval, SessionSpec, TimeZoneId};
use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};

/// Static UTC offset, in seconds, for each supported zone. DST transitions
/// are not modeled — see the open question in §9; a production build must
/// substitute a real tz database (e.g. `chrono-tz`) here.
fn static_offset_seconds(zone: TimeZoneId) -> i32 {
    match zone {
        TimeZoneId::Utc => 0,
        TimeZoneId::AmericaNewYork => -5 * 3600,
        TimeZoneId::EuropeLondon => 0,
        TimeZoneId::AsiaTokyo => 9 * 3600,
    }
}

/// Translates an instant into the wall clock of the given zone using the
/// static offset table.
pub fn convert_to_zone(ts: DateTime<Utc>, zone: TimeZoneId) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(static_offset_seconds(zone))
        .expect("static offsets are always within ±23:59:59");
    ts.with_timezone(&offset)
}

/// Floors a timestamp to the preceding interval boundary.
pub fn floor_to_interval(ts: DateTime<Utc>, interval: Interval) -> DateTime<Utc> {
    let duration_ms = interval.duration_ms();
    let ts_ms = ts.timestamp_millis();
    let floored = ts_ms.div_euclid(duration_ms) * duration_ms;
    Utc.timestamp_millis_opt(floored).single().unwrap_or(ts)
}

/// Given an interval-aligned start, returns the inclusive end of that bar
/// (`start + interval − 1ms`), matching the half-open-source tolerance in §3.
pub fn ceil_to_interval_end(start: DateTime<Utc>, interval: Interval) -> DateTime<Utc> {
    start + chrono::Duration::milliseconds(interval.duration_ms() - 1)
}

/// Tests whether `ts`, converted into the session's zone, falls within
/// `[startMinutes, endMinutes]`, including the wrap-around union when the
/// session straddles midnight.
pub fn is_within_session(ts: DateTime<Utc>, session: &SessionSpec) -> bool {
    let local = convert_to_zone(ts, session.timezone);
    let current_minutes = local.hour() as u32 * 60 + local.minute() as u32;

    let start = session.start_minutes_of_day();
    let end = session.end_minutes_of_day();

    if start > end {
        current_minutes >= start || current_minutes <= end
    } else {
        current_minutes >= start && current_minutes <= end
    }
}

/// Returns the last `n` elements of `sequence`, or all of it if shorter,
/// preserving order.
pub fn recent_slice<T>(sequence: &[T], n: usize) -> &[T] {
    if sequence.len() <= n {
        sequence
    } else {
        &sequence[sequence.len() - n..]
    }
}

/// Hours in `[0,23]`, minutes in `[0,59]`.
pub fn validate_session_spec(session: &SessionSpec) -> Result<(), CoreError> {
    if session.start_hour > 23 || session.end_hour > 23 {
        return Err(CoreError::InvalidConfig {
            reason: format!(
                "session hours must be in [0,23], got start={} end={}",
                session.start_hour, session.end_hour
            ),
        });
    }
    if session.start_minute > 59 || session.end_minute > 59 {
        return Err(CoreError::InvalidConfig {
            reason: format!(
                "session minutes must be in [0,59], got start={} end={}",
                session.start_minute, session.end_minute
            ),
        });
    }
    Ok(())
}

/// Detects the candle interval by inspecting the gap between the first two
/// candles. Returns `None` if no pair exists or the gap matches nothing.
pub fn detect_interval(candles: &[Candle]) -> Option<Interval> {
    if candles.len() < 2 {
        return None;
    }
    let gap_ms = (candles[1].open_time - candles[0].open_time)
        .num_milliseconds()
        .abs();

    Interval::all()
        .iter()
        .copied()
        .min_by_key(|i| (i.duration_ms() - gap_ms).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TimeZoneId;

    #[test]
    fn test_floor_to_interval_idempotent() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 7, 30).unwrap();
        let once = floor_to_interval(ts, Interval::FiveMin);
        let twice = floor_to_interval(once, Interval::FiveMin);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_session_wraparound_includes_midnight() {
        let session = SessionSpec::new(22, 2, 0, 0, TimeZoneId::Utc);
        validate_session_spec(&session).unwrap();

        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        assert!(is_within_session(midnight, &session));

        let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert!(!is_within_session(noon, &session));

        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        assert!(is_within_session(late, &session));
    }

    #[test]
    fn test_validate_session_spec_rejects_bad_hour() {
        let session = SessionSpec::new(24, 2, 0, 0, TimeZoneId::Utc);
        assert!(validate_session_spec(&session).is_err());
    }

    #[test]
    fn test_recent_slice_shorter_than_n() {
        let v = vec![1, 2, 3];
        assert_eq!(recent_slice(&v, 10), &[1, 2, 3]);
        assert_eq!(recent_slice(&v, 2), &[2, 3]);
    }
}
