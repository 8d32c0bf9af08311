use crate::domain::time::{convert_to_zone, is_within_session, recent_slice};
use crate::domain::types::{CalendarPeriod, Candle, Interval, PeriodSpec, TimeZoneId};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const STANDARD_INTERVAL_WINDOW: usize = 100;

/// Maps a `PeriodSpec` to the candle filter it implies, and separately to
/// the `(interval, limit)` the strategy layer should fetch to satisfy it.
pub struct PeriodResolver;

impl PeriodResolver {
    /// Filters `candles` down to the window implied by `spec`, evaluated
    /// against `now` in `zone`. Preserves ascending order.
    pub fn resolve(
        candles: &[Candle],
        spec: &PeriodSpec,
        zone: TimeZoneId,
        now: DateTime<Utc>,
    ) -> Vec<Candle> {
        match spec {
            PeriodSpec::Named(calendar) => Self::filter_calendar(candles, *calendar, zone, now),
            PeriodSpec::Standard(_) => recent_slice(candles, STANDARD_INTERVAL_WINDOW).to_vec(),
            PeriodSpec::Custom {
                start_time,
                end_time,
            } => candles
                .iter()
                .filter(|c| c.open_time >= *start_time && c.open_time <= *end_time)
                .cloned()
                .collect(),
            PeriodSpec::Rolling { periods, .. } => recent_slice(candles, *periods).to_vec(),
            PeriodSpec::Session(session) => candles
                .iter()
                .filter(|c| is_within_session(c.open_time, session))
                .cloned()
                .collect(),
        }
    }

    fn filter_calendar(
        candles: &[Candle],
        calendar: CalendarPeriod,
        zone: TimeZoneId,
        now: DateTime<Utc>,
    ) -> Vec<Candle> {
        let (start, end) = Self::calendar_bounds(calendar, zone, now);
        candles
            .iter()
            .filter(|c| {
                c.open_time >= start
                    && match end {
                        Some(end) => c.open_time <= end,
                        None => true,
                    }
            })
            .cloned()
            .collect()
    }

    /// Returns `(start, Some(end))` for bounded windows (`prev_*`) or
    /// `(start, None)` for open-ended ones (`current_*`), per §4.6.
    fn calendar_bounds(
        calendar: CalendarPeriod,
        zone: TimeZoneId,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        let local_now = convert_to_zone(now, zone);
        let offset = *local_now.offset();
        let today = local_now.date_naive();

        let to_utc = |date: NaiveDate, time: NaiveTime| -> DateTime<Utc> {
            let naive = date.and_time(time);
            offset
                .from_local_datetime(&naive)
                .single()
                .unwrap_or_else(|| {
                    chrono::TimeZone::from_utc_datetime(&Utc, &naive)
                })
                .with_timezone(&Utc)
        };

        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let last_instant = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap();

        match calendar {
            CalendarPeriod::PrevDay => {
                let yesterday = today - Duration::days(1);
                (
                    to_utc(yesterday, midnight),
                    Some(to_utc(yesterday, last_instant)),
                )
            }
            CalendarPeriod::CurrentDay => (to_utc(today, midnight), None),
            CalendarPeriod::PrevWeek => {
                let days_since_monday = today.weekday().num_days_from_monday() as i64;
                let this_monday = today - Duration::days(days_since_monday);
                let prev_monday = this_monday - Duration::days(7);
                let end = to_utc(this_monday, midnight) - Duration::milliseconds(1);
                (to_utc(prev_monday, midnight), Some(end))
            }
            CalendarPeriod::CurrentWeek => {
                let days_since_monday = today.weekday().num_days_from_monday() as i64;
                let this_monday = today - Duration::days(days_since_monday);
                (to_utc(this_monday, midnight), None)
            }
            CalendarPeriod::PrevMonth => {
                let (py, pm) = Self::prev_month(today.year(), today.month());
                let this_month_first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                    .expect("valid calendar month");
                let prev_month_first =
                    NaiveDate::from_ymd_opt(py, pm, 1).expect("valid calendar month");
                let prev_month_last = this_month_first - Duration::days(1);
                (
                    to_utc(prev_month_first, midnight),
                    Some(to_utc(prev_month_last, last_instant)),
                )
            }
            CalendarPeriod::CurrentMonth => {
                let this_month_first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                    .expect("valid calendar month");
                (to_utc(this_month_first, midnight), None)
            }
        }
    }

    fn prev_month(year: i32, month: u32) -> (i32, u32) {
        if month == 1 { (year - 1, 12) } else { (year, month - 1) }
    }

    /// Recommended `(interval, limit)` to fetch in order to satisfy `spec`.
    pub fn recommended_fetch_params(spec: &PeriodSpec) -> (Interval, usize) {
        match spec {
            PeriodSpec::Named(CalendarPeriod::PrevDay | CalendarPeriod::CurrentDay) => {
                (Interval::OneHour, 48)
            }
            PeriodSpec::Named(CalendarPeriod::PrevWeek | CalendarPeriod::CurrentWeek) => {
                (Interval::FourHour, 84)
            }
            PeriodSpec::Named(CalendarPeriod::PrevMonth | CalendarPeriod::CurrentMonth) => {
                (Interval::OneDay, 62)
            }
            PeriodSpec::Rolling { periods, interval } => (*interval, *periods),
            PeriodSpec::Custom {
                start_time,
                end_time,
            } => {
                let hours = (*end_time - *start_time).num_minutes().max(0) as f64 / 60.0;
                let periods = (hours.ceil() as usize).clamp(1, 1000);
                (Interval::OneHour, periods)
            }
            PeriodSpec::Standard(_) | PeriodSpec::Session(_) => (Interval::OneHour, 100),
        }
    }
}
