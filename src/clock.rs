use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};

/// Local hour at which deferred reminders become deliverable again.
pub const MORNING_HOUR: u32 = 9;

const WINDOW_OPEN: (u32, u32) = (9, 0);
const WINDOW_CLOSE: (u32, u32) = (21, 0);

/// Floor for rescheduling delays. Guards against a near-immediate fire
/// loop when local time sits exactly on the morning boundary.
const MIN_RESCHEDULE_DELAY: std::time::Duration = std::time::Duration::from_secs(60);

/// Source of the current instant. Injected so scheduler logic can run
/// against a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn fixed_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("Zero offset is always valid."))
}

/// Wall-clock time of day in the user's fixed-offset zone.
pub fn local_time_of_day(now_utc: DateTime<Utc>, offset_minutes: i32) -> NaiveTime {
    now_utc.with_timezone(&fixed_offset(offset_minutes)).time()
}

/// True when `time` lies within [09:00, 21:00], both bounds inclusive.
pub fn allowed_window_contains(time: NaiveTime) -> bool {
    let open = NaiveTime::from_hms_opt(WINDOW_OPEN.0, WINDOW_OPEN.1, 0).expect("Valid time.");
    let close = NaiveTime::from_hms_opt(WINDOW_CLOSE.0, WINDOW_CLOSE.1, 0).expect("Valid time.");
    time >= open && time <= close
}

/// Delay until the next local occurrence of `morning_hour`:00.
///
/// Inclusive-forward at the boundary: at exactly `morning_hour`:00 local
/// the target is the next calendar day. Never returns less than 60 seconds.
pub fn delay_to_next_morning(
    now_utc: DateTime<Utc>,
    offset_minutes: i32,
    morning_hour: u32,
) -> std::time::Duration {
    let local = now_utc.with_timezone(&fixed_offset(offset_minutes));
    let morning = NaiveTime::from_hms_opt(morning_hour, 0, 0).expect("Hour is in range.");

    let today = local.date_naive();
    let target_date = if local.time() >= morning {
        today
            .checked_add_signed(TimeDelta::days(1))
            .expect("Not realistic to overflow")
    } else {
        today
    };

    let target_datetime = target_date.and_time(morning);
    let delay = target_datetime - local.naive_local();

    delay.to_std().unwrap_or_default().max(MIN_RESCHEDULE_DELAY)
}

#[cfg(test)]
pub struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, Timelike};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    fn utc(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
        let naive = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(hh, mm, ss).unwrap(),
        );
        DateTime::from_naive_utc_and_offset(naive, Utc)
    }

    #[test]
    fn local_time_respects_positive_offset() {
        let now = utc(2025, 5, 31, 6, 0, 0);
        assert_eq!(
            local_time_of_day(now, 180),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn local_time_respects_negative_offset() {
        let now = utc(2025, 5, 31, 6, 0, 0);
        assert_eq!(
            local_time_of_day(now, -390),
            NaiveTime::from_hms_opt(23, 30, 0).unwrap()
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(allowed_window_contains(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(allowed_window_contains(NaiveTime::from_hms_opt(21, 0, 0).unwrap()));
        assert!(!allowed_window_contains(NaiveTime::from_hms_opt(8, 59, 59).unwrap()));
        assert!(!allowed_window_contains(NaiveTime::from_hms_opt(21, 0, 1).unwrap()));
    }

    #[test]
    fn before_morning_targets_same_day() {
        let now = utc(2025, 5, 31, 8, 0, 0);
        let delay = delay_to_next_morning(now, 0, MORNING_HOUR);
        assert_eq!(delay.as_secs(), 3600);
    }

    #[test]
    fn exactly_at_morning_targets_next_day() {
        let now = utc(2025, 5, 31, 9, 0, 0);
        let delay = delay_to_next_morning(now, 0, MORNING_HOUR);
        assert_eq!(delay.as_secs(), 24 * 3600);
    }

    #[test]
    fn late_evening_targets_next_morning() {
        let now = utc(2025, 5, 31, 23, 30, 0);
        let delay = delay_to_next_morning(now, 0, MORNING_HOUR);
        assert_eq!(delay.as_secs(), 9 * 3600 + 1800);
    }

    #[test]
    fn offset_shifts_the_target() {
        // 06:00 UTC at UTC+3 is 09:00 local, so the next morning is a day away.
        let now = utc(2025, 5, 31, 6, 0, 0);
        let delay = delay_to_next_morning(now, 180, MORNING_HOUR);
        assert_eq!(delay.as_secs(), 24 * 3600);
    }

    #[test]
    fn delay_is_floored_to_a_minute() {
        let now = utc(2025, 5, 31, 8, 59, 30);
        let delay = delay_to_next_morning(now, 0, MORNING_HOUR);
        assert_eq!(delay, MIN_RESCHEDULE_DELAY);
    }

    fn datetime_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        ((2000i32..2100, 1u32..=12, 1u32..=28), arb::<NaiveTime>()).prop_map(
            |((y, m, d), time)| {
                let naive = NaiveDateTime::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), time);
                DateTime::from_naive_utc_and_offset(naive, Utc)
            },
        )
    }

    proptest! {
        #[test]
        fn delay_is_bounded(
            now in datetime_strategy(),
            offset_minutes in -840i32..=840
        ) {
            let delay = delay_to_next_morning(now, offset_minutes, MORNING_HOUR);
            prop_assert!(delay.as_secs() >= 60, "delay = {delay:?}");
            prop_assert!(delay.as_secs() <= 24 * 3600, "delay = {delay:?}");
        }

        #[test]
        fn unfloored_delay_lands_on_the_morning(
            now in datetime_strategy(),
            offset_minutes in -840i32..=840
        ) {
            let delay = delay_to_next_morning(now, offset_minutes, MORNING_HOUR);
            if delay > MIN_RESCHEDULE_DELAY {
                let target = now + chrono::Duration::from_std(delay).unwrap();
                let local = local_time_of_day(target, offset_minutes);
                prop_assert_eq!(local.hour(), MORNING_HOUR, "local = {}", local);
                prop_assert_eq!(local.minute(), 0);
            }
        }
    }
}
