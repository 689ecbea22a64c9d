// =============================================================================
// Session Clock — exchange-local time and session gating
// =============================================================================
//
// Converts a UTC instant into exchange-local time and reports where that
// instant falls relative to the regular session:
//
//   minutes_since_open  < 0                 => PreOpen
//   0 <= m < range_established_minutes      => RangeForming
//   range_established <= m <= session_len   => Regular
//   m > session_len                         => AfterClose
//
// Open / close are fixed local wall-clock times. DST is resolved through the
// timezone database; there is no holiday calendar, so a weekday holiday or a
// weekend reports the market as open during the usual hours.
// =============================================================================

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::Serialize;

// =============================================================================
// Clock
// =============================================================================

/// Source of "now". Injected everywhere time matters so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// =============================================================================
// Session phase
// =============================================================================

/// Where an instant falls within the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    PreOpen,
    RangeForming,
    Regular,
    AfterClose,
}

impl SessionPhase {
    pub fn from_minutes(
        minutes_since_open: f64,
        session_minutes: i64,
        range_established_minutes: f64,
    ) -> Self {
        if minutes_since_open < 0.0 {
            Self::PreOpen
        } else if minutes_since_open > session_minutes as f64 {
            Self::AfterClose
        } else if minutes_since_open < range_established_minutes {
            Self::RangeForming
        } else {
            Self::Regular
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, Self::RangeForming | Self::Regular)
    }
}

// =============================================================================
// SessionStatus
// =============================================================================

/// Snapshot of the session at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub is_open: bool,
    /// Exchange-local wall-clock time, e.g. `10:02:00 AM EST`.
    pub local_time: String,
    /// Today's session-open instant; the candle normalization cutoff.
    pub session_open: DateTime<Utc>,
    /// Negative before the open, greater than the session length after close.
    pub minutes_since_open: f64,
    pub minutes_until_close: f64,
    pub session_minutes: i64,
}

// =============================================================================
// SessionClock
// =============================================================================

/// Fixed-hours exchange session in a named timezone.
#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl SessionClock {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        Self { tz, open, close }
    }

    /// NYSE / Nasdaq regular hours, 09:30–16:00 America/New_York.
    pub fn us_equities() -> Self {
        Self::new(
            chrono_tz::America::New_York,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        )
    }

    /// Length of the regular session in minutes (390 for 09:30–16:00).
    pub fn session_minutes(&self) -> i64 {
        (self.close - self.open).num_minutes()
    }

    /// Evaluate the session at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        let local = now.with_timezone(&self.tz);
        let date = local.date_naive();

        let session_open = self.local_instant(date.and_time(self.open));
        let session_close = self.local_instant(date.and_time(self.close));

        let minutes_since_open = minutes_between(session_open, now);
        let minutes_until_close = minutes_between(now, session_close);
        let session_minutes = self.session_minutes();

        SessionStatus {
            is_open: (0.0..=session_minutes as f64).contains(&minutes_since_open),
            local_time: local.format("%I:%M:%S %p %Z").to_string(),
            session_open,
            minutes_since_open,
            minutes_until_close,
            session_minutes,
        }
    }

    /// Resolve a local wall-clock time to UTC. A time skipped by a DST jump
    /// is interpreted as UTC, which only matters for exotic session hours.
    fn local_instant(&self, naive: chrono::NaiveDateTime) -> DateTime<Utc> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn open_in_winter_is_1430_utc() {
        // 2024-03-05 is EST (UTC-5).
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 3, 5, 14, 30));
        assert!(status.is_open);
        assert!(status.minutes_since_open.abs() < 1e-9);
        assert!((status.minutes_until_close - 390.0).abs() < 1e-9);
        assert_eq!(status.session_open, utc(2024, 3, 5, 14, 30));
        assert!(status.local_time.starts_with("09:30:00 AM"));
    }

    #[test]
    fn open_in_summer_is_1330_utc() {
        // 2024-07-09 is EDT (UTC-4).
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 7, 9, 14, 0));
        assert!(status.is_open);
        assert!((status.minutes_since_open - 30.0).abs() < 1e-9);
        assert_eq!(status.session_open, utc(2024, 7, 9, 13, 30));
    }

    #[test]
    fn before_open_is_negative_and_closed() {
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 3, 5, 14, 25));
        assert!(!status.is_open);
        assert!((status.minutes_since_open + 5.0).abs() < 1e-9);
    }

    #[test]
    fn after_close_exceeds_session_length() {
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 3, 5, 21, 10));
        assert!(!status.is_open);
        assert!((status.minutes_since_open - 400.0).abs() < 1e-9);
        assert!(status.minutes_until_close < 0.0);
    }

    #[test]
    fn exactly_at_close_is_still_open() {
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 3, 5, 21, 0));
        assert!(status.is_open);
        assert!(status.minutes_until_close.abs() < 1e-9);
    }

    #[test]
    fn utc_midnight_maps_to_previous_local_day() {
        // 01:00 UTC on the 6th is 20:00 EST on the 5th, after the close.
        let clock = SessionClock::us_equities();
        let status = clock.status_at(utc(2024, 3, 6, 1, 0));
        assert_eq!(status.session_open, utc(2024, 3, 5, 14, 30));
        assert!(!status.is_open);
    }

    #[test]
    fn phases_follow_minutes() {
        assert_eq!(SessionPhase::from_minutes(-5.0, 390, 30.0), SessionPhase::PreOpen);
        assert_eq!(SessionPhase::from_minutes(0.0, 390, 30.0), SessionPhase::RangeForming);
        assert_eq!(SessionPhase::from_minutes(29.9, 390, 30.0), SessionPhase::RangeForming);
        assert_eq!(SessionPhase::from_minutes(30.0, 390, 30.0), SessionPhase::Regular);
        assert_eq!(SessionPhase::from_minutes(390.0, 390, 30.0), SessionPhase::Regular);
        assert_eq!(SessionPhase::from_minutes(400.0, 390, 30.0), SessionPhase::AfterClose);
        assert!(!SessionPhase::PreOpen.is_open());
        assert!(SessionPhase::Regular.is_open());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(utc(2024, 3, 5, 14, 30));
        clock.advance(Duration::minutes(45));
        assert_eq!(clock.now(), utc(2024, 3, 5, 15, 15));
        clock.set(utc(2024, 3, 6, 0, 0));
        assert_eq!(clock.now(), utc(2024, 3, 6, 0, 0));
    }
}
