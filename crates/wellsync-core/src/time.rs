//! Time ranges used to bound provider queries.
//!
//! [`TimeWindow`] is a concrete `[start, end)` interval in UTC. [`SyncWindow`]
//! is the configurable policy (days before and after "now") the reconciler
//! turns into a `TimeWindow` at the start of each pass.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window, or `None` if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if a span `[start, end)` overlaps this window.
    ///
    /// Zero-length spans (start == end) overlap when their instant is inside
    /// the window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start == end {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }
}

/// How far back and ahead of "now" a sync pass looks.
///
/// Defaults to 30 days back and 90 days ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncWindow {
    pub lookback_days: u32,
    pub lookahead_days: u32,
}

impl Default for SyncWindow {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            lookahead_days: 90,
        }
    }
}

impl SyncWindow {
    pub fn new(lookback_days: u32, lookahead_days: u32) -> Self {
        Self {
            lookback_days,
            lookahead_days,
        }
    }

    /// Computes the concrete window around `now`, clamped to the
    /// representable range.
    pub fn around(&self, now: DateTime<Utc>) -> TimeWindow {
        let back = Duration::days(i64::from(self.lookback_days));
        let ahead = Duration::days(i64::from(self.lookahead_days));
        TimeWindow {
            start: now
                .checked_sub_signed(back)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now
                .checked_add_signed(ahead)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(TimeWindow::new(utc(2025, 2, 5, 17), utc(2025, 2, 5, 9)).is_none());
        let window = TimeWindow::new(utc(2025, 2, 5, 9), utc(2025, 2, 5, 17)).unwrap();
        assert_eq!(window.duration(), Duration::hours(8));
    }

    #[test]
    fn contains_is_half_open() {
        let window = TimeWindow::new(utc(2025, 2, 5, 9), utc(2025, 2, 5, 17)).unwrap();
        assert!(window.contains(utc(2025, 2, 5, 9)));
        assert!(window.contains(utc(2025, 2, 5, 16)));
        assert!(!window.contains(utc(2025, 2, 5, 17)));
    }

    #[test]
    fn overlaps_spans() {
        let window = TimeWindow::new(utc(2025, 2, 5, 9), utc(2025, 2, 5, 17)).unwrap();

        assert!(window.overlaps(utc(2025, 2, 5, 8), utc(2025, 2, 5, 10)));
        assert!(window.overlaps(utc(2025, 2, 5, 16), utc(2025, 2, 5, 18)));
        assert!(window.overlaps(utc(2025, 2, 5, 8), utc(2025, 2, 5, 18)));
        assert!(!window.overlaps(utc(2025, 2, 5, 8), utc(2025, 2, 5, 9)));
        assert!(!window.overlaps(utc(2025, 2, 5, 17), utc(2025, 2, 5, 18)));
        assert!(window.overlaps(utc(2025, 2, 5, 12), utc(2025, 2, 5, 12)));
    }

    #[test]
    fn default_sync_window_is_30_back_90_ahead() {
        let now = utc(2024, 6, 1, 12);
        let window = SyncWindow::default().around(now);
        assert_eq!(window.start, now - Duration::days(30));
        assert_eq!(window.end, now + Duration::days(90));
    }

    #[test]
    fn huge_sync_window_saturates() {
        let now = utc(2024, 1, 1, 0);
        let window = SyncWindow::new(u32::MAX, 4_000_000_000).around(now);
        assert_eq!(window.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
        assert!(window.contains(now));
    }

    #[test]
    fn sync_window_from_toml_like_json() {
        let window: SyncWindow = serde_json::from_str(r#"{"lookahead_days": 7}"#).unwrap();
        assert_eq!(window, SyncWindow::new(30, 7));
    }
}
