//! Search control: time limits shared between the control thread and the
//! search thread, plus the ponder/infinite wait flags.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

/// Stored in a limit slot to mean "no limit".
const UNLIMITED: i64 = -1;

/// Controls when a search should stop.
///
/// The search thread polls [`out_of_time`](Self::out_of_time) every few
/// thousand nodes and unwinds when it returns `true`. The control thread
/// changes the limits at any time: [`stop`](Self::stop) sets both to zero,
/// a ponder hit installs the real limits.
///
/// Two limits exist. The search normally honours the minimum; while the
/// best root move is in doubt it may run on to the maximum.
#[derive(Debug)]
pub struct SearchControl {
    min_ms: AtomicI64,
    max_ms: AtomicI64,
    ponder: AtomicBool,
    infinite: AtomicBool,
}

impl SearchControl {
    /// Create control without time limits.
    pub fn new() -> Self {
        Self {
            min_ms: AtomicI64::new(UNLIMITED),
            max_ms: AtomicI64::new(UNLIMITED),
            ponder: AtomicBool::new(false),
            infinite: AtomicBool::new(false),
        }
    }

    /// Create control with the given limits.
    pub fn with_limits(min: Option<Duration>, max: Option<Duration>) -> Self {
        let control = Self::new();
        control.set_time_limit(min, max);
        control
    }

    /// Install new minimum and maximum time limits. `None` means unlimited.
    pub fn set_time_limit(&self, min: Option<Duration>, max: Option<Duration>) {
        let to_ms = |d: Option<Duration>| d.map_or(UNLIMITED, |d| d.as_millis() as i64);
        self.min_ms.store(to_ms(min), Ordering::Release);
        self.max_ms.store(to_ms(max), Ordering::Release);
    }

    /// Current `(min, max)` limits.
    pub fn time_limit(&self) -> (Option<Duration>, Option<Duration>) {
        let from_ms = |ms: i64| (ms >= 0).then(|| Duration::from_millis(ms as u64));
        (
            from_ms(self.min_ms.load(Ordering::Acquire)),
            from_ms(self.max_ms.load(Ordering::Acquire)),
        )
    }

    /// Return `true` if a maximum limit exists (the search is on the clock).
    pub fn has_max_limit(&self) -> bool {
        self.max_ms.load(Ordering::Acquire) >= 0
    }

    /// Return `true` if `elapsed` exceeds the active limit.
    ///
    /// The active limit is the maximum when `need_more_time`, otherwise the minimum.
    pub fn out_of_time(&self, elapsed: Duration, need_more_time: bool) -> bool {
        let limit = if need_more_time {
            self.max_ms.load(Ordering::Acquire)
        } else {
            self.min_ms.load(Ordering::Acquire)
        };
        limit >= 0 && elapsed.as_millis() as i64 >= limit
    }

    /// Return `true` if `elapsed` has reached the minimum limit.
    pub fn min_time_reached(&self, elapsed: Duration) -> bool {
        self.out_of_time(elapsed, false)
    }

    /// Stop the search as soon as possible and release any wait.
    pub fn stop(&self) {
        self.set_time_limit(Some(Duration::ZERO), Some(Duration::ZERO));
        self.ponder.store(false, Ordering::Release);
        self.infinite.store(false, Ordering::Release);
    }

    /// Set the ponder and infinite wait flags.
    pub fn set_wait_flags(&self, ponder: bool, infinite: bool) {
        self.ponder.store(ponder, Ordering::Release);
        self.infinite.store(infinite, Ordering::Release);
    }

    /// Return `true` while pondering.
    pub fn is_pondering(&self) -> bool {
        self.ponder.load(Ordering::Acquire)
    }

    /// Return `true` if the finished search must wait before reporting.
    pub fn must_wait(&self) -> bool {
        self.ponder.load(Ordering::Acquire) || self.infinite.load(Ordering::Acquire)
    }
}

impl Default for SearchControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_runs_out() {
        let control = SearchControl::new();
        assert!(!control.out_of_time(Duration::from_secs(3600), false));
        assert!(!control.out_of_time(Duration::from_secs(3600), true));
        assert!(!control.has_max_limit());
    }

    #[test]
    fn need_more_time_switches_to_the_maximum() {
        let control =
            SearchControl::with_limits(Some(Duration::from_millis(100)), Some(Duration::from_millis(300)));
        let elapsed = Duration::from_millis(200);
        assert!(control.out_of_time(elapsed, false));
        assert!(!control.out_of_time(elapsed, true));
        assert!(control.min_time_reached(elapsed));
    }

    #[test]
    fn stop_zeroes_limits_and_clears_wait_flags() {
        let control = SearchControl::new();
        control.set_wait_flags(true, true);
        assert!(control.must_wait());
        control.stop();
        assert!(!control.must_wait());
        assert!(control.out_of_time(Duration::ZERO, false));
        assert!(control.out_of_time(Duration::ZERO, true));
        assert_eq!(
            control.time_limit(),
            (Some(Duration::ZERO), Some(Duration::ZERO))
        );
    }
}
