// One-shot timeout polled against a Clock
//
//   Stopped --restart--> Armed --deadline passes--> Expired
//
// Expiry is computed on demand from the clock; nothing runs in the
// background. The first query that sees the deadline passed latches
// the expiry, so a timeout stays expired no matter how far the clock
// runs on. execute() reports an expiry exactly once, after which the
// timeout stays expired until restarted or stopped.
//
// Short (u16) timeouts must be polled at least once within 32767 ticks
// of their deadline, otherwise the wrapped counter looks early again.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

use super::clock::{Clock, SystemClock, Timestamp};
use crate::assert::{self, Failure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Armed,
    Expired,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Stopped => write!(f, "Stopped"),
            TimerState::Armed => write!(f, "Armed"),
            TimerState::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Armed,
    // deadline seen passed, not yet executed
    Expired,
    // execute() already reported this expiry
    Fired,
}

/// Timeout over clock `C`, storing timestamps of width `T`.
pub struct GenericTimeout<C: Clock, T: Timestamp = u32> {
    deadline: T,
    interval: u32,
    phase: Cell<Phase>,
    _clock: PhantomData<fn() -> C>,
}

/// Timeout on the system clock with 32-bit timestamps.
pub type Timeout = GenericTimeout<SystemClock, u32>;
/// Timeout on the system clock with 16-bit timestamps.
pub type ShortTimeout = GenericTimeout<SystemClock, u16>;

impl<C: Clock, T: Timestamp> GenericTimeout<C, T> {
    /// A stopped timeout.
    pub fn stopped() -> Self {
        Self {
            deadline: T::from_ticks(0),
            interval: 0,
            phase: Cell::new(Phase::Stopped),
            _clock: PhantomData,
        }
    }

    /// A timeout armed to expire `interval` ticks from now.
    pub fn new(interval: i32) -> Self {
        let mut timeout = Self::stopped();
        timeout.restart(interval);
        timeout
    }

    fn now() -> T {
        T::from_ticks(C::now())
    }

    /// Re-arms to expire `interval` ticks from now.
    ///
    /// A negative interval, or one longer than `T::MAX_INTERVAL`, is
    /// reported through the assertion hook and leaves the timeout stopped.
    pub fn restart(&mut self, interval: i32) {
        if interval < 0 {
            assert::report(Failure::NegativeInterval { ticks: interval });
            self.stop();
            return;
        }
        if interval as u32 > T::MAX_INTERVAL {
            assert::report(Failure::IntervalTooLarge {
                ticks: interval,
                max: T::MAX_INTERVAL,
            });
            self.stop();
            return;
        }
        self.interval = interval as u32;
        self.deadline = Self::now().after(self.interval);
        self.phase.set(Phase::Armed);
    }

    /// Re-arms with the previous interval.
    pub fn restart_same(&mut self) {
        self.restart(self.interval as i32);
    }

    pub fn stop(&mut self) {
        self.phase.set(Phase::Stopped);
    }

    pub fn state(&self) -> TimerState {
        match self.phase.get() {
            Phase::Stopped => TimerState::Stopped,
            Phase::Expired | Phase::Fired => TimerState::Expired,
            Phase::Armed if Self::now().until(self.deadline) <= 0 => {
                self.phase.set(Phase::Expired);
                TimerState::Expired
            }
            Phase::Armed => TimerState::Armed,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.phase.get() == Phase::Stopped
    }

    pub fn is_armed(&self) -> bool {
        self.state() == TimerState::Armed
    }

    pub fn is_expired(&self) -> bool {
        self.state() == TimerState::Expired
    }

    /// `true` exactly once per expiry.
    pub fn execute(&mut self) -> bool {
        if self.phase.get() != Phase::Fired && self.state() == TimerState::Expired {
            self.phase.set(Phase::Fired);
            return true;
        }
        false
    }

    /// Ticks until expiry, never positive once expired, 0 when stopped.
    pub fn remaining(&self) -> i32 {
        let until = Self::now().until(self.deadline);
        match self.state() {
            TimerState::Stopped => 0,
            TimerState::Armed => until,
            TimerState::Expired => until.min(0),
        }
    }

    /// Interval of the last successful restart.
    pub fn interval(&self) -> u32 {
        self.interval
    }
}

impl<C: Clock, T: Timestamp> Default for GenericTimeout<C, T> {
    fn default() -> Self {
        Self::stopped()
    }
}

impl<C: Clock, T: Timestamp> Clone for GenericTimeout<C, T> {
    fn clone(&self) -> Self {
        Self {
            deadline: self.deadline,
            interval: self.interval,
            phase: self.phase.clone(),
            _clock: PhantomData,
        }
    }
}

impl<C: Clock, T: Timestamp> fmt::Debug for GenericTimeout<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeout")
            .field("deadline", &self.deadline)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    std::thread_local! {
        static NOW: Cell<u32> = const { Cell::new(0) };
    }

    struct TestClock;

    impl Clock for TestClock {
        fn now() -> u32 {
            NOW.with(Cell::get)
        }
    }

    fn set_time(t: u32) {
        NOW.with(|now| now.set(t));
    }

    type Full = GenericTimeout<TestClock, u32>;
    type Short = GenericTimeout<TestClock, u16>;

    #[test]
    fn default_is_stopped() {
        set_time(0);
        let mut t = Full::default();
        assert_eq!(t.remaining(), 0);
        assert!(t.is_stopped());
        assert!(!t.is_armed());
        assert!(!t.is_expired());
        assert!(!t.execute());
        assert_eq!(t.state(), TimerState::Stopped);
    }

    #[test]
    fn expires_once() {
        set_time(0);
        let mut t = Short::new(10);
        assert_eq!(t.remaining(), 10);
        assert!(t.is_armed());

        for now in 0..10 {
            set_time(now);
            assert!(!t.execute());
            assert_eq!(t.remaining(), 10 - now as i32);
        }

        set_time(10);
        assert!(t.is_expired());
        assert!(!t.is_armed());
        assert!(t.execute());
        assert!(!t.execute());
        assert!(t.is_expired());

        set_time(11);
        assert!(!t.execute());
        assert_eq!(t.remaining(), -1);

        t.stop();
        assert!(t.is_stopped());
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn restart_rearms() {
        set_time(0);
        let mut t = Full::stopped();
        t.restart(42);
        set_time(10);
        assert_eq!(t.remaining(), 32);
        set_time(50);
        assert!(t.execute());
        assert_eq!(t.remaining(), -8);

        t.restart(60);
        assert!(t.is_armed());
        assert_eq!(t.remaining(), 60);
        assert_eq!(t.interval(), 60);

        set_time(150);
        assert!(t.execute());
        assert_eq!(t.remaining(), -40);

        t.restart_same();
        assert_eq!(t.remaining(), 60);
    }

    #[test]
    fn negative_interval_leaves_timeout_stopped() {
        set_time(0);
        let before = assert::failure_count();
        let mut t = Full::new(10);
        t.restart(-5);
        assert!(t.is_stopped());
        assert_eq!(t.state(), TimerState::Stopped);
        assert!(!t.execute());
        assert!(assert::failure_count() > before);
    }

    #[test]
    fn short_expiry_is_kept_after_a_long_stall() {
        set_time(0);
        let mut t = Short::new(10);
        set_time(20);
        assert_eq!(t.state(), TimerState::Expired);

        // 40000 ticks on, the 16-bit difference alone would read "armed"
        set_time(40_000);
        assert_eq!(t.state(), TimerState::Expired);
        assert!(t.remaining() <= 0);
        assert!(t.execute());
        assert!(!t.execute());
    }

    #[test]
    fn interval_beyond_timestamp_width_leaves_timeout_stopped() {
        set_time(0);
        let before = assert::failure_count();
        let mut t = Short::new(40_000);
        assert!(t.is_stopped());
        assert!(!t.execute());
        assert!(assert::failure_count() > before);

        let mut t = Short::new(i16::MAX as i32);
        assert!(t.is_armed());
        set_time(i16::MAX as u32);
        assert!(t.execute());

        let t = Full::new(i32::MAX);
        assert!(t.is_armed());
    }

    #[test]
    fn short_timestamp_survives_wrap() {
        // 32867 + 32766 wraps to 97
        set_time(32867);
        let mut t = Short::new(32766);
        assert!(!t.execute());
        set_time(65535);
        assert!(!t.execute());
        set_time(65536);
        assert!(!t.execute());
        set_time(65536 + 100);
        assert!(t.execute());
    }
}
