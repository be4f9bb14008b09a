// Periodic timer: a timeout that re-arms itself when executed
//
// The next deadline is taken from the time of execute(), not from the
// missed deadline. After a long stall the timer fires once and then
// resumes its rhythm; it never fires a burst to catch up.

use core::fmt;

use super::clock::{Clock, SystemClock, Timestamp};
use super::timeout::{GenericTimeout, TimerState};

pub struct GenericPeriodicTimer<C: Clock, T: Timestamp = u32> {
    timeout: GenericTimeout<C, T>,
}

/// Periodic timer on the system clock with 32-bit timestamps.
pub type PeriodicTimer = GenericPeriodicTimer<SystemClock, u32>;
/// Periodic timer on the system clock with 16-bit timestamps.
pub type ShortPeriodicTimer = GenericPeriodicTimer<SystemClock, u16>;

impl<C: Clock, T: Timestamp> GenericPeriodicTimer<C, T> {
    /// A timer first expiring `period` ticks from now.
    pub fn new(period: i32) -> Self {
        Self {
            timeout: GenericTimeout::new(period),
        }
    }

    pub fn stopped() -> Self {
        Self {
            timeout: GenericTimeout::stopped(),
        }
    }

    /// Changes the period and starts counting from now.
    pub fn restart(&mut self, period: i32) {
        self.timeout.restart(period);
    }

    pub fn stop(&mut self) {
        self.timeout.stop();
    }

    /// `true` once per expiry; re-arms for one period from now.
    pub fn execute(&mut self) -> bool {
        if self.timeout.execute() {
            self.timeout.restart_same();
            return true;
        }
        false
    }

    pub fn state(&self) -> TimerState {
        self.timeout.state()
    }

    pub fn is_stopped(&self) -> bool {
        self.timeout.is_stopped()
    }

    pub fn is_armed(&self) -> bool {
        self.timeout.is_armed()
    }

    pub fn is_expired(&self) -> bool {
        self.timeout.is_expired()
    }

    pub fn remaining(&self) -> i32 {
        self.timeout.remaining()
    }

    pub fn period(&self) -> u32 {
        self.timeout.interval()
    }
}

impl<C: Clock, T: Timestamp> Default for GenericPeriodicTimer<C, T> {
    fn default() -> Self {
        Self::stopped()
    }
}

impl<C: Clock, T: Timestamp> Clone for GenericPeriodicTimer<C, T> {
    fn clone(&self) -> Self {
        Self {
            timeout: self.timeout.clone(),
        }
    }
}

impl<C: Clock, T: Timestamp> fmt::Debug for GenericPeriodicTimer<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTimer")
            .field("period", &self.period())
            .field("remaining", &self.remaining())
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

    type Timer = GenericPeriodicTimer<TestClock, u32>;

    #[test]
    fn fires_every_period() {
        set_time(0);
        let mut t = Timer::new(10);
        assert!(!t.is_stopped());
        assert_eq!(t.state(), TimerState::Armed);
        assert!(!t.execute());

        set_time(10);
        assert_eq!(t.remaining(), 0);
        assert!(t.execute());
        assert!(!t.execute());
        assert_eq!(t.remaining(), 10);
        assert_eq!(t.state(), TimerState::Armed);

        set_time(20);
        assert_eq!(t.state(), TimerState::Expired);
        assert!(t.execute());
        assert_eq!(t.period(), 10);
    }

    #[test]
    fn late_execute_rearms_from_now() {
        set_time(0);
        let mut t = Timer::new(10);

        set_time(155);
        assert_eq!(t.remaining(), -145);
        assert!(t.execute());
        assert!(!t.execute());
        assert_eq!(t.remaining(), 10);

        set_time(164);
        assert!(!t.execute());
        set_time(165);
        assert!(t.execute());
    }

    #[test]
    fn zero_period_fires_immediately() {
        set_time(3);
        let mut t = Timer::new(0);
        assert!(t.execute());
    }

    #[test]
    fn stop_and_restart() {
        set_time(0);
        let mut t = Timer::new(10);
        t.stop();
        assert!(t.is_stopped());
        assert!(!t.execute());

        t.restart(5);
        assert!(!t.is_stopped());
        set_time(5);
        assert!(t.execute());
        assert_eq!(t.period(), 5);
    }
}
