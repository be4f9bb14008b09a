// Non-halting assertions
//
// A running controller must not stop because a caller passed a bad
// argument. Failures are logged, counted and handed to an optional
// application handler; the caller then carries on with a safe
// fallback (a stopped timer, a rejected call).

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// A timer was restarted with a negative interval.
    NegativeInterval { ticks: i32 },
    /// A timer was restarted with an interval its timestamps cannot hold.
    IntervalTooLarge { ticks: i32, max: u32 },
    /// A nested resumable function ran out of levels.
    NestingDepth { capacity: u8 },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::NegativeInterval { ticks } => {
                write!(f, "negative timer interval ({} ticks)", ticks)
            }
            Failure::IntervalTooLarge { ticks, max } => {
                write!(f, "timer interval of {} ticks exceeds {}", ticks, max)
            }
            Failure::NestingDepth { capacity } => {
                write!(f, "nesting depth exceeded ({} levels)", capacity)
            }
        }
    }
}

pub type Handler = fn(Failure);

static HANDLER: Mutex<Cell<Option<Handler>>> = Mutex::new(Cell::new(None));

static FAILURES: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Installs (or with `None` removes) the application's failure handler.
pub fn set_handler(handler: Option<Handler>) {
    critical_section::with(|cs| HANDLER.borrow(cs).set(handler));
}

/// Reports a failure and returns; never panics.
pub fn report(failure: Failure) {
    log::warn!("assertion failed: {}", failure);

    let handler = critical_section::with(|cs| {
        let count = FAILURES.borrow(cs);
        count.set(count.get().saturating_add(1));
        HANDLER.borrow(cs).get()
    });

    // outside the critical section, the handler may log or block
    if let Some(handler) = handler {
        handler(failure);
    }
}

/// Failures reported since boot.
pub fn failure_count() -> u32 {
    critical_section::with(|cs| FAILURES.borrow(cs).get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_and_continues() {
        let before = failure_count();
        report(Failure::NegativeInterval { ticks: -1 });
        assert!(failure_count() > before);
    }

    #[test]
    fn failures_display() {
        let text = std::format!("{}", Failure::NestingDepth { capacity: 2 });
        assert_eq!(text, "nesting depth exceeded (2 levels)");
    }
}
