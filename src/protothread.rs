// Protothreads: the simplest cooperative thread
//
// One saved position per thread, no return value, no nesting of its
// own. `run()` returns true while the thread has more to do. A
// protothread may still wait on child protothreads (pt_spawn!) and on
// resumable functions (pt_call!).
//
// Unlike Dunkels' protothreads, a thread that reaches its end stays
// stopped until restart() is called.

use crate::resumable::{Continuation, Marker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    At(Marker),
    Stopped,
}

/// Saved position of one protothread.
#[derive(Debug, Clone)]
pub struct Protothread {
    position: Position,
}

impl Protothread {
    /// A thread that starts from the top on its first run.
    pub const fn new() -> Self {
        Self {
            position: Position::Start,
        }
    }

    /// Start over from the top on the next run.
    pub fn restart(&mut self) {
        self.position = Position::Start;
    }

    pub fn stop(&mut self) {
        self.position = Position::Stopped;
    }

    /// `true` while running or waiting, `false` once ended or stopped.
    pub fn is_running(&self) -> bool {
        self.position != Position::Stopped
    }

    /// Entry of a `run()` body: the step to continue at, or `None` if
    /// the thread is stopped.
    ///
    /// A position that does not decode to one of `S`'s steps ends the
    /// thread, just like falling off the end of the body.
    pub fn begin<S: Continuation>(&mut self, initial: S) -> Option<S> {
        match self.position {
            Position::Start => Some(initial),
            Position::At(marker) => {
                let at = S::decode(marker);
                if at.is_none() {
                    log::debug!("protothread position {} is not a step of {}", marker, S::ORIGIN);
                    self.stop();
                }
                at
            }
            Position::Stopped => None,
        }
    }

    /// Saves `at` and reports "still running".
    pub fn wait<S: Continuation>(&mut self, at: S) -> bool {
        self.position = Position::At(at.encode());
        true
    }

    /// Ends the thread and reports "finished".
    pub fn exit(&mut self) -> bool {
        self.stop();
        false
    }

    /// Restarts the thread and reports "still running".
    pub fn restart_later(&mut self) -> bool {
        self.restart();
        true
    }
}

impl Default for Protothread {
    fn default() -> Self {
        Self::new()
    }
}

/// An object driven by a protothread.
pub trait Thread {
    /// Runs until the next wait. `true` while there is more to do.
    fn run(&mut self) -> bool;

    fn protothread(&self) -> &Protothread;

    fn protothread_mut(&mut self) -> &mut Protothread;

    fn restart(&mut self) {
        self.protothread_mut().restart();
    }

    fn stop(&mut self) {
        self.protothread_mut().stop();
    }

    fn is_running(&self) -> bool {
        self.protothread().is_running()
    }
}

/// Enters a `run()` body and yields the current step; returns `false`
/// if the thread is stopped.
#[macro_export]
macro_rules! pt_begin {
    ($pt:expr, $initial:expr) => {
        match $pt.begin($initial) {
            Some(at) => at,
            None => return false,
        }
    };
}

/// Waits at `at` while `condition` holds.
#[macro_export]
macro_rules! pt_wait_while {
    ($pt:expr, $at:expr, $condition:expr) => {
        if $condition {
            return $pt.wait($at);
        }
    };
}

/// Waits at `at` until `condition` holds.
#[macro_export]
macro_rules! pt_wait_until {
    ($pt:expr, $at:expr, $condition:expr) => {
        $crate::pt_wait_while!($pt, $at, !($condition))
    };
}

/// Yields once, continuing at `next` on the following run.
#[macro_export]
macro_rules! pt_yield {
    ($pt:expr, $next:expr) => {
        return $pt.wait($next)
    };
}

/// Waits at `at` until the child thread has finished.
#[macro_export]
macro_rules! pt_wait_thread {
    ($pt:expr, $at:expr, $child:expr) => {
        $crate::pt_wait_while!($pt, $at, $crate::protothread::Thread::run(&mut $child))
    };
}

/// Restarts the child thread, runs it once and, if it is not done,
/// waits at `at`. The step `at` must continue with `pt_wait_thread!`.
#[macro_export]
macro_rules! pt_spawn {
    ($pt:expr, $at:expr, $child:expr) => {
        $crate::protothread::Thread::restart(&mut $child);
        $crate::pt_wait_thread!($pt, $at, $child)
    };
}

/// Calls a resumable function, waiting at `at` until it stops, and
/// evaluates to its result.
#[macro_export]
macro_rules! pt_call {
    ($pt:expr, $at:expr, $call:expr) => {{
        let result = $call;
        if result.is_pending() {
            return $pt.wait($at);
        }
        result.into_result()
    }};
}

/// Waits at `at` on an `nb` operation, evaluating to its `Result`.
#[macro_export]
macro_rules! pt_wait_nb {
    ($pt:expr, $at:expr, $op:expr) => {
        match $op {
            Ok(value) => Ok(value),
            Err($crate::nb::Error::Other(error)) => Err(error),
            Err($crate::nb::Error::WouldBlock) => return $pt.wait($at),
        }
    };
}
