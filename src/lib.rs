// Cooperative processing primitives for bare-metal firmware
//
// resumable:   stackless resumable functions, flat and nested
// protothread: single-marker cooperative threads
// timer:       tick clock, one-shot timeouts, periodic timers
// semaphore:   non-blocking counting semaphore
// assert:      non-halting assertion hook
//
// Single core, no preemption. Everything here is polled from the
// application's main loop or a timer tick; nothing blocks.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod assert;
pub mod protothread;
pub mod resumable;
pub mod semaphore;
pub mod timer;

// re-exported for the rf_wait_nb!/pt_wait_nb! expansions
pub use nb;

pub use protothread::{Protothread, Thread};
pub use resumable::{
    Begin, Continuation, Frame, Marker, NestedResumable, Resumable, ResumableResult, State,
    Storage,
};
pub use semaphore::Semaphore;
pub use timer::{
    Clock, PeriodicTimer, ShortPeriodicTimer, ShortTimeout, SystemClock, Timeout, TimerState,
    Timestamp,
};
