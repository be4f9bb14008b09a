// Polled timers
//
// Nothing here owns an interrupt. A timer ISR advances SystemClock;
// resumable functions and protothreads poll timeouts in their wait
// conditions (rf_wait_until!(.., timeout.is_expired())).

pub mod clock;
pub mod periodic;
pub mod timeout;

#[cfg(feature = "embassy")]
pub use clock::EmbassyClock;
pub use clock::{Clock, SystemClock, Timestamp};
pub use periodic::{GenericPeriodicTimer, PeriodicTimer, ShortPeriodicTimer};
pub use timeout::{GenericTimeout, ShortTimeout, Timeout, TimerState};
