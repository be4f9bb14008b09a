// Monotonic tick source for timeouts
//
// SystemClock counts ticks delivered by a timer ISR (tick/tick_by).
// The counter wraps; timers compare timestamps by signed difference
// so wrap-around is harmless as long as no interval exceeds half the
// timestamp range. A tick weight lets the ISR keep counting in base
// ticks while the hardware timer is slowed down during idle.
//
// cs: not every target has atomic read-modify-write

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;

/// A source of monotonic, wrapping ticks.
pub trait Clock {
    fn now() -> u32;
}

/// Width of the timestamps a timer stores.
///
/// `u16` halves the memory of a timer at the price of a 32767-tick
/// maximum interval; `u32` allows up to `i32::MAX` ticks.
pub trait Timestamp: Copy + Eq + core::fmt::Debug {
    /// Longest interval a timer of this width can measure.
    const MAX_INTERVAL: u32;

    /// Truncates a clock reading to this width.
    fn from_ticks(ticks: u32) -> Self;

    /// Timestamp `ticks` later, wrapping.
    fn after(self, ticks: u32) -> Self;

    /// Signed ticks from `self` to `later`, negative once `later` has passed.
    fn until(self, later: Self) -> i32;
}

impl Timestamp for u16 {
    const MAX_INTERVAL: u32 = i16::MAX as u32;

    fn from_ticks(ticks: u32) -> Self {
        ticks as u16
    }

    fn after(self, ticks: u32) -> Self {
        self.wrapping_add(ticks as u16)
    }

    fn until(self, later: Self) -> i32 {
        later.wrapping_sub(self) as i16 as i32
    }
}

impl Timestamp for u32 {
    const MAX_INTERVAL: u32 = i32::MAX as u32;

    fn from_ticks(ticks: u32) -> Self {
        ticks
    }

    fn after(self, ticks: u32) -> Self {
        self.wrapping_add(ticks)
    }

    fn until(self, later: Self) -> i32 {
        later.wrapping_sub(self) as i32
    }
}

// base ticks per tick() call
static TICK_WEIGHT: AtomicU32 = AtomicU32::new(1);

static TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Global tick counter fed from a timer interrupt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Advance by the current tick weight. Call from the timer ISR.
    #[inline]
    pub fn tick() {
        Self::tick_by(TICK_WEIGHT.load(Ordering::Relaxed));
    }

    pub fn tick_by(ticks: u32) {
        critical_section::with(|cs| {
            let now = TICKS.borrow(cs);
            now.set(now.get().wrapping_add(ticks));
        });
    }

    /// Base ticks counted per `tick()` (1 while the timer runs at its
    /// base rate, more when it has been slowed down).
    pub fn set_tick_weight(weight: u32) {
        TICK_WEIGHT.store(weight, Ordering::Release);
    }

    pub fn tick_weight() -> u32 {
        TICK_WEIGHT.load(Ordering::Acquire)
    }

    /// Overwrite the counter; for bring-up and tests.
    pub fn set_time(ticks: u32) {
        critical_section::with(|cs| TICKS.borrow(cs).set(ticks));
    }
}

impl Clock for SystemClock {
    fn now() -> u32 {
        critical_section::with(|cs| TICKS.borrow(cs).get())
    }
}

/// Milliseconds of embassy-time's monotonic instant.
#[cfg(feature = "embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    fn now() -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}
