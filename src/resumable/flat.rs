// Flat resumable storage: one independent marker per function index
//
// Functions with different indices run side by side and may call each
// other; no call stack, no depth check. Two functions declared with the
// same index exclude each other (the second sees WrongState).

use super::{Marker, Storage};

/// Marker slots for `N` resumable functions of one owner.
///
/// ```
/// use modm_processing::resumable::{Resumable, ResumableResult};
/// use modm_processing::{continuation, rf_begin, rf_wait_until};
///
/// continuation! {
///     enum Blink = 1 { On, Off }
/// }
///
/// struct Led {
///     rf: Resumable<1>,
///     ready: bool,
/// }
///
/// impl Led {
///     fn blink(&mut self) -> ResumableResult<()> {
///         let (frame, mut at) = rf_begin!(self.rf, slot 0, Blink::On);
///         loop {
///             match at {
///                 Blink::On => {
///                     rf_wait_until!(self.rf, frame, at, self.ready);
///                     at = Blink::Off;
///                 }
///                 Blink::Off => return frame.finish(&mut self.rf, ()),
///             }
///         }
///     }
/// }
///
/// let mut led = Led { rf: Resumable::new(), ready: false };
/// assert!(led.blink().is_pending());
/// led.ready = true;
/// assert!(led.blink().is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct Resumable<const N: usize = 1> {
    slots: [Marker; N],
}

impl<const N: usize> Resumable<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0, "a Resumable needs at least one slot") };
        const { assert!(N <= u8::MAX as usize, "a Resumable holds at most 255 slots") };
        Self {
            slots: [Marker::STOPPED; N],
        }
    }

    /// Forces every function of this owner to stop.
    pub fn stop_all_resumables(&mut self) {
        log::debug!("stopping all {} resumable slots", N);
        self.slots = [Marker::STOPPED; N];
    }

    /// Forces function `id` to stop. Returns `false` if `id` is out of range.
    pub fn stop_resumable(&mut self, id: u8) -> bool {
        match self.slots.get_mut(id as usize) {
            Some(slot) => {
                if !slot.is_stopped() {
                    log::debug!("stopping resumable slot {} at {}", id, slot);
                }
                *slot = Marker::STOPPED;
                true
            }
            None => false,
        }
    }

    pub fn is_resumable_running(&self, id: u8) -> bool {
        self.slots
            .get(id as usize)
            .is_some_and(|slot| !slot.is_stopped())
    }

    /// `true` if any slot of this owner is running.
    pub fn any_resumable_running(&self) -> bool {
        self.slots.iter().any(|slot| !slot.is_stopped())
    }

    /// `true` if any of `ids` is running. An empty list is never running.
    pub fn are_any_resumables_running(&self, ids: &[u8]) -> bool {
        ids.iter().any(|&id| self.is_resumable_running(id))
    }

    /// `true` if every one of `ids` is running.
    pub fn are_all_resumables_running(&self, ids: &[u8]) -> bool {
        ids.iter().all(|&id| self.is_resumable_running(id))
    }

    /// `true` once none of `ids` is running any more.
    pub fn join_resumables(&self, ids: &[u8]) -> bool {
        !self.are_any_resumables_running(ids)
    }

    /// Saved marker of slot `id`, mostly for diagnostics.
    pub fn marker(&self, id: u8) -> Option<Marker> {
        self.slots.get(id as usize).copied()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for Resumable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Storage for Resumable<N> {
    fn slot<const I: usize>(&self) -> u8 {
        const {
            assert!(
                I < N,
                "slot index out of bounds, increase the slot count of this Resumable"
            )
        };
        I as u8
    }

    fn nesting_ok(&self) -> bool {
        true
    }

    fn push(&mut self, index: u8) -> Marker {
        self.slots[index as usize]
    }

    fn pop(&mut self) {}

    fn set(&mut self, marker: Marker, index: u8) {
        self.slots[index as usize] = marker;
    }

    fn stop_at(&mut self, index: u8) {
        self.slots[index as usize] = Marker::STOPPED;
    }

    fn is_stopped(&self, index: u8) -> bool {
        self.slots[index as usize].is_stopped()
    }
}
