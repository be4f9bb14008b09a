// Nested resumable storage: a bounded call stack of markers
//
// All resumable functions of one owner share the stack, so only one
// call chain can be in flight. Entering a function takes the next
// level; a chain deeper than L is refused with NestingError before
// anything is touched.
//
// The depth counter only lives for the duration of one top-level call:
// every function pops its level before returning, suspended or not.
// Between calls only the markers persist. On resume the chain is
// replayed from level 0, each waiting frame re-dispatching straight
// into its pending call until the live frame is reached.

use super::{Marker, Storage};
use crate::assert::{self, Failure};

/// Nesting stack of `L` levels.
///
/// `L` must cover the deepest call chain: one level per resumable
/// function on the chain, including the outermost one.
///
/// With the `check-nesting` feature disabled a deeper call is not
/// refused. It runs without a level of its own: its marker is never
/// saved, so it starts over on every invocation.
#[derive(Debug, Clone)]
pub struct NestedResumable<const L: usize = 1> {
    level: u8,
    levels: [Marker; L],
    nesting_errors: u16,
}

impl<const L: usize> NestedResumable<L> {
    pub const fn new() -> Self {
        const { assert!(L > 0, "a NestedResumable needs at least one level") };
        const { assert!(L < 128, "a NestedResumable holds at most 127 levels") };
        Self {
            level: 0,
            levels: [Marker::STOPPED; L],
            nesting_errors: 0,
        }
    }

    /// Stops every level from the current depth down.
    ///
    /// Called from outside a resumable function this cancels the whole
    /// suspended chain; called from inside, only the chain below the
    /// caller.
    pub fn stop_resumable(&mut self) {
        let from = self.level as usize;
        if self.levels[from.min(L)..].iter().any(|m| !m.is_stopped()) {
            log::debug!("stopping nested resumable from level {}", from);
        }
        for marker in self.levels.iter_mut().skip(from) {
            *marker = Marker::STOPPED;
        }
    }

    /// `true` if a function holds the level at the current depth.
    pub fn is_resumable_running(&self) -> bool {
        !self.is_stopped(0)
    }

    /// Depth of the currently executing function, -1 outside of any.
    pub const fn resumable_depth(&self) -> i8 {
        self.level as i8 - 1
    }

    /// Saved marker at `level`, mostly for diagnostics.
    pub fn marker_at(&self, level: usize) -> Option<Marker> {
        self.levels.get(level).copied()
    }

    /// Number of entries refused for lack of levels since construction.
    pub const fn nesting_errors(&self) -> u16 {
        self.nesting_errors
    }

    pub const fn capacity(&self) -> usize {
        L
    }

    // marker of the innermost entered level, None beyond capacity
    fn current_mut(&mut self) -> Option<&mut Marker> {
        let level = (self.level as usize).checked_sub(1)?;
        self.levels.get_mut(level)
    }
}

impl<const L: usize> Default for NestedResumable<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const L: usize> Storage for NestedResumable<L> {
    fn slot<const I: usize>(&self) -> u8 {
        const {
            assert!(
                I == 0,
                "nested resumable functions share one stack, declare them with slot 0"
            )
        };
        0
    }

    fn nesting_ok(&self) -> bool {
        !cfg!(feature = "check-nesting") || (self.level as usize) < L
    }

    fn push(&mut self, _index: u8) -> Marker {
        let marker = self
            .levels
            .get(self.level as usize)
            .copied()
            .unwrap_or(Marker::STOPPED);
        self.level = self.level.saturating_add(1);
        marker
    }

    fn pop(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn set(&mut self, marker: Marker, _index: u8) {
        if let Some(slot) = self.current_mut() {
            *slot = marker;
        }
    }

    fn stop_at(&mut self, _index: u8) {
        if let Some(slot) = self.current_mut() {
            *slot = Marker::STOPPED;
        }
    }

    fn is_stopped(&self, _index: u8) -> bool {
        self.levels
            .get(self.level as usize)
            .is_none_or(|m| m.is_stopped())
    }

    fn nesting_rejected(&mut self) {
        self.nesting_errors = self.nesting_errors.saturating_add(1);
        log::warn!(
            "nested resumable out of levels: depth {} of {}",
            self.level,
            L
        );
        assert::report(Failure::NestingDepth { capacity: L as u8 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_minus_one_outside() {
        let rf: NestedResumable<2> = NestedResumable::new();
        assert_eq!(rf.resumable_depth(), -1);
        assert!(!rf.is_resumable_running());
        assert_eq!(rf.capacity(), 2);
    }

    #[test]
    fn push_pop_track_depth() {
        let mut rf: NestedResumable<2> = NestedResumable::new();
        assert!(rf.nesting_ok());
        assert_eq!(rf.push(0), Marker::STOPPED);
        assert_eq!(rf.resumable_depth(), 0);
        rf.set(Marker::new(1, 2), 0);

        assert!(rf.nesting_ok());
        rf.push(0);
        assert_eq!(rf.resumable_depth(), 1);
        rf.set(Marker::new(2, 0), 0);
        assert!(!rf.nesting_ok());

        rf.pop();
        rf.pop();
        assert_eq!(rf.resumable_depth(), -1);
        assert_eq!(rf.marker_at(0), Some(Marker::new(1, 2)));
        assert_eq!(rf.marker_at(1), Some(Marker::new(2, 0)));
        assert!(rf.is_resumable_running());
    }

    #[test]
    fn stop_clears_from_current_depth_down() {
        let mut rf: NestedResumable<3> = NestedResumable::new();
        rf.push(0);
        rf.set(Marker::new(1, 1), 0);
        rf.push(0);
        rf.set(Marker::new(2, 1), 0);
        rf.pop();

        // inside level 0: only the deeper levels are cleared
        rf.stop_resumable();
        assert_eq!(rf.marker_at(0), Some(Marker::new(1, 1)));
        assert_eq!(rf.marker_at(1), Some(Marker::STOPPED));

        rf.pop();
        rf.stop_resumable();
        assert_eq!(rf.marker_at(0), Some(Marker::STOPPED));
    }

    #[test]
    fn levels_beyond_capacity_are_not_stored() {
        let mut rf: NestedResumable<1> = NestedResumable::new();
        rf.push(0);
        rf.set(Marker::new(1, 3), 0);

        assert_eq!(rf.push(0), Marker::STOPPED);
        assert_eq!(rf.resumable_depth(), 1);
        rf.set(Marker::new(2, 1), 0);
        rf.stop_at(0);
        assert!(rf.is_stopped(0));

        rf.pop();
        rf.pop();
        assert_eq!(rf.marker_at(0), Some(Marker::new(1, 3)));
        assert_eq!(rf.marker_at(1), None);
    }

    #[test]
    fn rejection_is_counted() {
        let mut rf: NestedResumable<1> = NestedResumable::new();
        rf.nesting_rejected();
        rf.nesting_rejected();
        assert_eq!(rf.nesting_errors(), 2);
    }
}
