// Resumable functions: stackless cooperative routines
//
// A resumable function is an ordinary method that returns early
// whenever it has to wait, and picks up where it left off on the next
// call. Where it left off is a Marker stored in its owner's storage:
//
//   Resumable<N>        N independent slots, one per function index
//   NestedResumable<L>  one call stack of L levels shared by all
//                       functions of the owning object
//
// Each function body declares its suspension points as a
// `continuation!` enum and dispatches on it with a plain `match`.
// Locals do NOT survive a suspension; anything needed after a wait
// must live in a field of the owning struct.

pub mod flat;
pub mod macros;
pub mod nested;

use core::fmt;
use core::marker::PhantomData;

pub use flat::Resumable;
pub use nested::NestedResumable;

/// Outcome of a single invocation of a resumable function.
///
/// The numeric ordering is part of the contract: everything at or below
/// `NestingError` is terminal, everything above it means "call again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum State {
    /// Finished, the result is valid.
    Stop = 0,
    /// Could not acquire a nesting level, nothing was executed.
    NestingError = 1,
    /// Another resumable function of the same owner holds the slot.
    WrongState = 127,
    /// Suspended, must be invoked again.
    Running = 255,
}

impl State {
    /// `true` for states that end a busy-wait (`Stop`, `NestingError`).
    pub const fn is_terminal(self) -> bool {
        (self as u8) <= State::NestingError as u8
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Stop => write!(f, "Stop"),
            State::NestingError => write!(f, "NestingError"),
            State::WrongState => write!(f, "WrongState"),
            State::Running => write!(f, "Running"),
        }
    }
}

/// State plus return value of one invocation.
///
/// `result` only carries meaning when the state is [`State::Stop`];
/// every other state fills it with `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumableResult<T> {
    state: State,
    result: T,
}

impl<T> ResumableResult<T> {
    pub const fn stop(result: T) -> Self {
        Self {
            state: State::Stop,
            result,
        }
    }

    pub const fn state(&self) -> State {
        self.state
    }

    pub const fn result(&self) -> &T {
        &self.result
    }

    pub fn into_result(self) -> T {
        self.result
    }

    /// `true` only for a regular completion.
    pub fn is_finished(&self) -> bool {
        self.state == State::Stop
    }

    /// `true` when a caller waiting on this function has to suspend too.
    ///
    /// This includes `WrongState` and `NestingError`: a caller cannot tell
    /// a busy callee from a misconfigured one, so it keeps waiting.
    pub fn is_pending(&self) -> bool {
        self.state != State::Stop
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResumableResult<U> {
        ResumableResult {
            state: self.state,
            result: f(self.result),
        }
    }

    /// Bridge into the `nb` polling convention.
    ///
    /// `Running` and `WrongState` would block; `NestingError` will never
    /// make progress and is reported as an error.
    pub fn into_nb(self) -> nb::Result<T, State> {
        match self.state {
            State::Stop => Ok(self.result),
            State::NestingError => Err(nb::Error::Other(State::NestingError)),
            State::WrongState | State::Running => Err(nb::Error::WouldBlock),
        }
    }
}

impl<T: Default> ResumableResult<T> {
    pub fn running() -> Self {
        Self::from_state(State::Running)
    }

    pub fn from_state(state: State) -> Self {
        Self {
            state,
            result: T::default(),
        }
    }
}

impl<T: Default> From<State> for ResumableResult<T> {
    fn from(state: State) -> Self {
        Self::from_state(state)
    }
}

/// Saved continuation point ("local continuation").
///
/// High byte: origin, the id of the resumable function that stored it.
/// Low byte: step within that function. Zero means stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Marker(u16);

impl Marker {
    pub const STOPPED: Marker = Marker(0);

    pub const fn new(origin: u8, step: u8) -> Self {
        Self(((origin as u16) << 8) | step as u16)
    }

    pub const fn origin(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn step(self) -> u8 {
        self.0 as u8
    }

    pub const fn is_stopped(self) -> bool {
        self.0 == 0
    }

    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stopped() {
            write!(f, "stopped")
        } else {
            write!(f, "{}:{}", self.origin(), self.step())
        }
    }
}

/// Suspension points of one resumable function.
///
/// `ORIGIN` must be non-zero and unique among the resumable functions
/// sharing a storage; that is how a function recognises a marker left
/// behind by somebody else. Use [`continuation!`](crate::continuation)
/// rather than implementing this by hand.
pub trait Continuation: Copy {
    const ORIGIN: u8;

    fn step(self) -> u8;

    fn from_step(step: u8) -> Option<Self>;

    fn encode(self) -> Marker {
        const { assert!(Self::ORIGIN != 0, "origin 0 is reserved for the stopped marker") };
        Marker::new(Self::ORIGIN, self.step())
    }

    fn decode(marker: Marker) -> Option<Self> {
        if marker.origin() != Self::ORIGIN {
            return None;
        }
        Self::from_step(marker.step())
    }
}

/// Declares a step enum and its [`Continuation`] impl.
///
/// The origin after `=` must differ between all step enums used with
/// one storage. Two bodies sharing an origin decode each other's
/// markers instead of seeing `WrongState`; nothing catches that unless
/// the owner checks with [`origins_are_distinct`].
///
/// ```
/// use modm_processing::resumable::{Continuation, origins_are_distinct};
///
/// modm_processing::continuation! {
///     /// Steps of `Sensor::read`.
///     pub enum ReadStep = 1 { Start, WaitReady, Fetch }
/// }
/// modm_processing::continuation! {
///     pub enum WriteStep = 2 { Start, Flush }
/// }
///
/// const _: () = assert!(origins_are_distinct(&[ReadStep::ORIGIN, WriteStep::ORIGIN]));
/// ```
#[macro_export]
macro_rules! continuation {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident = $origin:literal { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::resumable::Continuation for $name {
            const ORIGIN: u8 = $origin;

            fn step(self) -> u8 {
                self as u8
            }

            fn from_step(step: u8) -> Option<Self> {
                const STEPS: &[$name] = &[$($name::$variant),+];
                STEPS.get(step as usize).copied()
            }
        }
    };
}

/// `true` if no origin appears twice and none is zero.
pub const fn origins_are_distinct(origins: &[u8]) -> bool {
    let mut i = 0;
    while i < origins.len() {
        if origins[i] == 0 {
            return false;
        }
        let mut j = i + 1;
        while j < origins.len() {
            if origins[i] == origins[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Storage protocol behind every resumable function body.
///
/// The body calls these through [`begin`] and [`Frame`]; application
/// code only ever uses the public query and cancel methods of the
/// concrete storages.
pub trait Storage {
    /// Validates a declared slot index at compile time.
    fn slot<const I: usize>(&self) -> u8;

    /// `true` if another level can be pushed.
    fn nesting_ok(&self) -> bool;

    /// Enters a level and returns its stored marker.
    fn push(&mut self, index: u8) -> Marker;

    /// Leaves the level entered by the matching `push`.
    fn pop(&mut self);

    /// Stores a marker for the current level.
    fn set(&mut self, marker: Marker, index: u8);

    /// Resets the current level to stopped.
    fn stop_at(&mut self, index: u8);

    fn is_stopped(&self, index: u8) -> bool;

    /// Called whenever an entry was rejected for lack of levels.
    fn nesting_rejected(&mut self) {}
}

/// Handle on the level a running body occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<S> {
    index: u8,
    _steps: PhantomData<S>,
}

impl<S: Continuation> Frame<S> {
    const fn new(index: u8) -> Self {
        Self {
            index,
            _steps: PhantomData,
        }
    }

    pub const fn index(&self) -> u8 {
        self.index
    }

    /// Records `at` as the resume point without leaving the body.
    pub fn checkpoint<R: Storage>(self, rf: &mut R, at: S) {
        rf.set(at.encode(), self.index);
    }

    /// Records `at` as the resume point and leaves with `Running`.
    pub fn suspend<R: Storage, T: Default>(self, rf: &mut R, at: S) -> ResumableResult<T> {
        self.checkpoint(rf, at);
        rf.pop();
        ResumableResult::running()
    }

    /// Completes the body: the level is stopped before it is left.
    pub fn finish<R: Storage, T>(self, rf: &mut R, result: T) -> ResumableResult<T> {
        rf.stop_at(self.index);
        rf.pop();
        ResumableResult::stop(result)
    }
}

/// Result of entering a resumable function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin<S> {
    /// Execute starting at the given step.
    Run(Frame<S>, S),
    /// Leave immediately with this state; nothing was modified.
    Rejected(State),
}

/// Entry protocol shared by flat and nested storages.
///
/// A stopped level starts at `initial` (recorded right away, so the
/// function counts as running from its first statement). A marker that
/// decodes to one of our steps resumes there. Anything else belongs to
/// a different function and is rejected with `WrongState`.
pub fn begin<R: Storage, S: Continuation>(rf: &mut R, index: u8, initial: S) -> Begin<S> {
    if !rf.nesting_ok() {
        rf.nesting_rejected();
        return Begin::Rejected(State::NestingError);
    }

    let marker = rf.push(index);
    let frame = Frame::new(index);

    if marker.is_stopped() {
        frame.checkpoint(rf, initial);
        return Begin::Run(frame, initial);
    }

    match S::decode(marker) {
        Some(at) => Begin::Run(frame, at),
        None => {
            rf.pop();
            log::debug!(
                "resumable {} rejected on slot {}: held by {}",
                S::ORIGIN,
                index,
                marker
            );
            Begin::Rejected(State::WrongState)
        }
    }
}

/// Invokes `f` until it reaches a terminal state and returns its result.
///
/// Terminal includes `NestingError`, so a misconfigured callee cannot
/// spin this loop forever. Blocks the caller; use sparingly.
pub fn call_blocking<T, F>(mut f: F) -> T
where
    F: FnMut() -> ResumableResult<T>,
{
    loop {
        let result = f();
        if result.state().is_terminal() {
            return result.into_result();
        }
    }
}
