// Statement macros for resumable function bodies
//
// A body looks like this:
//
//   let (frame, mut at) = rf_begin!(self.rf, slot 0, Step::Start);
//   loop {
//       match at {
//           Step::Start => { ...; at = Step::Wait; }
//           Step::Wait => {
//               rf_wait_until!(self.rf, frame, at, self.ready);
//               at = Step::Done;
//           }
//           Step::Done => return frame.finish(&mut self.rf, value),
//       }
//   }
//
// Every macro that can suspend takes the step to resume at and
// returns from the enclosing function with `Running`.

/// Enters a resumable function body and yields `(frame, step)`.
///
/// Flat storages name their slot (`slot 0`, checked at compile time);
/// nested storages take no slot. Returns early with `NestingError` or
/// `WrongState` if the body may not run.
#[macro_export]
macro_rules! rf_begin {
    ($rf:expr, slot $index:literal, $initial:expr) => {{
        let index = $crate::resumable::Storage::slot::<{ $index }>(&$rf);
        match $crate::resumable::begin(&mut $rf, index, $initial) {
            $crate::resumable::Begin::Run(frame, at) => (frame, at),
            $crate::resumable::Begin::Rejected(state) => {
                return $crate::resumable::ResumableResult::from_state(state);
            }
        }
    }};
    ($rf:expr, $initial:expr) => {
        $crate::rf_begin!($rf, slot 0, $initial)
    };
}

/// Suspends at `at` while `condition` holds.
#[macro_export]
macro_rules! rf_wait_while {
    ($rf:expr, $frame:expr, $at:expr, $condition:expr) => {
        if $condition {
            return $frame.suspend(&mut $rf, $at);
        }
    };
}

/// Suspends at `at` until `condition` holds.
#[macro_export]
macro_rules! rf_wait_until {
    ($rf:expr, $frame:expr, $at:expr, $condition:expr) => {
        $crate::rf_wait_while!($rf, $frame, $at, !($condition))
    };
}

/// Suspends once and resumes at `next` on the following invocation.
#[macro_export]
macro_rules! rf_yield {
    ($rf:expr, $frame:expr, $next:expr) => {
        return $frame.suspend(&mut $rf, $next)
    };
}

/// Suspends at `at` until the protothread `child` has finished.
#[macro_export]
macro_rules! rf_wait_thread {
    ($rf:expr, $frame:expr, $at:expr, $child:expr) => {
        $crate::rf_wait_while!($rf, $frame, $at, $crate::protothread::Thread::run(&mut $child))
    };
}

/// Calls a resumable function and evaluates to its result once stopped.
///
/// Until the callee stops, the caller suspends at `at` and repeats the
/// call on its next invocation. Note that `WrongState` and
/// `NestingError` from the callee also keep the caller waiting.
#[macro_export]
macro_rules! rf_call {
    ($rf:expr, $frame:expr, $at:expr, $call:expr) => {{
        $frame.checkpoint(&mut $rf, $at);
        let result = $call;
        if result.is_pending() {
            return $frame.suspend(&mut $rf, $at);
        }
        result.into_result()
    }};
}

/// Calls a resumable function and finishes with its result.
#[macro_export]
macro_rules! rf_return_call {
    ($rf:expr, $frame:expr, $at:expr, $call:expr) => {{
        let value = $crate::rf_call!($rf, $frame, $at, $call);
        return $frame.finish(&mut $rf, value);
    }};
}

/// Busy-waits on a resumable function. Can deadlock; avoid in bodies.
#[macro_export]
macro_rules! rf_call_blocking {
    ($call:expr) => {
        $crate::resumable::call_blocking(|| $call)
    };
}

/// Waits on an `nb` operation: suspends at `at` on `WouldBlock`,
/// evaluates to `Ok(value)` or `Err(error)` otherwise.
#[macro_export]
macro_rules! rf_wait_nb {
    ($rf:expr, $frame:expr, $at:expr, $op:expr) => {
        match $op {
            Ok(value) => Ok(value),
            Err($crate::nb::Error::Other(error)) => Err(error),
            Err($crate::nb::Error::WouldBlock) => return $frame.suspend(&mut $rf, $at),
        }
    };
}
