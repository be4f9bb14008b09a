// Non-blocking counting semaphore
//
// acquire() never waits: it fails when nothing is left and the caller
// retries on its next invocation, typically with
// rf_wait_until!(.., sem.acquire()). No mutex exists on purpose; code
// on a single cooperative context cannot interleave mid-statement.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semaphore {
    count: u16,
    max: u16,
}

impl Semaphore {
    /// A semaphore holding `count` permits, which is also its maximum.
    pub const fn new(count: u16) -> Self {
        Self { count, max: count }
    }

    /// A semaphore starting with `count` of at most `max` permits.
    pub const fn with_max(count: u16, max: u16) -> Self {
        let count = if count > max { max } else { count };
        Self { count, max }
    }

    /// Takes a permit if one is available.
    pub fn acquire(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        true
    }

    /// Returns a permit. Releasing beyond the maximum is ignored.
    pub fn release(&mut self) {
        if self.count < self.max {
            self.count += 1;
        } else {
            log::debug!("semaphore released beyond its maximum of {}", self.max);
        }
    }

    pub const fn count(&self) -> u16 {
        self.count
    }

    pub const fn max(&self) -> u16 {
        self.max
    }
}
