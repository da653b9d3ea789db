/// Batches progress notifications for a long-running search.
///
/// The callback receives the cumulative count whenever a single increment is
/// at least `interval`, or when the running total crosses a multiple of
/// `interval`. The initial 0% and final 100% reports are the caller's job.
pub struct ProgressReporter<F>
where
    F: FnMut(u64),
{
    interval: u64,
    done: u64,
    callback: F,
}

/// Default batching threshold, in combinations.
pub const DEFAULT_REPORT_INTERVAL: u64 = 10_000;

impl<F> ProgressReporter<F>
where
    F: FnMut(u64),
{
    /// `interval` of zero is treated as one.
    pub fn new(interval: u64, callback: F) -> Self {
        Self {
            interval: interval.max(1),
            done: 0,
            callback,
        }
    }

    pub fn increment(&mut self, n: u64) {
        let before = self.done;
        self.done = self.done.saturating_add(n);

        if n >= self.interval || (before % self.interval).saturating_add(n) >= self.interval {
            (self.callback)(self.done);
        }
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}
