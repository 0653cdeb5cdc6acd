use std::time::{Duration, Instant};

/// The verdict of a cooperative limit check.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SearchProgress {
    /// Keep going.
    Continue,
    /// The search will not finish inside the deadline, stop and return partial results.
    Abort,
}

/// Cooperative progress reporting and cancellation for whole database passes. Searches are
/// single threaded; the driving loop calls [`check`](Self::check) once per database entry
/// and stops early when the estimated completion time exceeds the deadline. Partial results
/// gathered up to that point stay valid.
#[derive(Clone, Copy, Debug)]
pub struct SearchLimits {
    deadline: Option<Duration>,
    report_every: u32,
    started: Instant,
}

impl SearchLimits {
    /// Limits with the given deadline, reporting progress every `report_every` entries.
    pub fn new(deadline: Option<Duration>, report_every: u32) -> Self {
        Self {
            deadline,
            report_every: report_every.max(1),
            started: Instant::now(),
        }
    }

    /// Unlimited, with a progress line every 10000 entries.
    pub fn unlimited() -> Self {
        Self::new(None, 10_000)
    }

    /// The time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Call once per processed entry with the number done so far and the total. Cheap when
    /// it is not a reporting step.
    pub fn check(&self, done: u32, total: u32) -> SearchProgress {
        if done == 0 || !done.is_multiple_of(self.report_every) {
            return SearchProgress::Continue;
        }
        let elapsed = self.started.elapsed();
        log::info!("searched {done}/{total} entries in {:.1}s", elapsed.as_secs_f64());
        if let Some(deadline) = self.deadline {
            let estimated = elapsed.mul_f64(f64::from(total.max(done)) / f64::from(done));
            if estimated > deadline {
                log::warn!(
                    "estimated completion {:.1}s exceeds the deadline {:.1}s, aborting",
                    estimated.as_secs_f64(),
                    deadline.as_secs_f64()
                );
                return SearchProgress::Abort;
            }
        }
        SearchProgress::Continue
    }
}
