use std::thread;
use std::time::{Duration, Instant};

use crate::shared::cancellation::CancellationToken;
use crate::shared::dispatch_error::DispatchError;

/// Timing of a [`poll_until`] loop.
///
/// The sleep between checks starts at `interval` and doubles up to
/// `max_interval`. With `interval == max_interval` the loop polls at a
/// fixed rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub deadline: Duration,
}

impl PollPolicy {
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            deadline,
        }
    }

    pub fn with_backoff(interval: Duration, max_interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            max_interval,
            deadline,
        }
    }
}

/// Evaluates `check` until it yields a value, the deadline passes, or
/// `cancel` trips.
///
/// Returns `Ok(None)` on deadline expiry so each caller can map it to its own
/// timeout error. The check always runs at least once.
pub fn poll_until<T, F>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<Option<T>, DispatchError>
where
    F: FnMut() -> Result<Option<T>, DispatchError>,
{
    let started = Instant::now();
    let mut interval = policy.interval;
    loop {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        if let Some(value) = check()? {
            return Ok(Some(value));
        }
        let elapsed = started.elapsed();
        if elapsed >= policy.deadline {
            return Ok(None);
        }
        thread::sleep(interval.min(policy.deadline - elapsed));
        interval = (interval * 2).min(policy.max_interval);
    }
}
