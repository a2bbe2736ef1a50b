use std::time::{Duration, Instant};

use crate::scheduling::tracked_object::TrackedObject;
use crate::session::client_config::ClientConfig;
use crate::session::identification_reply::IdentificationReply;
use crate::shared::dispatch_error::DispatchError;

/// Effect of one mailbox reply on a tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The object now has an identity.
    Resolved,
    /// Embedding or no-match; the object stays eligible for retries.
    Unresolved,
    /// The object was already resolved; its identity is kept.
    Ignored,
}

/// Attempt budget and spacing for identification requests.
///
/// An unresolved object is due when it has attempts left and its last
/// attempt is at least `min_retry_delay` old. Once the budget is spent the
/// object simply never becomes due again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryScheduler {
    max_attempts: u32,
    min_retry_delay: Duration,
}

impl RetryScheduler {
    pub fn new(max_attempts: u32, min_retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            min_retry_delay,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_attempts, config.min_retry_delay())
    }

    pub fn is_due(&self, object: &TrackedObject, now: Instant) -> bool {
        !object.is_resolved()
            && object.attempts() < self.max_attempts
            && object
                .last_attempt()
                .map_or(true, |last| now.saturating_duration_since(last) >= self.min_retry_delay)
    }

    pub fn is_exhausted(&self, object: &TrackedObject) -> bool {
        !object.is_resolved() && object.attempts() >= self.max_attempts
    }

    /// Calls `send` for `object` if it is due, counting the attempt first.
    ///
    /// Returns whether a request was issued. A failed `send` still uses up
    /// the attempt.
    pub fn try_dispatch<F>(
        &self,
        object: &mut TrackedObject,
        now: Instant,
        send: F,
    ) -> Result<bool, DispatchError>
    where
        F: FnOnce(&TrackedObject) -> Result<(), DispatchError>,
    {
        if !self.is_due(object, now) {
            return Ok(false);
        }
        object.record_attempt(now);
        send(object)?;
        Ok(true)
    }

    pub fn apply_reply(&self, object: &mut TrackedObject, reply: IdentificationReply) -> ReplyOutcome {
        object.record_reply();
        if object.is_resolved() {
            return ReplyOutcome::Ignored;
        }
        match reply {
            IdentificationReply::Identified(person) => {
                object.resolve(person);
                ReplyOutcome::Resolved
            }
            IdentificationReply::Embedding(values) => {
                object.set_embedding(values);
                ReplyOutcome::Unresolved
            }
            IdentificationReply::Unknown => ReplyOutcome::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::identity_store::PersonRecord;
    use crate::shared::bounding_box::BoundingBox;

    const DELAY: Duration = Duration::from_millis(500);

    fn object() -> TrackedObject {
        TrackedObject::new("t1", BoundingBox::new(0, 0, 10, 10))
    }

    fn person() -> PersonRecord {
        PersonRecord {
            id: 1,
            name: "Ada".into(),
        }
    }

    fn dispatch(scheduler: &RetryScheduler, object: &mut TrackedObject, now: Instant) -> bool {
        scheduler.try_dispatch(object, now, |_| Ok(())).unwrap()
    }

    #[test]
    fn test_fresh_object_is_due_immediately() {
        let scheduler = RetryScheduler::new(3, DELAY);
        assert!(scheduler.is_due(&object(), Instant::now()));
    }

    #[test]
    fn test_never_exceeds_max_attempts() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        let start = Instant::now();
        let sent = (0..20)
            .filter(|i| dispatch(&scheduler, &mut obj, start + DELAY * *i))
            .count();
        assert_eq!(sent, 3);
        assert_eq!(obj.attempts(), 3);
        assert!(scheduler.is_exhausted(&obj));
    }

    #[test]
    fn test_never_two_requests_within_delay() {
        let scheduler = RetryScheduler::new(10, DELAY);
        let mut obj = object();
        let start = Instant::now();
        let mut sent_at = Vec::new();
        for ms in (0..3000).step_by(50) {
            let now = start + Duration::from_millis(ms);
            if dispatch(&scheduler, &mut obj, now) {
                sent_at.push(now);
            }
        }
        assert!(sent_at.len() > 1);
        for pair in sent_at.windows(2) {
            assert!(pair[1] - pair[0] >= DELAY);
        }
    }

    #[test]
    fn test_dispatch_records_attempt_before_send() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        let now = Instant::now();
        scheduler
            .try_dispatch(&mut obj, now, |o| {
                assert_eq!(o.attempts(), 1);
                assert_eq!(o.last_attempt(), Some(now));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_failed_send_still_counts() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        let result = scheduler.try_dispatch(&mut obj, Instant::now(), |_| {
            Err(DispatchError::NotSubscribed)
        });
        assert!(result.is_err());
        assert_eq!(obj.attempts(), 1);
    }

    #[test]
    fn test_identified_reply_resolves() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        dispatch(&scheduler, &mut obj, Instant::now());

        let outcome = scheduler.apply_reply(&mut obj, IdentificationReply::Identified(person()));

        assert_eq!(outcome, ReplyOutcome::Resolved);
        assert_eq!(obj.identity(), Some(&person()));
        assert_eq!(obj.replies(), 1);
        assert!(!scheduler.is_due(&obj, Instant::now() + DELAY * 10));
    }

    #[test]
    fn test_unknown_reply_keeps_object_eligible() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        let start = Instant::now();
        dispatch(&scheduler, &mut obj, start);

        let outcome = scheduler.apply_reply(&mut obj, IdentificationReply::Unknown);

        assert_eq!(outcome, ReplyOutcome::Unresolved);
        assert_eq!(obj.replies(), 1);
        assert!(scheduler.is_due(&obj, start + DELAY));
    }

    #[test]
    fn test_embedding_reply_is_stored() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        let outcome = scheduler.apply_reply(&mut obj, IdentificationReply::Embedding(vec![0.5, 0.25]));
        assert_eq!(outcome, ReplyOutcome::Unresolved);
        assert_eq!(obj.embedding(), Some(&[0.5f32, 0.25][..]));
        assert!(!obj.is_resolved());
    }

    #[test]
    fn test_resolved_identity_is_not_downgraded() {
        let scheduler = RetryScheduler::new(3, DELAY);
        let mut obj = object();
        scheduler.apply_reply(&mut obj, IdentificationReply::Identified(person()));

        let outcome = scheduler.apply_reply(&mut obj, IdentificationReply::Unknown);

        assert_eq!(outcome, ReplyOutcome::Ignored);
        assert_eq!(obj.identity(), Some(&person()));
        assert_eq!(obj.replies(), 2);
    }

    #[test]
    fn test_zero_budget_never_dispatches() {
        let scheduler = RetryScheduler::new(0, DELAY);
        let mut obj = object();
        assert!(!dispatch(&scheduler, &mut obj, Instant::now()));
        assert!(scheduler.is_exhausted(&obj));
    }
}
