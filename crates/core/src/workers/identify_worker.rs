use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::broker::domain::broker::Broker;
use crate::codec::identify_codec::{decode_identify_request, encode_identify_reply, ReplyPayload};
use crate::shared::cancellation::CancellationToken;
use crate::shared::constants::{IDENTIFY_QUEUE_KEY, UNKNOWN_PERSON_ID, WORKER_IDLE_INTERVAL};
use crate::shared::dispatch_error::DispatchError;
use crate::shared::request_mode::RequestMode;
use crate::workers::domain::face_identifier::FaceIdentifier;

/// Consumes the shared identify queue; any number of these may run.
///
/// Each reply lands in the mailbox list named after the request's tracker id.
pub struct IdentifyWorker {
    broker: Arc<dyn Broker>,
    identifier: Box<dyn FaceIdentifier>,
    idle_interval: Duration,
}

impl IdentifyWorker {
    pub fn new(broker: Arc<dyn Broker>, identifier: Box<dyn FaceIdentifier>) -> Self {
        Self {
            broker,
            identifier,
            idle_interval: WORKER_IDLE_INTERVAL,
        }
    }

    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    /// Handles one queued request, if any. Returns whether there was one.
    ///
    /// Backend failures are logged and produce no reply; the client's retry
    /// schedule covers the loss.
    pub fn step(&mut self) -> Result<bool, DispatchError> {
        let Some(bytes) = self.broker.list_pop(IDENTIFY_QUEUE_KEY)? else {
            return Ok(false);
        };
        let request = decode_identify_request(&bytes)?;

        let payload = match request.mode {
            RequestMode::Embed => self.identifier.embed(&request.face).map(ReplyPayload::Embedding),
            RequestMode::Identify => self
                .identifier
                .identify(&request.face)
                .map(|id| ReplyPayload::PersonId(id.unwrap_or(UNKNOWN_PERSON_ID))),
        };

        match payload {
            Ok(payload) => {
                self.broker
                    .list_push(&request.tracker_id, &encode_identify_reply(&payload))?;
            }
            Err(e) => log::warn!(
                "{} request for {} failed: {e}",
                request.mode,
                request.tracker_id
            ),
        }
        Ok(true)
    }

    /// Serves requests until `cancel` trips. Returns the number handled.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<usize, DispatchError> {
        let mut handled = 0;
        while !cancel.is_cancelled() {
            match self.step() {
                Ok(true) => handled += 1,
                Ok(false) => thread::sleep(self.idle_interval),
                Err(DispatchError::MalformedPayload(e)) => {
                    log::warn!("Dropping identify request: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(handled)
    }
}
