use std::sync::Arc;

use crate::broker::domain::broker::Broker;
use crate::codec::assignment_codec::{decode_admission, AdmissionReply, Assignment};
use crate::codec::boxes_codec::decode_boxes;
use crate::codec::frame_codec::encode_frame;
use crate::codec::identify_codec::{decode_identify_reply, encode_identify_request, ReplyPayload};
use crate::identity::domain::identity_store::IdentityStore;
use crate::relay::frame_relay::FrameRelay;
use crate::session::client_config::ClientConfig;
use crate::session::identification_reply::IdentificationReply;
use crate::session::session_state::SessionState;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::cancellation::CancellationToken;
use crate::shared::constants::{
    FACE_CROP_CHANNELS, FACE_CROP_SIZE, IDENTIFY_QUEUE_KEY, REGISTER_LIST_KEY, RELEASE_LIST_KEY,
    UNKNOWN_PERSON_ID,
};
use crate::shared::dispatch_error::DispatchError;
use crate::shared::frame::Frame;
use crate::shared::poll::poll_until;
use crate::shared::request_mode::RequestMode;

/// LTRIM bounds that empty a list outright (start past stop).
const TRIM_ALL: (isize, isize) = (1, 0);

/// One client's connection to the worker pools.
///
/// Detection goes through the dedicated input/output keys the coordinator
/// assigned ("latest wins": at most one pending request). Identification
/// goes through the shared identify queue, and replies come back on a
/// mailbox list named after each tracker id.
pub struct ClientSession {
    id: String,
    broker: Arc<dyn Broker>,
    identities: Arc<dyn IdentityStore>,
    config: ClientConfig,
    state: SessionState,
    relay: FrameRelay,
}

impl ClientSession {
    pub fn new(
        broker: Arc<dyn Broker>,
        identities: Arc<dyn IdentityStore>,
        config: ClientConfig,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            broker,
            identities,
            config,
            state: SessionState::new(),
            relay: FrameRelay::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn relay(&self) -> &FrameRelay {
        &self.relay
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.state.cancellation()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.is_subscribed()
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.state.assignment()
    }

    /// Runs the admission handshake with the coordinator.
    ///
    /// On `Timeout` or `Busy` the session is stopped and must not be used
    /// for dispatch.
    pub fn register(&mut self) -> Result<Assignment, DispatchError> {
        if let Some(current) = self.state.assignment() {
            return Err(DispatchError::AlreadySubscribed {
                channel: current.channel.clone(),
            });
        }

        log::info!("Client {} registering", self.id);
        self.broker.list_push(REGISTER_LIST_KEY, self.id.as_bytes())?;

        let policy = self.config.registration_policy();
        let cancel = self.state.cancellation();
        let reply = poll_until(&policy, &cancel, || Ok(self.broker.get(&self.id)?))?;

        let Some(reply) = reply else {
            log::error!("No admission reply for client {} within {:?}", self.id, policy.deadline);
            self.state.stop();
            self.withdraw()?;
            return Err(DispatchError::Timeout(policy.deadline));
        };

        let admission = match decode_admission(&reply) {
            Ok(admission) => admission,
            Err(e) => {
                self.broker.delete(&self.id)?;
                self.state.stop();
                self.withdraw()?;
                return Err(e.into());
            }
        };

        match admission {
            AdmissionReply::Busy => {
                log::info!("Worker pool is busy");
                self.broker.delete(&self.id)?;
                self.state.stop();
                Err(DispatchError::Busy)
            }
            AdmissionReply::Assigned(assignment) => {
                self.broker.subscribe(&assignment.channel)?;
                log::info!(
                    "Connected to worker :: {} :: {} :: {}",
                    assignment.input_key,
                    assignment.output_key,
                    assignment.channel
                );
                self.state.subscribe(assignment.clone())?;
                Ok(assignment)
            }
        }
    }

    /// Tells the coordinator this client no longer wants its slot, whether
    /// or not the admission went through.
    fn withdraw(&self) -> Result<(), DispatchError> {
        self.broker.list_push(RELEASE_LIST_KEY, self.id.as_bytes())?;
        Ok(())
    }

    fn subscribed(&self) -> Result<&Assignment, DispatchError> {
        self.state.assignment().ok_or(DispatchError::NotSubscribed)
    }

    /// Replaces any unconsumed detection request with `frame`.
    ///
    /// A reply still sitting under the output key answers an earlier frame
    /// (one whose poll timed out), so it is discarded first.
    pub fn send_detect(&self, frame: &Frame) -> Result<(), DispatchError> {
        let assignment = self.subscribed()?;
        let payload = encode_frame(frame);
        self.broker.delete(&assignment.output_key)?;
        self.broker
            .list_trim(&assignment.input_key, TRIM_ALL.0, TRIM_ALL.1)?;
        self.broker.list_push(&assignment.input_key, &payload)?;
        Ok(())
    }

    /// Waits for the detect worker's reply and consumes it.
    ///
    /// An empty reply means no faces. Fails with `WorkerTimeout` when the
    /// worker does not answer within the configured deadline.
    pub fn poll_detect(&self) -> Result<Vec<BoundingBox>, DispatchError> {
        let assignment = self.subscribed()?;
        let policy = self.config.detection_policy();
        let cancel = self.state.cancellation();

        let reply = poll_until(&policy, &cancel, || {
            Ok(self.broker.get(&assignment.output_key)?)
        })?
        .ok_or(DispatchError::WorkerTimeout(policy.deadline))?;

        self.broker.delete(&assignment.output_key)?;
        Ok(decode_boxes(&reply)?)
    }

    /// Queues an identification job for `tracker_id`.
    ///
    /// The crop must be exactly `160 x 160 x 3`; otherwise nothing is
    /// written to the broker.
    pub fn send_identify(
        &self,
        tracker_id: &str,
        face: &Frame,
        mode: RequestMode,
    ) -> Result<(), DispatchError> {
        let expected = (FACE_CROP_SIZE, FACE_CROP_SIZE, FACE_CROP_CHANNELS);
        if face.shape() != expected {
            return Err(DispatchError::InvalidShape {
                expected,
                actual: face.shape(),
            });
        }
        let payload = encode_identify_request(tracker_id, mode, face)?;
        self.broker.list_push(IDENTIFY_QUEUE_KEY, &payload)?;
        log::debug!("Queued {mode} request for {tracker_id}");
        Ok(())
    }

    /// Takes the oldest reply from `tracker_id`'s mailbox without waiting.
    pub fn poll_identify_reply(
        &self,
        tracker_id: &str,
    ) -> Result<Option<IdentificationReply>, DispatchError> {
        let Some(bytes) = self.broker.list_pop(tracker_id)? else {
            return Ok(None);
        };
        let reply = match decode_identify_reply(&bytes, self.config.embedding_dim)? {
            ReplyPayload::Embedding(values) => IdentificationReply::Embedding(values),
            ReplyPayload::PersonId(UNKNOWN_PERSON_ID) => IdentificationReply::Unknown,
            ReplyPayload::PersonId(person_id) => self.resolve(person_id)?,
        };
        Ok(Some(reply))
    }

    fn resolve(&self, person_id: i64) -> Result<IdentificationReply, DispatchError> {
        let record = self
            .identities
            .lookup(person_id)
            .map_err(|e| DispatchError::IdentityLookup {
                person_id,
                message: e.to_string(),
            })?;
        match record {
            Some(person) => Ok(IdentificationReply::Identified(person)),
            None => {
                log::warn!("Worker matched person {person_id}, which is not in the identity store");
                Ok(IdentificationReply::Unknown)
            }
        }
    }

    /// Drops the mailbox of a tracker id that is no longer followed.
    pub fn discard_mailbox(&self, tracker_id: &str) -> Result<(), DispatchError> {
        self.broker.delete(tracker_id)?;
        Ok(())
    }

    /// Stops every loop driven by this session and leaves the worker's
    /// notify channel. Safe to call more than once.
    pub fn stop(&mut self) -> Result<(), DispatchError> {
        if let Some(assignment) = self.state.stop() {
            self.broker.unsubscribe(&assignment.channel)?;
            self.withdraw()?;
            log::info!("Client {} left channel {}", self.id, assignment.channel);
        }
        Ok(())
    }
}
