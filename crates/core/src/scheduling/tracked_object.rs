use std::time::Instant;

use crate::identity::domain::identity_store::PersonRecord;
use crate::shared::bounding_box::BoundingBox;

/// One face instance followed across frames.
///
/// The tracker creates, moves and drops objects; identity and the
/// attempt/reply counters change only through the retry scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedObject {
    id: String,
    bbox: BoundingBox,
    identity: Option<PersonRecord>,
    embedding: Option<Vec<f32>>,
    attempts: u32,
    last_attempt: Option<Instant>,
    replies: u32,
}

impl TrackedObject {
    pub fn new(id: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id: id.into(),
            bbox,
            identity: None,
            embedding: None,
            attempts: 0,
            last_attempt: None,
            replies: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn set_bbox(&mut self, bbox: BoundingBox) {
        self.bbox = bbox;
    }

    pub fn identity(&self) -> Option<&PersonRecord> {
        self.identity.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.identity.is_some()
    }

    /// Most recent embedding a worker returned for this face.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    pub fn replies(&self) -> u32 {
        self.replies
    }

    pub(crate) fn record_attempt(&mut self, now: Instant) {
        self.attempts += 1;
        self.last_attempt = Some(now);
    }

    pub(crate) fn record_reply(&mut self) {
        self.replies += 1;
    }

    pub(crate) fn resolve(&mut self, person: PersonRecord) {
        self.identity = Some(person);
    }

    pub(crate) fn set_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }
}
