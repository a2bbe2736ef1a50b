use crate::identity::domain::identity_store::PersonRecord;
use crate::shared::request_mode::RequestMode;

/// A mailbox reply after person ids have been resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum IdentificationReply {
    Embedding(Vec<f32>),
    Identified(PersonRecord),
    /// The worker found no match, or the matched id is not in the store.
    Unknown,
}

impl IdentificationReply {
    pub fn mode(&self) -> RequestMode {
        match self {
            IdentificationReply::Embedding(_) => RequestMode::Embed,
            IdentificationReply::Identified(_) | IdentificationReply::Unknown => {
                RequestMode::Identify
            }
        }
    }
}
