use serde::{Deserialize, Serialize};

use crate::shared::dispatch_error::DispatchError;

/// What an identify worker should do with a face crop.
///
/// Travels as a single tag byte in both requests and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Return the face embedding only.
    Embed,
    /// Match the face against the reference set and return a person id.
    Identify,
}

impl RequestMode {
    pub const EMBED_TAG: u8 = b'e';
    pub const IDENTIFY_TAG: u8 = b'i';

    pub fn tag(self) -> u8 {
        match self {
            RequestMode::Embed => Self::EMBED_TAG,
            RequestMode::Identify => Self::IDENTIFY_TAG,
        }
    }
}

impl TryFrom<u8> for RequestMode {
    type Error = DispatchError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            Self::EMBED_TAG => Ok(RequestMode::Embed),
            Self::IDENTIFY_TAG => Ok(RequestMode::Identify),
            other => Err(DispatchError::UnsupportedMode(other)),
        }
    }
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMode::Embed => write!(f, "embed"),
            RequestMode::Identify => write!(f, "identify"),
        }
    }
}
