use thiserror::Error;

/// Decoding failure of broker-delivered bytes.
///
/// There is no partial-decode recovery: the whole payload is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

pub(crate) fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::MalformedPayload(message.into())
}
