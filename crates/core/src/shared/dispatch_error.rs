use std::time::Duration;

use thiserror::Error;

use crate::broker::domain::broker::BrokerError;
use crate::codec::codec_error::CodecError;

/// Failures of the client/worker dispatch protocol.
///
/// `Timeout` and `Busy` abort session start-up. `InvalidShape`,
/// `UnsupportedMode`, `MalformedPayload` and `WorkerTimeout` concern a single
/// request and are handled per frame or per tracked object.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no admission reply within {0:?}")]
    Timeout(Duration),

    #[error("worker pool is busy")]
    Busy,

    #[error("session is already subscribed to channel {channel}")]
    AlreadySubscribed { channel: String },

    #[error("session is not subscribed to a worker")]
    NotSubscribed,

    #[error("face crop must have shape {expected:?}, got {actual:?}")]
    InvalidShape {
        expected: (u16, u16, u16),
        actual: (u16, u16, u16),
    },

    #[error("unsupported request mode {0:#04x}")]
    UnsupportedMode(u8),

    #[error(transparent)]
    MalformedPayload(#[from] CodecError),

    #[error("no worker reply within {0:?}")]
    WorkerTimeout(Duration),

    #[error("lookup of person {person_id} failed: {message}")]
    IdentityLookup { person_id: i64, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("frame relay closed")]
    RelayClosed,

    #[error(transparent)]
    Broker(#[from] BrokerError),
}
