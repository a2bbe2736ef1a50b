use bytes::{Buf, BufMut, BytesMut};

use crate::codec::codec_error::{malformed, CodecError};
use crate::codec::embedding_codec::{decode_embedding, encode_embedding};
use crate::shared::constants::{FACE_CROP_CHANNELS, FACE_CROP_SIZE};
use crate::shared::frame::Frame;
use crate::shared::request_mode::RequestMode;

/// Bytes of the fixed-size face crop carried by every identify request.
pub const FACE_CROP_LEN: usize =
    FACE_CROP_SIZE as usize * FACE_CROP_SIZE as usize * FACE_CROP_CHANNELS as usize;

/// An identification job as seen by an identify worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifyRequest {
    pub tracker_id: String,
    pub mode: RequestMode,
    pub face: Frame,
}

/// Result an identify worker sends back to a tracker id's mailbox.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyPayload {
    Embedding(Vec<f32>),
    /// `UNKNOWN_PERSON_ID` when nothing matched.
    PersonId(i64),
}

impl ReplyPayload {
    pub fn mode(&self) -> RequestMode {
        match self {
            ReplyPayload::Embedding(_) => RequestMode::Embed,
            ReplyPayload::PersonId(_) => RequestMode::Identify,
        }
    }
}

/// Layout: `u8` id length, id bytes, mode tag, raw crop bytes.
///
/// The crop is assumed to be shape-checked already; its dimensions are not
/// sent.
pub fn encode_identify_request(
    tracker_id: &str,
    mode: RequestMode,
    face: &Frame,
) -> Result<Vec<u8>, CodecError> {
    let id_len = u8::try_from(tracker_id.len())
        .map_err(|_| malformed(format!("tracker id of {} bytes exceeds 255", tracker_id.len())))?;
    let mut buf = BytesMut::with_capacity(2 + tracker_id.len() + face.data().len());
    buf.put_u8(id_len);
    buf.put_slice(tracker_id.as_bytes());
    buf.put_u8(mode.tag());
    buf.put_slice(face.data());
    Ok(buf.to_vec())
}

pub fn decode_identify_request(mut bytes: &[u8]) -> Result<IdentifyRequest, CodecError> {
    if !bytes.has_remaining() {
        return Err(malformed("empty identify request"));
    }
    let id_len = bytes.get_u8() as usize;
    if bytes.remaining() < id_len + 1 {
        return Err(malformed(format!(
            "identify request truncated inside {id_len}-byte tracker id"
        )));
    }
    let tracker_id = std::str::from_utf8(&bytes[..id_len])
        .map_err(|e| malformed(format!("tracker id is not UTF-8: {e}")))?
        .to_string();
    bytes.advance(id_len);

    let tag = bytes.get_u8();
    let mode = RequestMode::try_from(tag)
        .map_err(|_| malformed(format!("unknown mode tag {tag:#04x}")))?;

    if bytes.remaining() != FACE_CROP_LEN {
        return Err(malformed(format!(
            "face crop needs {FACE_CROP_LEN} bytes, got {}",
            bytes.remaining()
        )));
    }
    let face = Frame::new(
        bytes.to_vec(),
        FACE_CROP_SIZE,
        FACE_CROP_SIZE,
        FACE_CROP_CHANNELS,
    );
    Ok(IdentifyRequest {
        tracker_id,
        mode,
        face,
    })
}

/// One list value per reply: mode tag, then the payload.
///
/// Embeddings are raw little-endian `f32`; person ids are ASCII decimal.
pub fn encode_identify_reply(payload: &ReplyPayload) -> Vec<u8> {
    let body = match payload {
        ReplyPayload::Embedding(values) => encode_embedding(values),
        ReplyPayload::PersonId(id) => id.to_string().into_bytes(),
    };
    let mut buf = BytesMut::with_capacity(1 + body.len());
    buf.put_u8(payload.mode().tag());
    buf.put_slice(&body);
    buf.to_vec()
}

pub fn decode_identify_reply(bytes: &[u8], embedding_dim: usize) -> Result<ReplyPayload, CodecError> {
    let (&tag, body) = bytes
        .split_first()
        .ok_or_else(|| malformed("empty identify reply"))?;
    match RequestMode::try_from(tag) {
        Ok(RequestMode::Embed) => Ok(ReplyPayload::Embedding(decode_embedding(
            body,
            embedding_dim,
        )?)),
        Ok(RequestMode::Identify) => {
            let text = std::str::from_utf8(body)
                .map_err(|e| malformed(format!("person id is not UTF-8: {e}")))?;
            let id = text
                .trim()
                .parse::<i64>()
                .map_err(|e| malformed(format!("person id {text:?}: {e}")))?;
            Ok(ReplyPayload::PersonId(id))
        }
        Err(_) => Err(malformed(format!("unknown reply mode tag {tag:#04x}"))),
    }
}
