use bytes::{Buf, BufMut, BytesMut};

use crate::codec::codec_error::{malformed, CodecError};
use crate::shared::frame::Frame;

/// `height`, `width`, `channels` as little-endian `u16`.
pub const FRAME_HEADER_LEN: usize = 6;

pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + frame.data().len());
    buf.put_u16_le(frame.height());
    buf.put_u16_le(frame.width());
    buf.put_u16_le(frame.channels());
    buf.put_slice(frame.data());
    buf.to_vec()
}

pub fn decode_frame(mut bytes: &[u8]) -> Result<Frame, CodecError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(malformed(format!(
            "frame header needs {FRAME_HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let height = bytes.get_u16_le();
    let width = bytes.get_u16_le();
    let channels = bytes.get_u16_le();

    Frame::try_new(bytes.to_vec(), height, width, channels).map_err(|e| malformed(e.to_string()))
}
