use bytes::{Buf, BufMut, BytesMut};

use crate::codec::codec_error::{malformed, CodecError};
use crate::shared::bounding_box::BoundingBox;

const BOX_LEN: usize = 8;

/// Flat little-endian `u16` quadruples; no boxes encodes as no bytes.
pub fn encode_boxes(boxes: &[BoundingBox]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(boxes.len() * BOX_LEN);
    for b in boxes {
        buf.put_u16_le(b.x);
        buf.put_u16_le(b.y);
        buf.put_u16_le(b.width);
        buf.put_u16_le(b.height);
    }
    buf.to_vec()
}

pub fn decode_boxes(bytes: &[u8]) -> Result<Vec<BoundingBox>, CodecError> {
    if bytes.len() % BOX_LEN != 0 {
        return Err(malformed(format!(
            "boxes payload of {} bytes is not a multiple of {BOX_LEN}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(BOX_LEN)
        .map(|mut chunk| {
            BoundingBox::new(
                chunk.get_u16_le(),
                chunk.get_u16_le(),
                chunk.get_u16_le(),
                chunk.get_u16_le(),
            )
        })
        .collect())
}
