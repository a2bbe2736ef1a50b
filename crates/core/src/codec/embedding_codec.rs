use bytes::{Buf, BufMut, BytesMut};

use crate::codec::codec_error::{malformed, CodecError};

pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(embedding.len() * 4);
    for &value in embedding {
        buf.put_f32_le(value);
    }
    buf.to_vec()
}

/// Decodes exactly `dim` little-endian `f32` values.
pub fn decode_embedding(mut bytes: &[u8], dim: usize) -> Result<Vec<f32>, CodecError> {
    if bytes.len() != dim * 4 {
        return Err(malformed(format!(
            "embedding of dimension {dim} needs {} bytes, got {}",
            dim * 4,
            bytes.len()
        )));
    }
    let mut embedding = Vec::with_capacity(dim);
    while bytes.has_remaining() {
        embedding.push(bytes.get_f32_le());
    }
    Ok(embedding)
}
