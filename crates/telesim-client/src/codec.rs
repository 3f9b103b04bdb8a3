//! Packed-float codec for vector signal payloads.
//!
//! Vectors travel on the wire as raw little-endian `f32`s, four bytes per
//! element, with no header of their own (the preceding JSON message carries
//! the element count).

use crate::protocol::ClientError;

/// Pack a float slice into little-endian bytes.
#[must_use]
pub fn pack_floats(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Unpack little-endian bytes into floats.
///
/// # Errors
///
/// Returns [`ClientError::MalformedPayload`] when the byte length is not a
/// multiple of 4.
pub fn unpack_floats(bytes: &[u8]) -> Result<Vec<f32>, ClientError> {
    if bytes.len() % 4 != 0 {
        return Err(ClientError::MalformedPayload { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
