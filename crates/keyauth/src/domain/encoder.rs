//! # Response Encoder

use super::entities::AuthResponse;
use bytes::{BufMut, BytesMut};

/// Append the peer's token handle as a big-endian `u32`.
pub fn encode_response(response: &AuthResponse, buf: &mut BytesMut) {
    buf.put_u32(response.peer_token_handle);
}
