//! Message IDs and the plaintext framing used before an auth key exists.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hands out client message IDs.
///
/// An ID is the (server-corrected) Unix time in the upper 32 bits and a
/// sub-second fraction below, divisible by 4, strictly increasing.
#[derive(Clone, Debug, Default)]
pub struct MsgIdGenerator {
    last:        i64,
    /// Seconds to add to local time to get server time.
    pub time_offset: i32,
}

impl MsgIdGenerator {
    pub fn new(time_offset: i32) -> Self {
        Self { last: 0, time_offset }
    }

    /// Allocate the next message ID.
    pub fn next_id(&mut self) -> i64 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        self.next_id_at(now.as_secs() as i64, now.subsec_nanos())
    }

    pub(crate) fn next_id_at(&mut self, unix_secs: i64, nanos: u32) -> i64 {
        let secs = unix_secs + self.time_offset as i64;
        let mut id = (secs << 32) | ((nanos as i64) << 2);
        id &= !3;
        if id <= self.last {
            id = self.last + 4;
        }
        self.last = id;
        id
    }

    /// Re-derive the clock offset from a message ID the server generated.
    pub fn correct_from_server_msg_id(&mut self, server_msg_id: i64) {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let server_secs = server_msg_id >> 32;
        self.time_offset = (server_secs - now.as_secs() as i64) as i32;
        log::debug!("[sessiongen] clock offset corrected to {}s", self.time_offset);
    }
}

/// Errors while reading a plaintext frame.
#[derive(Clone, Debug, PartialEq)]
pub enum PlainError {
    /// Shorter than the 20-byte header, or shorter than its declared length.
    TooShort { len: usize },
    /// `auth_key_id` was not zero.
    NotPlaintext { auth_key_id: i64 },
}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "plaintext frame too short ({len} bytes)"),
            Self::NotPlaintext { auth_key_id } => {
                write!(f, "expected plaintext frame, got auth_key_id {auth_key_id:#x}")
            }
        }
    }
}

impl std::error::Error for PlainError {}

/// Frame `body` as an unencrypted message:
///
/// ```text
/// auth_key_id:long  (0 for plaintext)
/// message_id:long
/// message_data_length:int
/// message_data:bytes
/// ```
pub fn pack_plain(msg_id: i64, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20 + body.len());
    buf.extend(0i64.to_le_bytes());
    buf.extend(msg_id.to_le_bytes());
    buf.extend((body.len() as u32).to_le_bytes());
    buf.extend_from_slice(body);
    buf
}

/// Split a plaintext frame into `(msg_id, body)`.
pub fn unpack_plain(frame: &[u8]) -> Result<(i64, &[u8]), PlainError> {
    let too_short = || PlainError::TooShort { len: frame.len() };
    let header = frame.get(..20).ok_or_else(too_short)?;

    let auth_key_id = i64::from_le_bytes(header[..8].try_into().map_err(|_| too_short())?);
    if auth_key_id != 0 {
        return Err(PlainError::NotPlaintext { auth_key_id });
    }
    let msg_id = i64::from_le_bytes(header[8..16].try_into().map_err(|_| too_short())?);
    let len = u32::from_le_bytes(header[16..20].try_into().map_err(|_| too_short())?) as usize;
    let body = frame.get(20..20 + len).ok_or_else(too_short)?;
    Ok((msg_id, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_aligned() {
        let mut g = MsgIdGenerator::new(0);
        let a = g.next_id_at(1_700_000_000, 500);
        let b = g.next_id_at(1_700_000_000, 500);
        let c = g.next_id_at(1_699_999_999, 0);
        assert!(a < b && b < c);
        for id in [a, b, c] {
            assert_eq!(id % 4, 0);
        }
        assert_eq!(a >> 32, 1_700_000_000);
    }

    #[test]
    fn offset_shifts_seconds() {
        let mut g = MsgIdGenerator::new(-30);
        let id = g.next_id_at(1_000, 0);
        assert_eq!(id >> 32, 970);
    }

    #[test]
    fn server_msg_id_sets_offset() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let mut g = MsgIdGenerator::new(0);
        g.correct_from_server_msg_id((now + 100) << 32);
        assert!((99..=101).contains(&g.time_offset));
    }
}
