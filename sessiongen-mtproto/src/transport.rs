//! The [MTProto Abridged] transport as a sans-IO codec.
//!
//! Abridged is the simplest framing: send `0xef` once on a new connection,
//! then each packet is `[length/4 as 1 or 4 bytes][payload]`.
//!
//! [MTProto Abridged]: https://core.telegram.org/mtproto/mtproto-transports#abridged

use std::fmt;

/// Errors while reading a frame from the receive buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum UnpackError {
    /// More bytes are needed; `needed` is the total frame size if known.
    Incomplete { needed: Option<usize> },
    /// The server sent a 4-byte negative error code instead of a packet
    /// (e.g. `-404` for an unknown auth key, `-429` for flood).
    Transport(i32),
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete { .. } => write!(f, "incomplete abridged frame"),
            Self::Transport(code)   => write!(f, "transport error {code}"),
        }
    }
}

impl std::error::Error for UnpackError {}

/// A complete frame found at the front of the receive buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Unpacked {
    /// Bytes of the buffer that belong to this frame, header included.
    pub consumed: usize,
    pub payload:  Vec<u8>,
}

/// Abridged framing state; only the outgoing side is stateful.
#[derive(Clone, Debug, Default)]
pub struct AbridgedTransport {
    init_sent: bool,
}

impl AbridgedTransport {
    pub fn new() -> Self { Self::default() }

    /// Append the framed `payload` to `out`, prefixed by `0xef` the first time.
    ///
    /// `payload` length must be a multiple of 4.
    pub fn pack(&mut self, payload: &[u8], out: &mut Vec<u8>) {
        debug_assert_eq!(payload.len() % 4, 0, "abridged payloads are word aligned");
        if !self.init_sent {
            out.push(0xef);
            self.init_sent = true;
        }

        let words = payload.len() / 4;
        if words < 0x7f {
            out.push(words as u8);
        } else {
            out.push(0x7f);
            out.extend_from_slice(&(words as u32).to_le_bytes()[..3]);
        }
        out.extend_from_slice(payload);
    }

    /// Try to read one frame from the front of `buf`.
    pub fn unpack(&self, buf: &[u8]) -> Result<Unpacked, UnpackError> {
        let first = *buf.first().ok_or(UnpackError::Incomplete { needed: None })?;
        let (header, words) = if first < 0x7f {
            (1, first as usize)
        } else {
            let ext = buf.get(1..4).ok_or(UnpackError::Incomplete { needed: None })?;
            (4, ext[0] as usize | (ext[1] as usize) << 8 | (ext[2] as usize) << 16)
        };

        let needed = header + words * 4;
        let payload = buf
            .get(header..needed)
            .ok_or(UnpackError::Incomplete { needed: Some(needed) })?;

        if payload.len() == 4 {
            let code = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            if code < 0 {
                return Err(UnpackError::Transport(code));
            }
        }

        Ok(Unpacked { consumed: needed, payload: payload.to_vec() })
    }
}
