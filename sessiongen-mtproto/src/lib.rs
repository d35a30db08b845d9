//! MTProto 2.0 without I/O.
//!
//! This crate handles:
//! * The authorization key handshake ([`authentication`])
//! * Encrypted message framing, sequence numbers and message IDs ([`EncryptedSession`])
//! * Plaintext framing for the handshake ([`message`])
//! * The abridged transport codec ([`transport`])
//!
//! Bytes in, bytes out: the caller owns the socket.

#![deny(unsafe_code)]

pub mod authentication;
pub mod encrypted;
pub mod message;
pub mod transport;

pub use encrypted::{DecryptError, DecryptedMessage, EncryptedSession};
pub use message::MsgIdGenerator;
pub use transport::AbridgedTransport;
