//! Encrypted MTProto 2.0 session (post auth-key).
//!
//! Once [`crate::authentication::finish`] (or a stored session) provides a
//! key, wrap it in an [`EncryptedSession`] and use it for every message.

use sessiongen_crypto::{AuthKey, decrypt_data_v2, encrypt_data_v2, random_bytes};
use sessiongen_tl::Serializable;

use crate::message::MsgIdGenerator;

/// Errors that can occur when decrypting a server message.
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptError {
    /// The underlying crypto layer rejected the message.
    Crypto(sessiongen_crypto::DecryptError),
    /// The decrypted inner message was too short for its header or declared length.
    FrameTooShort,
    /// Session-ID mismatch (possible replay or wrong connection).
    SessionMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crypto(e)       => write!(f, "crypto: {e}"),
            Self::FrameTooShort   => write!(f, "inner plaintext too short"),
            Self::SessionMismatch => write!(f, "session_id mismatch"),
        }
    }
}

impl std::error::Error for DecryptError {}

impl From<sessiongen_crypto::DecryptError> for DecryptError {
    fn from(e: sessiongen_crypto::DecryptError) -> Self { Self::Crypto(e) }
}

/// The inner payload extracted from a successfully decrypted server frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptedMessage {
    pub salt:       i64,
    pub session_id: i64,
    pub msg_id:     i64,
    pub seq_no:     i32,
    /// TL-serialized body of the inner message.
    pub body:       Vec<u8>,
}

/// MTProto 2.0 encrypted session state.
///
/// Tracks the session ID, sequence numbers, message IDs and the current
/// server salt around one [`AuthKey`].
pub struct EncryptedSession {
    auth_key:   AuthKey,
    session_id: i64,
    sequence:   i32,
    msg_ids:    MsgIdGenerator,
    /// Current server salt to include in outgoing messages.
    pub salt:   i64,
}

impl EncryptedSession {
    /// Start a session with a random session ID.
    pub fn new(auth_key: [u8; 256], first_salt: i64, time_offset: i32) -> Self {
        Self::with_session_id(auth_key, first_salt, time_offset, i64::from_le_bytes(random_bytes()))
    }

    pub fn with_session_id(auth_key: [u8; 256], salt: i64, time_offset: i32, session_id: i64) -> Self {
        Self {
            auth_key: AuthKey::from_bytes(auth_key),
            session_id,
            sequence: 0,
            msg_ids: MsgIdGenerator::new(time_offset),
            salt,
        }
    }

    /// Next content-related seq_no (odd) and advance the counter.
    fn next_seq_no(&mut self) -> i32 {
        let n = self.sequence * 2 + 1;
        self.sequence += 1;
        n
    }

    /// Current even seq_no for content-unrelated messages (acks).
    fn current_unrelated_seq_no(&self) -> i32 {
        self.sequence * 2
    }

    fn encrypt_inner(&self, msg_id: i64, seq_no: i32, body: &[u8]) -> Vec<u8> {
        let mut plain = Vec::with_capacity(32 + body.len());
        plain.extend(self.salt.to_le_bytes());
        plain.extend(self.session_id.to_le_bytes());
        plain.extend(msg_id.to_le_bytes());
        plain.extend(seq_no.to_le_bytes());
        plain.extend((body.len() as u32).to_le_bytes());
        plain.extend_from_slice(body);
        encrypt_data_v2(&plain, &self.auth_key)
    }

    /// Serialize and encrypt a request. Returns the wire bytes and the
    /// `msg_id` that the matching `rpc_result` will reference.
    ///
    /// Plaintext layout before encryption:
    /// ```text
    /// salt:       i64
    /// session_id: i64
    /// msg_id:     i64
    /// seq_no:     i32
    /// body_len:   i32
    /// body:       [u8; body_len]
    /// ```
    pub fn pack<S: Serializable>(&mut self, call: &S) -> (Vec<u8>, i64) {
        let body   = call.to_bytes();
        let msg_id = self.msg_ids.next_id();
        let seq_no = self.next_seq_no();
        (self.encrypt_inner(msg_id, seq_no, &body), msg_id)
    }

    /// Encrypt a content-unrelated message such as `msgs_ack`.
    pub fn pack_unrelated<S: Serializable>(&mut self, msg: &S) -> Vec<u8> {
        let body   = msg.to_bytes();
        let msg_id = self.msg_ids.next_id();
        let seq_no = self.current_unrelated_seq_no();
        self.encrypt_inner(msg_id, seq_no, &body)
    }

    /// Decrypt an encrypted server frame (abridged prefix already stripped).
    pub fn unpack(&self, frame: &[u8]) -> Result<DecryptedMessage, DecryptError> {
        let plaintext = decrypt_data_v2(frame, &self.auth_key)?;
        if plaintext.len() < 32 {
            return Err(DecryptError::FrameTooShort);
        }

        let field = |range: std::ops::Range<usize>| -> [u8; 8] {
            let mut out = [0u8; 8];
            out.copy_from_slice(&plaintext[range]);
            out
        };
        let word = |at: usize| -> [u8; 4] {
            let mut out = [0u8; 4];
            out.copy_from_slice(&plaintext[at..at + 4]);
            out
        };

        let salt       = i64::from_le_bytes(field(0..8));
        let session_id = i64::from_le_bytes(field(8..16));
        let msg_id     = i64::from_le_bytes(field(16..24));
        let seq_no     = i32::from_le_bytes(word(24));
        let body_len   = u32::from_le_bytes(word(28)) as usize;

        if session_id != self.session_id {
            return Err(DecryptError::SessionMismatch);
        }
        let body = plaintext
            .get(32..32 + body_len)
            .ok_or(DecryptError::FrameTooShort)?
            .to_vec();

        Ok(DecryptedMessage { salt, session_id, msg_id, seq_no, body })
    }

    /// Re-sync the clock from a server `msg_id` (after `bad_msg_notification` 16/17).
    pub fn correct_time_offset(&mut self, server_msg_id: i64) {
        self.msg_ids.correct_from_server_msg_id(server_msg_id);
    }

    pub fn time_offset(&self) -> i32 { self.msg_ids.time_offset }

    /// Return the auth_key bytes (for string sessions).
    pub fn auth_key_bytes(&self) -> [u8; 256] { self.auth_key.to_bytes() }

    pub fn session_id(&self) -> i64 { self.session_id }
}
