//! Cryptographic primitives for Telegram MTProto 2.0.
//!
//! Provides:
//! - AES-256-IGE encryption/decryption
//! - SHA-1 / SHA-256 hash macros
//! - Pollard-rho PQ factorization
//! - RSA padding (MTProto RSA-PAD scheme)
//! - [`AuthKey`] with its derived identifiers
//! - MTProto 2.0 message encryption / decryption
//! - DH nonce→key derivation

#![deny(unsafe_code)]

pub mod aes;
mod auth_key;
mod factorize;
pub mod rsa;
mod sha;

pub use auth_key::AuthKey;
pub use factorize::factorize;

#[doc(hidden)]
pub mod __private {
    pub use ::sha1;
    pub use ::sha2;
}

/// Fill an array from the OS RNG.
///
/// # Panics
///
/// If the operating system cannot provide randomness; nothing secure can be
/// done without it.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).expect("OS random number generator failed");
    buf
}

// ─── MTProto 2.0 encrypt / decrypt ───────────────────────────────────────────

/// Errors from [`decrypt_data_v2`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptError {
    /// Ciphertext too short or not block-aligned.
    InvalidBuffer,
    /// The `auth_key_id` in the ciphertext does not match our key.
    AuthKeyMismatch,
    /// The `msg_key` in the ciphertext does not match our computed value.
    MessageKeyMismatch,
}

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBuffer      => write!(f, "invalid ciphertext buffer length"),
            Self::AuthKeyMismatch    => write!(f, "auth_key_id mismatch"),
            Self::MessageKeyMismatch => write!(f, "msg_key mismatch"),
        }
    }
}

impl std::error::Error for DecryptError {}

/// Which end of the connection produced a message; selects the key offset `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    fn x(self) -> usize {
        match self {
            Side::Client => 0,
            Side::Server => 8,
        }
    }
}

fn calc_key(auth_key: &AuthKey, msg_key: &[u8; 16], side: Side) -> ([u8; 32], [u8; 32]) {
    let x = side.x();
    let sha_a = sha256!(msg_key, &auth_key.data[x..x + 36]);
    let sha_b = sha256!(&auth_key.data[40 + x..40 + x + 36], msg_key);

    let mut aes_key = [0u8; 32];
    aes_key[..8].copy_from_slice(&sha_a[..8]);
    aes_key[8..24].copy_from_slice(&sha_b[8..24]);
    aes_key[24..].copy_from_slice(&sha_a[24..]);

    let mut aes_iv = [0u8; 32];
    aes_iv[..8].copy_from_slice(&sha_b[..8]);
    aes_iv[8..24].copy_from_slice(&sha_a[8..24]);
    aes_iv[24..].copy_from_slice(&sha_b[24..]);

    (aes_key, aes_iv)
}

fn msg_key_for(auth_key: &AuthKey, padded: &[u8], side: Side) -> [u8; 16] {
    let x = side.x();
    let large = sha256!(&auth_key.data[88 + x..88 + x + 32], padded);
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&large[8..24]);
    msg_key
}

/// 12 to 1024 bytes of padding are required; this picks 17 to 32.
fn padding_len(len: usize) -> usize {
    16 + (16 - (len % 16))
}

fn encrypt_as(plaintext: &[u8], auth_key: &AuthKey, side: Side, rnd: &[u8; 32]) -> Vec<u8> {
    let pad = padding_len(plaintext.len());
    let mut padded = Vec::with_capacity(plaintext.len() + pad);
    padded.extend_from_slice(plaintext);
    padded.extend_from_slice(&rnd[..pad]);

    let msg_key = msg_key_for(auth_key, &padded, side);
    let (key, iv) = calc_key(auth_key, &msg_key, side);
    aes::ige_encrypt(&mut padded, &key, &iv);

    let mut out = Vec::with_capacity(24 + padded.len());
    out.extend_from_slice(&auth_key.key_id);
    out.extend_from_slice(&msg_key);
    out.extend_from_slice(&padded);
    out
}

fn decrypt_as(buffer: &[u8], auth_key: &AuthKey, side: Side) -> Result<Vec<u8>, DecryptError> {
    if buffer.len() < 24 || (buffer.len() - 24) % 16 != 0 {
        return Err(DecryptError::InvalidBuffer);
    }
    if auth_key.key_id != buffer[..8] {
        return Err(DecryptError::AuthKeyMismatch);
    }
    let mut msg_key = [0u8; 16];
    msg_key.copy_from_slice(&buffer[8..24]);

    let (key, iv) = calc_key(auth_key, &msg_key, side);
    let mut plaintext = buffer[24..].to_vec();
    aes::ige_decrypt(&mut plaintext, &key, &iv);

    if msg_key != msg_key_for(auth_key, &plaintext, side) {
        return Err(DecryptError::MessageKeyMismatch);
    }
    Ok(plaintext)
}

/// Encrypt a client message with MTProto 2.0.
///
/// Returns `key_id || msg_key || ciphertext`.
pub fn encrypt_data_v2(plaintext: &[u8], auth_key: &AuthKey) -> Vec<u8> {
    encrypt_as(plaintext, auth_key, Side::Client, &random_bytes())
}

/// Decrypt a server message. Returns the plaintext, padding included.
pub fn decrypt_data_v2(buffer: &[u8], auth_key: &AuthKey) -> Result<Vec<u8>, DecryptError> {
    decrypt_as(buffer, auth_key, Side::Server)
}

/// Encrypt as `side` with caller-provided padding. Lets tests and loopback
/// servers produce frames the other end accepts.
pub fn encrypt_data_v2_as(plaintext: &[u8], auth_key: &AuthKey, side: Side, rnd: &[u8; 32]) -> Vec<u8> {
    encrypt_as(plaintext, auth_key, side, rnd)
}

/// Decrypt a frame produced by `side`.
pub fn decrypt_data_v2_as(buffer: &[u8], auth_key: &AuthKey, side: Side) -> Result<Vec<u8>, DecryptError> {
    decrypt_as(buffer, auth_key, side)
}

/// Derive `(key, iv)` from nonces for decrypting `ServerDhParams.encrypted_answer`.
pub fn generate_key_data_from_nonce(server_nonce: &[u8; 16], new_nonce: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let h1 = sha1!(new_nonce, server_nonce);
    let h2 = sha1!(server_nonce, new_nonce);
    let h3 = sha1!(new_nonce, new_nonce);

    let mut key = [0u8; 32];
    key[..20].copy_from_slice(&h1);
    key[20..].copy_from_slice(&h2[..12]);

    let mut iv = [0u8; 32];
    iv[..8].copy_from_slice(&h2[12..]);
    iv[8..28].copy_from_slice(&h3);
    iv[28..].copy_from_slice(&new_nonce[..4]);

    (key, iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AuthKey {
        AuthKey::from_bytes(std::array::from_fn(|i| (i * 31 % 251) as u8))
    }

    #[test]
    fn server_frame_decrypts() {
        let key = key();
        let plain = b"0123456789abcdef0123456789abcdef-tail".to_vec();
        let frame = encrypt_data_v2_as(&plain, &key, Side::Server, &[9u8; 32]);
        assert_eq!(&frame[..8], &key.key_id());
        assert_eq!((frame.len() - 24) % 16, 0);

        let out = decrypt_data_v2(&frame, &key).unwrap();
        assert_eq!(&out[..plain.len()], &plain[..]);
        assert!(out.len() - plain.len() >= 12);
    }

    #[test]
    fn client_frame_is_not_a_server_frame() {
        let key = key();
        let frame = encrypt_data_v2(&[1u8; 40], &key);
        assert_eq!(decrypt_data_v2(&frame, &key), Err(DecryptError::MessageKeyMismatch));
        assert_eq!(decrypt_data_v2_as(&frame, &key, Side::Client).unwrap()[..40], [1u8; 40]);
    }

    #[test]
    fn rejects_malformed_frames() {
        let key = key();
        assert_eq!(decrypt_data_v2(&[0u8; 20], &key), Err(DecryptError::InvalidBuffer));
        assert_eq!(decrypt_data_v2(&[0u8; 25], &key), Err(DecryptError::InvalidBuffer));

        let mut frame = encrypt_data_v2_as(&[2u8; 16], &key, Side::Server, &[0u8; 32]);
        frame[0] ^= 1;
        assert_eq!(decrypt_data_v2(&frame, &key), Err(DecryptError::AuthKeyMismatch));
        frame[0] ^= 1;
        let last = frame.len() - 1;
        frame[last] ^= 1;
        assert_eq!(decrypt_data_v2(&frame, &key), Err(DecryptError::MessageKeyMismatch));
    }

    #[test]
    fn nonce_key_layout() {
        let server_nonce = [1u8; 16];
        let new_nonce = [2u8; 32];
        let (key, iv) = generate_key_data_from_nonce(&server_nonce, &new_nonce);
        assert_eq!(key[..20], sha1!(new_nonce, server_nonce));
        assert_eq!(iv[28..], new_nonce[..4]);
    }
}
