//! RSA-PAD, the padding scheme used to encrypt `p_q_inner_data` for the server.

use num_bigint::BigUint;

use crate::{aes, sha256};

/// Largest payload RSA-PAD accepts.
pub const MAX_DATA_LEN: usize = 144;

/// An RSA public key (n, e).
#[derive(Clone, Debug)]
pub struct Key {
    n: BigUint,
    e: BigUint,
}

impl Key {
    /// Parse decimal `n` and `e` strings.
    pub fn new(n: &str, e: &str) -> Option<Self> {
        Some(Self {
            n: BigUint::parse_bytes(n.as_bytes(), 10)?,
            e: BigUint::parse_bytes(e.as_bytes(), 10)?,
        })
    }
}

/// Big-endian increment with wrap-around.
fn increment(data: &mut [u8]) {
    for byte in data.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry { return; }
    }
}

/// Encrypt `data` (at most [`MAX_DATA_LEN`] bytes) with RSA-PAD.
///
/// `random_bytes` supplies the 192-byte padding prefix source and the
/// 32-byte temporary AES key. Returns `None` if `data` is too long.
pub fn encrypt_hashed(data: &[u8], key: &Key, random_bytes: &[u8; 224]) -> Option<Vec<u8>> {
    if data.len() > MAX_DATA_LEN {
        return None;
    }

    let mut padded = [0u8; 192];
    padded[..data.len()].copy_from_slice(data);
    padded[data.len()..].copy_from_slice(&random_bytes[..192 - data.len()]);

    let mut reversed = padded;
    reversed.reverse();

    let mut temp_key = [0u8; 32];
    temp_key.copy_from_slice(&random_bytes[192..]);

    let key_aes_encrypted = loop {
        let mut with_hash = [0u8; 224];
        with_hash[..192].copy_from_slice(&reversed);
        with_hash[192..].copy_from_slice(&sha256!(&temp_key, &padded));

        aes::ige_encrypt(&mut with_hash, &temp_key, &[0u8; 32]);

        let hash = sha256!(&with_hash);
        let mut candidate = [0u8; 256];
        for (dst, (k, h)) in candidate[..32].iter_mut().zip(temp_key.iter().zip(&hash)) {
            *dst = k ^ h;
        }
        candidate[32..].copy_from_slice(&with_hash);

        let as_int = BigUint::from_bytes_be(&candidate);
        if as_int < key.n {
            break as_int;
        }
        increment(&mut temp_key);
    };

    let encrypted = key_aes_encrypted.modpow(&key.e, &key.n).to_bytes_be();
    let mut block = vec![0u8; 256 - encrypted.len().min(256)];
    block.extend_from_slice(&encrypted);
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2048-bit modulus: (2^2048 - 1) - 2^2047 + 1, odd and full width.
    fn full_width_key() -> Key {
        let n = (BigUint::from(1u8) << 2048usize) - BigUint::from(159u8);
        Key { n, e: BigUint::from(65537u32) }
    }

    #[test]
    fn output_is_one_block() {
        let key = full_width_key();
        let out = encrypt_hashed(b"payload", &key, &[5u8; 224]).unwrap();
        assert_eq!(out.len(), 256);
        assert!(BigUint::from_bytes_be(&out) < key.n);
    }

    #[test]
    fn rejects_oversized_data() {
        let key = full_width_key();
        assert!(encrypt_hashed(&[0u8; MAX_DATA_LEN + 1], &key, &[0u8; 224]).is_none());
    }

    #[test]
    fn increment_carries() {
        let mut v = [0x00, 0xff, 0xff];
        increment(&mut v);
        assert_eq!(v, [0x01, 0x00, 0x00]);
        let mut w = [0xff; 2];
        increment(&mut w);
        assert_eq!(w, [0x00, 0x00]);
    }

    #[test]
    fn parses_decimal_key() {
        assert!(Key::new("65537", "3").is_some());
        assert!(Key::new("not a number", "3").is_none());
    }
}
