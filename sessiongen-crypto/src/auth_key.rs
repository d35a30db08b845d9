//! The 256-byte authorization key produced by the DH handshake.

use crate::sha1;

/// A Telegram authorization key plus its derived identifiers.
#[derive(Clone)]
pub struct AuthKey {
    pub(crate) data:     [u8; 256],
    pub(crate) aux_hash: [u8; 8],
    pub(crate) key_id:   [u8; 8],
}

impl AuthKey {
    /// Wrap raw key material, deriving `aux_hash` and `key_id` from its SHA-1.
    pub fn from_bytes(data: [u8; 256]) -> Self {
        let digest = sha1!(&data);
        let mut aux_hash = [0u8; 8];
        let mut key_id   = [0u8; 8];
        aux_hash.copy_from_slice(&digest[..8]);
        key_id.copy_from_slice(&digest[12..]);
        Self { data, aux_hash, key_id }
    }

    pub fn to_bytes(&self) -> [u8; 256] { self.data }

    /// Lower 64 bits of SHA-1(key), sent in front of every encrypted packet.
    pub fn key_id(&self) -> [u8; 8] { self.key_id }

    /// `new_nonce_hash{1,2,3}` as sent in `dh_gen_ok`, `dh_gen_retry` and `dh_gen_fail`.
    pub fn calc_new_nonce_hash(&self, new_nonce: &[u8; 32], number: u8) -> [u8; 16] {
        let digest = sha1!(new_nonce, [number], self.aux_hash);
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[4..]);
        out
    }
}

// Never print key material.
impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthKey(id={:016x})", u64::from_le_bytes(self.key_id))
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool { self.data == other.data }
}

impl Eq for AuthKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_come_from_sha1() {
        let key = AuthKey::from_bytes([7u8; 256]);
        let digest = sha1!([7u8; 256]);
        assert_eq!(key.key_id(), digest[12..20]);
        assert_eq!(key.aux_hash, digest[..8]);
    }

    #[test]
    fn nonce_hash_depends_on_number() {
        let key = AuthKey::from_bytes([1u8; 256]);
        let nonce = [2u8; 32];
        let h1 = key.calc_new_nonce_hash(&nonce, 1);
        let h2 = key.calc_new_nonce_hash(&nonce, 2);
        assert_ne!(h1, h2);

        let mut data = nonce.to_vec();
        data.push(1);
        data.extend_from_slice(&key.aux_hash);
        assert_eq!(h1, sha1!(&data)[4..]);
    }

    #[test]
    fn debug_hides_key() {
        let key = AuthKey::from_bytes([0xabu8; 256]);
        let printed = format!("{key:?}");
        assert!(printed.starts_with("AuthKey(id="));
        assert!(!printed.contains("171, 171"));
    }
}
