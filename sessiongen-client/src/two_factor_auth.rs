//! SRP math for two-step verification (`auth.checkPassword`).

use num_bigint::{BigInt, Sign};
use num_traits::ops::euclid::Euclid;
use sha2::{Digest, Sha256, Sha512};

const PBKDF2_ROUNDS: u32 = 100_000;

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = Sha256::new();
    for p in parts { h.update(p); }
    h.finalize().into()
}

/// `SH(data, salt) = H(salt | data | salt)`
fn sh(data: &[u8], salt: &[u8]) -> [u8; 32] {
    sha256(&[salt, data, salt])
}

fn ph1(password: &[u8], salt1: &[u8], salt2: &[u8]) -> [u8; 32] {
    sh(&sh(password, salt1), salt2)
}

fn ph2(password: &[u8], salt1: &[u8], salt2: &[u8]) -> [u8; 32] {
    let hash1 = ph1(password, salt1, salt2);
    let mut dk = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(&hash1, salt1, PBKDF2_ROUNDS, &mut dk);
    sh(&dk, salt2)
}

fn pad256(data: &[u8]) -> [u8; 256] {
    let mut out = [0u8; 256];
    let data = &data[data.len().saturating_sub(256)..];
    out[256 - data.len()..].copy_from_slice(data);
    out
}

fn xor32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for i in 0..32 { out[i] = a[i] ^ b[i]; }
    out
}

fn big(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

/// Compute the SRP proof `(M1, g_a)` for `password`.
///
/// `salt1`, `salt2`, `p` and `g` come from the account's current
/// `passwordKdfAlgo`; `g_b` is the server's `srp_B`; `a` is 256 random bytes.
pub fn calculate_2fa(
    salt1:    &[u8],
    salt2:    &[u8],
    p:        &[u8],
    g:        i32,
    g_b:      &[u8],
    a:        &[u8],
    password: impl AsRef<[u8]>,
) -> ([u8; 32], [u8; 256]) {
    let big_p  = big(p);
    let g_b    = pad256(g_b);
    let a      = pad256(a);
    let g_pad  = pad256(&(g as u32).to_be_bytes());

    let big_g   = BigInt::from(g as u32);
    let big_g_b = big(&g_b);
    let big_a   = big(&a);

    let big_k = big(&sha256(&[p, &g_pad]));

    let g_a = pad256(&big_g.modpow(&big_a, &big_p).to_bytes_be().1);

    let big_u = big(&sha256(&[&g_a, &g_b]));
    let big_x = big(&ph2(password.as_ref(), salt1, salt2));

    let big_v  = big_g.modpow(&big_x, &big_p);
    let big_kv = (big_k * big_v) % &big_p;
    let big_t  = (big_g_b - big_kv).rem_euclid(&big_p);

    let exp   = big_a + big_u * big_x;
    let big_s = big_t.modpow(&exp, &big_p);
    let k_a   = sha256(&[&pad256(&big_s.to_bytes_be().1)]);

    let h_pg = xor32(&sha256(&[p]), &sha256(&[&g_pad]));
    let m1   = sha256(&[&h_pg, &sha256(&[salt1]), &sha256(&[salt2]), &g_a, &g_b, &k_a]);

    (m1, g_a)
}
