//! AES-256 in Infinite Garble Extension mode, as used by MTProto.
//!
//! The 32-byte IV is two halves: the "previous ciphertext" block followed by
//! the "previous plaintext" block.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

const BLOCK: usize = 16;

fn xor_into(dst: &mut [u8; BLOCK], a: &[u8], b: &[u8]) {
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b) {
        *d = x ^ y;
    }
}

fn split_iv(iv: &[u8; 32]) -> ([u8; BLOCK], [u8; BLOCK]) {
    let mut c = [0u8; BLOCK];
    let mut p = [0u8; BLOCK];
    c.copy_from_slice(&iv[..BLOCK]);
    p.copy_from_slice(&iv[BLOCK..]);
    (c, p)
}

/// Encrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    debug_assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let (mut prev_cipher, mut prev_plain) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK) {
        let mut plain = [0u8; BLOCK];
        plain.copy_from_slice(block);

        let mut x = [0u8; BLOCK];
        xor_into(&mut x, &plain, &prev_cipher);
        let mut ga = GenericArray::from(x);
        cipher.encrypt_block(&mut ga);

        let mut out = [0u8; BLOCK];
        xor_into(&mut out, &ga, &prev_plain);
        block.copy_from_slice(&out);

        prev_cipher = out;
        prev_plain = plain;
    }
}

/// Decrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    debug_assert_eq!(buffer.len() % BLOCK, 0, "IGE input must be block aligned");
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let (mut prev_cipher, mut prev_plain) = split_iv(iv);

    for block in buffer.chunks_exact_mut(BLOCK) {
        let mut ciphertext = [0u8; BLOCK];
        ciphertext.copy_from_slice(block);

        let mut x = [0u8; BLOCK];
        xor_into(&mut x, &ciphertext, &prev_plain);
        let mut ga = GenericArray::from(x);
        cipher.decrypt_block(&mut ga);

        let mut out = [0u8; BLOCK];
        xor_into(&mut out, &ga, &prev_cipher);
        block.copy_from_slice(&out);

        prev_cipher = ciphertext;
        prev_plain = out;
    }
}
