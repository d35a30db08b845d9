//! The [`Serializable`] trait and its implementations for primitive TL types.
//!
//! Encoding follows the [MTProto Binary Serialization] rules.
//!
//! [MTProto Binary Serialization]: https://core.telegram.org/mtproto/serialize

/// Serialize `self` into TL binary format.
pub trait Serializable {
    /// Appends the serialized form of `self` to `buf`.
    fn serialize(&self, buf: &mut Vec<u8>);

    /// Convenience: allocate a fresh `Vec<u8>` and serialize into it.
    fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::new();
        self.serialize(&mut v);
        v
    }
}

// ─── bool ────────────────────────────────────────────────────────────────────

/// `true`  → `boolTrue#997275b5`
/// `false` → `boolFalse#bc799737`
impl Serializable for bool {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let id: u32 = if *self { 0x997275b5 } else { 0xbc799737 };
        id.serialize(buf);
    }
}

// ─── integers ────────────────────────────────────────────────────────────────

macro_rules! le_bytes {
    ($($t:ty),+) => {$(
        impl Serializable for $t {
            fn serialize(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }
        }
    )+};
}

le_bytes!(i32, u32, i64);

// int128 / int256 are written as raw bytes.
impl<const N: usize> Serializable for [u8; N] {
    fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

// ─── strings / bytes ─────────────────────────────────────────────────────────

/// TL `bytes` encoding: a length-prefixed, 4-byte aligned byte string.
///
/// * `len ≤ 253`: `[len as u8][data][0-padding]`
/// * `len ≥ 254`: `[0xfe][len as 3 LE bytes][data][0-padding]`
impl Serializable for [u8] {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let len = self.len();
        let header_len = if len <= 253 {
            buf.push(len as u8);
            1
        } else {
            buf.extend_from_slice(&[
                0xfe,
                (len & 0xff) as u8,
                ((len >> 8) & 0xff) as u8,
                ((len >> 16) & 0xff) as u8,
            ]);
            4
        };
        buf.extend_from_slice(self);
        let padding = (4 - ((header_len + len) % 4)) % 4;
        buf.extend(std::iter::repeat_n(0u8, padding));
    }
}

impl Serializable for Vec<u8> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_slice().serialize(buf);
    }
}

impl Serializable for str {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_bytes().serialize(buf);
    }
}

impl Serializable for String {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_bytes().serialize(buf);
    }
}

// ─── vectors ─────────────────────────────────────────────────────────────────

/// Boxed `Vector<T>` of TL objects.
///
/// Byte vectors are `bytes`, not `Vector<int>`, so this goes through a
/// wrapper rather than a blanket `Vec<T>` impl.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxedVec<T>(pub Vec<T>);

impl<T: Serializable> Serializable for BoxedVec<T> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        crate::VECTOR_ID.serialize(buf);
        (self.0.len() as i32).serialize(buf);
        for item in &self.0 { item.serialize(buf); }
    }
}

// ─── Option ──────────────────────────────────────────────────────────────────

/// Optional parameters are governed by a flags word; `None` writes nothing.
impl<T: Serializable> Serializable for Option<T> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        if let Some(v) = self { v.serialize(buf); }
    }
}
