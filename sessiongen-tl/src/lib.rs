//! TL types for logging in to Telegram.
//!
//! Only the constructors a user login touches are covered, written by hand
//! rather than generated from the full schema.
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`mtproto`]  | Auth key handshake and service messages                 |
//! | [`api`]      | `initConnection`, `auth.*`, `account.getPassword`, ...  |
//!
//! # Usage
//!
//! ```rust
//! use sessiongen_tl::{api, Serializable};
//!
//! let req = api::auth::SendCode {
//!     phone_number: "+1234567890".into(),
//!     api_id:       12345,
//!     api_hash:     "abc".into(),
//!     settings:     Default::default(),
//! };
//!
//! let bytes = req.to_bytes();
//! assert_eq!(&bytes[..4], &0xa677244f_u32.to_le_bytes());
//! ```

#![deny(unsafe_code)]

pub mod api;
pub mod deserialize;
pub mod mtproto;
pub mod serialize;

pub use deserialize::{Cursor, Deserializable};
pub use serialize::{BoxedVec, Serializable};

/// API layer announced through `invokeWithLayer`.
pub const LAYER: i32 = 158;

/// Constructor ID of the boxed `Vector` type.
pub const VECTOR_ID: u32 = 0x1cb5c415;

/// Opaque blob of bytes that should be passed through without interpretation.
///
/// Returned by functions whose response this crate does not model.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(v: Vec<u8>) -> Self { Self(v) }
}

impl Deserializable for Blob {
    fn deserialize(buf: deserialize::Buffer) -> deserialize::Result<Self> {
        let mut data = Vec::new();
        buf.read_to_end(&mut data);
        Ok(Self(data))
    }
}

// ─── Core traits ──────────────────────────────────────────────────────────────

/// Every constructor has a unique 32-bit ID.
pub trait Identifiable {
    /// The constructor ID as specified in the TL schema.
    const CONSTRUCTOR_ID: u32;
}

/// Marks a function type that can be sent to Telegram as an RPC call.
///
/// `Return` is the type Telegram will respond with.
pub trait RemoteCall: Serializable {
    /// The deserialized response type.
    type Return: Deserializable;
}

/// Reads a constructor ID and checks it against `expected`.
pub(crate) fn expect_id(buf: deserialize::Buffer, expected: u32) -> deserialize::Result<()> {
    let id = u32::deserialize(buf)?;
    if id == expected { Ok(()) } else { Err(deserialize::Error::UnexpectedConstructor { id }) }
}
