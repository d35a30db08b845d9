//! The slice of the Telegram API a login needs.
//!
//! Requests only implement [`Serializable`]; responses only implement
//! [`Deserializable`]. Optional response fields beyond the ones the login
//! flow reads are skipped.

use crate::deserialize::{Buffer, Error, Result};
use crate::serialize::BoxedVec;
use crate::{Blob, Deserializable, Identifiable, RemoteCall, Serializable, expect_id};

// ─── Wrappers ────────────────────────────────────────────────────────────────

/// `invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X`
#[derive(Clone, Debug, PartialEq)]
pub struct InvokeWithLayer<X> {
    pub layer: i32,
    pub query: X,
}

impl<X> Identifiable for InvokeWithLayer<X> { const CONSTRUCTOR_ID: u32 = 0xda9b0d0d; }

impl<X: Serializable> Serializable for InvokeWithLayer<X> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        self.layer.serialize(buf);
        self.query.serialize(buf);
    }
}

impl<X: RemoteCall> RemoteCall for InvokeWithLayer<X> { type Return = X::Return; }

/// `initConnection#c1cd5ea9` without the optional proxy and params fields.
#[derive(Clone, Debug, PartialEq)]
pub struct InitConnection<X> {
    pub api_id:           i32,
    pub device_model:     String,
    pub system_version:   String,
    pub app_version:      String,
    pub system_lang_code: String,
    pub lang_pack:        String,
    pub lang_code:        String,
    pub query:            X,
}

impl<X> Identifiable for InitConnection<X> { const CONSTRUCTOR_ID: u32 = 0xc1cd5ea9; }

impl<X: Serializable> Serializable for InitConnection<X> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::CONSTRUCTOR_ID.serialize(buf);
        0u32.serialize(buf);
        self.api_id.serialize(buf);
        self.device_model.serialize(buf);
        self.system_version.serialize(buf);
        self.app_version.serialize(buf);
        self.system_lang_code.serialize(buf);
        self.lang_pack.serialize(buf);
        self.lang_code.serialize(buf);
        self.query.serialize(buf);
    }
}

impl<X: RemoteCall> RemoteCall for InitConnection<X> { type Return = X::Return; }

// ─── help ────────────────────────────────────────────────────────────────────

pub mod help {
    use super::*;

    /// `help.getNearestDc#1fb33026 = NearestDc`
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetNearestDc;

    impl Identifiable for GetNearestDc { const CONSTRUCTOR_ID: u32 = 0x1fb33026; }

    impl Serializable for GetNearestDc {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
        }
    }

    impl RemoteCall for GetNearestDc { type Return = NearestDc; }

    /// `nearestDc#8e1a1775 country:string this_dc:int nearest_dc:int`
    #[derive(Clone, Debug, PartialEq)]
    pub struct NearestDc {
        pub country:    String,
        pub this_dc:    i32,
        pub nearest_dc: i32,
    }

    impl Identifiable for NearestDc { const CONSTRUCTOR_ID: u32 = 0x8e1a1775; }

    impl Deserializable for NearestDc {
        fn deserialize(buf: Buffer) -> Result<Self> {
            expect_id(buf, Self::CONSTRUCTOR_ID)?;
            Ok(Self {
                country:    String::deserialize(buf)?,
                this_dc:    i32::deserialize(buf)?,
                nearest_dc: i32::deserialize(buf)?,
            })
        }
    }
}

// ─── auth ────────────────────────────────────────────────────────────────────

pub mod auth {
    use super::*;

    /// `codeSettings#ad253d78`, boolean flags only.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct CodeSettings {
        pub allow_flashcall:   bool,
        pub current_number:    bool,
        pub allow_app_hash:    bool,
        pub allow_missed_call: bool,
    }

    impl Identifiable for CodeSettings { const CONSTRUCTOR_ID: u32 = 0xad253d78; }

    impl Serializable for CodeSettings {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            let flags = (self.allow_flashcall as u32)
                | (self.current_number as u32) << 1
                | (self.allow_app_hash as u32) << 4
                | (self.allow_missed_call as u32) << 5;
            flags.serialize(buf);
        }
    }

    /// `auth.sendCode#a677244f phone_number:string api_id:int api_hash:string settings:CodeSettings`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SendCode {
        pub phone_number: String,
        pub api_id:       i32,
        pub api_hash:     String,
        pub settings:     CodeSettings,
    }

    impl Identifiable for SendCode { const CONSTRUCTOR_ID: u32 = 0xa677244f; }

    impl Serializable for SendCode {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            self.phone_number.serialize(buf);
            self.api_id.serialize(buf);
            self.api_hash.serialize(buf);
            self.settings.serialize(buf);
        }
    }

    impl RemoteCall for SendCode { type Return = SentCode; }

    /// How the login code was delivered.
    #[derive(Clone, Debug, PartialEq)]
    pub enum SentCodeType {
        App          { length: i32 },
        Sms          { length: i32 },
        Call         { length: i32 },
        FlashCall    { pattern: String },
        MissedCall   { prefix: String, length: i32 },
        EmailCode    { email_pattern: String, length: i32 },
        SetUpEmailRequired,
        FragmentSms  { url: String, length: i32 },
    }

    impl Deserializable for SentCodeType {
        fn deserialize(buf: Buffer) -> Result<Self> {
            Ok(match u32::deserialize(buf)? {
                0x3dbb5986 => Self::App  { length: i32::deserialize(buf)? },
                0xc000bba2 => Self::Sms  { length: i32::deserialize(buf)? },
                0x5353e5a7 => Self::Call { length: i32::deserialize(buf)? },
                0xab03c6d9 => Self::FlashCall { pattern: String::deserialize(buf)? },
                0x82006484 => Self::MissedCall {
                    prefix: String::deserialize(buf)?,
                    length: i32::deserialize(buf)?,
                },
                0xf450f59b => {
                    let flags = u32::deserialize(buf)?;
                    let email_pattern = String::deserialize(buf)?;
                    let length = i32::deserialize(buf)?;
                    if flags & (1 << 3) != 0 { i32::deserialize(buf)?; }
                    if flags & (1 << 4) != 0 { i32::deserialize(buf)?; }
                    Self::EmailCode { email_pattern, length }
                }
                0x5a159841 => {
                    let flags = u32::deserialize(buf)?;
                    let email_pattern = String::deserialize(buf)?;
                    let length = i32::deserialize(buf)?;
                    if flags & (1 << 2) != 0 { i32::deserialize(buf)?; }
                    Self::EmailCode { email_pattern, length }
                }
                0xa5491dea => {
                    u32::deserialize(buf)?;
                    Self::SetUpEmailRequired
                }
                0xd9565c39 => Self::FragmentSms {
                    url:    String::deserialize(buf)?,
                    length: i32::deserialize(buf)?,
                },
                id => return Err(Error::UnexpectedConstructor { id }),
            })
        }
    }

    /// `auth.sentCode#5e002502`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SentCode {
        pub r#type:          SentCodeType,
        pub phone_code_hash: String,
        /// Constructor ID of the `auth.CodeType` that a resend would use.
        pub next_type:       Option<u32>,
        pub timeout:         Option<i32>,
    }

    impl Identifiable for SentCode { const CONSTRUCTOR_ID: u32 = 0x5e002502; }

    impl Deserializable for SentCode {
        fn deserialize(buf: Buffer) -> Result<Self> {
            expect_id(buf, Self::CONSTRUCTOR_ID)?;
            let flags = u32::deserialize(buf)?;
            let r#type = SentCodeType::deserialize(buf)?;
            let phone_code_hash = String::deserialize(buf)?;
            let next_type = if flags & (1 << 1) != 0 { Some(u32::deserialize(buf)?) } else { None };
            let timeout   = if flags & (1 << 2) != 0 { Some(i32::deserialize(buf)?) } else { None };
            Ok(Self { r#type, phone_code_hash, next_type, timeout })
        }
    }

    /// `auth.signIn#8d52a951`
    #[derive(Clone, Debug, PartialEq)]
    pub struct SignIn {
        pub phone_number:    String,
        pub phone_code_hash: String,
        pub phone_code:      Option<String>,
    }

    impl Identifiable for SignIn { const CONSTRUCTOR_ID: u32 = 0x8d52a951; }

    impl Serializable for SignIn {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            let flags: u32 = if self.phone_code.is_some() { 1 } else { 0 };
            flags.serialize(buf);
            self.phone_number.serialize(buf);
            self.phone_code_hash.serialize(buf);
            self.phone_code.serialize(buf);
        }
    }

    impl RemoteCall for SignIn { type Return = Authorization; }

    /// `auth.Authorization`. The authorized user is not decoded.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Authorization {
        Authorization,
        SignUpRequired,
    }

    impl Authorization {
        pub const AUTHORIZATION_IDS:  [u32; 3] = [0x2ea2c0d4, 0x33fb7bb8, 0xcd050916];
        pub const SIGN_UP_REQUIRED_ID: u32     = 0x44747e9a;
    }

    impl Deserializable for Authorization {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let id = u32::deserialize(buf)?;
            if Self::AUTHORIZATION_IDS.contains(&id) {
                let mut rest = Vec::new();
                buf.read_to_end(&mut rest);
                Ok(Self::Authorization)
            } else if id == Self::SIGN_UP_REQUIRED_ID {
                let mut rest = Vec::new();
                buf.read_to_end(&mut rest);
                Ok(Self::SignUpRequired)
            } else {
                Err(Error::UnexpectedConstructor { id })
            }
        }
    }

    /// `auth.checkPassword#d18b4d16 password:InputCheckPasswordSRP`
    #[derive(Clone, Debug, PartialEq)]
    pub struct CheckPassword {
        pub password: InputCheckPasswordSrp,
    }

    impl Identifiable for CheckPassword { const CONSTRUCTOR_ID: u32 = 0xd18b4d16; }

    impl Serializable for CheckPassword {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            self.password.serialize(buf);
        }
    }

    impl RemoteCall for CheckPassword { type Return = Authorization; }

    /// `inputCheckPasswordSRP#d27ff082 srp_id:long A:bytes M1:bytes`
    #[derive(Clone, Debug, PartialEq)]
    pub struct InputCheckPasswordSrp {
        pub srp_id: i64,
        pub a:      Vec<u8>,
        pub m1:     Vec<u8>,
    }

    impl Identifiable for InputCheckPasswordSrp { const CONSTRUCTOR_ID: u32 = 0xd27ff082; }

    impl Serializable for InputCheckPasswordSrp {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            self.srp_id.serialize(buf);
            self.a.serialize(buf);
            self.m1.serialize(buf);
        }
    }
}

// ─── account ─────────────────────────────────────────────────────────────────

pub mod account {
    use super::*;

    /// `account.getPassword#548a30f5 = account.Password`
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetPassword;

    impl Identifiable for GetPassword { const CONSTRUCTOR_ID: u32 = 0x548a30f5; }

    impl Serializable for GetPassword {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
        }
    }

    impl RemoteCall for GetPassword { type Return = Password; }

    /// `PasswordKdfAlgo`
    #[derive(Clone, Debug, PartialEq)]
    pub enum PasswordKdfAlgo {
        /// `passwordKdfAlgoSHA256SHA256PBKDF2HMACSHA512iter100000SHA256ModPow#3a912d4a`
        Sha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow {
            salt1: Vec<u8>,
            salt2: Vec<u8>,
            g:     i32,
            p:     Vec<u8>,
        },
        Unknown,
    }

    impl Deserializable for PasswordKdfAlgo {
        fn deserialize(buf: Buffer) -> Result<Self> {
            match u32::deserialize(buf)? {
                0x3a912d4a => Ok(Self::Sha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow {
                    salt1: Vec::<u8>::deserialize(buf)?,
                    salt2: Vec::<u8>::deserialize(buf)?,
                    g:     i32::deserialize(buf)?,
                    p:     Vec::<u8>::deserialize(buf)?,
                }),
                0xd45ab096 => Ok(Self::Unknown),
                id => Err(Error::UnexpectedConstructor { id }),
            }
        }
    }

    /// `account.password`, read up to `hint`.
    #[derive(Clone, Debug, PartialEq)]
    pub struct Password {
        pub has_password: bool,
        pub current_algo: Option<PasswordKdfAlgo>,
        pub srp_b:        Option<Vec<u8>>,
        pub srp_id:       Option<i64>,
        pub hint:         Option<String>,
    }

    impl Password {
        pub const IDS: [u32; 2] = [0x957b50fb, 0x185b184f];
    }

    impl Deserializable for Password {
        fn deserialize(buf: Buffer) -> Result<Self> {
            let id = u32::deserialize(buf)?;
            if !Self::IDS.contains(&id) {
                return Err(Error::UnexpectedConstructor { id });
            }
            let flags = u32::deserialize(buf)?;
            let has_password = flags & (1 << 2) != 0;
            let (current_algo, srp_b, srp_id) = if has_password {
                (
                    Some(PasswordKdfAlgo::deserialize(buf)?),
                    Some(Vec::<u8>::deserialize(buf)?),
                    Some(i64::deserialize(buf)?),
                )
            } else {
                (None, None, None)
            };
            let hint = if flags & (1 << 3) != 0 { Some(String::deserialize(buf)?) } else { None };
            // The remaining fields are not needed to log in.
            let mut rest = Vec::new();
            buf.read_to_end(&mut rest);
            Ok(Self { has_password, current_algo, srp_b, srp_id, hint })
        }
    }
}

// ─── messages ────────────────────────────────────────────────────────────────

/// `InputPeer`, limited to the one peer a login ever writes to.
#[derive(Clone, Debug, PartialEq)]
pub enum InputPeer {
    /// `inputPeerSelf#7da07ec9`
    PeerSelf,
}

impl Serializable for InputPeer {
    fn serialize(&self, buf: &mut Vec<u8>) {
        match self {
            Self::PeerSelf => 0x7da07ec9_u32.serialize(buf),
        }
    }
}

/// The `MessageEntity` constructors produced by the HTML parser.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageEntity {
    Bold      { offset: i32, length: i32 },
    Italic    { offset: i32, length: i32 },
    Underline { offset: i32, length: i32 },
    Strike    { offset: i32, length: i32 },
    Code      { offset: i32, length: i32 },
    Pre       { offset: i32, length: i32, language: String },
    TextUrl   { offset: i32, length: i32, url: String },
}

impl MessageEntity {
    pub fn offset(&self) -> i32 {
        match self {
            Self::Bold { offset, .. }
            | Self::Italic { offset, .. }
            | Self::Underline { offset, .. }
            | Self::Strike { offset, .. }
            | Self::Code { offset, .. }
            | Self::Pre { offset, .. }
            | Self::TextUrl { offset, .. } => *offset,
        }
    }

    pub fn length(&self) -> i32 {
        match self {
            Self::Bold { length, .. }
            | Self::Italic { length, .. }
            | Self::Underline { length, .. }
            | Self::Strike { length, .. }
            | Self::Code { length, .. }
            | Self::Pre { length, .. }
            | Self::TextUrl { length, .. } => *length,
        }
    }
}

impl Serializable for MessageEntity {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let id: u32 = match self {
            Self::Bold { .. }      => 0xbd610bc9,
            Self::Italic { .. }    => 0x826f8b60,
            Self::Underline { .. } => 0x9c4e7e8b,
            Self::Strike { .. }    => 0xbf0693d4,
            Self::Code { .. }      => 0x28a20571,
            Self::Pre { .. }       => 0x73924be0,
            Self::TextUrl { .. }   => 0x76a6d327,
        };
        id.serialize(buf);
        self.offset().serialize(buf);
        self.length().serialize(buf);
        match self {
            Self::Pre { language, .. } => language.serialize(buf),
            Self::TextUrl { url, .. }  => url.serialize(buf),
            _ => {}
        }
    }
}

pub mod messages {
    use super::*;

    /// `messages.sendMessage#520c3870`, without reply markup or scheduling.
    #[derive(Clone, Debug, PartialEq)]
    pub struct SendMessage {
        pub no_webpage: bool,
        pub silent:     bool,
        pub peer:       InputPeer,
        pub message:    String,
        pub random_id:  i64,
        pub entities:   Option<Vec<MessageEntity>>,
    }

    impl Identifiable for SendMessage { const CONSTRUCTOR_ID: u32 = 0x520c3870; }

    impl Serializable for SendMessage {
        fn serialize(&self, buf: &mut Vec<u8>) {
            Self::CONSTRUCTOR_ID.serialize(buf);
            let flags = (self.no_webpage as u32) << 1
                | (self.silent as u32) << 5
                | (self.entities.is_some() as u32) << 3;
            flags.serialize(buf);
            self.peer.serialize(buf);
            self.message.serialize(buf);
            self.random_id.serialize(buf);
            if let Some(entities) = &self.entities {
                BoxedVec(entities.clone()).serialize(buf);
            }
        }
    }

    /// Returns `Updates`, which this crate does not decode.
    impl RemoteCall for SendMessage { type Return = Blob; }
}
