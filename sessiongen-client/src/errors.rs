//! Error types for sessiongen-client.

use std::{fmt, io, time::Duration};

use sessiongen_mtproto::authentication;
use sessiongen_mtproto::DecryptError;

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An error returned by Telegram's servers in response to an RPC call.
///
/// Numeric values are stripped from the name and placed in [`RpcError::value`].
///
/// # Example
/// `PHONE_MIGRATE_4` → `RpcError { code: 303, name: "PHONE_MIGRATE", value: Some(4) }`
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    /// HTTP-like status code.
    pub code:  i32,
    /// Error name in SCREAMING_SNAKE_CASE with the numeric suffix removed.
    pub name:  String,
    /// Numeric suffix extracted from the name, if any.
    pub value: Option<u32>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC {}: {}", self.code, self.name)?;
        if let Some(v) = self.value {
            write!(f, " (value: {v})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

impl RpcError {
    /// Parse a raw Telegram error message like `"FLOOD_WAIT_30"` into an `RpcError`.
    pub fn from_telegram(code: i32, message: &str) -> Self {
        if let Some(idx) = message.rfind('_') {
            let suffix = &message[idx + 1..];
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(v) = suffix.parse::<u32>() {
                    return Self { code, name: message[..idx].to_string(), value: Some(v) };
                }
            }
        }
        Self { code, name: message.to_string(), value: None }
    }

    /// Match on the error name, with optional wildcard prefix/suffix `'*'`.
    ///
    /// # Examples
    /// - `err.is("FLOOD_WAIT")` exact match
    /// - `err.is("PHONE_CODE_*")` starts-with match
    /// - `err.is("*_MIGRATE")` ends-with match
    pub fn is(&self, pattern: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix('*') {
            self.name.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            self.name.ends_with(suffix)
        } else {
            self.name == pattern
        }
    }

    /// The DC to reconnect to, if this is a `303 *_MIGRATE_X` redirect.
    pub fn migrate_dc(&self) -> Option<i32> {
        if self.code == 303 && self.is("*_MIGRATE") {
            self.value.map(|v| v as i32)
        } else {
            None
        }
    }
}

// ─── InvocationError ──────────────────────────────────────────────────────────

/// The error type returned from any `Client` method that talks to Telegram.
#[derive(Debug)]
pub enum InvocationError {
    /// Telegram rejected the request.
    Rpc(RpcError),
    /// Network / I/O failure.
    Io(io::Error),
    /// Response deserialization failed.
    Deserialize(String),
    /// The auth key handshake failed.
    Handshake(authentication::Error),
    /// A server frame could not be decrypted.
    Decrypt(DecryptError),
    /// The server kept rejecting the message (`bad_msg_notification` code).
    BadMessage(i32),
    /// The transport sent a negative error code instead of a frame (e.g. -404).
    Transport(i32),
    /// No response arrived in time.
    Timeout(Duration),
    /// A migration pointed at a DC with no known address.
    UnknownDc(i32),
    /// The account's 2FA password uses a KDF this client does not implement.
    UnsupportedPasswordAlgo,
    /// The 2FA challenge lacks a field SRP needs.
    IncompletePassword(&'static str),
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(e)         => write!(f, "{e}"),
            Self::Io(e)          => write!(f, "I/O error: {e}"),
            Self::Deserialize(s) => write!(f, "deserialize error: {s}"),
            Self::Handshake(e)   => write!(f, "auth key handshake failed: {e}"),
            Self::Decrypt(e)     => write!(f, "decrypt error: {e}"),
            Self::BadMessage(c)  => write!(f, "message rejected by server (code {c})"),
            Self::Transport(c)   => write!(f, "transport error {c}"),
            Self::Timeout(d)     => write!(f, "timed out after {}s", d.as_secs()),
            Self::UnknownDc(dc)  => write!(f, "no known address for DC{dc}"),
            Self::UnsupportedPasswordAlgo => write!(f, "unsupported 2FA password algorithm"),
            Self::IncompletePassword(field) => write!(f, "2FA challenge is missing {field}"),
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rpc(e)       => Some(e),
            Self::Io(e)        => Some(e),
            Self::Handshake(e) => Some(e),
            Self::Decrypt(e)   => Some(e),
            _                  => None,
        }
    }
}

impl From<io::Error> for InvocationError {
    fn from(e: io::Error) -> Self { Self::Io(e) }
}

impl From<sessiongen_tl::deserialize::Error> for InvocationError {
    fn from(e: sessiongen_tl::deserialize::Error) -> Self { Self::Deserialize(e.to_string()) }
}

impl From<authentication::Error> for InvocationError {
    fn from(e: authentication::Error) -> Self { Self::Handshake(e) }
}

impl From<DecryptError> for InvocationError {
    fn from(e: DecryptError) -> Self { Self::Decrypt(e) }
}

impl InvocationError {
    /// Returns `true` if this is the named RPC error (supports `'*'` wildcards).
    pub fn is(&self, pattern: &str) -> bool {
        match self {
            Self::Rpc(e) => e.is(pattern),
            _            => false,
        }
    }

    /// The DC to migrate to, if this is a `303` redirect.
    pub fn migrate_dc(&self) -> Option<i32> {
        match self {
            Self::Rpc(e) => e.migrate_dc(),
            _            => None,
        }
    }
}

// ─── SignInError ──────────────────────────────────────────────────────────────

/// Errors returned by [`crate::Client::sign_in`].
#[derive(Debug)]
pub enum SignInError {
    /// The phone number is not registered; sign up with an official app first.
    SignUpRequired,
    /// 2FA is enabled; pass the token to [`crate::Client::check_password`].
    PasswordRequired(PasswordToken),
    /// The code entered was wrong or has expired.
    InvalidCode,
    /// Any other error.
    Other(InvocationError),
}

impl fmt::Display for SignInError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignUpRequired      => write!(f, "sign up required, use an official Telegram app"),
            Self::PasswordRequired(_) => write!(f, "2FA password required"),
            Self::InvalidCode         => write!(f, "invalid or expired code"),
            Self::Other(e)            => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SignInError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Other(e) => Some(e),
            _              => None,
        }
    }
}

impl From<InvocationError> for SignInError {
    fn from(e: InvocationError) -> Self { Self::Other(e) }
}

// ─── PasswordToken ────────────────────────────────────────────────────────────

/// Opaque 2FA challenge returned in [`SignInError::PasswordRequired`].
///
/// Pass to [`crate::Client::check_password`] together with the user's password.
pub struct PasswordToken {
    pub(crate) password: sessiongen_tl::api::account::Password,
}

impl PasswordToken {
    /// The password hint set by the account owner, if any.
    pub fn hint(&self) -> Option<&str> {
        self.password.hint.as_deref()
    }
}

impl fmt::Debug for PasswordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordToken {{ hint: {:?} }}", self.hint())
    }
}

// ─── LoginToken ───────────────────────────────────────────────────────────────

/// Opaque token returned by [`crate::Client::request_login_code`].
///
/// Pass to [`crate::Client::sign_in`] with the received code.
#[derive(Clone, Debug)]
pub struct LoginToken {
    pub(crate) phone:           String,
    pub(crate) phone_code_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_suffix_is_split() {
        let e = RpcError::from_telegram(420, "FLOOD_WAIT_30");
        assert_eq!(e.name, "FLOOD_WAIT");
        assert_eq!(e.value, Some(30));
        assert_eq!(e.to_string(), "RPC 420: FLOOD_WAIT (value: 30)");
    }

    #[test]
    fn plain_name_kept() {
        let e = RpcError::from_telegram(401, "SESSION_PASSWORD_NEEDED");
        assert_eq!(e.name, "SESSION_PASSWORD_NEEDED");
        assert_eq!(e.value, None);
        assert_eq!(e.migrate_dc(), None);
    }

    #[test]
    fn migrate_detected() {
        for msg in ["PHONE_MIGRATE_4", "USER_MIGRATE_5", "NETWORK_MIGRATE_1"] {
            assert!(RpcError::from_telegram(303, msg).migrate_dc().is_some(), "{msg}");
        }
        assert_eq!(RpcError::from_telegram(303, "PHONE_MIGRATE_4").migrate_dc(), Some(4));
        assert_eq!(RpcError::from_telegram(400, "PHONE_MIGRATE_4").migrate_dc(), None);
    }

    #[test]
    fn setup_failures_are_not_decode_errors() {
        assert_eq!(InvocationError::UnknownDc(9).to_string(), "no known address for DC9");
        assert_eq!(
            InvocationError::UnsupportedPasswordAlgo.to_string(),
            "unsupported 2FA password algorithm"
        );
        assert_eq!(
            InvocationError::IncompletePassword("srp_B").to_string(),
            "2FA challenge is missing srp_B"
        );
    }

    #[test]
    fn wildcards() {
        let e = RpcError::from_telegram(400, "PHONE_CODE_INVALID");
        assert!(e.is("PHONE_CODE_*"));
        assert!(e.is("*_INVALID"));
        assert!(!e.is("PHONE_CODE"));
    }
}
