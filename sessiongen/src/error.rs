//! The one error type every step of the login can end in.

use std::{fmt, io};

use sessiongen_client::{InvocationError, SessionError, SignInError};

use crate::config::ConfigError;

/// Exit status after a reported failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug)]
pub enum SetupError {
    /// Bad or missing `API_ID` / `API_HASH`.
    Config(ConfigError),
    /// The terminal could not be read or written.
    Io(io::Error),
    /// Talking to Telegram failed.
    Telegram(InvocationError),
    /// Telegram refused the login.
    SignIn(SignInError),
    /// The session could not be encoded.
    Session(SessionError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e)   => write!(f, "{e}"),
            Self::Io(e)       => write!(f, "terminal I/O failed: {e}"),
            Self::Telegram(e) => write!(f, "{e}"),
            Self::SignIn(e)   => write!(f, "{e}"),
            Self::Session(e)  => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e)   => Some(e),
            Self::Io(e)       => Some(e),
            Self::Telegram(e) => Some(e),
            Self::SignIn(e)   => Some(e),
            Self::Session(e)  => Some(e),
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self { Self::Config(e) }
}

impl From<io::Error> for SetupError {
    fn from(e: io::Error) -> Self { Self::Io(e) }
}

impl From<InvocationError> for SetupError {
    fn from(e: InvocationError) -> Self { Self::Telegram(e) }
}

impl From<SignInError> for SetupError {
    fn from(e: SignInError) -> Self {
        match e {
            SignInError::Other(e) => Self::Telegram(e),
            e                     => Self::SignIn(e),
        }
    }
}

impl From<SessionError> for SetupError {
    fn from(e: SessionError) -> Self { Self::Session(e) }
}
