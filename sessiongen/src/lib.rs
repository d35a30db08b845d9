//! Interactive Telegram string session generator.
//!
//! Reads `API_ID` / `API_HASH`, logs a user account in through terminal
//! prompts, prints the resulting string session and sends a copy to the
//! account's Saved Messages.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`bootstrap`] | The login sequence and its client seam                |
//! | [`config`]    | `.env` loading and credential validation              |
//! | [`prompt`]    | Terminal prompts                                      |
//! | [`telegram`]  | The seam implemented with `sessiongen-client`         |

#![deny(unsafe_code)]

pub mod banner;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod prompt;
pub mod telegram;

pub use bootstrap::{Bootstrapper, Connector, LoginClient, SessionString, SignInOutcome};
pub use config::{ConfigError, Credentials, RawCredentials};
pub use error::{FAILURE_EXIT_CODE, SetupError};
pub use prompt::{Prompter, TerminalPrompter};
pub use telegram::TelegramConnector;
