//! The login sequence: credentials → phone → password → code → session.
//!
//! Every dependency is injected so the sequence can be driven by scripted
//! prompts and a fake client in tests.

use std::fmt;
use std::io::Write;

use colored::Colorize;

use crate::config::Credentials;
use crate::error::{FAILURE_EXIT_CODE, SetupError};
use crate::prompt::{CLOSE_LABEL, CODE_LABEL, PASSWORD_LABEL, PHONE_LABEL, Prompter};

// ─── Client seam ──────────────────────────────────────────────────────────────

/// The encoded session credential. Printed and sent as the same value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionString(String);

impl SessionString {
    pub fn new(s: impl Into<String>) -> Self { Self(s.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionString({} chars)", self.0.len())
    }
}

/// Result of submitting the login code.
#[derive(Debug)]
pub enum SignInOutcome<P> {
    SignedIn,
    /// Two-step verification is on; the token goes to `check_password`.
    PasswordRequired(P),
}

/// What the login sequence needs from a Telegram client.
#[allow(async_fn_in_trait)]
pub trait LoginClient {
    type LoginToken;
    type PasswordToken;

    async fn request_login_code(&self, phone: &str) -> Result<Self::LoginToken, SetupError>;

    async fn sign_in(
        &self,
        token: &Self::LoginToken,
        code:  &str,
    ) -> Result<SignInOutcome<Self::PasswordToken>, SetupError>;

    async fn check_password(&self, token: Self::PasswordToken, password: &str) -> Result<(), SetupError>;

    async fn session_string(&self) -> Result<SessionString, SetupError>;

    async fn send_html_to_self(&self, html: &str) -> Result<(), SetupError>;
}

/// Builds a client bound to a new, empty session.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Client: LoginClient;

    async fn connect(&self, credentials: &Credentials) -> Result<Self::Client, SetupError>;
}

/// The Saved Messages text carrying the session.
pub fn session_message(session: &SessionString) -> String {
    format!("<b> ➜ Your session:</b>\n<code>{session}</code>")
}

// ─── Bootstrapper ─────────────────────────────────────────────────────────────

pub struct Bootstrapper<C, P, W> {
    connector: C,
    prompter:  P,
    out:       W,
}

impl<C, P, W> Bootstrapper<C, P, W>
where
    C: Connector,
    P: Prompter,
    W: Write,
{
    pub fn new(connector: C, prompter: P, out: W) -> Self {
        Self { connector, prompter, out }
    }

    /// Validate the credentials, then connect. Nothing touches the network
    /// or the terminal if validation fails.
    pub async fn initialize(&self, api_id: &str, api_hash: &str) -> Result<C::Client, SetupError> {
        let credentials = Credentials::parse(api_id, api_hash)?;
        log::debug!("[sessiongen] connecting with {credentials:?}");
        self.connector.connect(&credentials).await
    }

    /// Ask for phone, password and code, sign in, and return the session.
    pub async fn run_login(&mut self, client: &C::Client) -> Result<SessionString, SetupError> {
        let phone = self.prompter.text(PHONE_LABEL)?;
        let token = client.request_login_code(phone.trim()).await?;

        let password = self.prompter.secret(PASSWORD_LABEL)?;
        let code = self.prompter.text(CODE_LABEL)?;

        match client.sign_in(&token, code.trim()).await? {
            SignInOutcome::SignedIn => {}
            SignInOutcome::PasswordRequired(pw_token) => {
                log::info!("[sessiongen] account has two-step verification");
                client.check_password(pw_token, &password).await?;
            }
        }

        client.session_string().await
    }

    /// Print the session on its own line and send it to Saved Messages.
    pub async fn publish_session(
        &mut self,
        client:  &C::Client,
        session: &SessionString,
    ) -> Result<(), SetupError> {
        writeln!(self.out, "{session}")?;
        self.out.flush()?;
        client.send_html_to_self(&session_message(session)).await
    }

    /// Full sequence: initialize → login → publish.
    pub async fn run(&mut self, api_id: &str, api_hash: &str) -> Result<SessionString, SetupError> {
        let client = self.initialize(api_id, api_hash).await?;
        let session = self.run_login(&client).await?;
        self.publish_session(&client, &session).await?;
        Ok(session)
    }

    /// Show the error in red and wait until the user confirms.
    pub fn acknowledge_failure(&mut self, error: &SetupError) {
        log::debug!("[sessiongen] login failed: {error:?}");
        if let Err(e) = writeln!(self.out, "{}", error.to_string().red()).and_then(|()| self.out.flush()) {
            log::warn!("[sessiongen] could not print error: {e}");
        }
        if let Err(e) = self.prompter.confirm(CLOSE_LABEL) {
            log::warn!("[sessiongen] confirmation prompt failed: {e}");
        }
    }

    /// [`Self::acknowledge_failure`], then exit with status 1.
    pub fn report_failure(&mut self, error: &SetupError) -> ! {
        self.acknowledge_failure(error);
        std::process::exit(FAILURE_EXIT_CODE)
    }

    pub fn prompter(&self) -> &P { &self.prompter }

    pub fn out(&self) -> &W { &self.out }
}
