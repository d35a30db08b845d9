//! [`Connector`] and [`LoginClient`] over `sessiongen-client`.

use sessiongen_client::{Client, Config, LoginToken, PasswordToken, SignInError, StringSession};

use crate::bootstrap::{Connector, LoginClient, SessionString, SignInOutcome};
use crate::config::Credentials;
use crate::error::SetupError;

/// Connects a [`Client`] with an empty string session.
#[derive(Debug, Default)]
pub struct TelegramConnector;

impl Connector for TelegramConnector {
    type Client = Client;

    async fn connect(&self, credentials: &Credentials) -> Result<Client, SetupError> {
        let client = Client::connect(Config {
            api_id:   credentials.api_id,
            api_hash: credentials.api_hash.clone(),
            session:  StringSession::empty(),
            dc_options: Vec::new(),
        })
        .await?;
        Ok(client)
    }
}

impl LoginClient for Client {
    type LoginToken = LoginToken;
    type PasswordToken = PasswordToken;

    async fn request_login_code(&self, phone: &str) -> Result<LoginToken, SetupError> {
        Ok(Client::request_login_code(self, phone).await?)
    }

    async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<SignInOutcome<PasswordToken>, SetupError> {
        match Client::sign_in(self, token, code).await {
            Ok(()) => Ok(SignInOutcome::SignedIn),
            Err(SignInError::PasswordRequired(t)) => Ok(SignInOutcome::PasswordRequired(t)),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_password(&self, token: PasswordToken, password: &str) -> Result<(), SetupError> {
        Ok(Client::check_password(self, token, password).await?)
    }

    async fn session_string(&self) -> Result<SessionString, SetupError> {
        Ok(SessionString::new(Client::session_string(self).await?))
    }

    async fn send_html_to_self(&self, html: &str) -> Result<(), SetupError> {
        Ok(Client::send_html_to_self(self, html).await?)
    }
}
