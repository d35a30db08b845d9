//! # sessiongen-client
//!
//! A small async Telegram client that does one job: log a user account in and
//! hand back a reusable string session.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sessiongen_client::{Client, Config, SignInError, StringSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect(Config {
//!         api_id:   12345,
//!         api_hash: "abc123".into(),
//!         session:  StringSession::empty(),
//!         dc_options: Vec::new(),
//!     }).await?;
//!
//!     let token = client.request_login_code("+1234567890").await?;
//!     match client.sign_in(&token, "12345").await {
//!         Ok(()) => {}
//!         Err(SignInError::PasswordRequired(t)) => client.check_password(t, "hunter2").await?,
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     let session = client.session_string().await?;
//!     client.send_html_to_self(&format!("<code>{session}</code>")).await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

mod connection;
mod errors;
pub mod html;
pub mod session;
pub mod two_factor_auth;

pub use errors::{InvocationError, LoginToken, PasswordToken, RpcError, SignInError};
pub use session::{DcOption, SessionData, SessionError, StringSession};

use std::net::SocketAddr;
use std::sync::Arc;

use sessiongen_crypto::random_bytes;
use sessiongen_tl::api::{
    self, InitConnection, InvokeWithLayer, MessageEntity, account, auth, help, messages,
};
use sessiongen_tl::{Deserializable, LAYER, RemoteCall};
use tokio::sync::Mutex;

use connection::Connection;

/// DC used for the first connection of a new session.
const DEFAULT_DC: i32 = 2;

// ─── Config ───────────────────────────────────────────────────────────────────

/// Configuration for [`Client::connect`].
#[derive(Clone)]
pub struct Config {
    pub api_id:   i32,
    pub api_hash: String,
    /// Session to resume, or [`StringSession::empty`] for a new login.
    pub session:  StringSession,
    /// DC addresses (and keys) used instead of the production table.
    pub dc_options: Vec<DcOption>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_id", &self.api_id)
            .field("session", &self.session)
            .field("dc_options", &self.dc_options)
            .finish_non_exhaustive()
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

struct ClientInner {
    conn:       Mutex<Connection>,
    api_id:     i32,
    api_hash:   String,
    dc_options: Vec<DcOption>,
}

/// Handle to a connected client. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Connect to Telegram and announce the API layer.
    ///
    /// With an empty session a new auth key is created on DC2. A stored
    /// session reconnects to its DC; if the server no longer accepts the key,
    /// a new one is negotiated on that DC.
    pub async fn connect(config: Config) -> Result<Self, InvocationError> {
        let (dc_id, addr) = match config.session.data() {
            Some(data) => {
                let conn = Connection::connect_with_key(data.dc_id, data.addr, data.auth_key).await?;
                let client = Self::with_connection(conn, &config);
                match client.init_connection().await {
                    Ok(()) => return Ok(client),
                    Err(e) => {
                        log::warn!("[sessiongen] stored key rejected ({e}), creating a new one");
                        (data.dc_id, data.addr)
                    }
                }
            }
            None => (DEFAULT_DC, dc_route(&config.dc_options, DEFAULT_DC)?.0),
        };

        let conn = Connection::connect_raw(dc_id, addr).await?;
        let client = Self::with_connection(conn, &config);
        client.init_connection().await?;
        Ok(client)
    }

    fn with_connection(conn: Connection, config: &Config) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                conn:       Mutex::new(conn),
                api_id:     config.api_id,
                api_hash:   config.api_hash.clone(),
                dc_options: config.dc_options.clone(),
            }),
        }
    }

    async fn init_connection(&self) -> Result<(), InvocationError> {
        let req = InvokeWithLayer {
            layer: LAYER,
            query: InitConnection {
                api_id:           self.inner.api_id,
                device_model:     "Linux".to_string(),
                system_version:   "1.0".to_string(),
                app_version:      env!("CARGO_PKG_VERSION").to_string(),
                system_lang_code: "en".to_string(),
                lang_pack:        String::new(),
                lang_code:        "en".to_string(),
                query:            help::GetNearestDc,
            },
        };
        let nearest = self.invoke(&req).await?;
        log::info!(
            "[sessiongen] Connected (this DC{}, nearest DC{}, country {})",
            nearest.this_dc, nearest.nearest_dc, nearest.country
        );
        Ok(())
    }

    /// Replace the connection with a fresh one to `dc_id`.
    async fn migrate_to(&self, dc_id: i32) -> Result<(), InvocationError> {
        let (addr, key) = dc_route(&self.inner.dc_options, dc_id)?;
        log::info!("[sessiongen] Migrating to DC{dc_id} ({addr}) …");
        let conn = match key {
            Some(key) => Connection::connect_with_key(dc_id, addr, key).await?,
            None      => Connection::connect_raw(dc_id, addr).await?,
        };
        *self.inner.conn.lock().await = conn;
        self.init_connection().await?;
        log::info!("[sessiongen] Now on DC{dc_id} ✓");
        Ok(())
    }

    // ── RPC ────────────────────────────────────────────────────────────────

    /// Invoke any request and decode its response.
    pub async fn invoke<R: RemoteCall>(&self, req: &R) -> Result<R::Return, InvocationError> {
        let body = self.inner.conn.lock().await.rpc_call_raw(req).await?;
        Ok(R::Return::from_bytes(&body)?)
    }

    /// Like [`Client::invoke`], but follows one `303 *_MIGRATE_X` redirect.
    async fn invoke_migrating<R: RemoteCall>(&self, req: &R) -> Result<R::Return, InvocationError> {
        match self.invoke(req).await {
            Err(e) => match e.migrate_dc() {
                Some(dc_id) => {
                    self.migrate_to(dc_id).await?;
                    self.invoke(req).await
                }
                None => Err(e),
            },
            ok => ok,
        }
    }

    // ── Login ──────────────────────────────────────────────────────────────

    /// Ask Telegram to deliver a login code to `phone`.
    pub async fn request_login_code(&self, phone: &str) -> Result<LoginToken, InvocationError> {
        let req = auth::SendCode {
            phone_number: phone.to_string(),
            api_id:       self.inner.api_id,
            api_hash:     self.inner.api_hash.clone(),
            settings:     auth::CodeSettings::default(),
        };
        let sent = self.invoke_migrating(&req).await?;
        log::info!("[sessiongen] Login code sent ({:?})", sent.r#type);
        Ok(LoginToken { phone: phone.to_string(), phone_code_hash: sent.phone_code_hash })
    }

    /// Complete the login with the code the user received.
    ///
    /// Accounts with two-step verification return
    /// [`SignInError::PasswordRequired`]; pass its token to
    /// [`Client::check_password`].
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<(), SignInError> {
        let req = auth::SignIn {
            phone_number:    token.phone.clone(),
            phone_code_hash: token.phone_code_hash.clone(),
            phone_code:      Some(code.trim().to_string()),
        };
        match self.invoke_migrating(&req).await {
            Ok(auth::Authorization::Authorization) => {
                log::info!("[sessiongen] Signed in ✓");
                Ok(())
            }
            Ok(auth::Authorization::SignUpRequired) => Err(SignInError::SignUpRequired),
            Err(e) if e.is("SESSION_PASSWORD_NEEDED") => {
                let password = self.invoke(&account::GetPassword).await?;
                Err(SignInError::PasswordRequired(PasswordToken { password }))
            }
            Err(e) if e.is("PHONE_CODE_*") => Err(SignInError::InvalidCode),
            Err(e) => Err(SignInError::Other(e)),
        }
    }

    /// Prove knowledge of the 2FA password.
    pub async fn check_password(
        &self,
        token:    PasswordToken,
        password: impl AsRef<[u8]>,
    ) -> Result<(), SignInError> {
        let SrpChallenge { salt1, salt2, g, p, srp_b, srp_id } = SrpChallenge::from_password(token.password)?;

        let a = random_bytes::<256>();
        let (m1, g_a) = two_factor_auth::calculate_2fa(&salt1, &salt2, &p, g, &srp_b, &a, password);

        let req = auth::CheckPassword {
            password: auth::InputCheckPasswordSrp { srp_id, a: g_a.to_vec(), m1: m1.to_vec() },
        };
        match self.invoke(&req).await? {
            auth::Authorization::Authorization => {
                log::info!("[sessiongen] Signed in with 2FA ✓");
                Ok(())
            }
            auth::Authorization::SignUpRequired => Err(SignInError::SignUpRequired),
        }
    }

    // ── Session ────────────────────────────────────────────────────────────

    /// The current DC, address and auth key as a session string.
    pub async fn session_string(&self) -> Result<String, SessionError> {
        let conn = self.inner.conn.lock().await;
        StringSession::new(SessionData {
            dc_id:    conn.dc_id,
            addr:     conn.addr,
            auth_key: conn.auth_key_bytes(),
        })
        .encode()
    }

    // ── Messaging ──────────────────────────────────────────────────────────

    /// Send HTML-formatted text to Saved Messages. See [`html::parse_html`]
    /// for the supported tags.
    pub async fn send_html_to_self(&self, html: &str) -> Result<(), InvocationError> {
        let (text, entities) = html::parse_html(html);
        self.send_message_to_self(text, entities).await
    }

    async fn send_message_to_self(
        &self,
        text:     String,
        entities: Vec<MessageEntity>,
    ) -> Result<(), InvocationError> {
        let req = messages::SendMessage {
            no_webpage: true,
            silent:     false,
            peer:       api::InputPeer::PeerSelf,
            message:    text,
            random_id:  i64::from_le_bytes(random_bytes()),
            entities:   (!entities.is_empty()).then_some(entities),
        };
        self.invoke(&req).await?;
        Ok(())
    }
}

/// Address of `dc_id` and the key to reuse there, preferring `options`.
fn dc_route(options: &[DcOption], dc_id: i32) -> Result<(SocketAddr, Option<[u8; 256]>), InvocationError> {
    if let Some(opt) = options.iter().find(|o| o.id == dc_id) {
        return Ok((opt.addr, opt.auth_key));
    }
    session::default_dc_addr(dc_id)
        .map(|addr| (addr, None))
        .ok_or(InvocationError::UnknownDc(dc_id))
}

/// The parts of `account.password` that SRP needs.
struct SrpChallenge {
    salt1:  Vec<u8>,
    salt2:  Vec<u8>,
    g:      i32,
    p:      Vec<u8>,
    srp_b:  Vec<u8>,
    srp_id: i64,
}

impl SrpChallenge {
    fn from_password(pw: account::Password) -> Result<Self, InvocationError> {
        let Some(account::PasswordKdfAlgo::Sha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow {
            salt1, salt2, g, p,
        }) = pw.current_algo
        else {
            return Err(InvocationError::UnsupportedPasswordAlgo);
        };
        let srp_b  = pw.srp_b.ok_or(InvocationError::IncompletePassword("srp_B"))?;
        let srp_id = pw.srp_id.ok_or(InvocationError::IncompletePassword("srp_id"))?;
        Ok(Self { salt1, salt2, g, p, srp_b, srp_id })
    }
}
