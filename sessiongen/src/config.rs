//! Application credentials from the environment and `.env` files.

use std::fmt;
use std::path::Path;

/// Load `.env` next to the executable, then the usual lookup from the
/// working directory. Variables already set in the environment win, and a
/// missing file is not an error.
pub fn load_dotenv() {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")));
    if let Some(path) = beside_exe {
        report(dotenvy::from_path(&path).map(|()| path.clone()), &path);
    }
    report(dotenvy::dotenv(), Path::new(".env"));
}

fn report(result: Result<std::path::PathBuf, dotenvy::Error>, path: &Path) {
    match result {
        Ok(loaded) => log::debug!("[sessiongen] loaded {}", loaded.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("[sessiongen] ignoring {}: {e}", path.display()),
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// `API_ID` is not a positive 32-bit integer.
    InvalidApiId(String),
    /// `API_HASH` is blank.
    EmptyApiHash,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var)     => write!(f, "{var} is not set (environment or .env)"),
            Self::InvalidApiId(v)  => write!(f, "API_ID must be a positive number, got {v:?}"),
            Self::EmptyApiHash     => write!(f, "API_HASH is empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ─── Credentials ──────────────────────────────────────────────────────────────

/// `API_ID` and `API_HASH` exactly as found, not yet validated.
#[derive(Clone, PartialEq, Eq)]
pub struct RawCredentials {
    pub api_id:   String,
    pub api_hash: String,
}

impl RawCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read both values through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_id:   lookup("API_ID").ok_or(ConfigError::Missing("API_ID"))?,
            api_hash: lookup("API_HASH").ok_or(ConfigError::Missing("API_HASH"))?,
        })
    }
}

impl fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCredentials").field("api_id", &self.api_id).finish_non_exhaustive()
    }
}

/// Validated application credentials from my.telegram.org.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id:   i32,
    pub api_hash: String,
}

impl Credentials {
    pub fn parse(api_id: &str, api_hash: &str) -> Result<Self, ConfigError> {
        let id = api_id.trim();
        let api_id = match id.parse::<i32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(ConfigError::InvalidApiId(id.to_string())),
        };
        let api_hash = api_hash.trim();
        if api_hash.is_empty() {
            return Err(ConfigError::EmptyApiHash);
        }
        Ok(Self { api_id, api_hash: api_hash.to_string() })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("api_id", &self.api_id).finish_non_exhaustive()
    }
}
