use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const REGION: &str = "AWS_REGION";
pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

// ── Credentials ───────────────────────────────────────────────

/// Static AWS credentials plus the region every client is bound to.
///
/// Built once from a secrets file or the environment and passed around
/// explicitly; nothing here writes back into the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Build credentials, rejecting empty required values.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let creds = Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            session_token: None,
        };
        creds.validate()?;
        Ok(creds)
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.session_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    /// Read credentials from the environment.
    /// Profile is read from `QUARRY_PROFILE`; when set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_opt("QUARRY_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::from_env_profiled(&profile)
    }

    /// Read credentials for a specific named profile (empty string = default).
    pub fn from_env_profiled(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        Self::from_lookup(|key| profiled_env_opt(&p, key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingSecret(key));
        Ok(Self {
            access_key_id: require(ACCESS_KEY_ID)?,
            secret_access_key: require(SECRET_ACCESS_KEY)?,
            region: require(REGION)?,
            session_token: lookup(SESSION_TOKEN),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access_key_id.is_empty() {
            return Err(ConfigError::MissingSecret(ACCESS_KEY_ID));
        }
        if self.secret_access_key.is_empty() {
            return Err(ConfigError::MissingSecret(SECRET_ACCESS_KEY));
        }
        if self.region.is_empty() {
            return Err(ConfigError::MissingSecret(REGION));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Load credentials from a dotenv-style secrets file.
///
/// The file is parsed in place; values are never exported into the process
/// environment. `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_REGION`
/// are required, `AWS_SESSION_TOKEN` is optional.
pub fn load_secrets(path: impl AsRef<Path>) -> Result<Credentials, ConfigError> {
    let path = path.as_ref();
    let iter = dotenvy::from_path_iter(path).map_err(map_dotenv_error)?;

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(map_dotenv_error)?;
        values.insert(key, value);
    }
    debug!(path = %path.display(), keys = values.len(), "Parsed secrets file");

    Credentials::from_lookup(|key| values.get(key).filter(|v| !v.is_empty()).cloned())
}

fn map_dotenv_error(err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::Io(e) => ConfigError::Io(e),
        other => ConfigError::Parse(other.to_string()),
    }
}
