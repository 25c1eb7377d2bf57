//! Process configuration loaded via OrthoConfig.
//!
//! Every field may come from the CLI, a `TALLY_*` environment variable or a
//! configuration file. Flags carry their defaults on the field; optional
//! values fall back to the defaults exposed by the accessors below.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::{Principal, UserId, UserValidationError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_IDENTITY_UID: &str = "dev-user";
const DEFAULT_CONSENT_URL: &str = "http://localhost:8080/consent";

/// Failures turning raw settings into typed values.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The bind address is not `host:port`.
    #[error("invalid bind address {value:?}")]
    InvalidBindAddr {
        /// Rejected value.
        value: String,
    },
    /// The development identity is malformed.
    #[error("invalid identity account: {0}")]
    InvalidIdentity(#[from] UserValidationError),
    /// The consent URL does not parse.
    #[error("invalid consent URL {value:?}: {source}")]
    InvalidConsentUrl {
        /// Rejected value.
        value: String,
        /// Parser failure.
        source: url::ParseError,
    },
}

/// Server, session cookie and identity-provider settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TALLY")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// File holding the session cookie signing key.
    pub session_key_file: Option<PathBuf>,
    /// Permit a generated key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session_key: bool,
    /// Mark the session cookie `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// `SameSite` policy of the session cookie (`Strict`, `Lax` or `None`).
    pub cookie_same_site: Option<String>,
    /// Account uid the in-memory identity provider signs in as.
    pub identity_uid: Option<String>,
    /// Display name of that account.
    pub identity_name: Option<String>,
    /// Email of that account.
    pub identity_email: Option<String>,
    /// Consent page the redirect flow navigates to.
    pub consent_url: Option<String>,
}

impl AppSettings {
    /// Parsed bind address, `0.0.0.0:8080` by default.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// Session key path, falling back to the mounted secret location.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Raw `SameSite` setting, if any.
    pub fn cookie_same_site(&self) -> Option<&str> {
        self.cookie_same_site.as_deref()
    }

    /// The account the in-memory identity provider authenticates.
    pub fn identity_account(&self) -> Result<Principal, SettingsError> {
        let uid = UserId::new(self.identity_uid.as_deref().unwrap_or(DEFAULT_IDENTITY_UID))?;
        let mut principal = Principal::new(uid);
        principal.display_name = self.identity_name.clone();
        principal.email = self.identity_email.clone();
        Ok(principal)
    }

    /// Consent page URL of the redirect flow.
    pub fn consent_url(&self) -> Result<Url, SettingsError> {
        let raw = self.consent_url.as_deref().unwrap_or(DEFAULT_CONSENT_URL);
        Url::parse(raw).map_err(|source| SettingsError::InvalidConsentUrl {
            value: raw.to_owned(),
            source,
        })
    }
}
