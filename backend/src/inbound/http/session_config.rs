//! Session cookie configuration derived from [`AppSettings`].
//!
//! Debug builds tolerate weak or missing material and warn; release builds
//! refuse to start with it.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroize;

use crate::settings::AppSettings;

const SESSION_KEY_MIN_LEN: usize = 64;

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to defaults and emit warnings.
    Debug,
    /// Release builds require valid session material.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tally::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated cookie session settings.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// The `SameSite` value is not recognised.
    #[error("invalid cookie SameSite value '{value}'; expected Strict|Lax|None")]
    InvalidSameSite { value: String },
    /// `SameSite=None` requires a secure cookie in release builds.
    #[error("SameSite=None requires a Secure session cookie")]
    InsecureSameSiteNone,
    /// Release builds must not allow ephemeral session keys.
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from application settings and build mode.
///
/// # Examples
///
/// ```rust,no_run
/// use ortho_config::OrthoConfig;
/// use tally::inbound::http::session_config::{BuildMode, session_settings};
/// use tally::settings::AppSettings;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = AppSettings::load()?;
/// let session = session_settings(&settings, BuildMode::from_debug_assertions())?;
/// assert!(session.cookie_secure || cfg!(debug_assertions));
/// # Ok(())
/// # }
/// ```
pub fn session_settings(
    settings: &AppSettings,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let allow_ephemeral = settings.allow_ephemeral_session_key;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let cookie_secure = settings.cookie_secure;
    if !cookie_secure && !mode.is_debug() {
        warn!("session cookie Secure flag disabled in a release build");
    }
    let same_site = same_site(settings.cookie_same_site(), cookie_secure, mode)?;
    let key = session_key(&settings.session_key_file(), mode, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn same_site(
    raw: Option<&str>,
    cookie_secure: bool,
    mode: BuildMode,
) -> Result<SameSite, SessionConfigError> {
    let Some(raw) = raw else {
        return Ok(SameSite::Lax);
    };
    let parsed = match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        _ if mode.is_debug() => {
            warn!(value = %raw, "invalid cookie SameSite; defaulting to Lax");
            return Ok(SameSite::Lax);
        }
        _ => {
            return Err(SessionConfigError::InvalidSameSite {
                value: raw.to_owned(),
            });
        }
    };
    if parsed == SameSite::None && !cookie_secure {
        if mode.is_debug() {
            warn!("SameSite=None without a Secure cookie; browsers will drop it");
        } else {
            return Err(SessionConfigError::InsecureSameSiteNone);
        }
    }
    Ok(parsed)
}

fn session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                if mode.is_debug() {
                    warn!(
                        path = %path.display(),
                        length,
                        "session key too short; using temporary key (dev only)"
                    );
                    return Ok(Key::generate());
                }
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
