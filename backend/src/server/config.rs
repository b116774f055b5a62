//! HTTP server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::Key;
use thiserror::Error as ThisError;
use tracing::warn;

/// Configuration failures surfaced at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// `HTTP_BIND` did not parse as a socket address.
    #[error("invalid bind address {addr:?}: {message}")]
    InvalidBindAddr { addr: String, message: String },
    /// The session key file is unreadable and ephemeral keys are not allowed.
    #[error("failed to read session key at {path}: {message}")]
    SessionKeyUnavailable { path: String, message: String },
}

/// Runtime configuration resolved from environment variables.
///
/// | Variable | Default | Meaning |
/// |---|---|---|
/// | `HTTP_BIND` | `0.0.0.0:8080` | listen address |
/// | `SESSION_KEY_FILE` | `/var/run/secrets/session_key` | cookie key material |
/// | `SESSION_ALLOW_EPHEMERAL` | unset | `1` permits a generated key |
/// | `SESSION_COOKIE_SECURE` | `1` | `0` disables the `Secure` flag |
/// | `UPLOAD_DIR` | `./uploads` | photo storage root |
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub session_key: Key,
    pub cookie_secure: bool,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an injectable variable lookup.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_bind = lookup("HTTP_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_owned());
        let bind_addr: SocketAddr =
            raw_bind
                .parse()
                .map_err(|error: std::net::AddrParseError| ConfigError::InvalidBindAddr {
                    addr: raw_bind.clone(),
                    message: error.to_string(),
                })?;

        let key_path =
            lookup("SESSION_KEY_FILE").unwrap_or_else(|| "/var/run/secrets/session_key".to_owned());
        let session_key = match std::fs::read(&key_path) {
            Ok(bytes) => Key::derive_from(&bytes),
            Err(error) => {
                let allow_ephemeral =
                    lookup("SESSION_ALLOW_EPHEMERAL").as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_ephemeral {
                    warn!(path = %key_path, error = %error, "using temporary session key (dev only)");
                    Key::generate()
                } else {
                    return Err(ConfigError::SessionKeyUnavailable {
                        path: key_path,
                        message: error.to_string(),
                    });
                }
            }
        };

        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .map(|value| value != "0")
            .unwrap_or(true);
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));

        Ok(Self {
            bind_addr,
            session_key,
            cookie_secure,
            upload_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[rstest]
    fn defaults_apply_when_environment_is_empty() {
        let lookup = lookup_from(&[("SESSION_ALLOW_EPHEMERAL", "1")]);
        let config = AppConfig::from_lookup(&lookup).expect("config");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert!(config.cookie_secure);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
    }

    #[rstest]
    fn invalid_bind_address_is_rejected() {
        let lookup = lookup_from(&[("HTTP_BIND", "not-an-addr"), ("SESSION_ALLOW_EPHEMERAL", "1")]);
        assert!(matches!(
            AppConfig::from_lookup(&lookup),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
    }

    #[rstest]
    fn key_file_is_derived_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join("session_key");
        std::fs::write(&key_path, [7u8; 64]).expect("write key");
        let key_path = key_path.to_string_lossy().into_owned();
        let lookup = lookup_from(&[("SESSION_KEY_FILE", key_path.as_str())]);

        let config = AppConfig::from_lookup(&lookup).expect("config");
        // Same material derives the same key.
        let again = AppConfig::from_lookup(&lookup).expect("config");
        assert_eq!(
            config.session_key.signing(),
            again.session_key.signing()
        );
    }

    #[rstest]
    fn secure_flag_disabled_only_by_zero() {
        let off = lookup_from(&[
            ("SESSION_COOKIE_SECURE", "0"),
            ("SESSION_ALLOW_EPHEMERAL", "1"),
        ]);
        assert!(!AppConfig::from_lookup(&off).expect("config").cookie_secure);

        let on = lookup_from(&[
            ("SESSION_COOKIE_SECURE", "true"),
            ("SESSION_ALLOW_EPHEMERAL", "1"),
        ]);
        assert!(AppConfig::from_lookup(&on).expect("config").cookie_secure);
    }
}
