use std::net::SocketAddr;
use std::path::PathBuf;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ATELIER_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("ATELIER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let host = var("ATELIER_HOST", "0.0.0.0");
        let port = var("ATELIER_PORT", "3000");
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "ATELIER_HOST/ATELIER_PORT",
                value: format!("{}:{}", host, port),
            })?;

        let max_upload_bytes = match lookup("ATELIER_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "ATELIER_MAX_UPLOAD_BYTES",
                value: raw,
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr,
            db_path: var("ATELIER_DB_PATH", "atelier.db").into(),
            jwt_secret,
            storage_dir: var("ATELIER_STORAGE_DIR", "./storage").into(),
            public_base_url: var("ATELIER_PUBLIC_BASE_URL", "http://localhost:3000"),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("ATELIER_JWT_SECRET", "s3cr3t")])).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.db_path, PathBuf::from("atelier.db"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn placeholder_secrets_are_refused() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::InsecureSecret
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("ATELIER_JWT_SECRET", "dev-secret-change-me")]))
                .unwrap_err(),
            ConfigError::InsecureSecret
        );
    }

    #[test]
    fn bad_numbers_are_reported_by_name() {
        let err = Config::from_lookup(lookup(&[
            ("ATELIER_JWT_SECRET", "s3cr3t"),
            ("ATELIER_MAX_UPLOAD_BYTES", "ten megs"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "ATELIER_MAX_UPLOAD_BYTES",
                value: "ten megs".into(),
            }
        );

        let err = Config::from_lookup(lookup(&[
            ("ATELIER_JWT_SECRET", "s3cr3t"),
            ("ATELIER_PORT", "http"),
        ]));
        assert!(err.is_err());
    }
}
