use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GATHER_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Everything the server reads from its environment, resolved once at
/// startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = get("GATHER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        Ok(Self {
            host: get("GATHER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&get, "GATHER_PORT", 3000)?,
            db_path: get("GATHER_DB_PATH")
                .unwrap_or_else(|| "gather.db".into())
                .into(),
            jwt_secret,
            token_ttl_days: parse(&get, "GATHER_TOKEN_TTL_DAYS", 30)?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value.parse().map_err(|_| ConfigError::Invalid {
            name: "GATHER_HOST",
            value,
        })
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GATHER_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("gather.db"));
        assert_eq!(config.token_ttl_days, 30);
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_rejects_placeholder_secret() {
        for secret in ["", "dev-secret-change-me"] {
            assert!(matches!(
                Config::from_lookup(lookup(&[("GATHER_JWT_SECRET", secret)])),
                Err(ConfigError::InsecureSecret)
            ));
        }
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::InsecureSecret)
        ));
    }

    #[test]
    fn test_rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[
            ("GATHER_JWT_SECRET", "s3cret"),
            ("GATHER_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "GATHER_PORT", .. }));
    }
}
