// src/config.rs
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub default_markup_percent: f64,
    pub currency_symbol: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "{key} has an invalid value: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match optional("HOST") {
            Some(h) => h.parse().map_err(|_| ConfigError::Invalid { key: "HOST", value: h })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match optional("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: p })?,
            None => 3000,
        };
        let default_markup_percent = match optional("DEFAULT_MARKUP_PERCENT") {
            Some(m) => match m.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => return Err(ConfigError::Invalid { key: "DEFAULT_MARKUP_PERCENT", value: m }),
            },
            None => 30.0,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host,
            port,
            default_markup_percent,
            currency_symbol: optional("CURRENCY_SYMBOL").unwrap_or_else(|| "$".to_string()),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/pricing"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.default_markup_percent, 30.0);
        assert_eq!(config.currency_symbol, "$");
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn test_missing_required() {
        let err = config_from(&[("JWT_SECRET", "s3cret")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", " ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        let err = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DEFAULT_MARKUP_PERCENT", "-5"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEFAULT_MARKUP_PERCENT", .. }));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("DEFAULT_MARKUP_PERCENT", "42.5"),
            ("CURRENCY_SYMBOL", "€"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_markup_percent, 42.5);
        assert_eq!(config.currency_symbol, "€");
        assert_eq!(config.admin_email.as_deref(), Some("admin@example.com"));
    }
}
