//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errores de configuración
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid number (got '{value}')")]
    InvalidNumber { name: &'static str, value: String },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub log_level: Option<String>,
    /// Usar X-Forwarded-For como IP del cliente (solo detrás de un proxy propio)
    pub trust_proxy_headers: bool,
}

impl EnvironmentConfig {
    /// Cargar la configuración desde las variables de entorno del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Cargar la configuración desde una función de búsqueda arbitraria
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: parse_or("PORT", get("PORT"), 3000)?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 20)?,
            db_min_connections: parse_or("DB_MIN_CONNECTIONS", get("DB_MIN_CONNECTIONS"), 1)?,
            jwt_secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiration: parse_or("JWT_EXPIRATION", get("JWT_EXPIRATION"), 8 * 3600)?,
            cors_origins: get("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", get("RATE_LIMIT_REQUESTS"), 10)?,
            rate_limit_window: parse_or("RATE_LIMIT_WINDOW", get("RATE_LIMIT_WINDOW"), 60)?,
            media_root: PathBuf::from(get("MEDIA_ROOT").unwrap_or_else(|| "./media".to_string())),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 10 * 1024 * 1024)?,
            log_level: get("LOG_LEVEL"),
            trust_proxy_headers: get("TRUST_PROXY_HEADERS").map_or(false, |v| parse_flag(&v)),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = EnvironmentConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/fleet"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.is_development());
        assert_eq!(config.jwt_expiration, 28800);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.cors_origins.is_empty());
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.server_url(), "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_required() {
        let err = EnvironmentConfig::from_lookup(lookup(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = EnvironmentConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/fleet"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidNumber { name: "PORT", .. }));
    }

    #[test]
    fn test_cors_origins_split() {
        let config = EnvironmentConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/fleet"),
            ("JWT_SECRET", "secret"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();

        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.is_production());
    }

    #[test]
    fn test_trust_proxy_headers_flag() {
        for (raw, expected) in [("true", true), ("1", true), ("YES", true), ("false", false), ("nope", false)] {
            let config = EnvironmentConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://localhost/fleet"),
                ("JWT_SECRET", "secret"),
                ("TRUST_PROXY_HEADERS", raw),
            ]))
            .unwrap();
            assert_eq!(config.trust_proxy_headers, expected, "{}", raw);
        }
    }
}
