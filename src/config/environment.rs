//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::env;

/// Horas de desfase de la zona civil por defecto (UTC+8)
const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Dónde viven los datos de la flota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("FLEET_STORE must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub store_backend: StoreBackend,
    /// Zona horaria civil en la que se expresan las fechas del flujo
    pub civil_offset: FixedOffset,
    pub audit_queue_capacity: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            jwt_secret: "development-secret-change-me".to_string(),
            jwt_expiration: 86_400,
            cors_origins: vec!["http://localhost:3000".to_string()],
            store_backend: StoreBackend::Memory,
            civil_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix()),
            audit_queue_capacity: 1024,
        }
    }
}

/// Desfase fijo a partir de horas respecto a UTC
pub fn civil_offset(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("invalid UTC offset: {} hours", hours))
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be valid: {}", name, e)),
        Err(_) => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Leer la configuración del entorno. JWT_SECRET es obligatorio fuera de desarrollo.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = var_or("ENVIRONMENT", &defaults.environment);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "development" || environment == "test" => defaults.jwt_secret,
            _ => bail!("JWT_SECRET must be set"),
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let store_backend = match env::var("FLEET_STORE") {
            Ok(raw) => raw.parse()?,
            Err(_) if env::var("DATABASE_URL").is_ok() => StoreBackend::Postgres,
            Err(_) => StoreBackend::Memory,
        };

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            host: var_or("HOST", &defaults.host),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", defaults.jwt_expiration)?,
            cors_origins,
            store_backend,
            civil_offset: civil_offset(parse_var("FLEET_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?)?,
            audit_queue_capacity: parse_var("AUDIT_QUEUE_CAPACITY", defaults.audit_queue_capacity)?,
            environment,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
