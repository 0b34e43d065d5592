//! Modelo de Driver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Driver - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub license_number: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Datos para insertar un conductor
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub full_name: String,
    pub license_number: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}
