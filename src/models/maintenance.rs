//! Modelo de MaintenanceRecord
//!
//! Registros de mantenimiento programado o en curso. Son los que meten y
//! sacan a un camión de los estados Scheduled y Maintenance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de mantenimiento - mapea al ENUM maintenance_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "maintenance_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    OilChange,
    Repair,
    Inspection,
    TireService,
}

/// Estado del registro - mapea al ENUM maintenance_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress)
    }
}

/// MaintenanceRecord - mapea exactamente a la tabla maintenance_records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub plate_number: String,
    pub kind: MaintenanceKind,
    pub status: MaintenanceStatus,
    pub scheduled_for: Option<NaiveDate>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub odometer_at_service: Option<Decimal>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Actualización de un registro existente
#[derive(Debug, Clone)]
pub struct MaintenanceUpdate {
    pub id: Uuid,
    pub status: MaintenanceStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub odometer_at_service: Option<Decimal>,
}

/// Nuevos valores de aceite tras un cambio completado
#[derive(Debug, Clone, Copy)]
pub struct OilChangeReset {
    pub last_oil_change_odometer: Decimal,
    pub next_oil_change_odometer: Decimal,
}

/// Datos para insertar un registro
#[derive(Debug, Clone)]
pub struct NewMaintenanceRecord {
    pub plate_number: String,
    pub kind: MaintenanceKind,
    pub status: MaintenanceStatus,
    pub scheduled_for: Option<NaiveDate>,
    pub started_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
