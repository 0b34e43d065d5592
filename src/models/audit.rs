//! Modelo de AuditLog
//!
//! Registro append-only de quién hizo qué sobre qué tabla. No tiene
//! `updated_at` porque las entradas nunca se modifican.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::session::SessionContext;

/// Acciones auditadas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    TruckRegistered,
    TruckArchived,
    DriverAssigned,
    DriverUnassigned,
    DriverRegistered,
    TruckDeployed,
    TruckReturned,
    DeploymentCancelled,
    DeploymentReconciled,
    MaintenanceScheduled,
    MaintenanceStarted,
    MaintenanceCompleted,
    MaintenanceCancelled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::TruckRegistered => "truck_registered",
            AuditAction::TruckArchived => "truck_archived",
            AuditAction::DriverAssigned => "driver_assigned",
            AuditAction::DriverUnassigned => "driver_unassigned",
            AuditAction::DriverRegistered => "driver_registered",
            AuditAction::TruckDeployed => "truck_deployed",
            AuditAction::TruckReturned => "truck_returned",
            AuditAction::DeploymentCancelled => "deployment_cancelled",
            AuditAction::DeploymentReconciled => "deployment_reconciled",
            AuditAction::MaintenanceScheduled => "maintenance_scheduled",
            AuditAction::MaintenanceStarted => "maintenance_started",
            AuditAction::MaintenanceCompleted => "maintenance_completed",
            AuditAction::MaintenanceCancelled => "maintenance_cancelled",
        }
    }
}

/// Entrada del audit log - mapea exactamente a la tabla audit_logs
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub table_name: String,
    pub record_key: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Datos para insertar una entrada
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: AuditAction,
    pub table_name: &'static str,
    pub record_key: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditLog {
    pub fn new(
        session: &SessionContext,
        action: AuditAction,
        table_name: &'static str,
        record_key: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id: session.user_id,
            actor_name: session.display_name.clone(),
            action,
            table_name,
            record_key: record_key.into(),
            details: None,
            created_at,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
