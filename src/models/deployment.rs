//! Modelo de Deployment
//!
//! Un deployment es un periodo de uso de un camión por un conductor,
//! abierto mientras `returned_at` es NULL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::truck::TruckStatus;

/// Deployment - mapea exactamente a la tabla deployments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Deployment {
    pub id: Uuid,
    pub plate_number: String,
    pub driver_id: Uuid,
    pub start_odometer: Decimal,
    pub deployed_at: DateTime<Utc>,
    pub deployed_by: Option<Uuid>,
    pub returned_at: Option<DateTime<Utc>>,
    pub return_odometer: Option<Decimal>,
    pub travel_distance: Option<Decimal>,
    pub voided: bool,
}

impl Deployment {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Apertura atómica: insertar deployment y pasar el camión a Deployed
#[derive(Debug, Clone)]
pub struct DeploymentStart {
    pub id: Uuid,
    pub plate_number: String,
    pub driver_id: Uuid,
    pub start_odometer: Decimal,
    pub deployed_at: DateTime<Utc>,
    pub deployed_by: Uuid,
    /// Estado validado por el flujo; si cambió entre lectura y escritura hay conflicto
    pub expected_status: TruckStatus,
}

/// Cierre atómico por devolución
#[derive(Debug, Clone)]
pub struct DeploymentClosing {
    pub deployment_id: Uuid,
    pub plate_number: String,
    pub returned_at: DateTime<Utc>,
    pub return_odometer: Decimal,
    pub travel_distance: Decimal,
    /// Estado leído al validar la devolución (Deployed, o Available si el dato era inconsistente)
    pub expected_status: TruckStatus,
    /// Odómetro leído al validar la devolución
    pub expected_odometer: Decimal,
}

/// Anulación atómica: cierra sin distancia y deja el odómetro intacto
#[derive(Debug, Clone)]
pub struct DeploymentVoid {
    pub deployment_id: Uuid,
    pub plate_number: String,
    pub returned_at: DateTime<Utc>,
}
