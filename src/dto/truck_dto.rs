use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{deployment::Deployment, notification::Notification, truck::Truck};
use crate::services::notification_service::BestEffort;
use crate::utils::validation::{validate_odometer, validate_oil_change_interval, PLATE_NUMBER_RE};

// Request para registrar un camión
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTruckRequest {
    #[validate(regex = "PLATE_NUMBER_RE")]
    pub plate_number: String,

    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub truck_type: Option<String>,

    pub driver_id: Option<Uuid>,

    #[validate(custom = "validate_odometer")]
    pub current_odometer: Option<Decimal>,

    #[validate(custom = "validate_odometer")]
    pub last_oil_change_odometer: Option<Decimal>,

    #[validate(custom = "validate_odometer")]
    pub next_oil_change_odometer: Option<Decimal>,

    #[validate(custom = "validate_oil_change_interval")]
    pub oil_change_interval: Decimal,
}

// Request para asignar conductor
#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

// Request para devolver un camión
#[derive(Debug, Deserialize)]
pub struct ReturnTruckRequest {
    pub odometer: Decimal,
}

// Deployment con las fechas en la zona horaria civil de la flota
#[derive(Debug, Serialize)]
pub struct DeploymentResponse {
    pub id: Uuid,
    pub plate_number: String,
    pub driver_id: Uuid,
    pub start_odometer: Decimal,
    pub deployed_at: DateTime<FixedOffset>,
    pub returned_at: Option<DateTime<FixedOffset>>,
    pub return_odometer: Option<Decimal>,
    pub travel_distance: Option<Decimal>,
    pub voided: bool,
}

impl DeploymentResponse {
    pub fn from_deployment(deployment: Deployment, offset: &FixedOffset) -> Self {
        Self {
            id: deployment.id,
            plate_number: deployment.plate_number,
            driver_id: deployment.driver_id,
            start_odometer: deployment.start_odometer,
            deployed_at: deployment.deployed_at.with_timezone(offset),
            returned_at: deployment.returned_at.map(|at| at.with_timezone(offset)),
            return_odometer: deployment.return_odometer,
            travel_distance: deployment.travel_distance,
            voided: deployment.voided,
        }
    }
}

// Historial de deployments de un camión
#[derive(Debug, Serialize)]
pub struct TruckHistoryResponse {
    pub plate_number: String,
    pub total_distance: Decimal,
    pub deployments: Vec<DeploymentResponse>,
}

// Response de deploy
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub truck: Truck,
    pub deployment: DeploymentResponse,
}

// Response de devolución; `deployment` es None cuando solo se reconcilió el estado
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub truck: Truck,
    pub reconciled: bool,
    pub deployment: Option<DeploymentResponse>,
    pub remaining_to_oil_change: Option<Decimal>,
    pub notification: Option<BestEffort<Notification>>,
}

// Response de cancelación
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub truck: Truck,
    pub voided: Option<DeploymentResponse>,
}
