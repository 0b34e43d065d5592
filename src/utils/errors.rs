//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::truck::TransitionError;
use crate::repositories::fleet_store::StoreError;

/// Rechazos del flujo de camiones
///
/// Las variantes de validación se devuelven antes de cualquier escritura,
/// así que no dejan estado a medias.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Truck '{0}' not found")]
    TruckNotFound(String),

    #[error("Driver '{0}' not found")]
    DriverNotFound(uuid::Uuid),

    #[error("Truck '{0}' has no assigned driver")]
    NoDriverAssigned(String),

    #[error("Truck '{0}' is under maintenance")]
    TruckInMaintenance(String),

    #[error("Truck '{0}' is scheduled for maintenance")]
    TruckScheduled(String),

    #[error("Truck '{plate_number}' is overdue for an oil change ({current_odometer} km > {next_oil_change_odometer} km)")]
    OilChangeOverdue {
        plate_number: String,
        current_odometer: Decimal,
        next_oil_change_odometer: Decimal,
    },

    #[error("Odometer reading must be a positive number with at most one decimal and 11 integer digits, got {0}")]
    InvalidOdometer(Decimal),

    #[error("Odometer reading {reading} is lower than the current odometer {current}")]
    OdometerRollback { current: Decimal, reading: Decimal },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Truck '{0}' is currently deployed")]
    TruckDeployed(String),

    #[error("Truck '{0}' is already registered")]
    DuplicatePlate(String),

    #[error("Driver license '{0}' is already registered")]
    DuplicateLicense(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Código estable que consumen los clientes
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::TruckNotFound(_) => "TRUCK_NOT_FOUND",
            WorkflowError::DriverNotFound(_) => "DRIVER_NOT_FOUND",
            WorkflowError::NoDriverAssigned(_) => "NO_DRIVER_ASSIGNED",
            WorkflowError::TruckInMaintenance(_) => "TRUCK_IN_MAINTENANCE",
            WorkflowError::TruckScheduled(_) => "TRUCK_SCHEDULED",
            WorkflowError::OilChangeOverdue { .. } => "OIL_CHANGE_OVERDUE",
            WorkflowError::InvalidOdometer(_) => "INVALID_ODOMETER",
            WorkflowError::OdometerRollback { .. } => "ODOMETER_ROLLBACK",
            WorkflowError::InvalidTransition(_) => "INVALID_TRANSITION",
            WorkflowError::TruckDeployed(_) => "TRUCK_DEPLOYED",
            WorkflowError::DuplicatePlate(_) => "DUPLICATE_PLATE",
            WorkflowError::DuplicateLicense(_) => "DUPLICATE_LICENSE",
            WorkflowError::InvalidRequest(_) => "INVALID_REQUEST",
            WorkflowError::Store(StoreError::Conflict(_)) => "CONCURRENT_MODIFICATION",
            WorkflowError::Store(StoreError::NotFound(_)) => "NOT_FOUND",
            WorkflowError::Store(_) => "DB_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            WorkflowError::TruckNotFound(_) | WorkflowError::DriverNotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::InvalidTransition(_)
            | WorkflowError::TruckDeployed(_)
            | WorkflowError::DuplicatePlate(_)
            | WorkflowError::DuplicateLicense(_) => StatusCode::CONFLICT,
            WorkflowError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            WorkflowError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Validation(e) => {
                warn!("⚠️ Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                warn!("🔒 Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code: Some("UNAUTHORIZED".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                warn!("🔒 Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => {
                warn!("🔒 JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "JWT Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("JWT_ERROR".to_string()),
                    },
                )
            }

            AppError::Workflow(e) => {
                let status = e.status();
                if status.is_server_error() {
                    error!("❌ Workflow error: {}", e);
                } else {
                    warn!("🚫 Workflow rejected: {}", e);
                }
                let message = if status.is_server_error() {
                    "An error occurred while accessing the database".to_string()
                } else {
                    e.to_string()
                };
                (
                    status,
                    ErrorResponse {
                        error: "Workflow Error".to_string(),
                        message,
                        details: None,
                        code: Some(e.code().to_string()),
                    },
                )
            }

            AppError::Store(e) => return AppError::Workflow(WorkflowError::Store(e)).into_response(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}
