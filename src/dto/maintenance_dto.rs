use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::maintenance::{MaintenanceKind, MaintenanceRecord};
use crate::models::truck::Truck;

// Request para programar mantenimiento
#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleMaintenanceRequest {
    pub kind: MaintenanceKind,
    pub scheduled_for: NaiveDate,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

// Request para empezar mantenimiento; `kind` es obligatorio si no había nada programado
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StartMaintenanceRequest {
    pub kind: Option<MaintenanceKind>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

// Registro de mantenimiento junto con el camión actualizado
#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub record: MaintenanceRecord,
    pub truck: Truck,
}
