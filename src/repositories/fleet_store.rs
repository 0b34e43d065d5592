//! Acceso al almacén de la flota
//!
//! `FleetStore` es la única puerta a los datos persistidos. Las operaciones
//! que tocan más de una fila (abrir, cerrar o anular un deployment, cambios
//! de mantenimiento) son atómicas: o se confirma todo o nada.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    audit::{AuditLogEntry, NewAuditLog},
    deployment::{Deployment, DeploymentClosing, DeploymentStart, DeploymentVoid},
    driver::{Driver, NewDriver},
    maintenance::{MaintenanceRecord, MaintenanceUpdate, NewMaintenanceRecord, OilChangeReset},
    notification::{NewNotification, Notification, NotificationQuery, NotificationView},
    truck::{NewTruck, StatusChange, Truck, TruckFilters},
};

/// Errores del almacén
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// La fila cambió entre la validación y la escritura, o violaría una unicidad
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait FleetStore: Send + Sync {
    // Camiones
    async fn find_truck(&self, plate_number: &str) -> StoreResult<Option<Truck>>;
    async fn list_trucks(&self, filters: &TruckFilters) -> StoreResult<Vec<Truck>>;
    async fn insert_truck(&self, truck: NewTruck) -> StoreResult<Truck>;
    async fn archive_truck(&self, plate_number: &str) -> StoreResult<Truck>;
    /// Cambia el conductor solo si el camión sigue sin estar desplegado
    async fn set_truck_driver(&self, plate_number: &str, driver_id: Option<Uuid>) -> StoreResult<Truck>;
    /// Compare-and-set del estado; `Conflict` si el estado actual no es `change.from`
    async fn transition_truck(&self, change: StatusChange) -> StoreResult<Truck>;

    // Conductores
    async fn insert_driver(&self, driver: NewDriver) -> StoreResult<Driver>;
    async fn find_driver(&self, id: Uuid) -> StoreResult<Option<Driver>>;
    async fn list_drivers(&self) -> StoreResult<Vec<Driver>>;

    // Deployments
    /// Deployment abierto más reciente del camión
    async fn find_open_deployment(&self, plate_number: &str) -> StoreResult<Option<Deployment>>;
    async fn list_deployments(&self, plate_number: &str) -> StoreResult<Vec<Deployment>>;
    async fn begin_deployment(&self, start: DeploymentStart) -> StoreResult<(Deployment, Truck)>;
    async fn complete_deployment(&self, closing: DeploymentClosing) -> StoreResult<(Deployment, Truck)>;
    async fn void_deployment(&self, voiding: DeploymentVoid) -> StoreResult<(Deployment, Truck)>;

    // Mantenimiento
    async fn find_active_maintenance(&self, plate_number: &str) -> StoreResult<Option<MaintenanceRecord>>;
    async fn list_maintenance(&self, plate_number: &str) -> StoreResult<Vec<MaintenanceRecord>>;
    /// Inserta el registro y aplica el cambio de estado en la misma transacción
    async fn open_maintenance(
        &self,
        record: NewMaintenanceRecord,
        change: StatusChange,
    ) -> StoreResult<(MaintenanceRecord, Truck)>;
    /// Actualiza el registro, el estado y opcionalmente los kilómetros de aceite
    async fn advance_maintenance(
        &self,
        update: MaintenanceUpdate,
        change: StatusChange,
        oil_change: Option<OilChangeReset>,
    ) -> StoreResult<(MaintenanceRecord, Truck)>;

    // Notificaciones
    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification>;
    async fn list_notifications(&self, query: &NotificationQuery) -> StoreResult<Vec<NotificationView>>;
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    // Audit log
    async fn insert_audit_log(&self, entry: NewAuditLog) -> StoreResult<()>;
    async fn list_audit_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogEntry>>;
}
