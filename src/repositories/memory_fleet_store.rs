//! Almacén en memoria
//!
//! Misma semántica que `PgFleetStore` con un único `RwLock`: cada operación
//! compuesta toma el lock de escritura una sola vez, así que es atómica.
//! Se usa en los tests y con `FLEET_STORE=memory` para desarrollo local.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::fleet_store::{FleetStore, StoreError, StoreResult};
use crate::models::{
    audit::{AuditLogEntry, NewAuditLog},
    deployment::{Deployment, DeploymentClosing, DeploymentStart, DeploymentVoid},
    driver::{Driver, NewDriver},
    maintenance::{MaintenanceRecord, MaintenanceUpdate, NewMaintenanceRecord, OilChangeReset},
    notification::{NewNotification, Notification, NotificationQuery, NotificationView},
    truck::{NewTruck, StatusChange, Truck, TruckFilters, TruckStatus},
};

#[derive(Default)]
struct MemoryState {
    trucks: BTreeMap<String, Truck>,
    drivers: HashMap<Uuid, Driver>,
    deployments: Vec<Deployment>,
    maintenance: Vec<MaintenanceRecord>,
    notifications: Vec<Notification>,
    notification_reads: HashSet<(Uuid, Uuid)>,
    audit_logs: Vec<AuditLogEntry>,
}

impl MemoryState {
    fn truck_mut(&mut self, plate_number: &str) -> StoreResult<&mut Truck> {
        self.trucks
            .get_mut(plate_number)
            .ok_or_else(|| StoreError::NotFound(format!("Truck '{}'", plate_number)))
    }

    fn open_deployment_index(&self, plate_number: &str) -> Option<usize> {
        self.deployments
            .iter()
            .enumerate()
            .filter(|(_, d)| d.plate_number == plate_number && d.is_open())
            .max_by_key(|(_, d)| d.deployed_at)
            .map(|(i, _)| i)
    }

    fn apply_transition(&mut self, change: &StatusChange, oil_change: Option<OilChangeReset>) -> StoreResult<Truck> {
        let truck = self.truck_mut(&change.plate_number)?;
        if truck.status != change.from {
            return Err(StoreError::Conflict(format!(
                "Truck '{}' is no longer {}",
                change.plate_number,
                change.from.as_str()
            )));
        }
        truck.status = change.to;
        truck.updated_at = change.at;
        if let Some(oil) = oil_change {
            truck.last_oil_change_odometer = oil.last_oil_change_odometer;
            truck.next_oil_change_odometer = oil.next_oil_change_odometer;
        }
        Ok(truck.clone())
    }
}

/// Almacén en memoria con inyección de fallos para los efectos secundarios
#[derive(Default)]
pub struct MemoryFleetStore {
    state: RwLock<MemoryState>,
    fail_notifications: AtomicBool,
    fail_audit_logs: AtomicBool,
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hacer fallar las inserciones de notificaciones
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Hacer fallar las inserciones del audit log
    pub fn fail_audit_logs(&self, fail: bool) {
        self.fail_audit_logs.store(fail, Ordering::SeqCst);
    }

    /// Forzar el estado de un camión saltándose la máquina de estados
    pub async fn overwrite_truck(&self, truck: Truck) {
        let mut state = self.state.write().await;
        state.trucks.insert(truck.plate_number.clone(), truck);
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Protocol(format!("{} unavailable", what)))
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    async fn find_truck(&self, plate_number: &str) -> StoreResult<Option<Truck>> {
        Ok(self.state.read().await.trucks.get(plate_number).cloned())
    }

    async fn list_trucks(&self, filters: &TruckFilters) -> StoreResult<Vec<Truck>> {
        let state = self.state.read().await;
        Ok(state
            .trucks
            .values()
            .filter(|t| filters.include_archived || !t.is_archived)
            .filter(|t| filters.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }

    async fn insert_truck(&self, truck: NewTruck) -> StoreResult<Truck> {
        let mut state = self.state.write().await;
        if state.trucks.contains_key(&truck.plate_number) {
            return Err(StoreError::Conflict(format!("Truck '{}' already exists", truck.plate_number)));
        }

        let row = Truck {
            plate_number: truck.plate_number.clone(),
            brand: truck.brand,
            model: truck.model,
            truck_type: truck.truck_type,
            driver_id: truck.driver_id,
            current_odometer: truck.current_odometer,
            last_oil_change_odometer: truck.last_oil_change_odometer,
            next_oil_change_odometer: truck.next_oil_change_odometer,
            oil_change_interval: truck.oil_change_interval,
            status: TruckStatus::Available,
            is_archived: false,
            created_at: truck.created_at,
            updated_at: truck.created_at,
        };
        state.trucks.insert(truck.plate_number, row.clone());
        Ok(row)
    }

    async fn archive_truck(&self, plate_number: &str) -> StoreResult<Truck> {
        let mut state = self.state.write().await;
        let truck = state.truck_mut(plate_number)?;
        if truck.status == TruckStatus::Deployed {
            return Err(StoreError::Conflict(format!("Truck '{}' cannot be archived right now", plate_number)));
        }
        truck.is_archived = true;
        truck.updated_at = Utc::now();
        Ok(truck.clone())
    }

    async fn set_truck_driver(&self, plate_number: &str, driver_id: Option<Uuid>) -> StoreResult<Truck> {
        let mut state = self.state.write().await;
        let truck = state.truck_mut(plate_number)?;
        if truck.status == TruckStatus::Deployed {
            return Err(StoreError::Conflict(format!("Truck '{}' was deployed concurrently", plate_number)));
        }
        truck.driver_id = driver_id;
        truck.updated_at = Utc::now();
        Ok(truck.clone())
    }

    async fn transition_truck(&self, change: StatusChange) -> StoreResult<Truck> {
        self.state.write().await.apply_transition(&change, None)
    }

    async fn insert_driver(&self, driver: NewDriver) -> StoreResult<Driver> {
        let mut state = self.state.write().await;
        if state.drivers.values().any(|d| d.license_number == driver.license_number) {
            return Err(StoreError::Conflict(format!(
                "Driver with license '{}' already exists",
                driver.license_number
            )));
        }

        let row = Driver {
            id: Uuid::new_v4(),
            full_name: driver.full_name,
            license_number: driver.license_number,
            phone: driver.phone,
            created_at: driver.created_at,
        };
        state.drivers.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        Ok(self.state.read().await.drivers.get(&id).cloned())
    }

    async fn list_drivers(&self) -> StoreResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self.state.read().await.drivers.values().cloned().collect();
        drivers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(drivers)
    }

    async fn find_open_deployment(&self, plate_number: &str) -> StoreResult<Option<Deployment>> {
        let state = self.state.read().await;
        Ok(state
            .open_deployment_index(plate_number)
            .map(|i| state.deployments[i].clone()))
    }

    async fn list_deployments(&self, plate_number: &str) -> StoreResult<Vec<Deployment>> {
        let state = self.state.read().await;
        let mut deployments: Vec<Deployment> = state
            .deployments
            .iter()
            .filter(|d| d.plate_number == plate_number)
            .cloned()
            .collect();
        deployments.sort_by(|a, b| b.deployed_at.cmp(&a.deployed_at));
        Ok(deployments)
    }

    async fn begin_deployment(&self, start: DeploymentStart) -> StoreResult<(Deployment, Truck)> {
        let mut state = self.state.write().await;

        if state.open_deployment_index(&start.plate_number).is_some() {
            return Err(StoreError::Conflict(format!(
                "Open deployment for '{}' already exists",
                start.plate_number
            )));
        }

        let truck = state.truck_mut(&start.plate_number)?;
        if truck.status != start.expected_status
            || truck.driver_id != Some(start.driver_id)
            || truck.current_odometer != start.start_odometer
            || truck.is_archived
        {
            return Err(StoreError::Conflict(format!(
                "Truck '{}' changed before deployment",
                start.plate_number
            )));
        }
        truck.status = TruckStatus::Deployed;
        truck.updated_at = start.deployed_at;
        let truck = truck.clone();

        let deployment = Deployment {
            id: start.id,
            plate_number: start.plate_number,
            driver_id: start.driver_id,
            start_odometer: start.start_odometer,
            deployed_at: start.deployed_at,
            deployed_by: Some(start.deployed_by),
            returned_at: None,
            return_odometer: None,
            travel_distance: None,
            voided: false,
        };
        state.deployments.push(deployment.clone());

        Ok((deployment, truck))
    }

    async fn complete_deployment(&self, closing: DeploymentClosing) -> StoreResult<(Deployment, Truck)> {
        let mut state = self.state.write().await;

        let index = state
            .deployments
            .iter()
            .position(|d| d.id == closing.deployment_id && d.plate_number == closing.plate_number && d.is_open())
            .ok_or_else(|| StoreError::Conflict(format!("Deployment {} was already closed", closing.deployment_id)))?;

        // Validar el camión antes de tocar nada para no dejar escrituras a medias
        let truck = state.truck_mut(&closing.plate_number)?;
        if !matches!(closing.expected_status, TruckStatus::Deployed | TruckStatus::Available)
            || truck.status != closing.expected_status
            || truck.current_odometer != closing.expected_odometer
        {
            return Err(StoreError::Conflict(format!(
                "Truck '{}' changed before return",
                closing.plate_number
            )));
        }
        truck.status = TruckStatus::Available;
        truck.current_odometer = closing.return_odometer;
        truck.updated_at = closing.returned_at;
        let truck = truck.clone();

        let deployment = &mut state.deployments[index];
        deployment.returned_at = Some(closing.returned_at);
        deployment.return_odometer = Some(closing.return_odometer);
        deployment.travel_distance = Some(closing.travel_distance);

        Ok((deployment.clone(), truck))
    }

    async fn void_deployment(&self, voiding: DeploymentVoid) -> StoreResult<(Deployment, Truck)> {
        let mut state = self.state.write().await;

        let index = state
            .deployments
            .iter()
            .position(|d| d.id == voiding.deployment_id && d.plate_number == voiding.plate_number && d.is_open())
            .ok_or_else(|| StoreError::Conflict(format!("Deployment {} was already closed", voiding.deployment_id)))?;

        let truck = state.truck_mut(&voiding.plate_number)?;
        if !matches!(truck.status, TruckStatus::Deployed | TruckStatus::Available) {
            return Err(StoreError::Conflict(format!(
                "Truck '{}' changed before cancellation",
                voiding.plate_number
            )));
        }
        truck.status = TruckStatus::Available;
        truck.updated_at = voiding.returned_at;
        let truck = truck.clone();

        let deployment = &mut state.deployments[index];
        deployment.returned_at = Some(voiding.returned_at);
        deployment.travel_distance = Some(Decimal::ZERO);
        deployment.voided = true;

        Ok((deployment.clone(), truck))
    }

    async fn find_active_maintenance(&self, plate_number: &str) -> StoreResult<Option<MaintenanceRecord>> {
        let state = self.state.read().await;
        Ok(state
            .maintenance
            .iter()
            .filter(|m| m.plate_number == plate_number && m.status.is_active())
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn list_maintenance(&self, plate_number: &str) -> StoreResult<Vec<MaintenanceRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<MaintenanceRecord> = state
            .maintenance
            .iter()
            .filter(|m| m.plate_number == plate_number)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn open_maintenance(
        &self,
        record: NewMaintenanceRecord,
        change: StatusChange,
    ) -> StoreResult<(MaintenanceRecord, Truck)> {
        let mut state = self.state.write().await;
        let truck = state.apply_transition(&change, None)?;

        let row = MaintenanceRecord {
            id: Uuid::new_v4(),
            plate_number: record.plate_number,
            kind: record.kind,
            status: record.status,
            scheduled_for: record.scheduled_for,
            started_at: record.started_at,
            completed_at: None,
            odometer_at_service: None,
            notes: record.notes,
            created_by: record.created_by,
            created_at: record.created_at,
        };
        state.maintenance.push(row.clone());

        Ok((row, truck))
    }

    async fn advance_maintenance(
        &self,
        update: MaintenanceUpdate,
        change: StatusChange,
        oil_change: Option<OilChangeReset>,
    ) -> StoreResult<(MaintenanceRecord, Truck)> {
        let mut state = self.state.write().await;

        let index = state
            .maintenance
            .iter()
            .position(|m| m.id == update.id && m.status.is_active())
            .ok_or_else(|| StoreError::Conflict(format!("Maintenance record {} is no longer active", update.id)))?;

        let truck = state.apply_transition(&change, oil_change)?;

        let record = &mut state.maintenance[index];
        record.status = update.status;
        record.started_at = update.started_at.or(record.started_at);
        record.completed_at = update.completed_at.or(record.completed_at);
        record.odometer_at_service = update.odometer_at_service.or(record.odometer_at_service);

        Ok((record.clone(), truck))
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(unavailable("notifications"));
        }

        let row = Notification {
            id: Uuid::new_v4(),
            plate_number: notification.plate_number,
            kind: notification.kind,
            severity: notification.severity,
            message: notification.message,
            audience_role: notification.audience_role,
            recipient_id: notification.recipient_id,
            created_at: notification.created_at,
        };
        self.state.write().await.notifications.push(row.clone());
        Ok(row)
    }

    async fn list_notifications(&self, query: &NotificationQuery) -> StoreResult<Vec<NotificationView>> {
        let state = self.state.read().await;
        let mut views: Vec<NotificationView> = state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == Some(query.user_id) || n.audience_role == Some(query.role))
            .map(|n| NotificationView {
                notification: n.clone(),
                is_read: state.notification_reads.contains(&(n.id, query.user_id)),
            })
            .filter(|v| !query.unread_only || !v.is_read)
            .collect();
        views.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        views.truncate(usize::try_from(query.limit).unwrap_or(0));
        Ok(views)
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.notifications.iter().any(|n| n.id == notification_id) {
            return Err(StoreError::NotFound(format!("Notification {}", notification_id)));
        }
        state.notification_reads.insert((notification_id, user_id));
        Ok(())
    }

    async fn insert_audit_log(&self, entry: NewAuditLog) -> StoreResult<()> {
        if self.fail_audit_logs.load(Ordering::SeqCst) {
            return Err(unavailable("audit_logs"));
        }

        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            actor_name: entry.actor_name,
            action: entry.action.as_str().to_string(),
            table_name: entry.table_name.to_string(),
            record_key: entry.record_key,
            details: entry.details,
            created_at: entry.created_at,
        };
        self.state.write().await.audit_logs.push(row);
        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        let mut entries = state.audit_logs.clone();
        // Orden estable: las más recientes primero, y a igual hora la última insertada
        entries.reverse();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(entries)
    }
}
