//! Servicio de mantenimiento
//!
//! Dueño de los estados Scheduled y Maintenance. Cada cambio de estado se
//! escribe junto con su registro de mantenimiento en una sola operación.

use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::dto::maintenance_dto::{ScheduleMaintenanceRequest, StartMaintenanceRequest};
use crate::models::{
    audit::{AuditAction, NewAuditLog},
    maintenance::{
        MaintenanceKind, MaintenanceRecord, MaintenanceStatus, MaintenanceUpdate, NewMaintenanceRecord,
        OilChangeReset,
    },
    session::SessionContext,
    truck::{StatusChange, Truck, TruckEvent, TruckStatus},
};
use crate::repositories::FleetStore;
use crate::services::audit_service::AuditTrail;
use crate::utils::clock::Clock;
use crate::utils::errors::WorkflowError;
use crate::utils::validation::normalize_plate;

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<dyn FleetStore>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn FleetStore>, audit: AuditTrail, clock: Arc<dyn Clock>) -> Self {
        Self { store, audit, clock }
    }

    async fn load_truck(&self, plate_number: &str) -> Result<Truck, WorkflowError> {
        let plate_number = normalize_plate(plate_number);
        self.store
            .find_truck(&plate_number)
            .await?
            .filter(|truck| !truck.is_archived)
            .ok_or(WorkflowError::TruckNotFound(plate_number))
    }

    async fn active_record(&self, truck: &Truck) -> Result<MaintenanceRecord, WorkflowError> {
        self.store
            .find_active_maintenance(&truck.plate_number)
            .await?
            .ok_or_else(|| {
                WorkflowError::InvalidRequest(format!("Truck '{}' has no active maintenance record", truck.plate_number))
            })
    }

    /// Programar mantenimiento: Available → Scheduled
    pub async fn schedule(
        &self,
        session: &SessionContext,
        plate_number: &str,
        request: ScheduleMaintenanceRequest,
    ) -> Result<(MaintenanceRecord, Truck), WorkflowError> {
        let truck = self.load_truck(plate_number).await?;
        let to = truck.status.apply(TruckEvent::ScheduleMaintenance)?;
        let now = self.clock.now();

        let (record, truck) = self
            .store
            .open_maintenance(
                NewMaintenanceRecord {
                    plate_number: truck.plate_number.clone(),
                    kind: request.kind,
                    status: MaintenanceStatus::Scheduled,
                    scheduled_for: Some(request.scheduled_for),
                    started_at: None,
                    notes: request.notes,
                    created_by: session.user_id,
                    created_at: now,
                },
                StatusChange {
                    plate_number: truck.plate_number.clone(),
                    from: truck.status,
                    to,
                    at: now,
                },
            )
            .await?;

        info!("🗓️ Mantenimiento {:?} programado para {} el {}", record.kind, truck.plate_number, request.scheduled_for);
        self.audit.record(
            NewAuditLog::new(session, AuditAction::MaintenanceScheduled, "maintenance_records", record.id.to_string(), now)
                .with_details(json!({ "plate_number": truck.plate_number, "kind": record.kind })),
        );
        Ok((record, truck))
    }

    /// Empezar mantenimiento: Available | Scheduled → Maintenance
    pub async fn start(
        &self,
        session: &SessionContext,
        plate_number: &str,
        request: StartMaintenanceRequest,
    ) -> Result<(MaintenanceRecord, Truck), WorkflowError> {
        let truck = self.load_truck(plate_number).await?;
        let to = truck.status.apply(TruckEvent::StartMaintenance)?;
        let now = self.clock.now();
        let change = StatusChange {
            plate_number: truck.plate_number.clone(),
            from: truck.status,
            to,
            at: now,
        };

        let (record, truck) = if truck.status == TruckStatus::Scheduled {
            let scheduled = self.active_record(&truck).await?;
            self.store
                .advance_maintenance(
                    MaintenanceUpdate {
                        id: scheduled.id,
                        status: MaintenanceStatus::InProgress,
                        started_at: Some(now),
                        completed_at: None,
                        odometer_at_service: None,
                    },
                    change,
                    None,
                )
                .await?
        } else {
            let kind = request.kind.ok_or_else(|| {
                WorkflowError::InvalidRequest("maintenance kind is required when nothing is scheduled".to_string())
            })?;
            self.store
                .open_maintenance(
                    NewMaintenanceRecord {
                        plate_number: truck.plate_number.clone(),
                        kind,
                        status: MaintenanceStatus::InProgress,
                        scheduled_for: None,
                        started_at: Some(now),
                        notes: request.notes,
                        created_by: session.user_id,
                        created_at: now,
                    },
                    change,
                )
                .await?
        };

        info!("🔧 Mantenimiento {:?} iniciado en {}", record.kind, truck.plate_number);
        self.audit.record(
            NewAuditLog::new(session, AuditAction::MaintenanceStarted, "maintenance_records", record.id.to_string(), now)
                .with_details(json!({ "plate_number": truck.plate_number, "kind": record.kind })),
        );
        Ok((record, truck))
    }

    /// Terminar mantenimiento: Maintenance → Available
    ///
    /// Un cambio de aceite reinicia la ventana: último = odómetro actual,
    /// próximo = odómetro actual + intervalo.
    pub async fn complete(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<(MaintenanceRecord, Truck), WorkflowError> {
        let truck = self.load_truck(plate_number).await?;
        let to = truck.status.apply(TruckEvent::CompleteMaintenance)?;
        let record = self.active_record(&truck).await?;
        let now = self.clock.now();

        let oil_change = (record.kind == MaintenanceKind::OilChange).then(|| OilChangeReset {
            last_oil_change_odometer: truck.current_odometer,
            next_oil_change_odometer: truck.current_odometer + truck.oil_change_interval,
        });

        let (record, truck) = self
            .store
            .advance_maintenance(
                MaintenanceUpdate {
                    id: record.id,
                    status: MaintenanceStatus::Completed,
                    started_at: None,
                    completed_at: Some(now),
                    odometer_at_service: Some(truck.current_odometer),
                },
                StatusChange {
                    plate_number: truck.plate_number.clone(),
                    from: truck.status,
                    to,
                    at: now,
                },
                oil_change,
            )
            .await?;

        info!("✅ Mantenimiento {:?} completado en {}", record.kind, truck.plate_number);
        self.audit.record(
            NewAuditLog::new(session, AuditAction::MaintenanceCompleted, "maintenance_records", record.id.to_string(), now)
                .with_details(json!({
                    "plate_number": truck.plate_number,
                    "kind": record.kind,
                    "odometer_at_service": record.odometer_at_service,
                    "next_oil_change_odometer": truck.next_oil_change_odometer,
                })),
        );
        Ok((record, truck))
    }

    /// Cancelar lo programado: Scheduled → Available
    pub async fn cancel(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<(MaintenanceRecord, Truck), WorkflowError> {
        let truck = self.load_truck(plate_number).await?;
        let to = truck.status.apply(TruckEvent::CancelSchedule)?;
        let record = self.active_record(&truck).await?;
        let now = self.clock.now();

        let (record, truck) = self
            .store
            .advance_maintenance(
                MaintenanceUpdate {
                    id: record.id,
                    status: MaintenanceStatus::Cancelled,
                    started_at: None,
                    completed_at: None,
                    odometer_at_service: None,
                },
                StatusChange {
                    plate_number: truck.plate_number.clone(),
                    from: truck.status,
                    to,
                    at: now,
                },
                None,
            )
            .await?;

        self.audit.record(NewAuditLog::new(
            session,
            AuditAction::MaintenanceCancelled,
            "maintenance_records",
            record.id.to_string(),
            now,
        ));
        Ok((record, truck))
    }

    pub async fn list(&self, plate_number: &str) -> Result<Vec<MaintenanceRecord>, WorkflowError> {
        let truck = self.load_truck(plate_number).await?;
        Ok(self.store.list_maintenance(&truck.plate_number).await?)
    }
}
