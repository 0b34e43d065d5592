//! Registro de camiones y conductores

use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::driver_dto::CreateDriverRequest;
use crate::dto::truck_dto::CreateTruckRequest;
use crate::models::{
    audit::{AuditAction, NewAuditLog},
    deployment::Deployment,
    driver::{Driver, NewDriver},
    session::SessionContext,
    truck::{NewTruck, Truck, TruckFilters, TruckStatus},
};
use crate::repositories::{FleetStore, StoreError};
use crate::services::audit_service::AuditTrail;
use crate::utils::clock::Clock;
use crate::utils::errors::WorkflowError;
use crate::utils::validation::{fits_odometer_column, normalize_plate};

/// Historial de un camión con la suma de distancias registradas
#[derive(Debug, Clone)]
pub struct TruckHistory {
    pub plate_number: String,
    pub total_distance: Decimal,
    pub deployments: Vec<Deployment>,
}

#[derive(Clone)]
pub struct FleetService {
    store: Arc<dyn FleetStore>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl FleetService {
    pub fn new(store: Arc<dyn FleetStore>, audit: AuditTrail, clock: Arc<dyn Clock>) -> Self {
        Self { store, audit, clock }
    }

    /// Registrar un camión nuevo en estado Available
    pub async fn register_truck(
        &self,
        session: &SessionContext,
        request: CreateTruckRequest,
    ) -> Result<Truck, WorkflowError> {
        let plate_number = normalize_plate(&request.plate_number);
        let current_odometer = request.current_odometer.unwrap_or(Decimal::ZERO);
        let last_oil_change_odometer = request.last_oil_change_odometer.unwrap_or(current_odometer);
        let next_oil_change_odometer = request
            .next_oil_change_odometer
            .unwrap_or(last_oil_change_odometer + request.oil_change_interval);

        if request.oil_change_interval <= Decimal::ZERO {
            return Err(WorkflowError::InvalidRequest("oil change interval must be positive".to_string()));
        }
        if !fits_odometer_column(&next_oil_change_odometer) {
            return Err(WorkflowError::InvalidRequest(format!(
                "next oil change ({}) is out of range",
                next_oil_change_odometer
            )));
        }
        if next_oil_change_odometer < last_oil_change_odometer {
            return Err(WorkflowError::InvalidRequest(format!(
                "next oil change ({}) is before the last one ({})",
                next_oil_change_odometer, last_oil_change_odometer
            )));
        }

        if let Some(driver_id) = request.driver_id {
            self.load_driver(driver_id).await?;
        }

        let now = self.clock.now();
        let truck = self
            .store
            .insert_truck(NewTruck {
                plate_number: plate_number.clone(),
                brand: request.brand,
                model: request.model,
                truck_type: request.truck_type,
                driver_id: request.driver_id,
                current_odometer,
                last_oil_change_odometer,
                next_oil_change_odometer,
                oil_change_interval: request.oil_change_interval,
                created_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => WorkflowError::DuplicatePlate(plate_number.clone()),
                other => other.into(),
            })?;

        info!("✅ Camión {} registrado", truck.plate_number);
        self.audit.record(
            NewAuditLog::new(session, AuditAction::TruckRegistered, "trucks", truck.plate_number.clone(), now)
                .with_details(json!({
                    "current_odometer": truck.current_odometer,
                    "next_oil_change_odometer": truck.next_oil_change_odometer,
                })),
        );

        Ok(truck)
    }

    pub async fn list_trucks(&self, filters: &TruckFilters) -> Result<Vec<Truck>, WorkflowError> {
        Ok(self.store.list_trucks(filters).await?)
    }

    pub async fn get_truck(&self, plate_number: &str) -> Result<Truck, WorkflowError> {
        let plate_number = normalize_plate(plate_number);
        self.store
            .find_truck(&plate_number)
            .await?
            .ok_or(WorkflowError::TruckNotFound(plate_number))
    }

    /// Archivar un camión que no esté desplegado
    pub async fn archive_truck(&self, session: &SessionContext, plate_number: &str) -> Result<Truck, WorkflowError> {
        let truck = self.get_truck(plate_number).await?;
        if truck.status == TruckStatus::Deployed {
            return Err(WorkflowError::TruckDeployed(truck.plate_number));
        }

        let truck = self.store.archive_truck(&truck.plate_number).await?;
        info!("🗄️ Camión {} archivado", truck.plate_number);
        self.audit.record(NewAuditLog::new(
            session,
            AuditAction::TruckArchived,
            "trucks",
            truck.plate_number.clone(),
            self.clock.now(),
        ));
        Ok(truck)
    }

    pub async fn assign_driver(
        &self,
        session: &SessionContext,
        plate_number: &str,
        driver_id: Uuid,
    ) -> Result<Truck, WorkflowError> {
        let truck = self.get_truck(plate_number).await?;
        if truck.status == TruckStatus::Deployed {
            return Err(WorkflowError::TruckDeployed(truck.plate_number));
        }
        self.load_driver(driver_id).await?;

        let truck = self.store.set_truck_driver(&truck.plate_number, Some(driver_id)).await?;
        info!("👤 Conductor {} asignado a {}", driver_id, truck.plate_number);
        self.audit.record(
            NewAuditLog::new(session, AuditAction::DriverAssigned, "trucks", truck.plate_number.clone(), self.clock.now())
                .with_details(json!({ "driver_id": driver_id })),
        );
        Ok(truck)
    }

    pub async fn unassign_driver(&self, session: &SessionContext, plate_number: &str) -> Result<Truck, WorkflowError> {
        let truck = self.get_truck(plate_number).await?;
        if truck.status == TruckStatus::Deployed {
            return Err(WorkflowError::TruckDeployed(truck.plate_number));
        }

        let previous = truck.driver_id;
        let truck = self.store.set_truck_driver(&truck.plate_number, None).await?;
        self.audit.record(
            NewAuditLog::new(session, AuditAction::DriverUnassigned, "trucks", truck.plate_number.clone(), self.clock.now())
                .with_details(json!({ "driver_id": previous })),
        );
        Ok(truck)
    }

    pub async fn register_driver(
        &self,
        session: &SessionContext,
        request: CreateDriverRequest,
    ) -> Result<Driver, WorkflowError> {
        let license_number = request.license_number.trim().to_uppercase();
        let now = self.clock.now();

        let driver = self
            .store
            .insert_driver(NewDriver {
                full_name: request.full_name.trim().to_string(),
                license_number: license_number.clone(),
                phone: request.phone,
                created_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => WorkflowError::DuplicateLicense(license_number.clone()),
                other => other.into(),
            })?;

        info!("✅ Conductor {} registrado", driver.full_name);
        self.audit.record(NewAuditLog::new(
            session,
            AuditAction::DriverRegistered,
            "drivers",
            driver.id.to_string(),
            now,
        ));
        Ok(driver)
    }

    pub async fn list_drivers(&self) -> Result<Vec<Driver>, WorkflowError> {
        Ok(self.store.list_drivers().await?)
    }

    /// Deployments del camión, el más reciente primero
    pub async fn truck_history(&self, plate_number: &str) -> Result<TruckHistory, WorkflowError> {
        let truck = self.get_truck(plate_number).await?;
        let deployments = self.store.list_deployments(&truck.plate_number).await?;
        let total_distance = deployments.iter().filter_map(|d| d.travel_distance).sum();

        Ok(TruckHistory {
            plate_number: truck.plate_number,
            total_distance,
            deployments,
        })
    }

    async fn load_driver(&self, driver_id: Uuid) -> Result<Driver, WorkflowError> {
        self.store
            .find_driver(driver_id)
            .await?
            .ok_or(WorkflowError::DriverNotFound(driver_id))
    }
}
