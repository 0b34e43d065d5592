//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::FleetStore;
use crate::services::{AuditTrail, FleetService, MaintenanceService, NotificationService, TruckLifecycleService};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn FleetStore>,
    pub audit: AuditTrail,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Crear el estado y lanzar el worker del audit log
    pub fn new(config: EnvironmentConfig, store: Arc<dyn FleetStore>, clock: Arc<dyn Clock>) -> (Self, JoinHandle<()>) {
        let (audit, audit_worker) = AuditTrail::spawn(store.clone(), config.audit_queue_capacity);
        let state = Self {
            config,
            store,
            audit,
            clock,
        };
        (state, audit_worker)
    }

    pub fn lifecycle(&self) -> TruckLifecycleService {
        TruckLifecycleService::new(
            self.store.clone(),
            self.audit.clone(),
            self.clock.clone(),
            self.config.civil_offset,
        )
    }

    pub fn fleet(&self) -> FleetService {
        FleetService::new(self.store.clone(), self.audit.clone(), self.clock.clone())
    }

    pub fn maintenance(&self) -> MaintenanceService {
        MaintenanceService::new(self.store.clone(), self.audit.clone(), self.clock.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone())
    }
}
