//! Services module
//!
//! Este módulo contiene la lógica de negocio de la flota. Los servicios
//! validan contra la máquina de estados y delegan la persistencia en
//! `FleetStore`.

pub mod audit_service;
pub mod fleet_service;
pub mod maintenance_service;
pub mod notification_service;
pub mod truck_lifecycle_service;

pub use audit_service::AuditTrail;
pub use fleet_service::FleetService;
pub use maintenance_service::MaintenanceService;
pub use notification_service::{BestEffort, NotificationService};
pub use truck_lifecycle_service::TruckLifecycleService;
