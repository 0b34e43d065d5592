//! Repositorios
//!
//! Acceso a datos de la flota: el trait `FleetStore` y sus dos
//! implementaciones (PostgreSQL y memoria).

pub mod fleet_store;
pub mod memory_fleet_store;
pub mod pg_fleet_store;

pub use fleet_store::{FleetStore, StoreError, StoreResult};
pub use memory_fleet_store::MemoryFleetStore;
pub use pg_fleet_store::PgFleetStore;
