//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de la flota.

pub mod audit;
pub mod deployment;
pub mod driver;
pub mod maintenance;
pub mod notification;
pub mod session;
pub mod truck;
