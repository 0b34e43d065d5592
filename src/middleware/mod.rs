//! Middleware del sistema
//!
//! Este módulo contiene la autenticación por JWT y la configuración de CORS.

pub mod auth;
pub mod cors;

pub use auth::require_admin;
pub use cors::cors_layer;
