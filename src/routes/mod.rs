pub mod driver_routes;
pub mod notification_routes;
pub mod truck_routes;

use axum::Router;

use crate::state::AppState;

/// Rutas de la API, montadas bajo `/api`
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/trucks", truck_routes::create_truck_router())
        .nest("/drivers", driver_routes::create_driver_router())
        .nest("/notifications", notification_routes::create_notification_router())
        .nest("/audit-logs", notification_routes::create_audit_router())
}
