use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::notification_controller::NotificationController;
use crate::dto::notification_dto::{AuditLogFilters, NotificationFilters};
use crate::dto::ApiResponse;
use crate::models::audit::AuditLogEntry;
use crate::models::notification::NotificationView;
use crate::models::session::SessionContext;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
}

pub fn create_audit_router() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

async fn list_notifications(
    State(state): State<AppState>,
    session: SessionContext,
    Query(filters): Query<NotificationFilters>,
) -> Result<Json<ApiResponse<Vec<NotificationView>>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.list(&session, filters).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.mark_read(&session, id).await?))
}

async fn list_audit_logs(
    State(state): State<AppState>,
    session: SessionContext,
    Query(filters): Query<AuditLogFilters>,
) -> Result<Json<ApiResponse<Vec<AuditLogEntry>>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.audit_logs(&session, filters).await?))
}
