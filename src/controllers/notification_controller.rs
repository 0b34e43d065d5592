use uuid::Uuid;

use crate::dto::notification_dto::{AuditLogFilters, NotificationFilters};
use crate::dto::ApiResponse;
use crate::models::audit::AuditLogEntry;
use crate::models::notification::NotificationView;
use crate::models::session::SessionContext;
use crate::services::{audit_service, NotificationService};
use crate::state::AppState;
use crate::utils::errors::AppError;

const DEFAULT_LIMIT: i64 = 50;

pub struct NotificationController {
    state: AppState,
    notifications: NotificationService,
}

impl NotificationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifications: state.notifications(),
            state: state.clone(),
        }
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filters: NotificationFilters,
    ) -> Result<ApiResponse<Vec<NotificationView>>, AppError> {
        let notifications = self
            .notifications
            .list_for_session(session, filters.unread_only, filters.limit.unwrap_or(DEFAULT_LIMIT))
            .await?;
        Ok(ApiResponse::success(notifications))
    }

    pub async fn mark_read(&self, session: &SessionContext, id: Uuid) -> Result<ApiResponse<Uuid>, AppError> {
        self.notifications.mark_read(session, id).await?;
        Ok(ApiResponse::success(id))
    }

    pub async fn audit_logs(
        &self,
        session: &SessionContext,
        filters: AuditLogFilters,
    ) -> Result<ApiResponse<Vec<AuditLogEntry>>, AppError> {
        let entries = audit_service::list_recent(
            self.state.store.as_ref(),
            session,
            filters.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;
        Ok(ApiResponse::success(entries))
    }
}
