use serde::Deserialize;

// Filtros para listar notificaciones
#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilters {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

// Filtros para listar el audit log
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogFilters {
    pub limit: Option<i64>,
}
