//! Modelo de Notification
//!
//! Avisos de cambio de aceite generados al devolver un camión, con
//! audiencia por rol o por usuario y estado de lectura por usuario.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::session::UserRole;

/// Severidad - mapea al ENUM notification_severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Error,
    Warning,
    Info,
}

/// Tipo de aviso - mapea al ENUM notification_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OilChangeOverdue,
    OilChangeDueSoon,
    OilChangeAdvisory,
}

/// Banda de cambio de aceite según los kilómetros restantes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OilChangeBand {
    Overdue,
    DueSoon,
    Advisory,
}

impl OilChangeBand {
    pub fn kind(&self) -> NotificationKind {
        match self {
            OilChangeBand::Overdue => NotificationKind::OilChangeOverdue,
            OilChangeBand::DueSoon => NotificationKind::OilChangeDueSoon,
            OilChangeBand::Advisory => NotificationKind::OilChangeAdvisory,
        }
    }

    pub fn severity(&self) -> NotificationSeverity {
        match self {
            OilChangeBand::Overdue => NotificationSeverity::Error,
            OilChangeBand::DueSoon => NotificationSeverity::Warning,
            OilChangeBand::Advisory => NotificationSeverity::Info,
        }
    }
}

/// Límite superior de la banda "due soon" (inclusive)
pub const DUE_SOON_THRESHOLD_KM: i64 = 100;
/// Límite superior de la banda de aviso (inclusive)
pub const ADVISORY_THRESHOLD_KM: i64 = 500;

/// Clasificar los kilómetros restantes. Como mucho una banda.
pub fn classify_oil_change(remaining: Decimal) -> Option<OilChangeBand> {
    if remaining < Decimal::ZERO {
        Some(OilChangeBand::Overdue)
    } else if remaining <= Decimal::from(DUE_SOON_THRESHOLD_KM) {
        Some(OilChangeBand::DueSoon)
    } else if remaining <= Decimal::from(ADVISORY_THRESHOLD_KM) {
        Some(OilChangeBand::Advisory)
    } else {
        None
    }
}

/// Notification - mapea exactamente a la tabla notifications
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub plate_number: String,
    pub kind: NotificationKind,
    pub severity: NotificationSeverity,
    pub message: String,
    pub audience_role: Option<UserRole>,
    pub recipient_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Notificación vista por un usuario concreto
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct NotificationView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub notification: Notification,
    pub is_read: bool,
}

/// Datos para insertar una notificación
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub plate_number: String,
    pub kind: NotificationKind,
    pub severity: NotificationSeverity,
    pub message: String,
    pub audience_role: Option<UserRole>,
    pub recipient_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Consulta de notificaciones para un usuario
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub user_id: Uuid,
    pub role: UserRole,
    pub unread_only: bool,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_remaining_is_overdue() {
        assert_eq!(classify_oil_change(Decimal::from(-1)), Some(OilChangeBand::Overdue));
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify_oil_change(Decimal::ZERO), Some(OilChangeBand::DueSoon));
        assert_eq!(classify_oil_change(Decimal::from(50)), Some(OilChangeBand::DueSoon));
        assert_eq!(classify_oil_change(Decimal::from(100)), Some(OilChangeBand::DueSoon));
        assert_eq!(classify_oil_change(Decimal::new(1001, 1)), Some(OilChangeBand::Advisory));
        assert_eq!(classify_oil_change(Decimal::from(500)), Some(OilChangeBand::Advisory));
        assert_eq!(classify_oil_change(Decimal::from(501)), None);
    }

    #[test]
    fn test_band_severity() {
        assert_eq!(OilChangeBand::Overdue.severity(), NotificationSeverity::Error);
        assert_eq!(OilChangeBand::DueSoon.severity(), NotificationSeverity::Warning);
        assert_eq!(OilChangeBand::Advisory.severity(), NotificationSeverity::Info);
    }
}
