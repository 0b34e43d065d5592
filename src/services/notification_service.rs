//! Servicio de notificaciones
//!
//! Los avisos de aceite son un efecto secundario: su resultado se devuelve
//! como `BestEffort` para que el llamador lo pueda inspeccionar, pero un
//! fallo nunca se propaga por encima de la operación principal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    notification::{classify_oil_change, NewNotification, Notification, NotificationQuery, NotificationView, OilChangeBand},
    session::{SessionContext, UserRole},
    truck::Truck,
};
use crate::repositories::{FleetStore, StoreResult};

/// Resultado de un efecto secundario
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum BestEffort<T> {
    Recorded(T),
    Skipped,
    Failed(String),
}

impl<T> BestEffort<T> {
    pub fn recorded(&self) -> Option<&T> {
        match self {
            BestEffort::Recorded(value) => Some(value),
            _ => None,
        }
    }
}

/// Audiencia de los avisos de aceite
const OIL_CHANGE_AUDIENCE: UserRole = UserRole::Admin;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn FleetStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    /// Emitir como mucho un aviso según los kilómetros restantes
    pub async fn emit_oil_change(
        &self,
        truck: &Truck,
        remaining: Decimal,
        at: DateTime<Utc>,
    ) -> BestEffort<Notification> {
        let Some(band) = classify_oil_change(remaining) else {
            return BestEffort::Skipped;
        };

        let notification = NewNotification {
            plate_number: truck.plate_number.clone(),
            kind: band.kind(),
            severity: band.severity(),
            message: oil_change_message(&truck.plate_number, band, remaining),
            audience_role: Some(OIL_CHANGE_AUDIENCE),
            recipient_id: None,
            created_at: at,
        };

        match self.store.insert_notification(notification).await {
            Ok(notification) => {
                info!("🔔 Aviso {:?} emitido para {}", band, truck.plate_number);
                BestEffort::Recorded(notification)
            }
            Err(e) => {
                warn!("⚠️ No se pudo emitir aviso de aceite para {}: {}", truck.plate_number, e);
                BestEffort::Failed(e.to_string())
            }
        }
    }

    /// Notificaciones visibles para la sesión
    pub async fn list_for_session(
        &self,
        session: &SessionContext,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<NotificationView>> {
        let query = NotificationQuery {
            user_id: session.user_id,
            role: session.role,
            unread_only,
            limit: limit.clamp(1, 200),
        };
        self.store.list_notifications(&query).await
    }

    pub async fn mark_read(&self, session: &SessionContext, notification_id: Uuid) -> StoreResult<()> {
        self.store.mark_notification_read(notification_id, session.user_id).await
    }
}

fn oil_change_message(plate_number: &str, band: OilChangeBand, remaining: Decimal) -> String {
    match band {
        OilChangeBand::Overdue => format!(
            "Truck {} is overdue for an oil change by {} km",
            plate_number,
            remaining.abs()
        ),
        OilChangeBand::DueSoon => format!(
            "Truck {} is due for an oil change in {} km",
            plate_number, remaining
        ),
        OilChangeBand::Advisory => format!(
            "Truck {} will need an oil change in {} km",
            plate_number, remaining
        ),
    }
}
