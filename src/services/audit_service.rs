//! Audit log en segundo plano
//!
//! `AuditTrail::record` encola la entrada y vuelve enseguida. Un worker la
//! escribe en el almacén; si falla, se registra con `warn!` y se descarta.
//! Nunca bloquea ni hace fallar la operación principal.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{
    audit::{AuditLogEntry, NewAuditLog},
    session::SessionContext,
};
use crate::repositories::FleetStore;
use crate::utils::errors::{forbidden_error, AppError};

enum AuditCommand {
    Record(NewAuditLog),
    Flush(oneshot::Sender<()>),
}

/// Cola de auditoría best-effort
#[derive(Clone)]
pub struct AuditTrail {
    sender: mpsc::Sender<AuditCommand>,
}

impl AuditTrail {
    /// Lanzar el worker. El handle termina cuando se sueltan todos los `AuditTrail`.
    pub fn spawn(store: Arc<dyn FleetStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<AuditCommand>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                match command {
                    AuditCommand::Record(entry) => {
                        let action = entry.action;
                        let key = entry.record_key.clone();
                        match store.insert_audit_log(entry).await {
                            Ok(()) => debug!("📝 Audit {} registrado para {}", action.as_str(), key),
                            Err(e) => warn!("⚠️ No se pudo escribir audit {} para {}: {}", action.as_str(), key, e),
                        }
                    }
                    AuditCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            info!("📝 Worker de audit log terminado");
        });

        (Self { sender }, handle)
    }

    /// Encolar una entrada sin esperar
    pub fn record(&self, entry: NewAuditLog) {
        match self.sender.try_send(AuditCommand::Record(entry)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(AuditCommand::Record(entry))) => {
                warn!("⚠️ Cola de audit llena, se descarta {} para {}", entry.action.as_str(), entry.record_key);
            }
            Err(_) => warn!("⚠️ Cola de audit cerrada, entrada descartada"),
        }
    }

    /// Esperar a que se procesen todas las entradas encoladas antes de esta llamada
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(AuditCommand::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

/// Listar las últimas entradas (solo administradores)
pub async fn list_recent(
    store: &dyn FleetStore,
    session: &SessionContext,
    limit: i64,
) -> Result<Vec<AuditLogEntry>, AppError> {
    if !session.is_admin() {
        return Err(forbidden_error("read audit logs", "administrator role required"));
    }

    Ok(store.list_audit_logs(limit.clamp(1, 500)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{audit::AuditAction, session::UserRole};
    use crate::repositories::MemoryFleetStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn admin() -> SessionContext {
        SessionContext {
            user_id: Uuid::new_v4(),
            display_name: "Fleet Admin".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_recorded_entries_are_written_after_flush() {
        let store = Arc::new(MemoryFleetStore::new());
        let (audit, _handle) = AuditTrail::spawn(store.clone(), 16);
        let session = admin();

        audit.record(NewAuditLog::new(&session, AuditAction::TruckDeployed, "trucks", "ABC-1234", Utc::now()));
        audit.record(NewAuditLog::new(&session, AuditAction::TruckReturned, "trucks", "ABC-1234", Utc::now()));
        audit.flush().await;

        let entries = list_recent(store.as_ref(), &session, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.actor_name == "Fleet Admin"));
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let store = Arc::new(MemoryFleetStore::new());
        store.fail_audit_logs(true);
        let (audit, _handle) = AuditTrail::spawn(store.clone(), 16);
        let session = admin();

        audit.record(NewAuditLog::new(&session, AuditAction::TruckArchived, "trucks", "XYZ-9", Utc::now()));
        audit.flush().await;

        assert!(list_recent(store.as_ref(), &session, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_list() {
        let store = MemoryFleetStore::new();
        let mut session = admin();
        session.role = UserRole::Staff;
        assert!(matches!(list_recent(&store, &session, 10).await, Err(AppError::Forbidden(_))));
    }
}
