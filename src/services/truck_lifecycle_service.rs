//! Ciclo de vida de los camiones: deploy, return y cancelación
//!
//! Cada operación valida sus precondiciones sobre la fila leída, pasa el
//! evento por la máquina de estados de `TruckStatus` y escribe con una sola
//! operación atómica del almacén. El audit log y los avisos de aceite son
//! efectos secundarios que nunca hacen fallar la operación.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    audit::{AuditAction, NewAuditLog},
    deployment::{Deployment, DeploymentClosing, DeploymentStart, DeploymentVoid},
    notification::Notification,
    session::SessionContext,
    truck::{StatusChange, TransitionError, Truck, TruckEvent, TruckStatus},
};
use crate::repositories::FleetStore;
use crate::services::audit_service::AuditTrail;
use crate::services::notification_service::{BestEffort, NotificationService};
use crate::utils::clock::Clock;
use crate::utils::errors::WorkflowError;
use crate::utils::validation::{fits_odometer_column, normalize_plate};

/// Resultado de un deploy
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub deployment: Deployment,
    pub truck: Truck,
}

/// Resultado de una devolución
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReturnReport {
    /// Deployment cerrado con distancia recorrida
    Completed {
        deployment: Deployment,
        truck: Truck,
        remaining_to_oil_change: Decimal,
        notification: BestEffort<Notification>,
    },
    /// No había deployment abierto: el camión queda Available sin registrar distancia
    Reconciled { truck: Truck },
}

/// Resultado de una cancelación
#[derive(Debug, Clone, Serialize)]
pub struct CancelReport {
    pub truck: Truck,
    pub voided: Option<Deployment>,
}

/// Precondiciones de deploy, en orden. Devuelve el conductor asignado.
pub fn check_deploy_preconditions(truck: &Truck) -> Result<Uuid, WorkflowError> {
    let driver_id = truck
        .driver_id
        .ok_or_else(|| WorkflowError::NoDriverAssigned(truck.plate_number.clone()))?;

    match truck.status {
        TruckStatus::Maintenance => return Err(WorkflowError::TruckInMaintenance(truck.plate_number.clone())),
        TruckStatus::Scheduled => return Err(WorkflowError::TruckScheduled(truck.plate_number.clone())),
        TruckStatus::Available | TruckStatus::Deployed => {}
    }

    if truck.is_oil_change_overdue() {
        return Err(WorkflowError::OilChangeOverdue {
            plate_number: truck.plate_number.clone(),
            current_odometer: truck.current_odometer,
            next_oil_change_odometer: truck.next_oil_change_odometer,
        });
    }

    truck.status.apply(TruckEvent::Deploy)?;
    Ok(driver_id)
}

/// El odómetro es positivo, cabe en la columna y nunca retrocede
pub fn check_return_odometer(truck: &Truck, reading: Decimal) -> Result<(), WorkflowError> {
    if reading <= Decimal::ZERO || !fits_odometer_column(&reading) {
        return Err(WorkflowError::InvalidOdometer(reading));
    }
    if reading < truck.current_odometer {
        return Err(WorkflowError::OdometerRollback {
            current: truck.current_odometer,
            reading,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct TruckLifecycleService {
    store: Arc<dyn FleetStore>,
    audit: AuditTrail,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
    civil_offset: FixedOffset,
}

impl TruckLifecycleService {
    pub fn new(
        store: Arc<dyn FleetStore>,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
        civil_offset: FixedOffset,
    ) -> Self {
        Self {
            notifications: NotificationService::new(store.clone()),
            store,
            audit,
            clock,
            civil_offset,
        }
    }

    /// Hora actual en la zona civil de la flota
    fn civil_now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.civil_offset)
    }

    async fn load_truck(&self, plate_number: &str) -> Result<Truck, WorkflowError> {
        self.store
            .find_truck(plate_number)
            .await?
            .filter(|truck| !truck.is_archived)
            .ok_or_else(|| WorkflowError::TruckNotFound(plate_number.to_string()))
    }

    /// Desplegar el camión con su conductor asignado
    pub async fn deploy(&self, session: &SessionContext, plate_number: &str) -> Result<DeployReport, WorkflowError> {
        let plate_number = normalize_plate(plate_number);
        let truck = self.load_truck(&plate_number).await?;
        let driver_id = check_deploy_preconditions(&truck)?;

        let deployed_at = self.civil_now();
        let start = DeploymentStart {
            id: Uuid::new_v4(),
            plate_number: plate_number.clone(),
            driver_id,
            start_odometer: truck.current_odometer,
            deployed_at: deployed_at.with_timezone(&Utc),
            deployed_by: session.user_id,
            expected_status: truck.status,
        };

        let (deployment, truck) = self.store.begin_deployment(start).await?;
        info!(
            "🚚 Camión {} desplegado con conductor {} ({})",
            plate_number, driver_id, deployed_at
        );

        self.audit.record(
            NewAuditLog::new(session, AuditAction::TruckDeployed, "deployments", deployment.id.to_string(), deployment.deployed_at)
                .with_details(json!({
                    "plate_number": plate_number,
                    "driver_id": driver_id,
                    "start_odometer": deployment.start_odometer,
                })),
        );

        Ok(DeployReport { deployment, truck })
    }

    /// Devolver el camión con una lectura nueva del odómetro
    pub async fn return_truck(
        &self,
        session: &SessionContext,
        plate_number: &str,
        odometer: Decimal,
    ) -> Result<ReturnReport, WorkflowError> {
        let plate_number = normalize_plate(plate_number);
        let truck = self.load_truck(&plate_number).await?;
        check_return_odometer(&truck, odometer)?;

        let returned_at = self.clock.now();
        let Some(open) = self.store.find_open_deployment(&plate_number).await? else {
            return self.reconcile(session, truck, returned_at).await;
        };

        // Available con deployment abierto es el mismo dato inconsistente que
        // recupera la cancelación; aquí se cierra conservando la distancia
        if truck.status != TruckStatus::Available {
            truck.status.apply(TruckEvent::Return)?;
        }
        let travel_distance = odometer - truck.current_odometer;

        let closing = DeploymentClosing {
            deployment_id: open.id,
            plate_number: plate_number.clone(),
            returned_at,
            return_odometer: odometer,
            travel_distance,
            expected_status: truck.status,
            expected_odometer: truck.current_odometer,
        };
        let (deployment, truck) = self.store.complete_deployment(closing).await?;
        info!("🏁 Camión {} devuelto: {} km recorridos", plate_number, travel_distance);

        let remaining = truck.remaining_to_oil_change();
        let notification = self.notifications.emit_oil_change(&truck, remaining, returned_at).await;

        self.audit.record(
            NewAuditLog::new(session, AuditAction::TruckReturned, "deployments", deployment.id.to_string(), returned_at)
                .with_details(json!({
                    "plate_number": plate_number,
                    "return_odometer": odometer,
                    "travel_distance": travel_distance,
                })),
        );

        Ok(ReturnReport::Completed {
            deployment,
            truck,
            remaining_to_oil_change: remaining,
            notification,
        })
    }

    /// Sin deployment abierto: dejar el camión en Available sin distancia
    async fn reconcile(
        &self,
        session: &SessionContext,
        truck: Truck,
        at: DateTime<Utc>,
    ) -> Result<ReturnReport, WorkflowError> {
        match truck.status {
            TruckStatus::Deployed => {}
            TruckStatus::Available => return Ok(ReturnReport::Reconciled { truck }),
            from @ (TruckStatus::Maintenance | TruckStatus::Scheduled) => {
                return Err(TransitionError { from, event: TruckEvent::Return }.into());
            }
        }
        warn!("⚠️ Camión {} sin deployment abierto, se reconcilia el estado", truck.plate_number);

        let truck = self
            .store
            .transition_truck(StatusChange {
                plate_number: truck.plate_number.clone(),
                from: TruckStatus::Deployed,
                to: TruckStatus::Available,
                at,
            })
            .await?;

        self.audit.record(NewAuditLog::new(
            session,
            AuditAction::DeploymentReconciled,
            "trucks",
            truck.plate_number.clone(),
            at,
        ));

        Ok(ReturnReport::Reconciled { truck })
    }

    /// Anular el deployment abierto; el odómetro no cambia
    pub async fn cancel_deployment(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<CancelReport, WorkflowError> {
        let plate_number = normalize_plate(plate_number);
        let truck = self.load_truck(&plate_number).await?;

        // Available con deployment abierto es un dato inconsistente y también se anula
        if truck.status != TruckStatus::Available {
            truck.status.apply(TruckEvent::Cancel)?;
        }

        let at = self.clock.now();
        match self.store.find_open_deployment(&plate_number).await? {
            Some(open) => {
                let (deployment, truck) = self
                    .store
                    .void_deployment(DeploymentVoid {
                        deployment_id: open.id,
                        plate_number: plate_number.clone(),
                        returned_at: at,
                    })
                    .await?;
                info!("↩️ Deployment {} de {} anulado", deployment.id, plate_number);

                self.audit.record(NewAuditLog::new(
                    session,
                    AuditAction::DeploymentCancelled,
                    "deployments",
                    deployment.id.to_string(),
                    at,
                ));

                Ok(CancelReport {
                    truck,
                    voided: Some(deployment),
                })
            }
            None if truck.status == TruckStatus::Deployed => match self.reconcile(session, truck, at).await? {
                ReturnReport::Reconciled { truck } | ReturnReport::Completed { truck, .. } => {
                    Ok(CancelReport { truck, voided: None })
                }
            },
            None => Ok(CancelReport { truck, voided: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::NewDriver;
    use crate::models::notification::NotificationSeverity;
    use crate::models::session::UserRole;
    use crate::models::truck::NewTruck;
    use crate::repositories::MemoryFleetStore;
    use crate::utils::clock::FixedClock;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        store: Arc<MemoryFleetStore>,
        clock: Arc<FixedClock>,
        audit: AuditTrail,
        service: TruckLifecycleService,
        session: SessionContext,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryFleetStore::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        let (audit, _handle) = AuditTrail::spawn(store.clone(), 64);
        let service = TruckLifecycleService::new(
            store.clone(),
            audit.clone(),
            clock.clone(),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        );
        let session = SessionContext {
            user_id: Uuid::new_v4(),
            display_name: "Dispatcher".to_string(),
            role: UserRole::Staff,
        };
        Fixture { store, clock, audit, service, session }
    }

    /// Camión Available con conductor; odómetro y próximo cambio de aceite dados
    async fn seed_truck(store: &MemoryFleetStore, plate: &str, odometer: i64, next_oil: i64) -> Truck {
        let driver = store
            .insert_driver(NewDriver {
                full_name: format!("Driver {}", plate),
                license_number: format!("LIC-{}", plate),
                phone: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        store
            .insert_truck(NewTruck {
                plate_number: plate.to_string(),
                brand: Some("Isuzu".to_string()),
                model: Some("Forward".to_string()),
                truck_type: Some("Wing Van".to_string()),
                driver_id: Some(driver.id),
                current_odometer: Decimal::from(odometer),
                last_oil_change_odometer: Decimal::from(next_oil - 5000).min(Decimal::from(odometer)),
                next_oil_change_odometer: Decimal::from(next_oil),
                oil_change_interval: Decimal::from(5000),
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    async fn truck(store: &MemoryFleetStore, plate: &str) -> Truck {
        store.find_truck(plate).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_deploy_marks_truck_deployed_in_civil_time() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;

        let report = f.service.deploy(&f.session, "abc-1234").await.unwrap();

        assert_eq!(report.truck.status, TruckStatus::Deployed);
        assert!(report.deployment.is_open());
        assert_eq!(report.deployment.start_odometer, Decimal::from(1000));
        assert_eq!(report.deployment.deployed_at, f.clock.now());
    }

    #[tokio::test]
    async fn test_deploy_requires_driver() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        t.driver_id = None;
        f.store.overwrite_truck(t).await;

        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoDriverAssigned(_)));
        assert_eq!(truck(&f.store, "ABC-1234").await.status, TruckStatus::Available);
    }

    #[tokio::test]
    async fn test_deploy_rejected_in_maintenance_and_scheduled() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 1000, 6000).await;

        t.status = TruckStatus::Maintenance;
        f.store.overwrite_truck(t.clone()).await;
        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::TruckInMaintenance(_)));

        t.status = TruckStatus::Scheduled;
        f.store.overwrite_truck(t).await;
        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::TruckScheduled(_)));

        assert!(f.store.list_deployments("ABC-1234").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_rejected_when_oil_change_overdue() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 12000, 11000).await;

        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::OilChangeOverdue { .. }));
        assert_eq!(err.code(), "OIL_CHANGE_OVERDUE");
    }

    #[tokio::test]
    async fn test_deploy_checks_driver_before_status() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 12000, 11000).await;
        t.driver_id = None;
        t.status = TruckStatus::Maintenance;
        f.store.overwrite_truck(t).await;

        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoDriverAssigned(_)));
    }

    #[tokio::test]
    async fn test_deploy_twice_is_an_invalid_transition() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let err = f.service.deploy(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition(_)));
        assert_eq!(f.store.list_deployments("ABC-1234").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_truck_is_not_found() {
        let f = fixture().await;
        let err = f.service.deploy(&f.session, "NOPE-1").await.unwrap_err();
        assert!(matches!(err, WorkflowError::TruckNotFound(_)));
    }

    #[tokio::test]
    async fn test_return_rejects_rollback_and_non_positive() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let err = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(999)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::OdometerRollback { .. }));

        let err = f.service.return_truck(&f.session, "ABC-1234", Decimal::ZERO).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidOdometer(_)));

        let t = truck(&f.store, "ABC-1234").await;
        assert_eq!(t.status, TruckStatus::Deployed);
        assert_eq!(t.current_odometer, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_return_rejects_reading_the_column_cannot_hold() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let err = f.service.return_truck(&f.session, "ABC-1234", Decimal::new(100025, 2)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidOdometer(_)));
        assert_eq!(err.code(), "INVALID_ODOMETER");

        let err = f
            .service
            .return_truck(&f.session, "ABC-1234", Decimal::from(100_000_000_000i64))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidOdometer(_)));

        let t = truck(&f.store, "ABC-1234").await;
        assert_eq!(t.status, TruckStatus::Deployed);
        assert_eq!(t.current_odometer, Decimal::from(1000));

        // Un decimal sí se acepta
        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::new(10255, 1)).await.unwrap();
        let ReturnReport::Completed { deployment, .. } = report else {
            panic!("expected completed return");
        };
        assert_eq!(deployment.travel_distance, Some(Decimal::new(255, 1)));
    }

    #[tokio::test]
    async fn test_return_closes_open_deployment_left_on_available_truck() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        let mut t = truck(&f.store, "ABC-1234").await;
        t.status = TruckStatus::Available;
        f.store.overwrite_truck(t).await;

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1300)).await.unwrap();
        let ReturnReport::Completed { deployment, truck: returned, .. } = report else {
            panic!("expected completed return");
        };
        assert_eq!(deployment.travel_distance, Some(Decimal::from(300)));
        assert_eq!(returned.status, TruckStatus::Available);
        assert_eq!(returned.current_odometer, Decimal::from(1300));
        assert!(f.store.find_open_deployment("ABC-1234").await.unwrap().is_none());

        // Ya no queda nada abierto que bloquee el siguiente deploy
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
    }

    #[tokio::test]
    async fn test_return_without_deployment_rejected_for_maintenance_and_scheduled() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 1000, 6000).await;

        for status in [TruckStatus::Maintenance, TruckStatus::Scheduled] {
            t.status = status;
            f.store.overwrite_truck(t.clone()).await;

            let err = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1000)).await.unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition(_)));
            assert_eq!(truck(&f.store, "ABC-1234").await.status, status);
        }
    }

    #[tokio::test]
    async fn test_zero_distance_return_has_no_notification() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1000)).await.unwrap();
        match report {
            ReturnReport::Completed { deployment, truck, notification, .. } => {
                assert_eq!(deployment.travel_distance, Some(Decimal::ZERO));
                assert_eq!(truck.status, TruckStatus::Available);
                assert_eq!(notification, BestEffort::Skipped);
            }
            other => panic!("unexpected report: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_return_near_oil_change_emits_single_due_soon() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 9000, 10000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(9950)).await.unwrap();
        let ReturnReport::Completed { remaining_to_oil_change, notification, deployment, .. } = report else {
            panic!("expected completed return");
        };
        assert_eq!(remaining_to_oil_change, Decimal::from(50));
        assert_eq!(deployment.travel_distance, Some(Decimal::from(950)));
        assert_eq!(notification.recorded().unwrap().severity, NotificationSeverity::Warning);

        let admin = SessionContext {
            role: UserRole::Admin,
            ..f.session.clone()
        };
        let all = f
            .store
            .list_notifications(&crate::models::notification::NotificationQuery {
                user_id: admin.user_id,
                role: admin.role,
                unread_only: false,
                limit: 50,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_return_past_threshold_is_overdue_error() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 9000, 10000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(10200)).await.unwrap();
        let ReturnReport::Completed { notification, .. } = report else {
            panic!("expected completed return");
        };
        assert_eq!(notification.recorded().unwrap().severity, NotificationSeverity::Error);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_return() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 9000, 10000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        f.store.fail_notifications(true);

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(9700)).await.unwrap();
        let ReturnReport::Completed { notification, truck, .. } = report else {
            panic!("expected completed return");
        };
        assert!(matches!(notification, BestEffort::Failed(_)));
        assert_eq!(truck.current_odometer, Decimal::from(9700));
    }

    #[tokio::test]
    async fn test_second_return_reconciles_without_double_distance() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1500)).await.unwrap();
        let second = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1500)).await.unwrap();

        assert!(matches!(second, ReturnReport::Reconciled { ref truck } if truck.status == TruckStatus::Available));
        let deployments = f.store.list_deployments("ABC-1234").await.unwrap();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].travel_distance, Some(Decimal::from(500)));
    }

    #[tokio::test]
    async fn test_deployed_truck_without_open_deployment_is_reset() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        t.status = TruckStatus::Deployed;
        f.store.overwrite_truck(t).await;

        let report = f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1200)).await.unwrap();
        let ReturnReport::Reconciled { truck } = report else {
            panic!("expected reconciliation");
        };
        assert_eq!(truck.status, TruckStatus::Available);
        // La reconciliación no registra distancia ni mueve el odómetro
        assert_eq!(truck.current_odometer, Decimal::from(1000));

        f.audit.flush().await;
        let logs = f.store.list_audit_logs(10).await.unwrap();
        assert_eq!(logs[0].action, "deployment_reconciled");
    }

    #[tokio::test]
    async fn test_two_cycles_sum_to_total_distance() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 20000).await;

        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        f.clock.advance(Duration::hours(5));
        f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1800)).await.unwrap();
        f.clock.advance(Duration::hours(1));
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        f.clock.advance(Duration::hours(5));
        f.service.return_truck(&f.session, "ABC-1234", Decimal::from(2450)).await.unwrap();

        let deployments = f.store.list_deployments("ABC-1234").await.unwrap();
        assert_eq!(deployments.len(), 2);
        assert!(deployments.iter().all(|d| !d.is_open()));
        let total: Decimal = deployments.iter().filter_map(|d| d.travel_distance).sum();
        assert_eq!(total, Decimal::from(2450 - 1000));
    }

    #[tokio::test]
    async fn test_cancel_voids_deployment_and_keeps_odometer() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();

        let report = f.service.cancel_deployment(&f.session, "ABC-1234").await.unwrap();
        let voided = report.voided.unwrap();
        assert!(voided.voided);
        assert_eq!(voided.travel_distance, Some(Decimal::ZERO));
        assert_eq!(voided.return_odometer, None);
        assert_eq!(report.truck.status, TruckStatus::Available);
        assert_eq!(report.truck.current_odometer, Decimal::from(1000));

        // Se puede volver a desplegar
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_on_available_truck_is_a_no_op() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;

        let report = f.service.cancel_deployment(&f.session, "ABC-1234").await.unwrap();
        assert!(report.voided.is_none());
        assert_eq!(report.truck.status, TruckStatus::Available);
        assert_eq!(report.truck.current_odometer, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_cancel_rejected_for_maintenance() {
        let f = fixture().await;
        let mut t = seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        t.status = TruckStatus::Maintenance;
        f.store.overwrite_truck(t).await;

        let err = f.service.cancel_deployment(&f.session, "ABC-1234").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_audit_entries_follow_each_action() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        f.clock.advance(Duration::minutes(30));
        f.service.return_truck(&f.session, "ABC-1234", Decimal::from(1100)).await.unwrap();
        f.audit.flush().await;

        let logs = f.store.list_audit_logs(10).await.unwrap();
        let actions: Vec<&str> = logs.iter().map(|l| l.action.as_str()).collect();
        assert_eq!(actions, vec!["truck_returned", "truck_deployed"]);
        assert!(logs.iter().all(|l| l.actor_id == f.session.user_id));
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_block_deploy() {
        let f = fixture().await;
        seed_truck(&f.store, "ABC-1234", 1000, 6000).await;
        f.store.fail_audit_logs(true);

        let report = f.service.deploy(&f.session, "ABC-1234").await.unwrap();
        f.audit.flush().await;

        assert_eq!(report.truck.status, TruckStatus::Deployed);
        assert!(f.store.list_audit_logs(10).await.unwrap().is_empty());
    }
}
