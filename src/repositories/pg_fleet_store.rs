//! Implementación PostgreSQL del almacén de la flota
//!
//! Las operaciones compuestas usan una `sqlx::Transaction` y compare-and-set
//! en el `WHERE` para detectar cambios concurrentes.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::fleet_store::{FleetStore, StoreError, StoreResult};
use crate::models::{
    audit::{AuditLogEntry, NewAuditLog},
    deployment::{Deployment, DeploymentClosing, DeploymentStart, DeploymentVoid},
    driver::{Driver, NewDriver},
    maintenance::{MaintenanceRecord, MaintenanceUpdate, NewMaintenanceRecord, OilChangeReset},
    notification::{NewNotification, Notification, NotificationQuery, NotificationView},
    truck::{NewTruck, StatusChange, Truck, TruckFilters},
};

pub struct PgFleetStore {
    pool: PgPool,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Traducir violaciones de unicidad a `Conflict`
fn map_write_error(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!("{} already exists", what));
        }
    }
    StoreError::Database(e)
}

/// Cambio de estado con compare-and-set dentro de una conexión o transacción
async fn transition_on(
    conn: &mut PgConnection,
    change: &StatusChange,
    oil_change: Option<OilChangeReset>,
) -> StoreResult<Truck> {
    sqlx::query_as::<_, Truck>(
        r#"
        UPDATE trucks
        SET status = $3,
            updated_at = $4,
            last_oil_change_odometer = COALESCE($5, last_oil_change_odometer),
            next_oil_change_odometer = COALESCE($6, next_oil_change_odometer)
        WHERE plate_number = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(&change.plate_number)
    .bind(change.from)
    .bind(change.to)
    .bind(change.at)
    .bind(oil_change.map(|o| o.last_oil_change_odometer))
    .bind(oil_change.map(|o| o.next_oil_change_odometer))
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        StoreError::Conflict(format!(
            "Truck '{}' is no longer {}",
            change.plate_number,
            change.from.as_str()
        ))
    })
}

#[async_trait]
impl FleetStore for PgFleetStore {
    async fn find_truck(&self, plate_number: &str) -> StoreResult<Option<Truck>> {
        let truck = sqlx::query_as::<_, Truck>("SELECT * FROM trucks WHERE plate_number = $1")
            .bind(plate_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(truck)
    }

    async fn list_trucks(&self, filters: &TruckFilters) -> StoreResult<Vec<Truck>> {
        let trucks = sqlx::query_as::<_, Truck>(
            r#"
            SELECT * FROM trucks
            WHERE ($1::truck_status IS NULL OR status = $1)
              AND ($2 OR is_archived = FALSE)
            ORDER BY plate_number
            "#,
        )
        .bind(filters.status)
        .bind(filters.include_archived)
        .fetch_all(&self.pool)
        .await?;

        Ok(trucks)
    }

    async fn insert_truck(&self, truck: NewTruck) -> StoreResult<Truck> {
        let plate = truck.plate_number.clone();

        sqlx::query_as::<_, Truck>(
            r#"
            INSERT INTO trucks (
                plate_number, brand, model, truck_type, driver_id, current_odometer,
                last_oil_change_odometer, next_oil_change_odometer, oil_change_interval,
                status, is_archived, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Available', FALSE, $10, $10)
            RETURNING *
            "#,
        )
        .bind(truck.plate_number)
        .bind(truck.brand)
        .bind(truck.model)
        .bind(truck.truck_type)
        .bind(truck.driver_id)
        .bind(truck.current_odometer)
        .bind(truck.last_oil_change_odometer)
        .bind(truck.next_oil_change_odometer)
        .bind(truck.oil_change_interval)
        .bind(truck.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("Truck '{}'", plate)))
    }

    async fn archive_truck(&self, plate_number: &str) -> StoreResult<Truck> {
        sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET is_archived = TRUE, updated_at = NOW()
            WHERE plate_number = $1 AND status <> 'Deployed'
            RETURNING *
            "#,
        )
        .bind(plate_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Truck '{}' cannot be archived right now", plate_number)))
    }

    async fn set_truck_driver(&self, plate_number: &str, driver_id: Option<Uuid>) -> StoreResult<Truck> {
        sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET driver_id = $2, updated_at = NOW()
            WHERE plate_number = $1 AND status <> 'Deployed'
            RETURNING *
            "#,
        )
        .bind(plate_number)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Truck '{}' was deployed concurrently", plate_number)))
    }

    async fn transition_truck(&self, change: StatusChange) -> StoreResult<Truck> {
        let mut conn = self.pool.acquire().await?;
        transition_on(&mut *conn, &change, None).await
    }

    async fn insert_driver(&self, driver: NewDriver) -> StoreResult<Driver> {
        let license = driver.license_number.clone();

        sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (id, full_name, license_number, phone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(driver.full_name)
        .bind(driver.license_number)
        .bind(driver.phone)
        .bind(driver.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("Driver with license '{}'", license)))
    }

    async fn find_driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    async fn list_drivers(&self) -> StoreResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY full_name")
            .fetch_all(&self.pool)
            .await?;

        Ok(drivers)
    }

    async fn find_open_deployment(&self, plate_number: &str) -> StoreResult<Option<Deployment>> {
        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            SELECT * FROM deployments
            WHERE plate_number = $1 AND returned_at IS NULL
            ORDER BY deployed_at DESC
            LIMIT 1
            "#,
        )
        .bind(plate_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deployment)
    }

    async fn list_deployments(&self, plate_number: &str) -> StoreResult<Vec<Deployment>> {
        let deployments = sqlx::query_as::<_, Deployment>(
            "SELECT * FROM deployments WHERE plate_number = $1 ORDER BY deployed_at DESC",
        )
        .bind(plate_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(deployments)
    }

    async fn begin_deployment(&self, start: DeploymentStart) -> StoreResult<(Deployment, Truck)> {
        let mut tx = self.pool.begin().await?;

        // Revalidar dentro de la transacción lo que el flujo comprobó antes
        let truck = sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET status = 'Deployed', updated_at = $5
            WHERE plate_number = $1
              AND status = $2
              AND driver_id = $3
              AND current_odometer = $4
              AND is_archived = FALSE
            RETURNING *
            "#,
        )
        .bind(&start.plate_number)
        .bind(start.expected_status)
        .bind(start.driver_id)
        .bind(start.start_odometer)
        .bind(start.deployed_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Truck '{}' changed before deployment", start.plate_number)))?;

        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            INSERT INTO deployments (id, plate_number, driver_id, start_odometer, deployed_at, deployed_by, voided)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING *
            "#,
        )
        .bind(start.id)
        .bind(&start.plate_number)
        .bind(start.driver_id)
        .bind(start.start_odometer)
        .bind(start.deployed_at)
        .bind(start.deployed_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &format!("Open deployment for '{}'", start.plate_number)))?;

        tx.commit().await?;
        Ok((deployment, truck))
    }

    async fn complete_deployment(&self, closing: DeploymentClosing) -> StoreResult<(Deployment, Truck)> {
        let mut tx = self.pool.begin().await?;

        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            UPDATE deployments
            SET returned_at = $3, return_odometer = $4, travel_distance = $5
            WHERE id = $1 AND plate_number = $2 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(closing.deployment_id)
        .bind(&closing.plate_number)
        .bind(closing.returned_at)
        .bind(closing.return_odometer)
        .bind(closing.travel_distance)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Deployment {} was already closed", closing.deployment_id)))?;

        let truck = sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET status = 'Available', current_odometer = $2, updated_at = $3
            WHERE plate_number = $1 AND status = $5 AND status IN ('Deployed', 'Available')
              AND current_odometer = $4
            RETURNING *
            "#,
        )
        .bind(&closing.plate_number)
        .bind(closing.return_odometer)
        .bind(closing.returned_at)
        .bind(closing.expected_odometer)
        .bind(closing.expected_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Truck '{}' changed before return", closing.plate_number)))?;

        tx.commit().await?;
        Ok((deployment, truck))
    }

    async fn void_deployment(&self, voiding: DeploymentVoid) -> StoreResult<(Deployment, Truck)> {
        let mut tx = self.pool.begin().await?;

        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            UPDATE deployments
            SET returned_at = $3, travel_distance = 0, voided = TRUE
            WHERE id = $1 AND plate_number = $2 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(voiding.deployment_id)
        .bind(&voiding.plate_number)
        .bind(voiding.returned_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Deployment {} was already closed", voiding.deployment_id)))?;

        let truck = sqlx::query_as::<_, Truck>(
            r#"
            UPDATE trucks SET status = 'Available', updated_at = $2
            WHERE plate_number = $1 AND status IN ('Deployed', 'Available')
            RETURNING *
            "#,
        )
        .bind(&voiding.plate_number)
        .bind(voiding.returned_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Truck '{}' changed before cancellation", voiding.plate_number)))?;

        tx.commit().await?;
        Ok((deployment, truck))
    }

    async fn find_active_maintenance(&self, plate_number: &str) -> StoreResult<Option<MaintenanceRecord>> {
        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT * FROM maintenance_records
            WHERE plate_number = $1 AND status IN ('scheduled', 'in_progress')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(plate_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_maintenance(&self, plate_number: &str) -> StoreResult<Vec<MaintenanceRecord>> {
        let records = sqlx::query_as::<_, MaintenanceRecord>(
            "SELECT * FROM maintenance_records WHERE plate_number = $1 ORDER BY created_at DESC",
        )
        .bind(plate_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn open_maintenance(
        &self,
        record: NewMaintenanceRecord,
        change: StatusChange,
    ) -> StoreResult<(MaintenanceRecord, Truck)> {
        let mut tx = self.pool.begin().await?;

        let truck = transition_on(&mut *tx, &change, None).await?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO maintenance_records (
                id, plate_number, kind, status, scheduled_for, started_at, notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.plate_number)
        .bind(record.kind)
        .bind(record.status)
        .bind(record.scheduled_for)
        .bind(record.started_at)
        .bind(record.notes)
        .bind(record.created_by)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((record, truck))
    }

    async fn advance_maintenance(
        &self,
        update: MaintenanceUpdate,
        change: StatusChange,
        oil_change: Option<OilChangeReset>,
    ) -> StoreResult<(MaintenanceRecord, Truck)> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            UPDATE maintenance_records
            SET status = $2,
                started_at = COALESCE($3, started_at),
                completed_at = COALESCE($4, completed_at),
                odometer_at_service = COALESCE($5, odometer_at_service)
            WHERE id = $1 AND status IN ('scheduled', 'in_progress')
            RETURNING *
            "#,
        )
        .bind(update.id)
        .bind(update.status)
        .bind(update.started_at)
        .bind(update.completed_at)
        .bind(update.odometer_at_service)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Conflict(format!("Maintenance record {} is no longer active", update.id)))?;

        let truck = transition_on(&mut *tx, &change, oil_change).await?;

        tx.commit().await?;
        Ok((record, truck))
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                id, plate_number, kind, severity, message, audience_role, recipient_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.plate_number)
        .bind(notification.kind)
        .bind(notification.severity)
        .bind(notification.message)
        .bind(notification.audience_role)
        .bind(notification.recipient_id)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_notifications(&self, query: &NotificationQuery) -> StoreResult<Vec<NotificationView>> {
        let notifications = sqlx::query_as::<_, NotificationView>(
            r#"
            SELECT n.*, (r.user_id IS NOT NULL) AS is_read
            FROM notifications n
            LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $1
            WHERE (n.recipient_id = $1 OR n.audience_role = $2)
              AND ($3 = FALSE OR r.user_id IS NULL)
            ORDER BY n.created_at DESC
            LIMIT $4
            "#,
        )
        .bind(query.user_id)
        .bind(query.role)
        .bind(query.unread_only)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM notifications WHERE id = $1)")
            .bind(notification_id)
            .fetch_one(&self.pool)
            .await?;

        if !exists {
            return Err(StoreError::NotFound(format!("Notification {}", notification_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO notification_reads (notification_id, user_id, read_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_audit_log(&self, entry: NewAuditLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, actor_id, actor_name, action, table_name, record_key, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.actor_id)
        .bind(entry.actor_name)
        .bind(entry.action.as_str())
        .bind(entry.table_name)
        .bind(entry.record_key)
        .bind(entry.details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
