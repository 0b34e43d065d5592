//! Modelo de Truck
//!
//! Este módulo contiene el struct Truck, su máquina de estados y los
//! datos para registrar camiones nuevos.
//! Mapea exactamente a la tabla trucks con primary key 'plate_number'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

/// Estado del camión - mapea al ENUM truck_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "truck_status")]
pub enum TruckStatus {
    Available,
    Deployed,
    Maintenance,
    Scheduled,
}

/// Eventos que mueven el estado de un camión
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TruckEvent {
    Deploy,
    Return,
    Cancel,
    ScheduleMaintenance,
    StartMaintenance,
    CompleteMaintenance,
    CancelSchedule,
}

/// Transición no listada en la máquina de estados
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Transition {event:?} is not allowed from status {from:?}")]
pub struct TransitionError {
    pub from: TruckStatus,
    pub event: TruckEvent,
}

impl TruckStatus {
    /// Aplicar un evento. Solo las transiciones listadas son válidas.
    pub fn apply(self, event: TruckEvent) -> Result<TruckStatus, TransitionError> {
        use TruckEvent::*;
        use TruckStatus::*;

        match (self, event) {
            (Available, Deploy) => Ok(Deployed),
            (Deployed, Return) | (Deployed, Cancel) => Ok(Available),
            (Available, ScheduleMaintenance) => Ok(Scheduled),
            (Available, StartMaintenance) | (Scheduled, StartMaintenance) => Ok(Maintenance),
            (Scheduled, CancelSchedule) => Ok(Available),
            (Maintenance, CompleteMaintenance) => Ok(Available),
            (
                Available | Deployed | Maintenance | Scheduled,
                Deploy | Return | Cancel | ScheduleMaintenance | StartMaintenance
                | CompleteMaintenance | CancelSchedule,
            ) => Err(TransitionError { from: self, event }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TruckStatus::Available => "Available",
            TruckStatus::Deployed => "Deployed",
            TruckStatus::Maintenance => "Maintenance",
            TruckStatus::Scheduled => "Scheduled",
        }
    }
}

/// Truck principal - mapea exactamente a la tabla trucks
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Truck {
    pub plate_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub truck_type: Option<String>,
    pub driver_id: Option<Uuid>,
    pub current_odometer: Decimal,
    pub last_oil_change_odometer: Decimal,
    pub next_oil_change_odometer: Decimal,
    pub oil_change_interval: Decimal,
    pub status: TruckStatus,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Truck {
    /// El camión ya pasó el kilometraje del próximo cambio de aceite
    pub fn is_oil_change_overdue(&self) -> bool {
        self.current_odometer > self.next_oil_change_odometer
    }

    /// Kilómetros restantes hasta el próximo cambio de aceite
    pub fn remaining_to_oil_change(&self) -> Decimal {
        self.next_oil_change_odometer - self.current_odometer
    }
}

/// Datos para insertar un camión nuevo
#[derive(Debug, Clone)]
pub struct NewTruck {
    pub plate_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub truck_type: Option<String>,
    pub driver_id: Option<Uuid>,
    pub current_odometer: Decimal,
    pub last_oil_change_odometer: Decimal,
    pub next_oil_change_odometer: Decimal,
    pub oil_change_interval: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Filtros para listar camiones
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TruckFilters {
    pub status: Option<TruckStatus>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Cambio de estado con compare-and-set sobre el estado anterior
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub plate_number: String,
    pub from: TruckStatus,
    pub to: TruckStatus,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [TruckStatus; 4] = [
        TruckStatus::Available,
        TruckStatus::Deployed,
        TruckStatus::Maintenance,
        TruckStatus::Scheduled,
    ];

    const ALL_EVENTS: [TruckEvent; 7] = [
        TruckEvent::Deploy,
        TruckEvent::Return,
        TruckEvent::Cancel,
        TruckEvent::ScheduleMaintenance,
        TruckEvent::StartMaintenance,
        TruckEvent::CompleteMaintenance,
        TruckEvent::CancelSchedule,
    ];

    #[test]
    fn test_listed_transitions() {
        use TruckEvent::*;
        use TruckStatus::*;

        assert_eq!(Available.apply(Deploy), Ok(Deployed));
        assert_eq!(Deployed.apply(Return), Ok(Available));
        assert_eq!(Deployed.apply(Cancel), Ok(Available));
        assert_eq!(Available.apply(ScheduleMaintenance), Ok(Scheduled));
        assert_eq!(Scheduled.apply(StartMaintenance), Ok(Maintenance));
        assert_eq!(Available.apply(StartMaintenance), Ok(Maintenance));
        assert_eq!(Scheduled.apply(CancelSchedule), Ok(Available));
        assert_eq!(Maintenance.apply(CompleteMaintenance), Ok(Available));
    }

    #[test]
    fn test_only_eight_transitions_are_legal() {
        let legal = ALL_STATUSES
            .iter()
            .flat_map(|s| ALL_EVENTS.iter().map(move |e| s.apply(*e)))
            .filter(Result::is_ok)
            .count();
        assert_eq!(legal, 8);
    }

    #[test]
    fn test_no_direct_path_between_maintenance_and_deployed() {
        assert!(TruckStatus::Maintenance.apply(TruckEvent::Deploy).is_err());
        assert!(TruckStatus::Scheduled.apply(TruckEvent::Deploy).is_err());
        assert!(TruckStatus::Deployed.apply(TruckEvent::StartMaintenance).is_err());

        let err = TruckStatus::Deployed.apply(TruckEvent::Deploy).unwrap_err();
        assert_eq!(err.from, TruckStatus::Deployed);
        assert_eq!(err.event, TruckEvent::Deploy);
    }
}
