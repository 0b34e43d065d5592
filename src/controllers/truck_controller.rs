use chrono::FixedOffset;
use uuid::Uuid;
use validator::Validate;

use crate::dto::truck_dto::{CreateTruckRequest, DeploymentResponse, TruckHistoryResponse};
use crate::dto::ApiResponse;
use crate::models::session::SessionContext;
use crate::models::truck::{Truck, TruckFilters};
use crate::middleware::require_admin;
use crate::services::FleetService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct TruckController {
    fleet: FleetService,
    civil_offset: FixedOffset,
}

impl TruckController {
    pub fn new(state: &AppState) -> Self {
        Self {
            fleet: state.fleet(),
            civil_offset: state.config.civil_offset,
        }
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateTruckRequest,
    ) -> Result<ApiResponse<Truck>, AppError> {
        request.validate()?;
        let truck = self.fleet.register_truck(session, request).await?;
        Ok(ApiResponse::success_with_message(
            truck,
            "Truck registered successfully".to_string(),
        ))
    }

    pub async fn list(&self, filters: TruckFilters) -> Result<ApiResponse<Vec<Truck>>, AppError> {
        Ok(ApiResponse::success(self.fleet.list_trucks(&filters).await?))
    }

    pub async fn get(&self, plate_number: &str) -> Result<ApiResponse<Truck>, AppError> {
        Ok(ApiResponse::success(self.fleet.get_truck(plate_number).await?))
    }

    pub async fn archive(&self, session: &SessionContext, plate_number: &str) -> Result<ApiResponse<Truck>, AppError> {
        require_admin(session, "archive trucks")?;
        let truck = self.fleet.archive_truck(session, plate_number).await?;
        Ok(ApiResponse::success_with_message(truck, "Truck archived".to_string()))
    }

    pub async fn assign_driver(
        &self,
        session: &SessionContext,
        plate_number: &str,
        driver_id: Uuid,
    ) -> Result<ApiResponse<Truck>, AppError> {
        let truck = self.fleet.assign_driver(session, plate_number, driver_id).await?;
        Ok(ApiResponse::success(truck))
    }

    pub async fn unassign_driver(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<ApiResponse<Truck>, AppError> {
        let truck = self.fleet.unassign_driver(session, plate_number).await?;
        Ok(ApiResponse::success(truck))
    }

    pub async fn history(&self, plate_number: &str) -> Result<ApiResponse<TruckHistoryResponse>, AppError> {
        let history = self.fleet.truck_history(plate_number).await?;
        let deployments = history
            .deployments
            .into_iter()
            .map(|d| DeploymentResponse::from_deployment(d, &self.civil_offset))
            .collect();

        Ok(ApiResponse::success(TruckHistoryResponse {
            plate_number: history.plate_number,
            total_distance: history.total_distance,
            deployments,
        }))
    }
}
