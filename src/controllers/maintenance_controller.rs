use validator::Validate;

use crate::dto::maintenance_dto::{MaintenanceResponse, ScheduleMaintenanceRequest, StartMaintenanceRequest};
use crate::dto::ApiResponse;
use crate::models::maintenance::MaintenanceRecord;
use crate::models::session::SessionContext;
use crate::services::MaintenanceService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct MaintenanceController {
    maintenance: MaintenanceService,
}

impl MaintenanceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            maintenance: state.maintenance(),
        }
    }

    pub async fn schedule(
        &self,
        session: &SessionContext,
        plate_number: &str,
        request: ScheduleMaintenanceRequest,
    ) -> Result<ApiResponse<MaintenanceResponse>, AppError> {
        request.validate()?;
        let (record, truck) = self.maintenance.schedule(session, plate_number, request).await?;
        Ok(ApiResponse::success_with_message(
            MaintenanceResponse { record, truck },
            "Maintenance scheduled".to_string(),
        ))
    }

    pub async fn start(
        &self,
        session: &SessionContext,
        plate_number: &str,
        request: StartMaintenanceRequest,
    ) -> Result<ApiResponse<MaintenanceResponse>, AppError> {
        request.validate()?;
        let (record, truck) = self.maintenance.start(session, plate_number, request).await?;
        Ok(ApiResponse::success(MaintenanceResponse { record, truck }))
    }

    pub async fn complete(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<ApiResponse<MaintenanceResponse>, AppError> {
        let (record, truck) = self.maintenance.complete(session, plate_number).await?;
        Ok(ApiResponse::success_with_message(
            MaintenanceResponse { record, truck },
            "Maintenance completed".to_string(),
        ))
    }

    pub async fn cancel(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<ApiResponse<MaintenanceResponse>, AppError> {
        let (record, truck) = self.maintenance.cancel(session, plate_number).await?;
        Ok(ApiResponse::success(MaintenanceResponse { record, truck }))
    }

    pub async fn list(&self, plate_number: &str) -> Result<ApiResponse<Vec<MaintenanceRecord>>, AppError> {
        Ok(ApiResponse::success(self.maintenance.list(plate_number).await?))
    }
}
