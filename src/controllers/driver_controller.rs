use validator::Validate;

use crate::dto::driver_dto::CreateDriverRequest;
use crate::dto::ApiResponse;
use crate::middleware::require_admin;
use crate::models::driver::Driver;
use crate::models::session::SessionContext;
use crate::services::FleetService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct DriverController {
    fleet: FleetService,
}

impl DriverController {
    pub fn new(state: &AppState) -> Self {
        Self { fleet: state.fleet() }
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateDriverRequest,
    ) -> Result<ApiResponse<Driver>, AppError> {
        require_admin(session, "register drivers")?;
        request.validate()?;
        let driver = self.fleet.register_driver(session, request).await?;
        Ok(ApiResponse::success_with_message(
            driver,
            "Driver registered successfully".to_string(),
        ))
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<Driver>>, AppError> {
        Ok(ApiResponse::success(self.fleet.list_drivers().await?))
    }
}
