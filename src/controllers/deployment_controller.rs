use chrono::FixedOffset;

use crate::dto::truck_dto::{CancelResponse, DeployResponse, DeploymentResponse, ReturnResponse, ReturnTruckRequest};
use crate::dto::ApiResponse;
use crate::models::session::SessionContext;
use crate::services::truck_lifecycle_service::ReturnReport;
use crate::services::TruckLifecycleService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct DeploymentController {
    lifecycle: TruckLifecycleService,
    civil_offset: FixedOffset,
}

impl DeploymentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            lifecycle: state.lifecycle(),
            civil_offset: state.config.civil_offset,
        }
    }

    pub async fn deploy(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<ApiResponse<DeployResponse>, AppError> {
        let report = self.lifecycle.deploy(session, plate_number).await?;
        Ok(ApiResponse::success_with_message(
            DeployResponse {
                truck: report.truck,
                deployment: DeploymentResponse::from_deployment(report.deployment, &self.civil_offset),
            },
            "Truck deployed".to_string(),
        ))
    }

    pub async fn return_truck(
        &self,
        session: &SessionContext,
        plate_number: &str,
        request: ReturnTruckRequest,
    ) -> Result<ApiResponse<ReturnResponse>, AppError> {
        let report = self.lifecycle.return_truck(session, plate_number, request.odometer).await?;

        let (response, message) = match report {
            ReturnReport::Completed {
                deployment,
                truck,
                remaining_to_oil_change,
                notification,
            } => (
                ReturnResponse {
                    truck,
                    reconciled: false,
                    deployment: Some(DeploymentResponse::from_deployment(deployment, &self.civil_offset)),
                    remaining_to_oil_change: Some(remaining_to_oil_change),
                    notification: Some(notification),
                },
                "Truck returned",
            ),
            ReturnReport::Reconciled { truck } => (
                ReturnResponse {
                    truck,
                    reconciled: true,
                    deployment: None,
                    remaining_to_oil_change: None,
                    notification: None,
                },
                "No open deployment, truck status reconciled",
            ),
        };

        Ok(ApiResponse::success_with_message(response, message.to_string()))
    }

    pub async fn cancel(
        &self,
        session: &SessionContext,
        plate_number: &str,
    ) -> Result<ApiResponse<CancelResponse>, AppError> {
        let report = self.lifecycle.cancel_deployment(session, plate_number).await?;
        Ok(ApiResponse::success(CancelResponse {
            truck: report.truck,
            voided: report
                .voided
                .map(|d| DeploymentResponse::from_deployment(d, &self.civil_offset)),
        }))
    }
}
