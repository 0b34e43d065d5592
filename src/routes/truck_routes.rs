use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::controllers::deployment_controller::DeploymentController;
use crate::controllers::maintenance_controller::MaintenanceController;
use crate::controllers::truck_controller::TruckController;
use crate::dto::maintenance_dto::{MaintenanceResponse, ScheduleMaintenanceRequest, StartMaintenanceRequest};
use crate::dto::truck_dto::{
    AssignDriverRequest, CancelResponse, CreateTruckRequest, DeployResponse, ReturnResponse, ReturnTruckRequest,
    TruckHistoryResponse,
};
use crate::dto::ApiResponse;
use crate::models::maintenance::MaintenanceRecord;
use crate::models::session::SessionContext;
use crate::models::truck::{Truck, TruckFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_truck_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_truck).get(list_trucks))
        .route("/:plate", get(get_truck).delete(archive_truck))
        .route("/:plate/driver", put(assign_driver).delete(unassign_driver))
        .route("/:plate/deployments", get(truck_history))
        .route("/:plate/deploy", post(deploy_truck))
        .route("/:plate/return", post(return_truck))
        .route("/:plate/cancel-deployment", post(cancel_deployment))
        .route("/:plate/maintenance", post(schedule_maintenance).get(list_maintenance))
        .route("/:plate/maintenance/start", post(start_maintenance))
        .route("/:plate/maintenance/complete", post(complete_maintenance))
        .route("/:plate/maintenance/cancel", post(cancel_maintenance))
}

async fn create_truck(
    State(state): State<AppState>,
    session: SessionContext,
    Json(request): Json<CreateTruckRequest>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.create(&session, request).await?))
}

async fn list_trucks(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(filters): Query<TruckFilters>,
) -> Result<Json<ApiResponse<Vec<Truck>>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.list(filters).await?))
}

async fn get_truck(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.get(&plate).await?))
}

async fn archive_truck(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.archive(&session, &plate).await?))
}

async fn assign_driver(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.assign_driver(&session, &plate, request.driver_id).await?))
}

async fn unassign_driver(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.unassign_driver(&session, &plate).await?))
}

async fn truck_history(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<TruckHistoryResponse>>, AppError> {
    let controller = TruckController::new(&state);
    Ok(Json(controller.history(&plate).await?))
}

async fn deploy_truck(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<DeployResponse>>, AppError> {
    let controller = DeploymentController::new(&state);
    Ok(Json(controller.deploy(&session, &plate).await?))
}

async fn return_truck(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
    Json(request): Json<ReturnTruckRequest>,
) -> Result<Json<ApiResponse<ReturnResponse>>, AppError> {
    let controller = DeploymentController::new(&state);
    Ok(Json(controller.return_truck(&session, &plate, request).await?))
}

async fn cancel_deployment(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<CancelResponse>>, AppError> {
    let controller = DeploymentController::new(&state);
    Ok(Json(controller.cancel(&session, &plate).await?))
}

async fn schedule_maintenance(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
    Json(request): Json<ScheduleMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceResponse>>, AppError> {
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.schedule(&session, &plate, request).await?))
}

async fn start_maintenance(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
    request: Option<Json<StartMaintenanceRequest>>,
) -> Result<Json<ApiResponse<MaintenanceResponse>>, AppError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.start(&session, &plate, request).await?))
}

async fn complete_maintenance(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<MaintenanceResponse>>, AppError> {
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.complete(&session, &plate).await?))
}

async fn cancel_maintenance(
    State(state): State<AppState>,
    session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<MaintenanceResponse>>, AppError> {
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.cancel(&session, &plate).await?))
}

async fn list_maintenance(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<Vec<MaintenanceRecord>>>, AppError> {
    let controller = MaintenanceController::new(&state);
    Ok(Json(controller.list(&plate).await?))
}
