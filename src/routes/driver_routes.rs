use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::CreateDriverRequest;
use crate::dto::ApiResponse;
use crate::models::driver::Driver;
use crate::models::session::SessionContext;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new().route("/", post(create_driver).get(list_drivers))
}

async fn create_driver(
    State(state): State<AppState>,
    session: SessionContext,
    Json(request): Json<CreateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(&state);
    Ok(Json(controller.create(&session, request).await?))
}

async fn list_drivers(
    State(state): State<AppState>,
    _session: SessionContext,
) -> Result<Json<ApiResponse<Vec<Driver>>>, AppError> {
    let controller = DriverController::new(&state);
    Ok(Json(controller.list().await?))
}
