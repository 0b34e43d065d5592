//! DTOs de la API
//!
//! Requests y responses que viajan por HTTP.

pub mod api_response;
pub mod driver_dto;
pub mod maintenance_dto;
pub mod notification_dto;
pub mod truck_dto;

pub use api_response::ApiResponse;
