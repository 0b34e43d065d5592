pub mod deployment_controller;
pub mod driver_controller;
pub mod maintenance_controller;
pub mod notification_controller;
pub mod truck_controller;
