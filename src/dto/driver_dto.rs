use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::validate_not_empty;

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 2, max = 100), custom = "validate_not_empty")]
    pub full_name: String,

    #[validate(length(min = 5, max = 30))]
    pub license_number: String,

    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
}
