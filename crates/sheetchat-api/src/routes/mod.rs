pub mod health;
pub mod messages;
pub mod openapi;
pub mod sheets;
pub mod threads;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by delete/update endpoints that have nothing else to say
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
