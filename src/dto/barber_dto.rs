use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::BarberStatus;

/// Create barber request; status is always forced to available
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBarberRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(range(min = 1, message = "Chair number must be at least 1"))]
    pub chair_no: i32,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBarberRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(range(min = 1, message = "Chair number must be at least 1"))]
    pub chair_no: Option<i32>,

    pub status: Option<BarberStatus>,

    pub current_entry_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub status: BarberStatus,
}
