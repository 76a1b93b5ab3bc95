use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub type ClassId = u64;
pub type BookingId = u64;

/// A stored class. Dates are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Class {
    #[sqlx(try_from = "i64")]
    pub id: ClassId,
    pub name: String,
    pub start_date: i64,
    pub end_date: i64,
    #[sqlx(try_from = "i64")]
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[schema(example = "Yoga-1")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(format = "date", example = "2026-11-02")]
    pub start_date: String,
    #[schema(format = "date", example = "2026-11-20")]
    pub end_date: String,
    #[schema(example = 20)]
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = 1)]
    pub class_id: u64,
    #[schema(example = "Rohit")]
    pub member_name: String,
    #[schema(format = "date", example = "2026-11-03")]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: u64) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}
