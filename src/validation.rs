use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ApiError;
use crate::models::{CreateBookingRequest, CreateClassRequest};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A class request that passed validation, dates as epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub name: String,
    pub start_date: i64,
    pub end_date: i64,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub class_id: u64,
    pub member_name: String,
    pub date: i64,
}

/// Parses `YYYY-MM-DD` into the epoch second of that day's UTC midnight.
pub fn parse_day(value: &str) -> Option<i64> {
    let day = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn required(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Unprocessable(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_class(req: &CreateClassRequest, now: DateTime<Utc>) -> Result<NewClass, ApiError> {
    required(&req.name, "name")?;
    if req.capacity == 0 {
        return Err(ApiError::Unprocessable("capacity must be greater than 0".into()));
    }

    let start_date = parse_day(&req.start_date)
        .ok_or_else(|| ApiError::Unprocessable("Invalid date format for start date".into()))?;
    let end_date = parse_day(&req.end_date)
        .ok_or_else(|| ApiError::Unprocessable("Invalid date format for end date".into()))?;

    let now = now.timestamp();
    if start_date < now {
        return Err(ApiError::Unprocessable("Start date cannot be in the past".into()));
    }
    if end_date < now {
        return Err(ApiError::Unprocessable("End date cannot be in the past".into()));
    }
    if start_date > end_date {
        return Err(ApiError::Unprocessable("End date cannot be before start date".into()));
    }

    Ok(NewClass {
        name: req.name.trim().to_string(),
        start_date,
        end_date,
        capacity: req.capacity,
    })
}

pub fn validate_booking(
    req: &CreateBookingRequest,
    now: DateTime<Utc>,
) -> Result<NewBooking, ApiError> {
    required(&req.member_name, "memberName")?;
    let date = parse_day(&req.date)
        .ok_or_else(|| ApiError::Unprocessable("Invalid date format".into()))?;
    if date < now.timestamp() {
        return Err(ApiError::Unprocessable("Date cannot be in the past".into()));
    }

    Ok(NewBooking {
        class_id: req.class_id,
        member_name: req.member_name.trim().to_string(),
        date,
    })
}
