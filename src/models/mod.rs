//! Data models for the CSR event management application.
//!
//! Field names match the managed backend's table columns so rows round-trip without renaming.

mod event;
mod impact;
mod task;
mod volunteer;

pub use event::*;
pub use impact::*;
pub use task::*;
pub use volunteer::*;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

/// Deserialize `null` as the type's default. Combine with `#[serde(default)]` for absent fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Current time in the format stored in `created_at`/`updated_at`.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse the calendar date out of a timestamp or plain date string.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts.date());
    }
    // datetime-local form inputs carry no seconds
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub(crate) fn ensure_present(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

/// Dates that do not parse are left alone; only a parsed end before a parsed start is rejected.
pub(crate) fn ensure_date_order(start: &str, end: &str) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (parse_calendar_date(start), parse_calendar_date(end)) {
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(parse_calendar_date("2024-05-17"), Some(expected));
        assert_eq!(parse_calendar_date("2024-05-17T09:30:00Z"), Some(expected));
        assert_eq!(
            parse_calendar_date("2024-05-17T09:30:00.123+02:00"),
            Some(expected)
        );
        assert_eq!(parse_calendar_date("2024-05-17T09:30"), Some(expected));
        assert_eq!(parse_calendar_date("2024-05-17 09:30:00"), Some(expected));
        assert_eq!(parse_calendar_date("next friday"), None);
    }

    #[test]
    fn test_date_order() {
        assert!(ensure_date_order("2024-05-01", "2024-05-02").is_ok());
        assert!(ensure_date_order("2024-05-02", "2024-05-02T18:00:00Z").is_ok());
        assert!(ensure_date_order("2024-05-03", "2024-05-02").is_err());
        assert!(ensure_date_order("tbd", "2024-05-02").is_ok());
    }

    #[test]
    fn test_non_negative() {
        assert!(ensure_non_negative("budget", 0.0).is_ok());
        assert!(ensure_non_negative("budget", -0.5).is_err());
        assert!(ensure_non_negative("budget", f64::NAN).is_err());
        assert!(ensure_non_negative("budget", f64::INFINITY).is_err());
    }
}
