//! Impact metric model matching the `impact_metrics` table.

use serde::{Deserialize, Serialize};

use super::{ensure_non_negative, ensure_present, new_id, now_timestamp, null_as_default};
use crate::errors::AppError;

/// Measured impact of one event. Missing numbers read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactMetric {
    pub id: String,
    /// Weak reference to an event
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_id: String,
    /// Kilograms of CO2
    #[serde(default, deserialize_with = "null_as_default")]
    pub co2_saved: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub volunteer_hours: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub people_reached: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Request body for recording impact for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImpactMetricRequest {
    pub event_id: String,
    #[serde(default)]
    pub co2_saved: f64,
    #[serde(default)]
    pub volunteer_hours: f64,
    #[serde(default)]
    pub people_reached: i64,
}

impl CreateImpactMetricRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_present("event_id", &self.event_id)?;
        ensure_non_negative("co2_saved", self.co2_saved)?;
        ensure_non_negative("volunteer_hours", self.volunteer_hours)?;
        if self.people_reached < 0 {
            return Err(AppError::Validation(
                "people_reached must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_metric(self) -> ImpactMetric {
        let now = now_timestamp();
        ImpactMetric {
            id: new_id(),
            event_id: self.event_id,
            co2_saved: self.co2_saved,
            volunteer_hours: self.volunteer_hours,
            people_reached: self.people_reached,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
