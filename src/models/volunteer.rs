//! Volunteer model matching the `volunteers` table.

use serde::{Deserialize, Serialize};

use super::{ensure_present, new_id, now_timestamp, null_as_default};
use crate::errors::AppError;

/// A volunteer with free-form skill and availability tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    /// Date-like strings, compared verbatim when matching
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability: Vec<String>,
    /// Weak references to events
    #[serde(default, deserialize_with = "null_as_default")]
    pub events_participated: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

/// Request body for registering a volunteer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVolunteerRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub events_participated: Vec<String>,
}

impl CreateVolunteerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_present("name", &self.name)
    }

    pub fn into_volunteer(self) -> Volunteer {
        Volunteer {
            id: new_id(),
            name: self.name,
            email: self.email,
            skills: self.skills,
            location: self.location,
            availability: self.availability,
            events_participated: self.events_participated,
            created_at: now_timestamp(),
        }
    }
}
