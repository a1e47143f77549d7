//! Event model matching the `events` table.

use serde::{Deserialize, Serialize};

use super::{
    ensure_date_order, ensure_non_negative, ensure_present, new_id, now_timestamp,
    null_as_default,
};
use crate::errors::AppError;

/// A CSR event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub budget: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl Event {
    /// Check the invariants enforced on writes made through this service.
    pub fn validate(&self) -> Result<(), AppError> {
        ensure_present("title", &self.title)?;
        ensure_non_negative("budget", self.budget)?;
        ensure_date_order(&self.start_date, &self.end_date)
    }

    /// Case-insensitive substring match on title, description and location.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.description, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Ordering for event listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventSort {
    /// Ascending `start_date`
    #[default]
    Date,
    /// Ascending `title`
    Title,
}

impl EventSort {
    pub fn column(&self) -> &'static str {
        match self {
            EventSort::Date => "start_date",
            EventSort::Title => "title",
        }
    }
}

/// Request body for creating a new event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub location: String,
    /// User id of the creator
    pub created_by: String,
}

impl CreateEventRequest {
    pub fn into_event(self) -> Event {
        let now = now_timestamp();
        Event {
            id: new_id(),
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
            location: self.location,
            created_by: self.created_by,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Request body for updating an existing event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
}

impl UpdateEventRequest {
    /// Merge the provided fields over `existing`.
    pub fn apply_to(&self, existing: &Event) -> Event {
        Event {
            id: existing.id.clone(),
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            start_date: self
                .start_date
                .clone()
                .unwrap_or_else(|| existing.start_date.clone()),
            end_date: self
                .end_date
                .clone()
                .unwrap_or_else(|| existing.end_date.clone()),
            budget: self.budget.unwrap_or(existing.budget),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| existing.location.clone()),
            created_by: existing.created_by.clone(),
            created_at: existing.created_at.clone(),
            updated_at: now_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beach_cleanup() -> Event {
        CreateEventRequest {
            title: "Beach Cleanup".to_string(),
            description: "Collect plastic along the shore".to_string(),
            start_date: "2024-06-01".to_string(),
            end_date: "2024-06-02".to_string(),
            budget: 1200.0,
            location: "Santa Monica".to_string(),
            created_by: "user-1".to_string(),
        }
        .into_event()
    }

    #[test]
    fn test_update_merges_fields() {
        let event = beach_cleanup();
        let update = UpdateEventRequest {
            title: Some("Harbor Cleanup".to_string()),
            budget: Some(800.0),
            ..Default::default()
        };
        let merged = update.apply_to(&event);
        assert_eq!(merged.id, event.id);
        assert_eq!(merged.title, "Harbor Cleanup");
        assert_eq!(merged.budget, 800.0);
        assert_eq!(merged.location, "Santa Monica");
        assert_eq!(merged.created_at, event.created_at);
    }

    #[test]
    fn test_validate_rejects_inverted_dates() {
        let mut event = beach_cleanup();
        assert!(event.validate().is_ok());
        event.end_date = "2024-05-01".to_string();
        assert!(matches!(event.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let event = beach_cleanup();
        assert!(event.matches_search("PLASTIC"));
        assert!(event.matches_search("monica"));
        assert!(!event.matches_search("tree planting"));
    }

    #[test]
    fn test_null_columns_deserialize() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "title": "Food Drive",
            "description": null,
            "budget": null
        }))
        .unwrap();
        assert_eq!(event.description, "");
        assert_eq!(event.budget, 0.0);
    }
}
