//! Volunteer matching.
//!
//! A filter is the AND of whichever criteria were provided. Within the date criterion any single
//! shared date is enough; within the skills criterion every requested skill must be present.

use serde::Deserialize;

#[cfg(test)]
use crate::models::Volunteer;

/// Request body of `POST /api/volunteers/match`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VolunteerFilter {
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub dates: Option<Vec<String>>,
}

impl VolunteerFilter {
    /// Skills to require, `None` when the criterion is absent or empty.
    pub fn required_skills(&self) -> Option<&[String]> {
        self.skills.as_deref().filter(|s| !s.is_empty())
    }

    /// Location to require, `None` when absent or empty.
    pub fn required_location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    /// Candidate dates, `None` when absent or empty.
    pub fn candidate_dates(&self) -> Option<&[String]> {
        self.dates.as_deref().filter(|d| !d.is_empty())
    }

    pub fn is_unfiltered(&self) -> bool {
        self.required_skills().is_none()
            && self.required_location().is_none()
            && self.candidate_dates().is_none()
    }

    /// Reference predicate. Store queries must select exactly the volunteers this accepts.
    ///
    /// Matching itself runs inside the store query; the store tests compare their results
    /// against this.
    #[cfg(test)]
    pub fn matches(&self, volunteer: &Volunteer) -> bool {
        use std::collections::HashSet;

        if let Some(skills) = self.required_skills() {
            let have: HashSet<&str> = volunteer.skills.iter().map(String::as_str).collect();
            if !skills.iter().all(|skill| have.contains(skill.as_str())) {
                return false;
            }
        }

        if let Some(location) = self.required_location() {
            if volunteer.location != location {
                return false;
            }
        }

        if let Some(dates) = self.candidate_dates() {
            let wanted: HashSet<&str> = dates.iter().map(String::as_str).collect();
            if !volunteer
                .availability
                .iter()
                .any(|slot| wanted.contains(slot.as_str()))
            {
                return false;
            }
        }

        true
    }
}
