//! Impact aggregation.
//!
//! Totals are pure reductions over metric rows. Non-finite numbers count as zero so one bad row
//! cannot turn every total into NaN.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Event, ImpactMetric};

/// Summed impact over a set of metric rows.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ImpactTotals {
    pub co2_saved: f64,
    pub volunteer_hours: f64,
    pub people_reached: i64,
}

impl ImpactTotals {
    /// Sum the metrics. The result does not depend on the order of the input.
    pub fn aggregate<'a>(metrics: impl IntoIterator<Item = &'a ImpactMetric>) -> Self {
        let mut co2 = Vec::new();
        let mut hours = Vec::new();
        let mut people: i64 = 0;

        for metric in metrics {
            co2.push(finite_or_zero(metric.co2_saved));
            hours.push(finite_or_zero(metric.volunteer_hours));
            people = people.saturating_add(metric.people_reached);
        }

        Self {
            co2_saved: ordered_sum(co2),
            volunteer_hours: ordered_sum(hours),
            people_reached: people,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// Float addition is not associative; summing in a canonical order makes the total bit-identical
// for every permutation of the input.
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Impact of a single event, one bar group in the impact chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventImpact {
    pub event_id: String,
    /// `None` when the metric points at an event that no longer exists
    pub title: Option<String>,
    #[serde(flatten)]
    pub totals: ImpactTotals,
}

/// Response body of `GET /api/impact/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub totals: ImpactTotals,
    pub events: Vec<EventImpact>,
}

impl ImpactSummary {
    /// Totals plus a per-event breakdown. Events keep the order they were given in; metrics
    /// referencing unknown events follow, ordered by event id.
    pub fn build(events: &[Event], metrics: &[ImpactMetric]) -> Self {
        let mut by_event: BTreeMap<&str, Vec<&ImpactMetric>> = BTreeMap::new();
        for metric in metrics {
            by_event
                .entry(metric.event_id.as_str())
                .or_default()
                .push(metric);
        }

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let group = by_event.remove(event.id.as_str()).unwrap_or_default();
            rows.push(EventImpact {
                event_id: event.id.clone(),
                title: Some(event.title.clone()),
                totals: ImpactTotals::aggregate(group),
            });
        }
        for (event_id, group) in by_event {
            rows.push(EventImpact {
                event_id: event_id.to_string(),
                title: None,
                totals: ImpactTotals::aggregate(group),
            });
        }

        Self {
            totals: ImpactTotals::aggregate(metrics),
            events: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(event_id: &str, co2: f64, hours: f64, people: i64) -> ImpactMetric {
        ImpactMetric {
            id: format!("m-{}-{}", event_id, people),
            event_id: event_id.to_string(),
            co2_saved: co2,
            volunteer_hours: hours,
            people_reached: people,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn event(id: &str, title: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            budget: 0.0,
            location: String::new(),
            created_by: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_two_metric_scenario() {
        let metrics = vec![metric("e1", 100.0, 10.0, 50), metric("e2", 50.0, 5.0, 20)];
        let totals = ImpactTotals::aggregate(&metrics);
        assert_eq!(
            totals,
            ImpactTotals {
                co2_saved: 150.0,
                volunteer_hours: 15.0,
                people_reached: 70,
            }
        );
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(ImpactTotals::aggregate(&[]), ImpactTotals::default());
    }

    #[test]
    fn test_order_independent() {
        let metrics = vec![
            metric("e1", 0.1, 1.5, 3),
            metric("e2", 1e16, 0.25, 7),
            metric("e3", 0.2, 2.75, 11),
            metric("e4", -1e16, 0.125, 13),
            metric("e5", 0.3, 3.0, 17),
        ];
        let expected = ImpactTotals::aggregate(&metrics);

        // every rotation and its reverse
        for shift in 0..metrics.len() {
            let mut rotated = metrics.clone();
            rotated.rotate_left(shift);
            assert_eq!(ImpactTotals::aggregate(&rotated), expected);
            rotated.reverse();
            assert_eq!(ImpactTotals::aggregate(&rotated), expected);
        }
    }

    #[test]
    fn test_non_finite_counts_as_zero() {
        let metrics = vec![metric("e1", f64::NAN, 4.0, 1), metric("e2", 6.0, f64::INFINITY, 2)];
        let totals = ImpactTotals::aggregate(&metrics);
        assert_eq!(totals.co2_saved, 6.0);
        assert_eq!(totals.volunteer_hours, 4.0);
        assert_eq!(totals.people_reached, 3);
    }

    #[test]
    fn test_summary_breakdown() {
        let events = vec![event("e1", "Beach Cleanup"), event("e2", "Food Drive")];
        let metrics = vec![
            metric("e1", 100.0, 10.0, 50),
            metric("e1", 20.0, 2.0, 5),
            metric("gone", 1.0, 1.0, 1),
        ];
        let summary = ImpactSummary::build(&events, &metrics);

        assert_eq!(summary.totals.co2_saved, 121.0);
        assert_eq!(summary.events.len(), 3);
        assert_eq!(summary.events[0].title.as_deref(), Some("Beach Cleanup"));
        assert_eq!(summary.events[0].totals.people_reached, 55);
        assert_eq!(summary.events[1].totals, ImpactTotals::default());
        assert_eq!(summary.events[2].event_id, "gone");
        assert_eq!(summary.events[2].title, None);
    }
}
