//! Fixed system instructions and the event summary template.

use crate::models::{parse_calendar_date, Event, ImpactMetric, Task};

pub const IDEA_SYSTEM_PROMPT: &str = "You are an expert in corporate social responsibility (CSR) initiatives. Generate creative and impactful CSR event ideas that align with sustainable development goals.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert in corporate social responsibility reporting. Create professional, concise summaries of CSR events highlighting key achievements and impact.";

fn display_date(value: &str) -> String {
    match parse_calendar_date(value) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => value.to_string(),
    }
}

/// Render an event, its tasks and its impact into the summary request text.
///
/// The output depends only on the arguments.
pub fn render_summary_prompt(event: &Event, tasks: &[Task], impact: Option<&ImpactMetric>) -> String {
    let mut prompt = format!(
        "Please create a professional summary of this CSR event:\n\
         \n\
         Event Name: {}\n\
         Date: {} to {}\n\
         Location: {}\n\
         \n\
         Description: {}\n\
         \n\
         Number of Tasks: {}\n",
        event.title,
        display_date(&event.start_date),
        display_date(&event.end_date),
        event.location,
        event.description,
        tasks.len()
    );

    if let Some(impact) = impact {
        prompt.push_str(&format!(
            "Impact:\n\
             - CO2 Saved: {} kg\n\
             - Volunteer Hours: {} hours\n\
             - People Reached: {} people\n",
            impact.co2_saved, impact.volunteer_hours, impact.people_reached
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event {
            id: "e1".to_string(),
            title: "Beach Cleanup".to_string(),
            description: "Collect plastic along the shore".to_string(),
            start_date: "2024-06-01T08:00:00Z".to_string(),
            end_date: "2024-06-02".to_string(),
            budget: 500.0,
            location: "Santa Monica".to_string(),
            created_by: "u1".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_summary_without_impact() {
        let prompt = render_summary_prompt(&event(), &[], None);
        assert_eq!(
            prompt,
            "Please create a professional summary of this CSR event:\n\
             \n\
             Event Name: Beach Cleanup\n\
             Date: 2024-06-01 to 2024-06-02\n\
             Location: Santa Monica\n\
             \n\
             Description: Collect plastic along the shore\n\
             \n\
             Number of Tasks: 0\n"
        );
    }

    #[test]
    fn test_summary_with_impact() {
        let impact = ImpactMetric {
            id: "m1".to_string(),
            event_id: "e1".to_string(),
            co2_saved: 150.0,
            volunteer_hours: 12.5,
            people_reached: 70,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let prompt = render_summary_prompt(&event(), &[], Some(&impact));
        assert!(prompt.ends_with(
            "Impact:\n- CO2 Saved: 150 kg\n- Volunteer Hours: 12.5 hours\n- People Reached: 70 people\n"
        ));
    }

    #[test]
    fn test_unparsable_dates_pass_through() {
        let mut event = event();
        event.end_date = "TBD".to_string();
        let prompt = render_summary_prompt(&event, &[], None);
        assert!(prompt.contains("Date: 2024-06-01 to TBD\n"));
    }
}
