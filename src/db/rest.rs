//! Managed backend store.
//!
//! Speaks the PostgREST table API exposed at `<project url>/rest/v1`. Filters use PostgREST
//! operators: `eq.` for equality, `cs.` for array containment and `ov.` for array overlap.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Store;
use crate::errors::AppError;
use crate::matching::VolunteerFilter;
use crate::models::{Event, EventSort, ImpactMetric, Task, TaskFilter, TaskReminder, Volunteer};

const PREFER: &str = "Prefer";

type Params = Vec<(&'static str, String)>;

/// PostgREST-backed [`Store`].
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    client: reqwest::Client,
}

impl RestStore {
    /// `project_url` is the managed backend's project URL, without the `/rest/v1` suffix.
    pub fn new(project_url: &str, service_key: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_key)
                .map_err(|e| AppError::Config(format!("Invalid service key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key))
                .map_err(|e| AppError::Config(format!("Invalid service key: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<T>, AppError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(params);
        read_rows(table, request).await
    }

    async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let rows = self.select(table, &[("id", eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<T, AppError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, "return=representation")
            .json(row);
        let rows: Vec<T> = read_rows(table, request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream(format!("Insert into {} returned no row", table)))
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        label: &str,
        id: &str,
        row: &T,
    ) -> Result<T, AppError> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", eq(id))])
            .header(PREFER, "return=representation")
            .json(row);
        let rows: Vec<T> = read_rows(table, request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", label, id)))
    }

    async fn delete(&self, table: &str, label: &str, id: &str) -> Result<(), AppError> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", eq(id))])
            .header(PREFER, "return=representation");
        let rows: Vec<serde_json::Value> = read_rows(table, request).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("{} {} not found", label, id)));
        }
        Ok(())
    }
}

impl Store for RestStore {
    fn name(&self) -> &'static str {
        "managed backend"
    }

    async fn list_events(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        self.select("events", &[("order", format!("{}.asc", sort.column()))])
            .await
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.select_by_id("events", id).await
    }

    async fn insert_event(&self, event: &Event) -> Result<Event, AppError> {
        self.insert("events", event).await
    }

    async fn update_event(&self, event: &Event) -> Result<Event, AppError> {
        self.update("events", "Event", &event.id, event).await
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.delete("events", "Event", id).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        self.select("tasks", &task_params(filter)).await
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, AppError> {
        self.select_by_id("tasks", id).await
    }

    async fn insert_task(&self, task: &Task) -> Result<Task, AppError> {
        self.insert("tasks", task).await
    }

    async fn update_task(&self, task: &Task) -> Result<Task, AppError> {
        self.update("tasks", "Task", &task.id, task).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        self.delete("tasks", "Task", id).await
    }

    async fn upsert_task_reminder(&self, reminder: &TaskReminder) -> Result<TaskReminder, AppError> {
        let request = self
            .client
            .post(self.table_url("task_reminders"))
            .query(&[("on_conflict", "task_id")])
            .header(PREFER, "resolution=merge-duplicates,return=representation")
            .json(reminder);
        let rows: Vec<TaskReminder> = read_rows("task_reminders", request).await?;
        rows.into_iter().next().ok_or_else(|| {
            AppError::Upstream("Upsert into task_reminders returned no row".to_string())
        })
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, AppError> {
        self.select("volunteers", &[("order", "created_at.desc".to_string())])
            .await
    }

    async fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>, AppError> {
        self.select_by_id("volunteers", id).await
    }

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<Volunteer, AppError> {
        self.insert("volunteers", volunteer).await
    }

    async fn delete_volunteer(&self, id: &str) -> Result<(), AppError> {
        self.delete("volunteers", "Volunteer", id).await
    }

    async fn count_volunteers(&self) -> Result<u64, AppError> {
        let response = self
            .client
            .head(self.table_url("volunteers"))
            .query(&[("select", "*")])
            .header(PREFER, "count=exact")
            .send()
            .await?;
        let response = ensure_success("volunteers", response).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                AppError::Upstream("Count of volunteers returned no Content-Range".to_string())
            })
    }

    async fn match_volunteers(&self, filter: &VolunteerFilter) -> Result<Vec<Volunteer>, AppError> {
        self.select("volunteers", &volunteer_match_params(filter))
            .await
    }

    async fn list_impact_metrics(
        &self,
        event_id: Option<&str>,
    ) -> Result<Vec<ImpactMetric>, AppError> {
        let mut params: Params = vec![("order", "created_at.asc".to_string())];
        if let Some(event_id) = event_id {
            params.push(("event_id", eq(event_id)));
        }
        self.select("impact_metrics", &params).await
    }

    async fn get_event_impact(&self, event_id: &str) -> Result<Option<ImpactMetric>, AppError> {
        let params: Params = vec![
            ("event_id", eq(event_id)),
            ("order", "created_at.asc".to_string()),
            ("limit", "1".to_string()),
        ];
        let rows = self.select("impact_metrics", &params).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_impact_metric(&self, metric: &ImpactMetric) -> Result<ImpactMetric, AppError> {
        self.insert("impact_metrics", metric).await
    }

    async fn delete_impact_metric(&self, id: &str) -> Result<(), AppError> {
        self.delete("impact_metrics", "Impact metric", id).await
    }
}

async fn ensure_success(table: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Managed backend rejected {} request: {} {}", table, status, body);
    Err(AppError::Upstream(format!(
        "Managed backend returned {} for {}",
        status, table
    )))
}

async fn read_rows<T: DeserializeOwned>(
    table: &str,
    request: RequestBuilder,
) -> Result<Vec<T>, AppError> {
    let response = ensure_success(table, request.send().await?).await?;
    Ok(response.json().await?)
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Render values as a Postgres array literal, quoting every element.
pub fn pg_array_literal(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Query parameters selecting the volunteers a filter accepts.
pub fn volunteer_match_params(filter: &VolunteerFilter) -> Params {
    let mut params = Params::new();
    if let Some(skills) = filter.required_skills() {
        params.push(("skills", format!("cs.{}", pg_array_literal(skills))));
    }
    if let Some(location) = filter.required_location() {
        params.push(("location", eq(location)));
    }
    if let Some(dates) = filter.candidate_dates() {
        params.push(("availability", format!("ov.{}", pg_array_literal(dates))));
    }
    params
}

fn task_params(filter: &TaskFilter) -> Params {
    let mut params: Params = vec![("order", "created_at.desc".to_string())];
    if let Some(event_id) = &filter.event_id {
        params.push(("event_id", eq(event_id)));
    }
    if let Some(status) = filter.status {
        params.push(("status", eq(status.as_str())));
    }
    params
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::models::TaskStatus;

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_pg_array_literal_quotes() {
        assert_eq!(
            pg_array_literal(&["cooking".to_string(), "first aid".to_string()]),
            r#"{"cooking","first aid"}"#
        );
        assert_eq!(
            pg_array_literal(&[r#"say "hi""#.to_string(), r"back\slash".to_string()]),
            r#"{"say \"hi\"","back\\slash"}"#
        );
    }

    #[test]
    fn test_match_params() {
        let filter = VolunteerFilter {
            skills: strings(&["driving"]),
            location: Some("NYC".to_string()),
            dates: strings(&["2024-06-01", "2024-06-02"]),
        };
        assert_eq!(
            volunteer_match_params(&filter),
            vec![
                ("skills", r#"cs.{"driving"}"#.to_string()),
                ("location", "eq.NYC".to_string()),
                ("availability", r#"ov.{"2024-06-01","2024-06-02"}"#.to_string()),
            ]
        );
    }

    #[test]
    fn test_match_params_skip_empty_criteria() {
        let filter = VolunteerFilter {
            skills: strings(&[]),
            location: Some(String::new()),
            dates: None,
        };
        assert!(volunteer_match_params(&filter).is_empty());
    }

    #[test]
    fn test_task_params() {
        let filter = TaskFilter {
            event_id: Some("e1".to_string()),
            status: Some(TaskStatus::InProgress),
        };
        assert_eq!(
            task_params(&filter),
            vec![
                ("order", "created_at.desc".to_string()),
                ("event_id", "eq.e1".to_string()),
                ("status", "eq.in-progress".to_string()),
            ]
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
    }

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn fake_volunteers(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        seen.lock().unwrap().push(params);
        Json(json!([{
            "id": "v1",
            "name": "Ana",
            "email": null,
            "skills": ["driving"],
            "location": "NYC",
            "availability": null,
            "events_participated": [],
            "created_at": "2024-01-01T00:00:00+00:00"
        }]))
    }

    async fn fake_empty_patch() -> (StatusCode, Json<Value>) {
        (StatusCode::OK, Json(json!([])))
    }

    async fn spawn_fake_backend() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/rest/v1/volunteers", get(fake_volunteers))
            .route("/rest/v1/events", patch(fake_empty_patch))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_match_sends_single_filtered_select() {
        let (url, seen) = spawn_fake_backend().await;
        let store = RestStore::new(&url, "service-key").unwrap();

        let filter = VolunteerFilter {
            skills: strings(&["driving"]),
            location: Some("NYC".to_string()),
            dates: None,
        };
        let volunteers = store.match_volunteers(&filter).await.unwrap();
        assert_eq!(volunteers.len(), 1);
        assert_eq!(volunteers[0].email, "");
        assert!(volunteers[0].availability.is_empty());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["select"], "*");
        assert_eq!(seen[0]["skills"], r#"cs.{"driving"}"#);
        assert_eq!(seen[0]["location"], "eq.NYC");
        assert!(!seen[0].contains_key("availability"));
    }

    #[tokio::test]
    async fn test_update_without_representation_is_not_found() {
        let (url, _seen) = spawn_fake_backend().await;
        let store = RestStore::new(&url, "service-key").unwrap();

        let event: Event = serde_json::from_value(json!({"id": "missing", "title": "Gone"})).unwrap();
        let err = store.update_event(&event).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_error() {
        let store = RestStore::new("http://127.0.0.1:9", "service-key").unwrap();
        let err = store.list_volunteers().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
