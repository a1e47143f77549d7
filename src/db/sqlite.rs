//! Embedded SQLite store.
//!
//! Mirrors the managed backend's tables. Array columns hold JSON text so containment and overlap
//! filters can be expressed with `json_each` inside a single statement.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::Store;
use crate::errors::AppError;
use crate::matching::VolunteerFilter;
use crate::models::{
    Event, EventSort, ImpactMetric, Task, TaskFilter, TaskReminder, TaskStatus, Volunteer,
};

const EVENT_COLUMNS: &str = "id, title, description, start_date, end_date, budget, location, created_by, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, status, due_date, assigned_to, event_id, created_at, updated_at";
const VOLUNTEER_COLUMNS: &str =
    "id, name, email, skills, location, availability, events_participated, created_at";
const IMPACT_COLUMNS: &str =
    "id, event_id, co2_saved, volunteer_hours, people_reached, created_at, updated_at";

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            start_date TEXT NOT NULL DEFAULT '',
            end_date TEXT NOT NULL DEFAULT '',
            budget REAL NOT NULL DEFAULT 0,
            location TEXT NOT NULL DEFAULT '',
            created_by TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // event_id is a weak reference, deliberately without a foreign key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'to-do',
            due_date TEXT NOT NULL DEFAULT '',
            assigned_to TEXT NOT NULL DEFAULT '',
            event_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_reminders (
            task_id TEXT PRIMARY KEY,
            reminder_time TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS volunteers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            skills TEXT NOT NULL DEFAULT '[]',
            location TEXT NOT NULL DEFAULT '',
            availability TEXT NOT NULL DEFAULT '[]',
            events_participated TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Numeric columns stay nullable: absent values must aggregate as zero, not fail the read
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS impact_metrics (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            co2_saved REAL,
            volunteer_hours REAL,
            people_reached INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_events_start_date ON events(start_date);
        CREATE INDEX IF NOT EXISTS idx_tasks_event_id ON tasks(event_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
        CREATE INDEX IF NOT EXISTS idx_volunteers_location ON volunteers(location);
        CREATE INDEX IF NOT EXISTS idx_impact_metrics_event_id ON impact_metrics(event_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// SQLite-backed [`Store`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn delete_by_id(&self, table: &str, label: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", label, id)));
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    // ==================== EVENT OPERATIONS ====================

    async fn list_events(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events ORDER BY {} ASC, id ASC",
            EVENT_COLUMNS,
            sort.column()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(event_from_row).collect())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(event_from_row))
    }

    async fn insert_event(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query(&format!(
            "INSERT INTO events ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            EVENT_COLUMNS
        ))
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.start_date)
        .bind(&event.end_date)
        .bind(event.budget)
        .bind(&event.location)
        .bind(&event.created_by)
        .bind(&event.created_at)
        .bind(&event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(event.clone())
    }

    async fn update_event(&self, event: &Event) -> Result<Event, AppError> {
        let result = sqlx::query(
            "UPDATE events SET title = ?, description = ?, start_date = ?, end_date = ?, budget = ?, location = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.start_date)
        .bind(&event.end_date)
        .bind(event.budget)
        .bind(&event.location)
        .bind(&event.updated_at)
        .bind(&event.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", event.id)));
        }
        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.delete_by_id("events", "Event", id).await
    }

    // ==================== TASK OPERATIONS ====================

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM tasks WHERE 1 = 1", TASK_COLUMNS));

        if let Some(event_id) = &filter.event_id {
            query.push(" AND event_id = ").push_bind(event_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(task_from_row).collect()
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn insert_task(&self, task: &Task) -> Result<Task, AppError> {
        sqlx::query(&format!(
            "INSERT INTO tasks ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TASK_COLUMNS
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(&task.due_date)
        .bind(&task.assigned_to)
        .bind(&task.event_id)
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task.clone())
    }

    async fn update_task(&self, task: &Task) -> Result<Task, AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, due_date = ?, assigned_to = ?, event_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(&task.due_date)
        .bind(&task.assigned_to)
        .bind(&task.event_id)
        .bind(&task.updated_at)
        .bind(&task.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task {} not found", task.id)));
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        self.delete_by_id("tasks", "Task", id).await?;

        sqlx::query("DELETE FROM task_reminders WHERE task_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_task_reminder(&self, reminder: &TaskReminder) -> Result<TaskReminder, AppError> {
        sqlx::query(
            r#"INSERT INTO task_reminders (task_id, reminder_time, enabled) VALUES (?, ?, ?)
               ON CONFLICT(task_id) DO UPDATE SET
                   reminder_time = excluded.reminder_time,
                   enabled = excluded.enabled"#,
        )
        .bind(&reminder.task_id)
        .bind(&reminder.reminder_time)
        .bind(reminder.enabled as i32)
        .execute(&self.pool)
        .await?;

        Ok(reminder.clone())
    }

    // ==================== VOLUNTEER OPERATIONS ====================

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM volunteers ORDER BY created_at DESC, id ASC",
            VOLUNTEER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(volunteer_from_row).collect())
    }

    async fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM volunteers WHERE id = ?",
            VOLUNTEER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(volunteer_from_row))
    }

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<Volunteer, AppError> {
        sqlx::query(&format!(
            "INSERT INTO volunteers ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            VOLUNTEER_COLUMNS
        ))
        .bind(&volunteer.id)
        .bind(&volunteer.name)
        .bind(&volunteer.email)
        .bind(json_array(&volunteer.skills))
        .bind(&volunteer.location)
        .bind(json_array(&volunteer.availability))
        .bind(json_array(&volunteer.events_participated))
        .bind(&volunteer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(volunteer.clone())
    }

    async fn delete_volunteer(&self, id: &str) -> Result<(), AppError> {
        self.delete_by_id("volunteers", "Volunteer", id).await
    }

    async fn count_volunteers(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM volunteers")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }

    async fn match_volunteers(&self, filter: &VolunteerFilter) -> Result<Vec<Volunteer>, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM volunteers WHERE 1 = 1",
            VOLUNTEER_COLUMNS
        ));

        // Containment: no requested skill is missing from the volunteer's skills
        if let Some(skills) = filter.required_skills() {
            query
                .push(" AND NOT EXISTS (SELECT 1 FROM json_each(")
                .push_bind(json_array(skills))
                .push(
                    ") AS wanted WHERE wanted.value NOT IN \
                     (SELECT have.value FROM json_each(volunteers.skills) AS have))",
                );
        }

        if let Some(location) = filter.required_location() {
            query
                .push(" AND location = ")
                .push_bind(location.to_string());
        }

        // Overlap: at least one availability slot is among the candidate dates
        if let Some(dates) = filter.candidate_dates() {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM json_each(volunteers.availability) AS slot \
                     WHERE slot.value IN (SELECT asked.value FROM json_each(",
                )
                .push_bind(json_array(dates))
                .push(") AS asked))");
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(volunteer_from_row).collect())
    }

    // ==================== IMPACT OPERATIONS ====================

    async fn list_impact_metrics(
        &self,
        event_id: Option<&str>,
    ) -> Result<Vec<ImpactMetric>, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM impact_metrics WHERE 1 = 1",
            IMPACT_COLUMNS
        ));
        if let Some(event_id) = event_id {
            query.push(" AND event_id = ").push_bind(event_id.to_string());
        }
        query.push(" ORDER BY created_at ASC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(impact_from_row).collect())
    }

    async fn get_event_impact(&self, event_id: &str) -> Result<Option<ImpactMetric>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM impact_metrics WHERE event_id = ? ORDER BY created_at ASC, id ASC LIMIT 1",
            IMPACT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(impact_from_row))
    }

    async fn insert_impact_metric(&self, metric: &ImpactMetric) -> Result<ImpactMetric, AppError> {
        sqlx::query(&format!(
            "INSERT INTO impact_metrics ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            IMPACT_COLUMNS
        ))
        .bind(&metric.id)
        .bind(&metric.event_id)
        .bind(metric.co2_saved)
        .bind(metric.volunteer_hours)
        .bind(metric.people_reached)
        .bind(&metric.created_at)
        .bind(&metric.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(metric.clone())
    }

    async fn delete_impact_metric(&self, id: &str) -> Result<(), AppError> {
        self.delete_by_id("impact_metrics", "Impact metric", id).await
    }
}

// Helper functions for row conversion

fn event_from_row(row: &SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        budget: row.get("budget"),
        location: row.get("location"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn task_from_row(row: &SqliteRow) -> Result<Task, AppError> {
    let status: String = row.get("status");
    Ok(Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: TaskStatus::from_str(&status)?,
        due_date: row.get("due_date"),
        assigned_to: row.get("assigned_to"),
        event_id: row.get("event_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn volunteer_from_row(row: &SqliteRow) -> Volunteer {
    let skills: String = row.get("skills");
    let availability: String = row.get("availability");
    let events_participated: String = row.get("events_participated");
    Volunteer {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        skills: parse_json_array(&skills),
        location: row.get("location"),
        availability: parse_json_array(&availability),
        events_participated: parse_json_array(&events_participated),
        created_at: row.get("created_at"),
    }
}

fn impact_from_row(row: &SqliteRow) -> ImpactMetric {
    let co2_saved: Option<f64> = row.get("co2_saved");
    let volunteer_hours: Option<f64> = row.get("volunteer_hours");
    let people_reached: Option<i64> = row.get("people_reached");
    ImpactMetric {
        id: row.get("id"),
        event_id: row.get("event_id"),
        co2_saved: co2_saved.unwrap_or_default(),
        volunteer_hours: volunteer_hours.unwrap_or_default(),
        people_reached: people_reached.unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn json_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateVolunteerRequest;
    use tempfile::TempDir;

    async fn open_temp_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("store.sqlite"))
            .await
            .expect("Failed to init DB");
        (SqliteStore::new(pool), temp_dir)
    }

    fn volunteer(name: &str, skills: &[&str], location: &str, availability: &[&str]) -> Volunteer {
        CreateVolunteerRequest {
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            location: location.to_string(),
            availability: availability.iter().map(|s| s.to_string()).collect(),
            events_participated: Vec::new(),
        }
        .into_volunteer()
    }

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_match_query_agrees_with_predicate() {
        let (store, _dir) = open_temp_store().await;
        let roster = vec![
            volunteer("Ana", &["driving", "cooking"], "NYC", &["2024-06-01", "2024-06-02"]),
            volunteer("Ben", &["cooking"], "LA", &["2024-06-02"]),
            volunteer("Cy", &[], "NYC", &[]),
            volunteer("Dee", &["first-aid", "driving"], "Chicago", &["2024-07-04"]),
            volunteer("Eli", &["cooking", "driving", "driving"], "LA", &["2024-06-01"]),
            volunteer("Fay", &["it's \"quoted\""], "LA", &["2024-06-01"]),
        ];
        for v in &roster {
            store.insert_volunteer(v).await.unwrap();
        }

        let filters = vec![
            VolunteerFilter::default(),
            VolunteerFilter {
                skills: strings(&["cooking"]),
                ..Default::default()
            },
            VolunteerFilter {
                skills: strings(&["driving", "cooking"]),
                ..Default::default()
            },
            VolunteerFilter {
                skills: strings(&["it's \"quoted\""]),
                ..Default::default()
            },
            VolunteerFilter {
                location: Some("LA".to_string()),
                dates: strings(&["2024-06-01", "2030-01-01"]),
                ..Default::default()
            },
            VolunteerFilter {
                skills: strings(&["driving"]),
                location: Some("NYC".to_string()),
                dates: strings(&["2024-06-02"]),
            },
            VolunteerFilter {
                skills: strings(&[]),
                location: Some(String::new()),
                dates: strings(&[]),
            },
            VolunteerFilter {
                skills: strings(&["juggling"]),
                ..Default::default()
            },
        ];

        for filter in filters {
            let mut from_query: Vec<String> = store
                .match_volunteers(&filter)
                .await
                .unwrap()
                .into_iter()
                .map(|v| v.name)
                .collect();
            let mut expected: Vec<String> = roster
                .iter()
                .filter(|v| filter.matches(v))
                .map(|v| v.name.clone())
                .collect();
            from_query.sort();
            expected.sort();
            assert_eq!(from_query, expected, "filter {:?}", filter);
        }
    }

    #[tokio::test]
    async fn test_impact_nulls_read_as_zero() {
        let (store, _dir) = open_temp_store().await;
        sqlx::query(
            "INSERT INTO impact_metrics (id, event_id, co2_saved, volunteer_hours, people_reached, created_at, updated_at) VALUES ('m1', 'e1', NULL, 3.5, NULL, 'now', 'now')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let metric = store.get_event_impact("e1").await.unwrap().unwrap();
        assert_eq!(metric.co2_saved, 0.0);
        assert_eq!(metric.volunteer_hours, 3.5);
        assert_eq!(metric.people_reached, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (store, _dir) = open_temp_store().await;
        let err = store.delete_event("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
