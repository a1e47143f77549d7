//! Data-access layer.
//!
//! The managed backend owns every record; [`RestStore`] reaches it through its table API.
//! [`SqliteStore`] holds the same tables in an embedded database for local runs and tests.

mod rest;
mod sqlite;

pub use rest::*;
pub use sqlite::*;

use std::future::Future;

use crate::config::StoreConfig;
use crate::errors::AppError;
use crate::matching::VolunteerFilter;
use crate::models::{
    Event, EventSort, ImpactMetric, Task, TaskFilter, TaskReminder, Volunteer,
};

/// Table-level operations on events, tasks, volunteers and impact metrics.
///
/// Updates take the complete merged record; a missing row is reported as [`AppError::NotFound`].
pub trait Store {
    /// Human readable backend name for logs.
    fn name(&self) -> &'static str;

    fn list_events(
        &self,
        sort: EventSort,
    ) -> impl Future<Output = Result<Vec<Event>, AppError>> + Send;

    fn get_event(&self, id: &str)
        -> impl Future<Output = Result<Option<Event>, AppError>> + Send;

    fn insert_event(&self, event: &Event) -> impl Future<Output = Result<Event, AppError>> + Send;

    fn update_event(&self, event: &Event) -> impl Future<Output = Result<Event, AppError>> + Send;

    fn delete_event(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Newest first.
    fn list_tasks(
        &self,
        filter: &TaskFilter,
    ) -> impl Future<Output = Result<Vec<Task>, AppError>> + Send;

    fn get_task(&self, id: &str) -> impl Future<Output = Result<Option<Task>, AppError>> + Send;

    fn insert_task(&self, task: &Task) -> impl Future<Output = Result<Task, AppError>> + Send;

    fn update_task(&self, task: &Task) -> impl Future<Output = Result<Task, AppError>> + Send;

    fn delete_task(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Insert or replace the reminder of a task.
    fn upsert_task_reminder(
        &self,
        reminder: &TaskReminder,
    ) -> impl Future<Output = Result<TaskReminder, AppError>> + Send;

    /// Newest first.
    fn list_volunteers(&self) -> impl Future<Output = Result<Vec<Volunteer>, AppError>> + Send;

    fn get_volunteer(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Volunteer>, AppError>> + Send;

    fn insert_volunteer(
        &self,
        volunteer: &Volunteer,
    ) -> impl Future<Output = Result<Volunteer, AppError>> + Send;

    fn delete_volunteer(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn count_volunteers(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Single query selecting exactly the volunteers accepted by [`VolunteerFilter::matches`].
    fn match_volunteers(
        &self,
        filter: &VolunteerFilter,
    ) -> impl Future<Output = Result<Vec<Volunteer>, AppError>> + Send;

    fn list_impact_metrics(
        &self,
        event_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<ImpactMetric>, AppError>> + Send;

    /// The first metric row recorded for an event.
    fn get_event_impact(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Option<ImpactMetric>, AppError>> + Send;

    fn insert_impact_metric(
        &self,
        metric: &ImpactMetric,
    ) -> impl Future<Output = Result<ImpactMetric, AppError>> + Send;

    fn delete_impact_metric(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// The store selected by configuration.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Rest(RestStore),
    Sqlite(SqliteStore),
}

/// Build the store described by `config`, running migrations for SQLite.
pub async fn open_store(config: &StoreConfig) -> Result<AnyStore, AppError> {
    match config {
        StoreConfig::Rest { url, service_key } => {
            Ok(AnyStore::Rest(RestStore::new(url, service_key)?))
        }
        StoreConfig::Sqlite { db_path } => {
            let pool = init_database(db_path).await?;
            Ok(AnyStore::Sqlite(SqliteStore::new(pool)))
        }
    }
}

impl Store for AnyStore {
    fn name(&self) -> &'static str {
        match self {
            AnyStore::Rest(store) => store.name(),
            AnyStore::Sqlite(store) => store.name(),
        }
    }

    async fn list_events(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        match self {
            AnyStore::Rest(store) => store.list_events(sort).await,
            AnyStore::Sqlite(store) => store.list_events(sort).await,
        }
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        match self {
            AnyStore::Rest(store) => store.get_event(id).await,
            AnyStore::Sqlite(store) => store.get_event(id).await,
        }
    }

    async fn insert_event(&self, event: &Event) -> Result<Event, AppError> {
        match self {
            AnyStore::Rest(store) => store.insert_event(event).await,
            AnyStore::Sqlite(store) => store.insert_event(event).await,
        }
    }

    async fn update_event(&self, event: &Event) -> Result<Event, AppError> {
        match self {
            AnyStore::Rest(store) => store.update_event(event).await,
            AnyStore::Sqlite(store) => store.update_event(event).await,
        }
    }

    async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        match self {
            AnyStore::Rest(store) => store.delete_event(id).await,
            AnyStore::Sqlite(store) => store.delete_event(id).await,
        }
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        match self {
            AnyStore::Rest(store) => store.list_tasks(filter).await,
            AnyStore::Sqlite(store) => store.list_tasks(filter).await,
        }
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, AppError> {
        match self {
            AnyStore::Rest(store) => store.get_task(id).await,
            AnyStore::Sqlite(store) => store.get_task(id).await,
        }
    }

    async fn insert_task(&self, task: &Task) -> Result<Task, AppError> {
        match self {
            AnyStore::Rest(store) => store.insert_task(task).await,
            AnyStore::Sqlite(store) => store.insert_task(task).await,
        }
    }

    async fn update_task(&self, task: &Task) -> Result<Task, AppError> {
        match self {
            AnyStore::Rest(store) => store.update_task(task).await,
            AnyStore::Sqlite(store) => store.update_task(task).await,
        }
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        match self {
            AnyStore::Rest(store) => store.delete_task(id).await,
            AnyStore::Sqlite(store) => store.delete_task(id).await,
        }
    }

    async fn upsert_task_reminder(&self, reminder: &TaskReminder) -> Result<TaskReminder, AppError> {
        match self {
            AnyStore::Rest(store) => store.upsert_task_reminder(reminder).await,
            AnyStore::Sqlite(store) => store.upsert_task_reminder(reminder).await,
        }
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, AppError> {
        match self {
            AnyStore::Rest(store) => store.list_volunteers().await,
            AnyStore::Sqlite(store) => store.list_volunteers().await,
        }
    }

    async fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>, AppError> {
        match self {
            AnyStore::Rest(store) => store.get_volunteer(id).await,
            AnyStore::Sqlite(store) => store.get_volunteer(id).await,
        }
    }

    async fn insert_volunteer(&self, volunteer: &Volunteer) -> Result<Volunteer, AppError> {
        match self {
            AnyStore::Rest(store) => store.insert_volunteer(volunteer).await,
            AnyStore::Sqlite(store) => store.insert_volunteer(volunteer).await,
        }
    }

    async fn delete_volunteer(&self, id: &str) -> Result<(), AppError> {
        match self {
            AnyStore::Rest(store) => store.delete_volunteer(id).await,
            AnyStore::Sqlite(store) => store.delete_volunteer(id).await,
        }
    }

    async fn count_volunteers(&self) -> Result<u64, AppError> {
        match self {
            AnyStore::Rest(store) => store.count_volunteers().await,
            AnyStore::Sqlite(store) => store.count_volunteers().await,
        }
    }

    async fn match_volunteers(&self, filter: &VolunteerFilter) -> Result<Vec<Volunteer>, AppError> {
        match self {
            AnyStore::Rest(store) => store.match_volunteers(filter).await,
            AnyStore::Sqlite(store) => store.match_volunteers(filter).await,
        }
    }

    async fn list_impact_metrics(
        &self,
        event_id: Option<&str>,
    ) -> Result<Vec<ImpactMetric>, AppError> {
        match self {
            AnyStore::Rest(store) => store.list_impact_metrics(event_id).await,
            AnyStore::Sqlite(store) => store.list_impact_metrics(event_id).await,
        }
    }

    async fn get_event_impact(&self, event_id: &str) -> Result<Option<ImpactMetric>, AppError> {
        match self {
            AnyStore::Rest(store) => store.get_event_impact(event_id).await,
            AnyStore::Sqlite(store) => store.get_event_impact(event_id).await,
        }
    }

    async fn insert_impact_metric(&self, metric: &ImpactMetric) -> Result<ImpactMetric, AppError> {
        match self {
            AnyStore::Rest(store) => store.insert_impact_metric(metric).await,
            AnyStore::Sqlite(store) => store.insert_impact_metric(metric).await,
        }
    }

    async fn delete_impact_metric(&self, id: &str) -> Result<(), AppError> {
        match self {
            AnyStore::Rest(store) => store.delete_impact_metric(id).await,
            AnyStore::Sqlite(store) => store.delete_impact_metric(id).await,
        }
    }
}
