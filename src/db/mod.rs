mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{ActivityLogEntry, DailySummary};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Result, SnitchError};
use crate::models::Sample;

/// Durable record of classified samples. Writes are best-effort from the
/// sampling loop's point of view.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, sample: &Sample, task: Option<&str>) -> Result<()>;

    async fn daily_summary(&self, day: NaiveDate) -> Result<DailySummary>;
}

#[async_trait]
impl ActivityLog for Database {
    async fn append(&self, sample: &Sample, task: Option<&str>) -> Result<()> {
        self.append_sample(sample, task)
            .await
            .map_err(|err| SnitchError::PersistenceWrite(format!("{err:#}")))
    }

    async fn daily_summary(&self, day: NaiveDate) -> Result<DailySummary> {
        self.summarize_day(day)
            .await
            .map_err(|err| SnitchError::PersistenceWrite(format!("{err:#}")))
    }
}
