use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{day_key, parse_datetime, parse_label},
    models::{ActivityLogEntry, DailySummary},
};
use crate::models::Sample;

impl Database {
    pub async fn append_sample(&self, sample: &Sample, task: Option<&str>) -> Result<()> {
        let record = sample.clone();
        let task = task.map(str::to_string);
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO activity_log (id, day, timestamp, label, description, confidence, reasoning, task)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    day_key(record.timestamp.date_naive()),
                    record.timestamp.to_rfc3339(),
                    record.label.as_str(),
                    record.description,
                    record.confidence,
                    record.reasoning,
                    task,
                ],
            )
            .with_context(|| "failed to insert activity sample")?;
            Ok(())
        })
        .await
    }

    /// Samples for one local day, oldest first.
    pub async fn samples_for_day(&self, day: NaiveDate) -> Result<Vec<ActivityLogEntry>> {
        let key = day_key(day);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, label, description, confidence, reasoning, task
                 FROM activity_log
                 WHERE day = ?1
                 ORDER BY timestamp ASC",
            )?;

            let mut rows = stmt.query(params![key])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                entries.push(ActivityLogEntry {
                    sample: Sample {
                        id: Uuid::parse_str(&id)
                            .with_context(|| format!("invalid sample id {id}"))?,
                        timestamp: parse_datetime(&row.get::<_, String>(1)?, "timestamp")?,
                        label: parse_label(&row.get::<_, String>(2)?)?,
                        description: row.get(3)?,
                        confidence: row.get(4)?,
                        reasoning: row.get(5)?,
                    },
                    task: row.get(6)?,
                });
            }
            Ok(entries)
        })
        .await
    }

    pub async fn summarize_day(&self, day: NaiveDate) -> Result<DailySummary> {
        let key = day_key(day);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT label, COUNT(*) FROM activity_log WHERE day = ?1 GROUP BY label",
            )?;

            let mut rows = stmt.query(params![key])?;
            let mut summary = DailySummary::empty(day);
            while let Some(row) = rows.next()? {
                let label = parse_label(&row.get::<_, String>(0)?)?;
                let count: i64 = row.get(1)?;
                summary.add(label, usize::try_from(count).unwrap_or(0));
            }
            Ok(summary)
        })
        .await
    }
}
