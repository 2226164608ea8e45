use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDate};

use crate::models::ActivityLabel;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Local))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_label(value: &str) -> Result<ActivityLabel> {
    ActivityLabel::parse(value).ok_or_else(|| anyhow!("unknown activity label {value}"))
}
