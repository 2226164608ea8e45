pub mod activity;

pub use activity::{ActivityLogEntry, DailySummary};
