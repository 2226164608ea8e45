pub mod buddy;
pub mod notification;
pub mod sample;
pub mod task;

pub use buddy::Buddy;
pub use notification::{NotificationCategory, NotificationContext, NotificationRecord};
pub use sample::{ActivityLabel, Sample};
pub use task::{TaskEntry, TaskTracker};
