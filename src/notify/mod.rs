mod desktop;
mod escalator;
mod gateway;
mod messages;
mod notifier;
mod sink;

pub use desktop::DesktopSink;
pub use escalator::{Escalator, DEFAULT_ESCALATION_INTERVAL};
pub use gateway::{MessageGateway, TwilioGateway, UnconfiguredGateway};
pub use messages::{canned_message, MessageGenerator};
pub use notifier::{Notifier, DEFAULT_MIN_INTERVAL, MAX_RECORDS};
pub use sink::{ChannelSink, CoreEvent, LogSink, NotificationSink};
