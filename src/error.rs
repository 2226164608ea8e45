//! Error taxonomy for the sampling loop and its collaborators.
//!
//! Component seams (capture, classification transport, SMS delivery,
//! persistence, roster edits) report a [`SnitchError`]. Application glue
//! stays on `anyhow` and attaches context on the way up.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnitchError {
    /// The capturer could not produce an image this cycle.
    #[error("screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// The classification service was unreachable or answered with an error.
    #[error("classification service error: {0}")]
    ClassificationTransport(String),

    /// A single recipient could not be reached.
    #[error("delivery to {contact} failed: {message}")]
    DeliveryFailure { contact: String, message: String },

    /// Writing to settings or the activity log failed.
    #[error("persistence write failed: {0}")]
    PersistenceWrite(String),

    #[error("a buddy with contact '{0}' already exists")]
    DuplicateBuddy(String),

    #[error("no buddy with contact '{0}'")]
    UnknownBuddy(String),
}

impl SnitchError {
    pub fn delivery(contact: impl Into<String>, message: impl Into<String>) -> Self {
        SnitchError::DeliveryFailure {
            contact: contact.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SnitchError {
    fn from(err: reqwest::Error) -> Self {
        SnitchError::ClassificationTransport(err.to_string())
    }
}

pub type Result<T, E = SnitchError> = std::result::Result<T, E>;
