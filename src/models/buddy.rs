use serde::{Deserialize, Serialize};

/// Accountability recipient. Identified by `contact` (an E.164 phone number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Buddy {
    pub name: String,
    pub contact: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Buddy {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
            enabled: true,
        }
    }
}
