use anyhow::Context as _;
use async_trait::async_trait;
use log::info;
use std::time::Duration;

use crate::error::{Result, SnitchError};

const TWILIO_API_BASE: &str = "https://api.twilio.com";
const SEND_TIMEOUT_SECS: u64 = 15;

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_FROM_NUMBER: &str = "TWILIO_PHONE_NUMBER";

/// Outbound text-message channel used for accountability alerts.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, contact: &str, text: &str) -> Result<()>;
}

pub struct TwilioGateway {
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
    http: reqwest::Client,
}

impl TwilioGateway {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build HTTP client")?;

        Ok(Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base: TWILIO_API_BASE.to_string(),
            http,
        })
    }

    /// `None` unless all three Twilio variables are set and non-empty.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let var = |key: &str| std::env::var(key).ok().filter(|value| !value.trim().is_empty());

        match (var(ENV_ACCOUNT_SID), var(ENV_AUTH_TOKEN), var(ENV_FROM_NUMBER)) {
            (Some(sid), Some(token), Some(from)) => {
                info!("Twilio gateway configured, sending from {from}");
                Self::new(sid, token, from).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl MessageGateway for TwilioGateway {
    async fn send(&self, contact: &str, text: &str) -> Result<()> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", contact), ("From", self.from_number.as_str()), ("Body", text)])
            .send()
            .await
            .map_err(|err| SnitchError::delivery(contact, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SnitchError::delivery(
                contact,
                format!("Twilio returned {status}: {body}"),
            ));
        }
        Ok(())
    }
}

/// Stand-in when no SMS credentials are configured. Every send fails, so
/// escalation never records a successful alert.
pub struct UnconfiguredGateway;

#[async_trait]
impl MessageGateway for UnconfiguredGateway {
    async fn send(&self, contact: &str, _text: &str) -> Result<()> {
        Err(SnitchError::delivery(contact, "no SMS gateway configured"))
    }
}
