use anyhow::Context as _;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;

use crate::error::{Result, SnitchError};

use super::VisionService;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llava:latest";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const START_POLL_ATTEMPTS: u32 = 5;
const START_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    #[serde(default)]
    name: String,
}

/// Local Ollama server running a vision-capable model.
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn is_installed(&self) -> bool {
        let locator = if cfg!(windows) { "where" } else { "which" };
        tokio::process::Command::new(locator)
            .arg("ollama")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn model_listed(&self, tags: &TagsResponse) -> bool {
        let family = self.model.split(':').next().unwrap_or(&self.model);
        tags.models.iter().any(|tag| tag.name.starts_with(family))
    }
}

#[async_trait]
impl VisionService for OllamaClient {
    async fn ready(&self) -> bool {
        let response = match self.http.get(self.endpoint("tags")).send().await {
            Ok(response) if response.status().is_success() => response,
            _ => return false,
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) if !self.model_listed(&tags) => {
                warn!(
                    "Ollama is up but model {} is not pulled; run 'ollama pull {}'",
                    self.model, self.model
                );
            }
            Ok(_) => {}
            Err(err) => warn!("could not read Ollama model list: {err}"),
        }
        // Reachable is enough; a missing model surfaces as a generate error.
        true
    }

    async fn ensure_started(&self) -> bool {
        if self.ready().await {
            return true;
        }

        if !self.is_installed().await {
            warn!("Ollama is not installed; screen classification will report errors");
            return false;
        }

        info!("Ollama not reachable at {}, launching 'ollama serve'", self.base_url);
        if let Err(err) = tokio::process::Command::new("ollama")
            .arg("serve")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            error!("failed to launch Ollama: {err}");
            return false;
        }

        for _ in 0..START_POLL_ATTEMPTS {
            tokio::time::sleep(START_POLL_INTERVAL).await;
            if self.ready().await {
                info!("Ollama started, using model {}", self.model);
                return true;
            }
        }

        warn!(
            "Ollama did not become ready within {}s",
            START_POLL_ATTEMPTS as u64 * START_POLL_INTERVAL.as_secs()
        );
        false
    }

    async fn generate(&self, prompt: &str, image: Option<&[u8]>) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            images: image.map(|bytes| vec![STANDARD.encode(bytes)]).unwrap_or_default(),
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint("generate"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SnitchError::ClassificationTransport(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }
}
