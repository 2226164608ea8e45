mod ollama;
mod parse;

pub use ollama::{OllamaClient, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
pub use parse::{parse_response, ParsedResponse};

use async_trait::async_trait;
use std::sync::Arc;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::error::Result;
use crate::models::{ActivityLabel, Sample};
use crate::sensing::ImageSample;
use crate::utils::truncate_chars;
use crate::{log_info, log_warn};

/// The service does not expose a usable score, so every successful parse
/// carries this value. Treat it as advisory.
pub const CLASSIFIED_CONFIDENCE: f64 = 0.8;

pub const ERROR_DESCRIPTION: &str = "error analyzing screen";

const CLASSIFY_PROMPT: &str = "\
Analyze this screenshot of my computer screen. What activity am I doing?
Is it productive work or a distraction? Please be specific about what you see.

First, determine if the activity is 'productive' or 'distracting'.
Then, provide a brief specific description of the activity you see.

Respond in plain text with a concise answer in this format:
ACTIVITY TYPE: [productive/distracting]
ACTIVITY: [brief description of what you see]
REASONING: [brief explanation of why you classified it this way]";

/// Text-generation backend able to look at an image.
///
/// Also used without an image to phrase notification messages.
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Cheap reachability probe. Never starts anything.
    async fn ready(&self) -> bool;

    /// Probe, and if the service is down try to bring it up.
    async fn ensure_started(&self) -> bool;

    async fn generate(&self, prompt: &str, image: Option<&[u8]>) -> Result<String>;
}

pub struct Classifier {
    service: Arc<dyn VisionService>,
}

impl Classifier {
    pub fn new(service: Arc<dyn VisionService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> Arc<dyn VisionService> {
        Arc::clone(&self.service)
    }

    pub async fn ready(&self) -> bool {
        self.service.ready().await
    }

    pub async fn ensure_started(&self) -> bool {
        self.service.ensure_started().await
    }

    /// Classify one capture. Transport failures come back as an `error`
    /// sample; this never fails and never retries.
    pub async fn classify(&self, image: &ImageSample) -> Sample {
        match self.service.generate(CLASSIFY_PROMPT, Some(&image.bytes)).await {
            Ok(response) => {
                log_info!("classifier response: {}...", truncate_chars(&response, 100));
                let parsed = parse_response(&response);
                Sample::new(
                    parsed.label,
                    parsed.description,
                    CLASSIFIED_CONFIDENCE,
                    parsed.reasoning,
                )
            }
            Err(err) => {
                log_warn!("screen classification failed: {err}");
                Sample::new(ActivityLabel::Error, ERROR_DESCRIPTION, 0.0, format!("Error: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeVisionService;

    fn image() -> ImageSample {
        ImageSample::new(vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn classifies_structured_answer() {
        let service = Arc::new(FakeVisionService::answering(
            "ACTIVITY TYPE: distracting\nACTIVITY: watching videos\nREASONING: video site in focus",
        ));
        let classifier = Classifier::new(service.clone());

        let sample = classifier.classify(&image()).await;
        assert_eq!(sample.label, ActivityLabel::Distracting);
        assert_eq!(sample.description, "watching videos");
        assert_eq!(sample.reasoning, "video site in focus");
        assert_eq!(sample.confidence, CLASSIFIED_CONFIDENCE);
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_sample() {
        let service = Arc::new(FakeVisionService::unreachable());
        let classifier = Classifier::new(service.clone());

        let sample = classifier.classify(&image()).await;
        assert_eq!(sample.label, ActivityLabel::Error);
        assert_eq!(sample.description, ERROR_DESCRIPTION);
        assert_eq!(sample.confidence, 0.0);
        assert!(sample.reasoning.contains("connection refused"));
        // classify must not try to launch the service itself
        assert_eq!(service.start_count(), 0);
        assert_eq!(service.generate_count(), 1);
    }
}
