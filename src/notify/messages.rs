use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::classifier::VisionService;
use crate::models::{NotificationCategory, NotificationContext};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_warn};

const MIN_MESSAGE_CHARS: usize = 5;
const MAX_MESSAGE_CHARS: usize = 150;

const DISTRACTED_LINES: &[&str] = &[
    "That doesn't look like {task}. Just saying.",
    "Is {activity} part of {task}? Bold strategy.",
    "Your future self called. They want you back on {task}.",
    "Fascinating. Now close it and get back to {task}.",
    "{activity} will still be there later. {task} won't finish itself.",
    "I'm not mad, I'm just disappointed. Back to {task}.",
    "Caught you. {task}, now.",
    "Pretty sure {activity} isn't on today's list.",
];

const PRODUCTIVE_LINES: &[&str] = &[
    "Look at you, actually working on {task}.",
    "Nice focus on {task}. Keep it rolling.",
    "Solid progress. {task} is lucky to have you.",
    "Who is this focused person? Keep going.",
];

const REMINDER_LINES: &[&str] = &[
    "Quick check-in: how is {task} going?",
    "Reminder: {task} is still waiting for you.",
    "Stretch, sip some water, then back to {task}.",
];

/// Picks the text for a notification: a personalized line from the vision
/// service when one is configured and answers sensibly, otherwise a canned
/// line for the category.
#[derive(Clone, Default)]
pub struct MessageGenerator {
    service: Option<Arc<dyn VisionService>>,
}

impl MessageGenerator {
    pub fn new(service: Arc<dyn VisionService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    pub fn canned_only() -> Self {
        Self { service: None }
    }

    pub async fn generate(
        &self,
        category: NotificationCategory,
        context: &NotificationContext,
    ) -> String {
        if let Some(service) = &self.service {
            let prompt = personalized_prompt(category, context);
            match service.generate(&prompt, None).await {
                Ok(reply) => match acceptable(&reply) {
                    Some(message) => return message,
                    None => log_debug!("discarding implausible message: {reply:?}"),
                },
                Err(err) => log_warn!("personalized message failed, using canned line: {err}"),
            }
        }
        canned_message(category, context)
    }
}

pub fn canned_message(category: NotificationCategory, context: &NotificationContext) -> String {
    let lines = match category {
        NotificationCategory::Distracted => DISTRACTED_LINES,
        NotificationCategory::Productive => PRODUCTIVE_LINES,
        NotificationCategory::Reminder => REMINDER_LINES,
    };
    let template = lines
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Back to {task}.");
    template
        .replace("{task}", context.task_or_default())
        .replace("{activity}", context.activity_or_default())
}

fn personalized_prompt(category: NotificationCategory, context: &NotificationContext) -> String {
    let task = context.task_or_default();
    let activity = context.activity_or_default();
    match category {
        NotificationCategory::Distracted => format!(
            "Write one short, sassy but friendly sentence telling someone to get back to work. \
             They should be working on \"{task}\" but are currently {activity}. \
             Reply with the sentence only."
        ),
        NotificationCategory::Productive => format!(
            "Write one short, upbeat sentence praising someone for focusing on \"{task}\". \
             Reply with the sentence only."
        ),
        NotificationCategory::Reminder => format!(
            "Write one short, friendly sentence reminding someone to keep working on \"{task}\". \
             Reply with the sentence only."
        ),
    }
}

/// Trimmed, unquoted reply if its length is plausible for a notification.
fn acceptable(reply: &str) -> Option<String> {
    let message = reply.trim().trim_matches('"').trim();
    let chars = message.chars().count();
    (chars > MIN_MESSAGE_CHARS && chars < MAX_MESSAGE_CHARS).then(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnitchError;
    use crate::testing::FakeVisionService;

    fn context() -> NotificationContext {
        NotificationContext::new(Some("quarterly report".into()), "watching videos")
    }

    #[test]
    fn canned_lines_fill_placeholders() {
        for _ in 0..20 {
            let message = canned_message(NotificationCategory::Distracted, &context());
            assert!(!message.contains('{'), "unfilled template: {message}");
        }
    }

    #[test]
    fn canned_lines_fall_back_without_task() {
        let context = NotificationContext::new(None, "");
        for _ in 0..20 {
            let message = canned_message(NotificationCategory::Reminder, &context);
            assert!(message.contains("your task"), "{message}");
        }
    }

    #[tokio::test]
    async fn uses_personalized_reply_of_plausible_length() {
        let service = Arc::new(FakeVisionService::answering(
            "\"The report misses you. The videos do not.\"",
        ));
        let generator = MessageGenerator::new(service);
        let message = generator
            .generate(NotificationCategory::Distracted, &context())
            .await;
        assert_eq!(message, "The report misses you. The videos do not.");
    }

    #[tokio::test]
    async fn implausible_or_failed_reply_falls_back_to_canned() {
        let service = Arc::new(FakeVisionService::unreachable());
        service.push(Ok("ok".into()));
        service.push(Ok("x".repeat(200)));
        service.push(Err(SnitchError::ClassificationTransport("down".into())));
        let generator = MessageGenerator::new(service.clone());

        for _ in 0..3 {
            let message = generator
                .generate(NotificationCategory::Productive, &context())
                .await;
            assert!(message.chars().count() < MAX_MESSAGE_CHARS);
            assert_ne!(message, "ok");
        }
        assert_eq!(service.generate_count(), 3);
    }
}
