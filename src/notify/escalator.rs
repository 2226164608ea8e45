//! Accountability alerts ("snitch mode").
//!
//! When the user has been caught drifting, enabled buddies get a text
//! message. Alerts are rate-limited far more coarsely than on-screen
//! notifications, and an alert only counts as sent when at least one
//! buddy actually received it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{Result, SnitchError};
use crate::models::{Buddy, NotificationContext};
use crate::settings::SettingsStore;

use super::gateway::MessageGateway;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const DEFAULT_ESCALATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

struct EscalationState {
    enabled: bool,
    buddies: Vec<Buddy>,
    last_fired: Option<Instant>,
    min_interval: Duration,
}

pub struct Escalator {
    state: Mutex<EscalationState>,
    gateway: Arc<dyn MessageGateway>,
    settings: Arc<SettingsStore>,
}

impl Escalator {
    /// Roster and enabled flag start from what `settings` has persisted.
    pub fn new(gateway: Arc<dyn MessageGateway>, settings: Arc<SettingsStore>) -> Self {
        let persisted = settings.snapshot();
        Self {
            state: Mutex::new(EscalationState {
                enabled: persisted.snitch_mode_enabled,
                buddies: persisted.buddies,
                last_fired: None,
                min_interval: DEFAULT_ESCALATION_INTERVAL,
            }),
            gateway,
            settings,
        }
    }

    pub async fn set_min_interval(&self, interval: Duration) {
        self.state.lock().await.min_interval = interval;
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.enabled
    }

    pub async fn buddies(&self) -> Vec<Buddy> {
        self.state.lock().await.buddies.clone()
    }

    /// Text every enabled buddy if escalation is on and the cooldown has
    /// passed. Returns true only when at least one delivery succeeded; a
    /// total failure leaves the cooldown untouched so the next distraction
    /// retries.
    pub async fn maybe_escalate(&self, context: &NotificationContext) -> bool {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return false;
        }

        let recipients: Vec<Buddy> = state
            .buddies
            .iter()
            .filter(|buddy| buddy.enabled)
            .cloned()
            .collect();
        if recipients.is_empty() {
            return false;
        }

        if let Some(last) = state.last_fired {
            if last.elapsed() < state.min_interval {
                return false;
            }
        }

        let message = alert_text(context);
        let mut delivered = 0usize;
        for buddy in &recipients {
            match self.gateway.send(&buddy.contact, &message).await {
                Ok(()) => {
                    delivered += 1;
                    log_info!("accountability alert sent to {}", buddy.name);
                }
                Err(err) => log_warn!("accountability alert to {} failed: {err}", buddy.name),
            }
        }

        if delivered == 0 {
            log_error!(
                "accountability alert reached none of {} buddies; retrying on next distraction",
                recipients.len()
            );
            return false;
        }

        state.last_fired = Some(Instant::now());
        true
    }

    pub async fn add_buddy(&self, buddy: Buddy) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.buddies.iter().any(|b| b.contact == buddy.contact) {
            return Err(SnitchError::DuplicateBuddy(buddy.contact));
        }
        state.buddies.push(buddy);
        self.persist(&state)
    }

    pub async fn remove_buddy(&self, contact: &str) -> Result<Buddy> {
        let mut state = self.state.lock().await;
        let index = state
            .buddies
            .iter()
            .position(|b| b.contact == contact)
            .ok_or_else(|| SnitchError::UnknownBuddy(contact.to_string()))?;
        let removed = state.buddies.remove(index);
        self.persist(&state)?;
        Ok(removed)
    }

    /// Flip one buddy's `enabled` flag; returns the new value.
    pub async fn toggle_buddy(&self, contact: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let buddy = state
            .buddies
            .iter_mut()
            .find(|b| b.contact == contact)
            .ok_or_else(|| SnitchError::UnknownBuddy(contact.to_string()))?;
        buddy.enabled = !buddy.enabled;
        let enabled = buddy.enabled;
        self.persist(&state)?;
        Ok(enabled)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enabled = enabled;
        self.persist(&state)
    }

    fn persist(&self, state: &EscalationState) -> Result<()> {
        self.settings
            .update_accountability(state.enabled, state.buddies.clone())
            .map_err(|err| SnitchError::PersistenceWrite(format!("{err:#}")))
    }
}

fn alert_text(context: &NotificationContext) -> String {
    format!(
        "Snitch alert: your friend is supposed to be working on \"{}\" but was just caught {}. \
         Maybe send them a nudge?",
        context.task_or_default(),
        context.activity_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;

    struct Fixture {
        _dir: tempfile::TempDir,
        settings: Arc<SettingsStore>,
        gateway: Arc<FakeGateway>,
        escalator: Escalator,
    }

    fn fixture(gateway: FakeGateway) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        let gateway = Arc::new(gateway);
        let escalator = Escalator::new(gateway.clone(), settings.clone());
        Fixture {
            _dir: dir,
            settings,
            gateway,
            escalator,
        }
    }

    fn context() -> NotificationContext {
        NotificationContext::new(Some("thesis".into()), "watching videos")
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_or_empty_roster_never_sends() {
        let f = fixture(FakeGateway::default());
        assert!(!f.escalator.maybe_escalate(&context()).await);

        f.escalator.set_enabled(true).await.unwrap();
        assert!(!f.escalator.maybe_escalate(&context()).await);
        assert_eq!(f.gateway.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn snitch_mode_off_ignores_an_enabled_roster() {
        let f = fixture(FakeGateway::default());
        f.escalator.add_buddy(Buddy::new("Ana", "+15550000001")).await.unwrap();
        f.escalator.set_enabled(false).await.unwrap();

        assert!(f.escalator.buddies().await.iter().all(|buddy| buddy.enabled));
        assert!(!f.escalator.maybe_escalate(&context()).await);
        assert_eq!(f.gateway.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_still_counts_and_starts_cooldown() {
        let f = fixture(FakeGateway::failing_for(&["+15550000002"]));
        f.escalator.add_buddy(Buddy::new("Ana", "+15550000001")).await.unwrap();
        f.escalator.add_buddy(Buddy::new("Ben", "+15550000002")).await.unwrap();
        f.escalator.set_enabled(true).await.unwrap();

        assert!(f.escalator.maybe_escalate(&context()).await);
        let sent = f.gateway.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+15550000001");
        assert!(sent[0].1.contains("thesis") && sent[0].1.contains("watching videos"));

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        assert!(!f.escalator.maybe_escalate(&context()).await);
        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        assert!(f.escalator.maybe_escalate(&context()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_is_retried_next_time() {
        let f = fixture(FakeGateway::default());
        f.escalator.add_buddy(Buddy::new("Ana", "+15550000001")).await.unwrap();
        f.escalator.set_enabled(true).await.unwrap();

        f.gateway.set_fail_all(true);
        assert!(!f.escalator.maybe_escalate(&context()).await);

        f.gateway.set_fail_all(false);
        assert!(f.escalator.maybe_escalate(&context()).await);
        assert_eq!(f.gateway.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_buddies_are_skipped() {
        let f = fixture(FakeGateway::default());
        f.escalator.add_buddy(Buddy::new("Ana", "+15550000001")).await.unwrap();
        f.escalator.set_enabled(true).await.unwrap();

        assert!(!f.escalator.toggle_buddy("+15550000001").await.unwrap());
        assert!(!f.escalator.maybe_escalate(&context()).await);
        assert_eq!(f.gateway.sent_count(), 0);
    }

    #[tokio::test]
    async fn roster_edits_are_validated_and_persisted() {
        let f = fixture(FakeGateway::default());
        f.escalator.add_buddy(Buddy::new("Ana", "+15550000001")).await.unwrap();

        let dup = f.escalator.add_buddy(Buddy::new("Other", "+15550000001")).await;
        assert!(matches!(dup, Err(SnitchError::DuplicateBuddy(_))));

        let missing = f.escalator.remove_buddy("+15559999999").await;
        assert!(matches!(missing, Err(SnitchError::UnknownBuddy(_))));

        f.escalator.set_enabled(true).await.unwrap();
        let reloaded = SettingsStore::new(f.settings.path().to_path_buf()).unwrap().snapshot();
        assert!(reloaded.snitch_mode_enabled);
        assert_eq!(reloaded.buddies, vec![Buddy::new("Ana", "+15550000001")]);

        let removed = f.escalator.remove_buddy("+15550000001").await.unwrap();
        assert_eq!(removed.name, "Ana");
        assert!(f.settings.snapshot().buddies.is_empty());
    }

    #[tokio::test]
    async fn roster_loads_from_persisted_settings() {
        let f = fixture(FakeGateway::default());
        f.settings
            .update_accountability(true, vec![Buddy::new("Cy", "+15550000003")])
            .unwrap();

        let escalator = Escalator::new(f.gateway.clone(), f.settings.clone());
        assert!(escalator.is_enabled().await);
        assert_eq!(escalator.buddies().await.len(), 1);
    }
}
