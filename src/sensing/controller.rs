use log::{error, info, warn};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{sensing_loop, LoopComponents, LoopConfig, NotifyGate};

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

struct RunningLoop {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

#[derive(Default)]
struct LoopSlot {
    active: Option<RunningLoop>,
    /// A cancelled loop that outlived the stop timeout.
    draining: Option<JoinHandle<()>>,
}

impl LoopSlot {
    fn busy(&mut self) -> bool {
        if self.draining.as_ref().is_some_and(JoinHandle::is_finished) {
            self.draining = None;
        }
        self.draining.is_some()
            || self
                .active
                .as_ref()
                .is_some_and(|active| !active.handle.is_finished())
    }
}

/// Owns the background sampling task. At most one runs at a time, including
/// a stopped loop that is still finishing its last cycle.
pub struct Scheduler {
    components: Arc<LoopComponents>,
    config: StdMutex<LoopConfig>,
    running: Mutex<LoopSlot>,
    last_notified: NotifyGate,
}

impl Scheduler {
    pub fn new(components: Arc<LoopComponents>, config: LoopConfig) -> Self {
        Self {
            components,
            config: StdMutex::new(config),
            running: Mutex::new(LoopSlot::default()),
            last_notified: NotifyGate::default(),
        }
    }

    pub fn components(&self) -> &Arc<LoopComponents> {
        &self.components
    }

    /// Takes effect on the next `start`.
    pub fn set_config(&self, config: LoopConfig) {
        match self.config.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    fn config(&self) -> LoopConfig {
        match self.config.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns false if a loop is running or a stopped one has not exited yet.
    pub async fn start(&self) -> bool {
        let mut slot = self.running.lock().await;
        if slot.busy() {
            return false;
        }

        let config = self.config();
        info!(
            "starting sampling loop (every {:?}, notifications at most every {:?})",
            config.monitoring_interval, config.notification_interval
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(
            Arc::clone(&self.components),
            config,
            self.last_notified.clone(),
            cancel_token.clone(),
        ));

        slot.active = Some(RunningLoop {
            handle,
            cancel_token,
        });
        true
    }

    /// Cancel the loop and wait briefly for it. A cycle stuck in I/O is
    /// left to finish on its own and blocks `start` until it does. Returns
    /// false if nothing was running.
    pub async fn stop(&self) -> bool {
        let mut slot = self.running.lock().await;
        let Some(mut active) = slot.active.take() else {
            return false;
        };

        active.cancel_token.cancel();
        let joined = tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut active.handle).await;
        match joined {
            Ok(Ok(())) => info!("sampling loop stopped"),
            Ok(Err(err)) => error!("sampling loop task failed to join: {err}"),
            Err(_) => {
                warn!(
                    "sampling loop did not stop within {:?}; detaching",
                    STOP_JOIN_TIMEOUT
                );
                slot.draining = Some(active.handle);
            }
        }
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}
