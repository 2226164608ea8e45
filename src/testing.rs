//! Hand-written fakes for the collaborator traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::classifier::VisionService;
use crate::db::{ActivityLog, DailySummary};
use crate::error::{Result, SnitchError};
use crate::models::{NotificationCategory, Sample};
use crate::notify::{MessageGateway, NotificationSink};
use crate::sensing::{Capturer, ImageSample};

/// Scripted vision service: pops queued replies, then repeats `fallback`.
pub struct FakeVisionService {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    stall: Mutex<Option<std::time::Duration>>,
    pub generate_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
}

impl FakeVisionService {
    pub fn answering(reply: &str) -> Self {
        Self::with_fallback(Some(reply.to_string()))
    }

    pub fn unreachable() -> Self {
        Self::with_fallback(None)
    }

    fn with_fallback(fallback: Option<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            stall: Mutex::new(None),
            generate_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reply: Result<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// The next `generate` call sleeps for `delay` before answering.
    pub fn stall_next(&self, delay: std::time::Duration) {
        *self.stall.lock().unwrap() = Some(delay);
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionService for FakeVisionService {
    async fn ready(&self) -> bool {
        self.fallback.is_some()
    }

    async fn ensure_started(&self) -> bool {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.fallback.is_some()
    }

    async fn generate(&self, _prompt: &str, _image: Option<&[u8]>) -> Result<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let stall = self.stall.lock().unwrap().take();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .ok_or_else(|| SnitchError::ClassificationTransport("connection refused".into()))
    }
}

/// Returns a tiny JPEG-looking payload; the first `fail_first` calls fail.
#[derive(Default)]
pub struct FakeCapturer {
    pub calls: AtomicUsize,
    fail_first: usize,
}

impl FakeCapturer {
    pub fn failing_first(fail_first: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capturer for FakeCapturer {
    async fn capture(&self) -> Result<ImageSample> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(SnitchError::CaptureUnavailable("display asleep".into()));
        }
        Ok(ImageSample::new(vec![0xFF, 0xD8, 0xFF, 0xD9]))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub notifications: Mutex<Vec<(String, NotificationCategory)>>,
    pub statuses: Mutex<Vec<String>>,
    pub activities: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl NotificationSink for RecordingSink {
    fn on_notification(&self, message: &str, category: NotificationCategory) {
        self.notifications
            .lock()
            .unwrap()
            .push((message.to_string(), category));
    }

    fn on_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn on_activity(&self, text: &str) {
        self.activities.lock().unwrap().push(text.to_string());
    }
}

/// Records every delivery; contacts listed in `failing` are rejected.
#[derive(Default)]
pub struct FakeGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    failing: Vec<String>,
    fail_all: AtomicBool,
}

impl FakeGateway {
    pub fn failing_for(contacts: &[&str]) -> Self {
        Self {
            failing: contacts.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageGateway for FakeGateway {
    async fn send(&self, contact: &str, text: &str) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) || self.failing.iter().any(|c| c == contact) {
            return Err(SnitchError::delivery(contact, "carrier rejected message"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((contact.to_string(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeActivityLog {
    pub entries: Mutex<Vec<(Sample, Option<String>)>>,
    pub fail_writes: AtomicBool,
}

impl FakeActivityLog {
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl ActivityLog for FakeActivityLog {
    async fn append(&self, sample: &Sample, task: Option<&str>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnitchError::PersistenceWrite("disk full".into()));
        }
        self.entries
            .lock()
            .unwrap()
            .push((sample.clone(), task.map(str::to_string)));
        Ok(())
    }

    async fn daily_summary(&self, day: NaiveDate) -> Result<DailySummary> {
        let entries = self.entries.lock().unwrap();
        let mut summary = DailySummary::empty(day);
        for (sample, _) in entries.iter().filter(|(s, _)| s.timestamp.date_naive() == day) {
            summary.count(sample.label);
        }
        Ok(summary)
    }
}
