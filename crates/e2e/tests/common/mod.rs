//! Scripted browser session for lifecycle and runner tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use xyzbank_common::Settings;
use xyzbank_e2e::error::{E2eError, E2eResult};
use xyzbank_e2e::failure::FailureCapture;
use xyzbank_e2e::pages::customer;
use xyzbank_e2e::report::{AttachmentSink, DiagnosticAttachment};
use xyzbank_e2e::{BrowserSession, SessionFactory, TestFailure, TestInfo, TestListener};

pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// What the fake page shows and what happened to it
#[derive(Debug, Default)]
pub struct FakeState {
    pub created: usize,
    pub closes: usize,
    /// Every session call in order, e.g. `click:<selector>`
    pub calls: Vec<String>,
    pub texts: HashMap<String, String>,
    pub lists: HashMap<String, Vec<String>>,
    pub hidden: HashSet<String>,
    pub alerts: VecDeque<String>,
    pub fail_create: bool,
    pub fail_goto: bool,
    /// Panic inside the next `goto`, then behave normally
    pub panic_goto: bool,
    pub fail_screenshot: bool,
}

impl FakeState {
    /// Script a logged-in customer page whose balance never changes
    pub fn customer_account(&mut self, name: &str, balance: i64) {
        self.texts.insert(customer::WELCOME_NAME.to_string(), name.to_string());
        self.texts.insert(customer::FORM_SUBMIT.to_string(), "Deposit".to_string());
        self.texts.insert(
            customer::MESSAGE.to_string(),
            customer::DEPOSIT_SUCCESS.to_string(),
        );
        self.lists.insert(
            customer::ACCOUNT_INFO.to_string(),
            vec!["1004".to_string(), balance.to_string(), "Dollar".to_string()],
        );
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

pub type SharedState = Arc<Mutex<FakeState>>;

pub struct FakeSession {
    state: SharedState,
}

impl FakeSession {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(format!("goto:{}", url));
        let panic_now = std::mem::take(&mut self.state.lock().panic_goto);
        if panic_now {
            panic!("driver crashed during navigation");
        }
        if self.state.lock().fail_goto {
            return Err(E2eError::Timeout(format!("navigation to {}", url)));
        }
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        Ok(!self.state.lock().hidden.contains(selector))
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.record(format!("click:{}", selector));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.record(format!("fill:{}={}", selector, text));
        Ok(())
    }

    async fn select_by_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.record(format!("select:{}={}", selector, text));
        Ok(())
    }

    async fn text(&self, selector: &str) -> E2eResult<String> {
        self.state
            .lock()
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| E2eError::ElementNotFound(selector.to_string()))
    }

    async fn texts(&self, selector: &str) -> E2eResult<Vec<String>> {
        Ok(self.state.lock().lists.get(selector).cloned().unwrap_or_default())
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        Ok(self.state.lock().lists.get(selector).map_or(0, Vec::len))
    }

    async fn take_alert(&self) -> E2eResult<Option<String>> {
        Ok(self.state.lock().alerts.pop_front())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.record("screenshot".to_string());
        if self.state.lock().fail_screenshot {
            return Err(E2eError::Timeout("screenshot".to_string()));
        }
        Ok(PNG_MAGIC.to_vec())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.record("close".to_string());
        self.state.lock().closes += 1;
        Ok(())
    }
}

pub struct FakeFactory {
    pub state: SharedState,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            state: SharedState::default(),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn create(&self) -> E2eResult<Box<dyn BrowserSession>> {
        let mut state = self.state.lock();
        state.created += 1;
        if state.fail_create {
            return Err(E2eError::Setup("chromium failed to launch".to_string()));
        }
        Ok(Box::new(FakeSession::new(self.state.clone())))
    }
}

/// Settings with short waits, writing results into `dir`
pub fn settings(dir: &Path) -> Arc<Settings> {
    Arc::new(Settings {
        base_url: "http://bank.test/#/login".to_string(),
        headless: true,
        implicit_wait: Duration::from_millis(100),
        explicit_wait: Duration::from_millis(300),
        page_load_timeout: Duration::from_secs(1),
        maximize_window: false,
        screenshot_on_failure: true,
        results_dir: dir.to_path_buf(),
    })
}

#[derive(Default)]
pub struct RecordingSink {
    pub attachments: Mutex<Vec<DiagnosticAttachment>>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<String> {
        self.attachments.lock().iter().map(|a| a.name.clone()).collect()
    }
}

impl AttachmentSink for RecordingSink {
    fn attach(&self, attachment: DiagnosticAttachment) -> E2eResult<()> {
        self.attachments.lock().push(attachment);
        Ok(())
    }
}

/// Sink whose every write fails
pub struct FailingSink;

impl AttachmentSink for FailingSink {
    fn attach(&self, attachment: DiagnosticAttachment) -> E2eResult<()> {
        Err(E2eError::Attachment(format!("{}: disk full", attachment.name)))
    }
}

/// Sink that panics on every write
pub struct PanickingSink;

impl AttachmentSink for PanickingSink {
    fn attach(&self, attachment: DiagnosticAttachment) -> E2eResult<()> {
        panic!("sink exploded writing {}", attachment.name);
    }
}

/// Listener that logs each callback as `<event>:<test>`
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<String>>,
}

impl TestListener for RecordingListener {
    fn on_test_start(&self, info: &TestInfo) {
        self.events.lock().push(format!("start:{}", info.name));
    }

    fn on_test_success(&self, info: &TestInfo) {
        self.events.lock().push(format!("success:{}", info.name));
    }

    fn on_test_failure(
        &self,
        info: &TestInfo,
        failure: &TestFailure,
        _capture: &mut dyn FailureCapture,
    ) {
        self.events
            .lock()
            .push(format!("failure:{}:{}", info.name, failure.kind));
    }

    fn on_test_broken(&self, info: &TestInfo, _error: &E2eError) {
        self.events.lock().push(format!("broken:{}", info.name));
    }

    fn on_test_skipped(&self, info: &TestInfo) {
        self.events.lock().push(format!("skipped:{}", info.name));
    }
}
