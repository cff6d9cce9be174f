//! Per-test lifecycle
//!
//! Every test runs through one [`TestContext`]:
//!
//! ```text
//! INIT ──► RUNNING ──► PASSED ─┐
//!   │                  FAILED ─┴──► TEARDOWN ──► DONE
//!   └── setup error ───────────────►
//! ```
//!
//! Teardown always runs. When the test failed it attaches the error
//! overview and a screenshot taken from the still-live session, then it
//! destroys the session whether or not those attachments succeeded.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info, warn};
use xyzbank_common::Settings;

use crate::error::{E2eError, E2eResult};
use crate::failure::{FailureCapture, TestFailure};
use crate::pages::Pages;
use crate::report::{AttachmentSink, DiagnosticAttachment};
use crate::session::{BrowserSession, SessionFactory, SessionHandle};

pub const ERROR_OVERVIEW: &str = "Error overview";
pub const FAILURE_SCREENSHOT: &str = "Failure screenshot";

/// Identity of one test, supplied by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestInfo {
    /// Grouping the test belongs to, e.g. `CustomerTests`
    pub suite: String,
    pub name: String,
    pub tags: Vec<String>,
}

impl TestInfo {
    pub fn new(suite: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }
}

/// Lifecycle phase of a test context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running,
    Passed,
    Failed,
    Teardown,
    Done,
}

/// State owned by one running test
pub struct TestContext {
    info: TestInfo,
    settings: Arc<Settings>,
    phase: Phase,
    failed: bool,
    last_failure: Option<TestFailure>,
    session: SessionHandle,
}

impl TestContext {
    pub fn new(info: TestInfo, settings: Arc<Settings>) -> Self {
        Self {
            info,
            settings,
            phase: Phase::Init,
            failed: false,
            last_failure: None,
            session: SessionHandle::default(),
        }
    }

    pub fn info(&self) -> &TestInfo {
        &self.info
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn last_failure(&self) -> Option<&TestFailure> {
        self.last_failure.as_ref()
    }

    /// Whether a browser session is currently held
    pub fn has_session(&self) -> bool {
        self.session.is_live()
    }

    /// The live browser session
    pub fn session(&self) -> E2eResult<&dyn BrowserSession> {
        self.session
            .get()
            .ok_or_else(|| E2eError::Setup("no live browser session".to_string()))
    }

    /// Page objects bound to the live session
    pub fn pages(&self) -> E2eResult<Pages<'_>> {
        Ok(Pages::new(self.session()?, self.settings.explicit_wait))
    }

    fn enter(&mut self, phase: Phase) {
        debug!(test = %self.info.full_name(), "{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// INIT: clear failure state, start a session and open the application.
    ///
    /// The session is stored before navigating so a failed navigation
    /// still leaves it for teardown to destroy.
    pub async fn setup(&mut self, factory: &dyn SessionFactory) -> E2eResult<()> {
        self.failed = false;
        self.last_failure = None;
        self.enter(Phase::Init);

        self.session = SessionHandle::new(factory.create().await?);

        let url = self.settings.base_url.clone();
        self.session()?.goto(&url).await.map_err(|e| {
            E2eError::Setup(format!("Navigation to {} failed: {}", url, e))
        })?;

        self.enter(Phase::Running);
        Ok(())
    }

    /// Record how the test body ended
    pub fn finish_body(&mut self, passed: bool) {
        self.enter(if passed { Phase::Passed } else { Phase::Failed });
    }

    /// TEARDOWN: attach diagnostics for a failed test, then destroy the
    /// session unconditionally.
    pub async fn teardown(&mut self, sink: &dyn AttachmentSink) {
        self.enter(Phase::Teardown);

        if self.failed {
            let captured = AssertUnwindSafe(self.capture_diagnostics(sink))
                .catch_unwind()
                .await;
            if captured.is_err() {
                warn!(test = %self.info.full_name(), "Diagnostic capture panicked");
            }
        }

        self.session.destroy().await;
        self.enter(Phase::Done);
        info!(test = %self.info.full_name(), "Teardown complete");
    }

    /// Attach the error overview and a screenshot. Errors are logged only.
    async fn capture_diagnostics(&self, sink: &dyn AttachmentSink) {
        match &self.last_failure {
            Some(failure) => {
                let overview = DiagnosticAttachment::text(ERROR_OVERVIEW, failure.overview());
                if let Err(e) = sink.attach(overview) {
                    warn!(test = %self.info.full_name(), "Could not attach error overview: {}", e);
                }
            }
            None => warn!(test = %self.info.full_name(), "Test failed without a recorded failure"),
        }

        if !self.settings.screenshot_on_failure {
            return;
        }

        let Some(session) = self.session.get() else {
            debug!("No live session to screenshot");
            return;
        };

        match session.screenshot().await {
            Ok(png) => {
                if let Err(e) = sink.attach(DiagnosticAttachment::png(FAILURE_SCREENSHOT, png)) {
                    warn!(test = %self.info.full_name(), "Could not attach screenshot: {}", e);
                }
            }
            Err(e) => warn!(test = %self.info.full_name(), "Could not take screenshot: {}", e),
        }
    }
}

impl FailureCapture for TestContext {
    fn set_test_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    fn set_last_failure(&mut self, failure: TestFailure) {
        self.last_failure = Some(failure);
    }
}
