//! Suite runner that drives scenarios through the test lifecycle

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use xyzbank_common::Settings;

use crate::chromium::ChromiumFactory;
use crate::error::{E2eError, E2eResult};
use crate::failure::{install_panic_capture, TestFailure};
use crate::lifecycle::{TestContext, TestInfo};
use crate::listener::{FailureRecorder, TestListener};
use crate::preflight;
use crate::report::{AllureWriter, ReportEntry, StatusDetails, TestStatus};
use crate::scenarios::{self, Scenario};
use crate::session::SessionFactory;

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub suite: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub attachments: usize,
}

/// Result of running a list of tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub broken: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    /// Whether no test failed or broke
    pub fn success(&self) -> bool {
        self.failed == 0 && self.broken == 0
    }
}

/// Main E2E test runner
pub struct TestRunner {
    /// Resolved settings, shared with every test context
    settings: Arc<Settings>,

    /// Creates one browser session per test
    factory: Arc<dyn SessionFactory>,

    /// Outcome observers, notified in registration order
    listeners: Vec<Arc<dyn TestListener>>,

    /// Report result writer
    writer: AllureWriter,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a runner that drives real Chromium sessions
    pub fn new(settings: Arc<Settings>) -> E2eResult<Self> {
        let factory = Arc::new(ChromiumFactory::new(settings.clone()));
        Self::with_factory(settings, factory)
    }

    /// Create a runner with a custom session factory
    pub fn with_factory(
        settings: Arc<Settings>,
        factory: Arc<dyn SessionFactory>,
    ) -> E2eResult<Self> {
        install_panic_capture();

        let output_dir = settings.results_dir.clone();
        Ok(Self {
            writer: AllureWriter::new(&output_dir)?,
            settings,
            factory,
            listeners: vec![Arc::new(FailureRecorder)],
            output_dir,
        })
    }

    /// Add an outcome observer after the ones already registered
    pub fn register_listener(&mut self, listener: Arc<dyn TestListener>) {
        self.listeners.push(listener);
    }

    /// Check the application answers before any browser is started
    pub async fn preflight(&self, limit: Duration) -> E2eResult<()> {
        preflight::wait_for_app(&self.settings.base_url, limit).await
    }

    /// Run every registered scenario
    pub async fn run_all(&self) -> TestSuiteResult {
        self.run_scenarios(&scenarios::all()).await
    }

    /// Run scenarios carrying a tag. A tag no scenario carries is an error.
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let filtered: Vec<Scenario> = scenarios::all()
            .into_iter()
            .filter(|s| s.info.tags.iter().any(|t| t == tag))
            .collect();
        if filtered.is_empty() {
            return Err(E2eError::UnknownTag(tag.to_string()));
        }
        Ok(self.run_scenarios(&filtered).await)
    }

    /// Run a specific scenario by name or `suite.name`
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let scenario = scenarios::all()
            .into_iter()
            .find(|s| s.info.name == name || s.info.full_name() == name)
            .ok_or_else(|| E2eError::UnknownTest(name.to_string()))?;

        Ok(self.run_scenario(&scenario).await)
    }

    /// Run a list of scenarios one after another
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> TestSuiteResult {
        let start = Instant::now();
        let mut suite = TestSuiteResult {
            total: scenarios.len(),
            ..Default::default()
        };

        info!("Running {} test(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            match result.status {
                TestStatus::Passed => {
                    suite.passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                }
                TestStatus::Failed | TestStatus::Broken => {
                    if result.status == TestStatus::Failed {
                        suite.failed += 1;
                    } else {
                        suite.broken += 1;
                    }
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                TestStatus::Skipped => {
                    suite.skipped += 1;
                    info!("- {} (skipped)", result.name);
                }
            }
            suite.results.push(result);
        }

        suite.duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} broken, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.broken, suite.skipped, suite.duration_ms
        );

        suite
    }

    /// Run one scenario through setup, body and teardown.
    ///
    /// Never fails: every outcome, including a setup error or a panic in
    /// setup or the body, ends up in the returned result and the report entry.
    pub async fn run_scenario(&self, scenario: &Scenario) -> TestResult {
        let info = &scenario.info;
        let full_name = info.full_name();
        let start = Instant::now();
        let entry = self.writer.begin(info);

        if !scenario.enabled {
            for listener in &self.listeners {
                listener.on_test_skipped(info);
            }
            return self.complete(entry, info, TestStatus::Skipped, None, start);
        }

        debug!("Running test: {}", full_name);
        for listener in &self.listeners {
            listener.on_test_start(info);
        }

        let mut ctx = TestContext::new(info.clone(), self.settings.clone());

        let setup = AssertUnwindSafe(ctx.setup(self.factory.as_ref()))
            .catch_unwind()
            .await;
        let setup = match setup {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err((TestFailure::from_error(&full_name, &e), e)),
            Err(payload) => {
                let failure = TestFailure::from_panic(&full_name, payload);
                let e = E2eError::Setup(format!("setup panicked: {}", failure.message));
                Err((failure, e))
            }
        };
        let (status, details) = match setup {
            Err((failure, e)) => {
                for listener in &self.listeners {
                    listener.on_test_broken(info, &e);
                }
                (TestStatus::Broken, Some(status_details(&failure)))
            }
            Ok(()) => {
                let outcome = AssertUnwindSafe((scenario.body)(&ctx))
                    .catch_unwind()
                    .await;
                let failure = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(TestFailure::from_error(&full_name, &e)),
                    Err(payload) => Some(TestFailure::from_panic(&full_name, payload)),
                };
                ctx.finish_body(failure.is_none());

                match failure {
                    None => {
                        for listener in &self.listeners {
                            listener.on_test_success(info);
                        }
                        (TestStatus::Passed, None)
                    }
                    Some(failure) => {
                        for listener in &self.listeners {
                            listener.on_test_failure(info, &failure, &mut ctx);
                        }
                        (TestStatus::Failed, Some(status_details(&failure)))
                    }
                }
            }
        };

        ctx.teardown(&entry).await;
        self.complete(entry, info, status, details, start)
    }

    fn complete(
        &self,
        entry: ReportEntry,
        info: &TestInfo,
        status: TestStatus,
        details: Option<StatusDetails>,
        start: Instant,
    ) -> TestResult {
        let attachments = entry.attachment_count();
        let error = details.as_ref().map(|d| d.message.clone());

        if let Err(e) = self.writer.finish(entry, status, details) {
            error!(test = %info.full_name(), "Could not write report result: {}", e);
        }

        TestResult {
            name: info.full_name(),
            suite: info.suite.clone(),
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            error,
            attachments,
        }
    }

    /// Write the suite summary to `test-results.json`
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn status_details(failure: &TestFailure) -> StatusDetails {
    StatusDetails {
        message: failure.message.clone(),
        trace: failure.stack_trace.clone(),
    }
}
