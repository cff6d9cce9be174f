//! Test outcome listeners

use tracing::{error, info, warn};

use crate::error::E2eError;
use crate::failure::{FailureCapture, TestFailure};
use crate::lifecycle::TestInfo;

/// Observer of test outcomes, registered on the runner.
///
/// Every method defaults to a no-op.
pub trait TestListener: Send + Sync {
    fn on_test_start(&self, _info: &TestInfo) {}

    fn on_test_success(&self, _info: &TestInfo) {}

    /// The body returned an error or panicked. `capture` is the failing
    /// test's context.
    fn on_test_failure(
        &self,
        _info: &TestInfo,
        _failure: &TestFailure,
        _capture: &mut dyn FailureCapture,
    ) {
    }

    /// Setup failed before the body ran
    fn on_test_broken(&self, _info: &TestInfo, _error: &E2eError) {}

    fn on_test_skipped(&self, _info: &TestInfo) {}
}

/// Marks the failing context and hands it the failure record for teardown
#[derive(Debug, Default)]
pub struct FailureRecorder;

impl TestListener for FailureRecorder {
    fn on_test_failure(
        &self,
        _info: &TestInfo,
        failure: &TestFailure,
        capture: &mut dyn FailureCapture,
    ) {
        capture.set_test_failed(true);
        capture.set_last_failure(failure.clone());
    }
}

/// Logs each outcome
#[derive(Debug, Default)]
pub struct LogListener;

impl TestListener for LogListener {
    fn on_test_start(&self, info: &TestInfo) {
        info!(test = %info.full_name(), "Starting");
    }

    fn on_test_success(&self, info: &TestInfo) {
        info!(test = %info.full_name(), "✓ Passed");
    }

    fn on_test_failure(
        &self,
        info: &TestInfo,
        failure: &TestFailure,
        _capture: &mut dyn FailureCapture,
    ) {
        error!(test = %info.full_name(), kind = %failure.kind, "✗ {}", failure.message);
    }

    fn on_test_broken(&self, info: &TestInfo, error: &E2eError) {
        error!(test = %info.full_name(), "✗ Broken: {}", error);
    }

    fn on_test_skipped(&self, info: &TestInfo) {
        warn!(test = %info.full_name(), "Skipped (disabled)");
    }
}
