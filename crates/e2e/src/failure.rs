//! Failure records and the failure-capture contract

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as _;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::E2eError;

/// What went wrong in one failed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFailure {
    pub test_name: String,

    /// Error category, e.g. `AssertionFailure`
    pub kind: String,

    pub message: String,

    pub stack_trace: String,
}

impl TestFailure {
    /// Record a failure returned from a test body
    pub fn from_error(test_name: &str, error: &E2eError) -> Self {
        let mut trace = format!("{}: {}", error.kind(), error);
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push_str(&format!("\ncaused by: {}", cause));
            source = cause.source();
        }

        Self {
            test_name: test_name.to_string(),
            kind: error.kind().to_string(),
            message: error.detail(),
            stack_trace: trace,
        }
    }

    /// Record a panic raised inside a test body
    pub fn from_panic(test_name: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        Self {
            test_name: test_name.to_string(),
            kind: "Panic".to_string(),
            message,
            stack_trace: take_panic_trace().unwrap_or_else(|| "<no backtrace captured>".to_string()),
        }
    }

    /// Text of the "Error overview" attachment
    pub fn overview(&self) -> String {
        format!(
            "Test: {}\nError: {}\nMessage: {}\n\nStack trace:\n{}\n",
            self.test_name, self.kind, self.message, self.stack_trace
        )
    }
}

/// Capability a failure observer needs from a running test.
///
/// Observers write through this trait so one observer serves every test.
pub trait FailureCapture {
    fn set_test_failed(&mut self, failed: bool);

    fn set_last_failure(&mut self, failure: TestFailure);
}

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Chains a hook that keeps the location and backtrace of the most recent
/// panic on each thread. The previous hook still runs.
static PANIC_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "<unknown>".to_string());
        let trace = format!("panicked at {}\n{}", location, Backtrace::force_capture());
        LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(trace));
        previous(info);
    }));
});

/// Install the panic capture hook. Later calls do nothing.
pub fn install_panic_capture() {
    Lazy::force(&PANIC_HOOK);
}

fn take_panic_trace() -> Option<String> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}
