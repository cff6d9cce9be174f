//! XYZ Bank E2E Test Framework
//!
//! This crate drives the XYZ Bank demo application through a real browser:
//! - Creates one Chromium session per test over the DevTools protocol
//! - Wraps each application view in a page object with bounded waits
//! - Runs every test through a lifecycle that always releases its session
//! - Writes Allure result and attachment files for the CI report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                  │
//! │    ├── preflight() -> app reachable?                        │
//! │    ├── run_scenario(scenario) -> TestResult                 │
//! │    │     ├── TestContext::setup(factory)                    │
//! │    │     ├── body(&ctx) against Pages                       │
//! │    │     ├── listeners: FailureRecorder, LogListener, ...   │
//! │    │     └── TestContext::teardown(report entry)            │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenarios                                                   │
//! │    ├── BankManagerTests: add / search / open / delete       │
//! │    └── CustomerTests: login / deposit / withdraw / ...      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserSession (trait)  <──  ChromiumSession (CDP)         │
//! │  AllureWriter            ──►  <uuid>-result.json, ...       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod chromium;
pub mod error;
pub mod expect;
pub mod failure;
pub mod lifecycle;
pub mod listener;
pub mod pages;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod session;

pub use error::{E2eError, E2eResult};
pub use failure::{FailureCapture, TestFailure};
pub use lifecycle::{TestContext, TestInfo};
pub use listener::{FailureRecorder, LogListener, TestListener};
pub use report::{AllureWriter, ExecutorInfo, RunMetadata, TestStatus};
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use scenarios::Scenario;
pub use session::{BrowserSession, SessionFactory, SessionHandle};
