//! Registered test scenarios

pub mod customer;
pub mod manager;

use futures::future::BoxFuture;

use crate::error::E2eResult;
use crate::lifecycle::{TestContext, TestInfo};

/// Body of a scenario, run against a context that has passed setup
pub type ScenarioFn = for<'a> fn(&'a TestContext) -> BoxFuture<'a, E2eResult<()>>;

/// One registered test case
#[derive(Clone)]
pub struct Scenario {
    pub info: TestInfo,
    pub enabled: bool,
    pub body: ScenarioFn,
}

impl Scenario {
    pub fn new(info: TestInfo, body: ScenarioFn) -> Self {
        Self {
            info,
            enabled: true,
            body,
        }
    }

    /// Keep the scenario registered but report it as skipped
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("info", &self.info)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Every scenario in run order: manager flows first, then customer flows
pub fn all() -> Vec<Scenario> {
    let mut scenarios = manager::scenarios();
    scenarios.extend(customer::scenarios());
    scenarios
}
