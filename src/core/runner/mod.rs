// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scenario runner
//!
//! Runs groups of scenarios through one [`Testbench`] in order: reset, run,
//! verify, record. A scenario that cannot be resolved or run fails with a
//! diagnostic and the next one starts from a fresh reset; nothing stops the
//! suite early.

use crate::core::driver::Testbench;
use crate::core::error::Result;
use crate::core::scenario::{ExpectationPolicy, Scenario, SuiteRecord, TestGroup};
use crate::core::signal::Dut;
use crate::core::verifier::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[cfg(test)]
mod tests;

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    pub group: String,
    pub scenario: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.outcome.passed
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(f, "{} {}: {}", verdict, self.group, self.scenario)?;
        for diagnostic in &self.outcome.diagnostics {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}

/// Results of a whole suite
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub profile: String,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn new(profile: &str) -> Self {
        Self {
            started_at: Utc::now(),
            profile: profile.to_string(),
            results: Vec::new(),
        }
    }

    /// Append one scenario's outcome
    pub fn push(&mut self, group: &str, scenario: &str, outcome: Outcome) {
        let result = ScenarioResult {
            group: group.to_string(),
            scenario: scenario.to_string(),
            outcome,
        };
        if result.passed() {
            log::info!("PASS {}: {}", group, scenario);
        } else {
            log::warn!(
                "FAIL {}: {} ({} diagnostics)",
                group,
                scenario,
                result.outcome.diagnostics.len()
            );
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScenarioResult::passed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to `path`
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Wrote report to {}", path.as_ref().display());
        Ok(())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{}", result)?;
        }
        write!(
            f,
            "{}: {} passed, {} failed, {} total",
            self.profile,
            self.passed(),
            self.failed(),
            self.total()
        )
    }
}

/// Drives scenarios through a test bench
pub struct Runner<D: Dut> {
    bench: Testbench<D>,
}

impl<D: Dut> Runner<D> {
    pub fn new(bench: Testbench<D>) -> Self {
        Self { bench }
    }

    pub fn bench(&self) -> &Testbench<D> {
        &self.bench
    }

    pub fn bench_mut(&mut self) -> &mut Testbench<D> {
        &mut self.bench
    }

    /// Reset, run and verify one scenario
    ///
    /// Errors from reset or run become the scenario's only diagnostic.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> Outcome {
        let executed = self
            .bench
            .reset(scenario)
            .and_then(|()| self.bench.run(scenario));
        match executed {
            Ok(()) => self.bench.verifier().verify(&scenario.expected),
            Err(e) => {
                log::warn!("Scenario '{}' aborted: {}", scenario.name, e);
                Outcome::aborted(&e)
            }
        }
    }

    /// Run already-resolved groups
    pub fn run_groups(&mut self, groups: &[TestGroup]) -> SuiteReport {
        let mut report = SuiteReport::new(&self.bench.profile().name);
        for group in groups {
            log::info!("Group {} ({} scenarios)", group.name, group.scenarios.len());
            for scenario in &group.scenarios {
                let outcome = self.run_scenario(scenario);
                report.push(&group.name, &scenario.name, outcome);
            }
        }
        report
    }

    /// Resolve and run every scenario of a suite
    ///
    /// The suite's policy wins over the profile default. Scenarios that do
    /// not resolve against the profile fail with a configuration diagnostic.
    pub fn run_suite(&mut self, suite: &SuiteRecord) -> SuiteReport {
        let profile = self.bench.profile().clone();
        let policy: ExpectationPolicy = suite.policy.unwrap_or(profile.policy);
        if let Some(name) = suite.profile.as_deref() {
            if name != profile.name {
                log::warn!(
                    "Suite was written for profile '{}', running with '{}'",
                    name,
                    profile.name
                );
            }
        }
        log::info!(
            "Running {} scenarios on {} ({:?} expectations)",
            suite.scenario_count(),
            profile.name,
            policy
        );

        let mut report = SuiteReport::new(&profile.name);
        for group in &suite.groups {
            log::info!("Group {} ({} scenarios)", group.name, group.scenarios.len());
            for record in &group.scenarios {
                let outcome = match Scenario::from_record(record, &profile, policy) {
                    Ok(scenario) => self.run_scenario(&scenario),
                    Err(e) => {
                        log::warn!("Scenario '{}' rejected: {}", record.name, e);
                        Outcome::aborted(&e)
                    }
                };
                report.push(&group.name, &record.name, outcome);
            }
        }
        log::info!(
            "{}: {} passed, {} failed",
            profile.name,
            report.passed(),
            report.failed()
        );
        report
    }
}
