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

//! Test bench configuration
//!
//! Read from a TOML file, then overridden by environment variables (which
//! may come from a `.env` file loaded by the binary):
//!
//! ```toml
//! [bench]
//! profile = "riot"
//! policy = "dense"
//! step_order = "evaluate-apply-evaluate"
//! half_period = 1
//!
//! [output]
//! trace = "riot.trace"
//! capture_dir = "screens"
//! json_report = "report.json"
//! ```
//!
//! | Variable                 | Overrides             |
//! |--------------------------|-----------------------|
//! | `CYCLEBENCH_PROFILE`     | `bench.profile`       |
//! | `CYCLEBENCH_TRACE`       | `output.trace`        |
//! | `CYCLEBENCH_CAPTURE_DIR` | `output.capture_dir`  |

use crate::core::driver::{SignalTracer, StepOrder, Testbench};
use crate::core::error::{BenchError, Result};
use crate::core::runner::SuiteReport;
use crate::core::scenario::ExpectationPolicy;
use crate::core::signal::{Dut, DutProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PROFILE_ENV: &str = "CYCLEBENCH_PROFILE";
pub const TRACE_ENV: &str = "CYCLEBENCH_TRACE";
pub const CAPTURE_DIR_ENV: &str = "CYCLEBENCH_CAPTURE_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub bench: BenchSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSection {
    /// Built-in profile name
    pub profile: String,
    /// Custom profile file, wins over `profile`
    pub profile_file: Option<PathBuf>,
    pub policy: Option<ExpectationPolicy>,
    pub step_order: Option<StepOrder>,
    pub half_period: Option<u32>,
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            profile: "mpu".to_string(),
            profile_file: None,
            policy: None,
            step_order: None,
            half_period: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub trace: Option<PathBuf>,
    pub capture_dir: Option<PathBuf>,
    pub json_report: Option<PathBuf>,
}

impl BenchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BenchError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loading configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(profile) = lookup(PROFILE_ENV) {
            log::debug!("{} overrides profile with '{}'", PROFILE_ENV, profile);
            self.bench.profile = profile;
            self.bench.profile_file = None;
        }
        if let Some(trace) = lookup(TRACE_ENV) {
            self.output.trace = Some(PathBuf::from(trace));
        }
        if let Some(dir) = lookup(CAPTURE_DIR_ENV) {
            self.output.capture_dir = Some(PathBuf::from(dir));
        }
    }

    /// Effective profile with the configured overrides applied
    ///
    /// # Errors
    ///
    /// `BenchError::UnknownProfile` for an unknown built-in name, I/O or
    /// parse errors for a profile file, `BenchError::InvalidProfile` if the
    /// overrides make the profile inconsistent.
    pub fn resolve_profile(&self) -> Result<DutProfile> {
        let mut profile = match &self.bench.profile_file {
            Some(path) => DutProfile::load(path)?,
            None => DutProfile::builtin(&self.bench.profile)?,
        };
        if let Some(policy) = self.bench.policy {
            profile.policy = policy;
        }
        if let Some(order) = self.bench.step_order {
            profile.step_order = order;
        }
        if let Some(half_period) = self.bench.half_period {
            profile.clock.half_period = half_period;
        }
        profile.validate()?;
        Ok(profile)
    }

    /// Apply the bench and output settings to a test bench
    ///
    /// Opens the trace file when `output.trace` is set, points capture
    /// file names at `output.capture_dir` and applies `bench.step_order`.
    ///
    /// # Errors
    ///
    /// I/O errors from creating the trace file.
    pub fn configure<D: Dut>(&self, bench: &mut Testbench<D>) -> Result<()> {
        if let Some(path) = &self.output.trace {
            bench.set_tracer(Box::new(SignalTracer::create(path)?));
        }
        bench.set_capture_dir(self.output.capture_dir.clone());
        if let Some(order) = self.bench.step_order {
            bench.set_step_order(order);
        }
        Ok(())
    }

    /// Write the report to `output.json_report`, if set
    ///
    /// Returns whether a report was written.
    pub fn save_report(&self, report: &SuiteReport) -> Result<bool> {
        match &self.output.json_report {
            Some(path) => {
                report.save_json(path)?;
                log::info!("Report written to {}", path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
