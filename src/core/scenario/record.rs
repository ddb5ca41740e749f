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

//! On-disk scenario records
//!
//! Suites are plain serde data, read from TOML or JSON depending on the file
//! extension. Everything is sparse: a record only names what it cares about.
//!
//! ```toml
//! policy = "dense"
//!
//! [[groups]]
//! name = "SEC"
//!
//! [[groups.scenarios]]
//! name = "set carry"
//! cycles = 2
//! initial.registers = { A = 0x11, X = 0x22, Y = 0x33, S = 0xef, P = 0x20 }
//! initial.memory = [[0x0000, 0x38]]
//! expected.outputs = { AB = 0x0002 }
//! expected.registers = { A = 0x11, X = 0x22, Y = 0x33, S = 0xef, P = 0x21, PC = 0x0002 }
//! expected.memory = [[0x0000, 0x38]]
//! ```

use super::ExpectationPolicy;
use crate::core::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A whole suite file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuiteRecord {
    /// Policy for every scenario in the suite; the profile default otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ExpectationPolicy>,

    /// Profile the suite was written for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub scenarios: Vec<ScenarioRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub cycles: u32,
    /// Pixel capture file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,
    #[serde(default)]
    pub initial: InitialRecord,
    #[serde(default)]
    pub schedule: Vec<ScheduleRecord>,
    #[serde(default)]
    pub expected: ExpectedRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitialRecord {
    #[serde(default)]
    pub inputs: BTreeMap<String, u32>,
    #[serde(default)]
    pub outputs: BTreeMap<String, u32>,
    #[serde(default)]
    pub registers: BTreeMap<String, u32>,
    #[serde(default)]
    pub memory: Vec<(u32, u8)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Logical clock count the inputs apply at
    pub clock: u64,
    #[serde(default)]
    pub inputs: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedRecord {
    #[serde(default)]
    pub outputs: BTreeMap<String, u32>,
    #[serde(default)]
    pub registers: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Vec<(u32, u8)>>,
}

impl SuiteRecord {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a suite, picking the format from the file extension
    ///
    /// # Errors
    ///
    /// `BenchError::Io` if the file cannot be read, `BenchError::Parse` for
    /// malformed content or an extension other than `.toml`/`.json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let suite = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => {
                return Err(BenchError::Parse(format!(
                    "unsupported suite format: {}",
                    path.display()
                )))
            }
        };
        log::debug!(
            "Loaded suite {} ({} groups, {} scenarios)",
            path.display(),
            suite.groups.len(),
            suite.scenario_count()
        );
        Ok(suite)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn scenario_count(&self) -> usize {
        self.groups.iter().map(|g| g.scenarios.len()).sum()
    }
}

impl ScenarioRecord {
    /// Empty record running `cycles` cycles
    pub fn new(name: &str, cycles: u32) -> Self {
        Self {
            name: name.to_string(),
            cycles,
            ..Default::default()
        }
    }

    pub fn initial_input(mut self, name: &str, value: u32) -> Self {
        self.initial.inputs.insert(name.to_string(), value);
        self
    }

    pub fn initial_output(mut self, name: &str, value: u32) -> Self {
        self.initial.outputs.insert(name.to_string(), value);
        self
    }

    pub fn initial_register(mut self, name: &str, value: u32) -> Self {
        self.initial.registers.insert(name.to_string(), value);
        self
    }

    pub fn initial_memory(mut self, addr: u32, value: u8) -> Self {
        self.initial.memory.push((addr, value));
        self
    }

    /// Schedule `inputs` at logical clock `clock`
    pub fn at(mut self, clock: u64, inputs: &[(&str, u32)]) -> Self {
        self.schedule.push(ScheduleRecord {
            clock,
            inputs: inputs
                .iter()
                .map(|&(name, value)| (name.to_string(), value))
                .collect(),
        });
        self
    }

    pub fn expect_output(mut self, name: &str, value: u32) -> Self {
        self.expected.outputs.insert(name.to_string(), value);
        self
    }

    pub fn expect_register(mut self, name: &str, value: u32) -> Self {
        self.expected.registers.insert(name.to_string(), value);
        self
    }

    pub fn expect_memory(mut self, addr: u32, value: u8) -> Self {
        self.expected.memory.get_or_insert_with(Vec::new).push((addr, value));
        self
    }

    pub fn capture(mut self, file: &str) -> Self {
        self.capture = Some(file.to_string());
        self
    }
}
