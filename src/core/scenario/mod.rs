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

//! Scenario model
//!
//! A [`Scenario`] is one conformance test case, resolved against a
//! [`DutProfile`]: every name has been checked against the profile's
//! vocabulary, every address against its memory depth, and every field the
//! profile declares has a value (explicit or a zero default).
//!
//! Scenarios are built from [`ScenarioRecord`]s, the sparse on-disk shape:
//!
//! ```text
//! ScenarioRecord (sparse, names as written)
//!        │  Scenario::from_record(record, profile, policy)
//!        ▼
//! Scenario
//!   ├── InitialState   every INITIAL field + memory pairs
//!   ├── Schedule       logical clock -> full input vector
//!   └── ExpectedState  every CHECKED field as (value, explicit) + memory
//! ```
//!
//! The [`ExpectationPolicy`] decides which expected fields the verifier
//! actually compares.

use crate::core::error::{BenchError, Result};
use crate::core::memory::AddressSpace;
use crate::core::signal::{DutProfile, FieldDef, FieldRoles, Port};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub mod record;

#[cfg(test)]
mod tests;

pub use record::{
    ExpectedRecord, GroupRecord, InitialRecord, ScenarioRecord, ScheduleRecord, SuiteRecord,
};

/// Which expected fields take part in verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectationPolicy {
    /// Every declared field is compared; unspecified fields must be zero
    #[default]
    Dense,
    /// Only fields present in the scenario source are compared
    Sparse,
}

impl ExpectationPolicy {
    /// Whether a field is compared given whether the scenario named it
    #[inline(always)]
    pub fn compares(self, explicit: bool) -> bool {
        match self {
            ExpectationPolicy::Dense => true,
            ExpectationPolicy::Sparse => explicit,
        }
    }
}

/// A value together with whether the scenario source named it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue {
    pub value: u32,
    pub explicit: bool,
}

impl FieldValue {
    pub fn explicit(value: u32) -> Self {
        Self {
            value,
            explicit: true,
        }
    }

    pub fn default_zero() -> Self {
        Self {
            value: 0,
            explicit: false,
        }
    }
}

/// One resolved field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub field: FieldDef,
    pub value: FieldValue,
}

/// Resolve a sparse `name -> value` map for one port
///
/// Every field of `port` carrying `role` gets an entry (zero when absent);
/// names outside that vocabulary and values wider than their field are
/// configuration errors.
fn resolve_port(
    profile: &DutProfile,
    port: Port,
    role: FieldRoles,
    given: &BTreeMap<String, u32>,
) -> Result<Vec<FieldEntry>> {
    for (name, &value) in given {
        let field = profile
            .field(port, name)
            .filter(|field| field.roles.contains(role))
            .ok_or_else(|| BenchError::UnknownField {
                profile: profile.name.clone(),
                port,
                name: name.clone(),
            })?;
        if value & !field.mask() != 0 {
            return Err(BenchError::ValueTooWide {
                port,
                name: name.clone(),
                value,
                bits: field.bits,
            });
        }
    }

    Ok(profile
        .fields_with(port, role)
        .map(|field| FieldEntry {
            field: field.clone(),
            value: given
                .get(&field.name)
                .map_or_else(FieldValue::default_zero, |&v| FieldValue::explicit(v)),
        })
        .collect())
}

fn check_memory(profile: &DutProfile, pairs: &[(u32, u8)]) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }
    let depth = profile
        .memory_depth()
        .ok_or_else(|| BenchError::NoMemory(profile.name.clone()))?;
    match pairs.iter().find(|(addr, _)| *addr as usize >= depth) {
        Some(&(address, _)) => Err(BenchError::AddressOutOfRange { address, depth }),
        None => Ok(()),
    }
}

/// State loaded through the privileged path before the first cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitialState {
    /// Every INITIAL field of the profile, in declaration order
    pub fields: Vec<FieldEntry>,
    /// Sparse memory image, later pairs win
    pub memory: Vec<(u32, u8)>,
}

/// Input vector applied at one logical clock count
pub type InputVector = Vec<(String, u32)>;

/// Logical clock count -> input vector, exact-match lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    entries: BTreeMap<u64, InputVector>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the vector for `clock`
    pub fn insert(&mut self, clock: u64, inputs: InputVector) {
        self.entries.insert(clock, inputs);
    }

    /// Vector scheduled for exactly `clock`
    #[inline(always)]
    pub fn at(&self, clock: u64) -> Option<&[(String, u32)]> {
        self.entries.get(&clock).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending clock order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[(String, u32)])> {
        self.entries
            .iter()
            .map(|(&clock, inputs)| (clock, inputs.as_slice()))
    }
}

/// End-of-scenario snapshot the DUT is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedState {
    pub policy: ExpectationPolicy,
    /// Every CHECKED field of the profile, in declaration order
    pub fields: Vec<FieldEntry>,
    /// Sparse expected memory; `None` when the source gave none
    pub memory: Option<Vec<(u32, u8)>>,
    /// Depth of the DUT's memory, `None` for memoryless profiles
    pub memory_depth: Option<usize>,
}

impl ExpectedState {
    /// Fields the verifier compares under the policy
    pub fn compared(&self) -> impl Iterator<Item = &FieldEntry> {
        let policy = self.policy;
        self.fields
            .iter()
            .filter(move |entry| policy.compares(entry.value.explicit))
    }

    /// Expected memory image on a zero base, or `None` if memory is skipped
    ///
    /// Dense expectations treat a missing image as "all zero"; sparse ones
    /// skip the memory comparison entirely.
    pub fn memory_image(&self) -> Option<AddressSpace> {
        let depth = self.memory_depth?;
        match (&self.memory, self.policy) {
            (Some(pairs), _) => Some(AddressSpace::from_pairs(depth, pairs)),
            (None, ExpectationPolicy::Dense) => Some(AddressSpace::new(depth)),
            (None, ExpectationPolicy::Sparse) => None,
        }
    }
}

/// One resolved conformance test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub comment: Option<String>,
    /// Clock cycles to run after reset
    pub cycles: u32,
    /// Pixel capture file, relative to the runner's capture directory
    pub capture: Option<PathBuf>,
    pub initial: InitialState,
    pub schedule: Schedule,
    pub expected: ExpectedState,
}

impl Scenario {
    /// Resolve a record against a profile
    ///
    /// # Arguments
    ///
    /// * `record` - Sparse scenario as read from a suite file
    /// * `profile` - Vocabulary and memory depth to check against
    /// * `policy` - Expectation policy of the scenario population
    ///
    /// # Errors
    ///
    /// Configuration errors only: unknown or misplaced field names, values
    /// wider than their field, memory pairs for a memoryless profile, and
    /// addresses beyond the memory depth.
    pub fn from_record(
        record: &ScenarioRecord,
        profile: &DutProfile,
        policy: ExpectationPolicy,
    ) -> Result<Self> {
        let mut initial_fields = Vec::new();
        for (port, given) in [
            (Port::Input, &record.initial.inputs),
            (Port::Output, &record.initial.outputs),
            (Port::Register, &record.initial.registers),
        ] {
            initial_fields.extend(resolve_port(profile, port, FieldRoles::INITIAL, given)?);
        }
        check_memory(profile, &record.initial.memory)?;

        // Entries sharing a clock are merged, later fields win
        let mut explicit: BTreeMap<u64, BTreeMap<String, u32>> = BTreeMap::new();
        for entry in &record.schedule {
            explicit
                .entry(entry.clock)
                .or_default()
                .extend(entry.inputs.iter().map(|(k, &v)| (k.clone(), v)));
        }
        let mut schedule = Schedule::new();
        for (clock, given) in &explicit {
            let vector = resolve_port(profile, Port::Input, FieldRoles::SCHEDULED, given)?
                .into_iter()
                .map(|entry| (entry.field.name, entry.value.value))
                .collect();
            schedule.insert(*clock, vector);
        }

        let mut expected_fields =
            resolve_port(profile, Port::Output, FieldRoles::CHECKED, &record.expected.outputs)?;
        expected_fields.extend(resolve_port(
            profile,
            Port::Register,
            FieldRoles::CHECKED,
            &record.expected.registers,
        )?);
        if let Some(pairs) = &record.expected.memory {
            check_memory(profile, pairs)?;
        }

        Ok(Self {
            name: record.name.clone(),
            comment: record.comment.clone(),
            cycles: record.cycles,
            capture: record.capture.as_ref().map(PathBuf::from),
            initial: InitialState {
                fields: initial_fields,
                memory: record.initial.memory.clone(),
            },
            schedule,
            expected: ExpectedState {
                policy,
                fields: expected_fields,
                memory: record.expected.memory.clone(),
                memory_depth: profile.memory_depth(),
            },
        })
    }
}

/// Named group of scenarios, run in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestGroup {
    pub name: String,
    pub scenarios: Vec<Scenario>,
}

impl TestGroup {
    /// Resolve every scenario of a group record
    ///
    /// Fails on the first scenario that does not resolve; the runner uses
    /// [`Scenario::from_record`] directly when it needs per-scenario errors.
    pub fn from_record(
        record: &GroupRecord,
        profile: &DutProfile,
        policy: ExpectationPolicy,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        let mut scenarios = Vec::with_capacity(record.scenarios.len());
        for scenario in &record.scenarios {
            if !names.insert(scenario.name.as_str()) {
                log::warn!(
                    "Group '{}' declares scenario '{}' twice",
                    record.name,
                    scenario.name
                );
            }
            scenarios.push(Scenario::from_record(scenario, profile, policy)?);
        }
        Ok(Self {
            name: record.name.clone(),
            scenarios,
        })
    }
}
