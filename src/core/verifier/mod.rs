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

//! End-of-scenario verification
//!
//! The [`Verifier`] borrows the DUT and the external store read-only and
//! compares them against an [`ExpectedState`]. Every compared field is
//! checked with exact equality and every mismatch is recorded; nothing stops
//! at the first difference.
//!
//! Diagnostics print the way a hardware engineer reads them, with the hex
//! width following the field width:
//!
//! ```text
//! error: P register (expected 0x21, actual 0x20)
//! error: AB (expected 0x0002, actual 0x0001)
//! error: address 0x0010 (expected 0x5a, actual 0x00)
//! ```

use crate::core::error::BenchError;
use crate::core::memory::AddressSpace;
use crate::core::scenario::ExpectedState;
use crate::core::signal::{Dut, DutProfile, MemoryBinding, Port};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

#[cfg(test)]
mod tests;

/// One reason a scenario failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Diagnostic {
    /// Output or register value differs
    Field {
        port: Port,
        name: String,
        expected: u32,
        actual: u32,
        digits: usize,
    },
    /// Memory cell differs
    Memory {
        address: u32,
        expected: u8,
        actual: u8,
        digits: usize,
    },
    /// Scenario data or DUT wiring does not fit the profile
    Configuration { message: String },
    /// A file or device the scenario needed failed
    Resource { message: String },
}

impl Diagnostic {
    /// Diagnostic for an error that aborted the scenario
    pub fn from_error(err: &BenchError) -> Self {
        if err.is_configuration() {
            Diagnostic::Configuration {
                message: err.to_string(),
            }
        } else {
            Diagnostic::Resource {
                message: err.to_string(),
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Field {
                port,
                name,
                expected,
                actual,
                digits,
            } => {
                let suffix = if *port == Port::Register { " register" } else { "" };
                write!(
                    f,
                    "error: {}{} (expected 0x{:0w$x}, actual 0x{:0w$x})",
                    name,
                    suffix,
                    expected,
                    actual,
                    w = digits
                )
            }
            Diagnostic::Memory {
                address,
                expected,
                actual,
                digits,
            } => write!(
                f,
                "error: address 0x{:0w$x} (expected 0x{:02x}, actual 0x{:02x})",
                address,
                expected,
                actual,
                w = digits
            ),
            Diagnostic::Configuration { message } => write!(f, "error: configuration: {}", message),
            Diagnostic::Resource { message } => write!(f, "error: resource: {}", message),
        }
    }
}

/// Verdict of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Outcome {
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            passed: diagnostics.is_empty(),
            diagnostics,
        }
    }

    /// Failed outcome for a scenario aborted by `err`
    pub fn aborted(err: &BenchError) -> Self {
        Self::from_diagnostics(vec![Diagnostic::from_error(err)])
    }
}

/// Read-only comparison of DUT state against an expectation
pub struct Verifier<'a, D: Dut + ?Sized> {
    dut: &'a D,
    profile: &'a DutProfile,
    memory: Option<&'a AddressSpace>,
}

impl<'a, D: Dut + ?Sized> Verifier<'a, D> {
    /// # Arguments
    ///
    /// * `dut` - Device under test, after the run
    /// * `profile` - Profile the DUT was driven with
    /// * `memory` - External store, for bus-based profiles
    pub fn new(dut: &'a D, profile: &'a DutProfile, memory: Option<&'a AddressSpace>) -> Self {
        Self {
            dut,
            profile,
            memory,
        }
    }

    /// Compare every field the policy selects, then memory
    pub fn verify(&self, expected: &ExpectedState) -> Outcome {
        let mut diagnostics = Vec::new();

        for entry in expected.compared() {
            let field = &entry.field;
            match self.dut.read(field.port, &field.name) {
                Some(actual) if actual == entry.value.value => {}
                Some(actual) => diagnostics.push(Diagnostic::Field {
                    port: field.port,
                    name: field.name.clone(),
                    expected: entry.value.value,
                    actual,
                    digits: field.hex_digits(),
                }),
                None => diagnostics.push(Diagnostic::Configuration {
                    message: format!("DUT does not expose {} '{}'", field.port, field.name),
                }),
            }
        }

        if let Some(image) = expected.memory_image() {
            match self.actual_memory() {
                Some(actual) => {
                    let digits = image.address_digits();
                    diagnostics.extend(actual.mismatches(&image).map(
                        |(address, expected, actual)| Diagnostic::Memory {
                            address,
                            expected,
                            actual,
                            digits,
                        },
                    ));
                }
                None => diagnostics.push(Diagnostic::Configuration {
                    message: format!("DUT of profile '{}' exposes no memory", self.profile.name),
                }),
            }
        }

        Outcome::from_diagnostics(diagnostics)
    }

    /// Store to compare: the external one, or a snapshot of internal memory
    fn actual_memory(&self) -> Option<Cow<'a, AddressSpace>> {
        match &self.profile.memory {
            MemoryBinding::None => None,
            MemoryBinding::External(_) => self.memory.map(Cow::Borrowed),
            MemoryBinding::Internal { depth } => {
                let mut snapshot = AddressSpace::new(*depth);
                for addr in 0..*depth as u32 {
                    snapshot.write(addr, self.dut.peek_memory(addr)?, true);
                }
                Some(Cow::Owned(snapshot))
            }
        }
    }
}
