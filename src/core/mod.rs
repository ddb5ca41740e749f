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

//! Test engine components
//!
//! Leaf-first:
//! - Addressable store (external memory of bus-based DUTs)
//! - Signal interface (`Dut` trait and per-chip profiles)
//! - Scenario model (initial state, schedule, expected state)
//! - Cycle driver (reset, clocking, bus service, trace, pixel capture)
//! - Verifier
//! - Scenario runner

pub mod config;
pub mod driver;
pub mod error;
pub mod memory;
pub mod runner;
pub mod scenario;
pub mod signal;
pub mod verifier;

// Re-export commonly used types
pub use config::BenchConfig;
pub use driver::{StepOrder, Testbench};
pub use error::{BenchError, Result};
pub use memory::AddressSpace;
pub use runner::{Runner, SuiteReport};
pub use scenario::{ExpectationPolicy, Scenario};
pub use signal::{Dut, DutProfile, Port, SignalBank};
pub use verifier::{Diagnostic, Outcome, Verifier};
