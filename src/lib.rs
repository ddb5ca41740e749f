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

//! Cycle-accurate conformance test engine for hardware models
//!
//! This library drives a Device Under Test (a processor, a timer/IO
//! peripheral, a video timing chip) through golden test vectors: it resets
//! the device into a known state, steps its clock while injecting scheduled
//! inputs and serving its memory bus, and compares the final state against
//! an expected snapshot.
//!
//! # Example
//!
//! ```
//! use cyclebench::core::driver::Testbench;
//! use cyclebench::core::runner::Runner;
//! use cyclebench::core::scenario::{ScenarioRecord, SuiteRecord, GroupRecord};
//! use cyclebench::core::signal::{DutProfile, SignalBank};
//!
//! let profile = DutProfile::riot();
//! let bench = Testbench::new(SignalBank::new(&profile), profile).unwrap();
//! let mut runner = Runner::new(bench);
//!
//! // A bank never changes state on its own, so an all-zero expectation holds
//! let suite = SuiteRecord {
//!     groups: vec![GroupRecord {
//!         name: "idle".to_string(),
//!         scenarios: vec![ScenarioRecord::new("quiet", 4)],
//!     }],
//!     ..Default::default()
//! };
//! let report = runner.run_suite(&suite);
//! assert!(report.all_passed());
//! ```

pub mod core;
