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

//! Unit tests for the verifier organized by category

use super::*;
use crate::core::scenario::{ExpectationPolicy, Scenario, ScenarioRecord};
use crate::core::signal::SignalBank;


fn expected(record: &ScenarioRecord, profile: &DutProfile, policy: ExpectationPolicy) -> ExpectedState {
    Scenario::from_record(record, profile, policy).unwrap().expected
}
