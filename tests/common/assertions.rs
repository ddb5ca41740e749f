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

//! Report assertions

use cyclebench::core::runner::SuiteReport;

/// Assert every scenario passed, printing the report otherwise
pub fn assert_all_passed(report: &SuiteReport) {
    assert!(report.all_passed(), "suite failed:\n{}", report);
}

/// Assert the rendered diagnostics of one scenario
pub fn assert_diagnostics(report: &SuiteReport, scenario: &str, expected: &[&str]) {
    let result = report
        .results
        .iter()
        .find(|r| r.scenario == scenario)
        .unwrap_or_else(|| panic!("no result for scenario '{}'", scenario));
    let actual: Vec<String> = result
        .outcome
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(actual, expected, "diagnostics of '{}'", scenario);
}
