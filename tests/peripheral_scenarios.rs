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

//! End-to-end scenarios on a peripheral with internal RAM

mod common;

use common::*;
use cyclebench::core::scenario::{GroupRecord, ScenarioRecord, SuiteRecord};

fn suite(name: &str, scenarios: Vec<ScenarioRecord>) -> SuiteRecord {
    SuiteRecord {
        groups: vec![GroupRecord {
            name: name.to_string(),
            scenarios,
        }],
        ..Default::default()
    }
}

fn write_ddra() -> ScenarioRecord {
    ScenarioRecord::new("write DDRA", 6)
        .at(3, &[("CS", 1), ("RS_N", 1), ("R_W", 0), ("A", 1), ("D_IN", 0x5a)])
        .expect_output("IRQ_N", 1)
        .expect_register("DDRA", 0x5a)
}

fn write_ram() -> ScenarioRecord {
    ScenarioRecord::new("write RAM", 4)
        .at(2, &[("CS", 1), ("RS_N", 0), ("R_W", 0), ("A", 0x10), ("D_IN", 0x77)])
        .expect_output("IRQ_N", 1)
        .expect_memory(0x10, 0x77)
}

fn read_ram() -> ScenarioRecord {
    ScenarioRecord::new("read RAM", 3)
        .initial_memory(0x20, 0xab)
        .at(1, &[("CS", 1), ("RS_N", 0), ("R_W", 1), ("A", 0x20)])
        .expect_output("IRQ_N", 1)
        .expect_output("D_OUT", 0xab)
        .expect_memory(0x20, 0xab)
}

#[test]
fn test_scheduled_register_write() {
    let report = riot_runner().run_suite(&suite("ddr", vec![write_ddra()]));
    assert_all_passed(&report);
}

#[test]
fn test_internal_ram_round_trip() {
    let report = riot_runner().run_suite(&suite("ram", vec![write_ram(), read_ram()]));
    assert_all_passed(&report);
}

#[test]
fn test_port_outputs_follow_direction() {
    let port = ScenarioRecord::new("port A", 2)
        .initial_register("DRA", 0xff)
        .initial_register("DDRA", 0x0f)
        .expect_output("IRQ_N", 1)
        .expect_output("PA_OUT", 0x0f)
        .expect_register("DRA", 0xff)
        .expect_register("DDRA", 0x0f);

    let report = riot_runner().run_suite(&suite("ports", vec![port]));
    assert_all_passed(&report);
}

#[test]
fn test_dense_policy_flags_unnamed_state() {
    // The write lands in DDRA but the scenario never names it
    let mut silent = write_ddra();
    silent.name = "silent write".to_string();
    silent.expected.registers.clear();

    let report = riot_runner().run_suite(&suite("dense", vec![silent]));

    assert_diagnostics(
        &report,
        "silent write",
        &["error: DDRA register (expected 0x00, actual 0x5a)"],
    );
}

#[test]
fn test_every_scenario_gets_a_result() {
    let records = suite(
        "mixed",
        vec![
            write_ddra(),
            ScenarioRecord::new("bad name", 1).expect_output("PC", 1),
            ScenarioRecord::new("bad address", 1).initial_memory(0x80, 1),
            read_ram(),
        ],
    );

    let report = riot_runner().run_suite(&records);

    assert_eq!(report.total(), 4);
    assert_eq!(report.passed(), 2);
    assert!(report.results[1].outcome.diagnostics[0]
        .to_string()
        .starts_with("error: configuration:"));
    assert!(report.results[2].outcome.diagnostics[0]
        .to_string()
        .contains("0x0080"));
}

#[test]
fn test_ram_is_cleared_between_scenarios() {
    let expect_clean = ScenarioRecord::new("clean", 1).expect_output("IRQ_N", 1);

    let report = riot_runner().run_suite(&suite("isolation", vec![write_ram(), expect_clean]));

    assert_all_passed(&report);
}

#[test]
fn test_report_is_saved_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let report = riot_runner().run_suite(&suite("ddr", vec![write_ddra()]));
    report.save_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["profile"], "riot");
    assert_eq!(json["results"][0]["scenario"], "write DDRA");
    assert_eq!(json["results"][0]["passed"], true);
}
