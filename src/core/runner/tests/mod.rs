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

//! Unit tests for the scenario runner organized by category

use super::*;
use crate::core::scenario::{GroupRecord, ScenarioRecord};
use crate::core::signal::{DutProfile, Port, SignalBank};
use crate::core::verifier::Diagnostic;


/// Peripheral fake latching `D_IN` into `DRA` on every selected rising edge
pub struct Latch {
    bank: SignalBank,
    last_clk: u32,
}

impl Latch {
    pub fn new() -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::riot()),
            last_clk: 0,
        }
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

impl Dut for Latch {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        self.bank.read(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        self.bank.drive(name, value)
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        self.bank.inject(port, name, value)
    }

    fn peek_memory(&self, addr: u32) -> Option<u8> {
        self.bank.peek_memory(addr)
    }

    fn inject_memory(&mut self, addr: u32, value: u8) -> bool {
        self.bank.inject_memory(addr, value)
    }

    fn step(&mut self) {
        let clk = self.bank.get(Port::Control, "CLK").unwrap_or(0);
        let edge = clk == 1 && self.last_clk == 0;
        self.last_clk = clk;
        if edge && self.bank.get(Port::Input, "CS") == Some(1) {
            let d_in = self.bank.get(Port::Input, "D_IN").unwrap_or(0);
            self.bank.set(Port::Register, "DRA", d_in);
        }
    }
}

pub fn latch_runner() -> Runner<Latch> {
    Runner::new(Testbench::new(Latch::new(), DutProfile::riot()).unwrap())
}

pub fn suite(groups: Vec<(&str, Vec<ScenarioRecord>)>) -> SuiteRecord {
    SuiteRecord {
        groups: groups
            .into_iter()
            .map(|(name, scenarios)| GroupRecord {
                name: name.to_string(),
                scenarios,
            })
            .collect(),
        ..Default::default()
    }
}

/// Writes 0x5a into DRA at logical clock 2
pub fn writes_dra() -> ScenarioRecord {
    ScenarioRecord::new("writes DRA", 4)
        .at(2, &[("CS", 1), ("D_IN", 0x5a)])
        .expect_register("DRA", 0x5a)
}

/// Expects the reset state everywhere
pub fn quiet() -> ScenarioRecord {
    ScenarioRecord::new("quiet", 4)
}
