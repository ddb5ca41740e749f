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

use super::*;

/// Resolve a record against a profile with the profile's own policy
pub fn resolve(record: &ScenarioRecord, profile: &DutProfile) -> Scenario {
    Scenario::from_record(record, profile, profile.policy).unwrap()
}

/// Bench around a plain signal bank
pub fn bank_bench(profile: DutProfile) -> Testbench<SignalBank> {
    Testbench::new(SignalBank::new(&profile), profile).unwrap()
}

/// Reset and run, collecting every tick's events and logical clock
pub fn run_collect<D: Dut>(
    bench: &mut Testbench<D>,
    scenario: &Scenario,
) -> Vec<(u64, TickEvents, u64)> {
    let mut ticks = Vec::new();
    bench.reset(scenario).unwrap();
    bench
        .run_observed(scenario, |tick, events, clock| ticks.push((tick, events, clock)))
        .unwrap();
    ticks
}

fn rising(bank: &SignalBank, clock: &str, last: &mut u32) -> bool {
    let level = bank.get(Port::Control, clock).unwrap_or(0);
    let edge = level == 1 && *last == 0;
    *last = level;
    edge
}

/// CPU-shaped fake: publishes one bus cycle per rising clock edge
///
/// Each script entry is `(address, data, write)`. The fake also records
/// the data-in value it sees on every edge.
pub struct BusScript {
    pub bank: SignalBank,
    script: Vec<(u32, u32, bool)>,
    cycle: usize,
    last_clk: u32,
    pub reads: Vec<u32>,
}

impl BusScript {
    pub fn new(script: Vec<(u32, u32, bool)>) -> Self {
        let mut bank = SignalBank::new(&DutProfile::mpu());
        bank.set(Port::Output, "R_W", 1);
        Self {
            bank,
            script,
            cycle: 0,
            last_clk: 0,
            reads: Vec::new(),
        }
    }
}

impl Dut for BusScript {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        self.bank.read(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        self.bank.drive(name, value)
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        self.bank.inject(port, name, value)
    }

    fn step(&mut self) {
        self.bank.count_step();
        if self.bank.get(Port::Control, "RES_N") == Some(0) {
            self.bank.set(Port::Output, "R_W", 1);
            self.cycle = 0;
            self.reads.clear();
        }
        if !rising(&self.bank, "CLK", &mut self.last_clk)
            || self.bank.get(Port::Control, "RES_N") != Some(1)
        {
            return;
        }

        let data_in = self.bank.get(Port::Control, "DB_IN").unwrap_or(0);
        self.reads.push(data_in);
        match self.script.get(self.cycle) {
            Some(&(address, data, write)) => {
                self.bank.set(Port::Output, "AB", address);
                self.bank.set(Port::Output, "DB_OUT", data);
                self.bank.set(Port::Output, "R_W", u32::from(!write));
            }
            None => {
                self.bank.set(Port::Output, "R_W", 1);
            }
        }
        self.cycle += 1;
    }
}

/// Video-shaped fake: a horizontal counter advancing on every color clock
///
/// `COL` and `LUM` are derived from the counter so captured bytes are
/// predictable.
pub struct Raster {
    pub bank: SignalBank,
    start: u32,
    last_clk: u32,
}

impl Raster {
    pub fn new(start: u32) -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::tia()),
            start,
            last_clk: 0,
        }
    }
}

impl Dut for Raster {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        self.bank.read(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        self.bank.drive(name, value)
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        self.bank.inject(port, name, value)
    }

    fn step(&mut self) {
        self.bank.count_step();
        if self.bank.get(Port::Control, "RES_N") == Some(0) {
            self.bank.set(Port::Internal, "HCOUNT", self.start);
        }
        if rising(&self.bank, "CCLK", &mut self.last_clk)
            && self.bank.get(Port::Control, "RES_N") == Some(1)
        {
            let h = (self.bank.get(Port::Internal, "HCOUNT").unwrap_or(0) + 1) % 228;
            self.bank.set(Port::Internal, "HCOUNT", h);
            self.bank.set(Port::Output, "COL", (h >> 2) & 0xf);
            self.bank.set(Port::Output, "LUM", h & 0x7);
        }
    }
}

/// Records `(CLK, D_IN)` as seen by every evaluation
pub struct OrderRecorder {
    pub bank: SignalBank,
    pub seen: Vec<(u32, u32)>,
}

impl OrderRecorder {
    pub fn new() -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::riot()),
            seen: Vec::new(),
        }
    }
}

impl Default for OrderRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Dut for OrderRecorder {
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
        self.bank.count_step();
        let clk = self.bank.get(Port::Control, "CLK").unwrap_or(0);
        let d_in = self.bank.get(Port::Input, "D_IN").unwrap_or(0);
        self.seen.push((clk, d_in));
    }
}

/// Video-shaped fake latching `D_IN` into `COLUBK` on selected color clocks
pub struct ColorLatch {
    pub bank: SignalBank,
    last_clk: u32,
}

impl ColorLatch {
    pub fn new() -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::tia()),
            last_clk: 0,
        }
    }
}

impl Default for ColorLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Dut for ColorLatch {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        self.bank.read(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        self.bank.drive(name, value)
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        self.bank.inject(port, name, value)
    }

    fn step(&mut self) {
        self.bank.count_step();
        if !rising(&self.bank, "CCLK", &mut self.last_clk)
            || self.bank.get(Port::Control, "RES_N") != Some(1)
        {
            return;
        }
        let selected = self.bank.get(Port::Input, "CS") == Some(1)
            && self.bank.get(Port::Input, "R_W") == Some(0);
        if selected {
            let data = self.bank.get(Port::Input, "D_IN").unwrap_or(0);
            self.bank.set(Port::Register, "COLUBK", data);
        }
    }
}
