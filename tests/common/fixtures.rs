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

//! Minimal DUT models
//!
//! Both models keep all their state in a [`SignalBank`] and only act on the
//! rising edge of `CLK` while `RES_N` is released.

use cyclebench::core::driver::Testbench;
use cyclebench::core::runner::Runner;
use cyclebench::core::signal::{Dut, DutProfile, Port, SignalBank};

/// Fetch state of the processor controller
const FETCH: u32 = 0;
const EXECUTE: u32 = 1;
const STORE: u32 = 2;

pub const OP_CLC: u32 = 0x18;
pub const OP_SEC: u32 = 0x38;
pub const OP_STA_ZP: u32 = 0x85;
pub const OP_NOP: u32 = 0xea;

/// Two-state processor speaking the `mpu` bus
///
/// Fetch latches `DB_IN` into `IR` and advances `PC`; execute handles
/// `SEC`, `CLC` and `NOP` in place and turns `STA zp` into a write cycle.
/// Any other opcode behaves like `NOP`.
pub struct TinyMpu {
    pub bank: SignalBank,
    last_clk: u32,
}

impl TinyMpu {
    pub fn new() -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::mpu()),
            last_clk: 0,
        }
    }

    fn get(&self, port: Port, name: &str) -> u32 {
        self.bank.get(port, name).unwrap_or(0)
    }

    fn set(&mut self, port: Port, name: &str, value: u32) {
        self.bank.set(port, name, value);
    }

    fn cycle(&mut self) {
        let data = self.get(Port::Control, "DB_IN");
        let pc = self.get(Port::Register, "PC");
        match self.get(Port::Internal, "CUR_STATE") {
            FETCH => {
                self.set(Port::Internal, "IR", data);
                self.set(Port::Register, "PC", pc + 1);
                self.set(Port::Output, "AB", pc + 1);
                self.set(Port::Internal, "CUR_STATE", EXECUTE);
            }
            EXECUTE => {
                let p = self.get(Port::Register, "P");
                let mut next = FETCH;
                match self.get(Port::Internal, "IR") {
                    OP_SEC => self.set(Port::Register, "P", p | 0x01),
                    OP_CLC => self.set(Port::Register, "P", p & !0x01),
                    OP_STA_ZP => {
                        let a = self.get(Port::Register, "A");
                        self.set(Port::Register, "PC", pc + 1);
                        self.set(Port::Output, "AB", data);
                        self.set(Port::Output, "DB_OUT", a);
                        self.set(Port::Output, "R_W", 0);
                        next = STORE;
                    }
                    _ => {}
                }
                self.set(Port::Internal, "CUR_STATE", next);
            }
            _ => {
                self.set(Port::Output, "R_W", 1);
                self.set(Port::Output, "AB", pc);
                self.set(Port::Internal, "CUR_STATE", FETCH);
            }
        }
    }
}

impl Default for TinyMpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Dut for TinyMpu {
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
        let clk = self.get(Port::Control, "CLK");
        let rising = clk == 1 && self.last_clk == 0;
        self.last_clk = clk;

        if self.get(Port::Control, "RES_N") == 0 {
            self.set(Port::Output, "R_W", 1);
            return;
        }
        if rising && self.get(Port::Control, "RDY") == 1 {
            self.cycle();
        }
    }
}

/// Peripheral with four port registers and the `riot` internal RAM
///
/// A selected write (`CS=1`, `R_W=0`) stores `D_IN` into a port register
/// (`RS_N=1`, register `A & 3`) or into RAM (`RS_N=0`); a selected read
/// drives `D_OUT`. Port outputs are the data registers masked by their
/// direction registers. Reset clears the data bus output.
pub struct TinyRiot {
    pub bank: SignalBank,
    last_clk: u32,
}

const PORT_REGISTERS: [&str; 4] = ["DRA", "DDRA", "DRB", "DDRB"];

impl TinyRiot {
    pub fn new() -> Self {
        Self {
            bank: SignalBank::new(&DutProfile::riot()),
            last_clk: 0,
        }
    }

    fn get(&self, port: Port, name: &str) -> u32 {
        self.bank.get(port, name).unwrap_or(0)
    }

    fn cycle(&mut self) {
        self.bank.set(Port::Output, "IRQ_N", 1);

        if self.get(Port::Input, "CS") == 1 {
            let a = self.get(Port::Input, "A");
            let register = PORT_REGISTERS[(a & 3) as usize];
            let ram = self.get(Port::Input, "RS_N") == 0;

            if self.get(Port::Input, "R_W") == 0 {
                let data = self.get(Port::Input, "D_IN");
                if ram {
                    if let Some(memory) = self.bank.memory_mut() {
                        memory.write(a, data as u8, true);
                    }
                } else {
                    self.bank.set(Port::Register, register, data);
                }
            } else {
                let data = if ram {
                    self.bank.memory().map_or(0, |memory| u32::from(memory.read(a)))
                } else {
                    self.get(Port::Register, register)
                };
                self.bank.set(Port::Output, "D_OUT", data);
            }
        }

        let pa = self.get(Port::Register, "DRA") & self.get(Port::Register, "DDRA");
        let pb = self.get(Port::Register, "DRB") & self.get(Port::Register, "DDRB");
        self.bank.set(Port::Output, "PA_OUT", pa);
        self.bank.set(Port::Output, "PB_OUT", pb);
    }
}

impl Default for TinyRiot {
    fn default() -> Self {
        Self::new()
    }
}

impl Dut for TinyRiot {
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
        let clk = self.get(Port::Control, "CLK");
        let rising = clk == 1 && self.last_clk == 0;
        self.last_clk = clk;

        if self.get(Port::Control, "RES_N") == 0 {
            self.bank.set(Port::Output, "D_OUT", 0);
            return;
        }
        if rising {
            self.cycle();
        }
    }
}

pub fn mpu_runner() -> Runner<TinyMpu> {
    Runner::new(Testbench::new(TinyMpu::new(), DutProfile::mpu()).unwrap())
}

pub fn riot_runner() -> Runner<TinyRiot> {
    Runner::new(Testbench::new(TinyRiot::new(), DutProfile::riot()).unwrap())
}
