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

//! Signal interface between the engine and a Device Under Test
//!
//! A DUT is any model (a Verilated netlist, a behavioral emulator, a test
//! fake) that exposes named signals and can be re-evaluated. The engine never
//! knows what kind of chip it is driving: everything chip-specific lives in a
//! [`DutProfile`] field table.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              Cycle Driver                     │
//! │                                               │
//! │  drive("CLK", 1)          normal pin access   │
//! │  read(Output, "AB")                           │
//! │  inject(Register, "A", 0x11)   backdoor load  │
//! │  step()                   settle logic        │
//! └───────────────┬───────────────────────────────┘
//!                 │  &mut dyn Dut
//!        ┌────────┴────────┬─────────────────┐
//!        │  CPU (mpu)      │  RIOT (riot)    │  TIA (tia)
//!        │  bus + regs     │  ports + timer  │  sync/color + regs
//!        └─────────────────┴─────────────────┘
//! ```
//!
//! # Ports
//!
//! Every field belongs to exactly one [`Port`]. Names are unique within a
//! port but may repeat across ports (a video chip has both a `VSYNC` output
//! pin and a `VSYNC` register).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod bank;
pub mod profile;

#[cfg(test)]
mod tests;

pub use bank::SignalBank;
pub use profile::{
    BusBinding, CaptureConfig, ClockConfig, DutProfile, HoldSignal, MemoryBinding,
    ResetConfig, SecondaryClock,
};

/// Where a signal lives on the DUT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    /// Engine-driven pins: clocks, reset, hold/ready, bus data-in
    Control,
    /// Scenario-driven pins: chip select, direction, address, data, port lines
    Input,
    /// Observable pins: data-out, port outputs, interrupt and sync lines
    Output,
    /// Internal registers exposed for white-box verification
    Register,
    /// Internal signals used by the engine only (raster counters, FSM state)
    Internal,
}

impl Port {
    /// Ports whose fields may be changed through normal pin access
    pub fn is_drivable(self) -> bool {
        matches!(self, Port::Control | Port::Input)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Port::Control => "control",
            Port::Input => "input",
            Port::Output => "output",
            Port::Register => "register",
            Port::Internal => "internal",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Which parts of a scenario may mention a field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FieldRoles: u8 {
        /// Part of the initial-state vocabulary (loaded with a zero default)
        const INITIAL = 0b0000_0001;
        /// May appear in schedule input vectors
        const SCHEDULED = 0b0000_0010;
        /// Part of the expected-state vocabulary
        const CHECKED = 0b0000_0100;
    }
}

/// One declared DUT field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Exact, case-sensitive name used in scenario files
    pub name: String,

    /// Port the field belongs to
    pub port: Port,

    /// Width in bits (1..=32)
    pub bits: u8,

    /// Scenario roles
    #[serde(default = "FieldRoles::empty")]
    pub roles: FieldRoles,
}

impl FieldDef {
    pub fn new(name: &str, port: Port, bits: u8, roles: FieldRoles) -> Self {
        Self {
            name: name.to_string(),
            port,
            bits,
            roles,
        }
    }

    /// Mask covering the field's width
    #[inline(always)]
    pub fn mask(&self) -> u32 {
        if self.bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.bits) - 1
        }
    }

    /// Hex digits used when printing the field: 2 for byte-wide values,
    /// 4 for anything wider
    pub fn hex_digits(&self) -> usize {
        if self.bits > 8 {
            4
        } else {
            2
        }
    }
}

/// Capability set every DUT exposes to the engine
///
/// Implementations map names onto their own storage. Unknown names are
/// reported through `None`/`false`; the engine turns those into
/// configuration errors for the running scenario.
///
/// # Privileged access
///
/// [`Dut::inject`] and [`Dut::inject_memory`] are a backdoor: they place a
/// value directly into the model's state, the way a simulator pokes a
/// netlist variable. Real hardware has no such path, so the engine only uses
/// them during reset and never confuses them with [`Dut::drive`], which goes
/// through the same pins the hardware would see.
pub trait Dut {
    /// Read the current value of a field
    fn read(&self, port: Port, name: &str) -> Option<u32>;

    /// Drive a control or input pin
    ///
    /// Returns `false` if no such drivable pin exists.
    fn drive(&mut self, name: &str, value: u32) -> bool;

    /// Place a value directly into any field, bypassing the pins
    ///
    /// Returns `false` if the field does not exist.
    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool;

    /// Read a cell of the DUT's internal memory, if it has one
    fn peek_memory(&self, _addr: u32) -> Option<u8> {
        None
    }

    /// Write a cell of the DUT's internal memory through the backdoor
    fn inject_memory(&mut self, _addr: u32, _value: u8) -> bool {
        false
    }

    /// Advance simulated time by one delta and settle the logic
    fn step(&mut self);

    /// Tear the model down at the end of the run
    fn finalize(&mut self) {}
}

impl<T: Dut + ?Sized> Dut for Box<T> {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        (**self).read(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        (**self).drive(name, value)
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        (**self).inject(port, name, value)
    }

    fn peek_memory(&self, addr: u32) -> Option<u8> {
        (**self).peek_memory(addr)
    }

    fn inject_memory(&mut self, addr: u32, value: u8) -> bool {
        (**self).inject_memory(addr, value)
    }

    fn step(&mut self) {
        (**self).step()
    }

    fn finalize(&mut self) {
        (**self).finalize()
    }
}
