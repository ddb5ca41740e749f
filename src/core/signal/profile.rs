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

//! DUT profiles: the per-chip field tables
//!
//! A [`DutProfile`] tells the engine everything it needs to know about one
//! kind of DUT: which fields exist and where, how the clocks and reset are
//! wired, whether the chip sits on an external memory bus, and whether it
//! produces a pixel stream worth capturing.
//!
//! Three profiles are built in, matching the chips of a 2600-class console:
//!
//! | Name   | Chip                        | Memory         | Clocks        |
//! |--------|-----------------------------|----------------|---------------|
//! | `mpu`  | 6502-style processor        | external 64KB  | CLK           |
//! | `riot` | RAM/IO/timer peripheral     | internal 128B  | CLK           |
//! | `tia`  | television interface chip   | none           | CCLK + MCLK/3 |
//!
//! Custom profiles can be written in TOML and loaded with
//! [`DutProfile::load`]; `cyclebench profile <name>` prints a built-in one
//! as a starting point.

use super::{FieldDef, FieldRoles, Port};
use crate::core::driver::StepOrder;
use crate::core::error::{BenchError, Result};
use crate::core::memory::AddressSpace;
use crate::core::scenario::ExpectationPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Clock wiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Primary clock control signal
    pub primary: String,

    /// Optional slower clock derived from the primary one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondaryClock>,

    /// Raw ticks between two primary clock toggles
    #[serde(default = "default_half_period")]
    pub half_period: u32,

    /// Added to the raw tick index before the toggle boundary check
    #[serde(default)]
    pub phase_offset: u32,
}

/// Derived clock toggling every `ratio` primary toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryClock {
    pub signal: String,
    pub ratio: u32,
}

fn default_half_period() -> u32 {
    1
}

impl ClockConfig {
    /// Raw ticks needed to run `cycles` clock cycles
    ///
    /// One extra cycle plus one half-period covers the reset edge and lets
    /// the last cycle's outputs settle before verification.
    pub fn ticks_for(&self, cycles: u32) -> u64 {
        u64::from(self.half_period) * (2 * (u64::from(cycles) + 1) + 1)
    }

    /// Whether the primary clock toggles on raw tick `tick`
    #[inline(always)]
    pub fn primary_toggles(&self, tick: u64) -> bool {
        (tick + u64::from(self.phase_offset)) % u64::from(self.half_period) == 0
    }

    /// Whether the secondary clock toggles on raw tick `tick`
    #[inline(always)]
    pub fn secondary_toggles(&self, tick: u64) -> bool {
        match &self.secondary {
            Some(secondary) => {
                let period = u64::from(self.half_period) * u64::from(secondary.ratio);
                (tick + u64::from(self.phase_offset)) % period == 0
            }
            None => false,
        }
    }
}

/// Reset wiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Reset control signal
    pub signal: String,

    /// Level that asserts reset (0 for an active-low `RES_N`)
    #[serde(default)]
    pub active_level: u32,

    /// Full clock periods driven while reset is asserted
    #[serde(default = "default_reset_cycles")]
    pub cycles: u32,

    /// Hold/ready input forced active during reset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<HoldSignal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldSignal {
    pub signal: String,
    pub level: u32,
}

fn default_reset_cycles() -> u32 {
    1
}

impl ResetConfig {
    /// Level that releases reset
    pub fn inactive_level(&self) -> u32 {
        u32::from(self.active_level == 0)
    }
}

/// External bus wiring of a CPU-style DUT
///
/// `address`, `data_out` and `write_strobe` are output fields; `data_in` is a
/// control field driven by the engine every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusBinding {
    /// Store depth in bytes
    pub depth: usize,
    pub address: String,
    pub data_in: String,
    pub data_out: String,
    pub write_strobe: String,
    /// Strobe level that marks a write cycle (0 for a `R_W` pin)
    #[serde(default)]
    pub write_level: u32,
}

/// Where the memory verified at scenario end lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemoryBinding {
    /// No memory at all
    None,
    /// External store serviced by the engine over the DUT's bus
    External(BusBinding),
    /// Memory inside the DUT, reached through the privileged backdoor
    Internal { depth: usize },
}

impl MemoryBinding {
    pub fn depth(&self) -> Option<usize> {
        match self {
            MemoryBinding::None => None,
            MemoryBinding::External(bus) => Some(bus.depth),
            MemoryBinding::Internal { depth } => Some(*depth),
        }
    }
}

/// Pixel-stream side channel
///
/// Once `counter` reaches `threshold` and the primary clock is high, one
/// byte `(high << high_shift) | (low << low_shift)` is sampled per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Internal counter gating the capture
    pub counter: String,
    pub threshold: u32,
    /// Output field placed in the upper part of the byte
    pub high: String,
    pub high_shift: u32,
    /// Output field placed in the lower part of the byte
    pub low: String,
    pub low_shift: u32,
}

/// Extra backdoor write applied after the initial state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub port: Port,
    pub name: String,
    pub value: u32,
}

/// Everything chip-specific the engine needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutProfile {
    pub name: String,

    /// Default expected-state policy for suites that do not name one
    #[serde(default)]
    pub policy: ExpectationPolicy,

    /// Default order of input application and evaluation
    #[serde(default)]
    pub step_order: StepOrder,

    pub clock: ClockConfig,
    pub reset: ResetConfig,
    pub memory: MemoryBinding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_reset: Vec<Injection>,

    pub fields: Vec<FieldDef>,
}

impl DutProfile {
    /// Names of the built-in profiles
    pub const BUILTIN: [&'static str; 3] = ["mpu", "riot", "tia"];

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "mpu" => Ok(Self::mpu()),
            "riot" => Ok(Self::riot()),
            "tia" => Ok(Self::tia()),
            other => Err(BenchError::UnknownProfile(other.to_string())),
        }
    }

    /// 8-bit processor on a 16-bit external bus
    pub fn mpu() -> Self {
        let state = FieldRoles::INITIAL | FieldRoles::CHECKED;
        let mut fields = vec![
            FieldDef::new("CLK", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("RES_N", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("RDY", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("DB_IN", Port::Control, 8, FieldRoles::empty()),
            FieldDef::new("AB", Port::Output, 16, state),
            FieldDef::new("DB_OUT", Port::Output, 8, FieldRoles::empty()),
            FieldDef::new("R_W", Port::Output, 1, FieldRoles::empty()),
        ];
        for name in ["A", "X", "Y", "S", "P"] {
            fields.push(FieldDef::new(name, Port::Register, 8, state));
        }
        fields.push(FieldDef::new("PC", Port::Register, 16, state));
        for name in ["T", "IR", "CUR_STATE", "NXT_STATE"] {
            fields.push(FieldDef::new(name, Port::Internal, 8, FieldRoles::empty()));
        }

        Self {
            name: "mpu".to_string(),
            policy: ExpectationPolicy::Dense,
            step_order: StepOrder::ApplyThenEvaluate,
            clock: ClockConfig {
                primary: "CLK".to_string(),
                secondary: None,
                half_period: 1,
                phase_offset: 0,
            },
            reset: ResetConfig {
                signal: "RES_N".to_string(),
                active_level: 0,
                cycles: 1,
                hold: Some(HoldSignal {
                    signal: "RDY".to_string(),
                    level: 1,
                }),
            },
            memory: MemoryBinding::External(BusBinding {
                depth: AddressSpace::CPU_DEPTH,
                address: "AB".to_string(),
                data_in: "DB_IN".to_string(),
                data_out: "DB_OUT".to_string(),
                write_strobe: "R_W".to_string(),
                write_level: 0,
            }),
            capture: None,
            // Resume the controller at its first fetch state
            post_reset: vec![
                Injection {
                    port: Port::Internal,
                    name: "CUR_STATE".to_string(),
                    value: 0,
                },
                Injection {
                    port: Port::Internal,
                    name: "NXT_STATE".to_string(),
                    value: 1,
                },
            ],
            fields,
        }
    }

    /// RAM/IO/timer peripheral with a 128-byte internal RAM
    pub fn riot() -> Self {
        let pin = FieldRoles::INITIAL | FieldRoles::SCHEDULED;
        let state = FieldRoles::INITIAL | FieldRoles::CHECKED;
        let mut fields = vec![
            FieldDef::new("CLK", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("RES_N", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("CS", Port::Input, 2, pin),
            FieldDef::new("RS_N", Port::Input, 1, pin),
            FieldDef::new("R_W", Port::Input, 1, pin),
            FieldDef::new("A", Port::Input, 7, pin),
            FieldDef::new("D_IN", Port::Input, 8, pin),
            FieldDef::new("PA_IN", Port::Input, 8, pin),
            FieldDef::new("PB_IN", Port::Input, 8, pin),
            FieldDef::new("IRQ_N", Port::Output, 1, FieldRoles::CHECKED),
            FieldDef::new("D_OUT", Port::Output, 8, FieldRoles::CHECKED),
            FieldDef::new("PA_OUT", Port::Output, 8, FieldRoles::CHECKED),
            FieldDef::new("PB_OUT", Port::Output, 8, FieldRoles::CHECKED),
        ];
        for name in ["DRA", "DDRA", "DRB", "DDRB"] {
            fields.push(FieldDef::new(name, Port::Register, 8, state));
        }

        Self {
            name: "riot".to_string(),
            policy: ExpectationPolicy::Dense,
            step_order: StepOrder::EvaluateApplyEvaluate,
            clock: ClockConfig {
                primary: "CLK".to_string(),
                secondary: None,
                half_period: 1,
                phase_offset: 0,
            },
            reset: ResetConfig {
                signal: "RES_N".to_string(),
                active_level: 0,
                cycles: 1,
                hold: None,
            },
            memory: MemoryBinding::Internal { depth: 128 },
            capture: None,
            post_reset: Vec::new(),
            fields,
        }
    }

    /// Television interface chip with a color clock and a CPU clock at 1/3
    pub fn tia() -> Self {
        let state = FieldRoles::INITIAL | FieldRoles::CHECKED;
        let mut fields = vec![
            FieldDef::new("MCLK", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("CCLK", Port::Control, 1, FieldRoles::empty()),
            FieldDef::new("RES_N", Port::Control, 1, FieldRoles::empty()),
        ];
        for (name, bits) in [("DEL", 1), ("R_W", 1), ("CS", 4), ("A", 6), ("I", 6), ("D_IN", 8)] {
            fields.push(FieldDef::new(name, Port::Input, bits, FieldRoles::SCHEDULED));
        }
        for (name, bits) in [
            ("HSYNC", 1),
            ("HBLANK", 1),
            ("VSYNC", 1),
            ("VBLANK", 1),
            ("RDY", 1),
            ("LUM", 3),
            ("COL", 4),
            ("AUD", 2),
            ("D_OUT", 8),
        ] {
            fields.push(FieldDef::new(name, Port::Output, bits, FieldRoles::CHECKED));
        }
        for (name, bits) in [
            ("VSYNC", 1),
            ("VBLANK", 8),
            ("NUSIZ0", 8),
            ("NUSIZ1", 8),
            ("COLUP0", 8),
            ("COLUP1", 8),
            ("COLUPF", 8),
            ("COLUBK", 8),
            ("CTRLPF", 8),
            ("REFP0", 1),
            ("REFP1", 1),
            ("PF0", 8),
            ("PF1", 8),
            ("PF2", 8),
            ("GRP0", 8),
            ("GRP1", 8),
            ("GRP0D", 8),
            ("GRP1D", 8),
            ("ENAM0", 1),
            ("ENAM1", 1),
            ("ENABL", 1),
            ("ENABLD", 1),
            ("HMP0", 8),
            ("HMP1", 8),
            ("HMM0", 8),
            ("HMM1", 8),
            ("HMBL", 8),
            ("POSP0", 8),
            ("POSP1", 8),
            ("POSM0", 8),
            ("POSM1", 8),
            ("POSBL", 8),
            ("VDELP0", 1),
            ("VDELP1", 1),
            ("VDELBL", 1),
            ("RESMP0", 1),
            ("RESMP1", 1),
            ("CXCLR", 1),
            ("CXR", 15),
        ] {
            fields.push(FieldDef::new(name, Port::Register, bits, state));
        }
        fields.push(FieldDef::new("HCOUNT", Port::Internal, 8, FieldRoles::empty()));
        fields.push(FieldDef::new("PIXEL", Port::Internal, 8, FieldRoles::empty()));

        Self {
            name: "tia".to_string(),
            policy: ExpectationPolicy::Sparse,
            step_order: StepOrder::EvaluateApplyEvaluate,
            clock: ClockConfig {
                primary: "CCLK".to_string(),
                secondary: Some(SecondaryClock {
                    signal: "MCLK".to_string(),
                    ratio: 3,
                }),
                half_period: 1,
                phase_offset: 1,
            },
            reset: ResetConfig {
                signal: "RES_N".to_string(),
                active_level: 0,
                cycles: 1,
                hold: None,
            },
            memory: MemoryBinding::None,
            // Visible picture starts after 68 color clocks of horizontal blank
            capture: Some(CaptureConfig {
                counter: "HCOUNT".to_string(),
                threshold: 68,
                high: "COL".to_string(),
                high_shift: 4,
                low: "LUM".to_string(),
                low_shift: 1,
            }),
            post_reset: Vec::new(),
            fields,
        }
    }

    /// Parse a profile from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let profile: DutProfile = toml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loading DUT profile from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Render the profile as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| BenchError::Parse(e.to_string()))
    }

    /// Find a field by port and exact name
    pub fn field(&self, port: Port, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|field| field.port == port && field.name == name)
    }

    /// Find a drivable (control or input) field by name
    pub fn drivable(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|field| field.port.is_drivable() && field.name == name)
    }

    /// Fields of one port carrying all of `roles`, in declaration order
    pub fn fields_with(&self, port: Port, roles: FieldRoles) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(move |field| field.port == port && field.roles.contains(roles))
    }

    /// Fields of one port, in declaration order
    pub fn port_fields(&self, port: Port) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(move |field| field.port == port)
    }

    /// Depth of the verified memory, if the DUT has any
    pub fn memory_depth(&self) -> Option<usize> {
        self.memory.depth()
    }

    fn invalid(&self, reason: impl Into<String>) -> BenchError {
        BenchError::InvalidProfile {
            profile: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn require(&self, port: Port, name: &str, what: &str) -> Result<()> {
        if self.field(port, name).is_none() {
            return Err(self.invalid(format!("{} '{}' is not a declared {} field", what, name, port)));
        }
        Ok(())
    }

    /// Check the tables for internal consistency
    ///
    /// # Errors
    ///
    /// Returns `BenchError::InvalidProfile` if:
    /// - a field name repeats within a port, or a width is outside 1..=32
    /// - a role is attached to a port that cannot carry it
    /// - a clock, reset, bus, capture or post-reset signal is not declared
    /// - the half period, clock ratio or memory depth is zero
    /// - a capture shift moves its field out of the sample byte
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert((field.port, field.name.as_str())) {
                return Err(self.invalid(format!("duplicate {} field '{}'", field.port, field.name)));
            }
            if field.bits == 0 || field.bits > 32 {
                return Err(self.invalid(format!("field '{}' has width {}", field.name, field.bits)));
            }
            if field.roles.contains(FieldRoles::SCHEDULED) && field.port != Port::Input {
                return Err(self.invalid(format!("scheduled field '{}' is not an input", field.name)));
            }
            if field.roles.contains(FieldRoles::CHECKED)
                && !matches!(field.port, Port::Output | Port::Register)
            {
                return Err(self.invalid(format!(
                    "checked field '{}' is not an output or register",
                    field.name
                )));
            }
        }
        // Drivable names must be unique across control and input
        let mut drivable = HashSet::new();
        for field in self.fields.iter().filter(|f| f.port.is_drivable()) {
            if !drivable.insert(field.name.as_str()) {
                return Err(self.invalid(format!("pin '{}' is both control and input", field.name)));
            }
        }

        if self.clock.half_period == 0 {
            return Err(self.invalid("half period must be at least one tick"));
        }
        self.require(Port::Control, &self.clock.primary, "primary clock")?;
        if let Some(secondary) = &self.clock.secondary {
            if secondary.ratio == 0 {
                return Err(self.invalid("secondary clock ratio must be at least one"));
            }
            self.require(Port::Control, &secondary.signal, "secondary clock")?;
        }

        self.require(Port::Control, &self.reset.signal, "reset")?;
        if let Some(hold) = &self.reset.hold {
            self.require(Port::Control, &hold.signal, "hold")?;
        }

        match &self.memory {
            MemoryBinding::None => {}
            MemoryBinding::External(bus) => {
                if bus.depth == 0 {
                    return Err(self.invalid("memory depth must be non-zero"));
                }
                self.require(Port::Output, &bus.address, "bus address")?;
                self.require(Port::Control, &bus.data_in, "bus data-in")?;
                self.require(Port::Output, &bus.data_out, "bus data-out")?;
                self.require(Port::Output, &bus.write_strobe, "bus write strobe")?;
            }
            MemoryBinding::Internal { depth } => {
                if *depth == 0 {
                    return Err(self.invalid("memory depth must be non-zero"));
                }
            }
        }

        if let Some(capture) = &self.capture {
            // One sample is one byte
            for shift in [capture.high_shift, capture.low_shift] {
                if shift >= 8 {
                    return Err(self.invalid(format!(
                        "capture shift {} leaves the sample byte",
                        shift
                    )));
                }
            }
            self.require(Port::Internal, &capture.counter, "capture counter")?;
            self.require(Port::Output, &capture.high, "capture field")?;
            self.require(Port::Output, &capture.low, "capture field")?;
        }

        for injection in &self.post_reset {
            self.require(injection.port, &injection.name, "post-reset")?;
        }

        Ok(())
    }
}
