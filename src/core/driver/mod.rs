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

//! Cycle driver
//!
//! The [`Testbench`] owns a DUT and its external memory and moves one
//! scenario at a time through a small state machine:
//!
//! ```text
//!   Idle ──reset()──► Resetting ──initial state loaded──► Running ──run()──► Done
//!    ▲                                                                        │
//!    └──────────────────────────── reset() ◄──────────────────────────────────┘
//! ```
//!
//! # Tick loop
//!
//! `run()` executes `half_period * (2 * (cycles + 1) + 1)` raw ticks. On
//! every tick, in order:
//!
//! 1. Bus service (external memory only): data-in <- `mem[address]`, then
//!    `mem[address] <- data-out` when the write strobe is at its write level
//! 2. Trace record at the cumulative time
//! 3. Primary clock toggle on `(tick + phase_offset) % half_period == 0`,
//!    secondary clock toggle every `ratio` primary toggles
//! 4. Logical clock +1 on every primary rising edge
//! 5. Scheduled inputs for the current logical clock, and evaluation in the
//!    configured [`StepOrder`]
//! 6. Pixel sample when the capture counter has reached its threshold and
//!    the primary clock is high
//!
//! Raw tick, clock level and logical clock are independent counters: the
//! logical clock only moves on rising edges, so a schedule entry stays
//! applied for every tick of its clock count (level-held, reapplied).

use crate::core::error::{BenchError, Result};
use crate::core::memory::AddressSpace;
use crate::core::scenario::{FieldEntry, Scenario};
use crate::core::signal::{BusBinding, Dut, DutProfile, MemoryBinding, Port};
use crate::core::verifier::Verifier;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

mod capture;
pub mod trace;

#[cfg(test)]
mod tests;

pub use capture::pack_sample;
pub use trace::{SignalTracer, TraceSink};

use capture::CaptureSink;

/// Where scheduled inputs go relative to DUT evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOrder {
    /// Apply inputs after the clock edge, then evaluate once
    #[default]
    ApplyThenEvaluate,
    /// Evaluate the clock edge, apply inputs, evaluate again
    EvaluateApplyEvaluate,
}

impl fmt::Display for StepOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOrder::ApplyThenEvaluate => f.write_str("apply-then-evaluate"),
            StepOrder::EvaluateApplyEvaluate => f.write_str("evaluate-apply-evaluate"),
        }
    }
}

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Resetting,
    Running,
    Done,
}

impl DriverState {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverState::Idle => "idle",
            DriverState::Resetting => "resetting",
            DriverState::Running => "running",
            DriverState::Done => "done",
        }
    }
}

bitflags! {
    /// What happened on one raw tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TickEvents: u8 {
        const PRIMARY_TOGGLED = 0b0000_0001;
        const RISING_EDGE = 0b0000_0010;
        const SECONDARY_TOGGLED = 0b0000_0100;
        const INPUTS_APPLIED = 0b0000_1000;
        const BUS_WRITE = 0b0001_0000;
        const PIXEL_CAPTURED = 0b0010_0000;
    }
}

/// Cycle-accurate test bench around one DUT
pub struct Testbench<D: Dut> {
    dut: D,
    profile: DutProfile,
    /// Store behind the DUT's bus, external-memory profiles only
    memory: Option<AddressSpace>,
    tracer: Option<Box<dyn TraceSink>>,
    step_order: StepOrder,
    capture_dir: Option<PathBuf>,
    state: DriverState,
    /// Cumulative trace time, never reset
    time: u64,
    /// Logical clock count of the current scenario
    clock: u64,
    primary: u32,
    secondary: u32,
    captured: usize,
}

impl<D: Dut> Testbench<D> {
    /// Create a test bench
    ///
    /// # Arguments
    ///
    /// * `dut` - Device under test
    /// * `profile` - Field table describing `dut`
    ///
    /// # Returns
    ///
    /// - `Ok(Testbench)` in the `Idle` state
    /// - `Err(BenchError::InvalidProfile)` if the profile is inconsistent
    ///
    /// # Example
    /// ```
    /// use cyclebench::core::driver::{DriverState, Testbench};
    /// use cyclebench::core::signal::{DutProfile, SignalBank};
    ///
    /// let profile = DutProfile::mpu();
    /// let bench = Testbench::new(SignalBank::new(&profile), profile).unwrap();
    /// assert_eq!(bench.state(), DriverState::Idle);
    /// ```
    pub fn new(dut: D, profile: DutProfile) -> Result<Self> {
        profile.validate()?;
        let memory = match &profile.memory {
            MemoryBinding::External(bus) => Some(AddressSpace::new(bus.depth)),
            _ => None,
        };
        let step_order = profile.step_order;
        Ok(Self {
            dut,
            profile,
            memory,
            tracer: None,
            step_order,
            capture_dir: None,
            state: DriverState::Idle,
            time: 0,
            clock: 0,
            primary: 0,
            secondary: 0,
            captured: 0,
        })
    }

    /// Attach a trace sink for every following tick
    pub fn with_tracer(mut self, tracer: Box<dyn TraceSink>) -> Self {
        self.set_tracer(tracer);
        self
    }

    /// Replace the trace sink, flushing the previous one
    pub fn set_tracer(&mut self, tracer: Box<dyn TraceSink>) {
        if let Some(mut previous) = self.tracer.replace(tracer) {
            if let Err(e) = previous.flush() {
                log::warn!("Failed to flush replaced tracer: {}", e);
            }
        }
    }

    pub fn set_step_order(&mut self, order: StepOrder) {
        self.step_order = order;
    }

    /// Directory relative capture file names are resolved against
    pub fn set_capture_dir(&mut self, dir: Option<PathBuf>) {
        self.capture_dir = dir;
    }

    pub fn capture_dir(&self) -> Option<&Path> {
        self.capture_dir.as_deref()
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    pub fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    pub fn profile(&self) -> &DutProfile {
        &self.profile
    }

    /// External store, `None` unless the profile has a bus binding
    pub fn memory(&self) -> Option<&AddressSpace> {
        self.memory.as_ref()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn step_order(&self) -> StepOrder {
        self.step_order
    }

    /// Cumulative trace time
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Logical clock count of the current scenario
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Current primary clock level
    pub fn primary_level(&self) -> u32 {
        self.primary
    }

    /// Samples captured by the last run
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Read-only view for verification
    pub fn verifier(&self) -> Verifier<'_, D> {
        Verifier::new(&self.dut, &self.profile, self.memory.as_ref())
    }

    #[inline(always)]
    fn drive(&mut self, name: &str, value: u32) -> Result<()> {
        if self.dut.drive(name, value) {
            Ok(())
        } else {
            Err(BenchError::UnknownSignal {
                port: Port::Control,
                name: name.to_string(),
            })
        }
    }

    #[inline(always)]
    fn read(&self, port: Port, name: &str) -> Result<u32> {
        self.dut.read(port, name).ok_or_else(|| BenchError::UnknownSignal {
            port,
            name: name.to_string(),
        })
    }

    fn load_field(&mut self, entry: &FieldEntry) -> Result<()> {
        let field = &entry.field;
        let loaded = match field.port {
            Port::Control | Port::Input => self.dut.drive(&field.name, entry.value.value),
            port => self.dut.inject(port, &field.name, entry.value.value),
        };
        if loaded {
            Ok(())
        } else {
            Err(BenchError::UnknownSignal {
                port: field.port,
                name: field.name.clone(),
            })
        }
    }

    /// Reset the DUT and load a scenario's initial state
    ///
    /// Clears and loads the external store, drives every input pin to zero,
    /// clocks the DUT with reset asserted (secondary clock held low, hold
    /// input active), releases
    /// reset with the clocks high and finally injects the initial fields,
    /// the profile's post-reset values and the internal memory image.
    ///
    /// # Errors
    ///
    /// `BenchError::UnknownSignal` if the DUT lacks a signal the profile or
    /// scenario names. The bench stays in `Resetting` and refuses to run.
    pub fn reset(&mut self, scenario: &Scenario) -> Result<()> {
        self.state = DriverState::Resetting;
        self.clock = 0;
        self.captured = 0;
        log::debug!(
            "Resetting {} for scenario '{}' ({} reset cycles)",
            self.profile.name,
            scenario.name,
            self.profile.reset.cycles
        );

        if let Some(memory) = self.memory.as_mut() {
            memory.reset();
            memory.load(&scenario.initial.memory);
        }

        let reset = self.profile.reset.clone();
        let clock = self.profile.clock.clone();

        // Inputs the initial state does not reload must not keep the
        // previous scenario's last schedule vector
        let inputs: Vec<String> = self
            .profile
            .port_fields(Port::Input)
            .map(|field| field.name.clone())
            .collect();
        for name in &inputs {
            self.drive(name, 0)?;
        }

        if let Some(hold) = &reset.hold {
            self.drive(&hold.signal, hold.level)?;
        }
        self.drive(&reset.signal, reset.active_level)?;
        self.primary = 0;
        self.drive(&clock.primary, 0)?;
        if let Some(secondary) = &clock.secondary {
            self.secondary = 0;
            self.drive(&secondary.signal, 0)?;
        }

        let half_period = u64::from(clock.half_period);
        let ticks = 2 * half_period * u64::from(reset.cycles);
        for tick in 0..ticks {
            if tick % half_period == 0 {
                self.primary ^= 1;
                self.drive(&clock.primary, self.primary)?;
            }
            self.dut.step();
        }

        self.drive(&reset.signal, reset.inactive_level())?;
        self.primary = 1;
        self.drive(&clock.primary, 1)?;
        if let Some(secondary) = &clock.secondary {
            self.secondary = 1;
            self.drive(&secondary.signal, 1)?;
        }

        for entry in &scenario.initial.fields {
            self.load_field(entry)?;
        }
        for injection in &self.profile.post_reset {
            if !self.dut.inject(injection.port, &injection.name, injection.value) {
                return Err(BenchError::UnknownSignal {
                    port: injection.port,
                    name: injection.name.clone(),
                });
            }
        }

        if let MemoryBinding::Internal { depth } = self.profile.memory {
            for addr in 0..depth as u32 {
                self.inject_memory(addr, 0)?;
            }
            for &(addr, value) in &scenario.initial.memory {
                self.inject_memory(addr, value)?;
            }
        }

        self.state = DriverState::Running;
        Ok(())
    }

    fn inject_memory(&mut self, addr: u32, value: u8) -> Result<()> {
        if self.dut.inject_memory(addr, value) {
            Ok(())
        } else {
            Err(BenchError::NoMemory(self.profile.name.clone()))
        }
    }

    /// Run the scenario's cycles
    ///
    /// # Errors
    ///
    /// - `BenchError::NotReset` unless `reset()` completed for this scenario
    /// - `BenchError::Capture` if the capture file cannot be written
    /// - `BenchError::UnknownSignal` / `BenchError::Trace` for missing DUT
    ///   signals
    pub fn run(&mut self, scenario: &Scenario) -> Result<()> {
        self.run_observed(scenario, |_, _, _| {})
    }

    /// Run the scenario, reporting every tick to `observer`
    ///
    /// The observer receives the raw tick index, the tick's events and the
    /// logical clock after the tick.
    pub fn run_observed<F>(&mut self, scenario: &Scenario, mut observer: F) -> Result<()>
    where
        F: FnMut(u64, TickEvents, u64),
    {
        if self.state != DriverState::Running {
            return Err(BenchError::NotReset {
                state: self.state.as_str(),
            });
        }

        let clock = self.profile.clock.clone();
        let bus = match &self.profile.memory {
            MemoryBinding::External(bus) => Some(bus.clone()),
            _ => None,
        };
        let mut capture = match (&scenario.capture, &self.profile.capture) {
            (Some(file), Some(config)) => {
                let path = match &self.capture_dir {
                    Some(dir) => dir.join(file),
                    None => file.clone(),
                };
                Some((CaptureSink::create(&path)?, config.clone()))
            }
            (Some(file), None) => {
                log::warn!(
                    "Profile {} has no pixel output; ignoring capture file {}",
                    self.profile.name,
                    file.display()
                );
                None
            }
            _ => None,
        };

        let ticks = clock.ticks_for(scenario.cycles);
        log::debug!(
            "Running '{}': {} cycles, {} ticks, {}",
            scenario.name,
            scenario.cycles,
            ticks,
            self.step_order
        );

        for tick in 0..ticks {
            let mut events = TickEvents::empty();

            if let Some(bus) = &bus {
                if self.service_bus(bus)? {
                    events |= TickEvents::BUS_WRITE;
                }
            }

            if let Some(tracer) = self.tracer.as_mut() {
                tracer.record(self.time, &self.profile, &self.dut)?;
            }

            if clock.primary_toggles(tick) {
                self.primary ^= 1;
                self.drive(&clock.primary, self.primary)?;
                events |= TickEvents::PRIMARY_TOGGLED;
                if self.primary == 1 {
                    self.clock += 1;
                    events |= TickEvents::RISING_EDGE;
                }
            }
            if let Some(secondary) = &clock.secondary {
                if clock.secondary_toggles(tick) {
                    self.secondary ^= 1;
                    self.drive(&secondary.signal, self.secondary)?;
                    events |= TickEvents::SECONDARY_TOGGLED;
                }
            }

            let applied = match self.step_order {
                StepOrder::ApplyThenEvaluate => {
                    let applied = self.apply_schedule(scenario)?;
                    self.dut.step();
                    applied
                }
                StepOrder::EvaluateApplyEvaluate => {
                    self.dut.step();
                    let applied = self.apply_schedule(scenario)?;
                    self.dut.step();
                    applied
                }
            };
            if applied {
                events |= TickEvents::INPUTS_APPLIED;
            }

            if let Some((sink, config)) = capture.as_mut() {
                let counter = self.read(Port::Internal, &config.counter)?;
                if counter >= config.threshold && self.primary == 1 {
                    let high = self.read(Port::Output, &config.high)?;
                    let low = self.read(Port::Output, &config.low)?;
                    sink.push(pack_sample(config, high, low))?;
                    events |= TickEvents::PIXEL_CAPTURED;
                }
            }

            self.time += 1;
            observer(tick, events, self.clock);
        }

        if let Some((sink, _)) = capture {
            self.captured = sink.finish()?;
        }
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.flush()?;
        }

        self.state = DriverState::Done;
        Ok(())
    }

    /// Serve one bus cycle; returns whether the store was written
    #[inline(always)]
    fn service_bus(&mut self, bus: &BusBinding) -> Result<bool> {
        let address = self.read(Port::Output, &bus.address)?;
        let byte = self.memory.as_ref().map_or(0, |memory| memory.read(address));
        self.drive(&bus.data_in, u32::from(byte))?;

        let data = self.read(Port::Output, &bus.data_out)?;
        let strobe = self.read(Port::Output, &bus.write_strobe)?;
        let written = match self.memory.as_mut() {
            Some(memory) => memory.write(address, data as u8, strobe == bus.write_level),
            None => false,
        };
        if written {
            log::trace!("bus write 0x{:04x} <- 0x{:02x}", address, data);
        }
        Ok(written)
    }

    fn apply_schedule(&mut self, scenario: &Scenario) -> Result<bool> {
        let Some(inputs) = scenario.schedule.at(self.clock) else {
            return Ok(false);
        };
        for (name, value) in inputs {
            if !self.dut.drive(name, *value) {
                return Err(BenchError::UnknownSignal {
                    port: Port::Input,
                    name: name.clone(),
                });
            }
        }
        Ok(true)
    }
}

impl<D: Dut> Drop for Testbench<D> {
    fn drop(&mut self) {
        if let Some(tracer) = self.tracer.as_mut() {
            if let Err(e) = tracer.flush() {
                log::warn!("Failed to flush trace: {}", e);
            }
        }
        self.dut.finalize();
    }
}
