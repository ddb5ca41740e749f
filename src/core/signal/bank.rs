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

//! Profile-driven signal storage
//!
//! [`SignalBank`] holds one value per declared field, masked to the field
//! width, plus the internal memory for profiles that declare one. It is the
//! state half of a DUT: a model adapter keeps a bank and implements its
//! evaluation logic on top, and on its own the bank is a DUT whose `step()`
//! does nothing.
//!
//! # Example
//!
//! ```
//! use cyclebench::core::signal::{Dut, DutProfile, Port, SignalBank};
//!
//! let mut bank = SignalBank::new(&DutProfile::riot());
//! assert!(bank.drive("PA_IN", 0x1ff));
//! assert_eq!(bank.read(Port::Input, "PA_IN"), Some(0xff));
//!
//! // Outputs are not pins the engine may drive
//! assert!(!bank.drive("PA_OUT", 1));
//! assert!(bank.inject(Port::Output, "PA_OUT", 1));
//! ```

use super::{Dut, DutProfile, FieldDef, MemoryBinding, Port};
use crate::core::memory::AddressSpace;
use std::collections::HashMap;

/// Value storage for every field of one profile
#[derive(Debug, Clone)]
pub struct SignalBank {
    fields: Vec<FieldDef>,
    values: Vec<u32>,
    index: HashMap<Port, HashMap<String, usize>>,
    memory: Option<AddressSpace>,
    steps: u64,
}

impl SignalBank {
    /// Create a bank with every field at zero
    ///
    /// # Arguments
    ///
    /// * `profile` - Field table; internal memory is allocated for
    ///   `MemoryBinding::Internal` profiles only
    pub fn new(profile: &DutProfile) -> Self {
        let mut index: HashMap<Port, HashMap<String, usize>> = HashMap::new();
        for (slot, field) in profile.fields.iter().enumerate() {
            index
                .entry(field.port)
                .or_default()
                .insert(field.name.clone(), slot);
        }

        let memory = match &profile.memory {
            MemoryBinding::Internal { depth } => Some(AddressSpace::new(*depth)),
            _ => None,
        };

        Self {
            fields: profile.fields.clone(),
            values: vec![0; profile.fields.len()],
            index,
            memory,
            steps: 0,
        }
    }

    #[inline(always)]
    fn slot(&self, port: Port, name: &str) -> Option<usize> {
        self.index.get(&port)?.get(name).copied()
    }

    fn drivable_slot(&self, name: &str) -> Option<usize> {
        self.slot(Port::Control, name)
            .or_else(|| self.slot(Port::Input, name))
    }

    /// Current value of a field, or `None` if it is not declared
    #[inline(always)]
    pub fn get(&self, port: Port, name: &str) -> Option<u32> {
        self.slot(port, name).map(|slot| self.values[slot])
    }

    /// Set any field, masked to its width
    ///
    /// Model adapters use this to publish outputs and registers after
    /// evaluating. Returns `false` if the field is not declared.
    #[inline(always)]
    pub fn set(&mut self, port: Port, name: &str, value: u32) -> bool {
        match self.slot(port, name) {
            Some(slot) => {
                self.values[slot] = value & self.fields[slot].mask();
                true
            }
            None => false,
        }
    }

    /// Number of `step()` calls seen so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Count one evaluation
    pub fn count_step(&mut self) {
        self.steps += 1;
    }

    /// Internal memory, if the profile declares one
    pub fn memory(&self) -> Option<&AddressSpace> {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut AddressSpace> {
        self.memory.as_mut()
    }

    /// Every field with its current value, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDef, u32)> {
        self.fields.iter().zip(self.values.iter().copied())
    }
}

impl Dut for SignalBank {
    fn read(&self, port: Port, name: &str) -> Option<u32> {
        self.get(port, name)
    }

    fn drive(&mut self, name: &str, value: u32) -> bool {
        match self.drivable_slot(name) {
            Some(slot) => {
                self.values[slot] = value & self.fields[slot].mask();
                true
            }
            None => false,
        }
    }

    fn inject(&mut self, port: Port, name: &str, value: u32) -> bool {
        self.set(port, name, value)
    }

    fn peek_memory(&self, addr: u32) -> Option<u8> {
        self.memory.as_ref().map(|memory| memory.read(addr))
    }

    fn inject_memory(&mut self, addr: u32, value: u8) -> bool {
        match self.memory.as_mut() {
            Some(memory) => memory.write(addr, value, true),
            None => false,
        }
    }

    fn step(&mut self) {
        self.count_step();
    }
}
