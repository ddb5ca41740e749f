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

//! Addressable store used as external memory for bus-based DUTs
//!
//! The [`AddressSpace`] is a flat array of byte cells. It stands in for the
//! RAM/ROM that a CPU-style DUT sees on its address and data bus, and it is
//! also used to build the "expected" shadow image that the verifier diffs
//! against at the end of a scenario.
//!
//! # Addressing
//!
//! Every address is bounded to the configured depth before it touches the
//! buffer, so a DUT that drives address lines wider than the store wraps
//! around instead of reading past the end:
//!
//! | Depth    | Address  | Cell     |
//! |----------|----------|----------|
//! | 0x10000  | 0x0000   | 0x0000   |
//! | 0x10000  | 0x1FFFF  | 0xFFFF   |
//! | 0x80     | 0x85     | 0x05     |
//!
//! # Example
//!
//! ```
//! use cyclebench::core::memory::AddressSpace;
//!
//! let mut mem = AddressSpace::new(0x10000);
//! mem.load(&[(0x0000, 0x38), (0x0001, 0xEA)]);
//!
//! // Gated write: nothing happens without the enable flag
//! mem.write(0x0000, 0xFF, false);
//! assert_eq!(mem.read(0x0000), 0x38);
//!
//! mem.write(0x0000, 0xFF, true);
//! assert_eq!(mem.read(0x0000), 0xFF);
//! ```

use std::fmt;

#[cfg(test)]
mod tests;

/// Flat byte-addressed store
///
/// Created once per test bench, cleared on [`AddressSpace::reset`] at the
/// start of every scenario and mutated only by the cycle driver's bus
/// service. The verifier reads it after the run.
#[derive(Clone, PartialEq, Eq)]
pub struct AddressSpace {
    /// Storage cells, `depth` bytes long
    cells: Vec<u8>,
}

impl AddressSpace {
    /// Address space depth of an 8-bit CPU with a 16-bit address bus
    pub const CPU_DEPTH: usize = 0x1_0000;

    /// Create a zero-filled address space
    ///
    /// # Arguments
    ///
    /// * `depth` - Number of byte cells (a depth of zero is raised to one)
    pub fn new(depth: usize) -> Self {
        Self {
            cells: vec![0u8; depth.max(1)],
        }
    }

    /// Number of addressable cells
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    /// Number of hex digits needed to print the highest address
    ///
    /// Never less than two, so 128-byte RAMs print as `0x7f` and 64KB
    /// spaces as `0xffff`.
    pub fn address_digits(&self) -> usize {
        hex_digits(self.depth() as u64 - 1)
    }

    /// Whether `addr` lies inside the store without wrapping
    pub fn contains(&self, addr: u32) -> bool {
        (addr as usize) < self.depth()
    }

    #[inline(always)]
    fn index(&self, addr: u32) -> usize {
        addr as usize % self.depth()
    }

    /// Read one byte
    #[inline(always)]
    pub fn read(&self, addr: u32) -> u8 {
        self.cells[self.index(addr)]
    }

    /// Write one byte if `enable` is set
    ///
    /// Returns whether the cell was written.
    #[inline(always)]
    pub fn write(&mut self, addr: u32, value: u8, enable: bool) -> bool {
        if enable {
            let index = self.index(addr);
            self.cells[index] = value;
        }
        enable
    }

    /// Zero every cell
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    /// Apply a batch of unconditional writes
    ///
    /// Later pairs win when an address appears more than once.
    pub fn load(&mut self, pairs: &[(u32, u8)]) {
        for &(addr, value) in pairs {
            self.write(addr, value, true);
        }
    }

    /// Build a store of the given depth from sparse pairs on a zero base
    pub fn from_pairs(depth: usize, pairs: &[(u32, u8)]) -> Self {
        let mut space = Self::new(depth);
        space.load(pairs);
        space
    }

    /// Every cell that differs from `expected`
    ///
    /// Yields `(address, expected, actual)` in ascending address order. Both
    /// stores are compared over the smaller of the two depths.
    pub fn mismatches<'a>(
        &'a self,
        expected: &'a AddressSpace,
    ) -> impl Iterator<Item = (u32, u8, u8)> + 'a {
        self.cells
            .iter()
            .zip(expected.cells.iter())
            .enumerate()
            .filter(|(_, (actual, expected))| actual != expected)
            .map(|(addr, (&actual, &expected))| (addr as u32, expected, actual))
    }

    /// Every non-zero cell as `(address, value)`
    pub fn non_zero(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &value)| value != 0)
            .map(|(addr, &value)| (addr as u32, value))
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(Self::CPU_DEPTH)
    }
}

impl fmt::Debug for AddressSpace {
    // Dumping 64KB of zeros helps nobody; show the populated cells only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.address_digits();
        let mut list = f.debug_map();
        for (addr, value) in self.non_zero() {
            list.entry(
                &format_args!("0x{:0width$x}", addr, width = digits),
                &format_args!("0x{:02x}", value),
            );
        }
        list.finish()
    }
}

/// Hex digits needed to print `value`, minimum two
pub fn hex_digits(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(4).max(2)
}
