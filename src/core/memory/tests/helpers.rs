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

/// 64KB store with a short program at the reset vector
#[allow(dead_code)]
pub fn create_cpu_space() -> AddressSpace {
    AddressSpace::from_pairs(
        AddressSpace::CPU_DEPTH,
        &[(0x0000, 0x38), (0x0001, 0xEA), (0x0002, 0xEA)],
    )
}

/// 128-byte store, the size of a peripheral's internal RAM
#[allow(dead_code)]
pub fn create_small_space() -> AddressSpace {
    AddressSpace::new(128)
}
