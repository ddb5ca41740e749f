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

/// Test bench error types
use thiserror::Error;

use crate::core::signal::Port;

/// Result type for test bench operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the test bench
///
/// Verification mismatches are never reported through this type; they are
/// recorded as diagnostics by the verifier. Everything here aborts at most
/// the scenario it occurred in.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("unknown {port} field '{name}' for profile '{profile}'")]
    UnknownField {
        profile: String,
        port: Port,
        name: String,
    },

    #[error("value 0x{value:x} does not fit {bits}-bit {port} field '{name}'")]
    ValueTooWide {
        port: Port,
        name: String,
        value: u32,
        bits: u8,
    },

    #[error("DUT does not expose {port} signal '{name}'")]
    UnknownSignal { port: Port, name: String },

    #[error("address 0x{address:04x} is outside memory depth 0x{depth:04x}")]
    AddressOutOfRange { address: u32, depth: usize },

    #[error("memory image given for profile '{0}' which has no memory binding")]
    NoMemory(String),

    #[error("test bench is {state}, expected a freshly reset scenario")]
    NotReset { state: &'static str },

    #[error("invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("capture sink '{path}': {source}")]
    Capture {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("trace sink: {0}")]
    Trace(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BenchError {
    /// Whether this error stems from malformed or missing scenario data
    /// rather than from a failing resource.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BenchError::UnknownField { .. }
                | BenchError::ValueTooWide { .. }
                | BenchError::UnknownSignal { .. }
                | BenchError::AddressOutOfRange { .. }
                | BenchError::NoMemory(_)
                | BenchError::InvalidProfile { .. }
                | BenchError::UnknownProfile(_)
                | BenchError::Parse(_)
                | BenchError::Config(_)
        )
    }
}

impl From<toml::de::Error> for BenchError {
    fn from(err: toml::de::Error) -> Self {
        BenchError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Parse(err.to_string())
    }
}
