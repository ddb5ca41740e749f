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

//! Signal tracer for debugging
//!
//! Records every declared field of the DUT once per raw tick. The trace time
//! is the test bench's cumulative time, which keeps increasing across resets
//! and scenarios, so one trace covers a whole suite.

use crate::core::error::{BenchError, Result};
use crate::core::signal::{Dut, DutProfile, Port};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination of per-tick signal snapshots
pub trait TraceSink {
    /// Record the DUT's signals at cumulative time `time`
    fn record(&mut self, time: u64, profile: &DutProfile, dut: &dyn Dut) -> Result<()>;

    /// Push buffered output to its destination
    fn flush(&mut self) -> Result<()>;
}

/// Text tracer writing one line per tick
///
/// Each line holds the time followed by every field, grouped by port:
///
/// ```text
///        3 | CLK=01 RES_N=01 RDY=01 DB_IN=38 | AB=0001 DB_OUT=00 R_W=01 | A=11 ...
/// ```
///
/// # Example
/// ```
/// use cyclebench::core::driver::{SignalTracer, TraceSink};
/// use cyclebench::core::signal::{DutProfile, SignalBank};
///
/// let profile = DutProfile::riot();
/// let bank = SignalBank::new(&profile);
/// let mut tracer = SignalTracer::new(Vec::new());
///
/// tracer.record(0, &profile, &bank).unwrap();
/// let text = String::from_utf8(tracer.into_inner()).unwrap();
/// assert!(text.contains("DDRA=00"));
/// ```
pub struct SignalTracer<W: Write = BufWriter<File>> {
    /// Enable/disable tracing
    enabled: bool,
    /// Output handle
    output: W,
}

impl SignalTracer {
    /// Create a tracer writing to a file
    ///
    /// If the file exists, it will be overwritten.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the output trace file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let output = File::create(path.as_ref())?;
        log::info!("Tracing signals to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(output)))
    }
}

impl<W: Write> SignalTracer<W> {
    pub fn new(output: W) -> Self {
        Self {
            enabled: true,
            output,
        }
    }

    /// Enable or disable tracing
    ///
    /// When disabled, `record()` returns immediately without writing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> TraceSink for SignalTracer<W> {
    fn record(&mut self, time: u64, profile: &DutProfile, dut: &dyn Dut) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut line = format!("{:>8}", time);
        for port in [
            Port::Control,
            Port::Input,
            Port::Output,
            Port::Register,
            Port::Internal,
        ] {
            let mut fields = profile.port_fields(port).peekable();
            if fields.peek().is_none() {
                continue;
            }
            line.push_str(" |");
            for field in fields {
                let value = dut.read(port, &field.name).ok_or_else(|| {
                    BenchError::Trace(format!("DUT does not expose {} '{}'", port, field.name))
                })?;
                line.push_str(&format!(
                    " {}={:0width$x}",
                    field.name,
                    value,
                    width = field.hex_digits()
                ));
            }
        }

        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}
