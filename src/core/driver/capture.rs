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

//! Pixel capture sink: raw bytes, one per sample, no header

use crate::core::error::{BenchError, Result};
use crate::core::signal::CaptureConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pack the two capture fields into one sample byte
#[inline(always)]
pub fn pack_sample(config: &CaptureConfig, high: u32, low: u32) -> u8 {
    ((high << config.high_shift) | (low << config.low_shift)) as u8
}

/// Capture file scoped to one run
///
/// The file is closed when the sink is dropped, including on early return
/// from a failing run.
pub(crate) struct CaptureSink {
    path: PathBuf,
    output: BufWriter<File>,
    written: usize,
}

impl CaptureSink {
    pub(crate) fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| BenchError::Capture {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            output: BufWriter::new(file),
            written: 0,
        })
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, sample: u8) -> Result<()> {
        self.output
            .write_all(&[sample])
            .map_err(|source| self.error(source))?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of samples written
    pub(crate) fn finish(mut self) -> Result<usize> {
        self.output.flush().map_err(|source| self.error(source))?;
        log::debug!("Captured {} samples to {}", self.written, self.path.display());
        Ok(self.written)
    }

    fn error(&self, source: std::io::Error) -> BenchError {
        BenchError::Capture {
            path: self.path.display().to_string(),
            source,
        }
    }
}
