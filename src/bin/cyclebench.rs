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

use clap::{Parser, Subcommand};
use cyclebench::core::config::BenchConfig;
use cyclebench::core::error::{BenchError, Result};
use cyclebench::core::scenario::{ExpectationPolicy, Scenario, SuiteRecord};
use cyclebench::core::signal::DutProfile;
use cyclebench::core::verifier::Diagnostic;
use log::{error, info, warn};
use std::path::PathBuf;

/// Conformance suite tooling
#[derive(Parser)]
#[command(name = "cyclebench")]
#[command(about = "Cycle-accurate conformance test engine", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Built-in profile, overrides the configuration
    #[arg(short = 'p', long)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a suite against the profile and list configuration errors
    Check {
        /// Suite file (.toml or .json)
        suite: PathBuf,
    },
    /// Print a built-in profile as TOML
    Profile {
        /// Profile name (mpu, riot, tia)
        name: String,
    },
}

fn load_config(args: &Args) -> Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            BenchConfig::load(path)?
        }
        None => BenchConfig::default(),
    };
    config.apply_env();
    if let Some(profile) = &args.profile {
        config.bench.profile = profile.clone();
        config.bench.profile_file = None;
    }
    Ok(config)
}

/// Resolve every scenario and print one line per scenario
///
/// Returns the number of rejected scenarios.
fn check(suite: &SuiteRecord, profile: &DutProfile, policy: ExpectationPolicy) -> usize {
    let mut rejected = 0;
    for group in &suite.groups {
        for record in &group.scenarios {
            match Scenario::from_record(record, profile, policy) {
                Ok(scenario) => println!(
                    "ok   {}: {} ({} cycles, {} scheduled vectors)",
                    group.name,
                    scenario.name,
                    scenario.cycles,
                    scenario.schedule.len()
                ),
                Err(e) => {
                    rejected += 1;
                    println!("bad  {}: {}", group.name, record.name);
                    println!("  {}", Diagnostic::from_error(&e));
                }
            }
        }
    }
    rejected
}

fn main() -> Result<()> {
    // .env is optional; only report files that exist but cannot be read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("cyclebench v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = load_config(&args)?;

    match &args.command {
        Command::Check { suite } => {
            let profile = config.resolve_profile().map_err(|e| {
                error!("Failed to resolve profile: {}", e);
                e
            })?;
            info!("Checking {} against profile {}", suite.display(), profile.name);

            let records = SuiteRecord::load(suite)?;
            if let Some(name) = records.profile.as_deref() {
                if name != profile.name {
                    warn!("Suite was written for profile '{}'", name);
                }
            }
            let policy = records.policy.unwrap_or(profile.policy);

            let rejected = check(&records, &profile, policy);
            println!(
                "{}: {} scenarios, {} rejected",
                profile.name,
                records.scenario_count(),
                rejected
            );
            if rejected > 0 {
                return Err(BenchError::Config(format!(
                    "{} scenarios do not match profile '{}'",
                    rejected, profile.name
                )));
            }
        }
        Command::Profile { name } => {
            let profile = DutProfile::builtin(name)?;
            print!("{}", profile.to_toml()?);
        }
    }

    Ok(())
}
