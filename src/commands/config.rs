// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - print the effective configuration

use crate::config::Config;
use anyhow::{Context, Result};

/// Print `config` as TOML, or a single key's value
pub fn run(config: &Config, key: Option<&str>) -> Result<()> {
    match key {
        None => {
            let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
            print!("{text}");
        }
        Some("data_dir") => println!("{}", config.data_dir.display()),
        Some("log_level") => println!("{}", config.log_level),
        Some("progress_every") => println!("{}", config.progress_every),
        Some(other) => {
            anyhow::bail!("Unknown configuration key: {other}. Valid: data_dir, log_level, progress_every")
        }
    }
    Ok(())
}
