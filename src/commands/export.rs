// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - exports the cabling topology to various formats

use super::RunContext;
use crate::topology::Topology;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// The full inventory as JSON
    Json,
}

impl ExportFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Some(Self::Dot),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get file extension for format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub fn run(ctx: &RunContext, format: &str, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {format}. Supported: dot, json"))?;

    let engine = ctx.load()?;
    let store = engine.store();
    if store.terminations().next().is_none() {
        eprintln!("Warning: Inventory is empty. Run 'cablepath termination add' first.");
    }

    let content = match export_format {
        ExportFormat::Dot => {
            let topology = Topology::from_store(store);
            info!(
                "{} termination(s), {} link(s), {} island(s)",
                topology.node_count(),
                topology.edge_count(),
                topology.island_count()
            );
            topology.to_dot()
        }
        ExportFormat::Json => serde_json::to_string_pretty(store.inventory())
            .context("Failed to serialize inventory to JSON")?,
    };

    match output {
        Some(path) => {
            let path = if path.extension().is_none() {
                path.with_extension(export_format.extension())
            } else {
                path
            };
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
