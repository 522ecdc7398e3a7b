// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Cable commands - connect, re-status and disconnect terminations

use super::{describe, resolve_cable, resolve_termination, short_id, RunContext};
use crate::types::{Cable, CableStatus};
use anyhow::{Context, Result};

/// Arguments for cable commands
#[derive(Debug, Default, Clone, clap::Args)]
pub struct CableArgs {
    /// First end (id, id prefix, type:id or parent/name)
    #[arg(long)]
    pub a: Option<String>,
    /// Second end
    #[arg(long)]
    pub b: Option<String>,
    /// Status slug (connected, planned, decommissioning, ...)
    #[arg(long)]
    pub status: Option<String>,
    /// Cable label
    #[arg(long)]
    pub label: Option<String>,
}

/// Run cable command
pub fn run(ctx: &RunContext, action: &str, target: Option<String>, args: CableArgs) -> Result<()> {
    let mut engine = ctx.load()?;

    match action {
        "add" | "create" | "connect" => {
            let a = args.a.ok_or_else(|| anyhow::anyhow!("--a is required"))?;
            let b = args.b.ok_or_else(|| anyhow::anyhow!("--b is required"))?;
            let a = resolve_termination(engine.store(), &a)?;
            let b = resolve_termination(engine.store(), &b)?;
            let status = args.status.map(CableStatus::new).unwrap_or_default();

            let mut cable = Cable::new(a, b, status);
            if let Some(label) = args.label {
                cable = cable.with_label(label);
            }
            let id = engine.connect(cable).with_context(|| {
                format!(
                    "Failed to connect {} to {}",
                    describe(engine.store(), &a),
                    describe(engine.store(), &b)
                )
            })?;
            ctx.save(&engine)?;

            println!(
                "Connected {} <-> {}",
                describe(engine.store(), &a),
                describe(engine.store(), &b)
            );
            println!("  id: {id}");
        }

        "status" => {
            let key = target.ok_or_else(|| anyhow::anyhow!("cable id is required"))?;
            let status = args
                .status
                .map(CableStatus::new)
                .ok_or_else(|| anyhow::anyhow!("--status is required"))?;
            let id = resolve_cable(engine.store(), &key)?;
            engine
                .set_cable_status(id, status.clone())
                .with_context(|| format!("Failed to update cable {key}"))?;
            ctx.save(&engine)?;
            println!("Cable {} is now {status}", short_id(id));
        }

        "delete" | "remove" | "rm" | "disconnect" => {
            let key = target.ok_or_else(|| anyhow::anyhow!("cable id is required"))?;
            let id = resolve_cable(engine.store(), &key)?;
            let cable = engine
                .disconnect(id)
                .with_context(|| format!("Failed to delete cable {key}"))?;
            ctx.save(&engine)?;
            println!(
                "Disconnected {} <-> {}",
                describe(engine.store(), &cable.termination_a),
                describe(engine.store(), &cable.termination_b)
            );
        }

        "list" | "ls" => {
            let cables: Vec<&Cable> = engine.store().cables().collect();
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&cables)?);
                return Ok(());
            }
            if cables.is_empty() {
                println!("No cables defined. Use 'cablepath cable add' to create one.");
                return Ok(());
            }
            println!("Cables ({}):", cables.len());
            for cable in cables {
                println!(
                    "  {}  {} <-> {}  [{}]",
                    short_id(cable.id),
                    describe(engine.store(), &cable.termination_a),
                    describe(engine.store(), &cable.termination_b),
                    cable.status
                );
            }
        }

        other => {
            anyhow::bail!("Unknown action: {other}. Valid: add, status, delete, list");
        }
    }

    Ok(())
}
