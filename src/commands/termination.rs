// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Termination commands - add, list and delete cable endpoints and ports

use super::{describe, resolve_termination, short_id, RunContext};
use crate::store::MemoryStore;
use crate::types::{NodeType, TermSide, Termination, TerminationKind};
use anyhow::{Context, Result};
use uuid::Uuid;

/// Arguments for termination commands
#[derive(Debug, Default, Clone, clap::Args)]
pub struct TerminationArgs {
    /// Termination type (interface, frontport, rearport, circuittermination, ...)
    #[arg(long)]
    pub kind: Option<String>,
    /// Name (e.g. eth0)
    #[arg(long)]
    pub name: Option<String>,
    /// Owning device, panel or circuit
    #[arg(long)]
    pub parent: Option<String>,
    /// Rear port a front port maps to
    #[arg(long)]
    pub rear_port: Option<String>,
    /// Rear port position of a front port
    #[arg(long)]
    pub position: Option<u16>,
    /// Number of positions on a rear port
    #[arg(long)]
    pub positions: Option<u16>,
    /// Circuit id of a circuit termination
    #[arg(long)]
    pub circuit: Option<Uuid>,
    /// Circuit side (A or Z)
    #[arg(long)]
    pub side: Option<String>,
}

/// Run termination command
pub fn run(ctx: &RunContext, action: &str, target: Option<String>, args: TerminationArgs) -> Result<()> {
    let mut engine = ctx.load()?;

    match action {
        "add" | "create" => {
            let termination = build(engine.store(), args)?;
            let node = engine
                .add_termination(termination)
                .context("Failed to add termination")?;
            ctx.save(&engine)?;
            println!("Added {}", describe(engine.store(), &node));
            println!("  id: {}", node.id);
        }

        "list" | "ls" => {
            let filter = args
                .kind
                .as_deref()
                .map(str::parse::<NodeType>)
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
            let terminations: Vec<&Termination> = engine
                .store()
                .terminations()
                .filter(|t| filter.map_or(true, |kind| t.node_type() == kind))
                .collect();

            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&terminations)?);
                return Ok(());
            }
            if terminations.is_empty() {
                println!("No terminations defined. Use 'cablepath termination add' to create one.");
                return Ok(());
            }
            println!("Terminations ({}):", terminations.len());
            for t in terminations {
                let cable = t
                    .cable
                    .map(|id| format!(" cable {}", short_id(id)))
                    .unwrap_or_default();
                println!(
                    "  {}  {:<24} {}{}",
                    short_id(t.id),
                    t.display_name(),
                    t.node_type().model(),
                    cable
                );
            }
        }

        "delete" | "remove" | "rm" => {
            let key = target.ok_or_else(|| anyhow::anyhow!("termination id is required"))?;
            let node = resolve_termination(engine.store(), &key)?;
            let label = describe(engine.store(), &node);
            engine
                .delete_termination(&node)
                .with_context(|| format!("Failed to delete {label}"))?;
            ctx.save(&engine)?;
            println!("Deleted {label}");
        }

        other => {
            anyhow::bail!("Unknown action: {other}. Valid: add, list, delete");
        }
    }

    Ok(())
}

/// Turn command-line arguments into a new termination
fn build(store: &MemoryStore, args: TerminationArgs) -> Result<Termination> {
    let kind_name = args.kind.ok_or_else(|| anyhow::anyhow!("--kind is required"))?;
    let node_type: NodeType = kind_name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let parent = args.parent.unwrap_or_default();

    let kind = match node_type {
        NodeType::Interface => TerminationKind::Interface,
        NodeType::ConsolePort => TerminationKind::ConsolePort,
        NodeType::ConsoleServerPort => TerminationKind::ConsoleServerPort,
        NodeType::PowerPort => TerminationKind::PowerPort,
        NodeType::PowerOutlet => TerminationKind::PowerOutlet,
        NodeType::PowerFeed => TerminationKind::PowerFeed,
        NodeType::RearPort => TerminationKind::RearPort {
            positions: args.positions.unwrap_or(1),
        },
        NodeType::FrontPort => {
            let rear = args
                .rear_port
                .ok_or_else(|| anyhow::anyhow!("--rear-port is required for a front port"))?;
            let rear = resolve_termination(store, &rear)?;
            if rear.node_type != NodeType::RearPort {
                anyhow::bail!("{} is not a rear port", describe(store, &rear));
            }
            TerminationKind::FrontPort {
                rear_port: rear.id,
                rear_port_position: args.position.unwrap_or(1),
            }
        }
        NodeType::CircuitTermination => {
            let circuit = args
                .circuit
                .ok_or_else(|| anyhow::anyhow!("--circuit is required for a circuit termination"))?;
            let side = args
                .side
                .as_deref()
                .unwrap_or("A")
                .parse::<TermSide>()
                .map_err(|e| anyhow::anyhow!(e))?;
            TerminationKind::CircuitTermination {
                circuit,
                term_side: side,
            }
        }
        NodeType::Cable => anyhow::bail!("Use 'cablepath cable add' to create cables"),
    };

    let name = match (args.name, &kind) {
        (Some(name), _) => name,
        (None, TerminationKind::CircuitTermination { term_side, .. }) => format!("{term_side:?}"),
        (None, _) => anyhow::bail!("--name is required"),
    };

    Ok(Termination::new(name, parent, kind))
}
