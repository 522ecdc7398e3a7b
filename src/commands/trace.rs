// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Trace command - show every path leaving a termination, hop by hop

use super::{describe, resolve_termination, RunContext};
use crate::store::{MemoryStore, TerminationStore};
use crate::types::{CablePath, NodeRef};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Run trace command
pub fn run(ctx: &RunContext, termination: &str, refresh: bool) -> Result<()> {
    let mut engine = ctx.load()?;
    let origin = resolve_termination(engine.store(), termination)?;

    if !origin.node_type.is_path_endpoint() {
        anyhow::bail!(
            "{} is a pass-through port; trace from an endpoint instead",
            describe(engine.store(), &origin)
        );
    }

    let mut paths = engine.store().paths_from(&origin);
    if refresh || paths.is_empty() {
        paths = engine
            .trace_from_origin(&origin)
            .with_context(|| format!("Failed to trace {origin}"))?;
        ctx.save(&engine)?;
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }
    if paths.is_empty() {
        println!("{} is not connected.", ctx.paint(engine.store(), &origin));
        return Ok(());
    }

    for (n, path) in paths.iter().enumerate() {
        if paths.len() > 1 {
            println!("Branch {} of {}:", n + 1, paths.len());
        }
        print_path(ctx, engine.store(), path);
        println!();
    }
    Ok(())
}

/// Render a path as numbered (near end, cable, far end) hops
pub fn print_path(ctx: &RunContext, store: &MemoryStore, path: &CablePath) {
    let blank = |node: Option<NodeRef>| match node {
        Some(node) => ctx.paint(store, &node),
        None => "-".to_string(),
    };

    for (n, segment) in path.segments().iter().enumerate() {
        println!("  {:>2}. {}", n + 1, blank(segment.near_end));
        let cable = match segment.cable {
            Some(cable) => {
                let status = store
                    .cable(cable.id)
                    .map(|c| c.status.to_string())
                    .unwrap_or_else(|| "missing".to_string());
                format!("{} [{status}]", ctx.paint(store, &cable))
            }
            None => "-".to_string(),
        };
        println!("      |  {cable}");
        println!("      {}", blank(segment.far_end));
    }

    let state = match (path.is_complete(), path.is_active) {
        (true, true) => "active",
        (true, false) => "complete, inactive",
        (false, _) => "partial",
    };
    let split = if path.is_split { ", split" } else { "" };
    if ctx.color {
        let summary = format!("{state}{split}");
        if path.is_active {
            println!("  {}", summary.green());
        } else {
            println!("  {}", summary.red());
        }
    } else {
        println!("  {state}{split}");
    }
}
