// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Retrace command - batch trace endpoints that lack a path

use super::RunContext;
use crate::engine::RetraceSummary;
use crate::types::NodeType;
use anyhow::{Context, Result};
use tracing::info;

/// Run retrace command
pub fn run(ctx: &RunContext, kind: Option<String>, force: bool) -> Result<()> {
    let mut engine = ctx.load()?;
    let every = ctx.progress_every;
    let report = |node_type: NodeType, done: usize, total: usize| {
        if every > 0 && (done as u64 % every == 0 || done == total) {
            info!("{node_type}: {done}/{total}");
        }
    };

    let summaries: Vec<RetraceSummary> = match kind {
        Some(kind) => {
            let node_type: NodeType = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            if !node_type.is_path_endpoint() {
                anyhow::bail!("{node_type} does not originate cable paths");
            }
            vec![engine
                .retrace_missing_paths(node_type, force, |done, total| report(node_type, done, total))
                .with_context(|| format!("Failed to retrace {node_type}"))?]
        }
        None => engine
            .retrace_all(force, report)
            .context("Failed to retrace cable paths")?,
    };
    ctx.save(&engine)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for summary in &summaries {
        if force {
            println!(
                "{:<28} deleted {:>5}  traced {:>5}  created {:>5}",
                summary.node_type.label(),
                summary.paths_deleted,
                summary.origins,
                summary.paths_created
            );
        } else {
            println!(
                "{:<28} traced {:>5}  created {:>5}",
                summary.node_type.label(),
                summary.origins,
                summary.paths_created
            );
        }
    }
    Ok(())
}
