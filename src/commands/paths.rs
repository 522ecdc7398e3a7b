// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Paths command - list stored cable paths

use super::{resolve_termination, short_id, RunContext};
use crate::store::TerminationStore;
use crate::types::CablePath;
use anyhow::Result;

/// Run paths command
pub fn run(ctx: &RunContext, origin: Option<String>) -> Result<()> {
    let engine = ctx.load()?;
    let store = engine.store();

    let paths: Vec<CablePath> = match origin {
        Some(key) => {
            let origin = resolve_termination(store, &key)?;
            store.paths_from(&origin)
        }
        None => store.paths().cloned().collect(),
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }
    if paths.is_empty() {
        println!("No cable paths. Connect two endpoints with 'cablepath cable add'.");
        return Ok(());
    }

    println!("Cable paths ({}):", paths.len());
    for path in &paths {
        let destination = path
            .destination
            .map_or_else(|| "(partial)".to_string(), |d| ctx.paint(store, &d));
        let mut flags = Vec::new();
        if path.is_active {
            flags.push("active");
        }
        if path.is_split {
            flags.push("split");
        }
        println!(
            "  {}  {} -> {}  {} hop(s) {}",
            short_id(path.id),
            ctx.paint(store, &path.origin),
            destination,
            path.segment_count(),
            if flags.is_empty() {
                String::new()
            } else {
                format!("[{}]", flags.join(", "))
            }
        );
    }
    Ok(())
}
