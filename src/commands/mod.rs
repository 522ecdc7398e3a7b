// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod cable;
pub mod completions;
pub mod config;
pub mod export;
pub mod paths;
pub mod retrace;
pub mod termination;
pub mod trace;

use crate::engine::CablePathEngine;
use crate::store::MemoryStore;
use crate::types::{NodeRef, NodeType, Termination};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use uuid::Uuid;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory holding `inventory.json`
    pub data_dir: PathBuf,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
    /// Retrace progress interval
    pub progress_every: u64,
}

impl RunContext {
    /// Load the inventory from the data directory
    pub fn load(&self) -> Result<CablePathEngine<MemoryStore>> {
        let store = MemoryStore::load(&self.data_dir).with_context(|| {
            format!("Failed to load inventory from {}", self.data_dir.display())
        })?;
        Ok(CablePathEngine::new(store))
    }

    /// Write the inventory back to the data directory
    pub fn save(&self, engine: &CablePathEngine<MemoryStore>) -> Result<()> {
        engine
            .store()
            .save(&self.data_dir)
            .with_context(|| format!("Failed to save inventory to {}", self.data_dir.display()))
    }

    /// Print a node reference, colored by kind when enabled
    pub fn paint(&self, store: &MemoryStore, node: &NodeRef) -> String {
        let text = describe(store, node);
        if !self.color {
            return text;
        }
        if node.is_cable() {
            text.cyan().to_string()
        } else if node.node_type.is_pass_through() {
            text.yellow().to_string()
        } else {
            text.bold().to_string()
        }
    }
}

/// `parent name (type)` for a termination, `cable <id>` for a cable
pub fn describe(store: &MemoryStore, node: &NodeRef) -> String {
    if node.is_cable() {
        let label = store
            .inventory()
            .cables
            .get(&node.id)
            .and_then(|cable| cable.label.clone());
        return match label {
            Some(label) => format!("cable {label}"),
            None => format!("cable {}", short_id(node.id)),
        };
    }
    match store.find_termination(node.id) {
        Some(termination) => format!(
            "{} ({})",
            termination.display_name(),
            termination.node_type().model()
        ),
        None => format!("{node} (missing)"),
    }
}

/// First eight hex digits of an id
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Resolve a termination from a full id, a `type:id` reference, an id
/// prefix, or `parent/name`
pub fn resolve_termination(store: &MemoryStore, key: &str) -> Result<NodeRef> {
    if let Some((node_type, id)) = key.rsplit_once(':') {
        if let (Ok(node_type), Ok(id)) = (node_type.parse::<NodeType>(), Uuid::parse_str(id)) {
            return store
                .find_termination(id)
                .filter(|t| t.node_type() == node_type)
                .map(Termination::node_ref)
                .ok_or_else(|| anyhow::anyhow!("Termination not found: {key}"));
        }
    }
    if let Ok(id) = Uuid::parse_str(key) {
        return store
            .find_termination(id)
            .map(Termination::node_ref)
            .ok_or_else(|| anyhow::anyhow!("Termination not found: {key}"));
    }

    let wanted = key.to_lowercase();
    let matches: Vec<&Termination> = store
        .terminations()
        .filter(|t| {
            t.id.simple().to_string().starts_with(&wanted)
                || format!("{}/{}", t.parent, t.name).to_lowercase() == wanted
        })
        .collect();

    match matches.as_slice() {
        [] => anyhow::bail!("No termination found matching: {key}"),
        [one] => Ok(one.node_ref()),
        many => {
            eprintln!("Multiple terminations match '{key}':");
            for t in many {
                eprintln!("  {} ({})", t.display_name(), t.node_ref());
            }
            anyhow::bail!("Ambiguous termination. Use the full id.");
        }
    }
}

/// Resolve a cable from its id or an id prefix
pub fn resolve_cable(store: &MemoryStore, key: &str) -> Result<Uuid> {
    let wanted = key.trim_start_matches("dcim.cable:").to_lowercase();
    let matches: Vec<Uuid> = store
        .cables()
        .map(|cable| cable.id)
        .filter(|id| {
            id.to_string() == wanted
                || id.simple().to_string().starts_with(&wanted)
                || store.inventory().cables[id].label.as_deref() == Some(key)
        })
        .collect();

    match matches.as_slice() {
        [] => anyhow::bail!("No cable found matching: {key}"),
        [one] => Ok(*one),
        _ => anyhow::bail!("Ambiguous cable '{key}'. Use the full id."),
    }
}
