// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Persisting traced paths and rebuilding stale ones
//!
//! These functions run against a store that is already inside a
//! transaction; [`crate::engine::CablePathEngine`] opens it.

use crate::error::Result;
use crate::store::TerminationStore;
use crate::trace::{trace, TracedPath};
use crate::types::{CablePath, NodeRef};
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Whether a trace may cascade into rebuilding other paths.
///
/// Rebuilding re-traces origins; a re-trace that rebuilt again could recurse
/// forever, so everything started from a rebuild runs as [`Self::Rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceScope {
    /// Called directly: afterwards, refresh paths that pass through the origin
    Origin,
    /// Called from inside a rebuild: no further cascading
    Rebuild,
}

impl CablePath {
    fn from_trace(origin: NodeRef, traced: TracedPath) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            destination: traced.destination,
            path: traced.path,
            is_active: traced.is_active,
            is_split: traced.is_split,
            created: Utc::now(),
        }
    }
}

/// Replace every path originating at `origin` with a fresh trace.
///
/// Prior paths are always removed. A missing origin, a pass-through origin
/// or an uncabled endpoint produce no new paths.
pub fn trace_from_origin<S: TerminationStore>(
    store: &mut S,
    origin: &NodeRef,
    scope: TraceScope,
) -> Result<Vec<CablePath>> {
    for stale in store.paths_from(origin) {
        store.delete_path(stale.id)?;
    }

    let Some(termination) = store.termination(origin) else {
        debug!("{origin} no longer exists; dropped its paths");
        return Ok(Vec::new());
    };
    if !termination.is_path_endpoint() {
        return Ok(Vec::new());
    }

    let paths: Vec<CablePath> = trace(&*store, &termination)
        .into_iter()
        .map(|traced| CablePath::from_trace(*origin, traced))
        .collect();
    for path in &paths {
        store.insert_path(path.clone())?;
    }
    store.set_origin_path(origin, paths.first().map(|p| p.id))?;

    for path in &paths {
        match path.destination {
            Some(destination) => debug!(
                "{origin} -> {destination} ({} nodes, active: {}, split: {})",
                path.path.len(),
                path.is_active,
                path.is_split
            ),
            None => debug!("{origin} -> partial ({} nodes)", path.path.len()),
        }
    }

    if scope == TraceScope::Origin {
        rebuild_paths_through(store, &[*origin])?;
    }
    Ok(paths)
}

/// Delete every path that traverses any of `nodes` and re-trace each origin
/// once. Returns the number of origins re-traced.
pub fn rebuild_paths_through<S: TerminationStore>(store: &mut S, nodes: &[NodeRef]) -> Result<usize> {
    let stale: Vec<CablePath> = nodes
        .iter()
        .flat_map(|node| store.paths_containing(node))
        .collect();
    retrace_paths(store, stale)
}

/// Delete the given paths and re-trace each distinct origin
pub fn retrace_paths<S: TerminationStore>(store: &mut S, stale: Vec<CablePath>) -> Result<usize> {
    let mut origins = BTreeSet::new();
    for path in stale {
        if store.delete_path(path.id)?.is_some() {
            origins.insert(path.origin);
        }
    }
    for origin in &origins {
        trace_from_origin(store, origin, TraceScope::Rebuild)?;
    }
    if !origins.is_empty() {
        info!("Rebuilt paths for {} origin(s)", origins.len());
    }
    Ok(origins.len())
}

/// Flip `is_active` off on every path through `node` without re-tracing.
/// Returns the number of paths updated.
pub fn deactivate_paths_through<S: TerminationStore>(store: &mut S, node: &NodeRef) -> Result<usize> {
    let paths = store.paths_containing(node);
    let mut updated = 0;
    for path in paths.iter().filter(|p| p.is_active) {
        store.set_path_active(path.id, false)?;
        updated += 1;
    }
    debug!("Deactivated {updated} path(s) through {node}");
    Ok(updated)
}
