// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Cable path engine: trigger hooks, batch retrace and validated mutations
//!
//! Every public method runs inside one store transaction. The hooks are
//! written as free functions over `&mut S` so a mutation can save an object
//! and run its hook in the same transaction.

use crate::error::{Error, Result};
use crate::paths::{self, TraceScope};
use crate::store::TerminationStore;
use crate::types::{Cable, CablePath, CableStatus, NodeRef, NodeType, Role, Termination};
use crate::validation::{validate_cable, validate_termination};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Counts from one [`CablePathEngine::retrace_missing_paths`] run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetraceSummary {
    /// Endpoint type that was retraced
    pub node_type: NodeType,
    /// Origins traced
    pub origins: usize,
    /// Paths written
    pub paths_created: usize,
    /// Paths removed up front (`force` only)
    pub paths_deleted: usize,
}

impl RetraceSummary {
    fn empty(node_type: NodeType) -> Self {
        Self {
            node_type,
            origins: 0,
            paths_created: 0,
            paths_deleted: 0,
        }
    }
}

/// Computes and maintains cable paths over a [`TerminationStore`]
#[derive(Debug, Clone, Default)]
pub struct CablePathEngine<S> {
    store: S,
}

impl<S: TerminationStore> CablePathEngine<S> {
    /// Wrap a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access that bypasses validation and hooks
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give the store back
    pub fn into_store(self) -> S {
        self.store
    }

    /// Destination of the cached path of `origin`, if it has one
    pub fn connected_endpoint(&self, origin: &NodeRef) -> Option<NodeRef> {
        let termination = self.store.termination(origin)?;
        self.store.path(termination.path?)?.destination
    }

    // =========================================================================
    // Tracing
    // =========================================================================

    /// Trace every path from `origin` and replace the stored ones.
    ///
    /// Paths that traverse `origin` itself are rebuilt afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a write; nothing is kept.
    pub fn trace_from_origin(&mut self, origin: &NodeRef) -> Result<Vec<CablePath>> {
        self.store
            .atomic(|store| paths::trace_from_origin(store, origin, TraceScope::Origin))
    }

    /// Re-trace every origin whose path traverses `node`.
    /// Returns the number of origins re-traced.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a write; nothing is kept.
    pub fn rebuild_paths_through(&mut self, node: &NodeRef) -> Result<usize> {
        self.store
            .atomic(|store| paths::rebuild_paths_through(store, &[*node]))
    }

    /// Trace every cabled endpoint of `node_type` that has no cached path.
    ///
    /// With `force`, every path originating from the type is deleted first
    /// and every cabled endpoint is traced. `progress` is called with
    /// `(done, total)` after each origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a write; nothing is kept.
    pub fn retrace_missing_paths(
        &mut self,
        node_type: NodeType,
        force: bool,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<RetraceSummary> {
        self.store
            .atomic(|store| retrace_missing(store, node_type, force, &mut progress))
    }

    /// [`Self::retrace_missing_paths`] for every endpoint type in turn
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a write; nothing is kept.
    pub fn retrace_all(
        &mut self,
        force: bool,
        mut progress: impl FnMut(NodeType, usize, usize),
    ) -> Result<Vec<RetraceSummary>> {
        self.store.atomic(|store| {
            NodeType::PATH_ENDPOINTS
                .iter()
                .map(|&node_type| {
                    retrace_missing(store, node_type, force, &mut |done, total| {
                        progress(node_type, done, total);
                    })
                })
                .collect()
        })
    }

    // =========================================================================
    // Trigger hooks
    // =========================================================================

    /// A cable was saved. `created` is true on first save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the cable is not in the store, or a
    /// store error; nothing is kept.
    pub fn on_cable_saved(&mut self, cable_id: Uuid, created: bool) -> Result<()> {
        self.store
            .atomic(|store| cable_saved(store, cable_id, created))
    }

    /// A cable's status changed from `previous`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the cable is not in the store, or a
    /// store error; nothing is kept.
    pub fn on_cable_status_changed(&mut self, cable_id: Uuid, previous: &CableStatus) -> Result<()> {
        self.store
            .atomic(|store| cable_status_changed(store, cable_id, previous))
    }

    /// A cable was removed from the store
    ///
    /// # Errors
    ///
    /// Returns a store error; nothing is kept.
    pub fn on_cable_deleted(&mut self, cable: &Cable) -> Result<()> {
        self.store.atomic(|store| cable_deleted(store, cable))
    }

    /// A termination was created (`previous` is `None`) or updated
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the termination is not in the store, or
    /// a store error; nothing is kept.
    pub fn on_termination_saved(
        &mut self,
        termination: &NodeRef,
        previous: Option<&Termination>,
    ) -> Result<()> {
        self.store
            .atomic(|store| termination_saved(store, termination, previous))
    }

    /// A termination was removed from the store
    ///
    /// # Errors
    ///
    /// Returns a store error; nothing is kept.
    pub fn on_termination_deleted(&mut self, termination: &Termination) -> Result<()> {
        self.store
            .atomic(|store| termination_deleted(store, termination))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Validate and store a new termination. Cached fields are cleared.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ValidationError`] if the termination is
    /// rejected, or a store error.
    pub fn add_termination(&mut self, mut termination: Termination) -> Result<NodeRef> {
        self.store.atomic(|store| {
            validate_termination(store, &termination, None)?;
            termination.cable = None;
            termination.cable_peer = None;
            termination.path = None;
            let node = termination.node_ref();
            store.put_termination(termination)?;
            termination_saved(store, &node, None)?;
            debug!("Added {node}");
            Ok(node)
        })
    }

    /// Validate and store a changed termination, keeping its cached cable,
    /// peer and path
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no termination with that id exists, a
    /// validation error (including a change of type), or a store error.
    pub fn update_termination(&mut self, mut termination: Termination) -> Result<()> {
        self.store.atomic(|store| {
            let node = termination.node_ref();
            let previous = store
                .termination(&node)
                .or_else(|| {
                    NodeType::TERMINATIONS
                        .iter()
                        .find_map(|t| store.termination(&NodeRef::new(*t, node.id)))
                })
                .ok_or(Error::NotFound(node))?;
            validate_termination(store, &termination, Some(&previous))?;
            termination.cable = previous.cable;
            termination.cable_peer = previous.cable_peer;
            termination.path = previous.path;
            store.put_termination(termination)?;
            termination_saved(store, &node, Some(&previous))
        })
    }

    /// Delete a termination with its cable and paths. A rear port takes its
    /// front ports with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the termination does not exist, or a
    /// store error.
    pub fn delete_termination(&mut self, node: &NodeRef) -> Result<Termination> {
        self.store.atomic(|store| delete_cascade(store, node))
    }

    /// Validate and store a new cable, then trace through it
    ///
    /// # Errors
    ///
    /// Returns a validation error if the cable is rejected, or a store error.
    pub fn connect(&mut self, cable: Cable) -> Result<Uuid> {
        self.store.atomic(|store| {
            validate_cable(store, &cable)?;
            let id = cable.id;
            info!("Connecting {} <-> {}", cable.termination_a, cable.termination_b);
            store.put_cable(cable)?;
            cable_saved(store, id, true)?;
            Ok(id)
        })
    }

    /// Change a cable's status and propagate it to the paths through it
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the cable does not exist, or a store
    /// error.
    pub fn set_cable_status(&mut self, cable_id: Uuid, status: CableStatus) -> Result<()> {
        self.store.atomic(|store| {
            let mut cable = store
                .cable(cable_id)
                .ok_or(Error::NotFound(NodeRef::cable(cable_id)))?;
            if cable.status == status {
                return Ok(());
            }
            let previous = std::mem::replace(&mut cable.status, status);
            store.put_cable(cable)?;
            cable_saved(store, cable_id, false)?;
            cable_status_changed(store, cable_id, &previous)
        })
    }

    /// Remove a cable and rebuild the paths that used it
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the cable does not exist, or a store
    /// error.
    pub fn disconnect(&mut self, cable_id: Uuid) -> Result<Cable> {
        self.store.atomic(|store| {
            let cable = store
                .remove_cable(cable_id)?
                .ok_or(Error::NotFound(NodeRef::cable(cable_id)))?;
            info!("Disconnecting {} <-> {}", cable.termination_a, cable.termination_b);
            cable_deleted(store, &cable)?;
            Ok(cable)
        })
    }
}

// =============================================================================
// Hooks
// =============================================================================

fn cable_saved<S: TerminationStore>(store: &mut S, cable_id: Uuid, created: bool) -> Result<()> {
    let cable = store
        .cable(cable_id)
        .ok_or(Error::NotFound(NodeRef::cable(cable_id)))?;
    let [a, b] = cable.ends();
    store.set_cable_cache(&a, Some(cable.id), Some(b))?;
    store.set_cable_cache(&b, Some(cable.id), Some(a))?;
    debug!("Cached {} on {a} and {b}", cable.node_ref());

    if !created {
        return Ok(());
    }

    let ends = if a == b { vec![a] } else { vec![a, b] };
    for end in ends {
        let Some(termination) = store.termination(&end) else {
            continue;
        };
        if termination.is_path_endpoint() {
            paths::trace_from_origin(store, &end, TraceScope::Origin)?;
        } else {
            let mut nodes = vec![end];
            if let Role::FrontPort { rear_port, .. } = termination.kind.role() {
                nodes.push(NodeRef::new(NodeType::RearPort, rear_port));
            }
            paths::rebuild_paths_through(store, &nodes)?;
        }
    }
    Ok(())
}

fn cable_status_changed<S: TerminationStore>(
    store: &mut S,
    cable_id: Uuid,
    previous: &CableStatus,
) -> Result<()> {
    let cable = store
        .cable(cable_id)
        .ok_or(Error::NotFound(NodeRef::cable(cable_id)))?;
    match (previous.is_connected(), cable.is_connected()) {
        (true, false) => {
            paths::deactivate_paths_through(store, &cable.node_ref())?;
        }
        (false, true) => {
            paths::rebuild_paths_through(store, &[cable.node_ref()])?;
        }
        _ => debug!("{} status {previous} -> {}: paths unchanged", cable.node_ref(), cable.status),
    }
    Ok(())
}

fn cable_deleted<S: TerminationStore>(store: &mut S, cable: &Cable) -> Result<()> {
    for end in cable.ends() {
        if let Some(termination) = store.termination(&end) {
            if termination.cable == Some(cable.id) {
                store.set_cable_cache(&end, None, None)?;
            }
        }
    }
    paths::rebuild_paths_through(store, &[cable.node_ref()])?;
    Ok(())
}

fn termination_saved<S: TerminationStore>(
    store: &mut S,
    node: &NodeRef,
    previous: Option<&Termination>,
) -> Result<()> {
    let current = store.termination(node).ok_or(Error::NotFound(*node))?;
    if previous.is_some_and(|p| p.kind == current.kind) {
        return Ok(());
    }

    let mut nodes = vec![*node];
    let mut stale = Vec::new();
    match current.kind.role() {
        Role::FrontPort { rear_port, .. } => {
            nodes.push(NodeRef::new(NodeType::RearPort, rear_port));
            if let Some((old_rear, _)) = previous.and_then(|p| p.kind.front_port_mapping()) {
                if old_rear != rear_port {
                    nodes.push(NodeRef::new(NodeType::RearPort, old_rear));
                }
            }
        }
        Role::RearPort { .. } => {
            nodes.extend(store.front_ports(current.id).iter().map(Termination::node_ref));
        }
        Role::CircuitEnd { .. } => {
            let peers = [Some(&current), previous]
                .into_iter()
                .flatten()
                .filter_map(|t| store.circuit_peer(t))
                .filter(|peer| peer.id != current.id);
            for peer in peers {
                let peer = peer.node_ref();
                stale.extend(store.paths_to(&peer));
                nodes.push(peer);
            }
        }
        Role::Endpoint => return Ok(()),
    }

    for node in &nodes {
        stale.extend(store.paths_containing(node));
    }
    paths::retrace_paths(store, stale)?;
    Ok(())
}

fn termination_deleted<S: TerminationStore>(store: &mut S, termination: &Termination) -> Result<()> {
    let node = termination.node_ref();
    if let Some(cable_id) = termination.cable {
        if let Some(cable) = store.remove_cable(cable_id)? {
            debug!("Removing {} with {node}", cable.node_ref());
            cable_deleted(store, &cable)?;
        }
    }
    for path in store.paths_from(&node) {
        store.delete_path(path.id)?;
    }
    let mut stale = store.paths_containing(&node);
    stale.extend(store.paths_to(&node));
    paths::retrace_paths(store, stale)?;
    Ok(())
}

fn delete_cascade<S: TerminationStore>(store: &mut S, node: &NodeRef) -> Result<Termination> {
    let termination = store.termination(node).ok_or(Error::NotFound(*node))?;
    if node.node_type == NodeType::RearPort {
        for front in store.front_ports(termination.id) {
            delete_cascade(store, &front.node_ref())?;
        }
    }
    store.remove_termination(node)?;
    termination_deleted(store, &termination)?;
    info!("Deleted {node}");
    Ok(termination)
}

fn retrace_missing<S: TerminationStore>(
    store: &mut S,
    node_type: NodeType,
    force: bool,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<RetraceSummary> {
    let mut summary = RetraceSummary::empty(node_type);
    if !node_type.is_path_endpoint() {
        return Ok(summary);
    }

    let terminations = store.terminations_of_type(node_type);
    if force {
        for termination in &terminations {
            for path in store.paths_from(&termination.node_ref()) {
                store.delete_path(path.id)?;
                summary.paths_deleted += 1;
            }
        }
    }

    let origins: BTreeSet<NodeRef> = terminations
        .iter()
        .filter(|t| t.cable.is_some())
        .filter(|t| force || t.path.and_then(|id| store.path(id)).is_none())
        .map(Termination::node_ref)
        .collect();

    let total = origins.len();
    for (done, origin) in origins.iter().enumerate() {
        let traced = paths::trace_from_origin(store, origin, TraceScope::Rebuild)?;
        summary.origins += 1;
        summary.paths_created += traced.len();
        progress(done + 1, total);
    }

    info!(
        "Retraced {} {} origin(s): {} path(s) created, {} deleted",
        summary.origins, node_type, summary.paths_created, summary.paths_deleted
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::MemoryStore;

    fn engine() -> CablePathEngine<MemoryStore> {
        CablePathEngine::new(MemoryStore::new())
    }

    fn add(engine: &mut CablePathEngine<MemoryStore>, termination: &Termination) -> NodeRef {
        engine.add_termination(termination.clone()).unwrap()
    }

    #[test]
    fn test_connect_traces_both_ends() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut engine, &a);
        add(&mut engine, &b);

        let cable = engine.connect(Cable::connected(&a, &b)).unwrap();

        assert_eq!(engine.connected_endpoint(&a.node_ref()), Some(b.node_ref()));
        assert_eq!(engine.connected_endpoint(&b.node_ref()), Some(a.node_ref()));
        let cached = engine.store().termination(&a.node_ref()).unwrap();
        assert_eq!(cached.cable, Some(cable));
        assert_eq!(cached.cable_peer, Some(b.node_ref()));
    }

    #[test]
    fn test_rejected_cable_leaves_store_untouched() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let outlet = Termination::new("o1", "pdu", crate::types::TerminationKind::PowerOutlet);
        add(&mut engine, &a);
        add(&mut engine, &outlet);

        let err = engine.connect(Cable::connected(&a, &outlet)).unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::Incompatible { .. })
        ));
        assert_eq!(engine.store().cables().count(), 0);
        assert!(engine.store().termination(&a.node_ref()).unwrap().cable.is_none());
    }

    #[test]
    fn test_status_change_flips_activity() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut engine, &a);
        add(&mut engine, &b);
        let cable = engine.connect(Cable::connected(&a, &b)).unwrap();

        engine.set_cable_status(cable, CableStatus::planned()).unwrap();
        assert!(engine.store().paths().all(|p| !p.is_active));

        engine
            .set_cable_status(cable, CableStatus::decommissioning())
            .unwrap();
        assert!(engine.store().paths().all(|p| !p.is_active));

        engine.set_cable_status(cable, CableStatus::connected()).unwrap();
        assert_eq!(engine.store().paths().count(), 2);
        assert!(engine.store().paths().all(|p| p.is_active));
    }

    #[test]
    fn test_disconnect_clears_caches_and_paths() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut engine, &a);
        add(&mut engine, &b);
        let cable = engine.connect(Cable::connected(&a, &b)).unwrap();

        engine.disconnect(cable).unwrap();

        assert_eq!(engine.store().paths().count(), 0);
        for end in [&a, &b] {
            let t = engine.store().termination(&end.node_ref()).unwrap();
            assert!(t.cable.is_none());
            assert!(t.cable_peer.is_none());
            assert!(t.path.is_none());
        }
        assert!(matches!(
            engine.disconnect(cable),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_preserves_cached_fields() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut engine, &a);
        add(&mut engine, &b);
        engine.connect(Cable::connected(&a, &b)).unwrap();

        let mut renamed = a.clone();
        renamed.name = "uplink".to_string();
        engine.update_termination(renamed).unwrap();

        let stored = engine.store().termination(&a.node_ref()).unwrap();
        assert_eq!(stored.name, "uplink");
        assert!(stored.cable.is_some());
        assert_eq!(engine.connected_endpoint(&a.node_ref()), Some(b.node_ref()));
    }

    #[test]
    fn test_delete_rear_port_cascades_front_ports() {
        let mut engine = engine();
        let rear = Termination::rear_port("rp1", "panel", 2);
        let f1 = Termination::front_port("fp1", "panel", &rear, 1);
        let f2 = Termination::front_port("fp2", "panel", &rear, 2);
        add(&mut engine, &rear);
        add(&mut engine, &f1);
        add(&mut engine, &f2);

        engine.delete_termination(&rear.node_ref()).unwrap();

        assert_eq!(engine.store().terminations().count(), 0);
    }

    #[test]
    fn test_retrace_missing_paths_counts() {
        let mut engine = engine();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        let lonely = Termination::interface("eth1", "sw1");
        add(&mut engine, &a);
        add(&mut engine, &b);
        add(&mut engine, &lonely);
        engine.connect(Cable::connected(&a, &b)).unwrap();

        let summary = engine
            .retrace_missing_paths(NodeType::Interface, false, |_, _| {})
            .unwrap();
        assert_eq!(summary.origins, 0);

        let mut calls = Vec::new();
        let summary = engine
            .retrace_missing_paths(NodeType::Interface, true, |done, total| {
                calls.push((done, total));
            })
            .unwrap();
        assert_eq!(summary.origins, 2);
        assert_eq!(summary.paths_deleted, 2);
        assert_eq!(summary.paths_created, 2);
        assert_eq!(calls, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_retrace_ignores_pass_through_types() {
        let mut engine = engine();
        let summary = engine
            .retrace_missing_paths(NodeType::FrontPort, true, |_, _| {})
            .unwrap();
        assert_eq!(summary, RetraceSummary::empty(NodeType::FrontPort));
    }
}
