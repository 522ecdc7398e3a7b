// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for stored cable paths
//!
//! These tests verify critical invariants:
//! 1. Symmetry - every complete path has a reversed twin from its destination
//! 2. Idempotence - retracing an unchanged inventory reproduces its paths
//! 3. Index consistency - indexed lookups agree with a full scan
//! 4. Atomicity - a failed operation leaves no partial writes behind

use cablepath::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

/// A random inventory: interfaces, single-position patch panels and a list
/// of cable attempts by index into every termination
#[derive(Debug, Clone)]
struct Layout {
    interfaces: usize,
    panels: usize,
    cables: Vec<(usize, usize)>,
}

fn layout() -> impl Strategy<Value = Layout> {
    (
        2usize..8,
        0usize..4,
        prop::collection::vec((0usize..32, 0usize..32), 0..24),
    )
        .prop_map(|(interfaces, panels, cables)| Layout {
            interfaces,
            panels,
            cables,
        })
}

fn build(layout: &Layout) -> CablePathEngine<MemoryStore> {
    let mut engine = CablePathEngine::new(MemoryStore::new());
    let mut all = Vec::new();
    for n in 0..layout.interfaces {
        let t = Termination::interface(format!("eth{n}"), "sw");
        engine.add_termination(t.clone()).unwrap();
        all.push(t);
    }
    for n in 0..layout.panels {
        let rear = Termination::rear_port("rp", format!("panel{n}"), 1);
        let front = Termination::front_port("fp", format!("panel{n}"), &rear, 1);
        engine.add_termination(rear.clone()).unwrap();
        engine.add_termination(front.clone()).unwrap();
        all.push(rear);
        all.push(front);
    }
    for &(i, j) in &layout.cables {
        let a = &all[i % all.len()];
        let b = &all[j % all.len()];
        // Rejected cables are part of the exercise
        let _ = engine.connect(Cable::connected(a, b));
    }
    engine
}

/// Everything about a path except its id and timestamp
fn shape(path: &CablePath) -> (NodeRef, Option<NodeRef>, Vec<NodeRef>, bool, bool) {
    (
        path.origin,
        path.destination,
        path.path.clone(),
        path.is_active,
        path.is_split,
    )
}

fn shapes(store: &MemoryStore) -> BTreeSet<(NodeRef, Option<NodeRef>, Vec<NodeRef>, bool, bool)> {
    store.paths().map(shape).collect()
}

fn assert_index_consistent(store: &MemoryStore) {
    for path in store.paths() {
        assert!(store.paths_from(&path.origin).iter().any(|p| p.id == path.id));
        for node in &path.path {
            assert!(store.paths_containing(node).iter().any(|p| p.id == path.id));
        }
        if let Some(destination) = path.destination {
            assert!(store.paths_to(&destination).iter().any(|p| p.id == path.id));
        }
    }
    for termination in store.terminations() {
        let node = termination.node_ref();
        assert!(store.paths_from(&node).iter().all(|p| p.origin == node));
        assert!(store.paths_containing(&node).iter().all(|p| p.contains(&node)));
        assert!(store.paths_to(&node).iter().all(|p| p.destination == Some(node)));
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_complete_paths_are_symmetric(layout in layout()) {
        let engine = build(&layout);
        let store = engine.store();
        for path in store.paths().filter(|p| p.is_complete()) {
            let destination = path.destination.unwrap();
            let mut reversed = path.path.clone();
            reversed.reverse();
            let twin = store
                .paths_from(&destination)
                .into_iter()
                .find(|p| p.destination == Some(path.origin));
            prop_assert!(twin.is_some(), "no path back from {}", destination);
            let twin = twin.unwrap();
            prop_assert_eq!(&twin.path, &reversed);
            prop_assert_eq!(twin.is_active, path.is_active);
        }
    }

    #[test]
    fn prop_forced_retrace_is_idempotent(layout in layout()) {
        let mut engine = build(&layout);
        let before = shapes(engine.store());
        engine.retrace_all(true, |_, _, _| {}).unwrap();
        prop_assert_eq!(shapes(engine.store()), before);
    }

    #[test]
    fn prop_index_matches_scan(layout in layout()) {
        let engine = build(&layout);
        assert_index_consistent(engine.store());
    }

    #[test]
    fn prop_cached_path_belongs_to_origin(layout in layout()) {
        let engine = build(&layout);
        let store = engine.store();
        for termination in store.terminations() {
            if let Some(id) = termination.path {
                let path = store.path(id);
                prop_assert!(path.is_some());
                prop_assert_eq!(path.unwrap().origin, termination.node_ref());
            }
            if termination.cable.is_none() {
                prop_assert!(store.paths_from(&termination.node_ref()).is_empty());
            }
        }
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_save_load_keeps_paths_and_index() {
    let layout = Layout {
        interfaces: 4,
        panels: 2,
        cables: vec![(0, 5), (4, 1), (2, 7), (6, 3)],
    };
    let engine = build(&layout);
    let dir = TempDir::new().unwrap();
    engine.store().save(dir.path()).unwrap();

    let loaded = MemoryStore::load(dir.path()).unwrap();
    assert_eq!(shapes(&loaded), shapes(engine.store()));
    assert_index_consistent(&loaded);
}

// =============================================================================
// Atomicity
// =============================================================================

/// Store wrapper that rejects every path insert after the first `allow`
#[derive(Debug, Clone)]
struct FailingStore {
    inner: MemoryStore,
    allow: usize,
    inserted: usize,
}

impl FailingStore {
    fn new(inner: MemoryStore, allow: usize) -> Self {
        Self {
            inner,
            allow,
            inserted: 0,
        }
    }
}

impl TerminationStore for FailingStore {
    fn termination(&self, node: &NodeRef) -> Option<Termination> {
        self.inner.termination(node)
    }

    fn cable(&self, id: Uuid) -> Option<Cable> {
        self.inner.cable(id)
    }

    fn front_ports(&self, rear_port: Uuid) -> Vec<Termination> {
        self.inner.front_ports(rear_port)
    }

    fn circuit_peer(&self, termination: &Termination) -> Option<Termination> {
        self.inner.circuit_peer(termination)
    }

    fn terminations_of_type(&self, node_type: NodeType) -> Vec<Termination> {
        self.inner.terminations_of_type(node_type)
    }

    fn path(&self, id: Uuid) -> Option<CablePath> {
        self.inner.path(id)
    }

    fn paths_from(&self, origin: &NodeRef) -> Vec<CablePath> {
        self.inner.paths_from(origin)
    }

    fn paths_containing(&self, node: &NodeRef) -> Vec<CablePath> {
        self.inner.paths_containing(node)
    }

    fn paths_to(&self, node: &NodeRef) -> Vec<CablePath> {
        self.inner.paths_to(node)
    }

    fn put_termination(&mut self, termination: Termination) -> Result<(), StoreError> {
        self.inner.put_termination(termination)
    }

    fn remove_termination(&mut self, node: &NodeRef) -> Result<Option<Termination>, StoreError> {
        self.inner.remove_termination(node)
    }

    fn put_cable(&mut self, cable: Cable) -> Result<(), StoreError> {
        self.inner.put_cable(cable)
    }

    fn remove_cable(&mut self, id: Uuid) -> Result<Option<Cable>, StoreError> {
        self.inner.remove_cable(id)
    }

    fn set_cable_cache(
        &mut self,
        node: &NodeRef,
        cable: Option<Uuid>,
        peer: Option<NodeRef>,
    ) -> Result<(), StoreError> {
        self.inner.set_cable_cache(node, cable, peer)
    }

    fn set_origin_path(&mut self, origin: &NodeRef, path: Option<Uuid>) -> Result<(), StoreError> {
        self.inner.set_origin_path(origin, path)
    }

    fn insert_path(&mut self, path: CablePath) -> Result<(), StoreError> {
        if self.inserted >= self.allow {
            return Err(StoreError::Constraint("disk full".into()));
        }
        self.inserted += 1;
        self.inner.insert_path(path)
    }

    fn delete_path(&mut self, id: Uuid) -> Result<Option<CablePath>, StoreError> {
        self.inner.delete_path(id)
    }

    fn set_path_active(&mut self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        self.inner.set_path_active(id, is_active)
    }

    fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let snapshot = self.inner.clone();
        let result = f(self);
        if result.is_err() {
            self.inner = snapshot;
        }
        result
    }
}

#[test]
fn test_failed_connect_rolls_back_everything() {
    let a = Termination::interface("eth0", "sw1");
    let b = Termination::interface("eth0", "sw2");
    let mut inner = MemoryStore::new();
    inner.put_termination(a.clone()).unwrap();
    inner.put_termination(b.clone()).unwrap();

    // The first end traces fine; the second end's insert fails
    let mut engine = CablePathEngine::new(FailingStore::new(inner, 1));
    let result = engine.connect(Cable::connected(&a, &b));

    assert!(matches!(result, Err(Error::Store(StoreError::Constraint(_)))));
    let store = engine.store();
    assert_eq!(store.inner.cables().count(), 0);
    assert_eq!(store.inner.paths().count(), 0);
    for end in [&a, &b] {
        let t = store.termination(&end.node_ref()).unwrap();
        assert!(t.cable.is_none());
        assert!(t.cable_peer.is_none());
        assert!(t.path.is_none());
    }
}

#[test]
fn test_failed_rebuild_keeps_old_paths() {
    let a = Termination::interface("eth0", "sw1");
    let b = Termination::interface("eth0", "sw2");
    let mut engine = CablePathEngine::new(MemoryStore::new());
    engine.add_termination(a.clone()).unwrap();
    engine.add_termination(b.clone()).unwrap();
    engine.connect(Cable::connected(&a, &b)).unwrap();
    let before = shapes(engine.store());

    let mut failing = CablePathEngine::new(FailingStore::new(engine.into_store(), 0));
    let cable = failing.store().termination(&a.node_ref()).unwrap().cable.unwrap();
    assert!(failing.rebuild_paths_through(&NodeRef::cable(cable)).is_err());

    assert_eq!(shapes(&failing.store().inner), before);
}

#[test]
fn test_nested_transaction_is_a_savepoint() {
    let mut store = MemoryStore::new();
    let kept = Termination::interface("eth0", "sw1");
    let dropped = Termination::interface("eth1", "sw1");

    let outer: Result<(), StoreError> = store.atomic(|s| {
        s.put_termination(kept.clone())?;
        let inner: Result<(), StoreError> = s.atomic(|s| {
            s.put_termination(dropped.clone())?;
            Err(StoreError::Constraint("inner failure".into()))
        });
        assert!(inner.is_err());
        Ok(())
    });

    assert!(outer.is_ok());
    assert!(store.termination(&kept.node_ref()).is_some());
    assert!(store.termination(&dropped.node_ref()).is_none());
}
