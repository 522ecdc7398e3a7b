// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path walk from an origin termination across cables and pass-throughs
//!
//! The walk is read-only. It follows the cached `cable` of the current
//! termination, steps to the far end, and then either stops (a path
//! endpoint), relays through a front/rear port, or hops across a circuit.
//! A rear port reached with no pending position fans out into one branch
//! per mapped front port. Every inconsistency it meets ends the branch as a
//! partial path; the walk never fails.

use crate::store::TerminationStore;
use crate::types::{NodeRef, NodeType, Role, Termination};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Outcome of one branch of a walk, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedPath {
    /// Path endpoint reached, if any
    pub destination: Option<NodeRef>,
    /// Cables and intermediate terminations in walk order
    pub path: Vec<NodeRef>,
    /// Destination reached over connected cables only
    pub is_active: bool,
    /// A rear port fanned out in this branch's lineage
    pub is_split: bool,
}

/// State of a single branch while walking
#[derive(Debug, Clone)]
struct Branch {
    node: Termination,
    path: Vec<NodeRef>,
    visited: HashSet<NodeRef>,
    /// Rear port positions entered through front ports, innermost last
    positions: Vec<u16>,
    all_connected: bool,
    is_split: bool,
}

impl Branch {
    fn start(origin: &Termination) -> Self {
        let mut visited = HashSet::new();
        visited.insert(origin.node_ref());
        Self {
            node: origin.clone(),
            path: Vec::new(),
            visited,
            positions: Vec::new(),
            all_connected: true,
            is_split: false,
        }
    }

    /// Record a node; `false` means it was already on this branch
    fn enter(&mut self, node: NodeRef) -> bool {
        if !self.visited.insert(node) {
            warn!("Loop detected at {node}; ending path");
            return false;
        }
        self.path.push(node);
        true
    }

    fn finish(self, destination: Option<NodeRef>) -> TracedPath {
        TracedPath {
            is_active: destination.is_some() && self.all_connected,
            destination,
            path: self.path,
            is_split: self.is_split,
        }
    }
}

/// Walk every branch leaving `origin`.
///
/// Returns an empty list when `origin` is not a path endpoint or has no
/// cable. Otherwise at least one path is returned, more when the walk splits.
pub fn trace<S: TerminationStore>(store: &S, origin: &Termination) -> Vec<TracedPath> {
    if !origin.is_path_endpoint() {
        debug!("{} is not a path endpoint; nothing to trace", origin.node_ref());
        return Vec::new();
    }
    if origin.cable.is_none() {
        return Vec::new();
    }

    let mut pending = vec![Branch::start(origin)];
    let mut traced = Vec::new();
    while let Some(branch) = pending.pop() {
        traced.push(walk(store, branch, &mut pending));
    }
    debug!(
        "Traced {} branch(es) from {}",
        traced.len(),
        origin.node_ref()
    );
    traced
}

/// Follow one branch to its end, queueing any branches it forks
fn walk<S: TerminationStore>(store: &S, mut branch: Branch, pending: &mut Vec<Branch>) -> TracedPath {
    loop {
        let Some(cable_id) = branch.node.cable else {
            return branch.finish(None);
        };
        let Some(cable) = store.cable(cable_id) else {
            warn!("{} references missing cable {cable_id}", branch.node.node_ref());
            return branch.finish(None);
        };
        if !branch.enter(cable.node_ref()) {
            return branch.finish(None);
        }
        if !cable.is_connected() {
            branch.all_connected = false;
        }

        let here = branch.node.node_ref();
        let Some(peer) = cable
            .peer_of(&here)
            .and_then(|peer_ref| store.termination(&peer_ref))
        else {
            warn!("Cable {} has no far end from {here}", cable.id);
            return branch.finish(None);
        };
        let peer_ref = peer.node_ref();
        if branch.visited.contains(&peer_ref) {
            warn!("Loop detected at {peer_ref}; ending path");
            return branch.finish(None);
        }

        match peer.kind.role() {
            Role::Endpoint => return branch.finish(Some(peer_ref)),

            Role::CircuitEnd { .. } => {
                let Some(far_side) = store.circuit_peer(&peer) else {
                    return branch.finish(Some(peer_ref));
                };
                if !branch.enter(peer_ref) || !branch.enter(far_side.node_ref()) {
                    return branch.finish(None);
                }
                branch.node = far_side;
            }

            Role::FrontPort {
                rear_port,
                position,
            } => {
                if !branch.enter(peer_ref) {
                    return branch.finish(None);
                }
                let rear = store
                    .termination(&NodeRef::new(NodeType::RearPort, rear_port))
                    .and_then(|rear| rear.kind.rear_port_positions().map(|p| (rear, p)));
                let Some((rear, positions)) = rear else {
                    warn!("{peer_ref} is mapped to missing rear port {rear_port}");
                    return branch.finish(None);
                };
                if position == 0 || position > positions {
                    warn!("{peer_ref} maps to position {position} of a {positions}-position rear port");
                    return branch.finish(None);
                }
                if positions > 1 {
                    branch.positions.push(position);
                }
                if !branch.enter(rear.node_ref()) {
                    return branch.finish(None);
                }
                branch.node = rear;
            }

            Role::RearPort { positions } => {
                if !branch.enter(peer_ref) {
                    return branch.finish(None);
                }
                let position = if positions == 1 {
                    Some(1)
                } else {
                    branch.positions.pop()
                };

                let next = match position {
                    Some(position) => store
                        .front_ports(peer.id)
                        .into_iter()
                        .find(|front| front_position(front) == Some(position)),
                    None => fan_out(store, &peer, positions, &mut branch, pending),
                };
                let Some(front) = next else {
                    return branch.finish(None);
                };
                if !branch.enter(front.node_ref()) {
                    return branch.finish(None);
                }
                branch.node = front;
            }
        }
    }
}

/// Split at a rear port with no pending position. Queues a branch for every
/// front port after the first and returns the first for the current branch.
fn fan_out<S: TerminationStore>(
    store: &S,
    rear: &Termination,
    positions: u16,
    branch: &mut Branch,
    pending: &mut Vec<Branch>,
) -> Option<Termination> {
    branch.is_split = true;
    let mut fronts = store
        .front_ports(rear.id)
        .into_iter()
        .filter(|front| front_position(front).is_some_and(|p| (1..=positions).contains(&p)));
    let first = fronts.next();
    let mut forks = 0;
    for front in fronts {
        let mut fork = branch.clone();
        if fork.enter(front.node_ref()) {
            fork.node = front;
            pending.push(fork);
            forks += 1;
        }
    }
    debug!("Path splits at {} into {} branch(es)", rear.node_ref(), forks + usize::from(first.is_some()));
    first
}

fn front_position(front: &Termination) -> Option<u16> {
    front.kind.front_port_mapping().map(|(_, position)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Cable, CableStatus};

    /// Insert terminations and wire a cable between two of them, filling in
    /// the cached cable fields the way the engine hooks would
    fn wire(store: &mut MemoryStore, a: &Termination, b: &Termination, status: CableStatus) -> Cable {
        let cable = Cable::new(a.node_ref(), b.node_ref(), status);
        store.put_cable(cable.clone()).unwrap();
        store
            .set_cable_cache(&a.node_ref(), Some(cable.id), Some(b.node_ref()))
            .unwrap();
        store
            .set_cable_cache(&b.node_ref(), Some(cable.id), Some(a.node_ref()))
            .unwrap();
        cable
    }

    fn add(store: &mut MemoryStore, termination: &Termination) {
        store.put_termination(termination.clone()).unwrap();
    }

    fn fresh(store: &MemoryStore, termination: &Termination) -> Termination {
        store.termination(&termination.node_ref()).unwrap()
    }

    #[test]
    fn test_direct_connection() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut store, &a);
        add(&mut store, &b);
        let cable = wire(&mut store, &a, &b, CableStatus::connected());

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].destination, Some(b.node_ref()));
        assert_eq!(traced[0].path, vec![cable.node_ref()]);
        assert!(traced[0].is_active);
        assert!(!traced[0].is_split);
    }

    #[test]
    fn test_uncabled_and_pass_through_origins_yield_nothing() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let rear = Termination::rear_port("RP1", "panel", 1);
        add(&mut store, &a);
        add(&mut store, &rear);
        wire(&mut store, &rear, &a, CableStatus::connected());

        assert!(trace(&store, &Termination::interface("eth1", "sw1")).is_empty());
        assert!(trace(&store, &fresh(&store, &rear)).is_empty());
    }

    #[test]
    fn test_planned_cable_makes_path_inactive() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut store, &a);
        add(&mut store, &b);
        wire(&mut store, &a, &b, CableStatus::planned());

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced[0].destination, Some(b.node_ref()));
        assert!(!traced[0].is_active);
    }

    #[test]
    fn test_self_loop_terminates() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        add(&mut store, &a);
        let cable = wire(&mut store, &a, &a, CableStatus::connected());

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].destination, None);
        assert_eq!(traced[0].path, vec![cable.node_ref()]);
        assert!(!traced[0].is_active);
    }

    #[test]
    fn test_pass_through_loop_terminates() {
        // eth0 -> FP1 [RP1] -> FP2 [RP2], with RP2 cabled back onto itself
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let rp1 = Termination::rear_port("RP1", "panel", 1);
        let fp1 = Termination::front_port("FP1", "panel", &rp1, 1);
        let rp2 = Termination::rear_port("RP2", "panel", 1);
        let fp2 = Termination::front_port("FP2", "panel", &rp2, 1);
        for t in [&a, &rp1, &fp1, &rp2, &fp2] {
            add(&mut store, t);
        }
        wire(&mut store, &a, &fp1, CableStatus::connected());
        wire(&mut store, &rp1, &fp2, CableStatus::connected());
        wire(&mut store, &rp2, &rp2, CableStatus::connected());

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].destination, None);
    }

    #[test]
    fn test_out_of_range_position_is_dead_end() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let rear = Termination::rear_port("RP1", "panel", 4);
        let front = Termination::front_port("FP3", "panel", &rear, 3);
        add(&mut store, &a);
        add(&mut store, &rear);
        add(&mut store, &front);
        let cable = wire(&mut store, &a, &front, CableStatus::connected());

        // Shrink the rear port behind the validation layer's back
        let mut shrunk = fresh(&store, &rear);
        shrunk.kind = crate::types::TerminationKind::RearPort { positions: 2 };
        store.put_termination(shrunk).unwrap();

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced[0].path, vec![cable.node_ref(), front.node_ref()]);
        assert_eq!(traced[0].destination, None);
    }

    #[test]
    fn test_missing_cable_reference_is_dead_end() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let b = Termination::interface("eth0", "sw2");
        add(&mut store, &a);
        add(&mut store, &b);
        let cable = wire(&mut store, &a, &b, CableStatus::connected());
        store.remove_cable(cable.id).unwrap();

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced.len(), 1);
        assert!(traced[0].path.is_empty());
        assert_eq!(traced[0].destination, None);
    }

    #[test]
    fn test_split_without_front_ports_is_single_partial() {
        let mut store = MemoryStore::new();
        let a = Termination::interface("eth0", "sw1");
        let rear = Termination::rear_port("RP1", "panel", 4);
        add(&mut store, &a);
        add(&mut store, &rear);
        let cable = wire(&mut store, &a, &rear, CableStatus::connected());

        let traced = trace(&store, &fresh(&store, &a));
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].path, vec![cable.node_ref(), rear.node_ref()]);
        assert!(traced[0].is_split);
        assert!(!traced[0].is_active);
    }
}
