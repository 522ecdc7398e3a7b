// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Undirected physical topology view with petgraph backing

use crate::store::TerminationStore;
use crate::types::{CableStatus, NodeRef, NodeType, Termination};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use uuid::Uuid;

/// Why two terminations are adjacent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// A cable joins them
    Cable {
        /// Cable id
        id: Uuid,
        /// Cable status
        status: CableStatus,
    },
    /// A front port is mapped to a rear port position
    Mapping {
        /// Rear port position
        position: u16,
    },
    /// The two sides of one circuit
    Circuit,
}

/// Terminations as nodes; cables, front/rear mappings and circuits as edges
#[derive(Debug, Default)]
pub struct Topology {
    graph: UnGraph<Termination, Link>,
    node_indices: HashMap<NodeRef, NodeIndex>,
}

impl Topology {
    /// Build the view from every termination in `store`
    pub fn from_store<S: TerminationStore>(store: &S) -> Self {
        let mut topology = Self::default();

        for node_type in NodeType::TERMINATIONS {
            for termination in store.terminations_of_type(node_type) {
                let node = termination.node_ref();
                let idx = topology.graph.add_node(termination);
                topology.node_indices.insert(node, idx);
            }
        }

        let terminations: Vec<Termination> = topology.graph.node_weights().cloned().collect();
        let mut cables_seen = HashSet::new();
        for termination in &terminations {
            if let Some(cable) = termination.cable.and_then(|id| store.cable(id)) {
                if cables_seen.insert(cable.id) {
                    let [a, b] = cable.ends();
                    topology.link(
                        &a,
                        &b,
                        Link::Cable {
                            id: cable.id,
                            status: cable.status,
                        },
                    );
                }
            }
            if let Some((rear_port, position)) = termination.kind.front_port_mapping() {
                let rear = NodeRef::new(NodeType::RearPort, rear_port);
                topology.link(&termination.node_ref(), &rear, Link::Mapping { position });
            }
            if let Some(peer) = store.circuit_peer(termination) {
                // Each circuit is seen from both sides; link once
                if termination.id < peer.id {
                    topology.link(&termination.node_ref(), &peer.node_ref(), Link::Circuit);
                }
            }
        }
        topology
    }

    fn link(&mut self, a: &NodeRef, b: &NodeRef, link: Link) {
        if let (Some(&a), Some(&b)) = (self.node_indices.get(a), self.node_indices.get(b)) {
            self.graph.add_edge(a, b, link);
        }
    }

    /// Number of terminations
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of disconnected islands, counting lone terminations
    #[must_use]
    pub fn island_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("graph topology {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for termination in self.graph.node_weights() {
            let _ = writeln!(
                dot,
                "  \"{}\" [label=\"{}\\n{}\"];",
                termination.node_ref(),
                termination.display_name(),
                termination.node_type().model()
            );
        }

        dot.push('\n');

        for edge in self.graph.edge_indices() {
            let Some((a, b)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let attrs = match &self.graph[edge] {
                Link::Cable { status, .. } if status.is_connected() => String::new(),
                Link::Cable { status, .. } => format!(" [style=dashed, label=\"{status}\"]"),
                Link::Mapping { position } => format!(" [style=dotted, label=\"{position}\"]"),
                Link::Circuit => " [style=bold]".to_string(),
            };
            let _ = writeln!(
                dot,
                "  \"{}\" -- \"{}\"{attrs};",
                self.graph[a].node_ref(),
                self.graph[b].node_ref()
            );
        }

        dot.push_str("}\n");
        dot
    }
}
