// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Cablepath library - cable path tracing for network inventories
//!
//! This crate computes and incrementally maintains the paths that signal
//! takes across a graph of terminations (interfaces, console and power
//! ports, circuit terminations, front/rear patch panel ports) joined by
//! cables. Paths are persisted as first-class [`types::CablePath`] records
//! through a [`store::TerminationStore`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod paths;
pub mod store;
pub mod topology;
pub mod trace;
pub mod validation;

/// Core data types: node identity, terminations, cables and cable paths
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use uuid::Uuid;

    /// Smallest number of positions a rear port may carry
    pub const REARPORT_POSITIONS_MIN: u16 = 1;
    /// Largest number of positions a rear port may carry
    pub const REARPORT_POSITIONS_MAX: u16 = 1024;

    // =========================================================================
    // Node Identity
    // =========================================================================

    /// Type tag for every object that can appear in a cable path
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum NodeType {
        /// A cable joining two terminations
        #[serde(rename = "dcim.cable")]
        Cable,
        /// Network interface
        #[serde(rename = "dcim.interface")]
        Interface,
        /// Console port (client side)
        #[serde(rename = "dcim.consoleport")]
        ConsolePort,
        /// Console server port
        #[serde(rename = "dcim.consoleserverport")]
        ConsoleServerPort,
        /// Power port (consumer side)
        #[serde(rename = "dcim.powerport")]
        PowerPort,
        /// Power outlet
        #[serde(rename = "dcim.poweroutlet")]
        PowerOutlet,
        /// Power feed from a power panel
        #[serde(rename = "dcim.powerfeed")]
        PowerFeed,
        /// One side of a provider circuit
        #[serde(rename = "circuits.circuittermination")]
        CircuitTermination,
        /// Patch panel front port
        #[serde(rename = "dcim.frontport")]
        FrontPort,
        /// Patch panel rear port
        #[serde(rename = "dcim.rearport")]
        RearPort,
    }

    impl NodeType {
        /// Every termination type that can originate or terminate a path
        pub const PATH_ENDPOINTS: [Self; 7] = [
            Self::Interface,
            Self::ConsolePort,
            Self::ConsoleServerPort,
            Self::PowerPort,
            Self::PowerOutlet,
            Self::PowerFeed,
            Self::CircuitTermination,
        ];

        /// Every type a cable may land on
        pub const TERMINATIONS: [Self; 9] = [
            Self::Interface,
            Self::ConsolePort,
            Self::ConsoleServerPort,
            Self::PowerPort,
            Self::PowerOutlet,
            Self::PowerFeed,
            Self::CircuitTermination,
            Self::FrontPort,
            Self::RearPort,
        ];

        /// Content-type label, e.g. `dcim.interface`
        #[must_use]
        pub fn label(self) -> &'static str {
            match self {
                Self::Cable => "dcim.cable",
                Self::Interface => "dcim.interface",
                Self::ConsolePort => "dcim.consoleport",
                Self::ConsoleServerPort => "dcim.consoleserverport",
                Self::PowerPort => "dcim.powerport",
                Self::PowerOutlet => "dcim.poweroutlet",
                Self::PowerFeed => "dcim.powerfeed",
                Self::CircuitTermination => "circuits.circuittermination",
                Self::FrontPort => "dcim.frontport",
                Self::RearPort => "dcim.rearport",
            }
        }

        /// Model name without the app prefix, e.g. `interface`
        #[must_use]
        pub fn model(self) -> &'static str {
            let label = self.label();
            label.split_once('.').map_or(label, |(_, model)| model)
        }

        /// Whether this type originates and terminates paths
        #[must_use]
        pub fn is_path_endpoint(self) -> bool {
            Self::PATH_ENDPOINTS.contains(&self)
        }

        /// Whether this type relays signal rather than terminating it
        #[must_use]
        pub fn is_pass_through(self) -> bool {
            matches!(self, Self::FrontPort | Self::RearPort)
        }

        /// Whether a cable may be attached to this type at all
        #[must_use]
        pub fn is_termination(self) -> bool {
            self != Self::Cable
        }

        /// Types a cable from this type may land on
        #[must_use]
        pub fn compatible_peers(self) -> &'static [Self] {
            const PASS_THROUGH_PEERS: &[NodeType] = &[
                NodeType::ConsolePort,
                NodeType::ConsoleServerPort,
                NodeType::Interface,
                NodeType::FrontPort,
                NodeType::RearPort,
                NodeType::CircuitTermination,
            ];
            match self {
                Self::Cable => &[],
                Self::ConsolePort => &[Self::ConsoleServerPort, Self::FrontPort, Self::RearPort],
                Self::ConsoleServerPort => &[Self::ConsolePort, Self::FrontPort, Self::RearPort],
                Self::PowerPort => &[Self::PowerOutlet, Self::PowerFeed],
                Self::PowerOutlet | Self::PowerFeed => &[Self::PowerPort],
                Self::Interface => &[
                    Self::Interface,
                    Self::CircuitTermination,
                    Self::FrontPort,
                    Self::RearPort,
                ],
                Self::FrontPort | Self::RearPort => PASS_THROUGH_PEERS,
                Self::CircuitTermination => &[
                    Self::Interface,
                    Self::FrontPort,
                    Self::RearPort,
                    Self::CircuitTermination,
                ],
            }
        }

        /// Whether a cable may join this type to `other`
        #[must_use]
        pub fn can_connect_to(self, other: Self) -> bool {
            self.compatible_peers().contains(&other)
        }
    }

    impl fmt::Display for NodeType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }

    impl FromStr for NodeType {
        type Err = String;

        /// Accepts the full label (`dcim.frontport`) or the bare model name
        /// with optional separators (`frontport`, `front-port`, `front_port`)
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let wanted: String = s
                .trim()
                .to_lowercase()
                .chars()
                .filter(|c| *c != '-' && *c != '_')
                .collect();
            std::iter::once(Self::Cable)
                .chain(Self::TERMINATIONS)
                .find(|t| t.label() == wanted || t.model() == wanted)
                .ok_or_else(|| format!("Unknown object type: {s}"))
        }
    }

    /// Polymorphic reference to a cable or termination: type tag plus UUID
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct NodeRef {
        /// Object type
        #[serde(rename = "type")]
        pub node_type: NodeType,
        /// Object UUID
        pub id: Uuid,
    }

    impl NodeRef {
        /// Build a reference from its parts
        #[must_use]
        pub fn new(node_type: NodeType, id: Uuid) -> Self {
            Self { node_type, id }
        }

        /// Reference to a cable
        #[must_use]
        pub fn cable(id: Uuid) -> Self {
            Self::new(NodeType::Cable, id)
        }

        /// Whether this references a cable
        #[must_use]
        pub fn is_cable(&self) -> bool {
            self.node_type == NodeType::Cable
        }
    }

    impl fmt::Display for NodeRef {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}", self.node_type, self.id)
        }
    }

    // =========================================================================
    // Terminations
    // =========================================================================

    /// Side of a circuit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum TermSide {
        /// A side
        A,
        /// Z side
        Z,
    }

    impl TermSide {
        /// The other side of the circuit
        #[must_use]
        pub fn opposite(self) -> Self {
            match self {
                Self::A => Self::Z,
                Self::Z => Self::A,
            }
        }
    }

    impl FromStr for TermSide {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim() {
                "a" | "A" => Ok(Self::A),
                "z" | "Z" => Ok(Self::Z),
                other => Err(format!("Unknown circuit side: {other}. Valid: A, Z")),
            }
        }
    }

    /// Variant data for each termination type
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum TerminationKind {
        /// Network interface
        #[serde(rename = "dcim.interface")]
        Interface,
        /// Console port
        #[serde(rename = "dcim.consoleport")]
        ConsolePort,
        /// Console server port
        #[serde(rename = "dcim.consoleserverport")]
        ConsoleServerPort,
        /// Power port
        #[serde(rename = "dcim.powerport")]
        PowerPort,
        /// Power outlet
        #[serde(rename = "dcim.poweroutlet")]
        PowerOutlet,
        /// Power feed
        #[serde(rename = "dcim.powerfeed")]
        PowerFeed,
        /// One side of a circuit
        #[serde(rename = "circuits.circuittermination")]
        CircuitTermination {
            /// Owning circuit
            circuit: Uuid,
            /// Which side of the circuit this is
            term_side: TermSide,
        },
        /// Front port mapped onto one position of a rear port
        #[serde(rename = "dcim.frontport")]
        FrontPort {
            /// The rear port this front port is mapped to
            rear_port: Uuid,
            /// 1-indexed position on the rear port
            rear_port_position: u16,
        },
        /// Rear port multiplexing one or more front ports
        #[serde(rename = "dcim.rearport")]
        RearPort {
            /// Number of independent signal paths carried
            positions: u16,
        },
    }

    /// What a termination does to a walk arriving at it over a cable
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Role {
        /// Terminates the path
        Endpoint,
        /// Terminates the path unless the circuit has a far side
        CircuitEnd {
            /// Owning circuit
            circuit: Uuid,
            /// Side of this termination
            term_side: TermSide,
        },
        /// Relays to a position on its rear port
        FrontPort {
            /// Rear port id
            rear_port: Uuid,
            /// Position on the rear port
            position: u16,
        },
        /// Relays to one or all of its front ports
        RearPort {
            /// Positions carried
            positions: u16,
        },
    }

    impl TerminationKind {
        /// Type tag for this variant
        #[must_use]
        pub fn node_type(&self) -> NodeType {
            match self {
                Self::Interface => NodeType::Interface,
                Self::ConsolePort => NodeType::ConsolePort,
                Self::ConsoleServerPort => NodeType::ConsoleServerPort,
                Self::PowerPort => NodeType::PowerPort,
                Self::PowerOutlet => NodeType::PowerOutlet,
                Self::PowerFeed => NodeType::PowerFeed,
                Self::CircuitTermination { .. } => NodeType::CircuitTermination,
                Self::FrontPort { .. } => NodeType::FrontPort,
                Self::RearPort { .. } => NodeType::RearPort,
            }
        }

        /// Traversal role for this variant
        #[must_use]
        pub fn role(&self) -> Role {
            match *self {
                Self::Interface
                | Self::ConsolePort
                | Self::ConsoleServerPort
                | Self::PowerPort
                | Self::PowerOutlet
                | Self::PowerFeed => Role::Endpoint,
                Self::CircuitTermination { circuit, term_side } => {
                    Role::CircuitEnd { circuit, term_side }
                }
                Self::FrontPort {
                    rear_port,
                    rear_port_position,
                } => Role::FrontPort {
                    rear_port,
                    position: rear_port_position,
                },
                Self::RearPort { positions } => Role::RearPort { positions },
            }
        }

        /// Rear port id and position, for a front port
        #[must_use]
        pub fn front_port_mapping(&self) -> Option<(Uuid, u16)> {
            match *self {
                Self::FrontPort {
                    rear_port,
                    rear_port_position,
                } => Some((rear_port, rear_port_position)),
                _ => None,
            }
        }

        /// Position count, for a rear port
        #[must_use]
        pub fn rear_port_positions(&self) -> Option<u16> {
            match *self {
                Self::RearPort { positions } => Some(positions),
                _ => None,
            }
        }
    }

    /// Anything that can sit at one end of a cable
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Termination {
        /// Unique identifier
        pub id: Uuid,
        /// Display name (e.g. `eth0`)
        pub name: String,
        /// Owning device, circuit or panel, for display
        #[serde(default)]
        pub parent: String,
        /// Variant and variant data
        #[serde(flatten)]
        pub kind: TerminationKind,
        /// Attached cable, maintained by the cable hooks
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub cable: Option<Uuid>,
        /// Termination at the far end of `cable`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub cable_peer: Option<NodeRef>,
        /// Path originating here (path endpoints only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub path: Option<Uuid>,
    }

    impl Termination {
        /// Create an uncabled termination with a fresh id
        #[must_use]
        pub fn new(name: impl Into<String>, parent: impl Into<String>, kind: TerminationKind) -> Self {
            Self {
                id: Uuid::new_v4(),
                name: name.into(),
                parent: parent.into(),
                kind,
                cable: None,
                cable_peer: None,
                path: None,
            }
        }

        /// Create an interface
        #[must_use]
        pub fn interface(name: impl Into<String>, parent: impl Into<String>) -> Self {
            Self::new(name, parent, TerminationKind::Interface)
        }

        /// Create a rear port with the given number of positions
        #[must_use]
        pub fn rear_port(name: impl Into<String>, parent: impl Into<String>, positions: u16) -> Self {
            Self::new(name, parent, TerminationKind::RearPort { positions })
        }

        /// Create a front port mapped onto `position` of `rear_port`
        #[must_use]
        pub fn front_port(
            name: impl Into<String>,
            parent: impl Into<String>,
            rear_port: &Termination,
            position: u16,
        ) -> Self {
            Self::new(
                name,
                parent,
                TerminationKind::FrontPort {
                    rear_port: rear_port.id,
                    rear_port_position: position,
                },
            )
        }

        /// Create one side of a circuit
        #[must_use]
        pub fn circuit_termination(circuit: Uuid, term_side: TermSide) -> Self {
            let name = match term_side {
                TermSide::A => "A",
                TermSide::Z => "Z",
            };
            Self::new(
                name,
                circuit.to_string(),
                TerminationKind::CircuitTermination { circuit, term_side },
            )
        }

        /// Type-tagged reference to this termination
        #[must_use]
        pub fn node_ref(&self) -> NodeRef {
            NodeRef::new(self.node_type(), self.id)
        }

        /// Type tag
        #[must_use]
        pub fn node_type(&self) -> NodeType {
            self.kind.node_type()
        }

        /// Whether this termination originates paths
        #[must_use]
        pub fn is_path_endpoint(&self) -> bool {
            self.node_type().is_path_endpoint()
        }

        /// Whether this termination is a front or rear port
        #[must_use]
        pub fn is_pass_through(&self) -> bool {
            self.node_type().is_pass_through()
        }

        /// Human readable `parent name` label
        #[must_use]
        pub fn display_name(&self) -> String {
            if self.parent.is_empty() {
                self.name.clone()
            } else {
                format!("{} {}", self.parent, self.name)
            }
        }
    }

    // =========================================================================
    // Cables
    // =========================================================================

    /// Cable status slug; an open vocabulary where only `connected` is special
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CableStatus(String);

    impl CableStatus {
        /// The status that makes a path through the cable active
        pub const CONNECTED: &'static str = "connected";
        /// Cable is planned but not installed
        pub const PLANNED: &'static str = "planned";
        /// Cable is being removed
        pub const DECOMMISSIONING: &'static str = "decommissioning";

        /// Build a status from any slug
        #[must_use]
        pub fn new(slug: impl Into<String>) -> Self {
            Self(slug.into().trim().to_lowercase())
        }

        /// `connected`
        #[must_use]
        pub fn connected() -> Self {
            Self::new(Self::CONNECTED)
        }

        /// `planned`
        #[must_use]
        pub fn planned() -> Self {
            Self::new(Self::PLANNED)
        }

        /// `decommissioning`
        #[must_use]
        pub fn decommissioning() -> Self {
            Self::new(Self::DECOMMISSIONING)
        }

        /// Whether this is the connected status
        #[must_use]
        pub fn is_connected(&self) -> bool {
            self.0 == Self::CONNECTED
        }

        /// Status slug
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl Default for CableStatus {
        fn default() -> Self {
            Self::connected()
        }
    }

    impl fmt::Display for CableStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// A cable joining exactly two terminations
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Cable {
        /// Unique identifier
        pub id: Uuid,
        /// First end
        pub termination_a: NodeRef,
        /// Second end
        pub termination_b: NodeRef,
        /// Status slug
        #[serde(default)]
        pub status: CableStatus,
        /// Optional label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
        /// When the cable was recorded
        pub created: DateTime<Utc>,
    }

    impl Cable {
        /// Create a cable between two terminations
        #[must_use]
        pub fn new(termination_a: NodeRef, termination_b: NodeRef, status: CableStatus) -> Self {
            Self {
                id: Uuid::new_v4(),
                termination_a,
                termination_b,
                status,
                label: None,
                created: Utc::now(),
            }
        }

        /// Create a connected cable between two terminations
        #[must_use]
        pub fn connected(a: &Termination, b: &Termination) -> Self {
            Self::new(a.node_ref(), b.node_ref(), CableStatus::connected())
        }

        /// Set the label
        #[must_use]
        pub fn with_label(mut self, label: impl Into<String>) -> Self {
            self.label = Some(label.into());
            self
        }

        /// Reference to this cable
        #[must_use]
        pub fn node_ref(&self) -> NodeRef {
            NodeRef::cable(self.id)
        }

        /// Both ends
        #[must_use]
        pub fn ends(&self) -> [NodeRef; 2] {
            [self.termination_a, self.termination_b]
        }

        /// The end opposite `node`, or `None` if `node` is not on this cable
        #[must_use]
        pub fn peer_of(&self, node: &NodeRef) -> Option<NodeRef> {
            if self.termination_a == *node {
                Some(self.termination_b)
            } else if self.termination_b == *node {
                Some(self.termination_a)
            } else {
                None
            }
        }

        /// Whether the cable carries signal
        #[must_use]
        pub fn is_connected(&self) -> bool {
            self.status.is_connected()
        }
    }

    // =========================================================================
    // Cable Paths
    // =========================================================================

    /// Computed, directional record of connectivity from one path endpoint
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CablePath {
        /// Unique identifier
        pub id: Uuid,
        /// Termination the walk started from
        pub origin: NodeRef,
        /// Path endpoint reached, or `None` for a partial path
        pub destination: Option<NodeRef>,
        /// Cables and intermediate terminations, in walk order
        pub path: Vec<NodeRef>,
        /// Complete and every cable connected
        pub is_active: bool,
        /// A rear port fanned out somewhere along this path
        pub is_split: bool,
        /// When the path was computed
        pub created: DateTime<Utc>,
    }

    /// One (near end, cable, far end) hop of a rendered trace
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Segment {
        /// Termination on the near side
        pub near_end: Option<NodeRef>,
        /// Cable
        pub cable: Option<NodeRef>,
        /// Termination on the far side
        pub far_end: Option<NodeRef>,
    }

    impl CablePath {
        /// Cables traversed, in order
        pub fn cables(&self) -> impl Iterator<Item = &NodeRef> + '_ {
            self.path.iter().filter(|node| node.is_cable())
        }

        /// Whether `node` appears in the path sequence
        #[must_use]
        pub fn contains(&self, node: &NodeRef) -> bool {
            self.path.contains(node)
        }

        /// Whether a destination was reached
        #[must_use]
        pub fn is_complete(&self) -> bool {
            self.destination.is_some()
        }

        /// Number of (near end, cable, far end) hops
        #[must_use]
        pub fn segment_count(&self) -> usize {
            (1 + self.path.len() + usize::from(self.destination.is_some())) / 3
        }

        /// Origin, path and destination split into three-tuples. Incomplete
        /// paths are padded with blanks before their final element.
        #[must_use]
        pub fn segments(&self) -> Vec<Segment> {
            let mut nodes: Vec<Option<NodeRef>> = std::iter::once(self.origin)
                .chain(self.path.iter().copied())
                .chain(self.destination)
                .map(Some)
                .collect();
            while nodes.len() % 3 != 0 {
                let at = nodes.len() - 1;
                nodes.insert(at, None);
            }
            nodes
                .chunks(3)
                .map(|hop| Segment {
                    near_end: hop[0],
                    cable: hop[1],
                    far_end: hop[2],
                })
                .collect()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn path_of(nodes: Vec<NodeRef>, destination: Option<NodeRef>) -> CablePath {
            CablePath {
                id: Uuid::new_v4(),
                origin: NodeRef::new(NodeType::Interface, Uuid::new_v4()),
                destination,
                path: nodes,
                is_active: false,
                is_split: false,
                created: Utc::now(),
            }
        }

        #[test]
        fn test_node_type_parsing() {
            assert_eq!("dcim.frontport".parse::<NodeType>(), Ok(NodeType::FrontPort));
            assert_eq!("front-port".parse::<NodeType>(), Ok(NodeType::FrontPort));
            assert_eq!("Interface".parse::<NodeType>(), Ok(NodeType::Interface));
            assert_eq!(
                "circuittermination".parse::<NodeType>(),
                Ok(NodeType::CircuitTermination)
            );
            assert!("router".parse::<NodeType>().is_err());
        }

        #[test]
        fn test_compatibility_is_symmetric() {
            let all = [
                NodeType::Interface,
                NodeType::ConsolePort,
                NodeType::ConsoleServerPort,
                NodeType::PowerPort,
                NodeType::PowerOutlet,
                NodeType::PowerFeed,
                NodeType::CircuitTermination,
                NodeType::FrontPort,
                NodeType::RearPort,
            ];
            for a in all {
                for b in all {
                    assert_eq!(a.can_connect_to(b), b.can_connect_to(a), "{a} / {b}");
                }
            }
            assert!(!NodeType::PowerPort.can_connect_to(NodeType::Interface));
            assert!(!NodeType::Cable.can_connect_to(NodeType::Interface));
        }

        #[test]
        fn test_termination_json_shape() {
            let rear = Termination::rear_port("RP1", "panel1", 4);
            let front = Termination::front_port("FP1", "panel1", &rear, 2);
            let json = serde_json::to_value(&front).unwrap();

            assert_eq!(json["type"], "dcim.frontport");
            assert_eq!(json["rear_port_position"], 2);
            assert!(json.get("cable").is_none());

            let back: Termination = serde_json::from_value(json).unwrap();
            assert_eq!(back, front);
        }

        #[test]
        fn test_cable_peer_of() {
            let a = Termination::interface("eth0", "sw1");
            let b = Termination::interface("eth0", "sw2");
            let cable = Cable::connected(&a, &b);

            assert_eq!(cable.peer_of(&a.node_ref()), Some(b.node_ref()));
            assert_eq!(cable.peer_of(&b.node_ref()), Some(a.node_ref()));
            assert_eq!(cable.peer_of(&NodeRef::cable(cable.id)), None);
        }

        #[test]
        fn test_status_normalised() {
            assert!(CableStatus::new(" Connected ").is_connected());
            assert!(!CableStatus::planned().is_connected());
            assert_eq!(CableStatus::default(), CableStatus::connected());
        }

        #[test]
        fn test_segments_complete_path() {
            let cable = NodeRef::cable(Uuid::new_v4());
            let far = NodeRef::new(NodeType::Interface, Uuid::new_v4());
            let path = path_of(vec![cable], Some(far));

            let segments = path.segments();
            assert_eq!(segments.len(), 1);
            assert_eq!(path.segment_count(), 1);
            assert_eq!(segments[0].cable, Some(cable));
            assert_eq!(segments[0].far_end, Some(far));
        }

        #[test]
        fn test_segments_pad_partial_path() {
            let c1 = NodeRef::cable(Uuid::new_v4());
            let fp = NodeRef::new(NodeType::FrontPort, Uuid::new_v4());
            let rp = NodeRef::new(NodeType::RearPort, Uuid::new_v4());
            let path = path_of(vec![c1, fp, rp], None);

            let segments = path.segments();
            assert_eq!(segments.len(), 2);
            assert_eq!(segments[0].far_end, Some(fp));
            assert_eq!(segments[1].near_end, None);
            assert_eq!(segments[1].cable, None);
            assert_eq!(segments[1].far_end, Some(rp));
            assert_eq!(path.cables().count(), 1);
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::engine::{CablePathEngine, RetraceSummary};
    pub use crate::error::{Error, Result, StoreError, ValidationError};
    pub use crate::store::{MemoryStore, TerminationStore};
    pub use crate::types::*;
}
