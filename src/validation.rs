// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Checks run before a cable or termination is written

use crate::error::ValidationError;
use crate::store::TerminationStore;
use crate::types::{
    Cable, NodeRef, NodeType, Termination, TerminationKind, REARPORT_POSITIONS_MAX,
    REARPORT_POSITIONS_MIN,
};

/// Check that `cable` may be saved against the current store contents
///
/// # Errors
///
/// Returns the first rule the cable breaks.
pub fn validate_cable<S: TerminationStore>(store: &S, cable: &Cable) -> Result<(), ValidationError> {
    let [a_ref, b_ref] = cable.ends();

    if let Some(existing) = store.cable(cable.id) {
        if existing.ends() != cable.ends() {
            return Err(ValidationError::TerminationsChanged(cable.id));
        }
    }
    if a_ref == b_ref {
        return Err(ValidationError::SelfConnection(a_ref));
    }
    for end in [a_ref, b_ref] {
        if !end.node_type.is_termination() {
            return Err(ValidationError::NotCableable(end.node_type));
        }
    }

    let a = store
        .termination(&a_ref)
        .ok_or(ValidationError::MissingTermination(a_ref))?;
    let b = store
        .termination(&b_ref)
        .ok_or(ValidationError::MissingTermination(b_ref))?;

    if !a_ref.node_type.can_connect_to(b_ref.node_type) {
        return Err(ValidationError::Incompatible {
            a: a_ref.node_type,
            b: b_ref.node_type,
        });
    }

    for end in [&a, &b] {
        if let Some(existing) = end.cable.filter(|id| *id != cable.id) {
            return Err(ValidationError::AlreadyCabled {
                termination: end.node_ref(),
                cable: existing,
            });
        }
    }

    for (front, rear) in [(&a, &b), (&b, &a)] {
        if let Some((rear_port, _)) = front.kind.front_port_mapping() {
            if rear.node_type() == NodeType::RearPort && rear.id == rear_port {
                return Err(ValidationError::FrontToOwnRear);
            }
        }
    }

    for (rear, peer) in [(&a, &b), (&b, &a)] {
        if let Some(positions) = rear.kind.rear_port_positions() {
            let peer_type = peer.node_type();
            let multiplexed_peer = matches!(
                peer_type,
                NodeType::FrontPort | NodeType::RearPort | NodeType::CircuitTermination
            );
            if positions > 1 && !multiplexed_peer {
                return Err(ValidationError::MultiPositionPeer {
                    positions,
                    peer: peer_type,
                });
            }
        }
    }

    Ok(())
}

/// Check that `termination` may be saved. `previous` is the stored version
/// when this is an update.
///
/// # Errors
///
/// Returns the first rule the termination breaks.
pub fn validate_termination<S: TerminationStore>(
    store: &S,
    termination: &Termination,
    previous: Option<&Termination>,
) -> Result<(), ValidationError> {
    if let Some(previous) = previous {
        if previous.node_type() != termination.node_type() {
            return Err(ValidationError::TypeChanged(previous.node_ref()));
        }
    }

    match termination.kind {
        TerminationKind::RearPort { positions } => {
            if !(REARPORT_POSITIONS_MIN..=REARPORT_POSITIONS_MAX).contains(&positions) {
                return Err(ValidationError::InvalidPositions(positions));
            }
            let mapped = store
                .front_ports(termination.id)
                .iter()
                .filter_map(|front| front.kind.front_port_mapping())
                .map(|(_, position)| position)
                .max();
            if let Some(mapped) = mapped.filter(|m| *m > positions) {
                return Err(ValidationError::PositionsBelowMapped { positions, mapped });
            }
        }
        TerminationKind::FrontPort {
            rear_port,
            rear_port_position,
        } => {
            let positions = store
                .termination(&NodeRef::new(NodeType::RearPort, rear_port))
                .and_then(|rear| rear.kind.rear_port_positions())
                .ok_or(ValidationError::MissingRearPort(rear_port))?;
            if rear_port_position < 1 || rear_port_position > positions {
                return Err(ValidationError::PositionOutOfRange {
                    position: rear_port_position,
                    positions,
                });
            }
            let taken = store.front_ports(rear_port).iter().any(|front| {
                front.id != termination.id
                    && front.kind.front_port_mapping() == Some((rear_port, rear_port_position))
            });
            if taken {
                return Err(ValidationError::PositionTaken {
                    rear_port,
                    position: rear_port_position,
                });
            }
        }
        TerminationKind::CircuitTermination { circuit, .. } => {
            let taken = store
                .terminations_of_type(NodeType::CircuitTermination)
                .iter()
                .any(|other| other.id != termination.id && other.kind == termination.kind);
            if taken {
                return Err(ValidationError::CircuitSideTaken { circuit });
            }
        }
        _ => {}
    }

    Ok(())
}
