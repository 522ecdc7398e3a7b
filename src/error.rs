// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the store, validation and engine layers

use crate::types::{NodeRef, NodeType};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a [`crate::store::TerminationStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced object does not exist
    #[error("Object not found: {0}")]
    NotFound(NodeRef),

    /// Cable path does not exist
    #[error("Cable path not found: {0}")]
    PathNotFound(Uuid),

    /// An object with this id already exists
    #[error("Duplicate object: {0}")]
    Duplicate(String),

    /// A uniqueness or reference constraint would be broken
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Reading or writing the inventory file failed
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The inventory file is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The inventory could not be serialized
    #[error("Failed to serialize inventory: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons a cable or termination change is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Both ends of a cable are the same termination
    #[error("Cannot connect {0} to itself")]
    SelfConnection(NodeRef),

    /// A cable end does not exist
    #[error("Termination not found: {0}")]
    MissingTermination(NodeRef),

    /// A cable end is not a termination type
    #[error("{0} cannot be cabled")]
    NotCableable(NodeType),

    /// The two ends are not of compatible types
    #[error("Incompatible termination types: {a} and {b}")]
    Incompatible {
        /// First end type
        a: NodeType,
        /// Second end type
        b: NodeType,
    },

    /// A cable end already has a cable attached
    #[error("{termination} already has a cable attached ({cable})")]
    AlreadyCabled {
        /// Occupied termination
        termination: NodeRef,
        /// Existing cable
        cable: Uuid,
    },

    /// A front port cabled to its own rear port
    #[error("A front port cannot be connected to its corresponding rear port")]
    FrontToOwnRear,

    /// A multi-position rear port cabled to a non pass-through
    #[error("Rear port with {positions} positions may only connect to a front port, rear port or circuit termination, not {peer}")]
    MultiPositionPeer {
        /// Positions on the rear port
        positions: u16,
        /// Offending peer type
        peer: NodeType,
    },

    /// The terminations of an existing cable were changed
    #[error("Cannot modify the terminations of cable {0}")]
    TerminationsChanged(Uuid),

    /// Rear port position count outside the permitted range
    #[error("Invalid number of positions: {0} (must be between {} and {})", crate::types::REARPORT_POSITIONS_MIN, crate::types::REARPORT_POSITIONS_MAX)]
    InvalidPositions(u16),

    /// A rear port would carry fewer positions than are already mapped
    #[error("Rear port has a front port mapped to position {mapped}; cannot reduce positions to {positions}")]
    PositionsBelowMapped {
        /// Requested positions
        positions: u16,
        /// Highest mapped position
        mapped: u16,
    },

    /// A front port names a rear port that does not exist
    #[error("Rear port not found: {0}")]
    MissingRearPort(Uuid),

    /// A front port position is outside its rear port's positions
    #[error("Invalid rear port position ({position}): rear port has only {positions} positions")]
    PositionOutOfRange {
        /// Requested position
        position: u16,
        /// Positions on the rear port
        positions: u16,
    },

    /// Another front port already uses this position
    #[error("Position {position} of rear port {rear_port} is already mapped")]
    PositionTaken {
        /// Rear port id
        rear_port: Uuid,
        /// Occupied position
        position: u16,
    },

    /// Another termination already occupies this circuit side
    #[error("Circuit {circuit} already has a termination on this side")]
    CircuitSideTaken {
        /// Circuit id
        circuit: Uuid,
    },

    /// The variant of an existing termination was changed
    #[error("Cannot change the type of {0}")]
    TypeChanged(NodeRef),
}

/// Errors returned by engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Store failure; the enclosing transaction has been rolled back
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested change was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An object the operation needs does not exist
    #[error("Not found: {0}")]
    NotFound(NodeRef),
}

/// Result alias for engine operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
