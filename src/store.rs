// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Termination store contract and the in-memory implementation
//!
//! The engine never owns persistence. It reads and writes through
//! [`TerminationStore`], and every public engine operation runs inside
//! [`TerminationStore::atomic`] so callers never see a half-rebuilt set of
//! paths.

use crate::error::StoreError;
use crate::types::{Cable, CablePath, NodeRef, NodeType, Role, Termination, TerminationKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// File name of the persisted inventory inside a data directory
pub const INVENTORY_FILE: &str = "inventory.json";

/// Persistence operations the cable path engine depends on
pub trait TerminationStore {
    /// Termination by typed reference; `None` if missing or of another type
    fn termination(&self, node: &NodeRef) -> Option<Termination>;

    /// Cable by id
    fn cable(&self, id: Uuid) -> Option<Cable>;

    /// Front ports mapped to a rear port, ordered by position
    fn front_ports(&self, rear_port: Uuid) -> Vec<Termination>;

    /// Termination on the opposite side of the same circuit
    fn circuit_peer(&self, termination: &Termination) -> Option<Termination>;

    /// Every termination of one type
    fn terminations_of_type(&self, node_type: NodeType) -> Vec<Termination>;

    /// Cable path by id
    fn path(&self, id: Uuid) -> Option<CablePath>;

    /// Paths originating at `origin`
    fn paths_from(&self, origin: &NodeRef) -> Vec<CablePath>;

    /// Paths whose node sequence contains `node`
    fn paths_containing(&self, node: &NodeRef) -> Vec<CablePath>;

    /// Paths whose destination is `node`
    fn paths_to(&self, node: &NodeRef) -> Vec<CablePath>;

    /// Insert or replace a termination
    fn put_termination(&mut self, termination: Termination) -> Result<(), StoreError>;

    /// Remove a termination, returning it if it existed
    fn remove_termination(&mut self, node: &NodeRef) -> Result<Option<Termination>, StoreError>;

    /// Insert or replace a cable
    fn put_cable(&mut self, cable: Cable) -> Result<(), StoreError>;

    /// Remove a cable, returning it if it existed
    fn remove_cable(&mut self, id: Uuid) -> Result<Option<Cable>, StoreError>;

    /// Write the cached cable and far-end reference of a termination
    fn set_cable_cache(
        &mut self,
        node: &NodeRef,
        cable: Option<Uuid>,
        peer: Option<NodeRef>,
    ) -> Result<(), StoreError>;

    /// Write the cached path of an origin termination
    fn set_origin_path(&mut self, origin: &NodeRef, path: Option<Uuid>) -> Result<(), StoreError>;

    /// Insert a new cable path
    fn insert_path(&mut self, path: CablePath) -> Result<(), StoreError>;

    /// Delete a cable path, returning it if it existed
    fn delete_path(&mut self, id: Uuid) -> Result<Option<CablePath>, StoreError>;

    /// Flip the active flag of a stored path in place
    fn set_path_active(&mut self, id: Uuid, is_active: bool) -> Result<(), StoreError>;

    /// Run `f` as one transaction: if it returns `Err`, every write made
    /// inside it is discarded.
    fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Everything that is persisted to `inventory.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// All terminations by id
    #[serde(default)]
    pub terminations: BTreeMap<Uuid, Termination>,
    /// All cables by id
    #[serde(default)]
    pub cables: BTreeMap<Uuid, Cable>,
    /// All computed cable paths by id
    #[serde(default)]
    pub paths: BTreeMap<Uuid, CablePath>,
}

/// Secondary indexes derived from an [`Inventory`]
#[derive(Debug, Clone, Default)]
struct Index {
    /// Path node (cable or termination) to the paths traversing it
    by_node: HashMap<NodeRef, BTreeSet<Uuid>>,
    by_origin: HashMap<NodeRef, BTreeSet<Uuid>>,
    by_destination: HashMap<NodeRef, BTreeSet<Uuid>>,
    /// Rear port id to its front ports by position
    mappings: HashMap<Uuid, BTreeMap<u16, Uuid>>,
}

impl Index {
    fn build(inventory: &Inventory) -> Self {
        let mut index = Self::default();
        for termination in inventory.terminations.values() {
            index.map_front_port(termination);
        }
        for path in inventory.paths.values() {
            index.add_path(path);
        }
        index
    }

    fn add_path(&mut self, path: &CablePath) {
        for node in &path.path {
            self.by_node.entry(*node).or_default().insert(path.id);
        }
        self.by_origin.entry(path.origin).or_default().insert(path.id);
        if let Some(destination) = path.destination {
            self.by_destination.entry(destination).or_default().insert(path.id);
        }
    }

    fn remove_path(&mut self, path: &CablePath) {
        for node in &path.path {
            unlink(&mut self.by_node, node, path.id);
        }
        unlink(&mut self.by_origin, &path.origin, path.id);
        if let Some(destination) = path.destination {
            unlink(&mut self.by_destination, &destination, path.id);
        }
    }

    fn map_front_port(&mut self, termination: &Termination) {
        if let TerminationKind::FrontPort {
            rear_port,
            rear_port_position,
        } = termination.kind
        {
            self.mappings
                .entry(rear_port)
                .or_default()
                .insert(rear_port_position, termination.id);
        }
    }

    fn unmap_front_port(&mut self, termination: &Termination) {
        if let TerminationKind::FrontPort {
            rear_port,
            rear_port_position,
        } = termination.kind
        {
            if let Some(positions) = self.mappings.get_mut(&rear_port) {
                if positions.get(&rear_port_position) == Some(&termination.id) {
                    positions.remove(&rear_port_position);
                }
                if positions.is_empty() {
                    self.mappings.remove(&rear_port);
                }
            }
        }
    }
}

fn unlink(map: &mut HashMap<NodeRef, BTreeSet<Uuid>>, key: &NodeRef, id: Uuid) {
    if let Some(ids) = map.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

/// In-memory [`TerminationStore`] with JSON persistence
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inventory: Inventory,
    index: Index,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing inventory, building its indexes
    #[must_use]
    pub fn from_inventory(inventory: Inventory) -> Self {
        let index = Index::build(&inventory);
        Self { inventory, index }
    }

    /// Load the store from `inventory.json` in `dir`; a missing file yields
    /// an empty store
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let file = dir.join(INVENTORY_FILE);
        if !file.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(&file).map_err(|source| StoreError::Io {
            path: file.clone(),
            source,
        })?;
        let inventory: Inventory =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: file.clone(),
                source,
            })?;
        debug!(
            "Loaded {} terminations, {} cables, {} paths from {}",
            inventory.terminations.len(),
            inventory.cables.len(),
            inventory.paths.len(),
            file.display()
        );
        Ok(Self::from_inventory(inventory))
    }

    /// Save the store to `inventory.json` in `dir`
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = dir.join(INVENTORY_FILE);
        let json = serde_json::to_string_pretty(&self.inventory)?;
        fs::write(&file, json).map_err(|source| StoreError::Io { path: file, source })
    }

    /// The persisted tables
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// All terminations
    pub fn terminations(&self) -> impl Iterator<Item = &Termination> + '_ {
        self.inventory.terminations.values()
    }

    /// All cables
    pub fn cables(&self) -> impl Iterator<Item = &Cable> + '_ {
        self.inventory.cables.values()
    }

    /// All cable paths
    pub fn paths(&self) -> impl Iterator<Item = &CablePath> + '_ {
        self.inventory.paths.values()
    }

    /// Termination by bare id, whatever its type
    #[must_use]
    pub fn find_termination(&self, id: Uuid) -> Option<&Termination> {
        self.inventory.terminations.get(&id)
    }

    fn lookup(&self, ids: Option<&BTreeSet<Uuid>>) -> Vec<CablePath> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.inventory.paths.get(id).cloned())
            .collect()
    }

    fn termination_mut(&mut self, node: &NodeRef) -> Result<&mut Termination, StoreError> {
        self.inventory
            .terminations
            .get_mut(&node.id)
            .filter(|t| t.node_type() == node.node_type)
            .ok_or(StoreError::NotFound(*node))
    }

    fn check_unique(&self, termination: &Termination) -> Result<(), StoreError> {
        if let Some(existing) = self.inventory.terminations.get(&termination.id) {
            if existing.node_type() != termination.node_type() {
                return Err(StoreError::Constraint(format!(
                    "{} already exists as {}",
                    termination.id,
                    existing.node_type()
                )));
            }
        }
        match termination.kind.role() {
            Role::FrontPort {
                rear_port,
                position,
            } => {
                let taken = self
                    .index
                    .mappings
                    .get(&rear_port)
                    .and_then(|positions| positions.get(&position))
                    .is_some_and(|id| *id != termination.id);
                if taken {
                    return Err(StoreError::Constraint(format!(
                        "position {position} of rear port {rear_port} is already mapped"
                    )));
                }
            }
            Role::CircuitEnd { circuit, term_side } => {
                let taken = self.inventory.terminations.values().any(|other| {
                    other.id != termination.id
                        && other.kind
                            == (TerminationKind::CircuitTermination { circuit, term_side })
                });
                if taken {
                    return Err(StoreError::Constraint(format!(
                        "circuit {circuit} already has a {term_side:?} side termination"
                    )));
                }
            }
            Role::Endpoint | Role::RearPort { .. } => {}
        }
        Ok(())
    }
}

impl TerminationStore for MemoryStore {
    fn termination(&self, node: &NodeRef) -> Option<Termination> {
        self.inventory
            .terminations
            .get(&node.id)
            .filter(|t| t.node_type() == node.node_type)
            .cloned()
    }

    fn cable(&self, id: Uuid) -> Option<Cable> {
        self.inventory.cables.get(&id).cloned()
    }

    fn front_ports(&self, rear_port: Uuid) -> Vec<Termination> {
        self.index
            .mappings
            .get(&rear_port)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter_map(|id| self.inventory.terminations.get(id).cloned())
            .collect()
    }

    fn circuit_peer(&self, termination: &Termination) -> Option<Termination> {
        let TerminationKind::CircuitTermination { circuit, term_side } = termination.kind else {
            return None;
        };
        let wanted = TerminationKind::CircuitTermination {
            circuit,
            term_side: term_side.opposite(),
        };
        self.inventory
            .terminations
            .values()
            .find(|t| t.kind == wanted)
            .cloned()
    }

    fn terminations_of_type(&self, node_type: NodeType) -> Vec<Termination> {
        self.inventory
            .terminations
            .values()
            .filter(|t| t.node_type() == node_type)
            .cloned()
            .collect()
    }

    fn path(&self, id: Uuid) -> Option<CablePath> {
        self.inventory.paths.get(&id).cloned()
    }

    fn paths_from(&self, origin: &NodeRef) -> Vec<CablePath> {
        self.lookup(self.index.by_origin.get(origin))
    }

    fn paths_containing(&self, node: &NodeRef) -> Vec<CablePath> {
        self.lookup(self.index.by_node.get(node))
    }

    fn paths_to(&self, node: &NodeRef) -> Vec<CablePath> {
        self.lookup(self.index.by_destination.get(node))
    }

    fn put_termination(&mut self, termination: Termination) -> Result<(), StoreError> {
        self.check_unique(&termination)?;
        if let Some(previous) = self.inventory.terminations.get(&termination.id) {
            self.index.unmap_front_port(previous);
        }
        self.index.map_front_port(&termination);
        self.inventory.terminations.insert(termination.id, termination);
        Ok(())
    }

    fn remove_termination(&mut self, node: &NodeRef) -> Result<Option<Termination>, StoreError> {
        if self.termination(node).is_none() {
            return Ok(None);
        }
        let removed = self.inventory.terminations.remove(&node.id);
        if let Some(termination) = &removed {
            self.index.unmap_front_port(termination);
        }
        Ok(removed)
    }

    fn put_cable(&mut self, cable: Cable) -> Result<(), StoreError> {
        for end in cable.ends() {
            if self.termination(&end).is_none() {
                return Err(StoreError::Constraint(format!(
                    "cable {} references missing termination {end}",
                    cable.id
                )));
            }
        }
        self.inventory.cables.insert(cable.id, cable);
        Ok(())
    }

    fn remove_cable(&mut self, id: Uuid) -> Result<Option<Cable>, StoreError> {
        Ok(self.inventory.cables.remove(&id))
    }

    fn set_cable_cache(
        &mut self,
        node: &NodeRef,
        cable: Option<Uuid>,
        peer: Option<NodeRef>,
    ) -> Result<(), StoreError> {
        let termination = self.termination_mut(node)?;
        termination.cable = cable;
        termination.cable_peer = peer;
        Ok(())
    }

    fn set_origin_path(&mut self, origin: &NodeRef, path: Option<Uuid>) -> Result<(), StoreError> {
        self.termination_mut(origin)?.path = path;
        Ok(())
    }

    fn insert_path(&mut self, path: CablePath) -> Result<(), StoreError> {
        if self.inventory.paths.contains_key(&path.id) {
            return Err(StoreError::Duplicate(format!("cable path {}", path.id)));
        }
        if self.termination(&path.origin).is_none() {
            return Err(StoreError::Constraint(format!(
                "cable path origin {} does not exist",
                path.origin
            )));
        }
        self.index.add_path(&path);
        self.inventory.paths.insert(path.id, path);
        Ok(())
    }

    fn delete_path(&mut self, id: Uuid) -> Result<Option<CablePath>, StoreError> {
        let removed = self.inventory.paths.remove(&id);
        if let Some(path) = &removed {
            self.index.remove_path(path);
        }
        Ok(removed)
    }

    fn set_path_active(&mut self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        let path = self
            .inventory
            .paths
            .get_mut(&id)
            .ok_or(StoreError::PathNotFound(id))?;
        path.is_active = is_active;
        Ok(())
    }

    fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let inventory = self.inventory.clone();
        let index = self.index.clone();
        let result = f(self);
        if result.is_err() {
            debug!("Rolling back store transaction");
            self.inventory = inventory;
            self.index = index;
        }
        result
    }
}
