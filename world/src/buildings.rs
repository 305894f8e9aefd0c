//! Authoritative building state management utilities.

use std::collections::BTreeMap;

use lane_defence_core::{BuildingId, BuildingKind, BuildingSnapshot, CellIndex, PlayerIndex};

/// Snapshot of a building stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct BuildingState {
    /// Identifier allocated by the world for the building.
    pub(crate) id: BuildingId,
    /// Kind of building that was constructed.
    pub(crate) kind: BuildingKind,
    /// Player that paid for the building.
    pub(crate) owner: PlayerIndex,
    /// Cell the building stands on.
    pub(crate) cell: CellIndex,
    /// Remaining health.
    pub(crate) health: i32,
}

impl BuildingState {
    pub(crate) fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            id: self.id,
            kind: self.kind,
            owner: self.owner,
            health: self.health,
            max_health: self.kind.max_health(),
        }
    }
}

/// Registry that stores buildings and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct BuildingRegistry {
    entries: BTreeMap<BuildingId, BuildingState>,
    next_building_id: BuildingId,
}

impl BuildingRegistry {
    /// Creates an empty building registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_building_id: BuildingId::new(0),
        }
    }

    /// Stores a freshly placed building at full health and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        kind: BuildingKind,
        owner: PlayerIndex,
        cell: CellIndex,
    ) -> BuildingId {
        let id = self.next_building_id;
        self.next_building_id = BuildingId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            BuildingState {
                id,
                kind,
                owner,
                cell,
                health: kind.max_health(),
            },
        );
        id
    }

    pub(crate) fn get(&self, id: BuildingId) -> Option<&BuildingState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BuildingId) -> Option<&mut BuildingState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: BuildingId) -> Option<BuildingState> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
