//! Dense lane grid tracking which building stands on each cell.

use lane_defence_core::{CellIndex, Occupant, GRID_CELLS};

/// Fixed-size occupancy table; its length never changes after construction.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    cells: Vec<Option<Occupant>>,
}

impl Grid {
    pub(crate) fn new() -> Self {
        Self {
            cells: vec![None; GRID_CELLS],
        }
    }

    pub(crate) fn occupant(&self, cell: CellIndex) -> Option<Occupant> {
        self.cells.get(cell.as_usize()).copied().flatten()
    }

    pub(crate) fn is_free(&self, cell: CellIndex) -> bool {
        self.occupant(cell).is_none()
    }

    pub(crate) fn occupy(&mut self, cell: CellIndex, occupant: Occupant) {
        if let Some(slot) = self.cells.get_mut(cell.as_usize()) {
            *slot = Some(occupant);
        }
    }

    pub(crate) fn vacate(&mut self, cell: CellIndex) {
        if let Some(slot) = self.cells.get_mut(cell.as_usize()) {
            *slot = None;
        }
    }

    pub(crate) fn cells(&self) -> &[Option<Occupant>] {
        &self.cells
    }
}
