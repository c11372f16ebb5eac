//! Toroidal 2D lattice with 4-neighbor adjacency and per-cell contamination.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Grid coordinate `(x, y)` with `x` in `[0, width)` and `y` in `[0, height)`.
pub type Coord = (usize, usize);

/// Ticks a contaminated cell survives without an infected occupant before it
/// turns clean again (it clears on the tick the counter first exceeds this).
const CONTAMINATION_PERSISTENCE: u32 = 2;

/// Contamination record of a single cell.
///
/// `steps_since_infected_presence` is meaningful only while the cell is
/// contaminated; it resets to 0 whenever an infected agent occupies the cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    contaminated: bool,
    steps_since_infected_presence: u32,
}

impl Cell {
    pub fn contaminated(&self) -> bool {
        self.contaminated
    }

    pub fn steps_since_infected_presence(&self) -> u32 {
        self.steps_since_infected_presence
    }

    /// Flag the cell as contaminated and reset its decay counter.
    pub fn mark_contaminated(&mut self) {
        self.contaminated = true;
        self.steps_since_infected_presence = 0;
    }

    /// Advance the decay state machine by one tick.
    ///
    /// Clean cells are unaffected. Contaminated cells reset their counter
    /// while an infected agent is present and otherwise age by one tick,
    /// turning clean after three consecutive ticks without one.
    pub fn update_decay(&mut self, infected_present: bool) {
        if !self.contaminated {
            return;
        }
        if infected_present {
            self.steps_since_infected_presence = 0;
            return;
        }
        self.steps_since_infected_presence += 1;
        if self.steps_since_infected_presence > CONTAMINATION_PERSISTENCE {
            self.contaminated = false;
            self.steps_since_infected_presence = 0;
        }
    }
}

/// Fixed-size lattice with toroidal wrap-around boundaries.
///
/// Owns the contamination record and the occupant multiset of every cell;
/// agent positions themselves are owned by the engine, which keeps the two in
/// sync through [`Grid::place`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    occupants: Vec<Vec<usize>>,
}

impl Grid {
    /// Create a clean, empty grid. Dimensions must be at least 1x1; the
    /// configuration layer enforces this before construction.
    pub fn new(width: usize, height: usize) -> Self {
        let n_cells = width * height;
        Self {
            width,
            height,
            cells: vec![Cell::default(); n_cells],
            occupants: vec![Vec::new(); n_cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, coord: Coord) -> Result<usize, SimError> {
        let (x, y) = coord;
        if x >= self.width || y >= self.height {
            return Err(SimError::InvalidCoordinate {
                coord,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    pub fn cell(&self, coord: Coord) -> Result<&Cell, SimError> {
        let idx = self.index(coord)?;
        Ok(&self.cells[idx])
    }

    pub fn cell_mut(&mut self, coord: Coord) -> Result<&mut Cell, SimError> {
        let idx = self.index(coord)?;
        Ok(&mut self.cells[idx])
    }

    /// Iterate over all cells with their coordinates, row by row.
    pub fn iter_cells(&self) -> impl Iterator<Item = (Coord, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| ((idx % self.width, idx / self.width), cell))
    }

    /// Distinct wrap-adjusted von Neumann neighbors of `coord`.
    ///
    /// The coordinate itself is never a neighbor and duplicates produced by
    /// the wrap on degenerate grids collapse, so a 1x1 grid has no neighbors
    /// and a 2x2 grid has two per cell.
    pub fn neighbors_of(&self, coord: Coord) -> Result<Vec<Coord>, SimError> {
        self.index(coord)?;

        let (x, y) = coord;
        let (w, h) = (self.width, self.height);
        let candidates = [
            ((x + w - 1) % w, y),
            ((x + 1) % w, y),
            (x, (y + h - 1) % h),
            (x, (y + 1) % h),
        ];

        let mut neighbors = Vec::with_capacity(4);
        for cand in candidates {
            if cand != coord && !neighbors.contains(&cand) {
                neighbors.push(cand);
            }
        }
        Ok(neighbors)
    }

    /// Bind an agent to the cell at `to`, removing it from `from` first if it
    /// was bound before.
    pub fn place(&mut self, agent_id: usize, from: Option<Coord>, to: Coord) -> Result<(), SimError> {
        let to_idx = self.index(to)?;
        if let Some(from) = from {
            let from_idx = self.index(from)?;
            self.occupants[from_idx].retain(|&id| id != agent_id);
        }
        self.occupants[to_idx].push(agent_id);
        Ok(())
    }

    /// Ids of the agents currently occupying `coord`.
    ///
    /// This is a live view; callers that mutate the grid while iterating must
    /// materialize it into an owned sequence first.
    pub fn occupants_of(&self, coord: Coord) -> Result<&[usize], SimError> {
        let idx = self.index(coord)?;
        Ok(&self.occupants[idx])
    }

    /// Run the per-tick contamination decay over every cell, reading the
    /// current (post-movement) occupant sets.
    pub fn apply_decay<F: Fn(usize) -> bool>(&mut self, is_infected: F) {
        for (idx, cell) in self.cells.iter_mut().enumerate() {
            let infected_present = self.occupants[idx].iter().any(|&id| is_infected(id));
            cell.update_decay(infected_present);
        }
    }
}
