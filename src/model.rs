//! Simulation data types.

use crate::grid::{Coord, Grid};
use serde::{Deserialize, Serialize};

/// Agent of the simulation.
///
/// Each agent has a stable id, an infection status (monotonic: once infected,
/// never reverts), a comorbidity status fixed at creation, a movement
/// propensity, and the cell it currently occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: usize,
    infected: bool,
    comorbid: bool,
    move_probability: f64,
    cell: Option<Coord>,
}

impl Agent {
    pub fn new(id: usize, infected: bool, comorbid: bool, move_probability: f64) -> Self {
        Self {
            id,
            infected,
            comorbid,
            move_probability,
            cell: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn infected(&self) -> bool {
        self.infected
    }

    pub fn comorbid(&self) -> bool {
        self.comorbid
    }

    pub fn move_probability(&self) -> f64 {
        self.move_probability
    }

    /// Cell the agent is bound to, or `None` before placement.
    pub fn cell(&self) -> Option<Coord> {
        self.cell
    }

    pub(crate) fn set_cell(&mut self, coord: Coord) {
        self.cell = Some(coord);
    }

    /// Idempotent transition to the infected status.
    pub fn become_infected(&mut self) {
        self.infected = true;
    }
}

/// State of the simulation at a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Completed ticks since initialization.
    pub tick: usize,

    /// `false` once every agent is infected; the engine is then terminal.
    pub running: bool,

    /// The lattice with contamination and occupancy per cell.
    pub grid: Grid,

    /// All agents, indexed by id; never grows or shrinks during a run.
    pub agents: Vec<Agent>,

    /// Cumulative count of agent-to-agent transmission events.
    pub direct_infection_count: usize,

    /// Cumulative count of environment-mediated transmission events.
    pub location_infection_count: usize,
}

impl State {
    /// Live count of infected agents.
    pub fn infected_count(&self) -> usize {
        self.agents.iter().filter(|agt| agt.infected()).count()
    }
}
