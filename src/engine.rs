use crate::config::Config;
use crate::error::SimError;
use crate::grid::{Coord, Grid};
use crate::metrics::{MetricsCollector, Snapshot};
use crate::model::{Agent, State};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Uniform};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Transmission probability between co-located agents.
const CONTACT_PROB: f64 = 0.5;
/// Transmission probability between co-located agents when the target is comorbid.
const CONTACT_COMORBID_PROB: f64 = 0.75;
/// Transmission probability from a contaminated occupied cell.
const LOCAL_PROB: f64 = 0.5;
/// Transmission probability from a contaminated occupied cell for a comorbid agent.
const LOCAL_COMORBID_PROB: f64 = 0.75;
/// Transmission probability from a contaminated neighboring cell.
const NEARBY_PROB: f64 = 0.25;
/// Transmission probability from a contaminated neighboring cell for a comorbid agent.
const NEARBY_COMORBID_PROB: f64 = 0.5;

/// Simulation engine.
///
/// Holds the configuration, current state, metrics series, and random number
/// generator, and provides methods to initialize, step, run, save, and load
/// simulations. All randomness is drawn from the single engine-owned stream,
/// so runs with the same configuration and seed are bit-reproducible.
#[derive(Debug, Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    state: State,
    metrics: MetricsCollector,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial state.
    ///
    /// Agents are created in three disjoint classes (baseline, pre-infected,
    /// comorbid) and scattered uniformly at random onto the grid, and the
    /// configured number of distinct cells is seeded as contaminated.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let mut rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let mut grid = Grid::new(cfg.grid_width, cfg.grid_height);

        let baseline_count = cfg.population_size - cfg.infected_count - cfg.comorbid_count;
        let mut agents = Vec::with_capacity(cfg.population_size);
        for _ in 0..baseline_count {
            agents.push(Agent::new(agents.len(), false, false, cfg.move_probability));
        }
        for _ in 0..cfg.infected_count {
            agents.push(Agent::new(agents.len(), true, false, cfg.move_probability));
        }
        for _ in 0..cfg.comorbid_count {
            agents.push(Agent::new(agents.len(), false, true, cfg.move_probability));
        }

        let x_dist = Uniform::new(0, cfg.grid_width)?;
        let y_dist = Uniform::new(0, cfg.grid_height)?;
        for agt in &mut agents {
            let coord = (x_dist.sample(&mut rng), y_dist.sample(&mut rng));
            grid.place(agt.id(), None, coord)?;
            agt.set_cell(coord);
        }

        let all_coords: Vec<Coord> = grid.iter_cells().map(|(coord, _)| coord).collect();
        let seeded: Vec<Coord> = all_coords
            .choose_multiple(&mut rng, cfg.contaminated_cell_count)
            .copied()
            .collect();
        for coord in seeded {
            grid.cell_mut(coord)?.mark_contaminated();
        }

        let state = State {
            tick: 0,
            running: true,
            grid,
            agents,
            direct_infection_count: 0,
            location_infection_count: 0,
        };

        Ok(Self {
            cfg,
            state,
            metrics: MetricsCollector::new(),
            rng,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Per-tick metrics series recorded so far.
    pub fn metrics(&self) -> &[Snapshot] {
        self.metrics.series()
    }

    pub fn tick(&self) -> usize {
        self.state.tick
    }

    pub fn running(&self) -> bool {
        self.state.running
    }

    /// Advance the simulation by one tick.
    ///
    /// A step on a terminal engine is an idempotent no-op. Otherwise a
    /// metrics snapshot is recorded first; if no susceptible agent remains the
    /// engine turns terminal without further mutation, and in all other cases
    /// the movement, direct-infection, environmental-infection, and decay
    /// phases run in that order before the tick counter advances.
    pub fn step(&mut self) -> Result<()> {
        if !self.state.running {
            return Ok(());
        }

        self.record_snapshot();

        if self.state.agents.iter().all(Agent::infected) {
            self.state.running = false;
            log::info!("all agents are infected, stopping the simulation");
            return Ok(());
        }

        // Each phase visits the agents in an independent, freshly shuffled
        // order.
        let order = self.shuffled_order();
        self.move_agents(&order).context("failed to move agents")?;

        let order = self.shuffled_order();
        self.spread_contact_infections(&order)
            .context("failed to spread contact infections")?;

        let order = self.shuffled_order();
        self.spread_location_infections(&order)
            .context("failed to spread location infections")?;

        self.decay_contamination();

        self.state.tick += 1;

        Ok(())
    }

    /// Perform the simulation and save the resulting states to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        for i_save in 0..self.cfg.saves_per_file {
            for _ in 0..self.cfg.steps_per_save {
                self.step().context("failed to perform step")?;
            }

            encode::write(&mut writer, &self.state).context("failed to serialize state")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    fn record_snapshot(&mut self) {
        self.metrics.record(Snapshot {
            tick: self.state.tick,
            infected_count: self.state.infected_count(),
            direct_infection_count: self.state.direct_infection_count,
            location_infection_count: self.state.location_infection_count,
        });
    }

    fn shuffled_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.state.agents.len()).collect();
        order.shuffle(&mut self.rng);
        order
    }

    fn move_agents(&mut self, order: &[usize]) -> Result<()> {
        for &id in order {
            let agt = &self.state.agents[id];
            let from = agt.cell().ok_or(SimError::UnboundAgent { id })?;
            let move_dist = Bernoulli::new(agt.move_probability())?;

            if !move_dist.sample(&mut self.rng) {
                continue;
            }
            let neighbors = self.state.grid.neighbors_of(from)?;
            // A 1x1 grid has no neighbors to move to.
            let Some(&to) = neighbors.choose(&mut self.rng) else {
                continue;
            };

            self.state.grid.place(id, Some(from), to)?;
            self.state.agents[id].set_cell(to);
        }
        Ok(())
    }

    fn spread_contact_infections(&mut self, order: &[usize]) -> Result<()> {
        let contact_dist = Bernoulli::new(CONTACT_PROB)?;
        let contact_comorbid_dist = Bernoulli::new(CONTACT_COMORBID_PROB)?;

        for &id in order {
            if !self.state.agents[id].infected() {
                continue;
            }
            let coord = self.state.agents[id]
                .cell()
                .ok_or(SimError::UnboundAgent { id })?;

            self.state.grid.cell_mut(coord)?.mark_contaminated();

            let encountered: Vec<usize> = self
                .state
                .grid
                .occupants_of(coord)?
                .iter()
                .copied()
                .filter(|&other| other != id)
                .collect();

            for other in encountered {
                if self.state.agents[other].infected() {
                    continue;
                }
                let dist = if self.state.agents[other].comorbid() {
                    &contact_comorbid_dist
                } else {
                    &contact_dist
                };
                if dist.sample(&mut self.rng) {
                    self.state.agents[other].become_infected();
                    self.state.direct_infection_count += 1;
                    log::debug!("agent {other} infected by contact with agent {id}");
                }
            }
        }
        Ok(())
    }

    fn spread_location_infections(&mut self, order: &[usize]) -> Result<()> {
        let local_dist = Bernoulli::new(LOCAL_PROB)?;
        let local_comorbid_dist = Bernoulli::new(LOCAL_COMORBID_PROB)?;
        let nearby_dist = Bernoulli::new(NEARBY_PROB)?;
        let nearby_comorbid_dist = Bernoulli::new(NEARBY_COMORBID_PROB)?;

        for &id in order {
            if self.state.agents[id].infected() {
                continue;
            }
            let coord = self.state.agents[id]
                .cell()
                .ok_or(SimError::UnboundAgent { id })?;
            let comorbid = self.state.agents[id].comorbid();

            // Risk gradient: own contaminated cell beats a contaminated
            // neighboring cell beats no contamination at all.
            let dist = if self.state.grid.cell(coord)?.contaminated() {
                if comorbid {
                    &local_comorbid_dist
                } else {
                    &local_dist
                }
            } else if self.neighboring_contamination(coord)? {
                if comorbid {
                    &nearby_comorbid_dist
                } else {
                    &nearby_dist
                }
            } else {
                continue;
            };

            if dist.sample(&mut self.rng) {
                self.state.agents[id].become_infected();
                self.state.location_infection_count += 1;
                log::debug!("agent {id} infected from its location");
            }
        }
        Ok(())
    }

    fn neighboring_contamination(&self, coord: Coord) -> Result<bool, SimError> {
        for neighbor in self.state.grid.neighbors_of(coord)? {
            if self.state.grid.cell(neighbor)?.contaminated() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn decay_contamination(&mut self) {
        let State { grid, agents, .. } = &mut self.state;
        grid.apply_decay(|id| agents[id].infected());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_fails_for_unbound_agent() {
        let cfg = Config {
            grid_width: 3,
            grid_height: 3,
            population_size: 1,
            infected_count: 0,
            comorbid_count: 0,
            contaminated_cell_count: 0,
            move_probability: 0.5,
            seed: Some(0),
            steps_per_save: 1,
            saves_per_file: 1,
        };

        // An agent that was never placed on the grid.
        let mut engine = Engine {
            cfg,
            state: State {
                tick: 0,
                running: true,
                grid: Grid::new(3, 3),
                agents: vec![Agent::new(0, false, false, 0.5)],
                direct_infection_count: 0,
                location_infection_count: 0,
            },
            metrics: MetricsCollector::new(),
            rng: ChaCha12Rng::seed_from_u64(0),
        };

        let error = engine.step().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SimError>(),
            Some(SimError::UnboundAgent { id: 0 })
        ));
        assert_eq!(engine.tick(), 0);
    }
}
