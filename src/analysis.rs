use crate::config::Config;
use crate::model::State;
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, state: &State) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Fraction of the population infected at each save.
pub struct InfectedFraction {
    acc: Accumulator,
}

impl InfectedFraction {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for InfectedFraction {
    fn update(&mut self, state: &State) -> Result<()> {
        let fraction = state.infected_count() as f64 / state.agents.len() as f64;
        self.acc.add(fraction);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "infected_fraction": self.acc.report() })
    }
}

/// Fraction of grid cells contaminated at each save.
pub struct ContaminatedFraction {
    acc: Accumulator,
}

impl ContaminatedFraction {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for ContaminatedFraction {
    fn update(&mut self, state: &State) -> Result<()> {
        let contaminated = state
            .grid
            .iter_cells()
            .filter(|(_, cell)| cell.contaminated())
            .count();
        self.acc.add(contaminated as f64 / state.grid.cell_count() as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "contaminated_fraction": self.acc.report() })
    }
}

/// Cumulative direct and environmental transmission totals.
///
/// The counters are monotone, so keeping the last observed values suffices.
pub struct TransmissionTotals {
    direct: usize,
    location: usize,
}

impl TransmissionTotals {
    pub fn new() -> Self {
        Self {
            direct: 0,
            location: 0,
        }
    }
}

impl Obs for TransmissionTotals {
    fn update(&mut self, state: &State) -> Result<()> {
        self.direct = state.direct_infection_count;
        self.location = state.location_infection_count;
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "transmission_totals": {
                "direct": self.direct,
                "location": self.location,
            }
        })
    }
}

pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
        obs_ptr_vec.push(Box::new(InfectedFraction::new()));
        obs_ptr_vec.push(Box::new(ContaminatedFraction::new()));
        obs_ptr_vec.push(Box::new(TransmissionTotals::new()));
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.saves_per_file {
            let state = decode::from_read(&mut reader).context("failed to read state")?;
            for obs in &mut self.obs_ptr_vec {
                obs.update(&state).context("failed to update observable")?;
            }
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::to_writer_pretty(writer, &reports)?;
        Ok(())
    }
}
