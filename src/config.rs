use crate::error::SimError;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Grid width (cells).
    pub grid_width: usize,
    /// Grid height (cells).
    pub grid_height: usize,

    /// Total number of agents.
    pub population_size: usize,
    /// Number of agents infected at initialization.
    pub infected_count: usize,
    /// Number of agents with comorbidities at initialization.
    pub comorbid_count: usize,

    /// Number of cells contaminated at initialization.
    pub contaminated_cell_count: usize,

    /// Per-agent probability of moving each tick.
    pub move_probability: f64,

    /// Seed of the random number stream; absent means OS seeding and a
    /// non-reproducible run.
    pub seed: Option<u64>,

    /// Number of ticks between trajectory saves.
    pub steps_per_save: usize,
    /// Number of saves written per trajectory file.
    pub saves_per_file: usize,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config =
            toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check that all parameters are in range and that the initial population
    /// counts partition the population.
    pub fn validate(&self) -> Result<()> {
        check_num(self.grid_width, 1..10_000).context("invalid grid width")?;
        check_num(self.grid_height, 1..10_000).context("invalid grid height")?;

        check_num(self.population_size, 1..1_000_000).context("invalid population size")?;
        if self.infected_count + self.comorbid_count > self.population_size {
            return Err(SimError::InvalidPopulationComposition {
                population_size: self.population_size,
                infected_count: self.infected_count,
                comorbid_count: self.comorbid_count,
            }
            .into());
        }

        let n_cells = self.grid_width * self.grid_height;
        check_num(self.contaminated_cell_count, 0..=n_cells)
            .context("invalid number of contaminated cells")?;

        check_num(self.move_probability, 0.0..=1.0).context("invalid movement probability")?;

        check_num(self.steps_per_save, 1..100_000).context("invalid number of steps per save")?;
        check_num(self.saves_per_file, 1..100_000).context("invalid number of saves per file")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            grid_width: 10,
            grid_height: 10,
            population_size: 15,
            infected_count: 1,
            comorbid_count: 4,
            contaminated_cell_count: 1,
            move_probability: 0.5,
            seed: Some(0),
            steps_per_save: 8,
            saves_per_file: 4,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn composition_overflow_is_rejected() {
        let cfg = Config {
            infected_count: 10,
            comorbid_count: 6,
            ..base_config()
        };
        let error = cfg.validate().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SimError>(),
            Some(SimError::InvalidPopulationComposition { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(
            Config {
                grid_width: 0,
                ..base_config()
            }
            .validate()
            .is_err()
        );
        assert!(
            Config {
                move_probability: 1.5,
                ..base_config()
            }
            .validate()
            .is_err()
        );
        assert!(
            Config {
                contaminated_cell_count: 101,
                ..base_config()
            }
            .validate()
            .is_err()
        );
    }
}
