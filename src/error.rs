//! Typed errors of the simulation core.
//!
//! All of these signal configuration or setup bugs and are fatal; the engine
//! performs no I/O, so there are no transient-failure paths.

use std::error::Error;
use std::fmt;

use crate::grid::Coord;

/// Errors raised by the simulation core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// The initial population counts do not partition the population:
    /// `infected_count + comorbid_count` exceeds `population_size`.
    InvalidPopulationComposition {
        population_size: usize,
        infected_count: usize,
        comorbid_count: usize,
    },
    /// A coordinate outside the `[0,width) x [0,height)` range was used for a
    /// placement or query.
    InvalidCoordinate {
        coord: Coord,
        width: usize,
        height: usize,
    },
    /// A behavior was invoked on an agent that has not been placed on the
    /// grid yet.
    UnboundAgent { id: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPopulationComposition {
                population_size,
                infected_count,
                comorbid_count,
            } => write!(
                f,
                "invalid population composition: {infected_count} infected + \
                 {comorbid_count} comorbid agents exceed the population size {population_size}"
            ),
            Self::InvalidCoordinate {
                coord,
                width,
                height,
            } => write!(
                f,
                "coordinate {coord:?} is outside the {width}x{height} grid"
            ),
            Self::UnboundAgent { id } => {
                write!(f, "agent {id} is not bound to a grid cell")
            }
        }
    }
}

impl Error for SimError {}
