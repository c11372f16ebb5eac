//! Discrete-time stochastic simulation of infectious-disease spread through a
//! population of mobile agents on a toroidal 2D grid.
//!
//! Direct (agent-to-agent) transmission combines with indirect transmission
//! through a decaying per-cell contamination field. The [`engine::Engine`]
//! owns the grid, the agent pool, and the seeded random number stream, and
//! exposes the per-tick state and metrics to read-only collaborators.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod manager;
pub mod metrics;
pub mod model;
pub mod stats;
