//! Error taxonomy for the simulation core.
//!
//! Ingestion and broadcast errors are surfaced to the caller that produced
//! them and never propagate into the tick; a bad input from one player must
//! not stall the shared simulation. Configuration errors are fatal, but only
//! at startup.

use shared::PlayerId;
use thiserror::Error;

/// Errors surfaced by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Malformed or out-of-range input; dropped without affecting others.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Operation referenced a player the core does not know about.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// Join attempt past the configured player capacity.
    #[error("player capacity exceeded (limit {limit})")]
    CapacityExceeded { limit: usize },

    /// Configuration values the scheduler refuses to start with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The scheduler is not running, so the request cannot be delivered.
    #[error("scheduler is not running")]
    SchedulerUnavailable,
}
