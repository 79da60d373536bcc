//! Error types for server bookkeeping and the collision engine
//!
//! Unresolvable routing targets are not errors; see
//! [`RouteOutcome`](crate::RouteOutcome). Intersection queries have their own
//! [`QueryError`](crate::QueryError).

use thiserror::Error;

use crate::ids::{AppId, ClientId};
use crate::intersections::QueryError;
use crate::physics::CollisionPhase;

/// Server-side bookkeeping errors, surfaced to the immediate caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The calling application is not (or no longer) registered
    #[error("Unknown application: {0}")]
    UnknownApp(AppId),

    /// Connecting another application would exceed the configured limit
    #[error("Client limit of {limit} reached, rejecting app for {client}")]
    TooManyClients {
        /// Configured limit
        limit: usize,
        /// Transport client that asked
        client: ClientId,
    },

    /// The AppId space is used up for this process
    #[error("AppId space exhausted")]
    AppIdsExhausted,

    /// An intersection query on a live app failed
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Collision engine contract violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// Entities may only be added, and a pass only run, while accumulating
    #[error("Collision engine is {0:?}, expected Accumulating")]
    NotAccumulating(CollisionPhase),

    /// Radius or extents are negative or not finite
    #[error("Invalid volume: {0}")]
    InvalidVolume(String),
}
