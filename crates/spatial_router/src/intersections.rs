//! Latest grabber intersection results, polled by the grabber's owner
//!
//! One record per grabber, last write wins. Reads never clear a record and
//! records never expire on their own.
//!
//! [`GrabberIntersectionStore::query`] copies into caller-provided buffers.
//! Both buffer lengths are checked before anything is written, so a failed
//! query leaves both buffers untouched.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::ids::{GlobalNodeId, LocalNodeId};

/// Intersection state of one grabber for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrabberIntersections {
    /// Whether the grab input is held
    pub is_pressed: bool,
    /// Intersecting grabbables, first-seen order, no duplicates
    pub grabbables: Vec<GlobalNodeId>,
    /// Intersecting hooks, first-seen order, no duplicates
    pub hooks: Vec<GlobalNodeId>,
}

impl GrabberIntersections {
    /// Build a record, dropping repeated ids while keeping first-seen order
    pub fn new(
        is_pressed: bool,
        grabbables: impl IntoIterator<Item = GlobalNodeId>,
        hooks: impl IntoIterator<Item = GlobalNodeId>,
    ) -> Self {
        Self {
            is_pressed,
            grabbables: dedup_in_order(grabbables),
            hooks: dedup_in_order(hooks),
        }
    }

    /// Whether nothing intersects the grabber
    pub fn is_empty(&self) -> bool {
        self.grabbables.is_empty() && self.hooks.is_empty()
    }
}

fn dedup_in_order(ids: impl IntoIterator<Item = GlobalNodeId>) -> Vec<GlobalNodeId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Successful query outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    /// Whether the grab input is held
    pub is_pressed: bool,
    /// Grabbable ids written to the front of the intersection buffer
    pub intersection_count: usize,
    /// Hook ids written to the front of the hook buffer
    pub hook_count: usize,
}

/// Query failures, reported directly to the caller
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// Grabber id 0 is never valid
    #[error("Invalid parameter: grabber id must be non-zero")]
    InvalidParameter,

    /// Nothing has been recorded for this grabber yet
    #[error("No intersection record for grabber")]
    NoEvents,

    /// At least one buffer is too small; nothing was written
    #[error("Buffer too small: need {needed_intersections} intersections and {needed_hooks} hooks")]
    InsufficientBufferSize {
        /// Length the intersection buffer needs
        needed_intersections: usize,
        /// Length the hook buffer needs
        needed_hooks: usize,
    },
}

/// Per-application intersection records keyed by local grabber id
#[derive(Debug, Default)]
pub struct GrabberIntersectionStore {
    records: HashMap<LocalNodeId, GrabberIntersections>,
}

impl GrabberIntersectionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for `grabber_id`
    pub fn record(&mut self, grabber_id: LocalNodeId, intersections: GrabberIntersections) {
        self.records.insert(grabber_id, intersections);
    }

    /// Copy the record for `grabber_id` into the supplied buffers
    pub fn query(
        &self,
        grabber_id: LocalNodeId,
        intersection_buffer: &mut [GlobalNodeId],
        hook_buffer: &mut [GlobalNodeId],
    ) -> Result<QueryResult, QueryError> {
        if grabber_id == 0 {
            return Err(QueryError::InvalidParameter);
        }

        let record = self.records.get(&grabber_id).ok_or(QueryError::NoEvents)?;

        let needed_intersections = record.grabbables.len();
        let needed_hooks = record.hooks.len();
        if needed_intersections > intersection_buffer.len() || needed_hooks > hook_buffer.len() {
            return Err(QueryError::InsufficientBufferSize {
                needed_intersections,
                needed_hooks,
            });
        }

        intersection_buffer[..needed_intersections].copy_from_slice(&record.grabbables);
        hook_buffer[..needed_hooks].copy_from_slice(&record.hooks);

        Ok(QueryResult {
            is_pressed: record.is_pressed,
            intersection_count: needed_intersections,
            hook_count: needed_hooks,
        })
    }

    /// Borrow the record for `grabber_id`
    pub fn get(&self, grabber_id: LocalNodeId) -> Option<&GrabberIntersections> {
        self.records.get(&grabber_id)
    }

    /// Number of grabbers with a record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no grabber has a record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
