//! Global node addressing
//!
//! A [`GlobalNodeId`] packs the owning application's [`AppId`] into the upper
//! 32 bits and the application's [`LocalNodeId`] into the lower 32 bits.
//! Local ids are only unique within one scene graph submission of one app, so
//! a global id is meaningful only while both halves are still live.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Node id local to one application's current scene graph
pub type LocalNodeId = u32;

/// Identity of a connected client application
///
/// Assigned once by the [`AppIdAllocator`] and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(u32);

impl AppId {
    /// Wrap a raw AppId value
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw 32-bit value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app#{}", self.0)
    }
}

/// Transport-level connection identity
///
/// One transport client may own several applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// 64-bit node address valid across applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalNodeId(u64);

impl GlobalNodeId {
    /// The all-zero id, never produced for a live node
    pub const NULL: Self = Self(0);

    /// Pack an application id and a local node id
    pub const fn new(app_id: AppId, local_id: LocalNodeId) -> Self {
        Self(((app_id.0 as u64) << 32) | local_id as u64)
    }

    /// Wrap a raw 64-bit value received from a client
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Owning application (upper 32 bits)
    #[allow(clippy::cast_possible_truncation)]
    pub const fn app_id(self) -> AppId {
        AppId((self.0 >> 32) as u32)
    }

    /// Node id within the owning application (lower 32 bits)
    #[allow(clippy::cast_possible_truncation)]
    pub const fn local_id(self) -> LocalNodeId {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Split into `(app, local)`
    pub const fn decode(self) -> (AppId, LocalNodeId) {
        (self.app_id(), self.local_id())
    }

    /// Whether this is [`GlobalNodeId::NULL`]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GlobalNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_id().0, self.local_id())
    }
}

/// Monotonic AppId source, owned by the server
///
/// Starts at 1 so that no live node ever packs to [`GlobalNodeId::NULL`].
#[derive(Debug)]
pub struct AppIdAllocator {
    next: Option<u32>,
}

impl AppIdAllocator {
    /// Create an allocator whose first id is 1
    pub const fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Hand out the next id
    pub fn allocate(&mut self) -> Result<AppId, ServerError> {
        let id = self.next.ok_or(ServerError::AppIdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(AppId(id))
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u32 {
        self.next.map_or(u32::MAX, |next| next - 1)
    }
}

impl Default for AppIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
