//! One connected client application
//!
//! Owned by the [`Server`](crate::Server). Holds the app's identity, its
//! current scene graph, the capability maps built from that graph, the
//! shared texture descriptor, and the intersection records for its grabbers.

use crate::capability::{AppCapabilityRegistry, RootCapabilities};
use crate::ids::{AppId, ClientId, GlobalNodeId, LocalNodeId};
use crate::intersections::{GrabberIntersectionStore, GrabberIntersections, QueryError, QueryResult};
use crate::scene::{SceneGraphSnapshot, SharedTextureDescriptor};

/// A client application registered with the server
#[derive(Debug)]
pub struct ClientApplication {
    app_id: AppId,
    client_id: ClientId,
    name: String,
    scene_graph: SceneGraphSnapshot,
    shared_texture: Option<SharedTextureDescriptor>,
    capabilities: AppCapabilityRegistry,
    intersections: GrabberIntersectionStore,
}

impl ClientApplication {
    /// Create an application with an empty scene graph
    pub fn new(app_id: AppId, client_id: ClientId, name: impl Into<String>) -> Self {
        Self {
            app_id,
            client_id,
            name: name.into(),
            scene_graph: SceneGraphSnapshot::default(),
            shared_texture: None,
            capabilities: AppCapabilityRegistry::new(),
            intersections: GrabberIntersectionStore::new(),
        }
    }

    /// Server-assigned application id
    pub const fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Transport client that created this application
    pub const fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global id of one of this app's local nodes
    pub const fn global_id(&self, local_id: LocalNodeId) -> GlobalNodeId {
        GlobalNodeId::new(self.app_id, local_id)
    }

    /// Replace the scene graph and rebuild every capability map from it
    ///
    /// Both are swapped within this call, so no lookup can observe the new
    /// graph with the old maps or the reverse.
    pub fn install_scene_graph(&mut self, snapshot: SceneGraphSnapshot, roots: &RootCapabilities) {
        self.capabilities.rebuild(&snapshot, roots);
        self.scene_graph = snapshot;
        log::debug!("{} ({}) installed scene graph with {} nodes", self.app_id, self.name, self.scene_graph.len());
    }

    /// Current scene graph
    pub const fn scene_graph(&self) -> &SceneGraphSnapshot {
        &self.scene_graph
    }

    /// Capability maps built from the current scene graph
    pub const fn capabilities(&self) -> &AppCapabilityRegistry {
        &self.capabilities
    }

    /// Set the texture this app shares with the renderer
    pub fn set_shared_texture_descriptor(&mut self, descriptor: SharedTextureDescriptor) {
        self.shared_texture = Some(descriptor);
    }

    /// Texture this app shares with the renderer, if any
    pub const fn shared_texture_descriptor(&self) -> Option<&SharedTextureDescriptor> {
        self.shared_texture.as_ref()
    }

    /// Store a new intersection record for one of this app's grabbers
    pub fn report_grabber_intersections(
        &mut self,
        local_grabber_id: LocalNodeId,
        is_pressed: bool,
        grabbable_ids: &[GlobalNodeId],
        hook_ids: &[GlobalNodeId],
    ) {
        let record = GrabberIntersections::new(is_pressed, grabbable_ids.iter().copied(), hook_ids.iter().copied());
        self.record_grabber_intersections(local_grabber_id, record);
    }

    /// Store a prepared intersection record
    pub fn record_grabber_intersections(&mut self, local_grabber_id: LocalNodeId, record: GrabberIntersections) {
        self.intersections.record(local_grabber_id, record);
    }

    /// Copy the latest record for a grabber into the caller's buffers
    pub fn query_grabber_intersection(
        &self,
        local_grabber_id: LocalNodeId,
        intersection_buffer: &mut [GlobalNodeId],
        hook_buffer: &mut [GlobalNodeId],
    ) -> Result<QueryResult, QueryError> {
        self.intersections.query(local_grabber_id, intersection_buffer, hook_buffer)
    }
}
