//! The routing server
//!
//! Owns every [`ClientApplication`], the AppId allocator, the outbound
//! request queue, grab pairs, queued haptics, and the frame-dirty flag. All
//! mutation happens on the single event-processing thread that drives it.
//!
//! Per-frame host loop:
//!
//! 1. Apply client calls (`submit_*`, `report_*`) as they arrive
//! 2. When [`Server::take_frame_dirty`] reports a change, feed the
//!    [`CollisionEngine`](crate::physics::CollisionEngine) and hand its
//!    results to [`Server::publish_grabber_intersections`]
//! 3. [`Server::flush_outbound`] delivers queued requests in order
//! 4. [`Server::take_haptics`] hands pulses to the input layer

pub mod outbound;

use std::collections::{BTreeMap, HashMap};

use crate::capability::{Capability, CapabilityKind, RootCapabilities};
use crate::client::ClientApplication;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::events::{GrabEvent, HapticEvent, MouseEvent};
use crate::ids::{AppId, AppIdAllocator, ClientId, GlobalNodeId, LocalNodeId};
use crate::intersections::QueryResult;
use crate::physics::GrabberResult;
use crate::router::{EventRouter, RouteOutcome, RoutingHost};
use crate::scene::{SceneGraphSnapshot, SharedTextureDescriptor};

pub use outbound::{DeliveryReport, OutboundQueue, OutboundRequest, RequestTicket};

/// Scene composition and event routing server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app_ids: AppIdAllocator,
    apps: BTreeMap<AppId, ClientApplication>,
    outbound: OutboundQueue,
    /// grabbable -> grabber it follows
    grab_pairs: HashMap<GlobalNodeId, GlobalNodeId>,
    haptics: Vec<HapticEvent>,
    frame_dirty: bool,
}

impl Server {
    /// Create a server with no applications
    ///
    /// Haptic limits that fail [`HapticsConfig::validate`](crate::config::HapticsConfig::validate)
    /// are logged; dispatch still bounds every pulse without panicking.
    pub fn new(config: ServerConfig) -> Self {
        log::info!("Starting {}", config.server_name);
        if let Err(err) = config.haptics.validate() {
            log::warn!("{}; affected haptic values dispatch as 0", err);
        }
        Self {
            config,
            app_ids: AppIdAllocator::new(),
            apps: BTreeMap::new(),
            outbound: OutboundQueue::new(),
            grab_pairs: HashMap::new(),
            haptics: Vec::new(),
            frame_dirty: false,
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    // --- Application registry -------------------------------------------

    /// Register a new application for a transport client
    pub fn create_app(&mut self, client_id: ClientId, name: &str) -> Result<AppId, ServerError> {
        if let Some(limit) = self.config.max_clients {
            if self.apps.len() >= limit {
                log::warn!("Rejecting app '{}' for {}: limit of {} reached", name, client_id, limit);
                return Err(ServerError::TooManyClients { limit, client: client_id });
            }
        }

        let app_id = self.app_ids.allocate()?;
        self.apps.insert(app_id, ClientApplication::new(app_id, client_id, name));
        log::info!("{} '{}' connected for {}", app_id, name, client_id);
        Ok(app_id)
    }

    /// Remove an application; returns false if it was already gone
    ///
    /// Later lookups of its nodes resolve to nothing. Requests already
    /// queued for its processors are still delivered.
    pub fn disconnect(&mut self, app_id: AppId) -> bool {
        let Some(app) = self.apps.remove(&app_id) else {
            return false;
        };

        self.grab_pairs
            .retain(|grabbable, grabber| grabbable.app_id() != app_id && grabber.app_id() != app_id);
        self.mark_frame_dirty();
        log::info!("{} '{}' disconnected", app_id, app.name());
        true
    }

    /// Remove every application owned by a transport client
    pub fn remove_client_apps(&mut self, client_id: ClientId) -> Vec<AppId> {
        let owned: Vec<AppId> = self
            .apps
            .values()
            .filter(|app| app.client_id() == client_id)
            .map(ClientApplication::app_id)
            .collect();
        for app_id in &owned {
            self.disconnect(*app_id);
        }
        owned
    }

    /// Borrow a live application
    pub fn app(&self, app_id: AppId) -> Result<&ClientApplication, ServerError> {
        self.apps.get(&app_id).ok_or(ServerError::UnknownApp(app_id))
    }

    /// Mutably borrow a live application
    pub fn app_mut(&mut self, app_id: AppId) -> Result<&mut ClientApplication, ServerError> {
        self.apps.get_mut(&app_id).ok_or(ServerError::UnknownApp(app_id))
    }

    /// Display name of a live application
    pub fn app_name(&self, app_id: AppId) -> Result<&str, ServerError> {
        self.app(app_id).map(ClientApplication::name)
    }

    /// Number of live applications
    pub fn app_count(&self) -> usize {
        self.apps.len()
    }

    /// Scene graphs with at least one node, keyed by owner, in AppId order
    pub fn gather_scene_graphs(&self) -> Vec<(AppId, &SceneGraphSnapshot)> {
        self.apps
            .values()
            .filter(|app| !app.scene_graph().is_empty())
            .map(|app| (app.app_id(), app.scene_graph()))
            .collect()
    }

    // --- Per-application operations -------------------------------------

    /// Replace an app's scene graph and capability maps, then mark the frame dirty
    pub fn submit_scene_graph(
        &mut self,
        app_id: AppId,
        snapshot: SceneGraphSnapshot,
        roots: RootCapabilities,
    ) -> Result<(), ServerError> {
        self.app_mut(app_id)?.install_scene_graph(snapshot, &roots);
        self.mark_frame_dirty();
        Ok(())
    }

    /// Set an app's shared texture
    pub fn set_shared_texture_descriptor(
        &mut self,
        app_id: AppId,
        descriptor: SharedTextureDescriptor,
    ) -> Result<(), ServerError> {
        self.app_mut(app_id)?.set_shared_texture_descriptor(descriptor);
        Ok(())
    }

    /// An app's shared texture, if it set one
    pub fn shared_texture_descriptor(&self, app_id: AppId) -> Result<Option<&SharedTextureDescriptor>, ServerError> {
        Ok(self.app(app_id)?.shared_texture_descriptor())
    }

    /// Store an intersection record produced outside the collision engine
    pub fn report_grabber_intersections(
        &mut self,
        app_id: AppId,
        local_grabber_id: LocalNodeId,
        is_pressed: bool,
        grabbable_ids: &[GlobalNodeId],
        hook_ids: &[GlobalNodeId],
    ) -> Result<(), ServerError> {
        self.app_mut(app_id)?
            .report_grabber_intersections(local_grabber_id, is_pressed, grabbable_ids, hook_ids);
        Ok(())
    }

    /// Copy the latest record for one of `app_id`'s grabbers into the buffers
    ///
    /// Query failures arrive as [`ServerError::Query`].
    pub fn query_grabber_intersection(
        &self,
        app_id: AppId,
        local_grabber_id: LocalNodeId,
        intersection_buffer: &mut [GlobalNodeId],
        hook_buffer: &mut [GlobalNodeId],
    ) -> Result<QueryResult, ServerError> {
        let result = self
            .app(app_id)?
            .query_grabber_intersection(local_grabber_id, intersection_buffer, hook_buffer)?;
        Ok(result)
    }

    /// Route a mouse event from one of `app_id`'s pokers
    ///
    /// Only an unknown caller is an error; an unknown target is `Ok(Dropped)`.
    pub fn submit_mouse_event(
        &mut self,
        app_id: AppId,
        local_poker_id: LocalNodeId,
        event: MouseEvent,
    ) -> Result<RouteOutcome, ServerError> {
        self.app(app_id)?;
        Ok(EventRouter::route_mouse_event(self, app_id, local_poker_id, event))
    }

    /// Route a grab event from one of `app_id`'s grabbers
    pub fn submit_grab_event(
        &mut self,
        app_id: AppId,
        local_grabber_id: LocalNodeId,
        event: GrabEvent,
    ) -> Result<RouteOutcome, ServerError> {
        self.app(app_id)?;
        Ok(EventRouter::route_grab_event(self, app_id, local_grabber_id, event))
    }

    /// Queue a haptic pulse requested by `app_id`
    pub fn submit_haptic_request(
        &mut self,
        app_id: AppId,
        target: GlobalNodeId,
        amplitude: f32,
        frequency: f32,
        duration: f32,
    ) -> Result<(), ServerError> {
        self.app(app_id)?;
        self.dispatch_haptic(target, amplitude, frequency, duration);
        Ok(())
    }

    // --- Capability resolution ------------------------------------------

    /// Resolve a capability by global node id, across all live apps
    pub fn resolve_capability(&self, kind: CapabilityKind, node_id: GlobalNodeId) -> Option<Capability> {
        let (app_id, local_id) = node_id.decode();
        self.apps.get(&app_id)?.capabilities().find(kind, local_id).cloned()
    }

    // --- Frame state ----------------------------------------------------

    /// Flag that the composed scene changed
    pub fn mark_frame_dirty(&mut self) {
        self.frame_dirty = true;
    }

    /// Whether the composed scene changed since the last take
    pub const fn is_frame_dirty(&self) -> bool {
        self.frame_dirty
    }

    /// Read and clear the dirty flag
    pub fn take_frame_dirty(&mut self) -> bool {
        std::mem::take(&mut self.frame_dirty)
    }

    // --- Grab pairs -----------------------------------------------------

    /// Make `grabbable_id` follow `grabber_id`, replacing any previous grabber
    pub fn establish_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
        if let Some(previous) = self.grab_pairs.insert(grabbable_id, grabber_id) {
            if previous != grabber_id {
                log::debug!("{} taken from grabber {} by {}", grabbable_id, previous, grabber_id);
            }
        }
        self.mark_frame_dirty();
    }

    /// Stop `grabbable_id` following `grabber_id`; no-op if another grabber holds it
    pub fn dissolve_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
        if self.grab_pairs.get(&grabbable_id) == Some(&grabber_id) {
            self.grab_pairs.remove(&grabbable_id);
            self.mark_frame_dirty();
        } else {
            log::debug!("Ignoring end of grab {} -> {}: not paired", grabber_id, grabbable_id);
        }
    }

    /// Grabber currently holding `grabbable_id`
    pub fn grabber_for(&self, grabbable_id: GlobalNodeId) -> Option<GlobalNodeId> {
        self.grab_pairs.get(&grabbable_id).copied()
    }

    /// Every `(grabber, grabbable)` pair
    pub fn grab_pairs(&self) -> impl Iterator<Item = (GlobalNodeId, GlobalNodeId)> + '_ {
        self.grab_pairs.iter().map(|(grabbable, grabber)| (*grabber, *grabbable))
    }

    // --- Haptics --------------------------------------------------------

    /// Queue a haptic pulse, clamped to the configured limits
    pub fn dispatch_haptic(&mut self, target: GlobalNodeId, amplitude: f32, frequency: f32, duration: f32) {
        let limits = &self.config.haptics;
        let event = HapticEvent {
            target,
            amplitude: limits.bound_amplitude(amplitude),
            frequency: if frequency.is_nan() { 0.0 } else { frequency.max(0.0) },
            duration: limits.bound_duration(duration),
        };
        log::debug!("Haptic for {}: {:?}", target, event);
        self.haptics.push(event);
    }

    /// Take every queued haptic pulse
    pub fn take_haptics(&mut self) -> Vec<HapticEvent> {
        std::mem::take(&mut self.haptics)
    }

    // --- Outbound delivery ----------------------------------------------

    /// Queue a request for delivery
    pub fn enqueue_outbound(&mut self, request: OutboundRequest) -> RequestTicket {
        self.outbound.push(request)
    }

    /// Number of requests awaiting delivery
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Take the raw queue for hosts that deliver requests themselves
    pub fn take_outbound(&mut self) -> Vec<(RequestTicket, OutboundRequest)> {
        self.outbound.drain()
    }

    /// Queue each collision result for its grabber's owner
    ///
    /// Results for grabbers whose app is gone are skipped.
    pub fn publish_grabber_intersections(&mut self, results: Vec<GrabberResult>) {
        for GrabberResult { grabber_id, intersections } in results {
            let (app_id, local_id) = grabber_id.decode();
            let Some(app) = self.apps.get(&app_id) else {
                log::debug!("Skipping intersections for departed grabber {}", grabber_id);
                continue;
            };
            let processor = app.capabilities().find_grabber_processor(local_id);
            self.outbound.push(OutboundRequest::GrabberIntersections {
                grabber_id,
                processor,
                intersections,
            });
        }
    }

    /// Queue the panels in range of a poker for the poker's owner
    pub fn publish_panel_proximity(&mut self, poker_id: GlobalNodeId, panels: Vec<GlobalNodeId>) -> RouteOutcome {
        let Some(Capability::Poker(processor)) = self.resolve_capability(CapabilityKind::Poker, poker_id) else {
            return RouteOutcome::Dropped;
        };
        let ticket = self.outbound.push(OutboundRequest::PanelProximity {
            processor,
            local_poker_id: poker_id.local_id(),
            panels,
        });
        RouteOutcome::Forwarded(ticket)
    }

    /// Deliver every queued request in order
    pub fn flush_outbound(&mut self) -> Vec<DeliveryReport> {
        let pending = self.outbound.drain();
        let mut reports = Vec::with_capacity(pending.len());

        for (ticket, request) in pending {
            let delivered = match request {
                OutboundRequest::MouseEvent {
                    processor,
                    local_panel_id,
                    event,
                } => {
                    processor.mouse_event(local_panel_id, &event);
                    true
                }
                OutboundRequest::GrabEvent {
                    processor,
                    local_grabbable_id,
                    event,
                } => {
                    processor.grab_event(local_grabbable_id, &event);
                    true
                }
                OutboundRequest::PanelProximity {
                    processor,
                    local_poker_id,
                    panels,
                } => {
                    processor.panel_proximity(local_poker_id, &panels);
                    true
                }
                OutboundRequest::GrabberIntersections {
                    grabber_id,
                    processor,
                    intersections,
                } => {
                    let (app_id, local_id) = grabber_id.decode();
                    match self.apps.get_mut(&app_id) {
                        Some(app) => {
                            if let Some(processor) = processor {
                                processor.grabber_intersections(local_id, &intersections);
                            }
                            app.record_grabber_intersections(local_id, intersections);
                            true
                        }
                        None => false,
                    }
                }
            };

            if !delivered {
                log::debug!("{} not delivered: receiver is gone", ticket);
            }
            reports.push(DeliveryReport { ticket, delivered });
        }

        reports
    }
}

impl RoutingHost for Server {
    fn resolve_capability(&self, kind: CapabilityKind, node_id: GlobalNodeId) -> Option<Capability> {
        Self::resolve_capability(self, kind, node_id)
    }

    fn enqueue_outbound(&mut self, request: OutboundRequest) -> RequestTicket {
        Self::enqueue_outbound(self, request)
    }

    fn establish_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
        Self::establish_grab_pair(self, grabber_id, grabbable_id);
    }

    fn dissolve_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
        Self::dissolve_grab_pair(self, grabber_id, grabbable_id);
    }
}
