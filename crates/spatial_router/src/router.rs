//! Cross-client event routing
//!
//! A client submits a mouse or grab event on one of its own pokers or
//! grabbers, addressed to a panel or grabbable that may belong to another
//! client. The router resolves the target's capability through the
//! [`RoutingHost`], rewrites the event into the receiver's terms, and queues
//! it for delivery without waiting on it.
//!
//! Targets that do not resolve are dropped silently. The caller still sees
//! success; clients come and go between frames.

use crate::capability::{Capability, CapabilityKind};
use crate::events::{ForwardedGrabEvent, ForwardedMouseEvent, GrabEvent, GrabEventType, MouseEvent};
use crate::ids::{AppId, GlobalNodeId, LocalNodeId};
use crate::server::outbound::{OutboundRequest, RequestTicket};

/// Server services the router depends on
pub trait RoutingHost {
    /// Resolve a capability of `kind` by global node id, across all apps
    fn resolve_capability(&self, kind: CapabilityKind, node_id: GlobalNodeId) -> Option<Capability>;

    /// Queue a request for asynchronous delivery
    fn enqueue_outbound(&mut self, request: OutboundRequest) -> RequestTicket;

    /// Make `grabbable_id` follow `grabber_id`
    fn establish_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId);

    /// Stop `grabbable_id` following `grabber_id`
    fn dissolve_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId);
}

/// What happened to a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A request was queued for the target's processor
    Forwarded(RequestTicket),
    /// The target did not resolve; nothing was queued
    Dropped,
}

impl RouteOutcome {
    /// Whether a request was queued
    pub const fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded(_))
    }
}

/// Stateless mouse and grab event router
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRouter;

impl EventRouter {
    /// Route a mouse event from the caller's poker to a panel
    pub fn route_mouse_event<H: RoutingHost>(
        host: &mut H,
        caller: AppId,
        local_poker_id: LocalNodeId,
        event: MouseEvent,
    ) -> RouteOutcome {
        let (target_app, local_panel_id) = event.panel_id.decode();

        let Some(Capability::Panel(processor)) = host.resolve_capability(CapabilityKind::Panel, event.panel_id) else {
            log::debug!("Dropping {:?} from {} to unknown panel {}", event.event_type, caller, event.panel_id);
            return RouteOutcome::Dropped;
        };

        let forwarded = ForwardedMouseEvent {
            panel_id: event.panel_id,
            poker_id: GlobalNodeId::new(caller, local_poker_id),
            event_type: event.event_type,
            x: event.x,
            y: event.y,
        };
        log::debug!("Forwarding {:?} from poker {} to panel {} of {}", event.event_type, forwarded.poker_id, local_panel_id, target_app);

        let ticket = host.enqueue_outbound(OutboundRequest::MouseEvent {
            processor,
            local_panel_id,
            event: forwarded,
        });
        RouteOutcome::Forwarded(ticket)
    }

    /// Route a grab event from the caller's grabber to a grabbable
    ///
    /// When the event is forwarded, `StartGrab` establishes and `EndGrab`
    /// dissolves the grab pair on the host.
    pub fn route_grab_event<H: RoutingHost>(
        host: &mut H,
        caller: AppId,
        local_grabber_id: LocalNodeId,
        event: GrabEvent,
    ) -> RouteOutcome {
        let grabber_id = GlobalNodeId::new(caller, local_grabber_id);
        let grabbable_id = event.grabbable_id;

        let Some(Capability::Grabbable(processor)) = host.resolve_capability(CapabilityKind::Grabbable, grabbable_id) else {
            log::debug!("Dropping {:?} from grabber {} to unknown grabbable {}", event.event_type, grabber_id, grabbable_id);
            return RouteOutcome::Dropped;
        };

        let ticket = host.enqueue_outbound(OutboundRequest::GrabEvent {
            processor,
            local_grabbable_id: grabbable_id.local_id(),
            event: ForwardedGrabEvent {
                grabber_id,
                grabbable_id,
                event_type: event.event_type,
            },
        });

        match event.event_type {
            GrabEventType::StartGrab => host.establish_grab_pair(grabber_id, grabbable_id),
            GrabEventType::EndGrab => host.dissolve_grab_pair(grabber_id, grabbable_id),
            _ => {}
        }

        RouteOutcome::Forwarded(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MouseEventType;
    use crate::tests::fakes::{RecordingGrabbable, RecordingPanel};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Minimal host: a fixed capability table plus recorded side effects
    #[derive(Default)]
    struct FakeHost {
        capabilities: HashMap<(CapabilityKind, GlobalNodeId), Capability>,
        queued: Vec<OutboundRequest>,
        pairs: Vec<(&'static str, GlobalNodeId, GlobalNodeId)>,
    }

    impl RoutingHost for FakeHost {
        fn resolve_capability(&self, kind: CapabilityKind, node_id: GlobalNodeId) -> Option<Capability> {
            self.capabilities.get(&(kind, node_id)).cloned()
        }

        fn enqueue_outbound(&mut self, request: OutboundRequest) -> RequestTicket {
            self.queued.push(request);
            RequestTicket(self.queued.len() as u64)
        }

        fn establish_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
            self.pairs.push(("start", grabber_id, grabbable_id));
        }

        fn dissolve_grab_pair(&mut self, grabber_id: GlobalNodeId, grabbable_id: GlobalNodeId) {
            self.pairs.push(("end", grabber_id, grabbable_id));
        }
    }

    fn gid(app: u32, local: u32) -> GlobalNodeId {
        GlobalNodeId::new(AppId::from_raw(app), local)
    }

    #[test]
    fn test_mouse_event_is_rewritten_for_the_panel_owner() {
        let panel = Arc::new(RecordingPanel::default());
        let mut host = FakeHost::default();
        host.capabilities.insert((CapabilityKind::Panel, gid(1, 7)), Capability::Panel(panel));

        let event = MouseEvent {
            panel_id: gid(1, 7),
            event_type: MouseEventType::Down,
            x: 0.25,
            y: 0.75,
        };
        let outcome = EventRouter::route_mouse_event(&mut host, AppId::from_raw(2), 3, event);

        assert!(outcome.is_forwarded());
        assert_eq!(host.queued.len(), 1);
        let OutboundRequest::MouseEvent { local_panel_id, event, .. } = &host.queued[0] else {
            panic!("expected a mouse request");
        };
        assert_eq!(*local_panel_id, 7);
        assert_eq!(event.poker_id, gid(2, 3));
        assert_eq!(event.panel_id, gid(1, 7));
        assert_eq!((event.event_type, event.x, event.y), (MouseEventType::Down, 0.25, 0.75));
    }

    #[test]
    fn test_unknown_targets_are_dropped_without_requests() {
        let mut host = FakeHost::default();
        let mouse = MouseEvent {
            panel_id: gid(4, 1),
            event_type: MouseEventType::Move,
            x: 0.0,
            y: 0.0,
        };
        let grab = GrabEvent {
            grabbable_id: gid(4, 2),
            event_type: GrabEventType::StartGrab,
        };

        assert_eq!(EventRouter::route_mouse_event(&mut host, AppId::from_raw(1), 1, mouse), RouteOutcome::Dropped);
        assert_eq!(EventRouter::route_grab_event(&mut host, AppId::from_raw(1), 1, grab), RouteOutcome::Dropped);
        assert!(host.queued.is_empty());
        assert!(host.pairs.is_empty());
    }

    #[test]
    fn test_grab_lifecycle_side_effects() {
        let grabbable = Arc::new(RecordingGrabbable::default());
        let mut host = FakeHost::default();
        host.capabilities.insert((CapabilityKind::Grabbable, gid(1, 10)), Capability::Grabbable(grabbable));

        for event_type in [GrabEventType::EnterRange, GrabEventType::StartGrab, GrabEventType::Update, GrabEventType::EndGrab] {
            let event = GrabEvent {
                grabbable_id: gid(1, 10),
                event_type,
            };
            assert!(EventRouter::route_grab_event(&mut host, AppId::from_raw(2), 5, event).is_forwarded());
        }

        assert_eq!(host.queued.len(), 4);
        assert_eq!(host.pairs, vec![("start", gid(2, 5), gid(1, 10)), ("end", gid(2, 5), gid(1, 10))]);

        let OutboundRequest::GrabEvent { local_grabbable_id, event, .. } = &host.queued[1] else {
            panic!("expected a grab request");
        };
        assert_eq!(*local_grabbable_id, 10);
        assert_eq!(event.grabber_id, gid(2, 5));
        assert_eq!(event.grabbable_id, gid(1, 10));
    }

    #[test]
    fn test_wrong_kind_does_not_resolve() {
        let panel = Arc::new(RecordingPanel::default());
        let mut host = FakeHost::default();
        // A panel registered under the id the grab targets
        host.capabilities.insert((CapabilityKind::Panel, gid(1, 10)), Capability::Panel(panel));

        let grab = GrabEvent {
            grabbable_id: gid(1, 10),
            event_type: GrabEventType::StartGrab,
        };
        assert_eq!(EventRouter::route_grab_event(&mut host, AppId::from_raw(2), 1, grab), RouteOutcome::Dropped);
        assert!(host.pairs.is_empty());
    }
}
