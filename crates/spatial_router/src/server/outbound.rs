//! Outbound request queue
//!
//! Routed events and intersection pushes are queued here and delivered when
//! the host flushes. Each request holds the capability handle captured when
//! it was queued, so delivery does not depend on the sender's current maps.
//! Requests cannot be cancelled once queued.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::capability::{GrabbableProcessor, GrabberProcessor, PanelProcessor, PokerProcessor};
use crate::events::{ForwardedGrabEvent, ForwardedMouseEvent};
use crate::ids::{GlobalNodeId, LocalNodeId};
use crate::intersections::GrabberIntersections;

/// Handle identifying one queued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// A request waiting for delivery
#[derive(Debug, Clone)]
pub enum OutboundRequest {
    /// Mouse event for a panel owner
    MouseEvent {
        /// Panel owner's processor
        processor: Arc<dyn PanelProcessor>,
        /// Panel id in the receiver's scene graph
        local_panel_id: LocalNodeId,
        /// Rewritten event
        event: ForwardedMouseEvent,
    },
    /// Grab event for a grabbable owner
    GrabEvent {
        /// Grabbable owner's processor
        processor: Arc<dyn GrabbableProcessor>,
        /// Grabbable id in the receiver's scene graph
        local_grabbable_id: LocalNodeId,
        /// Rewritten event
        event: ForwardedGrabEvent,
    },
    /// Collision result for a grabber owner
    GrabberIntersections {
        /// Grabber the result belongs to
        grabber_id: GlobalNodeId,
        /// Grabber owner's processor, if the owner registered one
        processor: Option<Arc<dyn GrabberProcessor>>,
        /// Result to record and push
        intersections: GrabberIntersections,
    },
    /// Panels in range of a poker
    PanelProximity {
        /// Poker owner's processor
        processor: Arc<dyn PokerProcessor>,
        /// Poker id in the receiver's scene graph
        local_poker_id: LocalNodeId,
        /// Panels in range, nearest first
        panels: Vec<GlobalNodeId>,
    },
}

impl OutboundRequest {
    /// Short name for logging
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MouseEvent { .. } => "mouse_event",
            Self::GrabEvent { .. } => "grab_event",
            Self::GrabberIntersections { .. } => "grabber_intersections",
            Self::PanelProximity { .. } => "panel_proximity",
        }
    }
}

/// Outcome of delivering one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Request that was handled
    pub ticket: RequestTicket,
    /// False when the receiving app had gone away
    pub delivered: bool,
}

/// FIFO of requests awaiting delivery
#[derive(Debug, Default)]
pub struct OutboundQueue {
    next_ticket: u64,
    pending: VecDeque<(RequestTicket, OutboundRequest)>,
}

impl OutboundQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request; tickets increase in queue order
    pub fn push(&mut self, request: OutboundRequest) -> RequestTicket {
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        log::trace!("Queued {} as {}", request.label(), ticket);
        self.pending.push_back((ticket, request));
        ticket
    }

    /// Take every pending request in queue order
    pub fn drain(&mut self) -> Vec<(RequestTicket, OutboundRequest)> {
        self.pending.drain(..).collect()
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
