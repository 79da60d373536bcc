//! Capabilities and the per-application capability registry
//!
//! A capability is an opaque handle to a remote processor. Clients hand the
//! server one root processor per node kind with each scene graph submission;
//! every node of that kind in the submission maps to the same handle.
//!
//! The registry keeps the handles in a slot arena and the per-kind maps hold
//! slot keys. A rebuild clears the arena, so every key from the previous
//! submission stops resolving at once, even for node ids that reappear.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::events::{ForwardedGrabEvent, ForwardedMouseEvent};
use crate::ids::{GlobalNodeId, LocalNodeId};
use crate::intersections::GrabberIntersections;
use crate::scene::{NodeType, SceneGraphSnapshot};

/// Remote handler for panel nodes
pub trait PanelProcessor: fmt::Debug + Send + Sync {
    /// Deliver a mouse event addressed to one of the owner's panels
    fn mouse_event(&self, local_panel_id: LocalNodeId, event: &ForwardedMouseEvent);
}

/// Remote handler for poker nodes
pub trait PokerProcessor: fmt::Debug + Send + Sync {
    /// Report the panels currently in range of one of the owner's pokers
    fn panel_proximity(&self, local_poker_id: LocalNodeId, panels: &[GlobalNodeId]);
}

/// Remote handler for grabber nodes
pub trait GrabberProcessor: fmt::Debug + Send + Sync {
    /// Push the latest intersection result for one of the owner's grabbers
    fn grabber_intersections(&self, local_grabber_id: LocalNodeId, intersections: &GrabberIntersections);
}

/// Remote handler for grabbable nodes
pub trait GrabbableProcessor: fmt::Debug + Send + Sync {
    /// Deliver a grab event addressed to one of the owner's grabbables
    fn grab_event(&self, local_grabbable_id: LocalNodeId, event: &ForwardedGrabEvent);
}

/// The four processor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// [`PanelProcessor`]
    Panel,
    /// [`PokerProcessor`]
    Poker,
    /// [`GrabberProcessor`]
    Grabber,
    /// [`GrabbableProcessor`]
    Grabbable,
}

impl CapabilityKind {
    /// Kind responsible for nodes of `node_type`, if any
    pub const fn for_node_type(node_type: NodeType) -> Option<Self> {
        match node_type {
            NodeType::Panel => Some(Self::Panel),
            NodeType::Poker => Some(Self::Poker),
            NodeType::Grabber => Some(Self::Grabber),
            NodeType::Grabbable => Some(Self::Grabbable),
            _ => None,
        }
    }
}

/// A strong handle to one remote processor
#[derive(Debug, Clone)]
pub enum Capability {
    /// Panel processor
    Panel(Arc<dyn PanelProcessor>),
    /// Poker processor
    Poker(Arc<dyn PokerProcessor>),
    /// Grabber processor
    Grabber(Arc<dyn GrabberProcessor>),
    /// Grabbable processor
    Grabbable(Arc<dyn GrabbableProcessor>),
}

impl Capability {
    /// Kind of processor behind this handle
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Panel(_) => CapabilityKind::Panel,
            Self::Poker(_) => CapabilityKind::Poker,
            Self::Grabber(_) => CapabilityKind::Grabber,
            Self::Grabbable(_) => CapabilityKind::Grabbable,
        }
    }

    /// Whether two handles refer to the same remote object
    pub fn same_target(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Panel(a), Self::Panel(b)) => Arc::ptr_eq(a, b),
            (Self::Poker(a), Self::Poker(b)) => Arc::ptr_eq(a, b),
            (Self::Grabber(a), Self::Grabber(b)) => Arc::ptr_eq(a, b),
            (Self::Grabbable(a), Self::Grabbable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Root processors supplied with one scene graph submission
#[derive(Debug, Clone, Default)]
pub struct RootCapabilities {
    /// Shared by every panel node in the submission
    pub panel: Option<Arc<dyn PanelProcessor>>,
    /// Shared by every poker node in the submission
    pub poker: Option<Arc<dyn PokerProcessor>>,
    /// Shared by every grabber node in the submission
    pub grabber: Option<Arc<dyn GrabberProcessor>>,
    /// Shared by every grabbable node in the submission
    pub grabbable: Option<Arc<dyn GrabbableProcessor>>,
}

impl RootCapabilities {
    fn capability(&self, kind: CapabilityKind) -> Option<Capability> {
        match kind {
            CapabilityKind::Panel => self.panel.clone().map(Capability::Panel),
            CapabilityKind::Poker => self.poker.clone().map(Capability::Poker),
            CapabilityKind::Grabber => self.grabber.clone().map(Capability::Grabber),
            CapabilityKind::Grabbable => self.grabbable.clone().map(Capability::Grabbable),
        }
    }
}

new_key_type! {
    /// Arena slot holding one capability handle
    pub struct CapabilitySlot;
}

/// Per-application maps from local node id to capability
#[derive(Debug, Default)]
pub struct AppCapabilityRegistry {
    slots: SlotMap<CapabilitySlot, Capability>,
    panels: HashMap<LocalNodeId, CapabilitySlot>,
    pokers: HashMap<LocalNodeId, CapabilitySlot>,
    grabbers: HashMap<LocalNodeId, CapabilitySlot>,
    grabbables: HashMap<LocalNodeId, CapabilitySlot>,
}

impl AppCapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every map from a full snapshot
    ///
    /// Each root processor occupies one slot for the whole submission. Nodes
    /// whose kind has no root processor are skipped with a warning.
    pub fn rebuild(&mut self, snapshot: &SceneGraphSnapshot, roots: &RootCapabilities) {
        self.slots.clear();
        self.panels.clear();
        self.pokers.clear();
        self.grabbers.clear();
        self.grabbables.clear();

        let mut root_slots: HashMap<CapabilityKind, CapabilitySlot> = HashMap::new();
        for node in snapshot.nodes() {
            let Some(kind) = CapabilityKind::for_node_type(node.node_type) else {
                continue;
            };

            let slot = match root_slots.get(&kind) {
                Some(slot) => *slot,
                None => {
                    let Some(capability) = roots.capability(kind) else {
                        log::warn!("Node {} is {:?} but submission has no {:?} processor", node.id, node.node_type, kind);
                        continue;
                    };
                    let slot = self.slots.insert(capability);
                    root_slots.insert(kind, slot);
                    slot
                }
            };

            self.map_mut(kind).insert(node.id, slot);
        }

        log::trace!(
            "Capability maps rebuilt: {} panels, {} pokers, {} grabbers, {} grabbables",
            self.panels.len(),
            self.pokers.len(),
            self.grabbers.len(),
            self.grabbables.len()
        );
    }

    /// Look up the capability of `kind` bound to `local_id`
    pub fn find(&self, kind: CapabilityKind, local_id: LocalNodeId) -> Option<&Capability> {
        let slot = self.map(kind).get(&local_id)?;
        self.slots.get(*slot)
    }

    /// Panel processor for a local panel
    pub fn find_panel_processor(&self, local_id: LocalNodeId) -> Option<Arc<dyn PanelProcessor>> {
        match self.find(CapabilityKind::Panel, local_id)? {
            Capability::Panel(processor) => Some(Arc::clone(processor)),
            _ => None,
        }
    }

    /// Poker processor for a local poker
    pub fn find_poker_processor(&self, local_id: LocalNodeId) -> Option<Arc<dyn PokerProcessor>> {
        match self.find(CapabilityKind::Poker, local_id)? {
            Capability::Poker(processor) => Some(Arc::clone(processor)),
            _ => None,
        }
    }

    /// Grabber processor for a local grabber
    pub fn find_grabber_processor(&self, local_id: LocalNodeId) -> Option<Arc<dyn GrabberProcessor>> {
        match self.find(CapabilityKind::Grabber, local_id)? {
            Capability::Grabber(processor) => Some(Arc::clone(processor)),
            _ => None,
        }
    }

    /// Grabbable processor for a local grabbable
    pub fn find_grabbable_processor(&self, local_id: LocalNodeId) -> Option<Arc<dyn GrabbableProcessor>> {
        match self.find(CapabilityKind::Grabbable, local_id)? {
            Capability::Grabbable(processor) => Some(Arc::clone(processor)),
            _ => None,
        }
    }

    /// Number of nodes mapped for `kind`
    pub fn len(&self, kind: CapabilityKind) -> usize {
        self.map(kind).len()
    }

    /// Whether no node of any kind is mapped
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.pokers.is_empty() && self.grabbers.is_empty() && self.grabbables.is_empty()
    }

    /// Number of live capability slots (at most one per kind)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    const fn map(&self, kind: CapabilityKind) -> &HashMap<LocalNodeId, CapabilitySlot> {
        match kind {
            CapabilityKind::Panel => &self.panels,
            CapabilityKind::Poker => &self.pokers,
            CapabilityKind::Grabber => &self.grabbers,
            CapabilityKind::Grabbable => &self.grabbables,
        }
    }

    fn map_mut(&mut self, kind: CapabilityKind) -> &mut HashMap<LocalNodeId, CapabilitySlot> {
        match kind {
            CapabilityKind::Panel => &mut self.panels,
            CapabilityKind::Poker => &mut self.pokers,
            CapabilityKind::Grabber => &mut self.grabbers,
            CapabilityKind::Grabbable => &mut self.grabbables,
        }
    }
}
