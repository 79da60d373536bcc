//! Scene graph snapshots submitted by client applications
//!
//! A snapshot is immutable once installed and is replaced wholesale by the
//! next submission. Only panels, pokers, grabbers, and grabbables take part
//! in routing; the remaining node types are carried for the render side.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Transform;
use crate::ids::LocalNodeId;
use crate::physics::Volume;

/// Kind of a scene graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Grouping node with no behaviour of its own
    Container,
    /// Anchor to a tracked origin (head, hands, stage)
    Origin,
    /// Local transform applied to children
    Transform,
    /// Renderable model
    Model,
    /// 2D surface that receives mouse events
    Panel,
    /// Pointer source that sends mouse events to panels
    Poker,
    /// Interaction source that can hold grabbables
    Grabber,
    /// Object a grabber may pick up
    Grabbable,
    /// Spatial handle belonging to a grabbable
    Handle,
    /// Passive anchor a grabbable can attach to
    Hook,
}

impl NodeType {
    /// Whether nodes of this type get a capability map entry
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Panel | Self::Poker | Self::Grabber | Self::Grabbable)
    }
}

/// Type-specific node data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum NodePayload {
    /// No payload
    #[default]
    None,
    /// Parent-relative transform
    Transform(Transform),
    /// Model resource reference
    Model {
        /// Resource URI
        uri: String,
    },
    /// Collision volume (grabber, handle, or hook)
    Volume(Volume),
    /// Named origin path such as `/user/hand/left`
    Origin {
        /// Origin path
        path: String,
    },
}

/// One node of a submitted scene graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Id unique within this submission
    pub id: LocalNodeId,
    /// Node kind
    pub node_type: NodeType,
    /// Parent node, `None` for roots
    #[serde(default)]
    pub parent: Option<LocalNodeId>,
    /// Type-specific payload
    #[serde(default)]
    pub payload: NodePayload,
}

impl Node {
    /// Create a payload-less root node
    pub const fn new(id: LocalNodeId, node_type: NodeType) -> Self {
        Self {
            id,
            node_type,
            parent: None,
            payload: NodePayload::None,
        }
    }

    /// Attach to a parent node (builder pattern)
    #[must_use]
    pub const fn with_parent(mut self, parent: LocalNodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach a payload (builder pattern)
    #[must_use]
    pub fn with_payload(mut self, payload: NodePayload) -> Self {
        self.payload = payload;
        self
    }
}

/// Ordered sequence of nodes from one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneGraphSnapshot {
    nodes: Vec<Node>,
}

impl SceneGraphSnapshot {
    /// Build a snapshot from nodes in submission order
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// All nodes in submission order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by local id
    pub fn node(&self, id: LocalNodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<Node> for SceneGraphSnapshot {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Pixel layout of a shared texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA
    Rgba8,
    /// 8-bit BGRA
    Bgra8,
}

/// Descriptor for the texture a client shares with the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedTextureDescriptor {
    /// OS-level shared handle
    pub shared_handle: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
}
