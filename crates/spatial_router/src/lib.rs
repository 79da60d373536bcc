//! # Spatial Router
//!
//! Scene composition and spatial event routing for a multi-client XR runtime.
//!
//! Independent client applications each submit a local scene graph. The
//! server merges them into one addressable space, tracks which client owns
//! which interactive node, and routes pointer and grab events between
//! clients based on per-frame collision tests.
//!
//! ## Features
//!
//! - **Global node addressing**: [`GlobalNodeId`] packs an [`AppId`] and a
//!   client-local node id into 64 bits
//! - **Capability maps**: per-client registries binding local nodes to the
//!   remote processor responsible for them
//! - **Event routing**: mouse and grab events rewritten and forwarded across
//!   client boundaries
//! - **Collision detection**: grabber / handle / hook intersection per frame
//! - **Intersection store**: buffer-bounded polling of the latest result
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_router::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     spatial_router::foundation::logging::init_with_filter(&config.log_filter);
//!
//!     let mut server = Server::new(config);
//!     let app = server.create_app(ClientId(1), "gadget")?;
//!     server.submit_scene_graph(app, SceneGraphSnapshot::default(), RootCapabilities::default())?;
//!
//!     let mut engine = CollisionEngine::new(server.config().collision.clone());
//!     engine.reset();
//!     let results = engine.update_grabber_intersections()?;
//!     server.publish_grabber_intersections(results);
//!     server.flush_outbound();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod error;
pub mod ids;
pub mod scene;
pub mod capability;
pub mod events;
pub mod intersections;
pub mod physics;
pub mod client;
pub mod router;
pub mod server;

#[cfg(test)]
mod tests;

pub use capability::{AppCapabilityRegistry, Capability, CapabilityKind, RootCapabilities};
pub use client::ClientApplication;
pub use error::{CollisionError, ServerError};
pub use ids::{AppId, AppIdAllocator, ClientId, GlobalNodeId, LocalNodeId};
pub use intersections::{GrabberIntersectionStore, GrabberIntersections, QueryError, QueryResult};
pub use router::{EventRouter, RouteOutcome, RoutingHost};
pub use server::{DeliveryReport, OutboundRequest, RequestTicket, Server};

/// Common imports for server hosts and client bindings
pub mod prelude {
    pub use crate::{
        AppCapabilityRegistry, AppId, Capability, CapabilityKind, ClientApplication, ClientId,
        CollisionError, EventRouter, GlobalNodeId, GrabberIntersectionStore, GrabberIntersections,
        LocalNodeId, QueryError, QueryResult, RequestTicket, RootCapabilities, RouteOutcome, Server, ServerError,
        capability::{GrabbableProcessor, GrabberProcessor, PanelProcessor, PokerProcessor},
        config::{CollisionConfig, Config, HapticsConfig, ServerConfig},
        events::{GrabEvent, GrabEventType, HapticEvent, MouseEvent, MouseEventType},
        foundation::math::{Mat4, Vec3, Transform},
        physics::{CollisionEngine, CollisionPhase, GrabberResult, Volume},
        scene::{Node, NodeType, SceneGraphSnapshot, SharedTextureDescriptor},
    };
}
