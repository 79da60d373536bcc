//! Interaction events exchanged between clients
//!
//! Clients submit [`MouseEvent`]s and [`GrabEvent`]s against their own local
//! pokers and grabbers. The router rewrites them into the forwarded forms,
//! which carry global ids for both ends.

use serde::{Deserialize, Serialize};

use crate::ids::GlobalNodeId;

/// Mouse event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseEventType {
    /// Button pressed over the panel
    Down,
    /// Button released over the panel
    Up,
    /// Poker entered the panel
    Enter,
    /// Poker left the panel
    Leave,
    /// Poker moved across the panel
    Move,
}

/// Mouse event as submitted by the poker's owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Target panel, possibly owned by another app
    pub panel_id: GlobalNodeId,
    /// Event kind
    pub event_type: MouseEventType,
    /// Panel-space x
    pub x: f32,
    /// Panel-space y
    pub y: f32,
}

/// Mouse event as delivered to the panel's owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardedMouseEvent {
    /// Target panel
    pub panel_id: GlobalNodeId,
    /// Poker that produced the event
    pub poker_id: GlobalNodeId,
    /// Event kind
    pub event_type: MouseEventType,
    /// Panel-space x
    pub x: f32,
    /// Panel-space y
    pub y: f32,
}

/// Grab event kinds
///
/// Only [`GrabEventType::StartGrab`] and [`GrabEventType::EndGrab`] change
/// server state; the rest are forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrabEventType {
    /// Grabber came within range of the grabbable
    EnterRange,
    /// Grabber left the grabbable's range
    LeaveRange,
    /// Grabbable starts following the grabber
    StartGrab,
    /// Grabbable stops following the grabber
    EndGrab,
    /// Grabbable came within range of a hook
    EnterHookRange,
    /// Grabbable left a hook's range
    LeaveHookRange,
    /// Grabber asks the grabbable whether it may be grabbed
    RequestGrab,
    /// Grabbable's answer to a grab request
    RequestGrabResponse,
    /// Periodic update while held
    Update,
}

/// Grab event as submitted by the grabber's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrabEvent {
    /// Target grabbable, possibly owned by another app
    pub grabbable_id: GlobalNodeId,
    /// Event kind
    pub event_type: GrabEventType,
}

/// Grab event as delivered to the grabbable's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedGrabEvent {
    /// Grabber that produced the event
    pub grabber_id: GlobalNodeId,
    /// Target grabbable
    pub grabbable_id: GlobalNodeId,
    /// Event kind
    pub event_type: GrabEventType,
}

/// Haptic pulse queued for the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticEvent {
    /// Node whose device should vibrate
    pub target: GlobalNodeId,
    /// Amplitude after clamping
    pub amplitude: f32,
    /// Frequency in Hz
    pub frequency: f32,
    /// Duration in seconds after clamping
    pub duration: f32,
}
