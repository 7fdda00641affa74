//! Retained scene graph: a node arena with typed components.
//!
//! Nodes hold an ordered component list and parent/child links. Game code
//! mutates components between frames; the renderer reads the graph and never
//! writes it.
//!
//! # Invariants
//! - A node carries at most one render-relevant component of each kind;
//!   accessors return the first match.
//! - World matrices are composed on demand, never cached, so component
//!   mutations take effect on the next read.
//! - Parent links are expected to form a tree. The graph itself stays
//!   permissive; traversals bound their walks and report cycles instead of
//!   hanging.

pub mod animation;
pub mod component;
pub mod graph;

pub use animation::{Animation, Channel, ChannelValues, Interpolation};
pub use component::{Camera, Component, Light, Model, Primitive, Projection, Transform};
pub use graph::{Node, NodeId, Scene, SceneError};

pub fn crate_info() -> &'static str {
    "lantern-scene v0.1.0"
}
