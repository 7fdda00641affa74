//! Backend-agnostic frame planning.
//!
//! [`plan_frame`] turns a scene plus an asset store into a [`FramePlan`]: the
//! camera and light uniforms for the frame and a pre-order list of draw
//! records with their uniform bytes already laid out. A GPU backend consumes
//! the plan; nothing in this crate touches a device.
//!
//! # Invariants
//! - Planning never mutates the scene or the asset store.
//! - Draw order equals pre-order traversal of the scene tree.
//! - Uniform structs here are the exact byte layout the shaders read.

mod plan;
mod uniforms;

pub use plan::{DrawNode, DrawPrimitive, FramePlan, RenderError, plan_frame};
pub use uniforms::{CameraUniforms, LightUniforms, MaterialUniforms, ModelUniforms};

pub fn crate_info() -> &'static str {
    "lantern-render v0.1.0"
}
