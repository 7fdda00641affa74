//! wgpu backend for lantern frame plans.
//!
//! Executes a [`lantern_render::FramePlan`] against a device: one forward
//! pass, fixed bind group order (camera 0, node 1, material 2, light 3),
//! depth-tested, cleared to white.
//!
//! # Invariants
//! - GPU resources are cached per handle and never evicted; re-rendering a
//!   scene reuses every buffer, texture, and bind group it already has.
//! - Allocation and uploads happen before the pass; the pass re-resolves
//!   memoized entries only.
//! - A frame is submitted completely or not at all.

mod cache;
mod pipeline;
mod renderer;
mod shaders;

pub use cache::{GpuCache, ImageGpu, MaterialGpu, MeshGpu, SamplerGpu, UniformGpu};
pub use pipeline::{DEPTH_FORMAT, ScenePipeline};
pub use renderer::{CLEAR_COLOR, EnvironmentMap, RenderTarget, SceneRenderer};
pub use shaders::SCENE_SHADER;

/// Headless device for GPU-backed tests. `None` when the host has no usable
/// adapter; callers skip in that case.
#[cfg(test)]
pub(crate) fn test_gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("test_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: Default::default(),
        },
        None,
    ))
    .ok()
}
