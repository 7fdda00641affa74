//! Scene traversal and frame planning.
//!
//! One call to [`plan_frame`] walks the scene tree once, in pre-order,
//! composing world matrices on the way down, and returns everything a backend
//! needs to draw the frame. All scene-shape preconditions are checked here,
//! before any GPU work starts: the camera must be part of the tree, exactly
//! one node must carry a light, every referenced asset must resolve, and the
//! walk must not revisit a node.

use std::collections::BTreeSet;

use glam::Mat4;
use serde::Serialize;
use thiserror::Error;

use lantern_assets::{AssetStore, ImageId, MaterialId, MeshId, SamplerId};
use lantern_scene::{NodeId, Scene};

use crate::uniforms::{CameraUniforms, LightUniforms, MaterialUniforms, ModelUniforms};

/// Why a frame could not be planned or executed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("node {0:?} is not part of the scene")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no camera component")]
    NoCamera(NodeId),
    #[error("scene has no light-bearing node")]
    NoLight,
    #[error("scene has {count} light-bearing nodes, expected exactly one")]
    MultipleLights { count: usize },
    #[error("node {0:?} was reached twice during traversal")]
    CycleDetected(NodeId),
    #[error("mesh {0:?} is not registered in the asset store")]
    MeshMissing(MeshId),
    #[error("material {0:?} is not registered in the asset store")]
    MaterialMissing(MaterialId),
    #[error("image {0:?} is not registered in the asset store")]
    ImageMissing(ImageId),
    #[error("sampler {0:?} is not registered in the asset store")]
    SamplerMissing(SamplerId),
    #[error("environment image {index}: {reason}")]
    EnvironmentImage { index: usize, reason: String },
}

/// One primitive to draw: resolved handles plus its uniform bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawPrimitive {
    pub mesh: MeshId,
    pub material: MaterialId,
    pub uniforms: MaterialUniforms,
    pub index_count: u32,
}

/// One model-bearing node: its uniform block and the primitives under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawNode {
    pub node: NodeId,
    pub uniforms: ModelUniforms,
    pub primitives: Vec<DrawPrimitive>,
}

/// Everything one frame needs, in the order the backend should consume it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramePlan {
    pub camera_node: NodeId,
    pub camera: CameraUniforms,
    pub light_node: NodeId,
    pub light: LightUniforms,
    pub draws: Vec<DrawNode>,
}

impl FramePlan {
    /// Total primitives across all draw records.
    pub fn primitive_count(&self) -> usize {
        self.draws.iter().map(|d| d.primitives.len()).sum()
    }
}

struct Walk<'a> {
    scene: &'a Scene,
    assets: &'a AssetStore,
    camera_node: NodeId,
    camera_world: Option<Mat4>,
    lights: Vec<(NodeId, Mat4)>,
    draws: Vec<DrawNode>,
    visited: BTreeSet<NodeId>,
}

/// Plan one frame viewed through `camera_node`.
///
/// Read-only over both inputs. Errors leave no partial plan behind; a
/// backend that sees `Ok` can submit the whole frame.
pub fn plan_frame(
    scene: &Scene,
    assets: &AssetStore,
    camera_node: NodeId,
) -> Result<FramePlan, RenderError> {
    let camera = scene
        .node(camera_node)
        .ok_or(RenderError::NodeNotFound(camera_node))?
        .camera()
        .copied()
        .ok_or(RenderError::NoCamera(camera_node))?;

    let mut walk = Walk {
        scene,
        assets,
        camera_node,
        camera_world: None,
        lights: Vec::new(),
        draws: Vec::new(),
        visited: BTreeSet::new(),
    };
    visit(&mut walk, scene.root(), Mat4::IDENTITY)?;

    // A camera that exists but never showed up in the walk is detached.
    let camera_world = walk
        .camera_world
        .ok_or(RenderError::NodeNotFound(camera_node))?;

    let (light_node, light_world) = match walk.lights.as_slice() {
        [] => return Err(RenderError::NoLight),
        [only] => *only,
        many => {
            return Err(RenderError::MultipleLights { count: many.len() });
        }
    };
    let light = scene
        .node(light_node)
        .and_then(|node| node.light())
        .copied()
        .ok_or(RenderError::NodeNotFound(light_node))?;

    let plan = FramePlan {
        camera_node,
        camera: CameraUniforms::new(
            camera_world.inverse(),
            camera.projection_matrix(),
            camera_world.w_axis.truncate(),
        ),
        light_node,
        light: LightUniforms::new(light_world.w_axis.truncate(), &light),
        draws: walk.draws,
    };
    tracing::debug!(
        draws = plan.draws.len(),
        primitives = plan.primitive_count(),
        "frame planned"
    );
    Ok(plan)
}

fn visit(walk: &mut Walk<'_>, id: NodeId, parent_world: Mat4) -> Result<(), RenderError> {
    if !walk.visited.insert(id) {
        return Err(RenderError::CycleDetected(id));
    }
    let node = walk.scene.node(id).ok_or(RenderError::NodeNotFound(id))?;
    let world = parent_world * node.local_matrix();

    if id == walk.camera_node {
        walk.camera_world = Some(world);
    }
    if node.light().is_some() {
        walk.lights.push((id, world));
    }
    if let Some(model) = node.model() {
        let mut primitives = Vec::with_capacity(model.primitives.len());
        for primitive in &model.primitives {
            let mesh = walk
                .assets
                .get_mesh(primitive.mesh)
                .ok_or(RenderError::MeshMissing(primitive.mesh))?;
            let material = walk
                .assets
                .get_material(primitive.material)
                .ok_or(RenderError::MaterialMissing(primitive.material))?;
            primitives.push(DrawPrimitive {
                mesh: primitive.mesh,
                material: primitive.material,
                uniforms: MaterialUniforms {
                    base_factor: material.base_factor,
                },
                index_count: mesh.index_count(),
            });
        }
        walk.draws.push(DrawNode {
            node: id,
            uniforms: ModelUniforms::from_world(world),
            primitives,
        });
    }

    for &child in node.children() {
        visit(walk, child, world)?;
    }
    Ok(())
}
