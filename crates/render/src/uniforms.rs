//! Uniform block layouts shared between the planner and the shaders.
//!
//! Each struct is `repr(C)` and padded by hand to the exact size and offsets
//! the WGSL side declares. Sizes are load-bearing: backends allocate buffers
//! from `size_of` and upload with `bytemuck::bytes_of`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use lantern_scene::Light;

/// Camera block, 144 bytes: view at 0, projection at 64, world position at 128.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct CameraUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniforms {
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            position: position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Per-node block, 128 bytes: model matrix at 0, normal matrix at 64.
///
/// The normal matrix is the inverse-transpose of the model matrix's upper
/// 3x3, widened back to 4x4 so both halves share one layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniforms {
    pub fn from_world(world: Mat4) -> Self {
        let normal = Mat4::from_mat3(Mat3::from_mat4(world).inverse().transpose());
        Self {
            model: world.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
        }
    }
}

/// Material block, 16 bytes: the base color factor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct MaterialUniforms {
    pub base_factor: [f32; 4],
}

/// Light block, 32 bytes: world position at 0, ambient at 12 packed into the
/// position's fourth lane, shininess at 16, padded out to 32.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct LightUniforms {
    pub position: [f32; 3],
    pub ambient: f32,
    pub shininess: f32,
    pub _pad: [f32; 3],
}

impl LightUniforms {
    pub fn new(position: Vec3, light: &Light) -> Self {
        Self {
            position: position.to_array(),
            ambient: light.ambient,
            shininess: light.shininess,
            _pad: [0.0; 3],
        }
    }
}
