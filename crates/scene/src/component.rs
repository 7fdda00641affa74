//! Component types nodes can carry: transforms, cameras, lights, models.

use glam::{Mat4, Quat, Vec3};
use lantern_assets::{MaterialId, MeshId};
use serde::{Deserialize, Serialize};

/// Local translation, rotation and scale of a node.
///
/// `rotation` is kept unit-length by every constructor and mutator here.
/// Callers writing the field directly owe the same guarantee, otherwise the
/// composed matrix picks up shear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation: rotation.normalize(),
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Transform placed at `eye`, oriented so -Z points at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let rotation = Quat::from_mat4(&Mat4::look_at_rh(eye, target, up).inverse());
        Self {
            translation: eye,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Composed local matrix, scale first, then rotation, then translation.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Projection shape of a camera, aspect excluded.
///
/// Aspect lives on [`Camera`] so a window resize touches one field and the
/// projection definition stays put.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Perspective { fovy: f32, near: f32, far: f32 },
    Orthographic { half_height: f32, near: f32, far: f32 },
}

/// Camera component. The node's world matrix decides where it sits; this only
/// decides how it projects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub projection: Projection,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60f32.to_radians(), 1.0, 0.1, 1000.0)
    }
}

impl Camera {
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective { fovy, near, far },
            aspect,
        }
    }

    pub fn orthographic(half_height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic {
                half_height,
                near,
                far,
            },
            aspect,
        }
    }

    /// Projection matrix with a 0..1 depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fovy, near, far } => {
                Mat4::perspective_rh(fovy, self.aspect, near, far)
            }
            Projection::Orthographic {
                half_height,
                near,
                far,
            } => {
                let half_width = half_height * self.aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    near,
                    far,
                )
            }
        }
    }
}

/// Point light component. Position comes from the owning node's world matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub ambient: f32,
    pub shininess: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            shininess: 100.0,
        }
    }
}

impl Light {
    /// Both terms are clamped at zero; negatives have no physical reading.
    pub fn new(ambient: f32, shininess: f32) -> Self {
        Self {
            ambient: ambient.max(0.0),
            shininess: shininess.max(0.0),
        }
    }
}

/// One drawable piece: a mesh paired with the material to shade it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    pub mesh: MeshId,
    pub material: MaterialId,
}

/// Model component: the primitives drawn at the owning node's world matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub primitives: Vec<Primitive>,
}

impl Model {
    pub fn single(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            primitives: vec![Primitive { mesh, material }],
        }
    }
}

/// Everything a node can carry. Closed on purpose; renderers match on this
/// exhaustively and a new component kind must be a deliberate, visible change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Transform(Transform),
    Camera(Camera),
    Light(Light),
    Model(Model),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "matrices differ: {a:?} vs {b:?}");
        }
    }

    #[test]
    fn default_transform_is_identity() {
        assert_mat4_eq(Transform::default().local_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn local_matrix_applies_scale_then_rotation_then_translation() {
        let transform = Transform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        // (1,0,0) scales to (2,0,0), rotates to (0,2,0), translates to (1,2,0)
        let out = transform.local_matrix().transform_point3(Vec3::X);
        assert!((out - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_mutators_normalize() {
        let mut transform = Transform::default();
        transform.set_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0));
        assert!((transform.rotation.length() - 1.0).abs() < 1e-6);

        let built = Transform::from_rotation(Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
        assert!((built.rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn looking_at_inverts_to_a_view_matrix() {
        let eye = Vec3::new(3.0, 2.0, 5.0);
        let target = Vec3::new(0.0, 0.5, 0.0);
        let transform = Transform::looking_at(eye, target, Vec3::Y);
        assert_mat4_eq(
            transform.local_matrix().inverse(),
            Mat4::look_at_rh(eye, target, Vec3::Y),
        );
    }

    #[test]
    fn perspective_projection_maps_near_and_far_to_unit_depth() {
        let camera = Camera::perspective(60f32.to_radians(), 1.5, 0.1, 100.0);
        let projection = camera.projection_matrix();
        let near = projection.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = projection.project_point3(Vec3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn orthographic_projection_respects_aspect() {
        let camera = Camera::orthographic(2.0, 2.0, 0.1, 10.0);
        let projection = camera.projection_matrix();
        // x edge sits at half_height * aspect, y edge at half_height
        let corner = projection.project_point3(Vec3::new(4.0, 2.0, -1.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn light_terms_clamp_at_zero() {
        let light = Light::new(-0.5, -10.0);
        assert_eq!(light.ambient, 0.0);
        assert_eq!(light.shininess, 0.0);

        let default = Light::default();
        assert_eq!(default.ambient, 0.0);
        assert_eq!(default.shininess, 100.0);
    }

    #[test]
    fn model_single_wraps_one_primitive() {
        let model = Model::single(MeshId(1), MaterialId(2));
        assert_eq!(model.primitives.len(), 1);
        assert_eq!(model.primitives[0].mesh, MeshId(1));
        assert_eq!(model.primitives[0].material, MaterialId(2));
    }
}
