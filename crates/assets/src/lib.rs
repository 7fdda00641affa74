//! CPU-side render assets: meshes, images, samplers, materials.
//!
//! The [`AssetStore`] hands out a fresh handle for every registration, even
//! when two registrations carry bit-identical data. Downstream GPU caches key
//! off these handles, so identity, not content, decides what gets shared.
//!
//! # Invariants
//! - Assets are immutable once registered; the store never mutates or evicts.
//! - Handles are never reused, so a handle stays valid for the store's lifetime.
//! - Iteration order over any asset kind is deterministic (`BTreeMap`).

pub mod procedural;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

/// Handle to a registered [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

/// Handle to a registered [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub u64);

/// Handle to a registered [`SamplerDesc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SamplerId(pub u64);

/// Handle to a registered [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

/// Errors from asset registration.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("mesh index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("image pixel data is {actual} bytes, expected {expected} for {width}x{height} rgba8")]
    ImageSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("material references unregistered image {0:?}")]
    ImageMissing(ImageId),
    #[error("material references unregistered sampler {0:?}")]
    SamplerMissing(SamplerId),
}

/// One interleaved vertex: position, texture coordinates, normal.
///
/// The field order is the wire layout the vertex stage consumes: position at
/// byte 0, texcoord at 12, normal at 20, 32 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

/// Indexed triangle geometry. Indices are `u32` throughout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Tightly packed RGBA8 pixel data, rows top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Byte length the pixel buffer must have for these dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressMode {
    ClampToEdge,
    #[default]
    Repeat,
    MirrorRepeat,
}

/// How a texture is filtered and wrapped when sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
}

impl SamplerDesc {
    /// Linear filtering with clamped addressing, for textures that must not
    /// bleed across their edges.
    pub fn clamped() -> Self {
        Self {
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            ..Self::default()
        }
    }
}

/// An image paired with the sampler it should be read through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    pub image: ImageId,
    pub sampler: SamplerId,
}

/// Surface description: a base color factor multiplied over a base texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub base_factor: [f32; 4],
    pub base_texture: TextureRef,
}

impl Material {
    /// Material with a white base factor, showing the texture unmodified.
    pub fn new(base_texture: TextureRef) -> Self {
        Self {
            base_factor: [1.0, 1.0, 1.0, 1.0],
            base_texture,
        }
    }

    pub fn with_factor(mut self, base_factor: [f32; 4]) -> Self {
        self.base_factor = base_factor;
        self
    }
}

/// Owns every registered asset and allocates their handles.
///
/// Registration never deduplicates. Re-registering the same data is how a
/// caller asks for an independent copy with its own downstream GPU state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    meshes: BTreeMap<MeshId, Mesh>,
    images: BTreeMap<ImageId, Image>,
    samplers: BTreeMap<SamplerId, SamplerDesc>,
    materials: BTreeMap<MaterialId, Material>,
    next_id: u64,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register a mesh, checking that every index lands inside the vertex list.
    pub fn register_mesh(&mut self, mesh: Mesh) -> Result<MeshId, AssetError> {
        let vertex_count = mesh.vertices.len();
        if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AssetError::IndexOutOfBounds {
                index,
                vertex_count,
            });
        }
        let id = MeshId(self.alloc());
        tracing::debug!(
            ?id,
            vertices = vertex_count,
            indices = mesh.indices.len(),
            "registered mesh"
        );
        self.meshes.insert(id, mesh);
        Ok(id)
    }

    /// Register an image, checking the pixel buffer matches its dimensions.
    pub fn register_image(&mut self, image: Image) -> Result<ImageId, AssetError> {
        let expected = image.expected_len();
        if image.pixels.len() != expected {
            return Err(AssetError::ImageSize {
                width: image.width,
                height: image.height,
                expected,
                actual: image.pixels.len(),
            });
        }
        let id = ImageId(self.alloc());
        tracing::debug!(
            ?id,
            width = image.width,
            height = image.height,
            "registered image"
        );
        self.images.insert(id, image);
        Ok(id)
    }

    /// Register a sampler description.
    pub fn register_sampler(&mut self, sampler: SamplerDesc) -> SamplerId {
        let id = SamplerId(self.alloc());
        self.samplers.insert(id, sampler);
        id
    }

    /// Register a material, checking its texture references resolve.
    pub fn register_material(&mut self, material: Material) -> Result<MaterialId, AssetError> {
        if !self.images.contains_key(&material.base_texture.image) {
            return Err(AssetError::ImageMissing(material.base_texture.image));
        }
        if !self.samplers.contains_key(&material.base_texture.sampler) {
            return Err(AssetError::SamplerMissing(material.base_texture.sampler));
        }
        let id = MaterialId(self.alloc());
        self.materials.insert(id, material);
        Ok(id)
    }

    /// Get a mesh by handle.
    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    /// Get an image by handle.
    pub fn get_image(&self, id: ImageId) -> Option<&Image> {
        self.images.get(&id)
    }

    /// Get a sampler description by handle.
    pub fn get_sampler(&self, id: SamplerId) -> Option<&SamplerDesc> {
        self.samplers.get(&id)
    }

    /// Get a material by handle.
    pub fn get_material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Total number of registered assets across all kinds.
    pub fn len(&self) -> usize {
        self.mesh_count() + self.image_count() + self.sampler_count() + self.material_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn crate_info() -> &'static str {
    "lantern-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedural::{solid_image, unit_cube};

    fn sample_texture(store: &mut AssetStore) -> TextureRef {
        let image = store
            .register_image(solid_image([255, 255, 255, 255]))
            .unwrap();
        let sampler = store.register_sampler(SamplerDesc::default());
        TextureRef { image, sampler }
    }

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("lantern-assets"));
    }

    #[test]
    fn identical_registrations_get_distinct_handles() {
        let mut store = AssetStore::new();
        let texture = sample_texture(&mut store);
        let first = store.register_material(Material::new(texture)).unwrap();
        let second = store.register_material(Material::new(texture)).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.get_material(first), store.get_material(second));

        let a = store.register_mesh(unit_cube()).unwrap();
        let b = store.register_mesh(unit_cube()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.mesh_count(), 2);
    }

    #[test]
    fn handles_stay_valid_as_the_store_grows() {
        let mut store = AssetStore::new();
        let first = store.register_mesh(unit_cube()).unwrap();
        for _ in 0..16 {
            store.register_mesh(unit_cube()).unwrap();
        }
        assert!(store.get_mesh(first).is_some());
        assert_eq!(store.mesh_count(), 17);
    }

    #[test]
    fn mesh_with_out_of_bounds_index_is_rejected() {
        let mut store = AssetStore::new();
        let mesh = Mesh::new(
            vec![Vertex {
                position: [0.0; 3],
                texcoord: [0.0; 2],
                normal: [0.0, 1.0, 0.0],
            }],
            vec![0, 1, 2],
        );
        let err = store.register_mesh(mesh).unwrap_err();
        assert!(matches!(err, AssetError::IndexOutOfBounds { index: 1, .. }));
    }

    #[test]
    fn image_with_short_pixel_buffer_is_rejected() {
        let mut store = AssetStore::new();
        let err = store.register_image(Image::new(2, 2, vec![0; 12])).unwrap_err();
        assert!(matches!(
            err,
            AssetError::ImageSize {
                expected: 16,
                actual: 12,
                ..
            }
        ));
    }

    #[test]
    fn material_with_dangling_references_is_rejected() {
        let mut store = AssetStore::new();
        let texture = sample_texture(&mut store);

        let bad_image = Material::new(TextureRef {
            image: ImageId(999),
            sampler: texture.sampler,
        });
        assert!(matches!(
            store.register_material(bad_image),
            Err(AssetError::ImageMissing(ImageId(999)))
        ));

        let bad_sampler = Material::new(TextureRef {
            image: texture.image,
            sampler: SamplerId(999),
        });
        assert!(matches!(
            store.register_material(bad_sampler),
            Err(AssetError::SamplerMissing(SamplerId(999)))
        ));
    }

    #[test]
    fn lookup_of_unknown_handle_returns_none() {
        let store = AssetStore::new();
        assert!(store.get_mesh(MeshId(0)).is_none());
        assert!(store.get_material(MaterialId(7)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn store_counts_track_registrations() {
        let mut store = AssetStore::new();
        let texture = sample_texture(&mut store);
        store.register_mesh(unit_cube()).unwrap();
        store.register_material(Material::new(texture)).unwrap();
        assert_eq!(store.mesh_count(), 1);
        assert_eq!(store.image_count(), 1);
        assert_eq!(store.sampler_count(), 1);
        assert_eq!(store.material_count(), 1);
        assert_eq!(store.len(), 4);
    }
}
