//! Identity-keyed GPU resource cache.
//!
//! Every node and asset a frame references gets its GPU state lazily, the
//! first time a `prepare_*` call sees its handle, and keeps it for the
//! cache's lifetime. Keys are handles, not content, so two registrations of
//! bit-identical data own distinct GPU resources. Nothing is ever evicted.

use std::collections::BTreeMap;

use wgpu::util::DeviceExt;

use lantern_assets::{
    AddressMode, AssetStore, FilterMode, ImageId, MaterialId, MeshId, SamplerId,
};
use lantern_render::{CameraUniforms, LightUniforms, MaterialUniforms, ModelUniforms, RenderError};
use lantern_scene::NodeId;

/// A uniform buffer paired with the bind group that exposes it at binding 0.
pub struct UniformGpu {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Uploaded vertex and index buffers for one mesh.
pub struct MeshGpu {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Uploaded texture for one image. Pixels go up once, at creation.
pub struct ImageGpu {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub struct SamplerGpu {
    pub sampler: wgpu::Sampler,
}

/// Material bind group: factor uniform, base texture view, sampler.
pub struct MaterialGpu {
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Per-renderer cache of everything the scene pass binds.
///
/// Camera, node, and light entries are allocated empty and rewritten every
/// frame. Mesh, image, and material entries are uploaded once; assets are
/// immutable after registration, so there is nothing to refresh.
#[derive(Default)]
pub struct GpuCache {
    cameras: BTreeMap<NodeId, UniformGpu>,
    nodes: BTreeMap<NodeId, UniformGpu>,
    lights: BTreeMap<NodeId, UniformGpu>,
    meshes: BTreeMap<MeshId, MeshGpu>,
    images: BTreeMap<ImageId, ImageGpu>,
    samplers: BTreeMap<SamplerId, SamplerGpu>,
    materials: BTreeMap<MaterialId, MaterialGpu>,
}

impl GpuCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare_camera(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        node: NodeId,
    ) -> &UniformGpu {
        self.cameras.entry(node).or_insert_with(|| {
            tracing::debug!(?node, "allocating camera uniforms");
            uniform_entry(
                device,
                layout,
                "camera_uniforms",
                std::mem::size_of::<CameraUniforms>() as u64,
            )
        })
    }

    pub fn prepare_node(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        node: NodeId,
    ) -> &UniformGpu {
        self.nodes.entry(node).or_insert_with(|| {
            tracing::debug!(?node, "allocating node uniforms");
            uniform_entry(
                device,
                layout,
                "node_uniforms",
                std::mem::size_of::<ModelUniforms>() as u64,
            )
        })
    }

    pub fn prepare_light(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        node: NodeId,
    ) -> &UniformGpu {
        self.lights.entry(node).or_insert_with(|| {
            tracing::debug!(?node, "allocating light uniforms");
            uniform_entry(
                device,
                layout,
                "light_uniforms",
                std::mem::size_of::<LightUniforms>() as u64,
            )
        })
    }

    /// Upload a mesh on first sight and hand back its buffers.
    pub fn prepare_mesh(
        &mut self,
        device: &wgpu::Device,
        assets: &AssetStore,
        id: MeshId,
    ) -> Result<&MeshGpu, RenderError> {
        if !self.meshes.contains_key(&id) {
            let mesh = assets.get_mesh(id).ok_or(RenderError::MeshMissing(id))?;
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            tracing::debug!(
                ?id,
                vertices = mesh.vertices.len(),
                indices = mesh.indices.len(),
                "uploading mesh"
            );
            self.meshes.insert(
                id,
                MeshGpu {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.index_count(),
                },
            );
        }
        self.meshes.get(&id).ok_or(RenderError::MeshMissing(id))
    }

    /// Upload an image on first sight and hand back its texture.
    pub fn prepare_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        id: ImageId,
    ) -> Result<&ImageGpu, RenderError> {
        if !self.images.contains_key(&id) {
            let image = assets.get_image(id).ok_or(RenderError::ImageMissing(id))?;
            let size = wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            };
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("image_texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &image.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width),
                    rows_per_image: Some(image.height),
                },
                size,
            );
            let view = texture.create_view(&Default::default());
            tracing::debug!(?id, width = image.width, height = image.height, "uploading image");
            self.images.insert(id, ImageGpu { texture, view });
        }
        self.images.get(&id).ok_or(RenderError::ImageMissing(id))
    }

    pub fn prepare_sampler(
        &mut self,
        device: &wgpu::Device,
        assets: &AssetStore,
        id: SamplerId,
    ) -> Result<&SamplerGpu, RenderError> {
        if !self.samplers.contains_key(&id) {
            let desc = assets
                .get_sampler(id)
                .ok_or(RenderError::SamplerMissing(id))?;
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("image_sampler"),
                address_mode_u: address_mode(desc.address_mode_u),
                address_mode_v: address_mode(desc.address_mode_v),
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter_mode(desc.mag_filter),
                min_filter: filter_mode(desc.min_filter),
                ..Default::default()
            });
            self.samplers.insert(id, SamplerGpu { sampler });
        }
        self.samplers.get(&id).ok_or(RenderError::SamplerMissing(id))
    }

    /// Build a material's bind group on first sight, pulling its image and
    /// sampler through the cache first.
    pub fn prepare_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        layout: &wgpu::BindGroupLayout,
        id: MaterialId,
    ) -> Result<&MaterialGpu, RenderError> {
        if !self.materials.contains_key(&id) {
            let material = assets
                .get_material(id)
                .copied()
                .ok_or(RenderError::MaterialMissing(id))?;
            let texture = material.base_texture;
            self.prepare_image(device, queue, assets, texture.image)?;
            self.prepare_sampler(device, assets, texture.sampler)?;

            let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material_uniforms"),
                contents: bytemuck::bytes_of(&MaterialUniforms {
                    base_factor: material.base_factor,
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let image = self
                .images
                .get(&texture.image)
                .ok_or(RenderError::ImageMissing(texture.image))?;
            let sampler = self
                .samplers
                .get(&texture.sampler)
                .ok_or(RenderError::SamplerMissing(texture.sampler))?;
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("material_bind_group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&image.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&sampler.sampler),
                    },
                ],
            });
            tracing::debug!(?id, "building material bind group");
            self.materials.insert(id, MaterialGpu { uniform, bind_group });
        }
        self.materials
            .get(&id)
            .ok_or(RenderError::MaterialMissing(id))
    }

    /// Total cached entries across all kinds.
    pub fn len(&self) -> usize {
        self.cameras.len()
            + self.nodes.len()
            + self.lights.len()
            + self.meshes.len()
            + self.images.len()
            + self.samplers.len()
            + self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn uniform_entry(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    size: u64,
) -> UniformGpu {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    UniformGpu { buffer, bind_group }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}
