//! Frame execution against a wgpu device.

use lantern_assets::{AssetStore, Image};
use lantern_render::{FramePlan, RenderError, plan_frame};
use lantern_scene::{NodeId, Scene};

use crate::cache::GpuCache;
use crate::pipeline::{DEPTH_FORMAT, ScenePipeline};

/// Fixed background color the pass clears to.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 1.0,
};

/// Where a frame lands: a color view plus its current pixel size.
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

struct DepthTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&Default::default()),
            width,
            height,
        }
    }

    fn matches(&self, width: u32, height: u32) -> bool {
        depth_matches(self.width, self.height, width, height)
    }
}

fn depth_matches(have_width: u32, have_height: u32, want_width: u32, want_height: u32) -> bool {
    have_width == want_width.max(1) && have_height == want_height.max(1)
}

/// Uploaded six-layer environment image set.
pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Draws scenes into a caller-provided target.
///
/// Owns the pipeline, the GPU resource cache, and the depth target. One
/// renderer per surface format; the embedding owns device, queue, and
/// surface.
pub struct SceneRenderer {
    pipeline: ScenePipeline,
    cache: GpuCache,
    depth: DepthTarget,
    environment: Option<EnvironmentMap>,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let pipeline = ScenePipeline::new(device, surface_format);
        let depth = DepthTarget::new(device, width, height);
        tracing::info!(?surface_format, width, height, "scene renderer ready");
        Self {
            pipeline,
            cache: GpuCache::new(),
            depth,
            environment: None,
        }
    }

    /// Draw one frame of `scene` viewed through `camera_node` into `target`.
    ///
    /// Planning runs first; any error aborts before GPU work starts, and
    /// nothing reaches the queue on failure. On success the whole frame is
    /// submitted at once. Uniforms are written in plan order: camera, light,
    /// then draw nodes in pre-order.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        assets: &AssetStore,
        camera_node: NodeId,
        target: &RenderTarget<'_>,
    ) -> Result<(), RenderError> {
        let plan = plan_frame(scene, assets, camera_node)?;

        if !self.depth.matches(target.width, target.height) {
            tracing::debug!(
                width = target.width,
                height = target.height,
                "recreating depth target"
            );
            self.depth = DepthTarget::new(device, target.width, target.height);
        }

        self.prepare(device, queue, assets, &plan)?;
        self.record(device, queue, assets, &plan, target)
    }

    /// Resolve and upload everything the plan touches, ahead of the pass.
    fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        plan: &FramePlan,
    ) -> Result<(), RenderError> {
        let camera =
            self.cache
                .prepare_camera(device, &self.pipeline.camera_layout, plan.camera_node);
        queue.write_buffer(&camera.buffer, 0, bytemuck::bytes_of(&plan.camera));

        let light = self
            .cache
            .prepare_light(device, &self.pipeline.light_layout, plan.light_node);
        queue.write_buffer(&light.buffer, 0, bytemuck::bytes_of(&plan.light));

        for draw in &plan.draws {
            let node = self
                .cache
                .prepare_node(device, &self.pipeline.node_layout, draw.node);
            queue.write_buffer(&node.buffer, 0, bytemuck::bytes_of(&draw.uniforms));
            for primitive in &draw.primitives {
                self.cache.prepare_mesh(device, assets, primitive.mesh)?;
                self.cache.prepare_material(
                    device,
                    queue,
                    assets,
                    &self.pipeline.material_layout,
                    primitive.material,
                )?;
            }
        }
        Ok(())
    }

    /// Record and submit the pass. Every cache lookup here hits entries the
    /// prepare phase already created.
    fn record(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        plan: &FramePlan,
        target: &RenderTarget<'_>,
    ) -> Result<(), RenderError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);

            let camera =
                self.cache
                    .prepare_camera(device, &self.pipeline.camera_layout, plan.camera_node);
            pass.set_bind_group(0, &camera.bind_group, &[]);
            let light =
                self.cache
                    .prepare_light(device, &self.pipeline.light_layout, plan.light_node);
            pass.set_bind_group(3, &light.bind_group, &[]);

            for draw in &plan.draws {
                let node = self
                    .cache
                    .prepare_node(device, &self.pipeline.node_layout, draw.node);
                pass.set_bind_group(1, &node.bind_group, &[]);
                for primitive in &draw.primitives {
                    let material = self.cache.prepare_material(
                        device,
                        queue,
                        assets,
                        &self.pipeline.material_layout,
                        primitive.material,
                    )?;
                    pass.set_bind_group(2, &material.bind_group, &[]);
                    let mesh = self.cache.prepare_mesh(device, assets, primitive.mesh)?;
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Upload a six-layer environment image set, replacing any prior one.
    ///
    /// Kept on the renderer for passes that sample it; the fixed scene
    /// pipeline does not.
    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        images: [&Image; 6],
    ) -> Result<(), RenderError> {
        let (width, height) = validate_environment(&images)?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, image) in images.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &image.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("environment_view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        tracing::info!(width, height, "environment uploaded");
        self.environment = Some(EnvironmentMap {
            texture,
            view,
            sampler,
        });
        Ok(())
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }
}

/// Check that all six layers agree on dimensions and carry full pixel rows.
fn validate_environment(images: &[&Image; 6]) -> Result<(u32, u32), RenderError> {
    let width = images[0].width;
    let height = images[0].height;
    for (index, image) in images.iter().enumerate() {
        if image.width == 0 || image.height == 0 {
            return Err(RenderError::EnvironmentImage {
                index,
                reason: "image has zero extent".into(),
            });
        }
        if image.width != width || image.height != height {
            return Err(RenderError::EnvironmentImage {
                index,
                reason: format!(
                    "size {}x{} does not match layer 0 ({}x{})",
                    image.width, image.height, width, height
                ),
            });
        }
        if image.pixels.len() != image.expected_len() {
            return Err(RenderError::EnvironmentImage {
                index,
                reason: format!(
                    "pixel data is {} bytes, expected {}",
                    image.pixels.len(),
                    image.expected_len()
                ),
            });
        }
    }
    Ok((width, height))
}
