use anyhow::Result;
use clap::Parser;
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use lantern_assets::procedural::{checker_image, plane, solid_image, unit_cube};
use lantern_assets::{AssetStore, Image, Material, SamplerDesc, TextureRef};
use lantern_render_wgpu::{RenderTarget, SceneRenderer};
use lantern_scene::{
    Animation, Camera, Channel, ChannelValues, Component, Interpolation, Light, Model, NodeId,
    Scene, Transform,
};

#[derive(Parser)]
#[command(name = "lantern-viewer", about = "Windowed viewer for the lantern demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial window width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value = "720")]
    height: u32,
}

/// Demo content: a checkered ground, a spinning cube with an orbiting child,
/// one light, one camera.
struct Stage {
    scene: Scene,
    assets: AssetStore,
    camera: NodeId,
    animation: Animation,
    cycle: f32,
}

fn build_stage() -> Result<Stage> {
    let mut assets = AssetStore::new();
    let sampler = assets.register_sampler(SamplerDesc::default());
    let checker = assets.register_image(checker_image(
        8,
        [200, 200, 200, 255],
        [90, 90, 90, 255],
    ))?;
    let white = assets.register_image(solid_image([255, 255, 255, 255]))?;
    let ground_material = assets.register_material(Material::new(TextureRef {
        image: checker,
        sampler,
    }))?;
    let amber = assets.register_material(
        Material::new(TextureRef {
            image: white,
            sampler,
        })
        .with_factor([0.9, 0.6, 0.2, 1.0]),
    )?;
    let teal = assets.register_material(
        Material::new(TextureRef {
            image: white,
            sampler,
        })
        .with_factor([0.2, 0.7, 0.7, 1.0]),
    )?;
    let ground_mesh = assets.register_mesh(plane(8.0))?;
    let cube_mesh = assets.register_mesh(unit_cube())?;

    let mut scene = Scene::new();
    let root = scene.root();

    let ground = scene.spawn_with([Component::Model(Model::single(
        ground_mesh,
        ground_material,
    ))]);
    scene.attach(root, ground)?;

    let pivot = scene.spawn_with([Component::Transform(Transform::from_translation(
        Vec3::new(0.0, 0.5, 0.0),
    ))]);
    scene.attach(root, pivot)?;

    let cube = scene.spawn_with([
        Component::Transform(Transform::default()),
        Component::Model(Model::single(cube_mesh, amber)),
    ]);
    scene.attach(pivot, cube)?;

    let moon = scene.spawn_with([
        Component::Transform(
            Transform::from_translation(Vec3::new(1.5, 0.5, 0.0)).with_scale(Vec3::splat(0.4)),
        ),
        Component::Model(Model::single(cube_mesh, teal)),
    ]);
    scene.attach(cube, moon)?;

    let light = scene.spawn_with([
        Component::Transform(Transform::from_translation(Vec3::new(3.0, 5.0, 2.0))),
        Component::Light(Light::new(0.15, 64.0)),
    ]);
    scene.attach(root, light)?;

    let camera = scene.spawn_with([
        Component::Transform(Transform::looking_at(
            Vec3::new(4.0, 3.0, 6.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
        )),
        Component::Camera(Camera::default()),
    ]);
    scene.attach(root, camera)?;

    let cycle = 8.0;
    // full turn as quarter-turn keys so each slerp span stays on the short arc
    let spin = Channel::new(
        pivot,
        vec![0.0, cycle * 0.25, cycle * 0.5, cycle * 0.75, cycle],
        ChannelValues::Rotations(vec![
            Quat::IDENTITY,
            Quat::from_rotation_y(FRAC_PI_2),
            Quat::from_rotation_y(PI),
            Quat::from_rotation_y(PI + FRAC_PI_2),
            Quat::from_rotation_y(2.0 * PI),
        ]),
        Interpolation::Linear,
    )?;
    let bob = Channel::new(
        cube,
        vec![0.0, cycle * 0.5, cycle],
        ChannelValues::Translations(vec![
            Vec3::ZERO,
            Vec3::new(0.0, 0.4, 0.0),
            Vec3::ZERO,
        ]),
        Interpolation::Linear,
    )?;

    Ok(Stage {
        scene,
        assets,
        camera,
        animation: Animation::new(vec![spin, bob]),
        cycle,
    })
}

fn sky_faces() -> [Image; 6] {
    [
        solid_image([140, 170, 215, 255]),
        solid_image([140, 170, 215, 255]),
        solid_image([190, 210, 235, 255]),
        solid_image([90, 110, 140, 255]),
        solid_image([140, 170, 215, 255]),
        solid_image([140, 170, 215, 255]),
    ]
}

struct ViewerApp {
    stage: Stage,
    start: Instant,
    initial_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
}

impl ViewerApp {
    fn new(stage: Stage, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            stage,
            start: Instant::now(),
            initial_size,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
        }
    }

    fn set_aspect(&mut self, width: u32, height: u32) {
        if let Some(camera) = self
            .stage
            .scene
            .node_mut(self.stage.camera)
            .and_then(|node| node.camera_mut())
        {
            camera.aspect = width as f32 / height.max(1) as f32;
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Lantern")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lantern_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.set_aspect(config.width, config.height);

        let mut renderer = SceneRenderer::new(&device, surface_format, config.width, config.height);
        let sky = sky_faces();
        renderer
            .set_environment(
                &device,
                &queue,
                [&sky[0], &sky[1], &sky[2], &sky[3], &sky[4], &sky[5]],
            )
            .expect("upload environment");

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                }
                if let Some(config) = &self.config {
                    let (width, height) = (config.width, config.height);
                    self.set_aspect(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                let t = self.start.elapsed().as_secs_f32() % self.stage.cycle;
                self.stage.animation.apply(&mut self.stage.scene, t);

                let (Some(surface), Some(device), Some(queue), Some(config), Some(renderer)) = (
                    &self.surface,
                    &self.device,
                    &self.queue,
                    &self.config,
                    &mut self.renderer,
                ) else {
                    return;
                };

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        surface.configure(device, config);
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };

                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                let target = RenderTarget {
                    view: &view,
                    width: config.width,
                    height: config.height,
                };
                if let Err(e) = renderer.render(
                    device,
                    queue,
                    &self.stage.scene,
                    &self.stage.assets,
                    self.stage.camera,
                    &target,
                ) {
                    tracing::error!("render failed: {e}");
                    event_loop.exit();
                    return;
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lantern-viewer starting");

    let stage = build_stage()?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(stage, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    Ok(())
}
