use anyhow::Result;
use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

use lantern_assets::procedural::{plane, solid_image, unit_cube};
use lantern_assets::{AssetStore, Material, SamplerDesc, TextureRef};
use lantern_render::plan_frame;
use lantern_scene::{Animation, Camera, Component, Light, Model, NodeId, Scene, Transform};

#[derive(Parser)]
#[command(name = "lantern-cli", about = "Inspect lantern frame plans without a GPU")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and demo stage stats
    Info,
    /// Build the demo stage and print its frame plan
    Plan {
        /// Animation time in seconds to sample the stage at
        #[arg(short, long, default_value = "0.0")]
        time: f32,
        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the demo stage's frame preconditions
    Validate {
        /// Remove the light before validating
        #[arg(long)]
        drop_light: bool,
        /// Add a second light before validating
        #[arg(long)]
        extra_light: bool,
    },
}

struct Stage {
    scene: Scene,
    assets: AssetStore,
    camera: NodeId,
    light: NodeId,
    animation: Animation,
}

/// Ground plane, a pivoted cube with a small orbiting child, one light, one
/// camera, and a straight-line rise on the cube.
fn demo_stage() -> Result<Stage> {
    let mut assets = AssetStore::new();
    let sampler = assets.register_sampler(SamplerDesc::default());
    let white = assets.register_image(solid_image([255, 255, 255, 255]))?;
    let gray = assets.register_material(
        Material::new(TextureRef {
            image: white,
            sampler,
        })
        .with_factor([0.6, 0.6, 0.6, 1.0]),
    )?;
    let amber = assets.register_material(
        Material::new(TextureRef {
            image: white,
            sampler,
        })
        .with_factor([0.9, 0.6, 0.2, 1.0]),
    )?;
    let ground_mesh = assets.register_mesh(plane(6.0))?;
    let cube_mesh = assets.register_mesh(unit_cube())?;

    let mut scene = Scene::new();
    let root = scene.root();

    let ground = scene.spawn_with([Component::Model(Model::single(ground_mesh, gray))]);
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
        Component::Model(Model::single(cube_mesh, gray)),
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

    let animation = Animation::linear_move(cube, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), 4.0)?;
    tracing::debug!(nodes = scene.node_count(), assets = assets.len(), "demo stage built");

    Ok(Stage {
        scene,
        assets,
        camera,
        light,
        animation,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("lantern-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene:  {}", lantern_scene::crate_info());
            println!("assets: {}", lantern_assets::crate_info());
            println!("render: {}", lantern_render::crate_info());
            let stage = demo_stage()?;
            println!(
                "demo stage: {} nodes, {} assets",
                stage.scene.node_count(),
                stage.assets.len()
            );
        }
        Commands::Plan { time, json } => {
            let mut stage = demo_stage()?;
            stage.animation.apply(&mut stage.scene, time);
            let plan = plan_frame(&stage.scene, &stage.assets, stage.camera)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("Frame plan at t={time:.2}");
                println!(
                    "  camera: {:?} at {:?}",
                    plan.camera_node, plan.camera.position
                );
                println!(
                    "  light:  {:?} at {:?}, ambient {}, shininess {}",
                    plan.light_node, plan.light.position, plan.light.ambient, plan.light.shininess
                );
                println!(
                    "  draws:  {} nodes, {} primitives, pre-order:",
                    plan.draws.len(),
                    plan.primitive_count()
                );
                for draw in &plan.draws {
                    let model = draw.uniforms.model;
                    println!(
                        "    {:?}: {} primitive(s) at [{:.2}, {:.2}, {:.2}]",
                        draw.node,
                        draw.primitives.len(),
                        model[3][0],
                        model[3][1],
                        model[3][2],
                    );
                }
            }
        }
        Commands::Validate {
            drop_light,
            extra_light,
        } => {
            let mut stage = demo_stage()?;
            if drop_light {
                stage.scene.remove_subtree(stage.light)?;
                println!("dropped the light");
            }
            if extra_light {
                let extra = stage.scene.spawn_with([Component::Light(Light::default())]);
                let root = stage.scene.root();
                stage.scene.attach(root, extra)?;
                println!("added a second light");
            }

            match plan_frame(&stage.scene, &stage.assets, stage.camera) {
                Ok(plan) => {
                    println!(
                        "scene OK: {} draw nodes, {} primitives",
                        plan.draws.len(),
                        plan.primitive_count()
                    );
                }
                Err(e) => {
                    anyhow::bail!("scene invalid: {e}");
                }
            }
        }
    }

    Ok(())
}
