/// WGSL shader for the forward scene pass: textured, Blinn-Phong shaded
/// meshes.
///
/// Bind groups, in set order: camera (0), per-node matrices (1), material
/// with base texture and sampler (2), the single scene light (3). The uniform
/// struct layouts match the blocks in `lantern-render` byte for byte.
pub const SCENE_SHADER: &str = r#"
struct CameraUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    position: vec3<f32>,
}

struct ModelUniforms {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
}

struct MaterialUniforms {
    base_factor: vec4<f32>,
}

struct LightUniforms {
    position: vec3<f32>,
    ambient: f32,
    shininess: f32,
}

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;

@group(1) @binding(0)
var<uniform> node: ModelUniforms;

@group(2) @binding(0)
var<uniform> material: MaterialUniforms;
@group(2) @binding(1)
var base_texture: texture_2d<f32>;
@group(2) @binding(2)
var base_sampler: sampler;

@group(3) @binding(0)
var<uniform> light: LightUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
    @location(2) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) texcoord: vec2<f32>,
    @location(2) world_normal: vec3<f32>,
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_position = node.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = camera.projection * camera.view * world_position;
    out.world_position = world_position.xyz;
    out.texcoord = vertex.texcoord;
    out.world_normal = (node.normal * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(base_texture, base_sampler, in.texcoord) * material.base_factor;

    let n = normalize(in.world_normal);
    let l = normalize(light.position - in.world_position);
    let v = normalize(camera.position - in.world_position);
    let h = normalize(l + v);

    let diffuse = max(dot(n, l), 0.0);
    let specular = pow(max(dot(n, h), 0.0), light.shininess);

    let color = base.rgb * (light.ambient + diffuse) + vec3<f32>(specular);
    return vec4<f32>(color, base.a);
}
"#;
