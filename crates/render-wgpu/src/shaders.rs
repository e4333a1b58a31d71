//! WGSL programs for the builtin materials.
//!
//! Every program uses the same bind group layout: group 0 holds the camera,
//! group 1 the material uniforms (plus texture and sampler for video).
//! Vertex entry points are `vs_main`, fragment entry points `fs_main`.

use backdrop_scene::{MaterialKind, MaterialRegistry, ShaderProgram};

pub const VIDEO_VERTEX: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VideoUniforms {
    model: mat4x4<f32>,
    resolution: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: VideoUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * material.model * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}
"#;

pub const VIDEO_FRAGMENT: &str = r#"
struct VideoUniforms {
    model: mat4x4<f32>,
    resolution: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: VideoUniforms;
@group(1) @binding(1)
var video_texture: texture_2d<f32>;
@group(1) @binding(2)
var video_sampler: sampler;

struct FragmentInput {
    @location(0) uv: vec2<f32>,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    // resolution.zw holds the cover-fit factors: crop the overflowing axis.
    let uv = (in.uv - vec2<f32>(0.5)) * material.resolution.zw + vec2<f32>(0.5);
    let color = textureSample(video_texture, video_sampler, uv);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

pub const SQUARES_VERTEX: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct SquaresUniforms {
    model: mat4x4<f32>,
    mouse: vec3<f32>,
    time: f32,
    size: vec2<f32>,
    _pad: vec2<f32>,
};

@group(1) @binding(0)
var<uniform> material: SquaresUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct InstanceInput {
    @location(2) offset: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) glow: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let center = (material.model * vec4<f32>(instance.offset, 1.0)).xyz;
    let glow = 1.0 - smoothstep(0.0, 0.35, distance(center, material.mouse));
    let wave = 0.5 + 0.5 * sin(material.time * 1.5 + instance.offset.x * 4.0 + instance.offset.y * 3.0);
    let scale = mix(0.2, 0.9, max(glow, wave * 0.4));
    let local = vertex.position * vec3<f32>(material.size * scale, 1.0) + instance.offset;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * material.model * vec4<f32>(local, 1.0);
    out.uv = vertex.uv;
    out.glow = glow;
    return out;
}
"#;

pub const SQUARES_FRAGMENT: &str = r#"
struct FragmentInput {
    @location(0) uv: vec2<f32>,
    @location(1) glow: f32,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let edge = max(abs(in.uv.x - 0.5), abs(in.uv.y - 0.5));
    let border = smoothstep(0.42, 0.5, edge);
    let alpha = (0.06 + 0.5 * in.glow) * (1.0 - 0.5 * border);
    return vec4<f32>(vec3<f32>(1.0), alpha);
}
"#;

pub const PARTICLES_VERTEX: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct ParticlesUniforms {
    model: mat4x4<f32>,
    time: f32,
    point_size: f32,
    _pad: vec2<f32>,
};

@group(1) @binding(0)
var<uniform> material: ParticlesUniforms;

struct VertexInput {
    @location(0) corner: vec2<f32>,
};

struct InstanceInput {
    @location(1) position: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) twinkle: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let p = instance.position;
    let t = material.time;
    let drift = vec3<f32>(sin(t * 0.7 + p.y * 5.0), cos(t * 0.5 + p.x * 5.0), 0.0) * 0.004;
    let local = p + drift + vec3<f32>(vertex.corner * material.point_size, 0.0);

    var out: VertexOutput;
    out.clip_position = camera.view_proj * material.model * vec4<f32>(local, 1.0);
    out.corner = vertex.corner;
    out.twinkle = 0.5 + 0.5 * sin(t * 2.0 + (p.x + p.y) * 17.0);
    return out;
}
"#;

pub const PARTICLES_FRAGMENT: &str = r#"
struct FragmentInput {
    @location(0) corner: vec2<f32>,
    @location(1) twinkle: f32,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let d = length(in.corner);
    if d > 0.5 {
        discard;
    }
    let alpha = (1.0 - smoothstep(0.3, 0.5, d)) * (0.35 + 0.65 * in.twinkle);
    return vec4<f32>(vec3<f32>(1.0), alpha);
}
"#;

pub const LINES_VERTEX: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct LinesUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: LinesUniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.view_proj * material.model * vec4<f32>(position, 1.0);
}
"#;

pub const LINES_FRAGMENT: &str = r#"
struct LinesUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: LinesUniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return material.color;
}
"#;

/// Registry with the WGSL programs above for every material.
pub fn builtin_registry() -> MaterialRegistry {
    let mut registry = MaterialRegistry::new();
    registry
        .register(
            MaterialKind::Video,
            ShaderProgram::new(VIDEO_VERTEX, VIDEO_FRAGMENT),
        )
        .register(
            MaterialKind::Squares,
            ShaderProgram::new(SQUARES_VERTEX, SQUARES_FRAGMENT),
        )
        .register(
            MaterialKind::Particles,
            ShaderProgram::new(PARTICLES_VERTEX, PARTICLES_FRAGMENT),
        )
        .register(
            MaterialKind::Lines,
            ShaderProgram::new(LINES_VERTEX, LINES_FRAGMENT),
        );
    tracing::info!("builtin shader programs registered");
    registry
}
