/// Lit, textured meshes (terrain and cube) for the off-screen pass.
///
/// Lighting happens in view space: normals go through the model-view matrix
/// with `w = 0`, the light direction is uploaded already in view space.
pub const SCENE_SHADER: &str = r#"
struct FrameUniforms {
    projection: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
};

struct DrawUniforms {
    model_view: mat4x4<f32>,
    alpha: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> draw: DrawUniforms;

@group(2) @binding(0)
var material_texture: texture_2d<f32>;
@group(2) @binding(1)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) view_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.projection * draw.model_view * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    out.view_normal = (draw.model_view * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(material_texture, material_sampler, in.uv);
    let n = normalize(in.view_normal);
    let diffuse = max(dot(n, normalize(-frame.light_dir.xyz)), 0.0);
    let rgb = (frame.ambient.rgb + diffuse * frame.light_color.rgb) * texel.rgb;
    return vec4<f32>(rgb, texel.a * draw.alpha.x);
}
"#;

/// Cube-map sky pinned to the far plane.
pub const SKYBOX_SHADER: &str = r#"
struct SkyUniforms {
    rotation_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> sky: SkyUniforms;
@group(0) @binding(1)
var sky_texture: texture_cube<f32>;
@group(0) @binding(2)
var sky_sampler: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> SkyOutput {
    var out: SkyOutput;
    let clip = sky.rotation_projection * vec4<f32>(position, 1.0);
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;

/// Full-screen sepia tone with a vignette, sampling the off-screen colour.
pub const POST_SHADER: &str = r#"
@group(0) @binding(0)
var scene_texture: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;

struct QuadOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
};

@vertex
fn vs_quad(@location(0) position: vec2<f32>, @location(1) texcoord: vec2<f32>) -> QuadOutput {
    var out: QuadOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.texcoord = texcoord;
    return out;
}

@fragment
fn fs_sepia_vignette(in: QuadOutput) -> @location(0) vec4<f32> {
    let c = textureSample(scene_texture, scene_sampler, in.texcoord);
    let sepia = vec3<f32>(
        dot(c.rgb, vec3<f32>(0.393, 0.769, 0.189)),
        dot(c.rgb, vec3<f32>(0.349, 0.686, 0.168)),
        dot(c.rgb, vec3<f32>(0.272, 0.534, 0.131)),
    );
    let uv = in.texcoord * (vec2<f32>(1.0, 1.0) - in.texcoord.yx);
    let vignette = pow(uv.x * uv.y * 15.0, 0.25);
    return vec4<f32>(sepia * vignette, 1.0);
}
"#;
