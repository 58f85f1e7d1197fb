//! WGSL generation for the soft shadow pass
//!
//! Emits a vertex + fragment module that evaluates the same visibility term
//! as `penumbra_shadow` on the GPU and feeds it into spotlight shading.
//!
//! Bind groups:
//!
//! ```text
//! group 0: binding 0 camera      (CameraUniforms)
//!          binding 1 light       (SpotLightUniforms)
//! group 1: binding 0 shadow      (SoftShadowParams, 112 bytes)
//!          binding 1 shadow_map  (texture_depth_2d)
//!          binding 2 shadow_sampler (sampler_comparison, HARDWARE_COMPARISON only)
//! ```

use crate::variants::ShaderVariant;

/// Selects `textureSampleCompareLevel` taps instead of manual `textureLoad` tests
pub const DEFINE_HARDWARE_COMPARISON: &str = "HARDWARE_COMPARISON";

/// Selects the windowed average blocker search instead of the center texel
pub const DEFINE_BLOCKER_SEARCH: &str = "BLOCKER_SEARCH";

/// Bind group holding the shadow resources
pub const SHADOW_BIND_GROUP: u32 = 1;

/// Binding of the `SoftShadowParams` uniform inside [`SHADOW_BIND_GROUP`]
pub const SHADOW_PARAMS_BINDING: u32 = 0;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

const SHADOW_PARAMS_STRUCT: &str = r#"
struct SoftShadowParams {
    light_matrix: mat4x4<f32>,
    bias: f32,
    light_size: f32,
    texel_size: f32,
    penumbra_scale: f32,
    max_kernel_radius: i32,
    blocker_search_radius: i32,
    max_taps_per_axis: i32,
    penumbra_model: u32,
    enabled: u32,
    strength: f32,
}
"#;

/// Generate the soft shadow module for `variant`
pub fn generate_soft_shadow_shader(variant: &ShaderVariant) -> String {
    let hardware = variant.is_defined(DEFINE_HARDWARE_COMPARISON);
    let windowed = variant.is_defined(DEFINE_BLOCKER_SEARCH);

    format!(
        r#"// Soft shadow pass ({name})
{params_struct}
struct CameraUniforms {{
    view_proj: mat4x4<f32>,
    view_position: vec4<f32>,
}}

// limits: x = inner cone cosine, y = outer cone cosine, z = shininess
struct SpotLightUniforms {{
    position: vec4<f32>,
    direction: vec4<f32>,
    limits: vec4<f32>,
}}

@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<uniform> light: SpotLightUniforms;

@group({group}) @binding({binding}) var<uniform> shadow: SoftShadowParams;
@group({group}) @binding(1) var shadow_map: texture_depth_2d;
{sampler_binding}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
}}

@vertex
fn {vertex_entry}(in: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(in.position, 1.0);
    out.world_position = in.position;
    out.normal = in.normal;
    out.color = in.color;
    return out;
}}

// Nearest texel with clamp-to-edge addressing
fn shadow_texel(uv: vec2<f32>) -> f32 {{
    let size = vec2<i32>(textureDimensions(shadow_map));
    let texel = clamp(vec2<i32>(floor(uv * vec2<f32>(size))), vec2<i32>(0, 0), size - vec2<i32>(1, 1));
    return textureLoad(shadow_map, texel, 0);
}}

{tap_fn}

// Returns (sum, count) of occluding depths
{blocker_fn}

fn estimate_penumbra(receiver: f32, blocker: f32) -> f32 {{
    let penumbra = (receiver - blocker) * shadow.light_size / blocker;
    if penumbra > 0.0 {{
        return penumbra;
    }}
    return 0.0;
}}

fn kernel_radius(penumbra: f32) -> i32 {{
    let texels = penumbra * shadow.penumbra_scale;
    if !(texels > 0.0) {{
        return 0;
    }}
    if texels >= f32(shadow.max_kernel_radius) {{
        return shadow.max_kernel_radius;
    }}
    return i32(floor(texels));
}}

fn tap_stride(radius: i32) -> i32 {{
    let side = 2 * radius + 1;
    let taps = shadow.max_taps_per_axis;
    if taps > 0 {{
        return max((side + taps - 1) / taps, 1);
    }}
    return 1;
}}

fn filter_visibility(uv: vec2<f32>, current_depth: f32, radius: i32) -> f32 {{
    let stride = tap_stride(radius);
    var lit = 0.0;
    var taps = 0.0;
    for (var y = -radius; y <= radius; y = y + stride) {{
        for (var x = -radius; x <= radius; x = x + stride) {{
            let offset = vec2<f32>(f32(x), f32(y)) * shadow.texel_size;
            lit = lit + shadow_tap(uv + offset, current_depth);
            taps = taps + 1.0;
        }}
    }}
    return clamp(lit / taps, 0.0, 1.0);
}}

fn shadow_visibility(world_position: vec3<f32>) -> f32 {{
    if shadow.enabled == 0u {{
        return 1.0;
    }}
    let clip = shadow.light_matrix * vec4<f32>(world_position, 1.0);
    if clip.w == 0.0 {{
        return 1.0;
    }}
    let projected = clip.xyz / clip.w;
    if !(projected.x >= 0.0 && projected.x <= 1.0 && projected.y >= 0.0 && projected.y <= 1.0) {{
        return 1.0;
    }}

    let current_depth = projected.z - shadow.bias;
    let blocker = find_blockers(projected.xy, current_depth);
    if blocker.y < 1.0 {{
        return 1.0;
    }}

    var receiver = current_depth;
    if shadow.penumbra_model == 1u {{
        receiver = projected.z;
    }}
    let penumbra = estimate_penumbra(receiver, blocker.x / blocker.y);
    return filter_visibility(projected.xy, current_depth, kernel_radius(penumbra));
}}

@fragment
fn {fragment_entry}(in: VertexOutput) -> @location(0) vec4<f32> {{
    let normal = normalize(in.normal);
    let to_light = normalize(light.position.xyz - in.world_position);
    let to_view = normalize(camera.view_position.xyz - in.world_position);
    let half_vector = normalize(to_light + to_view);

    let from_direction = dot(to_light, -light.direction.xyz);
    let in_light = clamp((from_direction - light.limits.y) / (light.limits.x - light.limits.y), 0.0, 1.0);
    let diffuse = in_light * max(dot(normal, to_light), 0.0);
    var specular = 0.0;
    if diffuse > 0.0 {{
        specular = in_light * pow(max(dot(normal, half_vector), 0.0), light.limits.z);
    }}

    let strength = clamp(shadow.strength, 0.0, 1.0);
    let visibility = 1.0 - strength * (1.0 - shadow_visibility(in.world_position));
    let rgb = in.color.rgb * (diffuse * visibility) + vec3<f32>(specular * visibility);
    return vec4<f32>(rgb, in.color.a);
}}
"#,
        name = variant.name,
        params_struct = SHADOW_PARAMS_STRUCT,
        group = SHADOW_BIND_GROUP,
        binding = SHADOW_PARAMS_BINDING,
        sampler_binding = if hardware {
            "@group(1) @binding(2) var shadow_sampler: sampler_comparison;\n"
        } else {
            ""
        },
        vertex_entry = VERTEX_ENTRY_POINT,
        fragment_entry = FRAGMENT_ENTRY_POINT,
        tap_fn = if hardware {
            r#"fn shadow_tap(uv: vec2<f32>, reference: f32) -> f32 {
    return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, reference);
}"#
        } else {
            r#"fn shadow_tap(uv: vec2<f32>, reference: f32) -> f32 {
    return select(0.0, 1.0, reference < shadow_texel(uv));
}"#
        },
        blocker_fn = if windowed {
            r#"fn find_blockers(uv: vec2<f32>, current_depth: f32) -> vec2<f32> {
    var sum = 0.0;
    var count = 0.0;
    let r = shadow.blocker_search_radius;
    for (var y = -r; y <= r; y = y + 1) {
        for (var x = -r; x <= r; x = x + 1) {
            let depth = shadow_texel(uv + vec2<f32>(f32(x), f32(y)) * shadow.texel_size);
            if depth < current_depth {
                sum = sum + depth;
                count = count + 1.0;
            }
        }
    }
    return vec2<f32>(sum, count);
}"#
        } else {
            r#"fn find_blockers(uv: vec2<f32>, current_depth: f32) -> vec2<f32> {
    let depth = shadow_texel(uv);
    if depth < current_depth {
        return vec2<f32>(depth, 1.0);
    }
    return vec2<f32>(0.0, 0.0);
}"#
        },
    )
}
