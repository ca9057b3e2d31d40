//! WGSL sources for every material kind.
//!
//! Sources are assembled from a generated uniform struct, the material's
//! texture bindings and a fixed body per kind. Textures sit at
//! `@group(1) @binding(0..n)` with the shared sampler at `@binding(3)`.

use std::fmt::Write as _;

use crate::command::UniformKind;
use crate::material::{EarthVariant, MaterialKind, UniformDecl};

/// 9-tap Gaussian weights (centre first) for the separable blur.
pub const BLUR_WEIGHTS: [f32; 5] = [
    0.227_027_03,
    0.194_594_6,
    0.121_621_62,
    0.054_054_055,
    0.016_216_216,
];

/// Binding index of the sampler in the texture group.
pub const SAMPLER_BINDING: u32 = 3;

const VERTEX_INPUT: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};
"#;

const HDR_OUTPUT: &str = r#"
struct HdrOutput {
    @location(0) color: vec4<f32>,
    @location(1) bright: vec4<f32>,
};

fn hdr_output(color: vec3<f32>) -> HdrOutput {
    var out: HdrOutput;
    out.color = vec4<f32>(color, 1.0);
    out.bright = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    if luminance > 1.0 {
        out.bright = vec4<f32>(color, 1.0);
    }
    return out;
}
"#;

const WORLD_VERTEX: &str = r#"
struct WorldVarying {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> WorldVarying {
    let world = u.model * vec4<f32>(in.position, 1.0);
    var out: WorldVarying;
    out.clip = u.projection * u.view * world;
    out.world_pos = world.xyz;
    out.normal = normalize((u.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}
"#;

const SUN_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: WorldVarying) -> HdrOutput {
    var base = vec3<f32>(1.0, 0.85, 0.4);
    if u.textured.x > 0.5 {
        base = textureSample(tex0, samp, in.uv).rgb;
    }
    return hdr_output(base * u.glow.x);
}
"#;

const LIGHTING: &str = r#"
struct Shaded {
    color: vec3<f32>,
    diffuse: f32,
};

fn shade(in: WorldVarying, base: vec3<f32>) -> Shaded {
    let n = normalize(in.normal);
    let to_light = u.light_position.xyz - in.world_pos;
    let distance = length(to_light);
    let l = to_light / max(distance, 0.0001);
    let v = normalize(u.view_pos.xyz - in.world_pos);
    let r = reflect(-l, n);
    let attenuation = 1.0 / max(
        u.light_constant.x + u.light_linear.x * distance + u.light_quadratic.x * distance * distance,
        0.0001,
    );
    let light = u.light_color.xyz * u.light_intensity.x * attenuation;
    let diffuse = max(dot(n, l), 0.0);
    let specular = pow(max(dot(v, r), 0.0), max(u.shininess.x, 1.0)) * u.reflectivity.x;

    var out: Shaded;
    out.color = base * (u.ambient.x + diffuse * light) + specular * light;
    out.diffuse = diffuse;
    if u.outline.x > 0.5 && dot(n, v) < 0.2 {
        out.color = vec3<f32>(0.2, 0.6, 1.0);
    }
    return out;
}
"#;

const PLANET_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: WorldVarying) -> HdrOutput {
    var base = vec3<f32>(0.6, 0.6, 0.6);
    if u.textured.x > 0.5 {
        base = textureSample(tex0, samp, in.uv).rgb;
    }
    return hdr_output(shade(in, base).color);
}
"#;

const FLAT_VERTEX: &str = r#"
@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return u.projection * u.view * u.model * vec4<f32>(in.position, 1.0);
}
"#;

const ORBIT_FRAGMENT: &str = r#"
@fragment
fn fs_main() -> HdrOutput {
    return hdr_output(vec3<f32>(0.35, 0.35, 0.4));
}
"#;

const STARS_FRAGMENT: &str = r#"
@fragment
fn fs_main() -> HdrOutput {
    var out = hdr_output(vec3<f32>(1.0, 1.0, 1.0));
    out.bright = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    return out;
}
"#;

const SKYBOX: &str = r#"
struct SkyVarying {
    @builtin(position) clip: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> SkyVarying {
    let clip = u.projection * u.view * u.model * vec4<f32>(in.position, 1.0);
    var out: SkyVarying;
    // Pin to the far plane.
    out.clip = clip.xyww;
    out.direction = in.position;
    return out;
}

@fragment
fn fs_main(in: SkyVarying) -> HdrOutput {
    var out: HdrOutput;
    out.color = vec4<f32>(textureSample(tex0, samp, in.direction).rgb, 1.0);
    out.bright = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    return out;
}
"#;

const SCREEN_VERTEX: &str = r#"
struct ScreenVarying {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> ScreenVarying {
    var out: ScreenVarying;
    out.clip = vec4<f32>(in.position.xy, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}
"#;

const BLOOM_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: ScreenVarying) -> @location(0) vec4<f32> {
    var uv = in.uv;
    if u.horizontal_mirror.x > 0.5 {
        uv.x = 1.0 - uv.x;
    }
    if u.vertical_mirror.x > 0.5 {
        uv.y = 1.0 - uv.y;
    }
    var hdr = textureSample(tex0, samp, uv).rgb;
    let bloom = textureSample(tex1, samp, uv).rgb;
    if u.bloom.x > 0.5 && u.blur.x > 0.5 {
        hdr += bloom;
    }
    var result = vec3<f32>(1.0) - exp(-hdr * u.exposure.x);
    result = pow(result, vec3<f32>(1.0 / max(u.gamma.x, 0.0001)));
    if u.grayscale.x > 0.5 {
        result = vec3<f32>(dot(result, vec3<f32>(0.2126, 0.7152, 0.0722)));
    }
    return vec4<f32>(result, 1.0);
}
"#;

/// Complete WGSL module for `kind`. Entry points are `vs_main` and `fs_main`.
pub fn material_source(kind: MaterialKind) -> String {
    let mut src = uniform_struct(kind.uniforms());
    src.push_str(&texture_bindings(kind));
    src.push_str(VERTEX_INPUT);

    match kind {
        MaterialKind::Sun => {
            src.push_str(HDR_OUTPUT);
            src.push_str(WORLD_VERTEX);
            src.push_str(SUN_FRAGMENT);
        }
        MaterialKind::Planet => {
            src.push_str(HDR_OUTPUT);
            src.push_str(WORLD_VERTEX);
            src.push_str(LIGHTING);
            src.push_str(PLANET_FRAGMENT);
        }
        MaterialKind::Earth(variant) => {
            src.push_str(HDR_OUTPUT);
            src.push_str(WORLD_VERTEX);
            src.push_str(LIGHTING);
            src.push_str(&earth_fragment(variant));
        }
        MaterialKind::Orbit => {
            src.push_str(HDR_OUTPUT);
            src.push_str(FLAT_VERTEX);
            src.push_str(ORBIT_FRAGMENT);
        }
        MaterialKind::Stars => {
            src.push_str(HDR_OUTPUT);
            src.push_str(FLAT_VERTEX);
            src.push_str(STARS_FRAGMENT);
        }
        MaterialKind::Skybox => {
            src.push_str(HDR_OUTPUT);
            src.push_str(SKYBOX);
        }
        MaterialKind::Blur => {
            src.push_str(SCREEN_VERTEX);
            src.push_str(&blur_fragment());
        }
        MaterialKind::Bloom => {
            src.push_str(SCREEN_VERTEX);
            src.push_str(BLOOM_FRAGMENT);
        }
    }
    src
}

/// WGSL struct matching [`super::uniforms::UniformLayout`] for `decls`.
pub fn uniform_struct(decls: &[UniformDecl]) -> String {
    let mut src = String::from("struct Uniforms {\n");
    for decl in decls {
        let ty = match decl.kind {
            UniformKind::Mat4 => "mat4x4<f32>",
            _ => "vec4<f32>",
        };
        let _ = writeln!(src, "    {}: {},", decl.name, ty);
    }
    src.push_str("};\n\n@group(0) @binding(0) var<uniform> u: Uniforms;\n");
    src
}

fn texture_bindings(kind: MaterialKind) -> String {
    let units = kind.texture_units();
    if units == 0 {
        return String::new();
    }
    let ty = if kind == MaterialKind::Skybox {
        "texture_cube<f32>"
    } else {
        "texture_2d<f32>"
    };
    let mut src = String::new();
    for unit in 0..units {
        let _ = writeln!(src, "@group(1) @binding({unit}) var tex{unit}: {ty};");
    }
    let _ = writeln!(src, "@group(1) @binding({SAMPLER_BINDING}) var samp: sampler;");
    src
}

fn earth_fragment(variant: EarthVariant) -> String {
    let mut src = String::from(
        r#"
@fragment
fn fs_main(in: WorldVarying) -> HdrOutput {
    var base = vec3<f32>(0.6, 0.6, 0.6);
    if u.textured.x > 0.5 {
        base = textureSample(tex0, samp, in.uv).rgb;
    }
"#,
    );
    if variant.texture_count() >= 2 {
        src.push_str(
            "    let clouds = textureSample(tex1, samp, in.uv).r;\n    base = mix(base, vec3<f32>(1.0), clouds);\n",
        );
    }
    src.push_str("    let lit = shade(in, base);\n    var color = lit.color;\n");
    if variant.texture_count() >= 3 {
        src.push_str(
            "    let night = textureSample(tex2, samp, in.uv).rgb;\n    color += night * (1.0 - smoothstep(0.0, 0.25, lit.diffuse));\n",
        );
    }
    src.push_str("    return hdr_output(color);\n}\n");
    src
}

fn blur_fragment() -> String {
    let weights = BLUR_WEIGHTS
        .iter()
        .map(|w| format!("{w:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
@fragment
fn fs_main(in: ScreenVarying) -> @location(0) vec4<f32> {{
    var weights = array<f32, 5>({weights});
    let texel = 1.0 / vec2<f32>(textureDimensions(tex0));
    var direction = vec2<f32>(0.0, texel.y);
    if u.horizontal.x > 0.5 {{
        direction = vec2<f32>(texel.x, 0.0);
    }}
    var result = textureSample(tex0, samp, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i++) {{
        let offset = direction * f32(i);
        result += textureSample(tex0, samp, in.uv + offset).rgb * weights[i];
        result += textureSample(tex0, samp, in.uv - offset).rgb * weights[i];
    }}
    return vec4<f32>(result, 1.0);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_weights_sum_to_approximately_one() {
        let sum = BLUR_WEIGHTS[0] + 2.0 * BLUR_WEIGHTS[1..].iter().sum::<f32>();
        assert!((sum - 1.0).abs() < 0.01, "got {sum}");
    }

    #[test]
    fn test_uniform_struct_follows_declaration_order() {
        let src = uniform_struct(MaterialKind::Sun.uniforms());
        let view = src.find("view: mat4x4<f32>").unwrap();
        let model = src.find("model: mat4x4<f32>").unwrap();
        let glow = src.find("glow: vec4<f32>").unwrap();
        assert!(view < model && model < glow);
    }

    #[test]
    fn test_texture_bindings_match_units() {
        let earth = material_source(MaterialKind::Earth(EarthVariant::SurfaceCloudsNight));
        assert!(earth.contains("var tex2: texture_2d<f32>"));
        assert!(earth.contains("night"));

        let surface = material_source(MaterialKind::Earth(EarthVariant::Surface));
        assert!(!surface.contains("tex1"));

        let skybox = material_source(MaterialKind::Skybox);
        assert!(skybox.contains("texture_cube<f32>"));

        let orbit = material_source(MaterialKind::Orbit);
        assert!(!orbit.contains("@group(1)"));
    }

    #[test]
    fn test_blur_source_embeds_weights() {
        let src = material_source(MaterialKind::Blur);
        assert!(src.contains("0.22702703"));
        assert!(src.contains("u.horizontal.x"));
    }

    #[test]
    fn test_every_source_has_entry_points() {
        let kinds = [
            MaterialKind::Sun,
            MaterialKind::Planet,
            MaterialKind::Earth(EarthVariant::Surface),
            MaterialKind::Earth(EarthVariant::SurfaceClouds),
            MaterialKind::Earth(EarthVariant::SurfaceCloudsNight),
            MaterialKind::Orbit,
            MaterialKind::Stars,
            MaterialKind::Skybox,
            MaterialKind::Blur,
            MaterialKind::Bloom,
        ];
        for kind in kinds {
            let src = material_source(kind);
            assert!(src.contains("fn vs_main"), "{}", kind.label());
            assert!(src.contains("fn fs_main"), "{}", kind.label());
        }
    }
}
