//! Integration tests for soft shadow evaluation
//!
//! Covers the end-to-end visibility path:
//! - Totality and clamping guarantees
//! - Hard-shadow agreement at zero kernel radius
//! - Bias and light size behaviour
//! - A rendered spotlight scene with a floating occluder
//! - Config loading from disk, quality presets and per-light strength

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use penumbra_shadow::prelude::*;
use penumbra_shadow::{
    shade, shade_with_shadow, CenterTexelBlockerSearch, PenumbraModel, ProjectedCoord,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn unit(rng: &mut StdRng) -> f32 {
    rng.gen_range(0.0f32..1.0)
}

fn random_buffer(size: u32, rng: &mut StdRng) -> DepthBuffer {
    DepthBuffer::from_fn(size, |_, _| unit(rng)).unwrap()
}

fn texel_center(buffer: &DepthBuffer, x: u32, y: u32, depth: f32) -> Vec3 {
    let t = buffer.texel_size();
    Vec3::new((x as f32 + 0.5) * t, (y as f32 + 0.5) * t, depth)
}

fn identity_eval(buffer: &DepthBuffer, params: ShadowParams) -> SoftShadowEvaluator<'_> {
    SoftShadowEvaluator::new(buffer, LightProjector::new(Mat4::IDENTITY), params)
}

#[test]
fn test_visibility_is_total() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(7);
    let buffer = random_buffer(64, &mut rng);
    // Zero-depth texels push the penumbra to infinity
    let with_zeros = DepthBuffer::from_fn(64, |x, y| if (x + y) % 5 == 0 { 0.0 } else { 0.7 }).unwrap();

    let variants = [
        ShadowParams::for_texture_size(64),
        ShadowParams::for_texture_size(64).with_light_size(100.0).with_penumbra_scale(30.0),
        ShadowParams::for_texture_size(64).with_hardware_comparison(true).with_max_kernel_radius(12),
        ShadowParams::for_texture_size(64).with_max_taps_per_axis(Some(3)).with_bias(0.0),
        ShadowParams::for_texture_size(64).with_penumbra_model(PenumbraModel::UnbiasedReceiver),
    ];

    for params in variants {
        for buffer in [&buffer, &with_zeros] {
            let eval = identity_eval(buffer, params);
            for _ in 0..400 {
                let point = Vec3::new(rng.gen_range(-0.5f32..1.5), rng.gen_range(-0.5f32..1.5), rng.gen_range(-1.0f32..2.0));
                let v = eval.visibility(point);
                assert!(v.is_finite(), "non-finite visibility at {:?}", point);
                assert!((0.0..=1.0).contains(&v), "visibility {} out of range at {:?}", v, point);
            }
        }
    }
}

#[test]
fn test_zero_w_projection_is_lit() {
    init_logging();
    let buffer = DepthBuffer::filled(16, 0.0).unwrap();
    let params = ShadowParams::for_texture_size(16);
    // w row of zeros
    let matrix = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::ZERO);
    assert_eq!(evaluate_visibility(Vec3::new(0.5, 0.5, 0.5), &matrix, &buffer, &params), 1.0);
}

#[test]
fn test_zero_kernel_matches_hard_test() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(42);
    let buffer = random_buffer(32, &mut rng);
    let params = ShadowParams::for_texture_size(32).with_max_kernel_radius(0).with_bias(0.01);
    let eval = identity_eval(&buffer, params);

    for _ in 0..1000 {
        let coord = ProjectedCoord { x: unit(&mut rng), y: unit(&mut rng), depth: unit(&mut rng) };
        let expected = if coord.current_depth(params.bias) < buffer.sample(coord.uv()) { 1.0 } else { 0.0 };
        assert_eq!(eval.sample_coord(coord).visibility, expected, "mismatch at {:?}", coord);
    }
}

#[test]
fn test_bias_never_darkens_lit_surface() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(3);
    // Flat surface at depth 0.5 with slight rasterization noise
    let buffer = DepthBuffer::from_fn(32, |_, _| 0.5 + rng.gen_range(-0.0004f32..0.0004)).unwrap();

    for x in [4, 11, 16, 27] {
        let point = texel_center(&buffer, x, x, 0.5);
        let mut previous = 0.0;
        for bias in [0.0, 0.001, 0.005, 0.01, 0.1] {
            let params = ShadowParams::for_texture_size(32).with_bias(bias);
            let v = identity_eval(&buffer, params).visibility(point);
            assert!(v >= previous, "bias {} lowered visibility {} -> {}", bias, previous, v);
            previous = v;
        }
        assert_eq!(previous, 1.0);
    }
}

#[test]
fn test_light_size_never_shrinks_kernel() {
    init_logging();
    let buffer = DepthBuffer::filled(64, 0.2).unwrap();
    let point = texel_center(&buffer, 32, 32, 0.8);

    let radii: Vec<u32> = [0.5, 1.0, 2.0, 4.0, 8.0]
        .into_iter()
        .map(|light_size| {
            let params = ShadowParams::for_texture_size(64)
                .with_bias(0.0)
                .with_light_size(light_size)
                .with_max_kernel_radius(16);
            identity_eval(&buffer, params).sample(point).filter.unwrap().kernel_radius
        })
        .collect();

    assert!(radii.windows(2).all(|w| w[0] <= w[1]), "radii {:?}", radii);
    assert!(radii[0] < radii[4]);
}

#[test]
fn test_out_of_frustum_is_lit() {
    init_logging();
    let buffer = DepthBuffer::filled(16, 0.0).unwrap();
    let eval = identity_eval(&buffer, ShadowParams::for_texture_size(16));
    for point in [
        Vec3::new(-0.01, 0.5, 0.9),
        Vec3::new(1.01, 0.5, 0.9),
        Vec3::new(0.5, -0.01, 0.9),
        Vec3::new(0.5, 1.01, 0.9),
        Vec3::new(f32::MAX, 0.5, 0.9),
    ] {
        assert_eq!(eval.visibility(point), 1.0, "point {:?}", point);
    }
}

#[test]
fn test_clamped_kernel_tap_count() {
    init_logging();
    let buffer = DepthBuffer::filled(64, 0.1).unwrap();
    let point = texel_center(&buffer, 32, 32, 0.9);

    for max in 0..=6u32 {
        for hardware in [false, true] {
            let params = ShadowParams::for_texture_size(64)
                .with_light_size(100.0)
                .with_max_kernel_radius(max)
                .with_hardware_comparison(hardware);
            let filter = identity_eval(&buffer, params).sample(point).filter.unwrap();
            assert_eq!(filter.kernel_radius, max);
            assert_eq!(filter.taps, (2 * max + 1) * (2 * max + 1));
        }
    }
}

#[test]
fn test_uniform_far_buffer_is_lit() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(11);
    let buffer = DepthBuffer::filled(32, 1.0).unwrap();
    let eval = identity_eval(&buffer, ShadowParams::for_texture_size(32));
    for _ in 0..200 {
        let point = Vec3::new(unit(&mut rng), unit(&mut rng), rng.gen_range(0.0f32..0.999));
        assert_eq!(eval.visibility(point), 1.0);
    }
}

#[test]
fn test_uniform_near_buffer_is_shadowed() {
    init_logging();
    let buffer = DepthBuffer::filled(32, 0.0).unwrap();
    let params = ShadowParams::for_texture_size(32).with_max_kernel_radius(0);
    let sample = identity_eval(&buffer, params).sample(texel_center(&buffer, 10, 20, 0.5));
    assert_eq!(sample.visibility, 0.0);
    assert_eq!(sample.filter.unwrap().taps, 1);
}

#[test]
fn test_single_occluding_texel() {
    init_logging();
    let buffer = DepthBuffer::from_fn(16, |x, y| if x == 8 && y == 8 { 0.1 } else { 1.0 }).unwrap();
    // penumbra = (0.5 - 0.1) * 0.2 / 0.1 = 0.8 -> radius 0
    let params = ShadowParams::for_texture_size(16).with_bias(0.0).with_light_size(0.2);
    let eval = identity_eval(&buffer, params);

    let on = eval.sample(texel_center(&buffer, 8, 8, 0.5));
    assert_eq!(on.filter.unwrap().kernel_radius, 0);
    assert_eq!(on.visibility, 0.0);

    // Neighbour still sees the occluder in its search window but its own texel is clear
    let beside = eval.sample(texel_center(&buffer, 9, 8, 0.5));
    assert!(beside.blocker.is_some());
    assert_eq!(beside.visibility, 1.0);

    let center_only = identity_eval(&buffer, params).with_search(CenterTexelBlockerSearch);
    assert_eq!(center_only.visibility(texel_center(&buffer, 8, 8, 0.5)), 0.0);
}

/// Spotlight above a floor with a 2x2 occluder floating halfway down
struct Scene {
    light: SpotLight,
    projector: LightProjector,
    buffer: DepthBuffer,
}

const OCCLUDER_HEIGHT: f32 = 5.0;
const OCCLUDER_HALF_EXTENT: f32 = 1.0;

impl Scene {
    fn new(size: u32) -> Self {
        let light = SpotLight::new(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, radians(20.0), radians(30.0));
        let projector = light.projector(1.0, 20.0);
        let inverse = projector.matrix().inverse().unwrap();

        let buffer = DepthBuffer::from_fn(size, |x, y| {
            let u = (x as f32 + 0.5) / size as f32;
            let v = (y as f32 + 0.5) / size as f32;
            let near = inverse.project_point(Vec3::new(u, v, 0.0)).perspective_divide().unwrap();
            let far = inverse.project_point(Vec3::new(u, v, 1.0)).perspective_divide().unwrap();
            let dir = far - near;

            let t = (OCCLUDER_HEIGHT - near.y) / dir.y;
            let hit = near + dir * t;
            let hit = if hit.x.abs() <= OCCLUDER_HALF_EXTENT && hit.z.abs() <= OCCLUDER_HALF_EXTENT {
                hit
            } else {
                near + dir * (-near.y / dir.y)
            };
            projector.project(hit).map_or(1.0, |c| c.depth)
        })
        .unwrap();

        Self { light, projector, buffer }
    }

    fn evaluator(&self) -> SoftShadowEvaluator<'_> {
        let params = SoftShadowConfig {
            penumbra_scale: 30.0,
            ..Default::default()
        }
        .to_params(&LightShadowSettings::default().with_resolution(self.buffer.size()));
        SoftShadowEvaluator::checked(&self.buffer, self.projector, params).unwrap()
    }
}

#[test]
fn test_spotlight_scene_umbra_penumbra_and_lit() {
    init_logging();
    let scene = Scene::new(256);
    let eval = scene.evaluator();

    let umbra = eval.sample(Vec3::ZERO);
    assert_eq!(umbra.visibility, 0.0);
    assert!(umbra.filter.unwrap().kernel_radius > 0);

    // Shadow edge: the occluder edge at x=1, y=5 projects onto x=2 on the floor
    let edge = eval.visibility(Vec3::new(2.0, 0.0, 0.0));
    assert!(edge > 0.0 && edge < 1.0, "edge visibility {}", edge);

    assert_eq!(eval.visibility(Vec3::new(4.0, 0.0, 0.0)), 1.0);
    assert_eq!(eval.visibility(Vec3::new(0.0, 0.0, -4.0)), 1.0);

    // Outside the light frustum
    assert_eq!(eval.visibility(Vec3::new(50.0, 0.0, 0.0)), 1.0);
}

#[test]
fn test_spotlight_scene_batch() {
    init_logging();
    let scene = Scene::new(128);
    let eval = scene.evaluator();
    let points: Vec<Vec3> = (0..5000)
        .map(|i| Vec3::new((i % 100) as f32 * 0.08 - 4.0, 0.0, (i / 100) as f32 * 0.16 - 4.0))
        .collect();

    let batch = eval.visibility_batch(&points);
    assert_eq!(batch.len(), points.len());
    for (point, v) in points.iter().zip(&batch) {
        assert_eq!(*v, eval.visibility(*point));
    }
}

#[test]
fn test_spotlight_scene_shading() {
    init_logging();
    let scene = Scene::new(256);
    let eval = scene.evaluator();
    let albedo = Vec4::new(0.8, 0.8, 0.8, 1.0);
    let view_position = Vec3::new(0.0, 10.0, 0.0);

    let shadowed = shade_with_shadow(
        &eval,
        &scene.light,
        &SurfacePoint { position: Vec3::ZERO, normal: Vec3::Y, view_position },
        albedo,
    );
    assert_eq!(shadowed.truncate(), Vec3::ZERO);
    assert_eq!(shadowed.w, 1.0);

    let lit = shade_with_shadow(
        &eval,
        &scene.light,
        &SurfacePoint { position: Vec3::new(3.0, 0.0, 0.0), normal: Vec3::Y, view_position },
        albedo,
    );
    assert!(lit.x > 0.0);
}

#[test]
fn test_config_file_drives_evaluation() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "resolution": 64,
            "max_kernel_radius": 2,
            "penumbra_scale": 30.0,
            "penumbra_model": "unbiased_receiver"
        }}"#
    )
    .unwrap();

    let config = SoftShadowConfig::load(file.path()).unwrap();
    assert_eq!(config.resolution, 256);
    assert_eq!(config.penumbra_model, PenumbraModel::UnbiasedReceiver);

    let buffer = DepthBuffer::filled(64, 0.1).unwrap();
    let params = config.to_params(&LightShadowSettings::default().with_resolution(64));
    let filter = identity_eval(&buffer, params).sample(texel_center(&buffer, 32, 32, 0.9)).filter.unwrap();
    assert_eq!(filter.taps, 25);
}

#[test]
fn test_off_preset_leaves_occluded_points_lit() {
    init_logging();
    let buffer = DepthBuffer::filled(256, 0.0).unwrap();
    let settings = LightShadowSettings::default().with_resolution(256);
    let point = texel_center(&buffer, 128, 128, 0.5);

    let off = ShadowQuality::Off.to_config().to_params(&settings);
    assert_eq!(identity_eval(&buffer, off).visibility(point), 1.0);

    let hard = ShadowQuality::Hard.to_config().to_params(&settings);
    assert_eq!(identity_eval(&buffer, hard).visibility(point), 0.0);
}

#[test]
fn test_light_strength_softens_shading() {
    init_logging();
    let scene = Scene::new(256);
    let albedo = Vec4::new(0.8, 0.8, 0.8, 1.0);
    let surface = SurfacePoint { position: Vec3::ZERO, normal: Vec3::Y, view_position: Vec3::new(0.0, 10.0, 0.0) };
    let terms = scene.light.terms(&surface);

    let params = SoftShadowConfig {
        penumbra_scale: 30.0,
        ..Default::default()
    }
    .to_params(&LightShadowSettings::default().with_resolution(256).with_strength(0.25));
    let eval = SoftShadowEvaluator::checked(&scene.buffer, scene.projector, params).unwrap();

    assert_eq!(eval.visibility(Vec3::ZERO), 0.0);
    assert_eq!(shade_with_shadow(&eval, &scene.light, &surface, albedo), shade(albedo, terms, 0.75));
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = SoftShadowConfig::load_or_default(dir.path().join("missing.json"));
    assert_eq!(config, SoftShadowConfig::default());
    assert!(SoftShadowConfig::load(dir.path().join("missing.json")).is_err());
}
