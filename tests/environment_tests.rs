//! Environment Map Tests
//!
//! Tests for:
//! - Pipeline ordering guards and input validation
//! - Equirectangular-to-cubemap projection
//! - Diffuse irradiance convolution (constant radiance L convolves to pi*L)
//! - GGX specular prefiltering across the mip chain
//! - Split-sum BRDF integration determinism
//! - Invalidation rules, unload, display state

use std::f32::consts::PI;
use std::path::Path;

use basalt::environment::sampling::PREFILTER_MIP_LEVELS;
use basalt::environment::{EnvironmentMap, MapKind};
use basalt::errors::BasaltError;
use basalt::resources::{ImageData, ImageRegistry, PixelFormat};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

/// A tiny equirectangular source of one constant color.
fn solid_equirect(color: [f32; 4]) -> ImageData {
    let mut image = ImageData::new_2d(4, 2, PixelFormat::Rgba32F);
    image.fill(&color);
    image
}

fn loaded_environment(color: [f32; 4], registry: &mut ImageRegistry) -> EnvironmentMap {
    let mut env = EnvironmentMap::new();
    env.set_equirectangular(solid_equirect(color), registry);
    env
}

// ============================================================================
// Ordering guards and input validation
// ============================================================================

#[test]
fn passes_refuse_to_run_before_their_inputs_exist() {
    let mut registry = ImageRegistry::new();
    let mut env = EnvironmentMap::new();

    assert!(matches!(
        env.equirect_to_cubemap(16, 16, &mut registry),
        Err(BasaltError::EnvironmentState { .. })
    ));
    assert!(matches!(
        env.precompute_irradiance(8, 8, &mut registry),
        Err(BasaltError::EnvironmentState { .. })
    ));
    assert!(matches!(
        env.precompute_specular(16, 16, &mut registry),
        Err(BasaltError::EnvironmentState { .. })
    ));
    assert!(matches!(
        env.precompute_integration(16, 16, &mut registry),
        Err(BasaltError::EnvironmentState { .. })
    ));

    // Without a cubemap there is still nothing to convolve.
    env.set_equirectangular(solid_equirect([1.0; 4]), &mut registry);
    assert!(matches!(
        env.precompute_irradiance(8, 8, &mut registry),
        Err(BasaltError::EnvironmentState { .. })
    ));
}

#[test]
fn zero_resolutions_are_rejected() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);

    assert!(matches!(
        env.equirect_to_cubemap(0, 16, &mut registry),
        Err(BasaltError::InvalidDimensions { .. })
    ));
    assert!(!env.has_cubemap());
}

#[test]
fn failed_load_leaves_the_environment_untouched() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    let count_before = registry.len();

    let result = env.load_equirectangular(Path::new("/nonexistent/probe.hdr"), &mut registry);

    assert!(result.is_err());
    assert!(env.has_equirectangular());
    assert!(env.has_cubemap());
    assert_eq!(registry.len(), count_before);
}

#[test]
fn failed_regeneration_keeps_the_previous_cubemap_alive() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    let before = env.map_handle(MapKind::Skybox).unwrap();

    // Sever the source behind the environment's back so the pass fails.
    registry.remove(env.map_handle(MapKind::Equirectangular).unwrap());

    assert!(env.equirect_to_cubemap(16, 16, &mut registry).is_err());
    assert!(env.has_cubemap());
    assert_eq!(env.map_handle(MapKind::Skybox), Some(before));
    assert!(registry.get(before).is_some(), "previous map must survive");
    assert_eq!(registry.lookup("environment.cubemap"), Some(before));
}

#[test]
fn failed_derived_pass_keeps_the_previous_derived_map_alive() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    env.precompute_irradiance(4, 4, &mut registry).unwrap();
    let before = env.map_handle(MapKind::Irradiance).unwrap();

    registry.remove(env.map_handle(MapKind::Skybox).unwrap());

    assert!(env.precompute_irradiance(8, 8, &mut registry).is_err());
    assert!(env.has_irradiance());
    assert_eq!(env.map_handle(MapKind::Irradiance), Some(before));
    assert!(registry.get(before).is_some());
}

// ============================================================================
// Cubemap projection
// ============================================================================

#[test]
fn constant_source_projects_to_a_constant_cubemap() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([0.2, 0.4, 0.8, 1.0], &mut registry);

    env.equirect_to_cubemap(16, 16, &mut registry).unwrap();

    let cube = registry.get(env.map_handle(MapKind::Skybox).unwrap()).unwrap();
    assert_eq!((cube.width(), cube.height()), (16, 16));
    assert_eq!(cube.format(), PixelFormat::Rgba16F);
    for layer in 0..6 {
        for y in 0..16 {
            for x in 0..16 {
                let t = cube.texel(layer, 0, x, y).unwrap();
                assert!(approx(t[0], 0.2, EPSILON));
                assert!(approx(t[1], 0.4, EPSILON));
                assert!(approx(t[2], 0.8, EPSILON));
            }
        }
    }
}

#[test]
fn named_handles_match_the_map_handles() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();

    assert_eq!(
        registry.lookup("environment.equirect"),
        env.map_handle(MapKind::Equirectangular)
    );
    assert_eq!(
        registry.lookup("environment.cubemap"),
        env.map_handle(MapKind::Skybox)
    );
}

// ============================================================================
// Irradiance convolution
// ============================================================================

#[test]
fn constant_radiance_convolves_to_pi_times_l() {
    let mut registry = ImageRegistry::new();
    let l = 0.5;
    let mut env = loaded_environment([l, l, l, 1.0], &mut registry);
    env.equirect_to_cubemap(16, 16, &mut registry).unwrap();

    env.precompute_irradiance(8, 8, &mut registry).unwrap();

    let map = registry
        .get(env.map_handle(MapKind::Irradiance).unwrap())
        .unwrap();
    let expected = PI * l;
    for layer in 0..6 {
        for y in 0..8 {
            for x in 0..8 {
                let t = map.texel(layer, 0, x, y).unwrap();
                assert!(
                    approx(t[0], expected, expected * 0.01),
                    "face {layer} texel ({x},{y}): {} vs {expected}",
                    t[0]
                );
            }
        }
    }
}

#[test]
fn solid_red_hdr_scenario_produces_red_irradiance() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0, 0.0, 0.0, 1.0], &mut registry);

    env.equirect_to_cubemap(64, 64, &mut registry).unwrap();
    env.precompute_irradiance(32, 32, &mut registry).unwrap();

    let map = registry
        .get(env.map_handle(MapKind::Irradiance).unwrap())
        .unwrap();
    let t = map.texel(3, 0, 16, 16).unwrap();
    assert!(approx(t[0], PI, PI * 0.01));
    assert!(approx(t[1], 0.0, EPSILON));
    assert!(approx(t[2], 0.0, EPSILON));
}

// ============================================================================
// Specular prefiltering
// ============================================================================

#[test]
fn prefiltering_a_constant_cubemap_is_constant_across_all_mips() {
    let mut registry = ImageRegistry::new();
    let l = 0.6;
    let mut env = loaded_environment([l, l, l, 1.0], &mut registry);
    env.equirect_to_cubemap(16, 16, &mut registry).unwrap();

    env.precompute_specular(16, 16, &mut registry).unwrap();

    let map = registry
        .get(env.map_handle(MapKind::Prefilter).unwrap())
        .unwrap();
    assert_eq!(map.mip_count(), PREFILTER_MIP_LEVELS);
    assert_eq!(env.max_mip(), PREFILTER_MIP_LEVELS - 1);
    for mip in 0..map.mip_count() {
        let (w, h) = map.mip_dimensions(mip);
        for layer in 0..6 {
            for y in 0..h {
                for x in 0..w {
                    let t = map.texel(layer, mip, x, y).unwrap();
                    assert!(
                        approx(t[0], l, 1e-3),
                        "mip {mip} face {layer}: {} vs {l}",
                        t[0]
                    );
                }
            }
        }
    }
}

// ============================================================================
// BRDF integration
// ============================================================================

#[test]
fn integration_is_deterministic_at_equal_resolutions() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);

    env.precompute_integration(16, 16, &mut registry).unwrap();
    let first: Vec<f32> = registry
        .get(env.map_handle(MapKind::Integration).unwrap())
        .unwrap()
        .plane(0, 0)
        .to_vec();

    env.precompute_integration(16, 16, &mut registry).unwrap();
    let map = registry
        .get(env.map_handle(MapKind::Integration).unwrap())
        .unwrap();

    assert_eq!(map.format(), PixelFormat::Rg16F);
    assert_eq!(first, map.plane(0, 0));
}

#[test]
fn integration_conserves_energy() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.precompute_integration(16, 16, &mut registry).unwrap();

    let map = registry
        .get(env.map_handle(MapKind::Integration).unwrap())
        .unwrap();
    for y in 0..16 {
        for x in 0..16 {
            let t = map.texel(0, 0, x, y).unwrap();
            assert!(t[0] >= 0.0 && t[1] >= 0.0, "negative BRDF term at ({x},{y})");
            // Scale plus bias is the hemisphere reflectance estimate.
            assert!(
                t[0] + t[1] <= 1.0 + 1e-2,
                "reflectance {} exceeds unity at ({x},{y})",
                t[0] + t[1]
            );
        }
    }
}

// ============================================================================
// Invalidation and unload
// ============================================================================

#[test]
fn regenerating_the_cubemap_drops_derived_maps_but_keeps_the_lut() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    env.precompute_irradiance(8, 8, &mut registry).unwrap();
    env.precompute_specular(8, 8, &mut registry).unwrap();
    env.precompute_integration(8, 8, &mut registry).unwrap();

    env.equirect_to_cubemap(16, 16, &mut registry).unwrap();

    assert!(env.has_cubemap());
    assert!(!env.has_irradiance());
    assert!(!env.has_prefilter());
    assert!(env.has_integration(), "the LUT is source-independent");
}

#[test]
fn replacing_the_source_drops_everything_derived() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    env.precompute_integration(8, 8, &mut registry).unwrap();

    env.set_equirectangular(solid_equirect([0.5; 4]), &mut registry);

    assert!(env.has_equirectangular());
    assert!(!env.has_cubemap());
    assert!(!env.has_integration());
    // Only the new source remains.
    assert_eq!(registry.len(), 1);
}

#[test]
fn unload_releases_every_image_and_resets_display_state() {
    let mut registry = ImageRegistry::new();
    let mut env = loaded_environment([1.0; 4], &mut registry);
    env.equirect_to_cubemap(8, 8, &mut registry).unwrap();
    env.precompute_irradiance(8, 8, &mut registry).unwrap();
    env.precompute_specular(8, 8, &mut registry).unwrap();
    env.precompute_integration(8, 8, &mut registry).unwrap();
    env.set_drawing(MapKind::Irradiance);
    env.set_roughness_preview(0.7);

    env.unload(&mut registry);

    assert!(registry.is_empty());
    assert!(!env.has_equirectangular());
    assert!(!env.has_cubemap());
    assert!(!env.has_irradiance());
    assert!(!env.has_prefilter());
    assert!(!env.has_integration());
    assert_eq!(env.drawing(), MapKind::Skybox);
    assert!(approx(env.roughness_preview(), 0.0, EPSILON));
}

// ============================================================================
// Display state
// ============================================================================

#[test]
fn drawing_selector_is_exclusive() {
    let mut env = EnvironmentMap::new();
    assert_eq!(env.drawing(), MapKind::Skybox);

    env.set_drawing(MapKind::Prefilter);
    assert_eq!(env.drawing(), MapKind::Prefilter);

    env.set_drawing(MapKind::Integration);
    assert_eq!(env.drawing(), MapKind::Integration);
}

#[test]
fn display_parameters_default_and_clamp() {
    let mut env = EnvironmentMap::new();
    assert!(approx(env.gamma(), 2.2, EPSILON));
    assert!(approx(env.exposure(), 1.0, EPSILON));

    env.set_roughness_preview(3.0);
    assert!(approx(env.roughness_preview(), 1.0, EPSILON));
    env.set_roughness_preview(-1.0);
    assert!(approx(env.roughness_preview(), 0.0, EPSILON));
}
