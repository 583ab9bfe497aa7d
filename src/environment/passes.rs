//! The IBL precomputation passes.
//!
//! Each pass drives a transient [`RenderTarget`] the way the editor's draw
//! loop does: attach the destination plane, declare draw targets, validate
//! in debug builds, then shade every texel of the bound attachment. Cubemap
//! passes re-target the single color slot across the six faces of the
//! face table rather than unrolling per-face code.
//!
//! Passes are heavyweight one-shot operations — hundreds of milliseconds at
//! editor resolutions — and run to completion on the calling thread.

use glam::Vec3;
use std::f32::consts::PI;

use crate::errors::{BasaltError, Result};
use crate::resources::{ImageId, ImageRegistry};
use crate::target::{AttachmentSlot, AttachmentSpec, RenderTarget};

use super::sampling::{
    geometry_smith_ibl, hammersley, importance_sample_ggx, tangent_basis, CUBE_FACES,
    IRRADIANCE_SAMPLE_DELTA, PREFILTER_SAMPLE_COUNT,
};

fn missing_image(what: &'static str) -> BasaltError {
    BasaltError::ImageNotFound(what.to_string())
}

/// Project an equirectangular source onto the six faces of a cubemap.
pub(crate) fn equirect_to_cube(
    equirect: ImageId,
    cube: ImageId,
    registry: &mut ImageRegistry,
) -> Result<()> {
    let (width, height) = registry
        .get(cube)
        .ok_or_else(|| missing_image("cubemap destination"))?
        .mip_dimensions(0);

    let mut rt = RenderTarget::new(width, height);
    let spec = AttachmentSpec::float_color(AttachmentSlot::Color0);

    for (layer, face) in CUBE_FACES.iter().enumerate() {
        rt.attach_existing_layer(spec, cube, layer as u32, 0, registry);
        rt.set_draw_targets();
        if layer == 0 {
            debug_assert!(rt.is_valid(registry));
        }
        if !rt.draw_targets().contains(&AttachmentSlot::Color0) {
            continue;
        }
        rt.bind();
        rt.set_viewport();

        let (src, dst) = registry
            .pair_mut(equirect, cube)
            .ok_or_else(|| missing_image("equirectangular source"))?;
        for y in 0..height {
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let v = (y as f32 + 0.5) / height as f32;
                let c = src.sample_equirect(face.texel_direction(u, v));
                dst.put_texel(layer as u32, 0, x, y, &[c.x, c.y, c.z, 1.0]);
            }
        }
        rt.unbind();
        rt.detach(AttachmentSlot::Color0);
    }

    rt.release(registry);
    Ok(())
}

/// Convolve a cubemap with the cosine-weighted hemisphere integral.
///
/// Discretized with the fixed angular step [`IRRADIANCE_SAMPLE_DELTA`] on
/// both axes (midpoint rule), so the result is the true irradiance: a
/// constant-radiance input of L convolves to π·L.
pub(crate) fn convolve_irradiance(
    cube: ImageId,
    irradiance: ImageId,
    registry: &mut ImageRegistry,
) -> Result<()> {
    let (width, height) = registry
        .get(irradiance)
        .ok_or_else(|| missing_image("irradiance destination"))?
        .mip_dimensions(0);

    let phi_steps = (2.0 * PI / IRRADIANCE_SAMPLE_DELTA).round() as u32;
    let theta_steps = (0.5 * PI / IRRADIANCE_SAMPLE_DELTA).round() as u32;
    let d_phi = 2.0 * PI / phi_steps as f32;
    let d_theta = 0.5 * PI / theta_steps as f32;

    let mut rt = RenderTarget::new(width, height);
    let spec = AttachmentSpec::float_color(AttachmentSlot::Color0);

    for (layer, face) in CUBE_FACES.iter().enumerate() {
        rt.attach_existing_layer(spec, irradiance, layer as u32, 0, registry);
        rt.set_draw_targets();
        if layer == 0 {
            debug_assert!(rt.is_valid(registry));
        }
        if !rt.draw_targets().contains(&AttachmentSlot::Color0) {
            continue;
        }
        rt.bind();
        rt.set_viewport();

        let (src, dst) = registry
            .pair_mut(cube, irradiance)
            .ok_or_else(|| missing_image("cubemap source"))?;
        for y in 0..height {
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let v = (y as f32 + 0.5) / height as f32;
                let normal = face.texel_direction(u, v);
                let (tangent, bitangent) = tangent_basis(normal);

                let mut sum = Vec3::ZERO;
                for pi in 0..phi_steps {
                    let phi = (pi as f32 + 0.5) * d_phi;
                    for ti in 0..theta_steps {
                        let theta = (ti as f32 + 0.5) * d_theta;
                        let (sin_t, cos_t) = theta.sin_cos();
                        let dir = sin_t * phi.cos() * tangent
                            + sin_t * phi.sin() * bitangent
                            + cos_t * normal;
                        sum += src.sample_cube(dir) * cos_t * sin_t;
                    }
                }
                let e = sum * d_phi * d_theta;
                dst.put_texel(layer as u32, 0, x, y, &[e.x, e.y, e.z, 1.0]);
            }
        }
        rt.unbind();
        rt.detach(AttachmentSlot::Color0);
    }

    rt.release(registry);
    Ok(())
}

/// Build the GGX-prefiltered specular mip chain.
///
/// One pass per (mip, face) pair; mip `i` filters at roughness
/// `i / (mip_count - 1)` with [`PREFILTER_SAMPLE_COUNT`] importance samples
/// per texel. Uses the N = V = R approximation of the split-sum method.
pub(crate) fn prefilter_specular(
    cube: ImageId,
    prefiltered: ImageId,
    registry: &mut ImageRegistry,
) -> Result<()> {
    let mip_count = registry
        .get(prefiltered)
        .ok_or_else(|| missing_image("prefilter destination"))?
        .mip_count();

    for mip in 0..mip_count {
        let (width, height) = registry
            .get(prefiltered)
            .ok_or_else(|| missing_image("prefilter destination"))?
            .mip_dimensions(mip);
        let roughness = mip as f32 / (mip_count - 1).max(1) as f32;

        let mut rt = RenderTarget::new(width, height);
        let spec = AttachmentSpec::float_color(AttachmentSlot::Color0);

        for (layer, face) in CUBE_FACES.iter().enumerate() {
            rt.attach_existing_layer(spec, prefiltered, layer as u32, mip, registry);
            rt.set_draw_targets();
            if layer == 0 {
                debug_assert!(rt.is_valid(registry));
            }
            if !rt.draw_targets().contains(&AttachmentSlot::Color0) {
                continue;
            }
            rt.bind();
            rt.set_viewport();

            let (src, dst) = registry
                .pair_mut(cube, prefiltered)
                .ok_or_else(|| missing_image("cubemap source"))?;
            for y in 0..height {
                for x in 0..width {
                    let u = (x as f32 + 0.5) / width as f32;
                    let v = (y as f32 + 0.5) / height as f32;
                    let normal = face.texel_direction(u, v);
                    let c = prefilter_texel(src, normal, roughness);
                    dst.put_texel(layer as u32, mip, x, y, &[c.x, c.y, c.z, 1.0]);
                }
            }
            rt.unbind();
            rt.detach(AttachmentSlot::Color0);
        }

        rt.release(registry);
    }
    Ok(())
}

fn prefilter_texel(src: &crate::resources::ImageData, normal: Vec3, roughness: f32) -> Vec3 {
    if roughness <= f32::EPSILON {
        // Mip 0 is a mirror of the source.
        return src.sample_cube(normal);
    }

    let view = normal;
    let mut color = Vec3::ZERO;
    let mut weight = 0.0;
    for i in 0..PREFILTER_SAMPLE_COUNT {
        let xi = hammersley(i, PREFILTER_SAMPLE_COUNT);
        let half = importance_sample_ggx(xi, normal, roughness);
        let light = (2.0 * view.dot(half) * half - view).normalize();

        let n_dot_l = normal.dot(light);
        if n_dot_l > 0.0 {
            color += src.sample_cube(light) * n_dot_l;
            weight += n_dot_l;
        }
    }
    if weight > 0.0 {
        color / weight
    } else {
        src.sample_cube(normal)
    }
}

/// Integrate the split-sum BRDF lookup table.
///
/// Purely analytic — no scene inputs — so equal resolutions always produce
/// bit-identical output. U indexes N·V, V indexes roughness; the two
/// channels are the Fresnel scale and bias.
pub(crate) fn integrate_brdf(
    lut: ImageId,
    sample_count: u32,
    registry: &mut ImageRegistry,
) -> Result<()> {
    let (width, height) = registry
        .get(lut)
        .ok_or_else(|| missing_image("integration destination"))?
        .mip_dimensions(0);

    let mut rt = RenderTarget::new(width, height);
    let spec = AttachmentSpec {
        format: crate::resources::PixelFormat::Rg16F,
        ..AttachmentSpec::float_color(AttachmentSlot::Color0)
    };
    rt.attach_existing(spec, lut, registry);
    rt.set_draw_targets();
    debug_assert!(rt.is_valid(registry));
    if !rt.draw_targets().contains(&AttachmentSlot::Color0) {
        rt.release(registry);
        return Ok(());
    }
    rt.bind();
    rt.set_viewport();

    let dst = registry
        .get_mut(lut)
        .ok_or_else(|| missing_image("integration destination"))?;
    for y in 0..height {
        for x in 0..width {
            let n_dot_v = (x as f32 + 0.5) / width as f32;
            let roughness = (y as f32 + 0.5) / height as f32;
            let (scale, bias) = integrate_brdf_texel(n_dot_v, roughness, sample_count);
            dst.put_texel(0, 0, x, y, &[scale, bias]);
        }
    }

    rt.unbind();
    rt.release(registry);
    Ok(())
}

fn integrate_brdf_texel(n_dot_v: f32, roughness: f32, sample_count: u32) -> (f32, f32) {
    let normal = Vec3::Z;
    let view = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);

    let mut scale = 0.0;
    let mut bias = 0.0;
    for i in 0..sample_count {
        let xi = hammersley(i, sample_count);
        let half = importance_sample_ggx(xi, normal, roughness);
        let light = (2.0 * view.dot(half) * half - view).normalize();

        let n_dot_l = light.z.max(0.0);
        let n_dot_h = half.z.max(0.0);
        let v_dot_h = view.dot(half).max(0.0);
        if n_dot_l > 0.0 {
            let g = geometry_smith_ibl(n_dot_v, n_dot_l, roughness);
            let g_vis = g * v_dot_h / (n_dot_h * n_dot_v).max(1e-6);
            let fresnel = (1.0 - v_dot_h).powi(5);
            scale += (1.0 - fresnel) * g_vis;
            bias += fresnel * g_vis;
        }
    }
    (scale / sample_count as f32, bias / sample_count as f32)
}
