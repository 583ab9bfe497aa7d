//! CPU-resident images.
//!
//! An [`ImageData`] is the backing store for every render destination and
//! sampled source in the crate: 2D planes (color, depth, lookup tables) and
//! six-layer cubemaps, each with an optional mip chain. Texels are stored as
//! `f32` channels regardless of format; the format governs channel count and
//! quantization on store.
//!
//! Sampling follows the usual conventions: normalized UV with the texel
//! center at `(x + 0.5) / width`, bilinear filtering, direction-based lookup
//! for equirectangular and cube sources.

use glam::{Vec2, Vec3, Vec4};

use super::format::{PixelFormat, WrapMode};

/// Dimensionality of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// A single 2D plane per mip.
    D2,
    /// Six layers per mip, one per cube face.
    Cube,
}

impl ImageKind {
    /// Number of array layers per mip level.
    #[must_use]
    pub fn layer_count(self) -> usize {
        match self {
            ImageKind::D2 => 1,
            ImageKind::Cube => 6,
        }
    }
}

/// A CPU-resident image: 2D or cube, with an optional mip chain.
///
/// `levels[mip][layer]` holds one texel plane of `width >> mip` by
/// `height >> mip` texels (clamped to 1), `channel_count` floats each.
#[derive(Debug, Clone)]
pub struct ImageData {
    kind: ImageKind,
    width: u32,
    height: u32,
    format: PixelFormat,
    mip_count: u32,
    levels: Vec<Vec<Vec<f32>>>,
}

impl ImageData {
    /// Create a zero-filled 2D image with a single mip level.
    #[must_use]
    pub fn new_2d(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(ImageKind::D2, width, height, format, 1)
    }

    /// Create a zero-filled cubemap with a single mip level.
    #[must_use]
    pub fn new_cube(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(ImageKind::Cube, width, height, format, 1)
    }

    /// Create a zero-filled cubemap with `mip_count` mip levels.
    #[must_use]
    pub fn new_cube_mipped(width: u32, height: u32, format: PixelFormat, mip_count: u32) -> Self {
        Self::new(ImageKind::Cube, width, height, format, mip_count)
    }

    fn new(kind: ImageKind, width: u32, height: u32, format: PixelFormat, mip_count: u32) -> Self {
        let mut image = Self {
            kind,
            width,
            height,
            format,
            mip_count: mip_count.max(1),
            levels: Vec::new(),
        };
        image.allocate();
        image
    }

    fn allocate(&mut self) {
        let channels = self.format.channel_count();
        let layers = self.kind.layer_count();
        self.levels = (0..self.mip_count)
            .map(|mip| {
                let (w, h) = self.mip_dimensions(mip);
                (0..layers)
                    .map(|_| vec![0.0; w as usize * h as usize * channels])
                    .collect()
            })
            .collect();
    }

    /// Image kind.
    #[must_use]
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Base-level width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Base-level height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of mip levels.
    #[must_use]
    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    /// Dimensions of a mip level (each axis halves per level, floor 1).
    #[must_use]
    pub fn mip_dimensions(&self, mip: u32) -> (u32, u32) {
        ((self.width >> mip).max(1), (self.height >> mip).max(1))
    }

    /// Reallocate storage in place, preserving kind, format and mip
    /// structure. All texels are zeroed.
    pub fn realloc(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.allocate();
    }

    /// Borrow one texel plane.
    #[must_use]
    pub fn plane(&self, layer: u32, mip: u32) -> &[f32] {
        &self.levels[mip as usize][layer as usize]
    }

    /// Read one texel. Out-of-range coordinates return `None`.
    #[must_use]
    pub fn texel(&self, layer: u32, mip: u32, x: u32, y: u32) -> Option<&[f32]> {
        let (w, h) = self.mip_dimensions(mip);
        if x >= w || y >= h || mip >= self.mip_count {
            return None;
        }
        let channels = self.format.channel_count();
        let idx = (y as usize * w as usize + x as usize) * channels;
        Some(&self.levels[mip as usize][layer as usize][idx..idx + channels])
    }

    /// Write one texel. Extra input channels are dropped, missing ones are
    /// left untouched. Byte formats quantize to 8-bit steps.
    pub fn put_texel(&mut self, layer: u32, mip: u32, x: u32, y: u32, value: &[f32]) {
        let (w, h) = self.mip_dimensions(mip);
        if x >= w || y >= h || mip >= self.mip_count {
            return;
        }
        let channels = self.format.channel_count();
        let quantize = !self.format.is_float();
        let idx = (y as usize * w as usize + x as usize) * channels;
        let plane = &mut self.levels[mip as usize][layer as usize];
        for (c, &v) in value.iter().take(channels).enumerate() {
            plane[idx + c] = if quantize {
                (v.clamp(0.0, 1.0) * 255.0).round() / 255.0
            } else {
                v
            };
        }
    }

    /// Fill every plane of every mip with a constant texel.
    pub fn fill(&mut self, value: &[f32]) {
        let channels = self.format.channel_count();
        let quantize = !self.format.is_float();
        for mip_planes in &mut self.levels {
            for plane in mip_planes {
                for (i, texel) in plane.iter_mut().enumerate() {
                    let v = value[i % channels];
                    *texel = if quantize {
                        (v.clamp(0.0, 1.0) * 255.0).round() / 255.0
                    } else {
                        v
                    };
                }
            }
        }
    }

    fn fetch(&self, layer: u32, mip: u32, x: i64, y: i64) -> Vec4 {
        let (w, h) = self.mip_dimensions(mip);
        let x = x.clamp(0, i64::from(w) - 1) as u32;
        let y = y.clamp(0, i64::from(h) - 1) as u32;
        let t = self.texel(layer, mip, x, y).unwrap_or(&[]);
        Vec4::new(
            t.first().copied().unwrap_or(0.0),
            t.get(1).copied().unwrap_or(0.0),
            t.get(2).copied().unwrap_or(0.0),
            t.get(3).copied().unwrap_or(1.0),
        )
    }

    /// Bilinear sample of one plane at normalized UV, all four channels.
    ///
    /// Formats without an alpha channel sample as opaque.
    #[must_use]
    pub fn sample_bilinear_rgba(
        &self,
        layer: u32,
        mip: u32,
        uv: Vec2,
        wrap_s: WrapMode,
        wrap_t: WrapMode,
    ) -> Vec4 {
        let (w, h) = self.mip_dimensions(mip);
        let u = wrap_s.apply(uv.x);
        let v = wrap_t.apply(uv.y);

        // Texel space with centers at half offsets.
        let fx = u * w as f32 - 0.5;
        let fy = v * h as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let (x0, y0) = (x0 as i64, y0 as i64);
        let wrap_axis = |coord: i64, extent: u32, mode: WrapMode| -> i64 {
            match mode {
                WrapMode::Repeat => coord.rem_euclid(i64::from(extent)),
                _ => coord,
            }
        };
        let xs = [wrap_axis(x0, w, wrap_s), wrap_axis(x0 + 1, w, wrap_s)];
        let ys = [wrap_axis(y0, h, wrap_t), wrap_axis(y0 + 1, h, wrap_t)];
        let c00 = self.fetch(layer, mip, xs[0], ys[0]);
        let c10 = self.fetch(layer, mip, xs[1], ys[0]);
        let c01 = self.fetch(layer, mip, xs[0], ys[1]);
        let c11 = self.fetch(layer, mip, xs[1], ys[1]);

        let top = c00.lerp(c10, tx);
        let bottom = c01.lerp(c11, tx);
        top.lerp(bottom, ty)
    }

    /// Bilinear sample of one plane at normalized UV, RGB only.
    #[must_use]
    pub fn sample_bilinear(
        &self,
        layer: u32,
        mip: u32,
        uv: Vec2,
        wrap_s: WrapMode,
        wrap_t: WrapMode,
    ) -> Vec3 {
        self.sample_bilinear_rgba(layer, mip, uv, wrap_s, wrap_t)
            .truncate()
    }

    /// Sample an equirectangular 2D source by direction.
    ///
    /// Longitude wraps, latitude clamps at the poles.
    #[must_use]
    pub fn sample_equirect(&self, dir: Vec3) -> Vec3 {
        let dir = dir.normalize_or_zero();
        let u = dir.z.atan2(dir.x) / (2.0 * std::f32::consts::PI) + 0.5;
        let v = dir.y.clamp(-1.0, 1.0).acos() / std::f32::consts::PI;
        self.sample_bilinear(0, 0, Vec2::new(u, v), WrapMode::Repeat, WrapMode::ClampToEdge)
    }

    /// Sample a cubemap by direction at the base mip level.
    #[must_use]
    pub fn sample_cube(&self, dir: Vec3) -> Vec3 {
        self.sample_cube_lod(dir, 0)
    }

    /// Sample a cubemap by direction at a given mip level.
    ///
    /// Face selection picks the face whose forward axis is closest to the
    /// direction, then projects onto that face's plane — the inverse of the
    /// face table used when the cubemap was rendered.
    #[must_use]
    pub fn sample_cube_lod(&self, dir: Vec3, mip: u32) -> Vec3 {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let faces = crate::environment::sampling::CUBE_FACES;
        let mut best = 0;
        let mut best_dot = f32::MIN;
        for (i, face) in faces.iter().enumerate() {
            let d = dir.dot(face.forward);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }

        let face = &faces[best];
        let p = dir / best_dot.max(1e-6);
        let u = (p.dot(face.right()) + 1.0) * 0.5;
        let v = (p.dot(face.up) + 1.0) * 0.5;
        self.sample_bilinear(
            best as u32,
            mip,
            Vec2::new(u, v),
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn bilinear_repeat_wraps_both_axes() {
        let mut image = ImageData::new_2d(2, 2, PixelFormat::Rgba32F);
        image.put_texel(0, 0, 0, 0, &[0.0, 0.0, 0.0, 1.0]);
        image.put_texel(0, 0, 1, 0, &[1.0, 0.0, 0.0, 1.0]);
        image.put_texel(0, 0, 0, 1, &[2.0, 0.0, 0.0, 1.0]);
        image.put_texel(0, 0, 1, 1, &[3.0, 0.0, 0.0, 1.0]);

        // The corner sample sits between all four texels under tiling, on
        // both axes, so it must average them.
        let c = image.sample_bilinear(
            0,
            0,
            Vec2::new(0.0, 0.0),
            WrapMode::Repeat,
            WrapMode::Repeat,
        );
        assert!((c.x - 1.5).abs() < EPSILON, "got {}", c.x);
    }

    #[test]
    fn bilinear_clamp_holds_the_edge_texel() {
        let mut image = ImageData::new_2d(2, 2, PixelFormat::Rgba32F);
        image.put_texel(0, 0, 0, 0, &[4.0, 0.0, 0.0, 1.0]);

        let c = image.sample_bilinear(
            0,
            0,
            Vec2::new(-1.0, -1.0),
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        );
        assert!((c.x - 4.0).abs() < EPSILON);
    }

    #[test]
    fn rgba_sampling_carries_alpha_and_defaults_opaque() {
        let mut rgba = ImageData::new_2d(2, 2, PixelFormat::Rgba32F);
        rgba.fill(&[0.5, 0.5, 0.5, 0.25]);
        let c = rgba.sample_bilinear_rgba(
            0,
            0,
            Vec2::new(0.5, 0.5),
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        );
        assert!((c.w - 0.25).abs() < EPSILON);

        let mut single = ImageData::new_2d(2, 2, PixelFormat::R32F);
        single.fill(&[0.7]);
        let c = single.sample_bilinear_rgba(
            0,
            0,
            Vec2::new(0.5, 0.5),
            WrapMode::ClampToEdge,
            WrapMode::ClampToEdge,
        );
        assert!((c.w - 1.0).abs() < EPSILON);
    }
}
