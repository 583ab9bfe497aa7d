//! Environment maps and the IBL precomputation pipeline.
//!
//! An [`EnvironmentMap`] owns the chain of images derived from one
//! equirectangular HDR source: the cubemap projection, the diffuse
//! irradiance convolution, the GGX-prefiltered specular mip chain, and the
//! split-sum BRDF lookup table. Derived maps are only valid while the image
//! they were computed from is; reloading the source or regenerating the
//! cubemap drops the stale derivatives outright — they are replaced, never
//! resized, since their resolutions are independent.
//!
//! Pipeline ordering is enforced internally: a pass requested before its
//! input stage exists returns [`BasaltError::EnvironmentState`] instead of
//! reading an uninitialized image.

mod passes;
pub mod sampling;

use std::path::Path;

use crate::errors::{BasaltError, Result};
use crate::resources::{load_hdr, ImageData, ImageId, ImageRegistry, PixelFormat};

use sampling::{BRDF_SAMPLE_COUNT, PREFILTER_MIP_LEVELS};

/// Which owned map a handle query or the background draw refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapKind {
    /// The flat equirectangular source preview.
    Equirectangular,
    /// The projected cubemap, drawn as the skybox.
    #[default]
    Skybox,
    /// The diffuse irradiance cubemap.
    Irradiance,
    /// The prefiltered specular chain, at the roughness preview level.
    Prefilter,
    /// The 2D BRDF lookup table.
    Integration,
}

/// The environment map: one HDR source and everything derived from it.
pub struct EnvironmentMap {
    equirect: Option<ImageId>,
    cubemap: Option<ImageId>,
    irradiance: Option<ImageId>,
    prefilter: Option<ImageId>,
    brdf_lut: Option<ImageId>,

    drawing: MapKind,
    gamma: f32,
    exposure: f32,
    roughness_preview: f32,
}

impl Default for EnvironmentMap {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentMap {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            equirect: None,
            cubemap: None,
            irradiance: None,
            prefilter: None,
            brdf_lut: None,
            drawing: MapKind::Skybox,
            gamma: 2.2,
            exposure: 1.0,
            roughness_preview: 0.0,
        }
    }

    // ========================================================================
    // Pipeline operations
    // ========================================================================

    /// Load an equirectangular HDR source from disk.
    ///
    /// On success every previously derived map is dropped (they all depend
    /// on the source); on failure the environment is untouched.
    pub fn load_equirectangular(&mut self, path: &Path, registry: &mut ImageRegistry) -> Result<()> {
        let image = load_hdr(path)?;
        self.set_equirectangular(image, registry);
        Ok(())
    }

    /// Replace the source with an already-decoded equirectangular image.
    pub fn set_equirectangular(&mut self, image: ImageData, registry: &mut ImageRegistry) {
        let id = registry.insert(image);
        Self::commit(&mut self.equirect, "environment.equirect", id, registry);
        self.drop_derived(registry, true);
    }

    /// Swap a freshly computed map into its slot: release the previous
    /// occupant and move the name index in the same step. Only called once
    /// the producing pass has succeeded, so a failed pass never disturbs
    /// the map already in place.
    fn commit(
        slot: &mut Option<ImageId>,
        name: &str,
        id: ImageId,
        registry: &mut ImageRegistry,
    ) {
        if let Some(old) = slot.replace(id) {
            registry.remove(old);
        }
        registry.set_name(name, id);
    }

    /// Project the source onto a fresh cubemap of the given face size.
    ///
    /// Replaces any previous cubemap and invalidates the irradiance and
    /// prefilter maps, whose resolutions depend on it.
    pub fn equirect_to_cubemap(
        &mut self,
        width: u32,
        height: u32,
        registry: &mut ImageRegistry,
    ) -> Result<()> {
        let equirect = self.equirect.ok_or(BasaltError::EnvironmentState {
            operation: "equirect_to_cubemap",
            missing: "an equirectangular source",
        })?;
        if width < 1 || height < 1 {
            return Err(BasaltError::InvalidDimensions { width, height });
        }

        let cube = registry.insert(ImageData::new_cube(width, height, PixelFormat::Rgba16F));
        if let Err(err) = passes::equirect_to_cube(equirect, cube, registry) {
            registry.remove(cube);
            return Err(err);
        }

        Self::commit(&mut self.cubemap, "environment.cubemap", cube, registry);
        self.drop_derived(registry, false);
        log::info!("Generated environment cubemap ({width}x{height} per face)");
        Ok(())
    }

    /// Convolve the cubemap into a diffuse irradiance cubemap.
    pub fn precompute_irradiance(
        &mut self,
        width: u32,
        height: u32,
        registry: &mut ImageRegistry,
    ) -> Result<()> {
        let cube = self.cubemap.ok_or(BasaltError::EnvironmentState {
            operation: "precompute_irradiance",
            missing: "a generated cubemap",
        })?;
        if width < 1 || height < 1 {
            return Err(BasaltError::InvalidDimensions { width, height });
        }

        let irradiance = registry.insert(ImageData::new_cube(width, height, PixelFormat::Rgba16F));
        if let Err(err) = passes::convolve_irradiance(cube, irradiance, registry) {
            registry.remove(irradiance);
            return Err(err);
        }

        Self::commit(
            &mut self.irradiance,
            "environment.irradiance",
            irradiance,
            registry,
        );
        log::info!("Precomputed irradiance map ({width}x{height} per face)");
        Ok(())
    }

    /// Build the prefiltered specular mip chain from the cubemap.
    pub fn precompute_specular(
        &mut self,
        width: u32,
        height: u32,
        registry: &mut ImageRegistry,
    ) -> Result<()> {
        let cube = self.cubemap.ok_or(BasaltError::EnvironmentState {
            operation: "precompute_specular",
            missing: "a generated cubemap",
        })?;
        if width < 1 || height < 1 {
            return Err(BasaltError::InvalidDimensions { width, height });
        }

        let prefiltered = registry.insert(ImageData::new_cube_mipped(
            width,
            height,
            PixelFormat::Rgba16F,
            PREFILTER_MIP_LEVELS,
        ));
        if let Err(err) = passes::prefilter_specular(cube, prefiltered, registry) {
            registry.remove(prefiltered);
            return Err(err);
        }

        Self::commit(
            &mut self.prefilter,
            "environment.prefilter",
            prefiltered,
            registry,
        );
        log::info!(
            "Prefiltered specular chain ({width}x{height}, {PREFILTER_MIP_LEVELS} mips)"
        );
        Ok(())
    }

    /// Integrate the split-sum BRDF lookup table.
    ///
    /// Source-independent and deterministic: equal resolutions give
    /// bit-identical output, and the table survives cubemap regeneration.
    pub fn precompute_integration(
        &mut self,
        width: u32,
        height: u32,
        registry: &mut ImageRegistry,
    ) -> Result<()> {
        if self.equirect.is_none() {
            return Err(BasaltError::EnvironmentState {
                operation: "precompute_integration",
                missing: "a loaded environment",
            });
        }
        if width < 1 || height < 1 {
            return Err(BasaltError::InvalidDimensions { width, height });
        }

        let lut = registry.insert(ImageData::new_2d(width, height, PixelFormat::Rg16F));
        if let Err(err) = passes::integrate_brdf(lut, BRDF_SAMPLE_COUNT, registry) {
            registry.remove(lut);
            return Err(err);
        }

        Self::commit(&mut self.brdf_lut, "environment.brdf_lut", lut, registry);
        log::info!("Integrated BRDF lookup table ({width}x{height})");
        Ok(())
    }

    /// Release every owned image and return to the empty state.
    pub fn unload(&mut self, registry: &mut ImageRegistry) {
        for id in [
            self.equirect.take(),
            self.cubemap.take(),
            self.irradiance.take(),
            self.prefilter.take(),
            self.brdf_lut.take(),
        ]
        .into_iter()
        .flatten()
        {
            registry.remove(id);
        }
        self.drawing = MapKind::Skybox;
        self.roughness_preview = 0.0;
    }

    /// Drop maps derived from the cubemap; with `all` set, also drop the
    /// cubemap and the BRDF table (a new source invalidates everything).
    fn drop_derived(&mut self, registry: &mut ImageRegistry, all: bool) {
        let mut stale = vec![self.irradiance.take(), self.prefilter.take()];
        if all {
            stale.push(self.cubemap.take());
            stale.push(self.brdf_lut.take());
        }
        for id in stale.into_iter().flatten() {
            registry.remove(id);
        }
    }

    // ========================================================================
    // State queries
    // ========================================================================

    /// Whether an equirectangular source is loaded.
    #[must_use]
    pub fn has_equirectangular(&self) -> bool {
        self.equirect.is_some()
    }

    /// Whether the cubemap projection exists.
    #[must_use]
    pub fn has_cubemap(&self) -> bool {
        self.cubemap.is_some()
    }

    /// Whether the irradiance convolution has run for the current cubemap.
    #[must_use]
    pub fn has_irradiance(&self) -> bool {
        self.irradiance.is_some()
    }

    /// Whether the prefiltered specular chain exists for the current cubemap.
    #[must_use]
    pub fn has_prefilter(&self) -> bool {
        self.prefilter.is_some()
    }

    /// Whether the BRDF lookup table has been integrated.
    #[must_use]
    pub fn has_integration(&self) -> bool {
        self.brdf_lut.is_some()
    }

    /// Handle of one of the owned maps, for GUI display.
    #[must_use]
    pub fn map_handle(&self, kind: MapKind) -> Option<ImageId> {
        match kind {
            MapKind::Equirectangular => self.equirect,
            MapKind::Skybox => self.cubemap,
            MapKind::Irradiance => self.irradiance,
            MapKind::Prefilter => self.prefilter,
            MapKind::Integration => self.brdf_lut,
        }
    }

    /// Highest mip level of the prefiltered chain (for roughness LOD).
    #[must_use]
    pub fn max_mip(&self) -> u32 {
        PREFILTER_MIP_LEVELS - 1
    }

    // ========================================================================
    // Display parameters
    // ========================================================================

    /// Which map the background draw currently shows. Setting one kind
    /// implicitly clears the others — the selector is exclusive by type.
    pub fn set_drawing(&mut self, kind: MapKind) {
        self.drawing = kind;
    }

    /// Currently displayed map.
    #[must_use]
    pub fn drawing(&self) -> MapKind {
        self.drawing
    }

    /// Display gamma.
    #[must_use]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Set the display gamma.
    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma;
    }

    /// Display exposure.
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Set the display exposure.
    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    /// Roughness used when previewing the prefiltered chain.
    #[must_use]
    pub fn roughness_preview(&self) -> f32 {
        self.roughness_preview
    }

    /// Set the prefilter preview roughness, clamped to [0, 1].
    pub fn set_roughness_preview(&mut self, roughness: f32) {
        self.roughness_preview = roughness.clamp(0.0, 1.0);
    }
}
