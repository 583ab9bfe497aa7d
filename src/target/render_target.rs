//! Off-screen render targets.
//!
//! A [`RenderTarget`] owns an off-screen draw destination: an ordered set of
//! image attachments addressed by slot, plus at most one combined
//! depth/stencil render buffer. Attachments are either owned (created by the
//! target from a spec, released with it) or shared (a caller-owned image
//! bound by handle — the target never releases it). Every attachment must
//! match the target's dimensions at its addressed mip level.
//!
//! Structurally invalid operations — dimension mismatch, duplicate render
//! buffer, unknown slot — log a warning and leave the target in its prior
//! state; they are not `Result`s because the caller cannot fix them by
//! handling an error, only by changing the call.

use bitflags::bitflags;
use glam::Vec4;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::resources::{ImageData, ImageId, ImageRegistry};

use super::attachment::{AttachmentSlot, AttachmentSpec, RenderBufferFormat};

bitflags! {
    /// Aggregate clear mask accumulated from the attachment set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClearFlags: u32 {
        const COLOR = 1;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// One attachment binding: the spec it was created from, the image handle,
/// the addressed layer/mip, the ownership tag, and whether the binding is
/// currently active.
#[derive(Debug, Clone)]
struct AttachmentEntry {
    spec: AttachmentSpec,
    image: ImageId,
    layer: u32,
    mip: u32,
    owned: bool,
    bound: bool,
}

/// Combined depth/stencil render buffer. Write-only storage: it can be
/// cleared and resized but never sampled or read back.
#[derive(Debug, Clone, Copy)]
struct RenderBuffer {
    format: RenderBufferFormat,
    width: u32,
    height: u32,
}

/// An off-screen render destination.
pub struct RenderTarget {
    width: u32,
    height: u32,
    attachments: BTreeMap<AttachmentSlot, AttachmentEntry>,
    render_buffer: Option<RenderBuffer>,
    draw_targets: SmallVec<[AttachmentSlot; 4]>,
    clear_flags: ClearFlags,
    clear_color: Vec4,
}

impl RenderTarget {
    /// Create a target with no attachments.
    ///
    /// # Panics
    /// Zero width or height is a programmer error and asserts.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width >= 1 && height >= 1,
            "render target dimensions must be at least 1x1 (got {width}x{height})"
        );
        Self {
            width,
            height,
            attachments: BTreeMap::new(),
            render_buffer: None,
            draw_targets: SmallVec::new(),
            clear_flags: ClearFlags::empty(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Current dimensions.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Set the color used by [`RenderTarget::clear`].
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// Accumulated clear mask.
    #[must_use]
    pub fn clear_flags(&self) -> ClearFlags {
        self.clear_flags
    }

    fn accumulate_clear_flags(&mut self, slot: AttachmentSlot) {
        self.clear_flags |= match slot {
            AttachmentSlot::Depth => ClearFlags::DEPTH,
            AttachmentSlot::Stencil => ClearFlags::STENCIL,
            AttachmentSlot::DepthStencil => ClearFlags::DEPTH | ClearFlags::STENCIL,
            _ => ClearFlags::COLOR,
        };
    }

    /// Swap an entry into a slot, releasing the previous occupant's image in
    /// the same step if the target owned it. The slot is never left empty
    /// between the two halves of a replace.
    fn swap_entry(&mut self, entry: AttachmentEntry, registry: &mut ImageRegistry) {
        let slot = entry.spec.slot;
        if let Some(old) = self.attachments.insert(slot, entry) {
            if old.owned {
                registry.remove(old.image);
            }
        }
        self.accumulate_clear_flags(slot);
    }

    /// Create and bind a new image sized to the target, per `spec`.
    ///
    /// Replaces any existing attachment in the spec's slot; a previously
    /// owned image is released, a shared one is merely unbound.
    pub fn attach(&mut self, spec: AttachmentSpec, registry: &mut ImageRegistry) {
        let image = registry.insert(ImageData::new_2d(self.width, self.height, spec.format));
        self.swap_entry(
            AttachmentEntry {
                spec,
                image,
                layer: 0,
                mip: 0,
                owned: true,
                bound: true,
            },
            registry,
        );
    }

    /// Bind a caller-owned image without transferring ownership.
    ///
    /// No-ops with a warning if the image is missing or its dimensions do
    /// not match the target's; the slot's previous occupant stays bound.
    pub fn attach_existing(
        &mut self,
        spec: AttachmentSpec,
        image: ImageId,
        registry: &mut ImageRegistry,
    ) {
        self.attach_existing_layer(spec, image, 0, 0, registry);
    }

    /// Bind one layer/mip of a caller-owned image (a cube face or a mip of
    /// a prefiltered chain) without transferring ownership.
    pub fn attach_existing_layer(
        &mut self,
        spec: AttachmentSpec,
        image: ImageId,
        layer: u32,
        mip: u32,
        registry: &mut ImageRegistry,
    ) {
        let Some(data) = registry.get(image) else {
            log::warn!("Cannot attach: image handle is no longer in the registry");
            return;
        };
        if layer >= data.kind().layer_count() as u32 || mip >= data.mip_count() {
            log::warn!(
                "Cannot attach: layer {layer} / mip {mip} out of range for the supplied image"
            );
            return;
        }
        let (w, h) = data.mip_dimensions(mip);
        if w != self.width || h != self.height {
            log::warn!(
                "Cannot attach: image is {w}x{h} at mip {mip}, target is {}x{}",
                self.width,
                self.height
            );
            return;
        }
        self.swap_entry(
            AttachmentEntry {
                spec,
                image,
                layer,
                mip,
                owned: false,
                bound: true,
            },
            registry,
        );
    }

    /// Create the combined depth/stencil render buffer.
    ///
    /// At most one per target; a second call no-ops with a warning.
    pub fn attach_render_buffer(&mut self, format: RenderBufferFormat) {
        if self.render_buffer.is_some() {
            log::warn!("This render target already has a render buffer");
            return;
        }
        self.render_buffer = Some(RenderBuffer {
            format,
            width: self.width,
            height: self.height,
        });
        if format.has_depth() {
            self.clear_flags |= ClearFlags::DEPTH;
        }
        if format.has_stencil() {
            self.clear_flags |= ClearFlags::STENCIL;
        }
    }

    /// Whether a render buffer is present.
    #[must_use]
    pub fn has_render_buffer(&self) -> bool {
        self.render_buffer.is_some()
    }

    /// Format of the render buffer, if present.
    #[must_use]
    pub fn render_buffer_format(&self) -> Option<RenderBufferFormat> {
        self.render_buffer.map(|rb| rb.format)
    }

    /// Deactivate a slot's binding without touching its image.
    pub fn detach(&mut self, slot: AttachmentSlot) {
        match self.attachments.get_mut(&slot) {
            Some(entry) => entry.bound = false,
            None => log::warn!("Cannot detach: no attachment in slot {slot:?}"),
        }
    }

    /// Reactivate a previously detached slot.
    pub fn reattach(&mut self, slot: AttachmentSlot) {
        match self.attachments.get_mut(&slot) {
            Some(entry) => entry.bound = true,
            None => log::warn!("Cannot reattach: no attachment in slot {slot:?}"),
        }
    }

    /// Declare which color slots receive fragment output, from the current
    /// bound attachment set. Call again after any attachment-set change.
    pub fn set_draw_targets(&mut self) {
        self.draw_targets = self
            .attachments
            .iter()
            .filter(|(slot, entry)| slot.is_color() && entry.bound)
            .map(|(slot, _)| *slot)
            .collect();
    }

    /// Color slots currently receiving output.
    #[must_use]
    pub fn draw_targets(&self) -> &[AttachmentSlot] {
        &self.draw_targets
    }

    /// Make this target the active draw destination.
    ///
    /// Draw state lives in the registry images themselves, so there is no
    /// device context to switch; the bind/unbind pair is the seam the
    /// editor's draw loop drives around each pass.
    pub fn bind(&self) {
        log::trace!("Binding {}x{} render target", self.width, self.height);
    }

    /// Release this target as the active draw destination.
    pub fn unbind(&self) {}

    /// Map the draw extent to the target's current dimensions.
    pub fn set_viewport(&self) {
        log::trace!("Draw extent set to {}x{}", self.width, self.height);
    }

    /// Handle of the image attached at a slot, for GUI display or sharing.
    #[must_use]
    pub fn attachment_handle(&self, slot: AttachmentSlot) -> Option<ImageId> {
        self.attachments.get(&slot).map(|entry| entry.image)
    }

    /// The spec an attachment was created from.
    #[must_use]
    pub fn attachment_spec(&self, slot: AttachmentSlot) -> Option<&AttachmentSpec> {
        self.attachments.get(&slot).map(|entry| &entry.spec)
    }

    /// Addressed (layer, mip) of an attachment.
    #[must_use]
    pub fn attachment_level(&self, slot: AttachmentSlot) -> Option<(u32, u32)> {
        self.attachments.get(&slot).map(|entry| (entry.layer, entry.mip))
    }

    /// Update dimensions and reallocate every owned attachment and the
    /// render buffer in place. Handles stay stable; shared attachments are
    /// left to their owner.
    ///
    /// Zero dimensions are permitted transiently; drawing to a zero-sized
    /// target is the caller's responsibility to avoid.
    pub fn resize(&mut self, width: u32, height: u32, registry: &mut ImageRegistry) {
        self.width = width;
        self.height = height;
        for entry in self.attachments.values() {
            if !entry.owned {
                continue;
            }
            if let Some(image) = registry.get_mut(entry.image) {
                image.realloc(width, height);
            }
        }
        if let Some(rb) = &mut self.render_buffer {
            rb.width = width;
            rb.height = height;
        }
    }

    /// Clear all bound attachments per the aggregate clear mask: the stored
    /// clear color for color slots, depth 1.0 and stencil 0 for the rest.
    pub fn clear(&mut self, registry: &mut ImageRegistry) {
        let color = self.clear_color.to_array();
        for entry in self.attachments.values() {
            if !entry.bound {
                continue;
            }
            let Some(image) = registry.get_mut(entry.image) else {
                continue;
            };
            let value: &[f32] = if entry.spec.slot.is_color() {
                if !self.clear_flags.contains(ClearFlags::COLOR) {
                    continue;
                }
                &color
            } else {
                if !self.clear_flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
                    continue;
                }
                &[1.0, 0.0]
            };
            let (w, h) = image.mip_dimensions(entry.mip);
            for y in 0..h {
                for x in 0..w {
                    image.put_texel(entry.layer, entry.mip, x, y, value);
                }
            }
        }
    }

    /// Copy one attachment into the equivalent attachment of another target,
    /// scaling as needed: nearest-neighbor for depth/stencil, linear for
    /// color. Missing attachments on either side no-op with a warning.
    pub fn blit_to(&self, other: &RenderTarget, slot: AttachmentSlot, registry: &mut ImageRegistry) {
        let (Some(src), Some(dst)) = (self.attachments.get(&slot), other.attachments.get(&slot))
        else {
            log::warn!("Cannot blit: slot {slot:?} missing on source or destination");
            return;
        };
        if src.image == dst.image {
            return;
        }
        let Some((src_img, dst_img)) = registry.pair_mut(src.image, dst.image) else {
            log::warn!("Cannot blit: attachment image missing from the registry");
            return;
        };

        let (sw, sh) = src_img.mip_dimensions(src.mip);
        let (dw, dh) = dst_img.mip_dimensions(dst.mip);
        let nearest = !slot.is_color();
        for y in 0..dh {
            for x in 0..dw {
                let u = (x as f32 + 0.5) / dw as f32;
                let v = (y as f32 + 0.5) / dh as f32;
                let texel = if nearest {
                    let sx = ((u * sw as f32) as u32).min(sw.saturating_sub(1));
                    let sy = ((v * sh as f32) as u32).min(sh.saturating_sub(1));
                    src_img
                        .texel(src.layer, src.mip, sx, sy)
                        .map(<[f32]>::to_vec)
                        .unwrap_or_default()
                } else {
                    let c = src_img.sample_bilinear_rgba(
                        src.layer,
                        src.mip,
                        glam::Vec2::new(u, v),
                        crate::resources::WrapMode::ClampToEdge,
                        crate::resources::WrapMode::ClampToEdge,
                    );
                    vec![c.x, c.y, c.z, c.w]
                };
                dst_img.put_texel(dst.layer, dst.mip, x, y, &texel);
            }
        }
    }

    /// Synchronous read of one texel's first channel.
    ///
    /// The object-picking hook: deliberately synchronous, at most one call
    /// per frame per picking request, result valid for that frame only.
    #[must_use]
    pub fn read_pixel(
        &self,
        slot: AttachmentSlot,
        x: u32,
        y: u32,
        registry: &ImageRegistry,
    ) -> Option<f32> {
        let entry = self.attachments.get(&slot)?;
        let image = registry.get(entry.image)?;
        image
            .texel(entry.layer, entry.mip, x, y)
            .and_then(|t| t.first().copied())
    }

    /// Whether the attachment combination is acceptable for drawing.
    ///
    /// Requires at least one attachment or render buffer, every attached
    /// image alive and matching the target's dimensions at its addressed
    /// mip, and at most one depth source (depth-family attachment or render
    /// buffer, not both). Surfaced as a query: callers check once after
    /// assembling a complex attachment set.
    #[must_use]
    pub fn is_valid(&self, registry: &ImageRegistry) -> bool {
        if self.attachments.is_empty() && self.render_buffer.is_none() {
            log::warn!("Render target has no attachments");
            return false;
        }
        let mut depth_sources = usize::from(self.render_buffer.is_some());
        for (slot, entry) in &self.attachments {
            let Some(image) = registry.get(entry.image) else {
                log::warn!("Attachment in slot {slot:?} is gone from the registry");
                return false;
            };
            if image.mip_dimensions(entry.mip) != (self.width, self.height) {
                log::warn!("Attachment in slot {slot:?} does not match the target dimensions");
                return false;
            }
            if !slot.is_color() {
                depth_sources += 1;
            }
        }
        if depth_sources > 1 {
            log::warn!("Render target has more than one depth/stencil source");
            return false;
        }
        true
    }

    /// Release every owned attachment image and reset the attachment set.
    ///
    /// Shared images are left alone — their creator is responsible for
    /// them. Must be called before the target is dropped; the target cannot
    /// reach the registry from `Drop`.
    pub fn release(&mut self, registry: &mut ImageRegistry) {
        for entry in self.attachments.values() {
            if entry.owned {
                registry.remove(entry.image);
            }
        }
        self.attachments.clear();
        self.render_buffer = None;
        self.draw_targets.clear();
        self.clear_flags = ClearFlags::empty();
    }
}
