//! The editor's scene draw surface.
//!
//! The [`Viewport`] owns the render target the scene is drawn into each
//! frame: an HDR color plane the GUI displays as the viewport image, a
//! single-channel entity-ID plane read back for pointer picking, and a depth
//! attachment. It resizes reactively to follow the GUI's viewport panel and
//! skips degenerate sizes so a collapsed panel never produces a zero-sized
//! draw surface.

use glam::Vec4;

use crate::resources::{ImageId, ImageRegistry};
use crate::target::{AttachmentSlot, AttachmentSpec, RenderTarget};

/// ID-plane encoding: entity index plus one, so the cleared plane (zero)
/// reads back as "no entity".
const ID_OFFSET: f32 = 1.0;

/// The editor's main draw surface.
pub struct Viewport {
    target: RenderTarget,
}

impl Viewport {
    /// Create the viewport surface with the editor's canonical attachment
    /// set: float color at `Color0`, entity IDs at `Color1`, default depth.
    #[must_use]
    pub fn new(width: u32, height: u32, registry: &mut ImageRegistry) -> Self {
        let mut target = RenderTarget::new(width, height);
        target.attach(AttachmentSpec::float_color(AttachmentSlot::Color0), registry);
        target.attach(AttachmentSpec::id_color(AttachmentSlot::Color1), registry);
        target.attach(AttachmentSpec::default_depth(), registry);
        target.set_draw_targets();
        debug_assert!(target.is_valid(registry));
        Self { target }
    }

    /// Current surface dimensions.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    /// Follow the GUI panel size, resizing only when it actually changed
    /// and both dimensions are at least 1.
    pub fn sync_size(&mut self, width: u32, height: u32, registry: &mut ImageRegistry) {
        if width < 1 || height < 1 {
            return;
        }
        if (width, height) != self.target.size() {
            self.target.resize(width, height, registry);
        }
    }

    /// Clear the surface for a new frame.
    pub fn begin_frame(&mut self, registry: &mut ImageRegistry) {
        self.target.clear(registry);
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.target.set_clear_color(color);
    }

    /// Handle of the color plane, for the GUI's viewport image widget.
    #[must_use]
    pub fn color_handle(&self) -> Option<ImageId> {
        self.target.attachment_handle(AttachmentSlot::Color0)
    }

    /// Handle of the entity-ID plane.
    #[must_use]
    pub fn id_handle(&self) -> Option<ImageId> {
        self.target.attachment_handle(AttachmentSlot::Color1)
    }

    /// The underlying render target, for the draw loop.
    pub fn target_mut(&mut self) -> &mut RenderTarget {
        &mut self.target
    }

    /// Read the entity under a pointer position.
    ///
    /// One synchronous readback of the ID plane; the result is only valid
    /// for the frame it was read in. Returns `None` outside the surface or
    /// where no entity was drawn.
    #[must_use]
    pub fn pick(&self, x: u32, y: u32, registry: &ImageRegistry) -> Option<u32> {
        let raw = self
            .target
            .read_pixel(AttachmentSlot::Color1, x, y, registry)?;
        let id = raw.round() - ID_OFFSET;
        if id < 0.0 {
            None
        } else {
            Some(id as u32)
        }
    }

    /// Encode an entity index for storage in the ID plane.
    #[must_use]
    pub fn encode_id(entity: u32) -> f32 {
        entity as f32 + ID_OFFSET
    }

    /// Release the surface's attachments.
    pub fn release(&mut self, registry: &mut ImageRegistry) {
        self.target.release(registry);
    }
}
