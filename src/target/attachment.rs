//! Attachment slots and specifications.
//!
//! An [`AttachmentSpec`] is a declarative, immutable descriptor consumed
//! when an attachment image is created; the render target keeps it so the
//! image can be recreated with identical parameters on resize. The factory
//! presets mirror the handful of combinations the editor actually uses.

use crate::resources::{FilterMode, PixelFormat, WrapMode};

/// Binding point of an attachment on a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttachmentSlot {
    Color0,
    Color1,
    Color2,
    Color3,
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentSlot {
    /// Whether this slot receives fragment color output.
    #[must_use]
    pub fn is_color(self) -> bool {
        matches!(
            self,
            AttachmentSlot::Color0
                | AttachmentSlot::Color1
                | AttachmentSlot::Color2
                | AttachmentSlot::Color3
        )
    }
}

/// Declarative descriptor for creating an attachment image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentSpec {
    /// Binding point on the target.
    pub slot: AttachmentSlot,
    /// Internal format of the created image.
    pub format: PixelFormat,
    /// Horizontal wrap mode.
    pub wrap_s: WrapMode,
    /// Vertical wrap mode.
    pub wrap_t: WrapMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
}

impl AttachmentSpec {
    /// Default 8-bit color attachment.
    #[must_use]
    pub fn default_color(slot: AttachmentSlot) -> Self {
        Self {
            slot,
            format: PixelFormat::Rgb8,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }

    /// Floating-point HDR color attachment.
    #[must_use]
    pub fn float_color(slot: AttachmentSlot) -> Self {
        Self {
            slot,
            format: PixelFormat::Rgba16F,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }

    /// Single-channel float attachment for entity-ID picking.
    #[must_use]
    pub fn id_color(slot: AttachmentSlot) -> Self {
        Self {
            slot,
            format: PixelFormat::R32F,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
        }
    }

    /// Default depth attachment.
    #[must_use]
    pub fn default_depth() -> Self {
        Self {
            slot: AttachmentSlot::Depth,
            format: PixelFormat::Depth32F,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
        }
    }
}

/// Storage format of a combined render buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBufferFormat {
    Depth24,
    Depth32F,
    Stencil8,
    Depth24Stencil8,
}

impl RenderBufferFormat {
    /// Whether the buffer stores depth.
    #[must_use]
    pub fn has_depth(self) -> bool {
        matches!(
            self,
            RenderBufferFormat::Depth24
                | RenderBufferFormat::Depth32F
                | RenderBufferFormat::Depth24Stencil8
        )
    }

    /// Whether the buffer stores stencil.
    #[must_use]
    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            RenderBufferFormat::Stencil8 | RenderBufferFormat::Depth24Stencil8
        )
    }
}
