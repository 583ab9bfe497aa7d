//! Render targets and attachment bookkeeping.

pub mod attachment;
pub mod render_target;

pub use attachment::{AttachmentSlot, AttachmentSpec, RenderBufferFormat};
pub use render_target::{ClearFlags, RenderTarget};
