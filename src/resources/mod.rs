//! Image resources: pixel formats, CPU-resident image storage, the image
//! registry capability, and HDR source loading.

pub mod format;
pub mod hdr;
pub mod image;
pub mod registry;

pub use format::{FilterMode, PixelFormat, WrapMode};
pub use hdr::load_hdr;
pub use image::{ImageData, ImageKind};
pub use registry::{ImageId, ImageRegistry};
