#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Rendering core for a 3D scene editor: off-screen render target
//! management and the image-based-lighting precomputation pipeline.
//!
//! The crate owns the subsystem with real invariants — GPU-style resource
//! lifetimes, attachment bookkeeping, and the multi-pass environment map
//! derivation (equirectangular-to-cubemap projection, diffuse irradiance
//! convolution, GGX specular prefiltering, split-sum BRDF integration).
//! Windowing, the immediate-mode GUI, scene storage and serialization are
//! external collaborators that consume the handle-based boundary exposed
//! here.

pub mod environment;
pub mod errors;
pub mod resources;
pub mod target;
pub mod viewport;

pub use environment::{EnvironmentMap, MapKind};
pub use errors::{BasaltError, Result};
pub use resources::{ImageData, ImageId, ImageKind, ImageRegistry, PixelFormat};
pub use target::{AttachmentSlot, AttachmentSpec, RenderBufferFormat, RenderTarget};
pub use viewport::Viewport;
