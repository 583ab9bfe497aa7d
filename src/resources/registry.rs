//! Image registry.
//!
//! The registry is the single owner of all image storage. Components that
//! need images — render targets, the environment map, the editor viewport —
//! take the registry by reference as a capability instead of reaching for
//! process-wide state. [`ImageId`] keys double as the opaque handles the GUI
//! layer displays; a key stays valid until the image is removed, and stale
//! keys simply resolve to `None`.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use super::image::ImageData;

new_key_type! {
    /// Opaque handle to an image in the registry.
    pub struct ImageId;
}

/// Owner of all image storage, keyed by [`ImageId`] with an optional name
/// index for GUI-facing lookups.
#[derive(Default)]
pub struct ImageRegistry {
    images: SlotMap<ImageId, ImageData>,
    names: FxHashMap<String, ImageId>,
}

impl ImageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an image, returning its handle.
    pub fn insert(&mut self, image: ImageData) -> ImageId {
        self.images.insert(image)
    }

    /// Point a name at an existing image.
    ///
    /// Only the index entry moves; an image previously under the name stays
    /// alive for its owner to release.
    pub fn set_name(&mut self, name: &str, id: ImageId) {
        self.names.insert(name.to_string(), id);
    }

    /// Resolve a handle.
    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<&ImageData> {
        self.images.get(id)
    }

    /// Resolve a handle mutably.
    pub fn get_mut(&mut self, id: ImageId) -> Option<&mut ImageData> {
        self.images.get_mut(id)
    }

    /// Resolve two distinct handles, the first shared and the second
    /// mutable. Used by passes that sample one image while writing another.
    pub fn pair_mut(&mut self, src: ImageId, dst: ImageId) -> Option<(&ImageData, &mut ImageData)> {
        let [a, b] = self.images.get_disjoint_mut([src, dst])?;
        Some((&*a, b))
    }

    /// Remove an image. Any name entries pointing at it are dropped too.
    pub fn remove(&mut self, id: ImageId) -> Option<ImageData> {
        let removed = self.images.remove(id);
        if removed.is_some() {
            self.names.retain(|_, v| *v != id);
        }
        removed
    }

    /// Look up a named image.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ImageId> {
        self.names.get(name).copied()
    }

    /// Number of live images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the registry holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
