//! Resolution of texture ids into device textures.
//!
//! Textures are managed outside of the render front-end. Sprite layers refer to them
//! with plain `TextureId`s, which are resolved into device handles right before they
//! are bound. A texture that is not resolvable yet, for example because it is still
//! loading, is simply skipped.

use std::collections::HashMap;

use crate::device::TextureHandle;

/// The id of a texture, as known by sprite layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

pub trait TextureLookup {
    /// Gets the device texture of `id`, or `None` if it is not ready.
    fn resolve(&self, id: TextureId) -> Option<TextureHandle>;
}

impl<'a, T: TextureLookup + ?Sized> TextureLookup for &'a T {
    fn resolve(&self, id: TextureId) -> Option<TextureHandle> {
        (**self).resolve(id)
    }
}

/// A plain map from texture ids to device textures.
#[derive(Debug, Default, Clone)]
pub struct TextureTable {
    textures: HashMap<TextureId, TextureHandle>,
}

impl TextureTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers the device texture of `id`, returns the previous one if any.
    pub fn insert(&mut self, id: TextureId, handle: TextureHandle) -> Option<TextureHandle> {
        self.textures.insert(id, handle)
    }

    pub fn remove(&mut self, id: TextureId) -> Option<TextureHandle> {
        self.textures.remove(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureLookup for TextureTable {
    fn resolve(&self, id: TextureId) -> Option<TextureHandle> {
        self.textures.get(&id).cloned()
    }
}
