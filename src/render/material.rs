//! Per-draw uniform values and texture bindings of a program.

use std::sync::Arc;

use crate::errors::*;
use crate::texture::TextureId;

use super::program::UniformLayout;
use super::MAX_TEXTURE_CHANNEL;

/// Identity of a material. Programs remember the identity of the last material applied
/// to them, instead of the material itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) u64);

/// `Material` holds the values of every uniform declared by one program, packed into a
/// flat float storage laid out by the program's uniform table, and the textures bound to
/// its channels.
///
/// Materials are created with `RenderState::init_material` and owned by the caller. They
/// stay valid only for the program load they were created against.
#[derive(Debug)]
pub struct Material {
    pub(crate) id: MaterialId,
    pub(crate) program: usize,
    pub(crate) generation: u32,
    pub(crate) layout: Arc<UniformLayout>,
    textures: [Option<TextureId>; MAX_TEXTURE_CHANNEL],
    values: Vec<f32>,
}

impl Material {
    /// Takes `storage` over, it must hold at least `layout.footprint()` floats.
    pub(crate) fn new(
        id: MaterialId,
        program: usize,
        generation: u32,
        layout: Arc<UniformLayout>,
        mut storage: Vec<f32>,
    ) -> Result<Self> {
        let required = layout.footprint();
        if storage.len() < required {
            return Err(Error::MaterialStorageTooSmall {
                required,
                actual: storage.len(),
            });
        }

        storage.truncate(required);
        for v in storage.iter_mut() {
            *v = 0.0;
        }

        Ok(Material {
            id,
            program,
            generation,
            layout,
            textures: [None; MAX_TEXTURE_CHANNEL],
            values: storage,
        })
    }

    #[inline]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// The program slot this material was created against.
    #[inline]
    pub fn program(&self) -> usize {
        self.program
    }

    /// The uniform table this material is laid out by.
    #[inline]
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Writes the value of uniform `index`. `values` must hold exactly as many floats
    /// as the declared type of the uniform, otherwise nothing is written.
    pub fn set_uniform(&mut self, index: usize, values: &[f32]) -> Result<()> {
        let uniform = *self.layout.get(index)?;
        if values.len() != uniform.size() {
            return Err(Error::UniformShapeMismatch {
                expected: uniform.size(),
                actual: values.len(),
            });
        }

        self.values[uniform.range()].copy_from_slice(values);
        Ok(())
    }

    /// The value of uniform `index`.
    pub fn uniform(&self, index: usize) -> Result<&[f32]> {
        let uniform = self.layout.get(index)?;
        Ok(&self.values[uniform.range()])
    }

    /// Binds a texture to `channel`, or unsets it with `None`.
    pub fn set_texture(&mut self, channel: usize, texture: Option<TextureId>) -> Result<()> {
        if channel >= MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(channel));
        }

        self.textures[channel] = texture;
        Ok(())
    }

    #[inline]
    pub fn texture(&self, channel: usize) -> Option<TextureId> {
        self.textures.get(channel).and_then(|v| *v)
    }

    #[inline]
    pub fn textures(&self) -> &[Option<TextureId>] {
        &self.textures
    }

    /// The packed values of all uniforms.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Gives the storage back.
    #[inline]
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}
