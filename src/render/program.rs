//! Shader programs and their uniform tables.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::device::{ShaderHandle, UniformFormat, UniformLocation};
use crate::errors::*;

use super::material::MaterialId;
use super::MAX_UNIFORM;

/// One typed uniform slot of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    pub location: UniformLocation,
    pub format: UniformFormat,
    /// Offset into the packed float storage of materials, in floats.
    pub offset: usize,
}

impl Uniform {
    #[inline]
    pub fn size(&self) -> usize {
        self.format.size()
    }

    /// The range of floats this uniform occupies in a material.
    #[inline]
    pub fn range(&self) -> ::std::ops::Range<usize> {
        self.offset..self.offset + self.size()
    }
}

/// The ordered uniform table of a program. Uniforms are packed back to back, the first
/// one starts at offset 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    uniforms: SmallVec<[Uniform; MAX_UNIFORM]>,
}

impl UniformLayout {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a uniform after the last one and returns its index.
    pub fn push(&mut self, location: UniformLocation, format: UniformFormat) -> Result<usize> {
        if self.uniforms.len() >= MAX_UNIFORM {
            return Err(Error::TooManyUniforms(MAX_UNIFORM));
        }

        let offset = self.footprint();
        self.uniforms.push(Uniform {
            location,
            format,
            offset,
        });

        Ok(self.uniforms.len() - 1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<&Uniform> {
        self.uniforms
            .get(index)
            .ok_or(Error::UniformOutOfRange(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> ::std::slice::Iter<Uniform> {
        self.uniforms.iter()
    }

    /// Number of floats a material needs to hold a value for every uniform.
    #[inline]
    pub fn footprint(&self) -> usize {
        self.uniforms.last().map(|v| v.offset + v.size()).unwrap_or(0)
    }
}

/// A slot of the program table.
#[derive(Debug, Default)]
pub(crate) struct Program {
    pub shader: Option<ShaderHandle>,
    /// Bumped on every load, tells materials of a replaced program apart.
    pub generation: u32,
    /// The scale/translate uniform used by pre-batched buffer draws.
    pub st: Option<UniformLocation>,
    pub texture_count: usize,
    /// Shared with materials, copied on write when uniforms are added afterwards.
    pub layout: Arc<UniformLayout>,
    pub bound_material: Option<MaterialId>,
}

impl Program {
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.shader.is_some()
    }
}
