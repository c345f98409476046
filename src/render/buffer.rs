//! Quad accumulation buffers.

use crate::device::BufferHandle;
use crate::errors::*;
use crate::texture::TextureId;

use super::vertex::{self, Vertex, VertexPack};

/// A buffer of up to `capacity` quads, each made of 4 vertices.
///
/// The render state keeps one of these as the shared batch. Sprite layers could also
/// fill their own buffers once, upload them to the device and draw them repeatedly with
/// `RenderState::draw_buffer`.
#[derive(Debug)]
pub struct RenderBuffer {
    vertices: Vec<Vertex>,
    object: usize,
    capacity: usize,
    texture: Option<TextureId>,
    pub(crate) gpu: Option<BufferHandle>,
}

impl RenderBuffer {
    pub fn new(capacity: usize) -> Self {
        RenderBuffer {
            vertices: vec![Vertex::default(); capacity * 4],
            object: 0,
            capacity,
            texture: None,
            gpu: None,
        }
    }

    /// Appends one quad. Returns `true` if the buffer became full with it, in which
    /// case it must be drained before the next `add`.
    pub fn add(&mut self, quad: &[VertexPack; 4], color: u32, additive: u32) -> Result<bool> {
        if self.object >= self.capacity {
            return Err(Error::BufferOverflow(self.object, self.capacity));
        }

        let base = self.object * 4;
        for (i, v) in quad.iter().enumerate() {
            self.vertices[base + i] = Vertex::new(*v, color, additive);
        }

        self.object += 1;
        Ok(self.object >= self.capacity)
    }

    /// Drops every buffered quad, keeping the storage.
    #[inline]
    pub fn clear(&mut self) {
        self.object = 0;
    }

    /// Number of buffered quads.
    #[inline]
    pub fn object_count(&self) -> usize {
        self.object
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.object == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.object >= self.capacity
    }

    /// The vertices of buffered quads.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.object * 4]
    }

    /// The texture every quad of a pre-batched buffer samples from.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    #[inline]
    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        self.texture = texture;
    }

    /// The device vertex buffer, once uploaded.
    #[inline]
    pub fn gpu_buffer(&self) -> Option<BufferHandle> {
        self.gpu
    }

    /// Encodes the buffered vertices for upload into `bytes`.
    pub(crate) fn encode_into(&self, bytes: &mut Vec<u8>) {
        vertex::encode_vertices(self.vertices(), bytes);
    }
}
