//! The video device underneath the render front-end. A backend should be responsible
//! for only one thing: turning these calls into low-level video API calls.
//!
//! Devices are stateful the same way an OpenGL context is: uniforms are uploaded into
//! the bound shader, and draw calls read from the bound buffers, layout and textures.

pub mod headless;
mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

pub use self::types::*;

use crate::errors::*;

pub trait Device {
    /// Creates a buffer holding `len` elements of `stride` bytes each. `data`, if any,
    /// fills the buffer from the beginning.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        stride: usize,
        len: usize,
        data: Option<&[u8]>,
    ) -> Result<BufferHandle>;

    /// Replaces the leading bytes of a buffer.
    fn update_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()>;

    fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()>;

    /// Registers how the attributes are laid out in one vertex record.
    fn create_vertex_layout(
        &mut self,
        attributes: &[VertexAttribute],
        stride: usize,
    ) -> Result<LayoutHandle>;

    fn delete_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()>;

    /// Compiles and links a shader program from vertex and fragment sources.
    fn create_shader(&mut self, vs: &str, fs: &str) -> Result<ShaderHandle>;

    fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()>;

    /// Binds a shader, or unbinds any with `None`.
    fn bind_shader(&mut self, handle: Option<ShaderHandle>) -> Result<()>;

    /// Looks up a uniform variable of the bound shader by name.
    fn uniform_location(&mut self, name: &str) -> Option<UniformLocation>;

    /// Uploads a uniform into the bound shader, `v` holds exactly `format.size()` floats.
    fn set_uniform(
        &mut self,
        location: UniformLocation,
        format: UniformFormat,
        v: &[f32],
    ) -> Result<()>;

    fn set_uniform_i32(&mut self, location: UniformLocation, v: i32) -> Result<()>;

    fn bind_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()>;

    fn bind_vertex_buffer(&mut self, handle: BufferHandle) -> Result<()>;

    fn bind_index_buffer(&mut self, handle: BufferHandle) -> Result<()>;

    fn bind_texture(&mut self, channel: usize, handle: Option<TextureHandle>) -> Result<()>;

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<()>;

    /// Clears the color attachment with a `0xAARRGGBB` color.
    fn clear(&mut self, argb: u32) -> Result<()>;

    fn enable_scissor(&mut self, enable: bool) -> Result<()>;

    /// Draws `count` indices of the bound index buffer, starting at `offset`.
    fn draw(&mut self, mode: DrawMode, offset: usize, count: usize) -> Result<()>;

    /// Forgets every cached binding, usually after the underlying context was lost
    /// or touched by someone else.
    fn reset_state(&mut self) -> Result<()>;

    fn version(&self) -> u32;
}

// Devices are also usable through boxes and mutable borrows.
macro_rules! impl_forward_device {
    ($ty:ty $(, $lt:lifetime)*) => {
        impl<$($lt,)* D: Device + ?Sized> Device for $ty {
            fn create_buffer(
                &mut self,
                kind: BufferKind,
                stride: usize,
                len: usize,
                data: Option<&[u8]>,
            ) -> Result<BufferHandle> {
                (**self).create_buffer(kind, stride, len, data)
            }

            fn update_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()> {
                (**self).update_buffer(handle, data)
            }

            fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
                (**self).delete_buffer(handle)
            }

            fn create_vertex_layout(
                &mut self,
                attributes: &[VertexAttribute],
                stride: usize,
            ) -> Result<LayoutHandle> {
                (**self).create_vertex_layout(attributes, stride)
            }

            fn delete_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
                (**self).delete_vertex_layout(handle)
            }

            fn create_shader(&mut self, vs: &str, fs: &str) -> Result<ShaderHandle> {
                (**self).create_shader(vs, fs)
            }

            fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
                (**self).delete_shader(handle)
            }

            fn bind_shader(&mut self, handle: Option<ShaderHandle>) -> Result<()> {
                (**self).bind_shader(handle)
            }

            fn uniform_location(&mut self, name: &str) -> Option<UniformLocation> {
                (**self).uniform_location(name)
            }

            fn set_uniform(
                &mut self,
                location: UniformLocation,
                format: UniformFormat,
                v: &[f32],
            ) -> Result<()> {
                (**self).set_uniform(location, format, v)
            }

            fn set_uniform_i32(&mut self, location: UniformLocation, v: i32) -> Result<()> {
                (**self).set_uniform_i32(location, v)
            }

            fn bind_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
                (**self).bind_vertex_layout(handle)
            }

            fn bind_vertex_buffer(&mut self, handle: BufferHandle) -> Result<()> {
                (**self).bind_vertex_buffer(handle)
            }

            fn bind_index_buffer(&mut self, handle: BufferHandle) -> Result<()> {
                (**self).bind_index_buffer(handle)
            }

            fn bind_texture(&mut self, channel: usize, handle: Option<TextureHandle>) -> Result<()> {
                (**self).bind_texture(channel, handle)
            }

            fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
                (**self).set_blend(src, dst)
            }

            fn clear(&mut self, argb: u32) -> Result<()> {
                (**self).clear(argb)
            }

            fn enable_scissor(&mut self, enable: bool) -> Result<()> {
                (**self).enable_scissor(enable)
            }

            fn draw(&mut self, mode: DrawMode, offset: usize, count: usize) -> Result<()> {
                (**self).draw(mode, offset, count)
            }

            fn reset_state(&mut self) -> Result<()> {
                (**self).reset_state()
            }

            fn version(&self) -> u32 {
                (**self).version()
            }
        }
    };
}

impl_forward_device!(Box<D>);
impl_forward_device!(&'a mut D, 'a);
