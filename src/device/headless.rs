//! A device without any video output. It keeps track of the bound state the way a real
//! context would, and records every call in a command log so the render front-end
//! could be inspected by tests.

use std::collections::HashMap;

use crate::errors::*;
use crate::render::MAX_TEXTURE_CHANNEL;
use crate::settings::DeviceParams;

use super::*;

/// A draw call with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: DrawMode,
    pub offset: usize,
    pub count: usize,
    pub shader: Option<ShaderHandle>,
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_CHANNEL],
    pub blend: (BlendFactor, BlendFactor),
    pub vertex_buffer: Option<BufferHandle>,
    /// The bytes of the vertices referenced by this draw, assuming the fixed
    /// `0, 1, 2, 0, 2, 3` quad pattern in the index buffer.
    pub vertices: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer(BufferHandle, BufferKind, usize),
    UpdateBuffer(BufferHandle, usize),
    DeleteBuffer(BufferHandle),
    CreateVertexLayout(LayoutHandle),
    DeleteVertexLayout(LayoutHandle),
    CreateShader(ShaderHandle),
    DeleteShader(ShaderHandle),
    BindShader(Option<ShaderHandle>),
    SetUniform(UniformLocation, UniformFormat, Vec<f32>),
    SetUniformI32(UniformLocation, i32),
    BindVertexLayout(LayoutHandle),
    BindVertexBuffer(BufferHandle),
    BindIndexBuffer(BufferHandle),
    BindTexture(usize, Option<TextureHandle>),
    SetBlend(BlendFactor, BlendFactor),
    Clear(u32),
    EnableScissor(bool),
    Draw(DrawCall),
    ResetState,
}

struct HeadlessBuffer {
    kind: BufferKind,
    stride: usize,
    bytes: Vec<u8>,
}

struct HeadlessShader {
    sources: (String, String),
    uniforms: HashMap<String, UniformLocation>,
}

pub struct HeadlessDevice {
    params: DeviceParams,
    counter: u32,
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    layouts: HashMap<LayoutHandle, usize>,
    shaders: HashMap<ShaderHandle, HeadlessShader>,

    shader: Option<ShaderHandle>,
    layout: Option<LayoutHandle>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    textures: [Option<TextureHandle>; MAX_TEXTURE_CHANNEL],
    blend: (BlendFactor, BlendFactor),
    scissor: bool,

    cmds: Vec<Command>,
}

impl HeadlessDevice {
    pub fn new(params: DeviceParams) -> Self {
        HeadlessDevice {
            params,
            counter: 0,
            buffers: HashMap::new(),
            layouts: HashMap::new(),
            shaders: HashMap::new(),
            shader: None,
            layout: None,
            vertex_buffer: None,
            index_buffer: None,
            textures: [None; MAX_TEXTURE_CHANNEL],
            blend: (BlendFactor::One, BlendFactor::Zero),
            scissor: false,
            cmds: Vec::new(),
        }
    }

    /// Every command recorded since creation or the last `clear_commands`.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    #[inline]
    pub fn clear_commands(&mut self) {
        self.cmds.clear();
    }

    /// Every draw call recorded since creation or the last `clear_commands`.
    pub fn draws(&self) -> Vec<&DrawCall> {
        self.cmds
            .iter()
            .filter_map(|v| match *v {
                Command::Draw(ref dc) => Some(dc),
                _ => None,
            })
            .collect()
    }

    /// Counts the recorded commands matching `f`.
    pub fn count<F>(&self, f: F) -> usize
    where
        F: Fn(&Command) -> bool,
    {
        self.cmds.iter().filter(|v| f(v)).count()
    }

    #[inline]
    pub fn bound_shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    #[inline]
    pub fn bound_texture(&self, channel: usize) -> Option<TextureHandle> {
        self.textures.get(channel).and_then(|v| *v)
    }

    #[inline]
    pub fn blend(&self) -> (BlendFactor, BlendFactor) {
        self.blend
    }

    #[inline]
    pub fn scissor(&self) -> bool {
        self.scissor
    }

    /// Number of live objects: buffers, vertex layouts and shaders.
    pub fn live_objects(&self) -> (usize, usize, usize) {
        (self.buffers.len(), self.layouts.len(), self.shaders.len())
    }

    /// The vertex and fragment source of a live shader.
    pub fn shader_sources(&self, handle: ShaderHandle) -> Option<(&str, &str)> {
        self.shaders
            .get(&handle)
            .map(|v| (v.sources.0.as_ref(), v.sources.1.as_ref()))
    }

    fn next_index(&mut self) -> u32 {
        self.counter += 1;
        self.counter
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut HeadlessBuffer> {
        self.buffers
            .get_mut(&handle)
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))
    }
}

impl Device for HeadlessDevice {
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        stride: usize,
        len: usize,
        data: Option<&[u8]>,
    ) -> Result<BufferHandle> {
        if self.buffers.len() >= self.params.max_buffer {
            return Err(Error::Backend("Too many buffers.".into()));
        }

        let mut bytes = vec![0; stride * len];
        if let Some(data) = data {
            if data.len() > bytes.len() {
                return Err(Error::Backend("Out of bounds.".into()));
            }

            bytes[..data.len()].copy_from_slice(data);
        }

        let handle = BufferHandle(self.next_index());
        self.buffers
            .insert(handle, HeadlessBuffer { kind, stride, bytes });
        self.cmds.push(Command::CreateBuffer(handle, kind, len));
        Ok(handle)
    }

    fn update_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()> {
        let buf = self.buffer_mut(handle)?;
        if data.len() > buf.bytes.len() {
            return Err(Error::Backend("Out of bounds.".into()));
        }

        buf.bytes[..data.len()].copy_from_slice(data);
        let len = data.len() / buf.stride.max(1);
        self.cmds.push(Command::UpdateBuffer(handle, len));
        Ok(())
    }

    fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.buffers
            .remove(&handle)
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))?;

        if self.vertex_buffer == Some(handle) {
            self.vertex_buffer = None;
        }

        if self.index_buffer == Some(handle) {
            self.index_buffer = None;
        }

        self.cmds.push(Command::DeleteBuffer(handle));
        Ok(())
    }

    fn create_vertex_layout(
        &mut self,
        attributes: &[VertexAttribute],
        stride: usize,
    ) -> Result<LayoutHandle> {
        if self.layouts.len() >= self.params.max_layout {
            return Err(Error::Backend("Too many vertex layouts.".into()));
        }

        for v in attributes {
            let end = v.offset + v.format.size() * v.size as usize;
            if end > stride {
                return Err(Error::Backend(format!(
                    "Attribute {} exceeds the vertex stride {}.",
                    v.name, stride
                )));
            }
        }

        let handle = LayoutHandle(self.next_index());
        self.layouts.insert(handle, stride);
        self.cmds.push(Command::CreateVertexLayout(handle));
        Ok(handle)
    }

    fn delete_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
        self.layouts
            .remove(&handle)
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))?;

        if self.layout == Some(handle) {
            self.layout = None;
        }

        self.cmds.push(Command::DeleteVertexLayout(handle));
        Ok(())
    }

    fn create_shader(&mut self, vs: &str, fs: &str) -> Result<ShaderHandle> {
        if vs.is_empty() || fs.is_empty() {
            return Err(Error::ShaderCreationFailure("empty source".into()));
        }

        if self.shaders.len() >= self.params.max_shader {
            return Err(Error::Backend("Too many shaders.".into()));
        }

        let handle = ShaderHandle(self.next_index());
        let shader = HeadlessShader {
            sources: (vs.to_owned(), fs.to_owned()),
            uniforms: HashMap::new(),
        };

        self.shaders.insert(handle, shader);
        self.cmds.push(Command::CreateShader(handle));
        Ok(handle)
    }

    fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        self.shaders
            .remove(&handle)
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))?;

        if self.shader == Some(handle) {
            self.shader = None;
        }

        self.cmds.push(Command::DeleteShader(handle));
        Ok(())
    }

    fn bind_shader(&mut self, handle: Option<ShaderHandle>) -> Result<()> {
        if let Some(handle) = handle {
            if !self.shaders.contains_key(&handle) {
                return Err(Error::Backend(format!("{} is invalid.", handle)));
            }
        }

        self.shader = handle;
        self.cmds.push(Command::BindShader(handle));
        Ok(())
    }

    /// A uniform is found if its name appears anywhere in the sources of the bound
    /// shader.
    fn uniform_location(&mut self, name: &str) -> Option<UniformLocation> {
        let shader = self.shaders.get_mut(&self.shader?)?;
        let (ref vs, ref fs) = shader.sources;
        if name.is_empty() || !(vs.contains(name) || fs.contains(name)) {
            return None;
        }

        let next = UniformLocation(shader.uniforms.len() as i32);
        Some(*shader.uniforms.entry(name.to_owned()).or_insert(next))
    }

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        format: UniformFormat,
        v: &[f32],
    ) -> Result<()> {
        if self.shader.is_none() {
            return Err(Error::Backend("Uploads uniform without shader.".into()));
        }

        if v.len() != format.size() {
            return Err(Error::Backend(format!(
                "{:?} needs {} floats.",
                format,
                format.size()
            )));
        }

        self.cmds
            .push(Command::SetUniform(location, format, v.to_vec()));
        Ok(())
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, v: i32) -> Result<()> {
        if self.shader.is_none() {
            return Err(Error::Backend("Uploads uniform without shader.".into()));
        }

        self.cmds.push(Command::SetUniformI32(location, v));
        Ok(())
    }

    fn bind_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
        if !self.layouts.contains_key(&handle) {
            return Err(Error::Backend(format!("{} is invalid.", handle)));
        }

        self.layout = Some(handle);
        self.cmds.push(Command::BindVertexLayout(handle));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        if self.buffer_mut(handle)?.kind != BufferKind::Vertex {
            return Err(Error::Backend(format!("{} is not a vertex buffer.", handle)));
        }

        self.vertex_buffer = Some(handle);
        self.cmds.push(Command::BindVertexBuffer(handle));
        Ok(())
    }

    fn bind_index_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        if self.buffer_mut(handle)?.kind != BufferKind::Index {
            return Err(Error::Backend(format!("{} is not an index buffer.", handle)));
        }

        self.index_buffer = Some(handle);
        self.cmds.push(Command::BindIndexBuffer(handle));
        Ok(())
    }

    fn bind_texture(&mut self, channel: usize, handle: Option<TextureHandle>) -> Result<()> {
        if channel >= MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(channel));
        }

        self.textures[channel] = handle;
        self.cmds.push(Command::BindTexture(channel, handle));
        Ok(())
    }

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
        self.blend = (src, dst);
        self.cmds.push(Command::SetBlend(src, dst));
        Ok(())
    }

    fn clear(&mut self, argb: u32) -> Result<()> {
        self.cmds.push(Command::Clear(argb));
        Ok(())
    }

    fn enable_scissor(&mut self, enable: bool) -> Result<()> {
        self.scissor = enable;
        self.cmds.push(Command::EnableScissor(enable));
        Ok(())
    }

    fn draw(&mut self, mode: DrawMode, offset: usize, count: usize) -> Result<()> {
        let (vertex_buffer, index_buffer) = match (self.vertex_buffer, self.index_buffer) {
            (Some(vb), Some(ib)) => (vb, ib),
            _ => return Err(Error::Backend("Draws without buffers.".into())),
        };

        if self.layout.is_none() {
            return Err(Error::Backend("Draws without vertex layout.".into()));
        }

        let ib = &self.buffers[&index_buffer];
        if ib.bytes.len() < (offset + count) * ib.stride {
            return Err(Error::Backend("Index buffer out of bounds.".into()));
        }

        let vb = &self.buffers[&vertex_buffer];
        let end = (((offset + count) / 6) * 4 * vb.stride).min(vb.bytes.len());
        let start = ((offset / 6) * 4 * vb.stride).min(end);

        let dc = DrawCall {
            mode,
            offset,
            count,
            shader: self.shader,
            textures: self.textures,
            blend: self.blend,
            vertex_buffer: Some(vertex_buffer),
            vertices: vb.bytes[start..end].to_vec(),
        };

        self.cmds.push(Command::Draw(dc));
        Ok(())
    }

    fn reset_state(&mut self) -> Result<()> {
        self.shader = None;
        self.layout = None;
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.textures = [None; MAX_TEXTURE_CHANNEL];
        self.blend = (BlendFactor::One, BlendFactor::Zero);
        self.scissor = false;
        self.cmds.push(Command::ResetState);
        Ok(())
    }

    fn version(&self) -> u32 {
        2
    }
}
