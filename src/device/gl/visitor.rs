use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_void;

use gl::types::*;

use crate::errors::*;
use crate::render::MAX_TEXTURE_CHANNEL;
use crate::settings::DeviceParams;

use super::super::{
    BlendFactor, BufferHandle, BufferKind, Device, DrawMode, LayoutHandle, ShaderHandle,
    TextureHandle, UniformFormat, UniformLocation, VertexAttribute,
};

#[derive(Debug, Clone, Copy)]
struct GLBufferData {
    id: GLuint,
    kind: BufferKind,
    size: usize,
}

#[derive(Debug, Clone)]
struct GLLayoutData {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

struct GLMutableState {
    shader: Option<ShaderHandle>,
    layout: Option<LayoutHandle>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    active_texture: usize,
    /// Vertex attribute pointers have to be re-specified when the layout or the vertex
    /// buffer changes.
    attributes_dirty: bool,
}

pub struct GLDevice {
    params: DeviceParams,
    counter: u32,
    state: GLMutableState,
    buffers: HashMap<BufferHandle, GLBufferData>,
    layouts: HashMap<LayoutHandle, GLLayoutData>,
    shaders: HashMap<ShaderHandle, GLuint>,
    version: u32,
}

impl GLDevice {
    /// Creates a device on top of the current OpenGL context. `loader` resolves the
    /// address of OpenGL functions by name.
    pub unsafe fn new<F>(params: DeviceParams, loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let mut device = GLDevice {
            params,
            counter: 0,
            state: GLMutableState {
                shader: None,
                layout: None,
                vertex_buffer: None,
                index_buffer: None,
                active_texture: 0,
                attributes_dirty: true,
            },
            buffers: HashMap::new(),
            layouts: HashMap::new(),
            shaders: HashMap::new(),
            version: 2,
        };

        device.version = Self::query_version();
        device.reset_state()?;
        info!("Creates OpenGL device (version {}).", device.version);
        Ok(device)
    }

    unsafe fn query_version() -> u32 {
        let mut major = 0;
        gl::GetIntegerv(gl::MAJOR_VERSION, &mut major);
        // Contexts older than 3.0 do not know `MAJOR_VERSION` at all.
        if gl::GetError() != gl::NO_ERROR || major < 2 {
            2
        } else {
            major as u32
        }
    }

    fn next_index(&mut self) -> u32 {
        self.counter += 1;
        self.counter
    }

    unsafe fn compile(shader: GLenum, src: &str) -> Result<GLuint> {
        let shader = gl::CreateShader(shader);
        let c_str = CString::new(src.as_bytes())
            .map_err(|_| Error::ShaderCreationFailure("source contains nul byte".into()))?;
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ::std::ptr::null());
        gl::CompileShader(shader);

        let mut status = GLint::from(gl::FALSE);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetShaderInfoLog(
                shader,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteShader(shader);
            let log = String::from_utf8_lossy(&buf[..buf.len() - 1]).into_owned();
            Err(Error::ShaderCreationFailure(log))
        } else {
            Ok(shader)
        }
    }

    unsafe fn link(&self, vs: GLuint, fs: GLuint) -> Result<GLuint> {
        let program = gl::CreateProgram();
        gl::AttachShader(program, vs);
        gl::AttachShader(program, fs);

        // Attributes are addressed by their index in the bound vertex layout.
        if let Some(layout) = self.state.layout.and_then(|v| self.layouts.get(&v)) {
            for (i, v) in layout.attributes.iter().enumerate() {
                let c_name = CString::new(v.name.as_bytes())
                    .map_err(|_| Error::ShaderCreationFailure("invalid attribute".into()))?;
                gl::BindAttribLocation(program, i as GLuint, c_name.as_ptr());
            }
        }

        gl::LinkProgram(program);
        gl::DetachShader(program, vs);
        gl::DetachShader(program, fs);

        let mut status = GLint::from(gl::FALSE);
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len: GLint = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetProgramInfoLog(
                program,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteProgram(program);
            let log = String::from_utf8_lossy(&buf[..buf.len() - 1]).into_owned();
            Err(Error::ShaderCreationFailure(log))
        } else {
            Ok(program)
        }
    }

    unsafe fn apply_attributes(&mut self) -> Result<()> {
        if !self.state.attributes_dirty {
            return Ok(());
        }

        let layout = match self.state.layout.and_then(|v| self.layouts.get(&v)) {
            Some(layout) => layout,
            None => return Err(Error::Backend("Draws without vertex layout.".into())),
        };

        let vb = match self.state.vertex_buffer.and_then(|v| self.buffers.get(&v)) {
            Some(vb) => vb,
            None => return Err(Error::Backend("Draws without vertex buffer.".into())),
        };

        gl::BindBuffer(gl::ARRAY_BUFFER, vb.id);
        for (i, v) in layout.attributes.iter().enumerate() {
            gl::EnableVertexAttribArray(i as GLuint);
            gl::VertexAttribPointer(
                i as GLuint,
                GLint::from(v.size),
                v.format.into(),
                if v.normalized { gl::TRUE } else { gl::FALSE },
                layout.stride as GLsizei,
                v.offset as *const c_void,
            );
        }

        self.state.attributes_dirty = false;
        check()
    }

    /// Element array binding is part of the draw state, puts it back after touching
    /// other index buffers. Vertex attribute pointers keep the buffer they were
    /// specified with, so array buffers need no such care.
    fn restore_index_buffer(&mut self) -> Result<()> {
        let id = match self.state.index_buffer.and_then(|v| self.buffers.get(&v)) {
            Some(ib) => ib.id,
            None => 0,
        };

        unsafe {
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id);
            check()
        }
    }

    fn buffer(&self, handle: BufferHandle) -> Result<GLBufferData> {
        self.buffers
            .get(&handle)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))
    }

    fn shader(&self, handle: ShaderHandle) -> Result<GLuint> {
        self.shaders
            .get(&handle)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("{} is invalid.", handle)))
    }
}

impl Device for GLDevice {
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

        let size = stride * len;
        let value = match data {
            Some(v) if v.len() > size => return Err(Error::Backend("Out of bounds.".into())),
            Some(v) if !v.is_empty() => v.as_ptr() as *const c_void,
            _ => ::std::ptr::null(),
        };

        let usage = match kind {
            BufferKind::Vertex => gl::DYNAMIC_DRAW,
            BufferKind::Index => gl::STATIC_DRAW,
        };

        let id = unsafe {
            let mut id = 0;
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(kind.into(), id);
            gl::BufferData(kind.into(), size as GLsizeiptr, value, usage);
            check()?;
            id
        };

        if kind == BufferKind::Index {
            self.restore_index_buffer()?;
        }

        let handle = BufferHandle(self.next_index());
        self.buffers.insert(handle, GLBufferData { id, kind, size });
        Ok(handle)
    }

    fn update_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()> {
        let buf = self.buffer(handle)?;
        if data.len() > buf.size {
            return Err(Error::Backend("Out of bounds.".into()));
        }

        if data.is_empty() {
            return Ok(());
        }

        unsafe {
            gl::BindBuffer(buf.kind.into(), buf.id);
            gl::BufferSubData(
                buf.kind.into(),
                0,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            );
            check()?;
        }

        if buf.kind == BufferKind::Index {
            self.restore_index_buffer()?;
        }

        Ok(())
    }

    fn delete_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buf = self.buffer(handle)?;
        self.buffers.remove(&handle);

        if self.state.vertex_buffer == Some(handle) {
            self.state.vertex_buffer = None;
            self.state.attributes_dirty = true;
        }

        if self.state.index_buffer == Some(handle) {
            self.state.index_buffer = None;
        }

        unsafe {
            gl::DeleteBuffers(1, &buf.id);
            check()
        }
    }

    fn create_vertex_layout(
        &mut self,
        attributes: &[VertexAttribute],
        stride: usize,
    ) -> Result<LayoutHandle> {
        if self.layouts.len() >= self.params.max_layout {
            return Err(Error::Backend("Too many vertex layouts.".into()));
        }

        let handle = LayoutHandle(self.next_index());
        let layout = GLLayoutData {
            attributes: attributes.to_vec(),
            stride,
        };

        self.layouts.insert(handle, layout);
        Ok(handle)
    }

    fn delete_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
        if self.layouts.remove(&handle).is_none() {
            return Err(Error::Backend(format!("{} is invalid.", handle)));
        }

        if self.state.layout == Some(handle) {
            self.state.layout = None;
            self.state.attributes_dirty = true;
        }

        Ok(())
    }

    fn create_shader(&mut self, vs: &str, fs: &str) -> Result<ShaderHandle> {
        if self.shaders.len() >= self.params.max_shader {
            return Err(Error::Backend("Too many shaders.".into()));
        }

        let id = unsafe {
            let vs = Self::compile(gl::VERTEX_SHADER, vs)?;
            let fs = match Self::compile(gl::FRAGMENT_SHADER, fs) {
                Ok(fs) => fs,
                Err(err) => {
                    gl::DeleteShader(vs);
                    return Err(err);
                }
            };

            let program = self.link(vs, fs);
            gl::DeleteShader(vs);
            gl::DeleteShader(fs);
            program?
        };

        let handle = ShaderHandle(self.next_index());
        self.shaders.insert(handle, id);
        Ok(handle)
    }

    fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let id = self.shader(handle)?;
        self.shaders.remove(&handle);

        unsafe {
            if self.state.shader == Some(handle) {
                self.state.shader = None;
                gl::UseProgram(0);
            }

            gl::DeleteProgram(id);
            check()
        }
    }

    fn bind_shader(&mut self, handle: Option<ShaderHandle>) -> Result<()> {
        let id = match handle {
            Some(handle) => self.shader(handle)?,
            None => 0,
        };

        unsafe {
            gl::UseProgram(id);
            check()?;
        }

        self.state.shader = handle;
        Ok(())
    }

    fn uniform_location(&mut self, name: &str) -> Option<UniformLocation> {
        let id = self.shaders.get(&self.state.shader?).cloned()?;
        let c_name = CString::new(name.as_bytes()).ok()?;
        let location = unsafe { gl::GetUniformLocation(id, c_name.as_ptr()) };

        if location < 0 {
            None
        } else {
            Some(UniformLocation(location))
        }
    }

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        format: UniformFormat,
        v: &[f32],
    ) -> Result<()> {
        if v.len() != format.size() {
            return Err(Error::Backend(format!(
                "{:?} needs {} floats.",
                format,
                format.size()
            )));
        }

        let loc = location.0;
        unsafe {
            match format {
                UniformFormat::F32 => gl::Uniform1fv(loc, 1, v.as_ptr()),
                UniformFormat::Vector2f => gl::Uniform2fv(loc, 1, v.as_ptr()),
                UniformFormat::Vector3f => gl::Uniform3fv(loc, 1, v.as_ptr()),
                UniformFormat::Vector4f => gl::Uniform4fv(loc, 1, v.as_ptr()),
                UniformFormat::Matrix3f => gl::UniformMatrix3fv(loc, 1, gl::FALSE, v.as_ptr()),
                UniformFormat::Matrix4f => gl::UniformMatrix4fv(loc, 1, gl::FALSE, v.as_ptr()),
            }

            check()
        }
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, v: i32) -> Result<()> {
        unsafe {
            gl::Uniform1i(location.0, v);
            check()
        }
    }

    fn bind_vertex_layout(&mut self, handle: LayoutHandle) -> Result<()> {
        if !self.layouts.contains_key(&handle) {
            return Err(Error::Backend(format!("{} is invalid.", handle)));
        }

        if self.state.layout != Some(handle) {
            self.state.layout = Some(handle);
            self.state.attributes_dirty = true;
        }

        Ok(())
    }

    fn bind_vertex_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buf = self.buffer(handle)?;
        if buf.kind != BufferKind::Vertex {
            return Err(Error::Backend(format!("{} is not a vertex buffer.", handle)));
        }

        if self.state.vertex_buffer != Some(handle) {
            self.state.vertex_buffer = Some(handle);
            self.state.attributes_dirty = true;
        }

        Ok(())
    }

    fn bind_index_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buf = self.buffer(handle)?;
        if buf.kind != BufferKind::Index {
            return Err(Error::Backend(format!("{} is not an index buffer.", handle)));
        }

        unsafe {
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, buf.id);
            check()?;
        }

        self.state.index_buffer = Some(handle);
        Ok(())
    }

    fn bind_texture(&mut self, channel: usize, handle: Option<TextureHandle>) -> Result<()> {
        if channel >= MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(channel));
        }

        unsafe {
            if self.state.active_texture != channel {
                self.state.active_texture = channel;
                gl::ActiveTexture(gl::TEXTURE0 + channel as GLuint);
            }

            gl::BindTexture(gl::TEXTURE_2D, handle.map(|v| v.index()).unwrap_or(0));
            check()
        }
    }

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
        unsafe {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(src.into(), dst.into());
            check()
        }
    }

    fn clear(&mut self, argb: u32) -> Result<()> {
        let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;

        unsafe {
            gl::ClearColor(channel(16), channel(8), channel(0), channel(24));
            gl::Clear(gl::COLOR_BUFFER_BIT);
            check()
        }
    }

    fn enable_scissor(&mut self, enable: bool) -> Result<()> {
        unsafe {
            if enable {
                gl::Enable(gl::SCISSOR_TEST);
            } else {
                gl::Disable(gl::SCISSOR_TEST);
            }

            check()
        }
    }

    fn draw(&mut self, mode: DrawMode, offset: usize, count: usize) -> Result<()> {
        if self.state.index_buffer.is_none() {
            return Err(Error::Backend("Draws without index buffer.".into()));
        }

        unsafe {
            self.apply_attributes()?;
            gl::DrawElements(
                mode.into(),
                count as GLsizei,
                gl::UNSIGNED_SHORT,
                (offset * 2) as *const c_void,
            );

            check()
        }
    }

    fn reset_state(&mut self) -> Result<()> {
        unsafe {
            gl::Disable(gl::CULL_FACE);
            gl::Disable(gl::DEPTH_TEST);
            gl::DepthMask(gl::FALSE);
            gl::Disable(gl::BLEND);
            gl::Disable(gl::SCISSOR_TEST);
            gl::ColorMask(gl::TRUE, gl::TRUE, gl::TRUE, gl::TRUE);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::ActiveTexture(gl::TEXTURE0);
            gl::UseProgram(0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0);
        }

        self.state = GLMutableState {
            shader: None,
            layout: None,
            vertex_buffer: None,
            index_buffer: None,
            active_texture: 0,
            attributes_dirty: true,
        };

        unsafe { check() }
    }

    fn version(&self) -> u32 {
        self.version
    }
}

unsafe fn check() -> Result<()> {
    let msg = match gl::GetError() {
        gl::NO_ERROR => return Ok(()),
        gl::INVALID_ENUM => "[GL] An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "[GL] A numeric argument is out of range.",
        gl::INVALID_OPERATION => "[GL] The specified operation is not allowed in the current state.",
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "[GL] The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "[GL] There is not enough memory left to execute the command.",
        _ => "[GL] Oops, Unknown OpenGL error.",
    };

    Err(Error::Backend(msg.into()))
}
