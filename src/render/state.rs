use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use cgmath::Vector2;

use crate::device::*;
use crate::errors::*;
use crate::screen::ScreenTransform;
use crate::settings::{RenderParams, Settings};
use crate::texture::TextureLookup;

use super::buffer::RenderBuffer;
use super::material::{Material, MaterialId};
use super::polygon::QuadFan;
use super::program::{Program, Uniform, UniformLayout};
use super::vertex::{Vertex, VertexPack};
use super::{MAX_PROGRAM, MAX_TEXTURE_CHANNEL, MAX_UNIFORM};

/// The batching render state.
///
/// Every setter compares the requested state with the current one, and flushes the
/// pending batch before anything changes. So a batch that reaches the device was always
/// built under one program, one set of textures and one blend mode.
pub struct RenderState<D: Device> {
    device: D,
    params: RenderParams,

    programs: [Program; MAX_PROGRAM],
    current_program: Option<usize>,
    textures: [Option<TextureHandle>; MAX_TEXTURE_CHANNEL],
    // `None` while the default blend mode is in effect.
    blend: Option<(BlendFactor, BlendFactor)>,
    drawcall: usize,
    materials: u64,

    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    layout: LayoutHandle,
    batch: RenderBuffer,
    // Encoded batch, kept around between flushes.
    bytes: Vec<u8>,
}

impl<D: Device> RenderState<D> {
    /// Sets up the shared buffers and vertex layout on `device`.
    pub fn new(mut device: D, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let params = settings.render;
        let n = params.max_combine;

        device.set_blend(DEFAULT_BLEND.0, DEFAULT_BLEND.1)?;

        let mut indices = vec![0; n * 6 * 2];
        for (i, v) in indices.chunks_mut(12).enumerate() {
            let base = (i * 4) as u16;
            for (j, &offset) in [0, 1, 2, 0, 2, 3].iter().enumerate() {
                LittleEndian::write_u16(&mut v[j * 2..], base + offset);
            }
        }

        let index_buffer = device.create_buffer(BufferKind::Index, 2, 6 * n, Some(&indices[..]))?;
        let vertex_buffer =
            match device.create_buffer(BufferKind::Vertex, Vertex::STRIDE, 4 * n, None) {
                Ok(vb) => vb,
                Err(err) => {
                    Self::release_shared(&mut device, &[index_buffer], None);
                    return Err(err);
                }
            };

        let layout = match device.create_vertex_layout(&Vertex::ATTRIBUTES, Vertex::STRIDE) {
            Ok(layout) => layout,
            Err(err) => {
                Self::release_shared(&mut device, &[index_buffer, vertex_buffer], None);
                return Err(err);
            }
        };

        let bind = device
            .bind_vertex_layout(layout)
            .and_then(|_| device.bind_index_buffer(index_buffer))
            .and_then(|_| device.bind_vertex_buffer(vertex_buffer));

        if let Err(err) = bind {
            Self::release_shared(&mut device, &[index_buffer, vertex_buffer], Some(layout));
            return Err(err);
        }

        info!(
            "Setup render state with {} quads per batch, device version {}.",
            n,
            device.version()
        );

        Ok(RenderState {
            device,
            params,
            programs: Default::default(),
            current_program: None,
            textures: [None; MAX_TEXTURE_CHANNEL],
            blend: None,
            drawcall: 0,
            materials: 0,
            vertex_buffer,
            index_buffer,
            layout,
            batch: RenderBuffer::new(n),
            bytes: Vec::with_capacity(4 * n * Vertex::STRIDE),
        })
    }

    /// Flushes the pending batch, releases every device object created by this render
    /// state and gives the device back.
    pub fn destroy(mut self) -> Result<D> {
        self.flush()?;

        for v in self.programs.iter_mut() {
            if let Some(shader) = v.shader.take() {
                self.device.delete_shader(shader)?;
            }
        }

        self.device.delete_buffer(self.vertex_buffer)?;
        self.device.delete_buffer(self.index_buffer)?;
        self.device.delete_vertex_layout(self.layout)?;

        info!("Render state destroyed after {} draw calls.", self.drawcall);
        Ok(self.device)
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Gets the device. Changing its state behind the render state should be followed
    /// by a `reset`.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.device.version()
    }

    /// Number of draw calls issued since creation or the last reset of the counter.
    #[inline]
    pub fn drawcall_count(&self) -> usize {
        self.drawcall
    }

    #[inline]
    pub fn reset_drawcall_count(&mut self) {
        self.drawcall = 0;
    }

    #[inline]
    pub fn current_program(&self) -> Option<usize> {
        self.current_program
    }

    #[inline]
    pub fn texture(&self, channel: usize) -> Option<TextureHandle> {
        self.textures.get(channel).and_then(|v| *v)
    }

    /// The blend factors in effect.
    #[inline]
    pub fn blend(&self) -> (BlendFactor, BlendFactor) {
        self.blend.unwrap_or(DEFAULT_BLEND)
    }

    /// Number of quads waiting in the batch.
    #[inline]
    pub fn pending(&self) -> usize {
        self.batch.object_count()
    }

    /// Compiles a program into slot `id`, replacing and releasing the one loaded there
    /// before. The program starts with an empty uniform table, and no program is current
    /// afterwards.
    pub fn load_program(
        &mut self,
        id: usize,
        vs: &str,
        fs: &str,
        texture_count: usize,
    ) -> Result<()> {
        Self::check_program(id)?;
        if texture_count > MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(texture_count));
        }

        self.flush()?;
        self.current_program = None;

        let generation = self.programs[id].generation.wrapping_add(1);
        if let Some(shader) = self.programs[id].shader.take() {
            self.device.delete_shader(shader)?;
        }

        self.programs[id] = Program {
            generation,
            ..Default::default()
        };

        let shader = self.device.create_shader(vs, fs)?;
        self.device.bind_shader(Some(shader))?;
        let st = self.device.uniform_location("st");
        self.device.bind_shader(None)?;

        let program = &mut self.programs[id];
        program.shader = Some(shader);
        program.st = st;
        program.texture_count = texture_count;

        info!("Loads program {} with {} texture channels.", id, texture_count);
        Ok(())
    }

    /// Releases the program in slot `id`. Materials of it become useless.
    pub fn unload_program(&mut self, id: usize) -> Result<()> {
        Self::check_program(id)?;

        if self.current_program == Some(id) {
            self.flush()?;
            self.current_program = None;
        }

        let generation = self.programs[id].generation.wrapping_add(1);
        if let Some(shader) = self.programs[id].shader.take() {
            self.device.delete_shader(shader)?;
            debug!("Unloads program {}.", id);
        }

        self.programs[id] = Program {
            generation,
            ..Default::default()
        };

        Ok(())
    }

    /// Makes program `id` current.
    pub fn set_program(&mut self, id: usize) -> Result<()> {
        let shader = self.loaded_program(id)?.shader;
        if self.current_program != Some(id) {
            self.flush()?;
            self.current_program = Some(id);
            self.device.bind_shader(shader)?;
            self.programs[id].bound_material = None;
        }

        Ok(())
    }

    /// Binds a texture to `channel`.
    pub fn set_texture(&mut self, channel: usize, texture: Option<TextureHandle>) -> Result<()> {
        if channel >= MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(channel));
        }

        if self.textures[channel] != texture {
            self.flush()?;
            self.textures[channel] = texture;
            self.device.bind_texture(channel, texture)?;
        }

        Ok(())
    }

    /// Sets the blend factors. Setting the default pair is the same as
    /// `restore_default_blend`, any other pair flushes and is applied to the device.
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) -> Result<()> {
        if (src, dst) == DEFAULT_BLEND {
            return self.restore_default_blend();
        }

        self.flush()?;
        self.blend = Some((src, dst));
        self.device.set_blend(src, dst)
    }

    /// Sets the blend factors with raw OpenGL enums.
    pub fn set_blend_gl(&mut self, src: u32, dst: u32) -> Result<()> {
        let src = BlendFactor::try_from_gl(src)?;
        let dst = BlendFactor::try_from_gl(dst)?;
        self.set_blend(src, dst)
    }

    /// Goes back to the default blend mode. Does nothing at all if it is in effect
    /// already.
    pub fn restore_default_blend(&mut self) -> Result<()> {
        if self.blend.is_some() {
            self.flush()?;
            self.blend = None;
            self.device.set_blend(DEFAULT_BLEND.0, DEFAULT_BLEND.1)?;
        }

        Ok(())
    }

    pub fn scissor_test(&mut self, enable: bool) -> Result<()> {
        self.flush()?;
        self.device.enable_scissor(enable)
    }

    /// Clears the screen with a `0xAARRGGBB` color.
    pub fn clear(&mut self, argb: u32) -> Result<()> {
        self.flush()?;
        self.device.clear(argb)
    }

    /// Appends a quad to the batch. `color` and `additive` are `0xAARRGGBB` colors.
    pub fn draw(&mut self, quad: &[VertexPack; 4], color: u32, additive: u32) -> Result<()> {
        if self.batch.add(quad, color, additive)? {
            self.flush()?;
        }

        Ok(())
    }

    /// Appends a convex polygon, given as a fan of at least 3 vertices.
    pub fn draw_polygon(
        &mut self,
        vertices: &[VertexPack],
        color: u32,
        additive: u32,
    ) -> Result<()> {
        for q in QuadFan::new(vertices.len())? {
            let quad = [vertices[q[0]], vertices[q[1]], vertices[q[2]], vertices[q[3]]];
            self.draw(&quad, color, additive)?;
        }

        Ok(())
    }

    /// Submits the pending batch with one draw call.
    pub fn flush(&mut self) -> Result<()> {
        let n = self.batch.object_count();
        if n == 0 {
            return Ok(());
        }

        self.batch.encode_into(&mut self.bytes);
        self.device.update_buffer(self.vertex_buffer, &self.bytes)?;
        self.device.draw(DrawMode::Triangles, 0, 6 * n)?;

        // Quads stay pending if the device refused them.
        self.batch.clear();
        self.drawcall += 1;

        trace!("Flushes {} quads as draw call {}.", n, self.drawcall);
        Ok(())
    }

    /// Re-applies every piece of state the render state relies on, after the device was
    /// reset or touched by someone else.
    pub fn reset(&mut self) -> Result<()> {
        self.device.reset_state()?;
        self.device.set_blend(DEFAULT_BLEND.0, DEFAULT_BLEND.1)?;
        self.blend = None;

        if let Some(id) = self.current_program {
            self.device.bind_shader(self.programs[id].shader)?;
        }

        self.device.bind_vertex_layout(self.layout)?;
        for (channel, v) in self.textures.iter().enumerate() {
            if channel == 0 || v.is_some() {
                self.device.bind_texture(channel, *v)?;
            }
        }

        self.device.bind_index_buffer(self.index_buffer)?;
        self.device.bind_vertex_buffer(self.vertex_buffer)?;

        debug!("Render state reset.");
        Ok(())
    }

    /// Registers a uniform of program `id` and makes the program current. Returns the
    /// index of the uniform, or `None` if the program has no uniform named `name`.
    pub fn add_uniform(
        &mut self,
        id: usize,
        name: &str,
        format: UniformFormat,
    ) -> Result<Option<usize>> {
        self.set_program(id)?;
        if self.programs[id].layout.len() >= MAX_UNIFORM {
            return Err(Error::TooManyUniforms(MAX_UNIFORM));
        }

        match self.device.uniform_location(name) {
            Some(location) => {
                let layout = Arc::make_mut(&mut self.programs[id].layout);
                layout.push(location, format).map(Some)
            }
            None => {
                warn!("Uniform {} is not found in program {}.", name, id);
                Ok(None)
            }
        }
    }

    /// The uniform table of program `id`.
    pub fn uniform_layout(&self, id: usize) -> Result<&UniformLayout> {
        Self::check_program(id)?;
        Ok(&*self.programs[id].layout)
    }

    pub fn uniform(&self, id: usize, index: usize) -> Result<Uniform> {
        self.uniform_layout(id)?.get(index).map(|v| *v)
    }

    /// Uploads a value for uniform `index` of the current program directly.
    pub fn set_uniform(
        &mut self,
        index: usize,
        format: UniformFormat,
        values: &[f32],
    ) -> Result<()> {
        self.flush()?;

        let id = self.current_program.ok_or(Error::NoProgramBound)?;
        let uniform = *self.programs[id].layout.get(index)?;
        if uniform.format != format {
            return Err(Error::UniformFormatMismatch {
                expected: uniform.format,
                actual: format,
            });
        }

        if values.len() != format.size() {
            return Err(Error::UniformShapeMismatch {
                expected: format.size(),
                actual: values.len(),
            });
        }

        // The values of the last applied material are overwritten.
        self.programs[id].bound_material = None;
        self.device.set_uniform(uniform.location, format, values)
    }

    /// Points the sampler uniform `name` of program `id` at texture unit `unit`, and
    /// makes the program current. Samplers that are not found are ignored.
    pub fn texture_uniform(&mut self, id: usize, name: &str, unit: usize) -> Result<()> {
        if unit >= MAX_TEXTURE_CHANNEL {
            return Err(Error::ChannelOutOfRange(unit));
        }

        self.set_program(id)?;
        if let Some(location) = self.device.uniform_location(name) {
            self.device.set_uniform_i32(location, unit as i32)?;
        }

        Ok(())
    }

    /// Number of floats the storage of a material of program `id` must hold.
    pub fn material_footprint(&self, id: usize) -> Result<usize> {
        Ok(self.uniform_layout(id)?.footprint())
    }

    /// Creates a material of program `id` on top of caller provided `storage`, which
    /// must hold at least `material_footprint(id)` floats. Values are zeroed and every
    /// texture channel is unset.
    pub fn init_material(&mut self, storage: Vec<f32>, id: usize) -> Result<Material> {
        let program = self.loaded_program(id)?;
        let generation = program.generation;
        let layout = program.layout.clone();

        self.materials += 1;
        Material::new(MaterialId(self.materials), id, generation, layout, storage)
    }

    /// Creates a material of program `id` with freshly allocated storage.
    pub fn create_material(&mut self, id: usize) -> Result<Material> {
        let size = self.material_footprint(id)?;
        self.init_material(vec![0.0; size], id)
    }

    /// Uploads the uniforms of `material` and binds its resolvable textures.
    ///
    /// Nothing happens if `material` was created against another program (or another
    /// load of it), if program `id` is not current, or if `material` is the last one
    /// applied since the program was made current. In the last case changes made to
    /// `material` in between are not uploaded. Returns whether anything was applied.
    pub fn apply_material<T>(
        &mut self,
        id: usize,
        material: &Material,
        textures: &T,
    ) -> Result<bool>
    where
        T: TextureLookup + ?Sized,
    {
        Self::check_program(id)?;

        let program = &self.programs[id];
        if material.program != id
            || material.generation != program.generation
            || !Arc::ptr_eq(&material.layout, &program.layout)
            || self.current_program != Some(id)
            || program.bound_material == Some(material.id)
        {
            return Ok(false);
        }

        let texture_count = program.texture_count;

        self.flush()?;
        self.programs[id].bound_material = Some(material.id);

        for (i, v) in material.layout.iter().enumerate() {
            let values = material.uniform(i)?;
            self.device.set_uniform(v.location, v.format, values)?;
        }

        for channel in 0..texture_count {
            let handle = material.texture(channel).and_then(|v| textures.resolve(v));
            if let Some(handle) = handle {
                self.set_texture(channel, Some(handle))?;
            }
        }

        Ok(true)
    }

    /// Uploads the quads of a pre-batched buffer into its own device vertex buffer.
    pub fn upload_buffer(&mut self, buffer: &mut RenderBuffer) -> Result<()> {
        buffer.encode_into(&mut self.bytes);
        match buffer.gpu {
            Some(handle) => self.device.update_buffer(handle, &self.bytes),
            None => {
                let len = buffer.capacity() * 4;
                let kind = BufferKind::Vertex;
                let data = Some(&self.bytes[..]);
                let handle = self.device.create_buffer(kind, Vertex::STRIDE, len, data)?;
                buffer.gpu = Some(handle);
                Ok(())
            }
        }
    }

    /// Releases the device vertex buffer of a pre-batched buffer.
    pub fn release_buffer(&mut self, buffer: &mut RenderBuffer) -> Result<()> {
        if let Some(handle) = buffer.gpu.take() {
            self.device.delete_buffer(handle)?;
        }

        Ok(())
    }

    /// Draws an uploaded pre-batched buffer right away with the buffer program, moved by
    /// `(tx, ty)` and scaled by `scale` in logical pixels.
    ///
    /// The draw is skipped if the texture of `buffer` is not ready, or if it was never
    /// uploaded. Returns whether it was drawn.
    pub fn draw_buffer<T, S>(
        &mut self,
        buffer: &RenderBuffer,
        tx: f32,
        ty: f32,
        scale: f32,
        textures: &T,
        screen: &S,
    ) -> Result<bool>
    where
        T: TextureLookup + ?Sized,
        S: ScreenTransform + ?Sized,
    {
        self.flush()?;

        if buffer.object_count() > self.params.max_combine {
            return Err(Error::BufferOverflow(
                buffer.object_count(),
                self.params.max_combine,
            ));
        }

        let texture = match buffer.texture().and_then(|v| textures.resolve(v)) {
            Some(texture) => texture,
            None => {
                warn!("Skips a render buffer whose texture is not ready.");
                return Ok(false);
            }
        };

        let gpu = match buffer.gpu {
            Some(gpu) => gpu,
            None => {
                warn!("Skips a render buffer that was never uploaded.");
                return Ok(false);
            }
        };

        self.set_texture(0, Some(texture))?;
        let id = self.params.buffer_program;
        self.set_program(id)?;
        self.drawcall += 1;

        let s = screen.transform(Vector2::new(scale, scale));
        let t = screen.transform(Vector2::new(tx, ty));

        let st = self.programs[id].st;
        self.device.bind_vertex_buffer(gpu)?;
        let result = self.draw_bound(st, [s.x, s.y, t.x, t.y], buffer.object_count());
        self.device.bind_vertex_buffer(self.vertex_buffer)?;

        result.map(|_| true)
    }

    fn draw_bound(
        &mut self,
        st: Option<UniformLocation>,
        v: [f32; 4],
        quads: usize,
    ) -> Result<()> {
        if let Some(st) = st {
            self.device.set_uniform(st, UniformFormat::Vector4f, &v)?;
        }

        self.device.draw(DrawMode::Triangles, 0, 6 * quads)
    }

    /// Releases objects of a half-done setup. The error that aborted the setup is the
    /// one worth reporting, so failures here are only logged.
    fn release_shared(device: &mut D, buffers: &[BufferHandle], layout: Option<LayoutHandle>) {
        for &v in buffers {
            if let Err(err) = device.delete_buffer(v) {
                warn!("Failed to release {}: {}", v, err);
            }
        }

        if let Some(layout) = layout {
            if let Err(err) = device.delete_vertex_layout(layout) {
                warn!("Failed to release {}: {}", layout, err);
            }
        }
    }

    fn check_program(id: usize) -> Result<()> {
        if id >= MAX_PROGRAM {
            return Err(Error::ProgramOutOfRange(id));
        }

        Ok(())
    }

    fn loaded_program(&self, id: usize) -> Result<&Program> {
        Self::check_program(id)?;
        let program = &self.programs[id];
        if !program.is_loaded() {
            return Err(Error::ProgramNotLoaded(id));
        }

        Ok(program)
    }
}
