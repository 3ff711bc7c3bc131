//! OpenGL backend for the graphics facade, built on `glow`.
//!
//! Handles are indexes into per-kind registries so the facade can hand out
//! `Copy` ids while the underlying native objects stay private. Released
//! slots are left as `None`; a call against a released handle is dropped
//! with a warning rather than panicking.

use glow::HasContext;
use tracing::warn;

use crate::error::DriverError;
use crate::facade::{
    Allocations, AttribLocation, BufferId, GlFacade, NumberType, ProgramId, ShaderId, ShaderStage,
    Topology, UniformLocation,
};

pub struct GlowFacade {
    gl: glow::Context,
    shaders: Vec<Option<glow::NativeShader>>,
    programs: Vec<Option<glow::NativeProgram>>,
    buffers: Vec<Option<glow::NativeBuffer>>,
    uniforms: Vec<glow::NativeUniformLocation>,
    pending: Allocations,
    /// Size the window reports the surface is displayed at.
    display: (u32, u32),
    /// Size the viewport is currently set to.
    drawable: (u32, u32),
}

impl GlowFacade {
    pub fn new(gl: glow::Context, display: (u32, u32)) -> Self {
        Self {
            gl,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            uniforms: Vec::new(),
            pending: Allocations::default(),
            display,
            drawable: (0, 0),
        }
    }

    /// Called by the shell when the window is resized; the drawable catches
    /// up on the next [`resize_to_display`](GlFacade::resize_to_display).
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display = (width.max(1), height.max(1));
    }

    fn shader(&self, id: ShaderId) -> Option<glow::NativeShader> {
        self.shaders.get(id.0 as usize).copied().flatten()
    }

    fn program(&self, id: ProgramId) -> Option<glow::NativeProgram> {
        self.programs.get(id.0 as usize).copied().flatten()
    }

    fn buffer(&self, id: BufferId) -> Option<glow::NativeBuffer> {
        self.buffers.get(id.0 as usize).copied().flatten()
    }

    fn uniform(&self, id: UniformLocation) -> Option<glow::NativeUniformLocation> {
        self.uniforms.get(id.0 as usize).cloned()
    }
}

fn topology_mode(topology: Topology) -> u32 {
    match topology {
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::Lines => glow::LINES,
        Topology::Points => glow::POINTS,
    }
}

fn number_type(ty: NumberType) -> u32 {
    match ty {
        NumberType::Float => glow::FLOAT,
        NumberType::UnsignedByte => glow::UNSIGNED_BYTE,
    }
}

impl GlFacade for GlowFacade {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DriverError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|log| DriverError::ShaderCompile { stage, log })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let mut log = self.gl.get_shader_info_log(shader);
                if log.is_empty() {
                    log = "could not compile shader".to_string();
                }
                self.gl.delete_shader(shader);
                return Err(DriverError::ShaderCompile { stage, log });
            }
            let id = ShaderId(self.shaders.len() as u32);
            self.shaders.push(Some(shader));
            self.pending.shaders.push(id);
            Ok(id)
        }
    }

    fn link_program(
        &mut self,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<ProgramId, DriverError> {
        let (Some(vs), Some(fs)) = (self.shader(vertex), self.shader(fragment)) else {
            return Err(DriverError::ProgramLink {
                log: "stale shader handle".to_string(),
            });
        };
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|log| DriverError::ProgramLink { log })?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let mut log = self.gl.get_program_info_log(program);
                if log.is_empty() {
                    log = "could not link program".to_string();
                }
                self.gl.delete_program(program);
                return Err(DriverError::ProgramLink { log });
            }
            let id = ProgramId(self.programs.len() as u32);
            self.programs.push(Some(program));
            self.pending.programs.push(id);
            Ok(id)
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        match self.program(program) {
            Some(native) => unsafe { self.gl.use_program(Some(native)) },
            None => warn!(?program, "use_program on released handle"),
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, DriverError> {
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|log| DriverError::Example(anyhow::anyhow!("could not create buffer: {log}")))?;
            let id = BufferId(self.buffers.len() as u32);
            self.buffers.push(Some(buffer));
            self.pending.buffers.push(id);
            Ok(id)
        }
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        match self.buffer(buffer) {
            Some(native) => unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native)) },
            None => warn!(?buffer, "bind on released buffer handle"),
        }
    }

    fn array_buffer_data(&mut self, data: &[f32]) {
        unsafe {
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
        }
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let native = self.program(program)?;
        unsafe { self.gl.get_attrib_location(native, name).map(AttribLocation) }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let native = self.program(program)?;
        let location = unsafe { self.gl.get_uniform_location(native, name)? };
        let id = UniformLocation(self.uniforms.len() as u32);
        self.uniforms.push(location);
        Some(id)
    }

    fn enable_vertex_attrib(&mut self, location: AttribLocation) {
        unsafe { self.gl.enable_vertex_attrib_array(location.0) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: AttribLocation,
        size: i32,
        ty: NumberType,
        normalize: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location.0, size, number_type(ty), normalize, stride, offset);
        }
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        if let Some(native) = self.uniform(location) {
            unsafe { self.gl.uniform_1_f32(Some(&native), value) }
        }
    }

    fn set_uniform_vec2(&mut self, location: UniformLocation, value: [f32; 2]) {
        if let Some(native) = self.uniform(location) {
            unsafe { self.gl.uniform_2_f32(Some(&native), value[0], value[1]) }
        }
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        if let Some(native) = self.uniform(location) {
            unsafe {
                self.gl
                    .uniform_4_f32(Some(&native), value[0], value[1], value[2], value[3])
            }
        }
    }

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: [f32; 9]) {
        if let Some(native) = self.uniform(location) {
            unsafe {
                self.gl
                    .uniform_matrix_3_f32_slice(Some(&native), false, &value)
            }
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn resize_to_display(&mut self) -> bool {
        let resized = self.drawable != self.display;
        self.drawable = self.display;
        let (width, height) = self.drawable;
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
        resized
    }

    fn surface_size(&self) -> (u32, u32) {
        self.drawable
    }

    fn draw_arrays(&mut self, topology: Topology, first: i32, count: i32) {
        unsafe {
            self.gl.draw_arrays(topology_mode(topology), first, count);
        }
    }

    fn drain_allocations(&mut self) -> Allocations {
        std::mem::take(&mut self.pending)
    }

    fn release(&mut self, allocations: Allocations) {
        unsafe {
            for id in allocations.shaders {
                if let Some(slot) = self.shaders.get_mut(id.0 as usize) {
                    if let Some(native) = slot.take() {
                        self.gl.delete_shader(native);
                    }
                }
            }
            for id in allocations.programs {
                if let Some(slot) = self.programs.get_mut(id.0 as usize) {
                    if let Some(native) = slot.take() {
                        self.gl.delete_program(native);
                    }
                }
            }
            for id in allocations.buffers {
                if let Some(slot) = self.buffers.get_mut(id.0 as usize) {
                    if let Some(native) = slot.take() {
                        self.gl.delete_buffer(native);
                    }
                }
            }
        }
    }
}
