use std::fmt;

use crate::error::DriverError;

/// Handle to a compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

/// Handle to a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Resolved location of a vertex attribute within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

/// Resolved location of a uniform within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Shader stage being compiled; carried in compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Primitive topology for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

/// Component type for a vertex attribute pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberType {
    Float,
    UnsignedByte,
}

/// Graphics objects created by a session, tracked so a superseded session
/// can be released instead of leaking on every switch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Allocations {
    pub shaders: Vec<ShaderId>,
    pub programs: Vec<ProgramId>,
    pub buffers: Vec<BufferId>,
}

impl Allocations {
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty() && self.programs.is_empty() && self.buffers.is_empty()
    }
}

/// The graphics capability consumed by the driver and the examples.
///
/// The surface mirrors what the teaching examples actually call: shader
/// compilation and linking with diagnostics, one array-buffer bind point,
/// attribute/uniform lookup, a handful of uniform setters, clear, viewport
/// maintenance, and non-indexed draws. Object creation since the last
/// [`drain_allocations`](GlFacade::drain_allocations) is tracked so the
/// driver can scope cleanup to a session.
pub trait GlFacade {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DriverError>;
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId)
        -> Result<ProgramId, DriverError>;
    fn use_program(&mut self, program: ProgramId);

    fn create_buffer(&mut self) -> Result<BufferId, DriverError>;
    fn bind_array_buffer(&mut self, buffer: BufferId);
    /// Uploads `data` to the buffer currently bound to the array bind point.
    fn array_buffer_data(&mut self, data: &[f32]);

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation>;
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn enable_vertex_attrib(&mut self, location: AttribLocation);
    fn vertex_attrib_pointer(
        &mut self,
        location: AttribLocation,
        size: i32,
        ty: NumberType,
        normalize: bool,
        stride: i32,
        offset: i32,
    );

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);
    fn set_uniform_vec2(&mut self, location: UniformLocation, value: [f32; 2]);
    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]);
    fn set_uniform_mat3(&mut self, location: UniformLocation, value: [f32; 9]);

    fn clear(&mut self, color: [f32; 4]);
    /// Matches the drawable to the currently displayed size and resets the
    /// viewport. Returns whether the drawable actually changed size. Called
    /// by the driver before every frame, since the displayed size can change
    /// between frames.
    fn resize_to_display(&mut self) -> bool;
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    fn draw_arrays(&mut self, topology: Topology, first: i32, count: i32);

    /// Takes ownership of every object created since the previous drain.
    fn drain_allocations(&mut self) -> Allocations;
    /// Deletes the given objects.
    fn release(&mut self, allocations: Allocations);
}
