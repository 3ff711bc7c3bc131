//! Recording doubles for the graphics facade and the frame scheduler.
//!
//! [`RecordingFacade`] logs every call it receives and fails compilation on
//! sources containing `#error`, which lets tests drive the whole driver
//! lifecycle without a GL context. [`RecordingScheduler`] logs schedule and
//! cancel calls and lets tests fire continuations by hand. Lives in the
//! library (rather than behind `cfg(test)`) so downstream crates can reuse
//! the doubles in their own tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::error::DriverError;
use crate::facade::{
    Allocations, AttribLocation, BufferId, GlFacade, NumberType, ProgramId, ShaderId, ShaderStage,
    Topology, UniformLocation,
};
use crate::pacing::{FrameScheduler, ScheduleToken};

/// One recorded facade call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CompileShader(ShaderStage),
    LinkProgram(ProgramId),
    UseProgram(ProgramId),
    CreateBuffer(BufferId),
    BindArrayBuffer(BufferId),
    BufferData { floats: usize },
    EnableVertexAttrib(AttribLocation),
    VertexAttribPointer { location: AttribLocation, size: i32, ty: NumberType },
    SetUniform { location: UniformLocation, values: Vec<f32> },
    Clear([f32; 4]),
    ResizeToDisplay,
    DrawArrays { topology: Topology, first: i32, count: i32 },
    Release { shaders: usize, programs: usize, buffers: usize },
}

/// In-memory graphics facade that records calls instead of issuing them.
pub struct RecordingFacade {
    pub calls: Vec<GlCall>,
    /// When set, linking always fails with a canned diagnostic.
    pub fail_link: bool,
    next_id: u32,
    display: (u32, u32),
    drawable: (u32, u32),
    pending: Allocations,
    live_shaders: HashSet<ShaderId>,
    live_programs: HashSet<ProgramId>,
    live_buffers: HashSet<BufferId>,
    locations: HashMap<(ProgramId, String), u32>,
}

impl Default for RecordingFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingFacade {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_link: false,
            next_id: 0,
            display: (300, 150),
            drawable: (300, 150),
            pending: Allocations::default(),
            live_shaders: HashSet::new(),
            live_programs: HashSet::new(),
            live_buffers: HashSet::new(),
            locations: HashMap::new(),
        }
    }

    /// Simulates the window being laid out at a new size.
    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    /// Objects created and not yet released.
    pub fn live_object_count(&self) -> usize {
        self.live_shaders.len() + self.live_programs.len() + self.live_buffers.len()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GlFacade for RecordingFacade {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DriverError> {
        self.calls.push(GlCall::CompileShader(stage));
        if source.contains("#error") {
            return Err(DriverError::ShaderCompile {
                stage,
                log: "0:1: '#error' : deliberate failure".to_string(),
            });
        }
        let id = ShaderId(self.next_id());
        self.live_shaders.insert(id);
        self.pending.shaders.push(id);
        Ok(id)
    }

    fn link_program(
        &mut self,
        _vertex: ShaderId,
        _fragment: ShaderId,
    ) -> Result<ProgramId, DriverError> {
        if self.fail_link {
            return Err(DriverError::ProgramLink {
                log: "deliberate link failure".to_string(),
            });
        }
        let id = ProgramId(self.next_id());
        self.calls.push(GlCall::LinkProgram(id));
        self.live_programs.insert(id);
        self.pending.programs.push(id);
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(GlCall::UseProgram(program));
    }

    fn create_buffer(&mut self) -> Result<BufferId, DriverError> {
        let id = BufferId(self.next_id());
        self.calls.push(GlCall::CreateBuffer(id));
        self.live_buffers.insert(id);
        self.pending.buffers.push(id);
        Ok(id)
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        self.calls.push(GlCall::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&mut self, data: &[f32]) {
        self.calls.push(GlCall::BufferData { floats: data.len() });
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let key = (program, name.to_string());
        let next = self.locations.len() as u32;
        let slot = *self.locations.entry(key).or_insert(next);
        Some(AttribLocation(slot))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let key = (program, name.to_string());
        let next = self.locations.len() as u32;
        let slot = *self.locations.entry(key).or_insert(next);
        Some(UniformLocation(slot))
    }

    fn enable_vertex_attrib(&mut self, location: AttribLocation) {
        self.calls.push(GlCall::EnableVertexAttrib(location));
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: AttribLocation,
        size: i32,
        ty: NumberType,
        _normalize: bool,
        _stride: i32,
        _offset: i32,
    ) {
        self.calls.push(GlCall::VertexAttribPointer { location, size, ty });
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.calls.push(GlCall::SetUniform {
            location,
            values: vec![value],
        });
    }

    fn set_uniform_vec2(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.calls.push(GlCall::SetUniform {
            location,
            values: value.to_vec(),
        });
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.calls.push(GlCall::SetUniform {
            location,
            values: value.to_vec(),
        });
    }

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: [f32; 9]) {
        self.calls.push(GlCall::SetUniform {
            location,
            values: value.to_vec(),
        });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(GlCall::Clear(color));
    }

    fn resize_to_display(&mut self) -> bool {
        self.calls.push(GlCall::ResizeToDisplay);
        let resized = self.drawable != self.display;
        self.drawable = self.display;
        resized
    }

    fn surface_size(&self) -> (u32, u32) {
        self.drawable
    }

    fn draw_arrays(&mut self, topology: Topology, first: i32, count: i32) {
        self.calls.push(GlCall::DrawArrays {
            topology,
            first,
            count,
        });
    }

    fn drain_allocations(&mut self) -> Allocations {
        std::mem::take(&mut self.pending)
    }

    fn release(&mut self, allocations: Allocations) {
        if allocations.is_empty() {
            return;
        }
        self.calls.push(GlCall::Release {
            shaders: allocations.shaders.len(),
            programs: allocations.programs.len(),
            buffers: allocations.buffers.len(),
        });
        for shader in allocations.shaders {
            self.live_shaders.remove(&shader);
        }
        for program in allocations.programs {
            self.live_programs.remove(&program);
        }
        for buffer in allocations.buffers {
            self.live_buffers.remove(&buffer);
        }
    }
}

/// One recorded scheduler call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleCall {
    After(Duration),
    OnRefresh,
    Cancel(ScheduleToken),
}

/// Frame scheduler double: hands out tokens, records calls, and lets tests
/// fire pending continuations themselves via [`RenderDriver::pump`].
///
/// [`RenderDriver::pump`]: crate::RenderDriver::pump
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pub calls: Vec<ScheduleCall>,
    next: u64,
    pending: Option<ScheduleToken>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<ScheduleToken> {
        self.pending
    }

    /// Delays of every delay-path schedule, in order.
    pub fn delay_schedules(&self) -> Vec<Duration> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                ScheduleCall::After(delay) => Some(*delay),
                _ => None,
            })
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, ScheduleCall::OnRefresh))
            .count()
    }

    fn next_token(&mut self) -> ScheduleToken {
        self.next += 1;
        ScheduleToken(self.next)
    }
}

impl FrameScheduler for RecordingScheduler {
    fn schedule_after(&mut self, delay: Duration) -> ScheduleToken {
        let token = self.next_token();
        self.calls.push(ScheduleCall::After(delay));
        self.pending = Some(token);
        token
    }

    fn schedule_on_refresh(&mut self) -> ScheduleToken {
        let token = self.next_token();
        self.calls.push(ScheduleCall::OnRefresh);
        self.pending = Some(token);
        token
    }

    fn cancel(&mut self, token: ScheduleToken) {
        self.calls.push(ScheduleCall::Cancel(token));
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}
