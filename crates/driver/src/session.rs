use std::mem;
use std::time::Duration;

use tracing::debug;

use crate::error::DriverError;
use crate::example::{ExampleDescriptor, FrameFn};
use crate::facade::{Allocations, GlFacade, ProgramId, ShaderStage};
use crate::pacing::{FramePacing, FrameScheduler, ScheduleToken};
use crate::tweaks::{TweakPanel, TweakValues};

/// Scheduling mode the session is currently running under. Re-decided on
/// every frame from the loop's returned [`FramePacing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    DelayDriven,
    RefreshDriven,
}

/// Lifecycle phase of the driver.
///
/// `Cancelled` is entered the moment a new selection supersedes a running
/// session and is terminal for that session; the phase then immediately
/// moves on to `Compiling` for the new one. A still example rests at `Idle`
/// after its setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    Compiling,
    Linking,
    Running(RunMode),
    Cancelled,
}

/// Live state of the currently selected example.
struct Session {
    program: ProgramId,
    frame: Option<FrameFn>,
    tweaks: TweakValues,
    panel: TweakPanel,
    pending: Option<ScheduleToken>,
    allocations: Allocations,
}

/// Owns the compile → link → setup → loop lifecycle of the selected example
/// and the scheduling of repeated frames.
///
/// Exactly one session is active at a time. [`select`](RenderDriver::select)
/// always cancels the previous session's pending continuation and releases
/// its tracked graphics objects before the new compile begins. The graphics
/// facade and the scheduler are passed in per call; the driver holds no
/// reference to either.
#[derive(Default)]
pub struct RenderDriver {
    session: Option<Session>,
    phase: DriverPhase,
}

impl Default for DriverPhase {
    fn default() -> Self {
        DriverPhase::Idle
    }
}

impl RenderDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Token of the pending scheduled continuation, if any.
    pub fn pending(&self) -> Option<ScheduleToken> {
        self.session.as_ref().and_then(|s| s.pending)
    }

    /// Tweak controls of the active session.
    pub fn panel(&self) -> Option<&TweakPanel> {
        self.session.as_ref().map(|s| &s.panel)
    }

    /// Tweak values of the active session.
    pub fn tweak_values(&self) -> Option<&TweakValues> {
        self.session.as_ref().map(|s| &s.tweaks)
    }

    /// Linked program of the active session.
    pub fn program(&self) -> Option<ProgramId> {
        self.session.as_ref().map(|s| s.program)
    }

    /// Selects `descriptor`, superseding whatever was running.
    ///
    /// Cancels the previous session's pending continuation (delay timer or
    /// refresh callback, whichever was outstanding), releases its graphics
    /// objects, matches the surface to its displayed size, compiles and
    /// links the shader pair, runs `setup` exactly once, and, for animated
    /// examples, runs the first frame immediately and schedules the next
    /// one according to its pacing.
    ///
    /// On compile, link, or setup failure the selection aborts entirely:
    /// everything created for it is released, no frame is scheduled, the
    /// surface is cleared, and the error is returned to the caller.
    pub fn select(
        &mut self,
        gl: &mut dyn GlFacade,
        scheduler: &mut dyn FrameScheduler,
        descriptor: &ExampleDescriptor,
    ) -> Result<(), DriverError> {
        self.cancel_current(gl, scheduler);
        gl.resize_to_display();

        match self.start_session(gl, scheduler, descriptor) {
            Ok(()) => Ok(()),
            Err(err) => {
                let orphaned = gl.drain_allocations();
                gl.release(orphaned);
                gl.clear([0.0, 0.0, 0.0, 0.0]);
                self.set_phase(DriverPhase::Idle);
                Err(err)
            }
        }
    }

    /// Entry point for a fired scheduled continuation.
    ///
    /// A token that no longer matches the pending one belongs to a
    /// superseded session and is ignored. Otherwise the surface size is
    /// re-checked, the loop runs once, and the next frame is scheduled per
    /// its returned pacing. A failing loop aborts the session.
    pub fn pump(
        &mut self,
        gl: &mut dyn GlFacade,
        scheduler: &mut dyn FrameScheduler,
        token: ScheduleToken,
    ) -> Result<(), DriverError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.pending != Some(token) {
            debug!(?token, "ignoring stale frame continuation");
            return Ok(());
        }
        session.pending = None;

        match Self::run_frame(gl, scheduler, session) {
            Ok(Some(mode)) => {
                self.set_phase(DriverPhase::Running(mode));
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.abort(gl, scheduler);
                Err(err)
            }
        }
    }

    /// Commits an input value to the active session's control at `index`.
    /// The write completes before the next frame runs, so the loop's next
    /// invocation sees it.
    pub fn tweak_input(&mut self, index: usize, raw: f64) -> Option<f64> {
        let session = self.session.as_mut()?;
        session.panel.input(index, raw, &mut session.tweaks)
    }

    /// Moves the control at `index` by `steps` increments of its step size.
    pub fn tweak_nudge(&mut self, index: usize, steps: i32) -> Option<f64> {
        let session = self.session.as_mut()?;
        session.panel.nudge(index, steps, &mut session.tweaks)
    }

    fn start_session(
        &mut self,
        gl: &mut dyn GlFacade,
        scheduler: &mut dyn FrameScheduler,
        descriptor: &ExampleDescriptor,
    ) -> Result<(), DriverError> {
        self.set_phase(DriverPhase::Compiling);
        let vertex = gl.compile_shader(ShaderStage::Vertex, descriptor.vertex_source)?;
        let fragment = gl.compile_shader(ShaderStage::Fragment, descriptor.fragment_source)?;

        self.set_phase(DriverPhase::Linking);
        let program = gl.link_program(vertex, fragment)?;

        let tweaks = TweakValues::seeded(&descriptor.tweaks);
        let panel = TweakPanel::new(&descriptor.tweaks);
        let frame = descriptor.begin(gl, program, &tweaks)?;

        let mut session = Session {
            program,
            frame,
            tweaks,
            panel,
            pending: None,
            allocations: Allocations::default(),
        };

        let mode = Self::run_frame(gl, scheduler, &mut session)?;
        session.allocations = gl.drain_allocations();
        self.session = Some(session);

        match mode {
            Some(mode) => self.set_phase(DriverPhase::Running(mode)),
            None => self.set_phase(DriverPhase::Idle),
        }
        debug!(title = descriptor.title, "session started");
        Ok(())
    }

    /// Runs one loop invocation and schedules its successor. Returns the
    /// new run mode, or `None` for still sessions.
    fn run_frame(
        gl: &mut dyn GlFacade,
        scheduler: &mut dyn FrameScheduler,
        session: &mut Session,
    ) -> Result<Option<RunMode>, DriverError> {
        gl.resize_to_display();
        let Session {
            frame,
            tweaks,
            pending,
            ..
        } = session;
        let Some(frame) = frame.as_mut() else {
            return Ok(None);
        };
        let pacing = frame(gl, tweaks)?;
        let (token, mode) = Self::schedule(scheduler, pacing);
        *pending = Some(token);
        Ok(Some(mode))
    }

    fn schedule(
        scheduler: &mut dyn FrameScheduler,
        pacing: FramePacing,
    ) -> (ScheduleToken, RunMode) {
        match pacing {
            FramePacing::After(delay) if delay > Duration::ZERO => {
                (scheduler.schedule_after(delay), RunMode::DelayDriven)
            }
            // a non-positive delay falls back to refresh pacing
            FramePacing::After(_) | FramePacing::OnRefresh => {
                (scheduler.schedule_on_refresh(), RunMode::RefreshDriven)
            }
        }
    }

    fn cancel_current(&mut self, gl: &mut dyn GlFacade, scheduler: &mut dyn FrameScheduler) {
        if let Some(mut session) = self.session.take() {
            if let Some(token) = session.pending.take() {
                scheduler.cancel(token);
            }
            gl.release(mem::take(&mut session.allocations));
            self.set_phase(DriverPhase::Cancelled);
        }
    }

    /// Tears down a session whose loop failed mid-run.
    fn abort(&mut self, gl: &mut dyn GlFacade, scheduler: &mut dyn FrameScheduler) {
        self.cancel_current(gl, scheduler);
        let orphaned = gl.drain_allocations();
        gl.release(orphaned);
        self.set_phase(DriverPhase::Idle);
    }

    fn set_phase(&mut self, phase: DriverPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "driver phase change");
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::ExampleDescriptor;
    use crate::facade::{GlFacade, NumberType, ProgramId, Topology};
    use crate::pacing::FramePacing;
    use crate::testing::{GlCall, RecordingFacade, RecordingScheduler, ScheduleCall};
    use crate::tweaks::{TweakSpec, TweakValues};
    use anyhow::{Context, Result};
    use std::time::Duration;

    struct TriState {
        buffer: crate::facade::BufferId,
        position: crate::facade::AttribLocation,
    }

    fn tri_setup(
        gl: &mut dyn GlFacade,
        program: ProgramId,
        _tweaks: &TweakValues,
    ) -> Result<TriState> {
        let position = gl
            .attrib_location(program, "a_position")
            .context("a_position missing")?;
        let buffer = gl.create_buffer()?;
        gl.bind_array_buffer(buffer);
        gl.array_buffer_data(&[0.0, 0.0, 0.0, 0.5, 0.7, 0.0]);
        Ok(TriState { buffer, position })
    }

    fn tri_frame(
        gl: &mut dyn GlFacade,
        program: ProgramId,
        state: &mut TriState,
        _tweaks: &TweakValues,
    ) -> Result<FramePacing> {
        gl.clear([0.0; 4]);
        gl.use_program(program);
        gl.enable_vertex_attrib(state.position);
        gl.bind_array_buffer(state.buffer);
        gl.vertex_attrib_pointer(state.position, 2, NumberType::Float, false, 0, 0);
        gl.draw_arrays(Topology::Triangles, 0, 3);
        Ok(FramePacing::OnRefresh)
    }

    fn throttled_frame(
        gl: &mut dyn GlFacade,
        program: ProgramId,
        state: &mut TriState,
        tweaks: &TweakValues,
    ) -> Result<FramePacing> {
        tri_frame(gl, program, state, tweaks)?;
        let interval = tweaks.get("interval").unwrap_or(400.0);
        Ok(FramePacing::After(Duration::from_millis(interval as u64)))
    }

    fn refresh_descriptor() -> ExampleDescriptor {
        ExampleDescriptor::animated(
            "triangle",
            "ref",
            "vertex source",
            "fragment source",
            Vec::new(),
            tri_setup,
            tri_frame,
        )
    }

    fn throttled_descriptor() -> ExampleDescriptor {
        ExampleDescriptor::animated(
            "throttled",
            "ref",
            "vertex source",
            "fragment source",
            vec![
                TweakSpec::range("count", 1.0, 100.0, 50.0, |v, t| t.set("count", v)),
                TweakSpec::range("interval", 10.0, 1000.0, 400.0, |v, t| t.set("interval", v)),
            ],
            tri_setup,
            throttled_frame,
        )
    }

    fn still_descriptor() -> ExampleDescriptor {
        ExampleDescriptor::still(
            "still",
            "ref",
            "vertex source",
            "fragment source",
            Vec::new(),
            |gl, program, _tweaks| {
                gl.clear([0.0; 4]);
                gl.use_program(program);
                gl.draw_arrays(Topology::Triangles, 0, 3);
                Ok(())
            },
        )
    }

    #[test]
    fn select_runs_first_frame_and_schedules_refresh() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();

        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::RefreshDriven));
        assert_eq!(scheduler.refresh_count(), 1);
        assert_eq!(scheduler.delay_schedules(), Vec::<Duration>::new());
        assert!(scheduler.pending().is_some());
        assert_eq!(
            gl.calls
                .iter()
                .filter(|c| matches!(c, GlCall::DrawArrays { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn reselect_cancels_pending_continuation() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        let first = driver.pending().unwrap();
        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();

        assert!(scheduler.calls.contains(&ScheduleCall::Cancel(first)));
        // exactly one continuation is pending at any time
        let second = driver.pending().unwrap();
        assert_ne!(first, second);
        assert_eq!(scheduler.pending(), Some(second));
    }

    #[test]
    fn stale_token_is_ignored_after_reselect() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        let stale = driver.pending().unwrap();
        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();

        let draws_before = gl
            .calls
            .iter()
            .filter(|c| matches!(c, GlCall::DrawArrays { .. }))
            .count();
        driver.pump(&mut gl, &mut scheduler, stale).unwrap();
        let draws_after = gl
            .calls
            .iter()
            .filter(|c| matches!(c, GlCall::DrawArrays { .. }))
            .count();
        assert_eq!(draws_before, draws_after);
    }

    #[test]
    fn positive_delay_schedules_via_delay_path_each_cycle() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &throttled_descriptor())
            .unwrap();
        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::DelayDriven));

        // three scheduling cycles: the first frame ran inside select
        for _ in 0..2 {
            let token = driver.pending().unwrap();
            driver.pump(&mut gl, &mut scheduler, token).unwrap();
        }

        assert_eq!(
            scheduler.delay_schedules(),
            vec![
                Duration::from_millis(400),
                Duration::from_millis(400),
                Duration::from_millis(400)
            ]
        );
        assert_eq!(scheduler.refresh_count(), 0);
    }

    #[test]
    fn tweak_write_is_seen_by_next_frame() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &throttled_descriptor())
            .unwrap();

        let interval = driver.panel().unwrap().control_index("interval").unwrap();
        let committed = driver.tweak_input(interval, 200.0);
        assert_eq!(committed, Some(200.0));
        assert_eq!(
            driver.panel().unwrap().controls()[interval].readout(),
            Some("200")
        );

        let token = driver.pending().unwrap();
        driver.pump(&mut gl, &mut scheduler, token).unwrap();
        assert_eq!(
            scheduler.delay_schedules().last(),
            Some(&Duration::from_millis(200))
        );
    }

    #[test]
    fn reselecting_same_descriptor_compiles_and_sets_up_again() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();
        let descriptor = refresh_descriptor();

        driver.select(&mut gl, &mut scheduler, &descriptor).unwrap();
        let first_program = driver.program().unwrap();
        driver.select(&mut gl, &mut scheduler, &descriptor).unwrap();
        let second_program = driver.program().unwrap();

        assert_ne!(first_program, second_program);
        let vertex_compiles = gl
            .calls
            .iter()
            .filter(|c| matches!(c, GlCall::CompileShader(ShaderStage::Vertex)))
            .count();
        assert_eq!(vertex_compiles, 2);
        // one buffer per setup invocation
        let buffers = gl
            .calls
            .iter()
            .filter(|c| matches!(c, GlCall::CreateBuffer(_)))
            .count();
        assert_eq!(buffers, 2);
    }

    #[test]
    fn vertex_compile_failure_aborts_selection() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        let broken = ExampleDescriptor::animated(
            "broken",
            "ref",
            "#error deliberate",
            "fragment source",
            Vec::new(),
            tri_setup,
            tri_frame,
        );
        let err = driver.select(&mut gl, &mut scheduler, &broken).unwrap_err();

        match err {
            DriverError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(driver.pending().is_none());
        assert!(scheduler.pending().is_none());
        assert_eq!(driver.phase(), DriverPhase::Idle);
        assert_eq!(gl.live_object_count(), 0);
    }

    #[test]
    fn link_failure_aborts_selection() {
        let mut gl = RecordingFacade::new();
        gl.fail_link = true;
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        let err = driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap_err();
        assert!(matches!(err, DriverError::ProgramLink { .. }));
        assert!(scheduler.pending().is_none());
        assert_eq!(gl.live_object_count(), 0);
    }

    #[test]
    fn failed_selection_supersedes_previous_session() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        let pending = driver.pending().unwrap();

        let broken = ExampleDescriptor::animated(
            "broken",
            "ref",
            "#error deliberate",
            "fragment source",
            Vec::new(),
            tri_setup,
            tri_frame,
        );
        let _ = driver.select(&mut gl, &mut scheduler, &broken).unwrap_err();

        // the old continuation was cancelled and nothing new was scheduled
        assert!(scheduler.calls.contains(&ScheduleCall::Cancel(pending)));
        assert!(scheduler.pending().is_none());
        assert!(driver.pending().is_none());
    }

    #[test]
    fn still_example_runs_setup_without_scheduling() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &still_descriptor())
            .unwrap();

        assert_eq!(driver.phase(), DriverPhase::Idle);
        assert!(driver.pending().is_none());
        assert!(scheduler.calls.is_empty());
        assert_eq!(
            gl.calls
                .iter()
                .filter(|c| matches!(c, GlCall::DrawArrays { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn superseded_session_objects_are_released() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        let first_live = gl.live_object_count();
        assert!(first_live > 0);

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        // the new session holds the same number of objects; the old ones
        // were deleted rather than accumulated
        assert_eq!(gl.live_object_count(), first_live);
    }

    #[test]
    fn pacing_mode_is_re_decided_every_frame() {
        fn alternating_frame(
            gl: &mut dyn GlFacade,
            program: ProgramId,
            state: &mut (TriState, bool),
            tweaks: &TweakValues,
        ) -> Result<FramePacing> {
            tri_frame(gl, program, &mut state.0, tweaks)?;
            state.1 = !state.1;
            Ok(if state.1 {
                FramePacing::After(Duration::from_millis(10))
            } else {
                FramePacing::OnRefresh
            })
        }
        fn alternating_setup(
            gl: &mut dyn GlFacade,
            program: ProgramId,
            tweaks: &TweakValues,
        ) -> Result<(TriState, bool)> {
            Ok((tri_setup(gl, program, tweaks)?, false))
        }

        let descriptor = ExampleDescriptor::animated(
            "alternating",
            "ref",
            "vertex source",
            "fragment source",
            Vec::new(),
            alternating_setup,
            alternating_frame,
        );

        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver.select(&mut gl, &mut scheduler, &descriptor).unwrap();
        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::DelayDriven));

        let token = driver.pending().unwrap();
        driver.pump(&mut gl, &mut scheduler, token).unwrap();
        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::RefreshDriven));

        let token = driver.pending().unwrap();
        driver.pump(&mut gl, &mut scheduler, token).unwrap();
        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::DelayDriven));
    }

    #[test]
    fn non_positive_delay_falls_back_to_refresh() {
        fn zero_delay_frame(
            gl: &mut dyn GlFacade,
            program: ProgramId,
            state: &mut TriState,
            tweaks: &TweakValues,
        ) -> Result<FramePacing> {
            tri_frame(gl, program, state, tweaks)?;
            Ok(FramePacing::After(Duration::ZERO))
        }

        let descriptor = ExampleDescriptor::animated(
            "zero-delay",
            "ref",
            "vertex source",
            "fragment source",
            Vec::new(),
            tri_setup,
            zero_delay_frame,
        );

        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver.select(&mut gl, &mut scheduler, &descriptor).unwrap();
        assert_eq!(driver.phase(), DriverPhase::Running(RunMode::RefreshDriven));
        assert_eq!(scheduler.refresh_count(), 1);
    }

    #[test]
    fn resize_is_rechecked_before_every_frame() {
        let mut gl = RecordingFacade::new();
        let mut scheduler = RecordingScheduler::new();
        let mut driver = RenderDriver::new();

        driver
            .select(&mut gl, &mut scheduler, &refresh_descriptor())
            .unwrap();
        gl.set_display_size(640, 480);
        let token = driver.pending().unwrap();
        driver.pump(&mut gl, &mut scheduler, token).unwrap();

        assert_eq!(gl.surface_size(), (640, 480));
    }
}
