use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use catalog::{NavigationIndex, Section};
use driver::{
    DriverError, ExampleDescriptor, FrameScheduler, GlowFacade, RenderDriver, ScheduleToken,
    TweakPanel,
};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use tracing_subscriber::EnvFilter;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints every example position and breadcrumb label, in catalog order.
pub fn list() -> Result<()> {
    let sections = catalog::catalog();
    let index = NavigationIndex::new(&sections);
    for position in 0..index.len() {
        if let Some(label) = index.label(position) {
            println!("{:>3}  {label}", position + 1);
        }
    }
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let sections = catalog::catalog();
    let index = NavigationIndex::new(&sections);
    if index.is_empty() {
        bail!("the catalog contains no examples");
    }

    let initial = match args.example.as_deref() {
        Some(query) => locate(&index, query)?,
        None => 0,
    };

    let (width, height) = args.size.unwrap_or((800, 600));
    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    let bootstrap = create_gl_window(&event_loop, width, height)?;
    let GlBootstrap {
        window,
        gl_surface,
        gl_context,
        gl,
    } = bootstrap;

    let inner = window.inner_size();
    let mut facade = GlowFacade::new(gl, (inner.width, inner.height));
    let mut scheduler = LoopScheduler::new(Arc::clone(&window));
    let mut driver = RenderDriver::new();

    let mut position = initial;
    let mut control = 0usize;
    let show_source = args.show_source;

    select_example(
        &mut driver,
        &mut facade,
        &mut scheduler,
        &sections,
        &index,
        position,
        show_source,
    );
    present(&gl_surface, &gl_context);

    event_loop
        .run(move |event, elwt| match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                if let Some(token) = scheduler.take_due(Instant::now()) {
                    pump(&mut driver, &mut facade, &mut scheduler, token);
                    present(&gl_surface, &gl_context);
                }
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    facade.set_display_size(new_size.width, new_size.height);
                    gl_surface.resize(
                        &gl_context,
                        NonZeroU32::new(new_size.width).unwrap_or(NonZeroU32::MIN),
                        NonZeroU32::new(new_size.height).unwrap_or(NonZeroU32::MIN),
                    );
                }
                WindowEvent::RedrawRequested => {
                    if let Some(token) = scheduler.take_refresh() {
                        pump(&mut driver, &mut facade, &mut scheduler, token);
                        present(&gl_surface, &gl_context);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    match navigation_action(&event.logical_key) {
                        Some(Action::Quit) => elwt.exit(),
                        Some(Action::Next) => {
                            position = (position + 1) % index.len();
                            select_example(
                                &mut driver,
                                &mut facade,
                                &mut scheduler,
                                &sections,
                                &index,
                                position,
                                show_source,
                            );
                            control = 0;
                            present(&gl_surface, &gl_context);
                        }
                        Some(Action::Previous) => {
                            position = (position + index.len() - 1) % index.len();
                            select_example(
                                &mut driver,
                                &mut facade,
                                &mut scheduler,
                                &sections,
                                &index,
                                position,
                                show_source,
                            );
                            control = 0;
                            present(&gl_surface, &gl_context);
                        }
                        Some(Action::NextControl) => {
                            if let Some(panel) = driver.panel().filter(|p| !p.hidden()) {
                                control = (control + 1) % panel.controls().len();
                                print_control(panel, control);
                            }
                        }
                        Some(Action::Nudge(steps)) => {
                            if driver.tweak_nudge(control, steps).is_some() {
                                if let Some(panel) = driver.panel() {
                                    print_control(panel, control);
                                }
                            }
                        }
                        None => {}
                    }
                }
                _ => {}
            },
            Event::AboutToWait => match scheduler.deadline() {
                Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                None => elwt.set_control_flow(ControlFlow::Wait),
            },
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

enum Action {
    Next,
    Previous,
    NextControl,
    Nudge(i32),
    Quit,
}

fn navigation_action(key: &Key) -> Option<Action> {
    match key {
        Key::Named(NamedKey::ArrowRight) => Some(Action::Next),
        Key::Named(NamedKey::ArrowLeft) => Some(Action::Previous),
        Key::Named(NamedKey::Tab) => Some(Action::NextControl),
        Key::Named(NamedKey::ArrowUp) => Some(Action::Nudge(1)),
        Key::Named(NamedKey::ArrowDown) => Some(Action::Nudge(-1)),
        Key::Named(NamedKey::Escape) => Some(Action::Quit),
        Key::Character(value) => match value.as_str() {
            "n" => Some(Action::Next),
            "p" => Some(Action::Previous),
            "q" => Some(Action::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Maps a command-line selector to a position: a 1-based number from
/// `list`, or a case-insensitive label substring.
fn locate(index: &NavigationIndex, query: &str) -> Result<usize> {
    if let Ok(number) = query.parse::<usize>() {
        if (1..=index.len()).contains(&number) {
            return Ok(number - 1);
        }
        bail!("example {number} is out of range (1..={})", index.len());
    }
    index
        .find(query)
        .with_context(|| format!("no example matches '{query}'"))
}

fn select_example(
    driver: &mut RenderDriver,
    facade: &mut GlowFacade,
    scheduler: &mut LoopScheduler,
    sections: &[Section],
    index: &NavigationIndex,
    position: usize,
    show_source: bool,
) {
    let Some(descriptor) = index.resolve(sections, position) else {
        tracing::error!(position, "navigation produced a dangling example position");
        return;
    };
    if let Some(label) = index.label(position) {
        tracing::info!(%label, "selecting example");
        println!("\n{label}");
        println!("  {}", descriptor.reference);
    }
    if show_source {
        print_sources(descriptor);
    }
    if let Err(err) = driver.select(facade, scheduler, descriptor) {
        tracing::error!(error = %err, title = descriptor.title, "selection failed");
        return;
    }
    if let Some(panel) = driver.panel().filter(|p| !p.hidden()) {
        for control_index in 0..panel.controls().len() {
            print_control(panel, control_index);
        }
    }
}

fn pump(
    driver: &mut RenderDriver,
    facade: &mut GlowFacade,
    scheduler: &mut LoopScheduler,
    token: ScheduleToken,
) {
    if let Err(err) = driver.pump(facade, scheduler, token) {
        tracing::error!(error = %err, "frame failed; session aborted");
    }
}

fn present(gl_surface: &Surface<WindowSurface>, gl_context: &PossiblyCurrentContext) {
    if let Err(err) = gl_surface.swap_buffers(gl_context) {
        tracing::warn!(error = %err, "failed to present frame");
    }
}

fn print_control(panel: &TweakPanel, index: usize) {
    let Some(control) = panel.controls().get(index) else {
        return;
    };
    let (min, max) = control.bounds();
    match control.readout() {
        Some(readout) => println!("  [{}] {} = {readout}  ({min}..{max})", index + 1, control.name()),
        None => println!("  [{}] {} = {}", index + 1, control.name(), control.value()),
    }
}

fn print_sources(descriptor: &ExampleDescriptor) {
    println!("--- vertex shader ---{}", descriptor.vertex_source);
    println!("--- fragment shader ---{}", descriptor.fragment_source);
}

/// Failures to acquire the display, context, or surface are fatal at
/// startup; they carry the driver's missing-surface error kind.
fn surface_error(what: &str, err: impl fmt::Display) -> DriverError {
    DriverError::MissingSurface(format!("{what}: {err}"))
}

struct GlBootstrap {
    window: Arc<Window>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    gl: glow::Context,
}

/// Creates the window, a GLES 2 (or desktop GL 2.1) context, and the glow
/// bindings loaded from the display.
fn create_gl_window(event_loop: &EventLoop<()>, width: u32, height: u32) -> Result<GlBootstrap> {
    let window_builder = WindowBuilder::new()
        .with_title("shadebook")
        .with_inner_size(LogicalSize::new(width, height));
    let template = ConfigTemplateBuilder::new();
    let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

    let (window, gl_config) = display_builder
        .build(event_loop, template, |mut configs| {
            configs
                .next()
                .expect("the display offers at least one GL config")
        })
        .map_err(|err| surface_error("failed to initialise the GL display", err))?;
    let window = window
        .ok_or_else(|| surface_error("failed to open the window", "no window was created"))?;

    let raw_handle = window.raw_window_handle();
    let gl_display = gl_config.display();
    let gles = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
        .build(Some(raw_handle));
    let legacy = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(2, 1))))
        .build(Some(raw_handle));
    let not_current = unsafe {
        gl_display
            .create_context(&gl_config, &gles)
            .or_else(|_| gl_display.create_context(&gl_config, &legacy))
    }
    .map_err(|err| surface_error("failed to create a GL context", err))?;

    let attrs = window.build_surface_attributes(Default::default());
    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .map_err(|err| surface_error("failed to create the window surface", err))?;
    let gl_context = not_current
        .make_current(&gl_surface)
        .map_err(|err| surface_error("failed to make the GL context current", err))?;
    if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
    {
        tracing::debug!(error = %err, "vsync swap interval not supported");
    }

    let gl = unsafe {
        glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
    };

    Ok(GlBootstrap {
        window: Arc::new(window),
        gl_surface,
        gl_context,
        gl,
    })
}

/// Bridges the driver's scheduling requests onto the winit event loop: a
/// delay becomes a `WaitUntil` deadline, a refresh request becomes a redraw
/// request. At most one continuation is outstanding at a time.
struct LoopScheduler {
    window: Arc<Window>,
    next_token: u64,
    pending: Option<Pending>,
}

#[derive(Clone, Copy)]
struct Pending {
    token: ScheduleToken,
    kind: PendingKind,
}

#[derive(Clone, Copy)]
enum PendingKind {
    Refresh,
    Delay(Instant),
}

impl LoopScheduler {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_token: 1,
            pending: None,
        }
    }

    fn mint(&mut self) -> ScheduleToken {
        let token = ScheduleToken(self.next_token);
        self.next_token += 1;
        token
    }

    /// Deadline of the pending delay continuation, if any.
    fn deadline(&self) -> Option<Instant> {
        match self.pending {
            Some(Pending {
                kind: PendingKind::Delay(at),
                ..
            }) => Some(at),
            _ => None,
        }
    }

    /// Consumes the pending delay continuation once its deadline passed.
    fn take_due(&mut self, now: Instant) -> Option<ScheduleToken> {
        match self.pending {
            Some(Pending {
                token,
                kind: PendingKind::Delay(at),
            }) if at <= now => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }

    /// Consumes the pending refresh continuation, if one is outstanding.
    /// OS-initiated redraws with no continuation pending are left alone.
    fn take_refresh(&mut self) -> Option<ScheduleToken> {
        match self.pending {
            Some(Pending {
                token,
                kind: PendingKind::Refresh,
            }) => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }
}

impl FrameScheduler for LoopScheduler {
    fn schedule_after(&mut self, delay: Duration) -> ScheduleToken {
        let token = self.mint();
        self.pending = Some(Pending {
            token,
            kind: PendingKind::Delay(Instant::now() + delay),
        });
        token
    }

    fn schedule_on_refresh(&mut self) -> ScheduleToken {
        let token = self.mint();
        self.pending = Some(Pending {
            token,
            kind: PendingKind::Refresh,
        });
        self.window.request_redraw();
        token
    }

    fn cancel(&mut self, token: ScheduleToken) {
        if self.pending.is_some_and(|pending| pending.token == token) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_failures_carry_the_missing_surface_kind() {
        let err = surface_error("failed to create a GL context", "EGL_BAD_MATCH");
        assert!(matches!(err, DriverError::MissingSurface(_)));
        let text = err.to_string();
        assert!(text.contains("drawing surface unavailable"));
        assert!(text.contains("EGL_BAD_MATCH"));
    }
}
