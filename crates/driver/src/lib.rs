//! Render driver for the shadebook example catalog.
//!
//! The crate owns everything between "the user picked an example" and "a
//! frame landed on the surface":
//!
//! ```text
//!   shell / shadebook
//!          │ select(descriptor)
//!          ▼
//!   RenderDriver ──▶ compile ──▶ link ──▶ setup ──▶ frame ─┐
//!          ▲                                               │
//!          │        FrameScheduler (delay | refresh) ◀─────┘
//! ```
//!
//! The graphics API and the frame clock are both behind traits
//! ([`GlFacade`], [`FrameScheduler`]) so the driver can be exercised without
//! a window; [`backend::GlowFacade`] is the real OpenGL implementation and
//! [`testing`] holds the recording doubles used across the workspace's
//! tests.

mod backend;
mod error;
mod example;
mod facade;
mod pacing;
mod session;
pub mod testing;
mod tweaks;

pub use backend::GlowFacade;
pub use error::DriverError;
pub use example::{ExampleDescriptor, FrameFn, LoopFn, SetupFn};
pub use facade::{
    Allocations, AttribLocation, BufferId, GlFacade, NumberType, ProgramId, ShaderId, ShaderStage,
    Topology, UniformLocation,
};
pub use pacing::{FramePacing, FrameScheduler, ScheduleToken};
pub use session::{DriverPhase, RenderDriver, RunMode};
pub use tweaks::{ControlKind, TweakControl, TweakPanel, TweakSpec, TweakValues};
