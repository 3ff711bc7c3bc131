use thiserror::Error;

use crate::facade::ShaderStage;

/// Failures surfaced by the render driver and its graphics facade.
///
/// Compile and link errors abort the current selection entirely: no frame is
/// scheduled, the previous session stays cancelled, and the surface is left
/// cleared. None of these are retried automatically.
#[derive(Debug, Error)]
pub enum DriverError {
    /// One shader stage rejected its source. `log` carries the diagnostic
    /// text reported by the graphics capability.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    /// The compiled stages could not be linked into a program.
    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    /// The drawing surface or GL context could not be acquired. Fatal at
    /// startup; nothing can be rendered without it.
    #[error("drawing surface unavailable: {0}")]
    MissingSurface(String),

    /// An example's `setup` or `loop` body failed.
    #[error(transparent)]
    Example(#[from] anyhow::Error),
}
