use anyhow::Result;

use crate::facade::{GlFacade, ProgramId};
use crate::pacing::FramePacing;
use crate::tweaks::{TweakSpec, TweakValues};

/// Per-frame continuation of a running session. Owns the example's state;
/// dropped when the session is superseded.
pub type FrameFn = Box<dyn FnMut(&mut dyn GlFacade, &TweakValues) -> Result<FramePacing>>;

/// Setup operation of an example: runs exactly once per selection against a
/// freshly linked program and returns the example's state.
pub type SetupFn<State> = fn(&mut dyn GlFacade, ProgramId, &TweakValues) -> Result<State>;

/// Loop operation of an example: runs once per frame and decides how the
/// next frame is paced.
pub type LoopFn<State> =
    fn(&mut dyn GlFacade, ProgramId, &mut State, &TweakValues) -> Result<FramePacing>;

type BeginFn = Box<dyn Fn(&mut dyn GlFacade, ProgramId, &TweakValues) -> Result<Option<FrameFn>>>;

/// One self-contained teaching example: a shader pair, a setup routine, an
/// optional per-frame loop, and its tweakable parameters.
///
/// The setup/loop pair agrees on a concrete `State` type, checked where the
/// descriptor is built; the driver only ever sees the erased [`FrameFn`]
/// that `begin` returns. State is created fresh on every selection and never
/// shared across examples.
pub struct ExampleDescriptor {
    pub title: &'static str,
    /// Link to the lesson this example accompanies.
    pub reference: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
    pub tweaks: Vec<TweakSpec>,
    begin: BeginFn,
}

impl ExampleDescriptor {
    /// An example with a per-frame loop.
    pub fn animated<State: 'static>(
        title: &'static str,
        reference: &'static str,
        vertex_source: &'static str,
        fragment_source: &'static str,
        tweaks: Vec<TweakSpec>,
        setup: SetupFn<State>,
        frame: LoopFn<State>,
    ) -> Self {
        let begin: BeginFn = Box::new(move |gl, program, values| {
            let mut state = setup(gl, program, values)?;
            let continuation: FrameFn =
                Box::new(move |gl, values| frame(gl, program, &mut state, values));
            Ok(Some(continuation))
        });
        Self {
            title,
            reference,
            vertex_source,
            fragment_source,
            tweaks,
            begin,
        }
    }

    /// An example that draws once during setup and then stays static.
    pub fn still<State: 'static>(
        title: &'static str,
        reference: &'static str,
        vertex_source: &'static str,
        fragment_source: &'static str,
        tweaks: Vec<TweakSpec>,
        setup: SetupFn<State>,
    ) -> Self {
        let begin: BeginFn = Box::new(move |gl, program, values| {
            setup(gl, program, values)?;
            Ok(None)
        });
        Self {
            title,
            reference,
            vertex_source,
            fragment_source,
            tweaks,
            begin,
        }
    }

    /// Runs the example's setup. Returns the per-frame continuation, or
    /// `None` for still examples.
    pub fn begin(
        &self,
        gl: &mut dyn GlFacade,
        program: ProgramId,
        values: &TweakValues,
    ) -> Result<Option<FrameFn>> {
        (self.begin)(gl, program, values)
    }
}
