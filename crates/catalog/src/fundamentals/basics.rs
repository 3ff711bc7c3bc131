//! Ports of the "WebGL Fundamentals" starter lessons.

use std::time::Duration;

use anyhow::{Context, Result};
use driver::{
    AttribLocation, BufferId, ExampleDescriptor, FramePacing, GlFacade, NumberType, ProgramId,
    Topology, TweakSpec, TweakValues, UniformLocation,
};
use rand::Rng;

use crate::Section;

const REF: &str = "https://webglfundamentals.org/webgl/lessons/webgl-fundamentals.html";

pub fn section() -> Section {
    Section::leaf(
        "Basics",
        vec![basic(), uniforms(), web_coordinate_space(), summary()],
    )
}

// --- Basic: one clip-space triangle ---------------------------------------

const BASIC_VERTEX: &str = r#"
// an attribute will receive its data from a buffer
attribute vec4 a_position;

void main() {
  // gl_Position is the output a vertex shader must set
  gl_Position = a_position;
}
"#;

const BASIC_FRAGMENT: &str = r#"
// fragment shaders need an explicit default precision
precision mediump float;

void main() {
  // gl_FragColor is the output a fragment shader must set
  gl_FragColor = vec4(1, 0, 0.5, 1);
}
"#;

struct BasicState {
    position: AttribLocation,
    buffer: BufferId,
}

fn basic() -> ExampleDescriptor {
    ExampleDescriptor::animated(
        "Basic",
        REF,
        BASIC_VERTEX,
        BASIC_FRAGMENT,
        Vec::new(),
        basic_setup,
        basic_frame,
    )
}

fn basic_setup(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    _tweaks: &TweakValues,
) -> Result<BasicState> {
    let position = gl
        .attrib_location(program, "a_position")
        .context("a_position attribute missing")?;
    let buffer = gl.create_buffer()?;
    gl.bind_array_buffer(buffer);
    gl.array_buffer_data(&[0.0, 0.0, 0.0, 0.5, 0.7, 0.0]);
    Ok(BasicState { position, buffer })
}

fn basic_frame(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    state: &mut BasicState,
    _tweaks: &TweakValues,
) -> Result<FramePacing> {
    gl.clear([0.0, 0.0, 0.0, 0.0]);
    gl.use_program(program);
    gl.enable_vertex_attrib(state.position);
    gl.bind_array_buffer(state.buffer);
    // two components per vertex, tightly packed floats
    gl.vertex_attrib_pointer(state.position, 2, NumberType::Float, false, 0, 0);
    gl.draw_arrays(Topology::Triangles, 0, 3);
    Ok(FramePacing::OnRefresh)
}

// --- Uniforms: a rectangle colored through u_color ------------------------

const PIXEL_SPACE_VERTEX: &str = r#"
attribute vec2 a_position;
uniform vec2 u_resolution;

void main() {
  // convert the position from pixels to 0.0..1.0
  vec2 zeroToOne = a_position / u_resolution;

  // convert from 0..1 to clip space, flipping Y so 0,0 is top-left
  vec2 clipSpace = zeroToOne * 2.0 - 1.0;
  gl_Position = vec4(clipSpace * vec2(1, -1), 0, 1);
}
"#;

const UNIFORM_COLOR_FRAGMENT: &str = r#"
precision mediump float;
uniform vec4 u_color;

void main() {
  // the color is settable from the outside via a uniform
  gl_FragColor = u_color;
}
"#;

fn uniforms() -> ExampleDescriptor {
    ExampleDescriptor::still(
        "Uniforms",
        REF,
        PIXEL_SPACE_VERTEX,
        UNIFORM_COLOR_FRAGMENT,
        Vec::new(),
        uniforms_setup,
    )
}

fn uniforms_setup(gl: &mut dyn GlFacade, program: ProgramId, _tweaks: &TweakValues) -> Result<()> {
    let position = gl
        .attrib_location(program, "a_position")
        .context("a_position attribute missing")?;
    let resolution = gl
        .uniform_location(program, "u_resolution")
        .context("u_resolution uniform missing")?;
    let color = gl
        .uniform_location(program, "u_color")
        .context("u_color uniform missing")?;

    let buffer = gl.create_buffer()?;
    gl.bind_array_buffer(buffer);
    set_rectangle(gl, 40.0, 40.0, 160.0, 90.0);

    gl.clear([0.0, 0.0, 0.0, 0.0]);
    gl.use_program(program);
    gl.enable_vertex_attrib(position);
    gl.bind_array_buffer(buffer);
    gl.vertex_attrib_pointer(position, 2, NumberType::Float, false, 0, 0);

    let (width, height) = gl.surface_size();
    gl.set_uniform_vec2(resolution, [width as f32, height as f32]);
    gl.set_uniform_vec4(color, [0.2, 0.4, 0.9, 1.0]);
    gl.draw_arrays(Topology::Triangles, 0, 6);
    Ok(())
}

// --- Web coordinate space: positions given in pixels ----------------------

const REDDISH_FRAGMENT: &str = r#"
precision mediump float;

void main() {
  gl_FragColor = vec4(1, 0, 0.5, 1);
}
"#;

struct WebCoordinateState {
    position: AttribLocation,
    buffer: BufferId,
    resolution: UniformLocation,
}

fn web_coordinate_space() -> ExampleDescriptor {
    ExampleDescriptor::animated(
        "Web coordinate space",
        REF,
        PIXEL_SPACE_VERTEX,
        REDDISH_FRAGMENT,
        Vec::new(),
        web_coordinate_setup,
        web_coordinate_frame,
    )
}

fn web_coordinate_setup(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    _tweaks: &TweakValues,
) -> Result<WebCoordinateState> {
    let position = gl
        .attrib_location(program, "a_position")
        .context("a_position attribute missing")?;
    let resolution = gl
        .uniform_location(program, "u_resolution")
        .context("u_resolution uniform missing")?;

    let buffer = gl.create_buffer()?;
    gl.bind_array_buffer(buffer);
    gl.array_buffer_data(&[
        10.0, 20.0, 80.0, 20.0, 10.0, 30.0, //
        10.0, 30.0, 80.0, 20.0, 80.0, 30.0,
    ]);
    Ok(WebCoordinateState {
        position,
        buffer,
        resolution,
    })
}

fn web_coordinate_frame(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    state: &mut WebCoordinateState,
    _tweaks: &TweakValues,
) -> Result<FramePacing> {
    gl.clear([0.0, 0.0, 0.0, 0.0]);
    gl.use_program(program);

    let (width, height) = gl.surface_size();
    gl.set_uniform_vec2(state.resolution, [width as f32, height as f32]);

    gl.enable_vertex_attrib(state.position);
    gl.bind_array_buffer(state.buffer);
    gl.vertex_attrib_pointer(state.position, 2, NumberType::Float, false, 0, 0);
    gl.draw_arrays(Topology::Triangles, 0, 6);
    Ok(FramePacing::OnRefresh)
}

// --- Summary: many random rectangles, intentionally throttled -------------

struct SummaryState {
    color: UniformLocation,
}

fn summary() -> ExampleDescriptor {
    ExampleDescriptor::animated(
        "Summary",
        REF,
        PIXEL_SPACE_VERTEX,
        UNIFORM_COLOR_FRAGMENT,
        vec![
            TweakSpec::range("count", 1.0, 100.0, 50.0, |v, t| t.set("count", v)),
            TweakSpec::range("interval", 10.0, 1000.0, 400.0, |v, t| t.set("interval", v)),
        ],
        summary_setup,
        summary_frame,
    )
}

fn summary_setup(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    _tweaks: &TweakValues,
) -> Result<SummaryState> {
    let position = gl
        .attrib_location(program, "a_position")
        .context("a_position attribute missing")?;
    let resolution = gl
        .uniform_location(program, "u_resolution")
        .context("u_resolution uniform missing")?;
    let color = gl
        .uniform_location(program, "u_color")
        .context("u_color uniform missing")?;

    let buffer = gl.create_buffer()?;
    gl.bind_array_buffer(buffer);
    gl.array_buffer_data(&[
        10.0, 20.0, 80.0, 20.0, 10.0, 30.0, //
        10.0, 30.0, 80.0, 20.0, 80.0, 30.0,
    ]);

    gl.clear([0.0, 0.0, 0.0, 0.0]);
    gl.use_program(program);
    gl.enable_vertex_attrib(position);
    gl.bind_array_buffer(buffer);
    gl.vertex_attrib_pointer(position, 2, NumberType::Float, false, 0, 0);

    let (width, height) = gl.surface_size();
    gl.set_uniform_vec2(resolution, [width as f32, height as f32]);
    Ok(SummaryState { color })
}

fn summary_frame(
    gl: &mut dyn GlFacade,
    _program: ProgramId,
    state: &mut SummaryState,
    tweaks: &TweakValues,
) -> Result<FramePacing> {
    // start each frame fresh; only this frame's rectangles stay visible
    gl.clear([0.0, 0.0, 0.0, 0.0]);

    let count = tweaks.get("count").unwrap_or(50.0) as u32;
    let (surface_width, surface_height) = gl.surface_size();
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let width = rng.gen_range(0.0..400.0f32);
        let height = rng.gen_range(0.0..300.0f32);
        let x = random_offset(&mut rng, surface_width as f32 - width);
        let y = random_offset(&mut rng, surface_height as f32 - height);

        // writes into the buffer still bound from setup
        set_rectangle(gl, x, y, width, height);
        gl.set_uniform_vec4(
            state.color,
            [rng.gen(), rng.gen(), rng.gen(), 1.0],
        );
        gl.draw_arrays(Topology::Triangles, 0, 6);
    }

    let interval = tweaks.get("interval").unwrap_or(400.0);
    Ok(FramePacing::After(Duration::from_millis(interval as u64)))
}

fn random_offset(rng: &mut impl Rng, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}

/// Fills the bound array buffer with the two triangles of a rectangle.
fn set_rectangle(gl: &mut dyn GlFacade, x: f32, y: f32, width: f32, height: f32) {
    let (x1, x2) = (x, x + width);
    let (y1, y2) = (y, y + height);
    gl.array_buffer_data(&[
        x1, y1, x2, y1, x1, y2, //
        x1, y2, x2, y1, x2, y2,
    ]);
}
