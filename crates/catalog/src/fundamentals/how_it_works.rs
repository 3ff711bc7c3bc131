//! Ports of the "How It Works" lessons on varyings and matrices.

use anyhow::{Context, Result};
use driver::{
    AttribLocation, BufferId, ExampleDescriptor, FramePacing, GlFacade, NumberType, ProgramId,
    Topology, TweakSpec, TweakValues, UniformLocation,
};

use crate::m3;
use crate::Section;

const REF: &str = "https://webglfundamentals.org/webgl/lessons/webgl-how-it-works.html";

pub fn section() -> Section {
    Section::leaf("How It Works", vec![varying()])
}

const VARYING_VERTEX: &str = r#"
attribute vec2 a_position;
uniform mat3 u_matrix;

// the varying is interpolated across the triangle for the
// fragment shader to pick up
varying vec4 v_color;

void main() {
  // multiply the position by the projection and model matrix
  gl_Position = vec4((u_matrix * vec3(a_position, 1)).xy, 0, 1);

  // map clip space (-1..+1) to color space (0..1)
  v_color = gl_Position * 0.5 + 0.5;
}
"#;

const VARYING_FRAGMENT: &str = r#"
precision mediump float;

varying vec4 v_color;

void main() {
  gl_FragColor = v_color;
}
"#;

struct VaryingState {
    position: AttribLocation,
    buffer: BufferId,
    matrix: UniformLocation,
}

fn varying() -> ExampleDescriptor {
    ExampleDescriptor::animated(
        "Varying",
        REF,
        VARYING_VERTEX,
        VARYING_FRAGMENT,
        vec![
            TweakSpec::range("x", 0.0, 500.0, 100.0, |v, t| t.set("x", v)),
            TweakSpec::range("y", 0.0, 500.0, 150.0, |v, t| t.set("y", v)),
            // the slider counts degrees clockwise, the shader wants radians
            TweakSpec::range("angle", 0.0, 360.0, 0.0, |v, t| {
                t.set("angle", (360.0 - v).to_radians())
            }),
            TweakSpec::range("scaleX", -5.0, 5.0, 1.0, |v, t| t.set("scaleX", v))
                .with_step(0.1),
            TweakSpec::range("scaleY", -5.0, 5.0, 1.0, |v, t| t.set("scaleY", v))
                .with_step(0.1),
        ],
        varying_setup,
        varying_frame,
    )
}

fn varying_setup(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    _tweaks: &TweakValues,
) -> Result<VaryingState> {
    let position = gl
        .attrib_location(program, "a_position")
        .context("a_position attribute missing")?;
    let matrix = gl
        .uniform_location(program, "u_matrix")
        .context("u_matrix uniform missing")?;

    let buffer = gl.create_buffer()?;
    gl.bind_array_buffer(buffer);
    gl.array_buffer_data(&[0.0, -100.0, 150.0, 125.0, -175.0, 100.0]);
    Ok(VaryingState {
        position,
        buffer,
        matrix,
    })
}

fn varying_frame(
    gl: &mut dyn GlFacade,
    program: ProgramId,
    state: &mut VaryingState,
    tweaks: &TweakValues,
) -> Result<FramePacing> {
    gl.clear([0.0, 0.0, 0.0, 0.0]);
    gl.use_program(program);
    gl.enable_vertex_attrib(state.position);
    gl.bind_array_buffer(state.buffer);
    gl.vertex_attrib_pointer(state.position, 2, NumberType::Float, false, 0, 0);

    let x = tweaks.get("x").unwrap_or(100.0) as f32;
    let y = tweaks.get("y").unwrap_or(150.0) as f32;
    let angle = tweaks.get("angle").unwrap_or(0.0) as f32;
    let scale_x = tweaks.get("scaleX").unwrap_or(1.0) as f32;
    let scale_y = tweaks.get("scaleY").unwrap_or(1.0) as f32;

    let (width, height) = gl.surface_size();
    let mut matrix = m3::projection(width as f32, height as f32);
    matrix = m3::translate(matrix, x, y);
    matrix = m3::rotate(matrix, angle);
    matrix = m3::scale(matrix, scale_x, scale_y);
    gl.set_uniform_mat3(state.matrix, matrix);

    gl.draw_arrays(Topology::Triangles, 0, 3);
    Ok(FramePacing::OnRefresh)
}
