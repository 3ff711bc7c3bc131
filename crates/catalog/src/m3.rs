//! 3x3 affine matrix helper shared by the 2D lessons.
//!
//! Matrices are row-major `[f32; 9]`, with the translation in the last row,
//! so a point transforms as `[x, y, 1] * M`. The projection flips the Y
//! axis so pixel coordinates grow downward from the top-left corner.

pub type Mat3 = [f32; 9];

/// Maps pixel coordinates onto clip space, with 0,0 at the top-left.
pub fn projection(width: f32, height: f32) -> Mat3 {
    [
        2.0 / width, 0.0,           0.0,
        0.0,         -2.0 / height, 0.0,
        -1.0,        1.0,           1.0,
    ]
}

pub fn identity() -> Mat3 {
    [
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
    ]
}

pub fn translation(tx: f32, ty: f32) -> Mat3 {
    [
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        tx,  ty,  1.0,
    ]
}

pub fn rotation(angle_radians: f32) -> Mat3 {
    let c = angle_radians.cos();
    let s = angle_radians.sin();
    [
        c,   -s,  0.0,
        s,   c,   0.0,
        0.0, 0.0, 1.0,
    ]
}

pub fn scaling(sx: f32, sy: f32) -> Mat3 {
    [
        sx,  0.0, 0.0,
        0.0, sy,  0.0,
        0.0, 0.0, 1.0,
    ]
}

pub fn multiply(a: Mat3, b: Mat3) -> Mat3 {
    let mut out = [0.0; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = (0..3).map(|k| b[row * 3 + k] * a[k * 3 + col]).sum();
        }
    }
    out
}

pub fn translate(m: Mat3, tx: f32, ty: f32) -> Mat3 {
    multiply(m, translation(tx, ty))
}

pub fn rotate(m: Mat3, angle_radians: f32) -> Mat3 {
    multiply(m, rotation(angle_radians))
}

pub fn scale(m: Mat3, sx: f32, sy: f32) -> Mat3 {
    multiply(m, scaling(sx, sy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: Mat3, x: f32, y: f32) -> (f32, f32) {
        (
            x * m[0] + y * m[3] + m[6],
            x * m[1] + y * m[4] + m[7],
        )
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn identity_leaves_points_alone() {
        let (x, y) = apply(identity(), 3.0, -7.0);
        assert!(close(x, 3.0) && close(y, -7.0));
    }

    #[test]
    fn multiply_by_identity_is_a_no_op() {
        let m = translate(rotate(identity(), 0.7), 10.0, 20.0);
        assert_eq!(multiply(m, identity()), m);
    }

    #[test]
    fn translation_offsets_points() {
        let m = translation(5.0, -2.0);
        let (x, y) = apply(m, 1.0, 1.0);
        assert!(close(x, 6.0) && close(y, -1.0));
    }

    #[test]
    fn rotation_by_quarter_turn() {
        let m = rotation(std::f32::consts::FRAC_PI_2);
        let (x, y) = apply(m, 1.0, 0.0);
        assert!(close(x, 0.0) && close(y, -1.0));
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let m = projection(400.0, 300.0);
        let (x, y) = apply(m, 0.0, 0.0);
        assert!(close(x, -1.0) && close(y, 1.0));
        let (x, y) = apply(m, 400.0, 300.0);
        assert!(close(x, 1.0) && close(y, -1.0));
    }

    #[test]
    fn composed_transform_applies_in_order() {
        // translate then scale: the translation is scaled too
        let m = scale(translate(projection(200.0, 200.0), 100.0, 100.0), 2.0, 2.0);
        let (x, y) = apply(m, 0.0, 0.0);
        // origin lands where the translation put it
        assert!(close(x, 0.0) && close(y, 0.0));
        let (x, y) = apply(m, 50.0, 0.0);
        assert!(close(x, 1.0) && close(y, 0.0));
    }
}
