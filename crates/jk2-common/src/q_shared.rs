// q_shared.rs — vector math and error codes shared by the renderer and server

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

// angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

pub const ERR_FATAL: i32 = 4; // panic with the message
pub const ERR_DROP: i32 = 8; // log and abandon the current operation

// ============================================================
// Vector math
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `veca + scale * vecb`
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

#[inline]
pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

/// Normalize in place, returning the old length. A zero vector is left alone.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        *v = vector_scale(v, 1.0 / length);
    }
    length
}

pub fn vector_length(v: &Vec3) -> f32 {
    vector_length_squared(v).sqrt()
}

#[inline]
pub fn vector_length_squared(v: &Vec3) -> f32 {
    dot_product(v, v)
}

pub fn distance(p1: &Vec3, p2: &Vec3) -> f32 {
    vector_length(&vector_subtract(p2, p1))
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

/// Forward, left and up axes for pitch/yaw/roll in degrees.
pub fn angles_to_axis(angles: &Vec3) -> [Vec3; 3] {
    let (sp, cp) = angles[PITCH].to_radians().sin_cos();
    let (sy, cy) = angles[YAW].to_radians().sin_cos();
    let (sr, cr) = angles[ROLL].to_radians().sin_cos();

    let forward = [cp * cy, cp * sy, -sp];
    let left = [sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, sr * cp];
    let up = [cr * sp * cy + sr * sy, cr * sp * sy - sr * cy, cr * cp];
    [forward, left, up]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_axis(axis: [Vec3; 3], expected: [Vec3; 3]) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (axis[i][j] - expected[i][j]).abs() < 1e-6,
                    "axis[{}][{}] = {}",
                    i, j, axis[i][j]
                );
            }
        }
    }

    #[test]
    fn test_dot_product() {
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_vector_normalize() {
        let mut v = [3.0, 0.0, 4.0];
        let len = vector_normalize(&mut v);
        assert!((len - 5.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_vector_normalize_zero() {
        let mut v = [0.0, 0.0, 0.0];
        assert_eq!(vector_normalize(&mut v), 0.0);
        assert_eq!(v, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cross_product() {
        assert_eq!(cross_product(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_angles_to_axis_identity() {
        assert_axis(
            angles_to_axis(&[0.0, 0.0, 0.0]),
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        );
    }

    #[test]
    fn test_angles_to_axis_yaw_90() {
        // forward turns toward +Y, left toward -X
        assert_axis(
            angles_to_axis(&[0.0, 90.0, 0.0]),
            [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        );
    }

    #[test]
    fn test_angles_to_axis_roll_90() {
        // roll turns left toward +Z and up toward -Y
        assert_axis(
            angles_to_axis(&[0.0, 0.0, 90.0]),
            [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]],
        );
    }
}
