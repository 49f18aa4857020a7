//! Math utilities and types
//!
//! Provides the vector and matrix aliases shared by the scene and
//! partitioning code.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Build a vector from a `[x, y, z]` array (config files store plain arrays)
pub fn vec3_from_array(values: [f32; 3]) -> Vec3 {
    Vec3::new(values[0], values[1], values[2])
}

/// Component-wise `a <= b` on every axis
pub fn all_le(a: &Vec3, b: &Vec3) -> bool {
    a.x <= b.x && a.y <= b.y && a.z <= b.z
}

/// Component-wise `a < b` on every axis
pub fn all_lt(a: &Vec3, b: &Vec3) -> bool {
    a.x < b.x && a.y < b.y && a.z < b.z
}
