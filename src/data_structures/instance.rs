//! Local transformation data for scene nodes.
//!
//! Every node of the scene graph carries one [`Instance`] describing its
//! position, rotation and scale relative to its parent. World matrices are
//! obtained by multiplying the matrices of the whole ancestor chain.

use cgmath::One;
use rapier3d::na;
use rapier3d::prelude::{Isometry, Real};

/// Local transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// The rigid part (translation and rotation) of this transform as a physics isometry.
    ///
    /// Scale has no counterpart in a rigid body frame and is dropped.
    pub fn to_isometry(&self) -> Isometry<Real> {
        let q = self.rotation;
        let rotation =
            na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.s, q.v.x, q.v.y, q.v.z));
        Isometry::from_parts(
            na::Translation3::new(self.position.x, self.position.y, self.position.z),
            rotation,
        )
    }

    /// The inverse of [`Instance::to_isometry`] as a cgmath matrix.
    pub fn rigid_inverse_matrix(&self) -> cgmath::Matrix4<f32> {
        let inv = self.to_isometry().inverse().to_homogeneous();
        let mut out = cgmath::Matrix4::one();
        for col in 0..4 {
            for row in 0..4 {
                out[col][row] = inv[(row, col)];
            }
        }
        out
    }
}

/// Decomposed glTF node transforms are `(translation, rotation xyzw, scale)`.
impl From<([f32; 3], [f32; 4], [f32; 3])> for Instance {
    fn from((position, rotation, scale): ([f32; 3], [f32; 4], [f32; 3])) -> Self {
        Instance {
            position: position.into(),
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}
