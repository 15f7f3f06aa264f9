use std::ops::Mul;

use na::{Isometry3, Translation3, UnitQuaternion};
use nalgebra::Vector3;

use crate::types::Float;

/// A rigid transformation from one 3-dimensional Cartesian coordinate system
/// to another. `from` and `to` name the two frames; composing transforms
/// whose frames do not chain is a programming error and panics.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform3D {
    pub from: String,
    pub to: String,
    pub iso: Isometry3<Float>,
}

impl Transform3D {
    pub fn new(from: &str, to: &str, iso: &Isometry3<Float>) -> Self {
        Transform3D {
            from: from.to_string(),
            to: to.to_string(),
            iso: *iso,
        }
    }

    /// Build a transform from a translation and a rotation
    pub fn from_parts(
        from: &str,
        to: &str,
        translation: Vector3<Float>,
        rotation: UnitQuaternion<Float>,
    ) -> Self {
        Transform3D {
            from: from.to_string(),
            to: to.to_string(),
            iso: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    pub fn new_xyz_rpy(from: &str, to: &str, xyz: &[Float; 3], rpy: &[Float; 3]) -> Self {
        let translation = Translation3::new(xyz[0], xyz[1], xyz[2]);
        let rotation = UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]);

        Transform3D {
            from: from.to_string(),
            to: to.to_string(),
            iso: Isometry3::from_parts(translation, rotation),
        }
    }

    pub fn identity(from: &str, to: &str) -> Self {
        Transform3D::new(from, to, &Isometry3::identity())
    }

    pub fn move_z(from: &str, to: &str, amount: Float) -> Self {
        Transform3D::move_xyz(from, to, 0., 0., amount)
    }

    /// Returns a transformation of translation by (x, y, z)
    pub fn move_xyz(from: &str, to: &str, x: Float, y: Float, z: Float) -> Self {
        Transform3D {
            from: from.to_string(),
            to: to.to_string(),
            iso: Isometry3::translation(x, y, z),
        }
    }

    pub fn inv(&self) -> Self {
        Transform3D {
            from: self.to.clone(),
            to: self.from.clone(),
            iso: self.iso.inverse(),
        }
    }

    pub fn trans(&self) -> Vector3<Float> {
        self.iso.translation.vector
    }

    /// Express a point given in the `from` frame in the `to` frame
    pub fn transform_point(&self, point: &Vector3<Float>) -> Vector3<Float> {
        self.iso.rotation * point + self.trans()
    }

    /// Express a free vector given in the `from` frame in the `to` frame
    pub fn transform_vector(&self, vector: &Vector3<Float>) -> Vector3<Float> {
        self.iso.rotation * vector
    }
}

impl Mul for Transform3D {
    type Output = Transform3D;

    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Transform3D> for &'a Transform3D {
    type Output = Transform3D;

    fn mul(self, rhs: &'b Transform3D) -> Self::Output {
        if self.from != rhs.to {
            panic!(
                "lhs from frame {} is not same as rhs to frame {}!",
                self.from, rhs.to
            );
        }
        Transform3D {
            from: rhs.from.clone(),
            to: self.to.clone(),
            iso: self.iso * rhs.iso,
        }
    }
}
