use crate::{
    error::{Error, Result},
    spatial::transform::Transform3D,
    types::Float,
};

/// A grasp around a cylinder, e.g. a hand on a rail.
///
/// The cylinder frame has its y-axis along the cylinder axis and its +z axis
/// pointing in the direction the cylinder pushes the hand. The hand touches
/// the cylinder over `[-half_width, half_width]` along the axis.
#[derive(Clone, Debug, PartialEq)]
pub struct CylindricalContactState {
    cylinder_to_body: Transform3D,
    mu: Float,
    radius: Float,
    half_width: Float,
    tensile_grip_strength: Float,
    grip_weakness_factor: Float,
}

impl CylindricalContactState {
    pub fn new(
        mu: Float,
        radius: Float,
        half_width: Float,
        tensile_grip_strength: Float,
        grip_weakness_factor: Float,
        cylinder_to_body: Transform3D,
    ) -> Result<Self> {
        for (parameter, value) in [("mu", mu), ("radius", radius), ("half_width", half_width)] {
            if !(value > 0.0) {
                return Err(Error::InvalidContactParameter { parameter, value });
            }
        }
        if !(tensile_grip_strength >= 0.0) {
            return Err(Error::InvalidContactParameter {
                parameter: "tensile_grip_strength",
                value: tensile_grip_strength,
            });
        }
        if !(0.0..=1.0).contains(&grip_weakness_factor) {
            return Err(Error::InvalidContactParameter {
                parameter: "grip_weakness_factor",
                value: grip_weakness_factor,
            });
        }

        Ok(CylindricalContactState {
            cylinder_to_body,
            mu,
            radius,
            half_width,
            tensile_grip_strength,
            grip_weakness_factor,
        })
    }

    /// Transform from the cylinder frame to the body frame
    pub fn frame(&self) -> &Transform3D {
        &self.cylinder_to_body
    }

    pub fn mu(&self) -> Float {
        self.mu
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    pub fn half_width(&self) -> Float {
        self.half_width
    }

    pub fn tensile_grip_strength(&self) -> Float {
        self.tensile_grip_strength
    }

    pub fn grip_weakness_factor(&self) -> Float {
        self.grip_weakness_factor
    }

    /// Largest pulling force the grasp may exert on the cylinder
    pub fn grip_cap(&self) -> Float {
        self.tensile_grip_strength * self.grip_weakness_factor
    }
}
