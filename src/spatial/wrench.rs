use std::ops::{Add, AddAssign, Sub, SubAssign};

use na::Vector6;
use nalgebra::Vector3;

use crate::{spatial::transform::Transform3D, types::Float};

/// A wrench represents a system of forces.
/// The wrench w^i expressed in frame i in defined as
///     w^i = (τ^i f^i) = ∑ over j (r_j^i \cross f_j^i   f_j^i)
/// where the f_j^i are forces expressed in frame i, exerted at positions r_j^i.
/// τ^i is the total torque about the origin of frame i and f^i is the total force.
///
/// `body` names the body the wrench acts on, `frame` the frame it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrench {
    pub body: String,
    pub frame: String,
    pub angular: Vector3<Float>,
    pub linear: Vector3<Float>,
}

impl Wrench {
    pub fn zero(body: &str, frame: &str) -> Self {
        Wrench {
            body: body.to_string(),
            frame: frame.to_string(),
            angular: Vector3::zeros(),
            linear: Vector3::zeros(),
        }
    }

    /// Return the wrench of a force applied at point
    pub fn from_force(
        point: &Vector3<Float>,
        force: &Vector3<Float>,
        body: &str,
        frame: &str,
    ) -> Self {
        Wrench {
            body: body.to_string(),
            frame: frame.to_string(),
            angular: point.cross(force),
            linear: *force,
        }
    }

    /// Build a wrench from a 6-vector ordered as [angular; linear]
    pub fn from_vector6(vector: &Vector6<Float>, body: &str, frame: &str) -> Self {
        Wrench {
            body: body.to_string(),
            frame: frame.to_string(),
            angular: vector.fixed_rows::<3>(0).into_owned(),
            linear: vector.fixed_rows::<3>(3).into_owned(),
        }
    }

    /// Stack the wrench as [angular; linear]
    pub fn as_vector6(&self) -> Vector6<Float> {
        let mut vector = Vector6::zeros();
        vector.fixed_rows_mut::<3>(0).copy_from(&self.angular);
        vector.fixed_rows_mut::<3>(3).copy_from(&self.linear);
        vector
    }

    /// Transform the wrench to be expressed in the "to" frame of transform.
    /// The torque is re-taken about the origin of the new frame:
    ///     f' = R f
    ///     τ' = R τ + p \cross f'
    pub fn transform(&self, transform: &Transform3D) -> Wrench {
        if self.frame != transform.from {
            panic!(
                "wrench {} frame is not equal to transform `from` {} frame!",
                self.frame, transform.from
            );
        }

        let linear = transform.iso.rotation * self.linear;
        let angular =
            transform.iso.rotation * self.angular + transform.iso.translation.vector.cross(&linear);

        Wrench {
            body: self.body.clone(),
            frame: transform.to.clone(),
            angular,
            linear,
        }
    }

    pub fn norm(&self) -> Float {
        self.as_vector6().norm()
    }
}

impl<'a, 'b> Add<&'b Wrench> for &'a Wrench {
    type Output = Wrench;

    fn add(self, rhs: &Wrench) -> Wrench {
        if self.frame != rhs.frame {
            panic!("lhs frame {} != rhs frame {}!", self.frame, rhs.frame);
        }

        Wrench {
            body: self.body.clone(),
            frame: self.frame.clone(),
            angular: self.angular + rhs.angular,
            linear: self.linear + rhs.linear,
        }
    }
}

impl AddAssign<&Wrench> for Wrench {
    fn add_assign(&mut self, rhs: &Wrench) {
        if self.frame != rhs.frame {
            panic!("lhs frame {} != rhs frame {}!", self.frame, rhs.frame);
        }

        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}

impl<'a, 'b> Sub<&'b Wrench> for &'a Wrench {
    type Output = Wrench;

    fn sub(self, rhs: &Wrench) -> Wrench {
        if self.frame != rhs.frame {
            panic!("lhs frame {} != rhs frame {}!", self.frame, rhs.frame);
        }

        Wrench {
            body: self.body.clone(),
            frame: self.frame.clone(),
            angular: self.angular - rhs.angular,
            linear: self.linear - rhs.linear,
        }
    }
}

impl SubAssign<&Wrench> for Wrench {
    fn sub_assign(&mut self, rhs: &Wrench) {
        if self.frame != rhs.frame {
            panic!("lhs frame {} != rhs frame {}!", self.frame, rhs.frame);
        }

        self.angular -= rhs.angular;
        self.linear -= rhs.linear;
    }
}

#[cfg(test)]
mod tests {
    use na::{vector, UnitQuaternion};
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        assert_vec_close,
        util::test_utils::{random_quaternion, random_vector},
        PI,
    };

    use super::*;

    #[test]
    fn test_from_force() {
        // Arrange
        let point = vector![1., 0., 0.];
        let force = vector![0., 0., 10.];

        // Act
        let wrench = Wrench::from_force(&point, &force, "foot", "com");

        // Assert
        assert_vec_close!(wrench.angular, vector![0., -10., 0.], 1e-12);
        assert_vec_close!(wrench.linear, force, 1e-12);
        assert_eq!(wrench.as_vector6(), vector![0., -10., 0., 0., 0., 10.]);
    }

    /// A force applied at a point must give the same wrench whether it is
    /// built in the body frame and transformed, or built directly in the
    /// target frame.
    #[test]
    fn test_transform_matches_direct_construction() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(3);
        let rotation = random_quaternion(&mut rng, PI);
        let translation = random_vector(&mut rng, 1.0);
        let body_to_com = Transform3D::from_parts("foot", "com", translation, rotation);
        let point = random_vector(&mut rng, 0.5);
        let force = random_vector(&mut rng, 100.0);

        // Act
        let in_body = Wrench::from_force(&point, &force, "foot", "foot");
        let transformed = in_body.transform(&body_to_com);
        let direct = Wrench::from_force(
            &body_to_com.transform_point(&point),
            &body_to_com.transform_vector(&force),
            "foot",
            "com",
        );

        // Assert
        assert_eq!(transformed.frame, "com");
        assert_vec_close!(transformed.as_vector6(), direct.as_vector6(), 1e-10);
    }

    #[test]
    fn test_transform_round_trip() {
        // Arrange
        let hand_to_com = Transform3D::from_parts(
            "hand",
            "com",
            vector![0.4, -0.4, 0.5],
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI / 2.),
        );
        let wrench = Wrench::from_vector6(&vector![1., 2., 3., 4., 5., 6.], "hand", "hand");

        // Act
        let back = wrench.transform(&hand_to_com).transform(&hand_to_com.inv());

        // Assert
        assert_eq!(back.frame, "hand");
        assert_vec_close!(back.as_vector6(), wrench.as_vector6(), 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_add_in_different_frames() {
        let a = Wrench::zero("foot", "foot");
        let b = Wrench::zero("foot", "com");
        let _ = &a + &b;
    }
}
