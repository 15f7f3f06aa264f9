//! Friction basis generation: linear approximation of each contact's
//! friction limits by a set of unit wrenches.
//!
//! A Coulomb friction cone is approximated by an inscribed pyramid with `k`
//! edges. For a flat contact with friction coefficient μ the edge directions
//! in the contact frame (normal along +z) are
//!     d_j = normalize(μ cos θ_j, μ sin θ_j, 1),  θ_j = 2πj / k
//! Any non-negative combination of the edges lies inside the true cone.

use na::Vector3;

use crate::{
    contact::{ContactBody, ContactModel, CylindricalContactState, PlaneContactState},
    spatial::{transform::Transform3D, wrench::Wrench},
    types::Float,
    PI,
};

/// A unit force direction applied at a point, both expressed in `frame`.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisVector {
    pub frame: String,
    pub point: Vector3<Float>,
    pub direction: Vector3<Float>,
}

impl BasisVector {
    /// The wrench that a unit coefficient on this basis vector exerts on `body`
    pub fn unit_wrench(&self, body: &str) -> Wrench {
        Wrench::from_force(&self.point, &self.direction, body, &self.frame)
    }
}

/// A bounded coefficient on a fixed unit wrench. Used by cylindrical grasps,
/// which may pull on and twist the cylinder as long as the grip holds.
#[derive(Clone, Debug, PartialEq)]
pub struct GripDirection {
    pub unit: Wrench,
    pub min: Float,
    pub max: Float,
}

/// Everything one body contributes to the wrench matrix, in the body frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactBasis {
    pub body: String,
    pub vectors: Vec<BasisVector>,
    pub grips: Vec<GripDirection>,
}

impl ContactBasis {
    pub fn empty(body: &str) -> Self {
        ContactBasis {
            body: body.to_string(),
            vectors: vec![],
            grips: vec![],
        }
    }

    pub fn column_count(&self) -> usize {
        self.vectors.len() + self.grips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }
}

#[derive(Clone, Debug)]
pub struct FrictionBasisGenerator {
    vectors_per_point: usize,
}

impl FrictionBasisGenerator {
    pub fn new(vectors_per_point: usize) -> Self {
        FrictionBasisGenerator { vectors_per_point }
    }

    pub fn vectors_per_point(&self) -> usize {
        self.vectors_per_point
    }

    /// Unit edges of the friction pyramid around +z
    pub fn friction_pyramid(&self, mu: Float) -> Vec<Vector3<Float>> {
        let k = self.vectors_per_point;
        (0..k)
            .map(|j| {
                let angle = 2. * PI * j as Float / k as Float;
                Vector3::new(mu * angle.cos(), mu * angle.sin(), 1.).normalize()
            })
            .collect()
    }

    /// Expand a body's contact model into basis vectors and grip directions
    /// expressed in the body frame. A body that is not load-bearing
    /// contributes nothing.
    pub fn generate(&self, body: &ContactBody) -> ContactBasis {
        if !body.is_load_bearing() {
            return ContactBasis::empty(body.name());
        }

        match body.model() {
            ContactModel::Plane(plane) => self.plane_basis(body.name(), plane),
            ContactModel::Cylinder(cylinder) => self.cylinder_basis(body.name(), cylinder),
        }
    }

    fn plane_basis(&self, body: &str, plane: &PlaneContactState) -> ContactBasis {
        let plane_to_body = plane.frame();
        let pyramid = self.pyramid_in(plane_to_body, plane.mu());

        let vectors = plane
            .points()
            .iter()
            .flat_map(|point| {
                let location = point.transform(plane_to_body);
                pyramid.iter().map(move |direction| BasisVector {
                    frame: body.to_string(),
                    point: location,
                    direction: *direction,
                })
            })
            .collect();

        ContactBasis {
            body: body.to_string(),
            vectors,
            grips: vec![],
        }
    }

    fn cylinder_basis(&self, body: &str, cylinder: &CylindricalContactState) -> ContactBasis {
        let cylinder_to_body = cylinder.frame();
        let pyramid = self.pyramid_in(cylinder_to_body, cylinder.mu());

        // Contact at both ends of the grasp, on the side of the cylinder facing the hand
        let (r, hw) = (cylinder.radius(), cylinder.half_width());
        let surface_points = [Vector3::new(0., -hw, r), Vector3::new(0., hw, r)];
        let vectors = surface_points
            .iter()
            .flat_map(|p| {
                let location = cylinder_to_body.transform_point(p);
                pyramid.iter().map(move |direction| BasisVector {
                    frame: body.to_string(),
                    point: location,
                    direction: *direction,
                })
            })
            .collect();

        let cap = cylinder.grip_cap();
        let mu = cylinder.mu();
        let origin = Vector3::zeros();
        let frame = cylinder_to_body.from.as_str();
        #[rustfmt::skip]
        let grips_in_cylinder = [
            // pull toward the cylinder
            (Wrench::from_force(&origin, &-Vector3::z(), body, frame), 0., cap),
            // sideways, across the axis
            (Wrench::from_force(&origin, &Vector3::x(), body, frame), -cap, cap),
            // sliding along the axis
            (Wrench::from_force(&origin, &Vector3::y(), body, frame), -mu * cap, mu * cap),
            // bending the grasp about the surface normal axis
            (pure_torque(Vector3::x(), body, frame), -cap * hw, cap * hw),
            // twisting around the cylinder axis
            (pure_torque(Vector3::y(), body, frame), -mu * cap * r, mu * cap * r),
        ];
        let grips = grips_in_cylinder
            .into_iter()
            .map(|(unit, min, max)| GripDirection {
                unit: unit.transform(cylinder_to_body),
                min,
                max,
            })
            .collect();

        ContactBasis {
            body: body.to_string(),
            vectors,
            grips,
        }
    }

    fn pyramid_in(&self, contact_to_body: &Transform3D, mu: Float) -> Vec<Vector3<Float>> {
        self.friction_pyramid(mu)
            .iter()
            .map(|d| contact_to_body.transform_vector(d))
            .collect()
    }
}

fn pure_torque(axis: Vector3<Float>, body: &str, frame: &str) -> Wrench {
    Wrench {
        body: body.to_string(),
        frame: frame.to_string(),
        angular: axis,
        linear: Vector3::zeros(),
    }
}

#[cfg(test)]
mod tests {
    use na::{vector, UnitQuaternion};

    use crate::{assert_close, assert_vec_close, contact::ContactPoint};

    use super::*;

    fn foot(points: usize, mu: Float) -> ContactBody {
        let points = (0..points)
            .map(|i| ContactPoint::new("sole", 0.05 * i as Float, 0.01 * i as Float))
            .collect();
        let plane = PlaneContactState::new(points, Transform3D::identity("sole", "foot"), mu).unwrap();
        let mut body = ContactBody::new_plane(Transform3D::identity("foot", "com"), plane).unwrap();
        body.set_load_bearing(true).unwrap();
        body
    }

    fn hand(tensile: Float) -> ContactBody {
        let cylinder = CylindricalContactState::new(
            0.3,
            0.2,
            0.3,
            tensile,
            1.0,
            Transform3D::identity("rail", "hand"),
        )
        .unwrap();
        let mut body = ContactBody::new_cylinder(Transform3D::identity("hand", "com"), cylinder).unwrap();
        body.set_load_bearing(true).unwrap();
        body
    }

    #[test]
    fn test_pyramid_edges_lie_on_cone() {
        // Arrange
        let mu = 0.7;
        let generator = FrictionBasisGenerator::new(6);

        // Act
        let pyramid = generator.friction_pyramid(mu);

        // Assert
        assert_eq!(pyramid.len(), 6);
        for d in pyramid.iter() {
            assert_close!(d.norm(), 1.0, 1e-12);
            assert_close!(d.xy().norm() / d.z, mu, 1e-12);
        }
        assert_vec_close!(pyramid[0], vector![mu, 0., 1.].normalize(), 1e-12);
    }

    #[test]
    fn test_plane_basis_count() {
        for (points, k) in [(1, 3), (4, 4), (3, 8)] {
            let generator = FrictionBasisGenerator::new(k);
            for mu in [0.1, 0.5, 1.3] {
                let basis = generator.generate(&foot(points, mu));
                assert_eq!(basis.vectors.len(), points * k);
                assert!(basis.grips.is_empty());
            }
        }
    }

    #[test]
    fn test_unloaded_body_has_no_basis() {
        // Arrange
        let mut body = foot(4, 0.5);
        body.set_load_bearing(false).unwrap();

        // Act
        let basis = FrictionBasisGenerator::new(4).generate(&body);

        // Assert
        assert!(basis.is_empty());
        assert_eq!(basis.body, "foot");
    }

    #[test]
    fn test_plane_basis_follows_plane_orientation() {
        // Arrange: the sole faces +x in the foot frame
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI / 2.);
        let sole_to_foot = Transform3D::from_parts("sole", "foot", vector![0., 0., -0.1], rotation);
        let plane =
            PlaneContactState::new(vec![ContactPoint::new("sole", 0., 0.)], sole_to_foot, 0.5).unwrap();
        let mut body = ContactBody::new_plane(Transform3D::identity("foot", "com"), plane).unwrap();
        body.set_load_bearing(true).unwrap();

        // Act
        let basis = FrictionBasisGenerator::new(4).generate(&body);

        // Assert
        for v in basis.vectors.iter() {
            assert_eq!(v.frame, "foot");
            assert_vec_close!(v.point, vector![0., 0., -0.1], 1e-12);
            assert_close!(v.direction.x, 1. / (1.25 as Float).sqrt(), 1e-12);
        }
    }

    #[test]
    fn test_cylinder_basis() {
        // Arrange
        let body = hand(100.);

        // Act
        let basis = FrictionBasisGenerator::new(4).generate(&body);

        // Assert
        assert_eq!(basis.vectors.len(), 8);
        assert_eq!(basis.grips.len(), 5);
        assert_vec_close!(basis.vectors[0].point, vector![0., -0.3, 0.2], 1e-12);
        assert_vec_close!(basis.vectors[4].point, vector![0., 0.3, 0.2], 1e-12);

        let pull = &basis.grips[0];
        assert_eq!((pull.min, pull.max), (0., 100.));
        assert_vec_close!(pull.unit.linear, vector![0., 0., -1.], 1e-12);

        let twist = &basis.grips[4];
        assert_close!(twist.max, 0.3 * 100. * 0.2, 1e-12);
        assert_close!(twist.min, -twist.max, 1e-12);
        assert_vec_close!(twist.unit.angular, vector![0., 1., 0.], 1e-12);
    }

    #[test]
    fn test_cylinder_without_grip_has_closed_bounds() {
        let basis = FrictionBasisGenerator::new(4).generate(&hand(0.));
        assert_eq!(basis.grips.len(), 5);
        for grip in basis.grips.iter() {
            assert_eq!(grip.min, 0.);
            assert_eq!(grip.max, 0.);
        }
    }
}
