use na::Vector2;

use crate::{
    config::WrenchDistributionConfig,
    contact::ContactBody,
    error::{Error, Result},
    spatial::{transform::Transform3D, wrench::Wrench},
    types::Float,
};

/// How far outside the support polygon a center of pressure may lie and
/// still count as inside.
const SUPPORT_POLYGON_TOLERANCE: Float = 1e-9;

/// A plane wrench reduced to a normal force acting at the center of
/// pressure plus a torque about the plane normal.
#[derive(Clone, Debug, PartialEq)]
pub struct CenterOfPressure {
    /// In the plane frame
    pub cop: Vector2<Float>,
    pub normal_force: Float,
    /// Torque about the normal through the center of pressure
    pub normal_torque: Float,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactFeasibility {
    /// Pushing on the contact surface, never pulling
    pub compressive: bool,
    /// Strictly inside the friction cone
    pub within_friction: bool,
    pub cop_inside_support: bool,
    /// None when the normal force is too small to resolve one
    pub cop: Option<Vector2<Float>>,
}

impl ContactFeasibility {
    pub fn is_feasible(&self) -> bool {
        self.compressive && self.within_friction && self.cop_inside_support
    }
}

pub struct CenterOfPressureResolver {
    min_normal_force: Float,
}

impl CenterOfPressureResolver {
    pub fn new(config: &WrenchDistributionConfig) -> Self {
        CenterOfPressureResolver {
            min_normal_force: config.min_normal_force,
        }
    }

    /// Center of pressure of `wrench` on the plane whose frame is placed by
    /// `plane_to_frame` in the frame the wrench is expressed in.
    ///
    /// With the plane wrench written as a force f at (x, y, 0) plus a pure
    /// torque τn about z,
    ///     τx = y fz,  τy = -x fz,  τz = x fy - y fx + τn
    pub fn resolve(&self, wrench: &Wrench, plane_to_frame: &Transform3D) -> Result<CenterOfPressure> {
        if plane_to_frame.to != wrench.frame {
            return Err(Error::FrameMismatch {
                expected: wrench.frame.clone(),
                actual: plane_to_frame.to.clone(),
            });
        }

        let in_plane = wrench.transform(&plane_to_frame.inv());
        let (torque, force) = (in_plane.angular, in_plane.linear);
        if force.z.abs() < self.min_normal_force {
            return Err(Error::DegenerateNormalForce {
                normal_force: force.z,
            });
        }

        let cop = Vector2::new(-torque.y / force.z, torque.x / force.z);
        let normal_torque = torque.z - (cop.x * force.y - cop.y * force.x);
        Ok(CenterOfPressure {
            cop,
            normal_force: force.z,
            normal_torque,
        })
    }

    /// Center of pressure on a body's contact plane, for a wrench in the body frame
    pub fn resolve_on_body(&self, wrench: &Wrench, body: &ContactBody) -> Result<CenterOfPressure> {
        let plane = body
            .plane()
            .ok_or_else(|| Error::NotAPlaneContact(body.name().to_string()))?;
        self.resolve(wrench, plane.frame())
    }

    /// Check that a plane contact can physically exert `wrench` (body frame)
    pub fn check_feasibility(&self, wrench: &Wrench, body: &ContactBody) -> Result<ContactFeasibility> {
        let plane = body
            .plane()
            .ok_or_else(|| Error::NotAPlaneContact(body.name().to_string()))?;
        let plane_to_body = plane.frame();
        if plane_to_body.to != wrench.frame {
            return Err(Error::FrameMismatch {
                expected: wrench.frame.clone(),
                actual: plane_to_body.to.clone(),
            });
        }

        let force = wrench.transform(&plane_to_body.inv()).linear;
        let compressive = force.z > 0.;
        let within_friction = compressive && force.x.hypot(force.y) / force.z < plane.mu();
        let cop = match self.resolve(wrench, plane_to_body) {
            Ok(resolved) => Some(resolved.cop),
            Err(Error::DegenerateNormalForce { .. }) => None,
            Err(e) => return Err(e),
        };
        let cop_inside_support = cop
            .map(|cop| plane.is_inside_support_polygon(&cop, SUPPORT_POLYGON_TOLERANCE))
            .unwrap_or(false);

        Ok(ContactFeasibility {
            compressive,
            within_friction,
            cop_inside_support,
            cop,
        })
    }
}

#[cfg(test)]
mod tests {
    use na::{vector, UnitQuaternion, Vector3};

    use crate::{assert_close, assert_vec_close, contact::PlaneContactState, PI};

    use super::*;

    fn resolver() -> CenterOfPressureResolver {
        CenterOfPressureResolver::new(&WrenchDistributionConfig::default())
    }

    fn foot(sole_to_foot: Transform3D) -> ContactBody {
        let plane = PlaneContactState::rectangle(sole_to_foot, 0.2, 0.1, 0.1, 0.5).unwrap();
        ContactBody::new_plane(Transform3D::identity("foot", "com"), plane).unwrap()
    }

    #[test]
    fn test_cop_of_force_at_point() {
        // Arrange
        let sole_to_foot = Transform3D::identity("sole", "foot");
        let point = vector![0.05, -0.03, 0.];
        let force = vector![10., -5., 100.];
        let mut wrench = Wrench::from_force(&point, &force, "foot", "foot");
        wrench.angular.z += 0.7;

        // Act
        let resolved = resolver().resolve(&wrench, &sole_to_foot).unwrap();

        // Assert
        assert_vec_close!(resolved.cop, vector![0.05, -0.03], 1e-12);
        assert_close!(resolved.normal_force, 100., 1e-12);
        assert_close!(resolved.normal_torque, 0.7, 1e-12);
    }

    #[test]
    fn test_cop_on_tilted_plane() {
        // Arrange: sole rotated and offset in the foot frame
        let sole_to_foot = Transform3D::from_parts(
            "sole",
            "foot",
            vector![0.1, 0.2, -0.3],
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI / 6.),
        );
        let point_in_sole = vector![-0.04, 0.02, 0.];
        let force_in_sole = vector![1., 2., 50.];
        let wrench = Wrench::from_force(&point_in_sole, &force_in_sole, "foot", "sole")
            .transform(&sole_to_foot);

        // Act
        let resolved = resolver().resolve(&wrench, &sole_to_foot).unwrap();

        // Assert
        assert_vec_close!(resolved.cop, vector![-0.04, 0.02], 1e-12);
        assert_close!(resolved.normal_torque, 0., 1e-12);
    }

    #[test]
    fn test_degenerate_normal_force() {
        let sole_to_foot = Transform3D::identity("sole", "foot");
        let wrench = Wrench::from_vector6(&vector![1., 1., 0., 3., 0., 1e-9], "foot", "foot");
        let result = resolver().resolve(&wrench, &sole_to_foot);
        assert!(matches!(result, Err(Error::DegenerateNormalForce { .. })));
    }

    #[test]
    fn test_resolve_rejects_wrong_frame() {
        let wrench = Wrench::zero("foot", "com");
        let result = resolver().resolve(&wrench, &Transform3D::identity("sole", "foot"));
        assert!(matches!(result, Err(Error::FrameMismatch { .. })));
    }

    #[test]
    fn test_feasible_push() {
        // Arrange
        let body = foot(Transform3D::move_z("sole", "foot", -0.05));
        let wrench = Wrench::from_force(&vector![0.1, 0.05, -0.05], &vector![5., 5., 100.], "foot", "foot");

        // Act
        let feasibility = resolver().check_feasibility(&wrench, &body).unwrap();

        // Assert
        assert!(feasibility.is_feasible());
        assert_vec_close!(feasibility.cop.unwrap(), vector![0.1, 0.05], 1e-12);
    }

    #[test]
    fn test_infeasible_wrenches() {
        // Arrange
        let body = foot(Transform3D::identity("sole", "foot"));
        let resolver = resolver();
        let outside = Wrench::from_force(&vector![0.3, 0., 0.], &vector![0., 0., 100.], "foot", "foot");
        let slipping = Wrench::from_force(&vector![0., 0., 0.], &vector![60., 0., 100.], "foot", "foot");
        let pulling = Wrench::from_force(&vector![0., 0., 0.], &vector![0., 0., -100.], "foot", "foot");
        let idle = Wrench::zero("foot", "foot");

        // Act
        let outside = resolver.check_feasibility(&outside, &body).unwrap();
        let slipping = resolver.check_feasibility(&slipping, &body).unwrap();
        let pulling = resolver.check_feasibility(&pulling, &body).unwrap();
        let idle = resolver.check_feasibility(&idle, &body).unwrap();

        // Assert
        assert!(outside.compressive && outside.within_friction && !outside.cop_inside_support);
        assert!(slipping.compressive && !slipping.within_friction && slipping.cop_inside_support);
        assert!(!pulling.compressive && !pulling.within_friction);
        assert!(!idle.is_feasible());
        assert_eq!(idle.cop, None);
    }
}
