//! Contact geometry model: where each contact body may push or pull on the
//! environment, and how hard.
//!
//! A [`ContactBody`] owns exactly one [`ContactModel`]: a planar patch of
//! contact points or a cylindrical grasp. The upstream planner mutates these
//! once per tick before the wrench matrix is built.

use itertools::Itertools;
use na::{Vector2, Vector3};

use crate::{
    error::{Error, Result},
    spatial::transform::Transform3D,
    types::Float,
};

pub mod cylinder;
pub mod plane;

pub use cylinder::CylindricalContactState;
pub use plane::PlaneContactState;

#[derive(Clone, PartialEq, Debug)]
pub struct ContactPoint {
    pub frame: String, // the plane frame the contact point is expressed in
    pub location: Vector2<Float>,
}

impl ContactPoint {
    pub fn new(frame: &str, x: Float, y: Float) -> Self {
        ContactPoint {
            frame: frame.to_string(),
            location: Vector2::new(x, y),
        }
    }

    /// The contact point as a 3-D point lying in its plane (z = 0)
    pub fn in_plane(&self) -> Vector3<Float> {
        Vector3::new(self.location.x, self.location.y, 0.)
    }

    /// Express the contact point in the "to" frame of transform
    pub fn transform(&self, transform: &Transform3D) -> Vector3<Float> {
        if self.frame != transform.from {
            panic!(
                "current frame {} != transform from frame {}",
                self.frame, transform.from
            );
        }

        transform.transform_point(&self.in_plane())
    }
}

/// The contact primitive a body currently uses.
#[derive(Clone, Debug, PartialEq)]
pub enum ContactModel {
    Plane(PlaneContactState),
    Cylinder(CylindricalContactState),
}

impl ContactModel {
    /// Transform from the contact primitive's frame to the body frame
    pub fn frame(&self) -> &Transform3D {
        match self {
            ContactModel::Plane(plane) => plane.frame(),
            ContactModel::Cylinder(cylinder) => cylinder.frame(),
        }
    }

    pub fn mu(&self) -> Float {
        match self {
            ContactModel::Plane(plane) => plane.mu(),
            ContactModel::Cylinder(cylinder) => cylinder.mu(),
        }
    }
}

/// A rigid body that can exchange forces with the environment.
///
/// `name` is also the name of the body-fixed frame. `body_to_resultant` places
/// that frame in the frame the net wrench is taken about (typically the
/// center of mass frame) and is refreshed every tick.
#[derive(Clone, Debug)]
pub struct ContactBody {
    name: String,
    body_to_resultant: Transform3D,
    load_bearing: bool,
    model: ContactModel,
}

impl ContactBody {
    /// Create a body with a plane contact. The body starts out not load-bearing.
    pub fn new_plane(body_to_resultant: Transform3D, plane: PlaneContactState) -> Result<Self> {
        let body = ContactBody {
            name: body_to_resultant.from.clone(),
            body_to_resultant,
            load_bearing: false,
            model: ContactModel::Plane(plane),
        };
        body.check_model_frame(body.model.frame())?;
        Ok(body)
    }

    /// Create a body with a cylinder contact. The body starts out not load-bearing.
    pub fn new_cylinder(
        body_to_resultant: Transform3D,
        cylinder: CylindricalContactState,
    ) -> Result<Self> {
        let body = ContactBody {
            name: body_to_resultant.from.clone(),
            body_to_resultant,
            load_bearing: false,
            model: ContactModel::Cylinder(cylinder),
        };
        body.check_model_frame(body.model.frame())?;
        Ok(body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body_to_resultant(&self) -> &Transform3D {
        &self.body_to_resultant
    }

    pub fn model(&self) -> &ContactModel {
        &self.model
    }

    pub fn plane(&self) -> Option<&PlaneContactState> {
        match &self.model {
            ContactModel::Plane(plane) => Some(plane),
            ContactModel::Cylinder(_) => None,
        }
    }

    pub fn cylinder(&self) -> Option<&CylindricalContactState> {
        match &self.model {
            ContactModel::Cylinder(cylinder) => Some(cylinder),
            ContactModel::Plane(_) => None,
        }
    }

    pub fn is_load_bearing(&self) -> bool {
        self.load_bearing
    }

    /// Allow or forbid this body to exert force on the next tick. A plane
    /// without contact points cannot be made load-bearing.
    pub fn set_load_bearing(&mut self, load_bearing: bool) -> Result<()> {
        if load_bearing {
            if let ContactModel::Plane(plane) = &self.model {
                if plane.points().is_empty() {
                    return Err(Error::EmptyContactPoints);
                }
            }
        }
        self.load_bearing = load_bearing;
        Ok(())
    }

    /// Replace the contact model by a plane patch
    pub fn set_plane_contact(
        &mut self,
        points: Vec<ContactPoint>,
        plane_to_body: Transform3D,
        mu: Float,
    ) -> Result<()> {
        if self.load_bearing && points.is_empty() {
            return Err(Error::EmptyContactPoints);
        }
        let plane = PlaneContactState::new(points, plane_to_body, mu)?;
        self.check_model_frame(plane.frame())?;
        self.model = ContactModel::Plane(plane);
        Ok(())
    }

    /// Replace the contact model by a cylindrical grasp
    #[allow(clippy::too_many_arguments)]
    pub fn set_cylinder_contact(
        &mut self,
        mu: Float,
        radius: Float,
        half_width: Float,
        tensile_grip_strength: Float,
        grip_weakness_factor: Float,
        cylinder_to_body: Transform3D,
    ) -> Result<()> {
        let cylinder = CylindricalContactState::new(
            mu,
            radius,
            half_width,
            tensile_grip_strength,
            grip_weakness_factor,
            cylinder_to_body,
        )?;
        self.check_model_frame(cylinder.frame())?;
        self.model = ContactModel::Cylinder(cylinder);
        Ok(())
    }

    /// Update where the body is relative to the resultant frame
    pub fn set_body_to_resultant(&mut self, body_to_resultant: Transform3D) -> Result<()> {
        if body_to_resultant.from != self.name {
            return Err(Error::FrameMismatch {
                expected: self.name.clone(),
                actual: body_to_resultant.from,
            });
        }
        self.body_to_resultant = body_to_resultant;
        Ok(())
    }

    /// Transform from the contact primitive's frame to the resultant frame
    pub fn model_to_resultant(&self) -> Transform3D {
        &self.body_to_resultant * self.model.frame()
    }

    fn check_model_frame(&self, model_to_body: &Transform3D) -> Result<()> {
        if model_to_body.to != self.name {
            return Err(Error::FrameMismatch {
                expected: self.name.clone(),
                actual: model_to_body.to.clone(),
            });
        }
        Ok(())
    }
}

/// Bodies are looked up by name, so no two may share one
pub fn check_unique_names(bodies: &[ContactBody]) -> Result<()> {
    match bodies.iter().map(|b| b.name()).duplicates().next() {
        Some(name) => Err(Error::DuplicateContactBody(name.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use na::vector;

    use crate::assert_vec_close;

    use super::*;

    fn left_foot() -> ContactBody {
        let plane = PlaneContactState::rectangle(
            Transform3D::move_z("left_sole", "left_foot", -0.05),
            0.2,
            0.1,
            0.1,
            0.3,
        )
        .unwrap();
        ContactBody::new_plane(Transform3D::move_xyz("left_foot", "com", 0., 0.1, -1.), plane)
            .unwrap()
    }

    #[test]
    fn test_unique_names() {
        let mut right_foot = left_foot();
        right_foot.name = "right_foot".to_string();
        assert!(check_unique_names(&[left_foot(), right_foot]).is_ok());
        assert!(matches!(
            check_unique_names(&[left_foot(), left_foot()]),
            Err(Error::DuplicateContactBody(name)) if name == "left_foot"
        ));
    }

    #[test]
    fn test_contact_point_transform() {
        // Arrange
        let point = ContactPoint::new("left_sole", 0.2, -0.1);
        let sole_to_foot = Transform3D::move_z("left_sole", "left_foot", -0.05);

        // Act
        let in_foot = point.transform(&sole_to_foot);

        // Assert
        assert_vec_close!(in_foot, vector![0.2, -0.1, -0.05], 1e-12);
    }

    #[test]
    fn test_new_body_is_not_load_bearing() {
        let foot = left_foot();
        assert_eq!(foot.name(), "left_foot");
        assert!(!foot.is_load_bearing());
        assert!(foot.plane().is_some());
        assert!(foot.cylinder().is_none());
    }

    #[test]
    fn test_model_to_resultant() {
        // Arrange
        let foot = left_foot();

        // Act
        let sole_to_com = foot.model_to_resultant();

        // Assert
        assert_eq!(sole_to_com.from, "left_sole");
        assert_eq!(sole_to_com.to, "com");
        assert_vec_close!(sole_to_com.trans(), vector![0., 0.1, -1.05], 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_friction() {
        // Arrange
        let mut foot = left_foot();
        let points = vec![ContactPoint::new("left_sole", 0., 0.)];
        let sole_to_foot = Transform3D::identity("left_sole", "left_foot");

        // Act
        let zero = foot.set_plane_contact(points.clone(), sole_to_foot.clone(), 0.0);
        let negative = foot.set_plane_contact(points, sole_to_foot, -0.5);

        // Assert
        assert!(matches!(
            zero,
            Err(Error::InvalidContactParameter { parameter: "mu", .. })
        ));
        assert!(matches!(
            negative,
            Err(Error::InvalidContactParameter { parameter: "mu", .. })
        ));
        assert_eq!(foot.model().mu(), 0.3);
    }

    #[test]
    fn test_rejects_empty_points_for_active_contact() {
        // Arrange
        let mut foot = left_foot();
        foot.set_load_bearing(true).unwrap();
        let sole_to_foot = Transform3D::identity("left_sole", "left_foot");

        // Act
        let result = foot.set_plane_contact(vec![], sole_to_foot.clone(), 0.5);

        // Assert
        assert!(matches!(result, Err(Error::EmptyContactPoints)));

        // an idle body may drop all of its points, but then cannot be loaded
        foot.set_load_bearing(false).unwrap();
        foot.set_plane_contact(vec![], sole_to_foot, 0.5).unwrap();
        assert!(matches!(
            foot.set_load_bearing(true),
            Err(Error::EmptyContactPoints)
        ));
    }

    #[test]
    fn test_rejects_model_of_other_body() {
        // Arrange
        let mut foot = left_foot();

        // Act
        let result = foot.set_cylinder_contact(
            0.3,
            0.02,
            0.05,
            100.,
            1.,
            Transform3D::identity("grip", "right_hand"),
        );

        // Assert
        assert!(matches!(result, Err(Error::FrameMismatch { .. })));
        assert!(foot.plane().is_some());
    }

    #[test]
    fn test_switch_to_cylinder() {
        // Arrange
        let mut hand = left_foot();

        // Act
        hand.set_cylinder_contact(
            0.3,
            0.02,
            0.05,
            100.,
            0.5,
            Transform3D::identity("grip", "left_foot"),
        )
        .unwrap();

        // Assert
        let cylinder = hand.cylinder().unwrap();
        assert_eq!(cylinder.grip_cap(), 50.);
        assert!(hand.plane().is_none());
    }
}
