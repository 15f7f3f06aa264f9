use contact_wrench::config::WrenchDistributionConfig;
use contact_wrench::contact::{ContactBody, CylindricalContactState, PlaneContactState};
use contact_wrench::distributor::WrenchDistributor;
use contact_wrench::error::Result;
use contact_wrench::spatial::{transform::Transform3D, wrench::Wrench};
use contact_wrench::{GRAVITY, PI};
use nalgebra::{vector, UnitQuaternion, Vector3};
use tracing_subscriber::EnvFilter;

/// A robot holding two vertical rails while standing slightly behind its
/// feet. The hands have to pull the robot forward to keep it upright.
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WrenchDistributionConfig {
        column_capacity: 4 * 4 * 4 + 5,
        ..Default::default()
    };

    let mut bodies = vec![];
    for (name, y) in [("left_foot", 0.3), ("right_foot", -0.3)] {
        let sole = format!("{name}_sole");
        let plane = PlaneContactState::rectangle(Transform3D::identity(&sole, name), 0.1, 0.1, 0.1, 0.3)?;
        let mut foot = ContactBody::new_plane(Transform3D::move_xyz(name, "com", 0.4, y, -1.), plane)?;
        foot.set_load_bearing(true)?;
        bodies.push(foot);
    }
    for (name, y) in [("left_hand", 0.4), ("right_hand", -0.4)] {
        let rail = format!("{name}_rail");
        let cylinder =
            CylindricalContactState::new(0.3, 0.2, 0.3, 1800., 1.0, Transform3D::identity(&rail, name))?;
        let hand_to_com = Transform3D::from_parts(
            name,
            "com",
            vector![0.4, y, 0.5],
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI / 2.),
        );
        let mut hand = ContactBody::new_cylinder(hand_to_com, cylinder)?;
        hand.set_load_bearing(true)?;
        bodies.push(hand);
    }

    let weight = 100. * GRAVITY;
    let desired = Wrench::from_vector6(&vector![0., 0., 0., 0., 0., weight], "robot", "com");

    let mut distributor = WrenchDistributor::new("com", config)?;
    let output = distributor.distribute(&bodies, &desired)?;
    tracing::info!(status = ?output.status, resultant = ?output.resultant.as_vector6(), "distributed");
    for contact in output.contacts.iter() {
        let force = contact.wrench.linear;
        let torque = contact.wrench.angular;
        tracing::info!(
            body = %contact.body,
            fx = force.x,
            fy = force.y,
            fz = force.z,
            tx = torque.x,
            ty = torque.y,
            tz = torque.z,
        );
    }

    Ok(())
}
