use contact_wrench::config::WrenchDistributionConfig;
use contact_wrench::contact::{ContactBody, PlaneContactState};
use contact_wrench::distributor::WrenchDistributor;
use contact_wrench::error::Result;
use contact_wrench::spatial::{transform::Transform3D, wrench::Wrench};
use contact_wrench::GRAVITY;
use nalgebra::vector;
use tracing_subscriber::EnvFilter;

/// Distribute the weight of a standing robot over its two feet, then shift
/// the desired center of pressure toward the left foot over a few ticks.
///
/// Pass a TOML file as the first argument to override the default settings.
///
///        com
///         |
///     ____|____
///    [__]   [__]
///    left   right
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => WrenchDistributionConfig::from_file(path)?,
        None => WrenchDistributionConfig::default(),
    };

    let mass = 100.0;
    let mut bodies = vec![];
    for (name, y) in [("left_foot", 0.15), ("right_foot", -0.15)] {
        let sole = format!("{name}_sole");
        let plane = PlaneContactState::rectangle(
            Transform3D::move_z(&sole, name, -0.05),
            0.2,
            0.1,
            0.1,
            0.6,
        )?;
        let mut foot = ContactBody::new_plane(Transform3D::move_xyz(name, "com", 0., y, -0.95), plane)?;
        foot.set_load_bearing(true)?;
        bodies.push(foot);
    }

    let mut distributor = WrenchDistributor::new("com", config)?;
    for tick in 0..5 {
        // leaning left: the net force passes left of the com
        let lean = 0.03 * tick as f64;
        let weight = mass * GRAVITY;
        let desired = Wrench::from_vector6(&vector![weight * lean, 0., 0., 0., 0., weight], "robot", "com");

        let output = distributor.distribute(&bodies, &desired)?;
        tracing::info!(tick, status = ?output.status, "distributed");
        for contact in output.contacts.iter() {
            match &contact.center_of_pressure {
                Some(cop) => tracing::info!(
                    body = %contact.body,
                    normal_force = cop.normal_force,
                    cop_x = cop.cop.x,
                    cop_y = cop.cop.y,
                    normal_torque = cop.normal_torque,
                ),
                None => tracing::info!(body = %contact.body, "no center of pressure"),
            }
        }
    }

    Ok(())
}
