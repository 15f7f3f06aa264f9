use itertools::Itertools;
use na::Vector2;
use ordered_float::OrderedFloat;

use crate::{
    contact::ContactPoint,
    error::{Error, Result},
    spatial::transform::Transform3D,
    types::Float,
    util::cross2,
};

/// A flat contact patch: a set of contact points lying in the x-y plane of
/// the plane frame, whose +z axis is the contact normal.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneContactState {
    plane_to_body: Transform3D,
    points: Vec<ContactPoint>,
    mu: Float,
}

impl PlaneContactState {
    /// The order of `points` fixes the column order in the wrench matrix.
    pub fn new(points: Vec<ContactPoint>, plane_to_body: Transform3D, mu: Float) -> Result<Self> {
        if !(mu > 0.0) {
            return Err(Error::InvalidContactParameter {
                parameter: "mu",
                value: mu,
            });
        }
        if let Some(point) = points.iter().find(|p| p.frame != plane_to_body.from) {
            return Err(Error::FrameMismatch {
                expected: plane_to_body.from.clone(),
                actual: point.frame.clone(),
            });
        }

        Ok(PlaneContactState {
            plane_to_body,
            points,
            mu,
        })
    }

    /// Rectangular foot, with the plane frame origin at the ankle projection.
    /// Points go front-right, front-left, back-left, back-right.
    pub fn rectangle(
        plane_to_body: Transform3D,
        length_forward: Float,
        length_backward: Float,
        half_width: Float,
        mu: Float,
    ) -> Result<Self> {
        let frame = plane_to_body.from.clone();
        let points = vec![
            ContactPoint::new(&frame, length_forward, -half_width),
            ContactPoint::new(&frame, length_forward, half_width),
            ContactPoint::new(&frame, -length_backward, half_width),
            ContactPoint::new(&frame, -length_backward, -half_width),
        ];
        PlaneContactState::new(points, plane_to_body, mu)
    }

    pub fn points(&self) -> &[ContactPoint] {
        &self.points
    }

    pub fn mu(&self) -> Float {
        self.mu
    }

    /// Transform from the plane frame to the body frame
    pub fn frame(&self) -> &Transform3D {
        &self.plane_to_body
    }

    pub fn plane_frame(&self) -> &str {
        &self.plane_to_body.from
    }

    /// Convex hull of the contact points, counter-clockwise, without
    /// collinear points. Andrew's monotone chain.
    pub fn support_polygon(&self) -> Vec<Vector2<Float>> {
        let sorted: Vec<Vector2<Float>> = self
            .points
            .iter()
            .map(|p| p.location)
            .sorted_by_key(|p| (OrderedFloat(p.x), OrderedFloat(p.y)))
            .dedup()
            .collect();
        if sorted.len() < 3 {
            return sorted;
        }

        let mut lower: Vec<Vector2<Float>> = vec![];
        for p in sorted.iter() {
            while lower.len() >= 2
                && cross2(
                    &(lower[lower.len() - 1] - lower[lower.len() - 2]),
                    &(p - lower[lower.len() - 2]),
                ) <= 0.0
            {
                lower.pop();
            }
            lower.push(*p);
        }

        let mut upper: Vec<Vector2<Float>> = vec![];
        for p in sorted.iter().rev() {
            while upper.len() >= 2
                && cross2(
                    &(upper[upper.len() - 1] - upper[upper.len() - 2]),
                    &(p - upper[upper.len() - 2]),
                ) <= 0.0
            {
                upper.pop();
            }
            upper.push(*p);
        }

        lower.pop();
        upper.pop();
        lower.extend(upper);
        lower
    }

    /// Whether `point` (in the plane frame) lies inside the support polygon,
    /// allowing `tolerance` outside of its edges.
    pub fn is_inside_support_polygon(&self, point: &Vector2<Float>, tolerance: Float) -> bool {
        let polygon = self.support_polygon();
        match polygon.len() {
            0 => false,
            1 => (point - polygon[0]).norm() <= tolerance,
            2 => distance_to_segment(point, &polygon[0], &polygon[1]) <= tolerance,
            n => (0..n).all(|i| {
                let a = polygon[i];
                let b = polygon[(i + 1) % n];
                let edge = b - a;
                // signed distance to the edge, positive on the inner side
                cross2(&edge, &(point - a)) / edge.norm() >= -tolerance
            }),
        }
    }
}

fn distance_to_segment(point: &Vector2<Float>, a: &Vector2<Float>, b: &Vector2<Float>) -> Float {
    let ab = b - a;
    let t = ((point - a).dot(&ab) / ab.norm_squared()).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}
