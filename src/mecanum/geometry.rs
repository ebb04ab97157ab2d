//! Convex polygon queries for robot footprints, roadblocks and field bounds.

use nalgebra as na;

pub type Point = na::Point2<f64>;
pub type Vector = na::Vector2<f64>;

/// A convex polygon with counter-clockwise vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon from the vertices of a convex shape, in either winding.
    pub fn new(mut vertices: Vec<Point>) -> Self {
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        Self { vertices }
    }

    /// Axis-aligned rectangle spanning `min` to `max`.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::new(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    /// Rectangle of `length` along `theta` and `width` across it, centred on `center`.
    pub fn oriented_rectangle(center: Point, length: f64, width: f64, theta: f64) -> Self {
        let rotation = na::Rotation2::new(theta);
        let forward = rotation * Vector::new(length / 2.0, 0.0);
        let left = rotation * Vector::new(0.0, width / 2.0);
        Self::new(vec![
            center + forward + left,
            center - forward + left,
            center - forward - left,
            center + forward - left,
        ])
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// `p` lies in the interior; points on the boundary do not count.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.vertices.len() >= 3 && self.edges().all(|(a, b)| cross(b - a, *p - a) > 0.0)
    }

    /// `p` lies in the interior or on the boundary.
    pub fn covers_point(&self, p: &Point) -> bool {
        self.vertices.len() >= 3 && self.edges().all(|(a, b)| cross(b - a, *p - a) >= 0.0)
    }

    /// `other` lies entirely within this polygon, boundary included.
    pub fn covers(&self, other: &Polygon) -> bool {
        other.vertices.iter().all(|v| self.covers_point(v))
    }

    /// `other` lies in the interior without touching the boundary.
    pub fn contains_properly(&self, other: &Polygon) -> bool {
        other.vertices.iter().all(|v| self.contains_point(v))
    }

    /// Interiors intersect and neither polygon covers the other.
    pub fn overlaps(&self, other: &Polygon) -> bool {
        self.interiors_intersect(other) && !self.covers(other) && !other.covers(self)
    }

    /// Separating axis test; touching edges do not intersect.
    pub fn interiors_intersect(&self, other: &Polygon) -> bool {
        for polygon in [self, other] {
            for (a, b) in polygon.edges() {
                let axis = Vector::new(a.y - b.y, b.x - a.x);
                let (min_a, max_a) = self.project(&axis);
                let (min_b, max_b) = other.project(&axis);
                if max_a <= min_b || max_b <= min_a {
                    return false;
                }
            }
        }
        true
    }

    fn project(&self, axis: &Vector) -> (f64, f64) {
        self.vertices
            .iter()
            .map(|v| v.coords.dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            })
    }
}

fn cross(a: Vector, b: Vector) -> f64 {
    a.x * b.y - a.y * b.x
}

fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| cross(vertices[i].coords, vertices[(i + 1) % n].coords))
        .sum::<f64>()
        / 2.0
}
