//! Geometry kernel for shape overlap tests
//!
//! Every world object is a polygon, circle, axis-aligned ellipse or
//! axis-aligned rectangle. Overlap tests follow one pattern: a containment
//! test on a representative point (vertex, center or corner) OR an
//! edge-vs-shape intersection test. Polygons may be concave; nothing here
//! relies on convexity or centroids.
//!
//! Points lying exactly on a polygon edge count as outside.
//!
//! Known limitation: `polygon_overlaps_polygon(p, q)` reports no overlap when
//! `q` sits strictly inside `p` with no crossing edges and no vertex of `p`
//! inside `q`. Callers put the smaller, moving shape first.
//!
//! Degenerate inputs (polygons with fewer than 3 points, non-positive radii or
//! extents, zero-length segments) trip a debug assertion and return `false` in
//! release builds.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Tolerance for "point lies on segment" checks
const EDGE_EPSILON: f32 = 1e-4;

/// Vertex count used when a circle or ellipse has to be approximated as a polygon
const CURVE_SEGMENTS: usize = 16;

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.start.distance_squared(self.end) == 0.0
    }

    /// Closest point on the segment to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let line = self.end - self.start;
        let len_sq = line.length_squared();
        if len_sq == 0.0 {
            return self.start;
        }
        let t = ((p - self.start).dot(line) / len_sq).clamp(0.0, 1.0);
        self.start + line * t
    }
}

/// An ordered ring of points; insertion order is winding order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle as a 4-point polygon
    pub fn from_rect(origin: Vec2, width: f32, height: f32) -> Self {
        Self::new(vec![
            origin,
            origin + Vec2::new(width, 0.0),
            origin + Vec2::new(width, height),
            origin + Vec2::new(0.0, height),
        ])
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// Closed ring of edges, skipping zero-length edges from repeated points
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.points.len();
        (0..n)
            .map(move |i| Segment::new(self.points[i], self.points[(i + 1) % n]))
            .filter(|s| !s.is_degenerate())
    }

    /// Bounding box as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        self.points.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(min, max), &p| (min.min(p), max.max(p)),
        )
    }

    /// Mean of the vertices. Used as an anchor point only, never for hit tests.
    pub fn vertex_mean(&self) -> Vec2 {
        if self.points.is_empty() {
            return Vec2::ZERO;
        }
        self.points.iter().copied().sum::<Vec2>() / self.points.len() as f32
    }

    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        polygon_contains_point(self, point)
    }
}

/// Circle by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// Axis-aligned ellipse by center and full width/height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle by top-left origin and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            origin: center - Vec2::new(width, height) * 0.5,
            width,
            height,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.origin + Vec2::new(self.width, self.height)
    }

    pub fn corners(&self) -> [Vec2; 4] {
        let max = self.max();
        [
            self.origin,
            Vec2::new(max.x, self.origin.y),
            max,
            Vec2::new(self.origin.x, max.y),
        ]
    }

    /// Inclusive containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.x <= max.x && p.y >= self.origin.y && p.y <= max.y
    }
}

/// Any collidable shape, in world coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Polygon(Polygon),
    Circle(Circle),
    Ellipse(Ellipse),
    Rectangle(Rect),
}

impl Shape {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle(Circle { center, radius })
    }

    pub fn ellipse(center: Vec2, width: f32, height: f32) -> Self {
        Shape::Ellipse(Ellipse {
            center,
            width,
            height,
        })
    }

    pub fn rect(origin: Vec2, width: f32, height: f32) -> Self {
        Shape::Rectangle(Rect {
            origin,
            width,
            height,
        })
    }

    pub fn polygon(points: Vec<Vec2>) -> Self {
        Shape::Polygon(Polygon::new(points))
    }

    /// Anchor point: center for curves and rectangles, vertex mean for polygons
    pub fn anchor(&self) -> Vec2 {
        match self {
            Shape::Polygon(p) => p.vertex_mean(),
            Shape::Circle(c) => c.center,
            Shape::Ellipse(e) => e.center,
            Shape::Rectangle(r) => r.origin + Vec2::new(r.width, r.height) * 0.5,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Polygon(p) => p.translate(delta),
            Shape::Circle(c) => c.center += delta,
            Shape::Ellipse(e) => e.center += delta,
            Shape::Rectangle(r) => r.origin += delta,
        }
    }

    pub fn translated(&self, delta: Vec2) -> Shape {
        let mut shape = self.clone();
        shape.translate(delta);
        shape
    }

    /// Copy of this shape moved so its anchor sits on `point`
    pub fn centered_at(&self, point: Vec2) -> Shape {
        self.translated(point - self.anchor())
    }

    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Polygon(p) => p.is_degenerate(),
            Shape::Circle(c) => c.radius <= 0.0,
            Shape::Ellipse(e) => e.width <= 0.0 || e.height <= 0.0,
            Shape::Rectangle(r) => r.width <= 0.0 || r.height <= 0.0,
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        match self {
            Shape::Polygon(p) => polygon_contains_point(p, point),
            Shape::Circle(c) => c.center.distance_squared(point) <= c.radius * c.radius,
            Shape::Ellipse(e) => ellipse_space(point, e).length_squared() <= 1.0,
            Shape::Rectangle(r) => r.contains_point(point),
        }
    }

    /// Polygon form: exact for rectangles, a 16-gon for circles and ellipses
    pub fn to_polygon(&self) -> Polygon {
        match self {
            Shape::Polygon(p) => p.clone(),
            Shape::Rectangle(r) => Polygon::new(r.corners().to_vec()),
            Shape::Circle(c) => curve_polygon(c.center, c.radius, c.radius),
            Shape::Ellipse(e) => curve_polygon(e.center, e.width * 0.5, e.height * 0.5),
        }
    }

    /// Overlap test dispatch.
    ///
    /// Pairs with a polygon use the kernel primitive for the other shape;
    /// circle pairs are exact; anything else approximates `other` as a polygon.
    pub fn overlaps(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Polygon(p), Shape::Polygon(q)) => polygon_overlaps_polygon(p, q),
            (Shape::Circle(c), Shape::Polygon(q)) | (Shape::Polygon(q), Shape::Circle(c)) => {
                circle_overlaps_polygon(c, q)
            }
            (Shape::Ellipse(e), Shape::Polygon(q)) | (Shape::Polygon(q), Shape::Ellipse(e)) => {
                ellipse_overlaps_polygon(e, q)
            }
            (Shape::Rectangle(r), Shape::Polygon(q))
            | (Shape::Polygon(q), Shape::Rectangle(r)) => rectangle_overlaps_polygon(r, q),
            (Shape::Circle(a), Shape::Circle(b)) => {
                if a.radius <= 0.0 || b.radius <= 0.0 {
                    debug_assert!(false, "degenerate circle in overlap test");
                    return false;
                }
                a.center.distance(b.center) <= a.radius + b.radius
            }
            (a, b) => a.overlaps(&Shape::Polygon(b.to_polygon())),
        }
    }
}

fn curve_polygon(center: Vec2, rx: f32, ry: f32) -> Polygon {
    let points = (0..CURVE_SEGMENTS)
        .map(|i| {
            let theta = i as f32 / CURVE_SEGMENTS as f32 * TAU;
            center + Vec2::new(rx * theta.cos(), ry * theta.sin())
        })
        .collect();
    Polygon::new(points)
}

/// Map a point into the ellipse's unit-circle space
#[inline]
fn ellipse_space(p: Vec2, e: &Ellipse) -> Vec2 {
    (p - e.center) / Vec2::new(e.width * 0.5, e.height * 0.5)
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn point_on_segment(p: Vec2, seg: Segment) -> bool {
    let line = seg.end - seg.start;
    let len = line.length();
    if len == 0.0 {
        return p.distance(seg.start) <= EDGE_EPSILON;
    }
    if cross(line, p - seg.start).abs() > EDGE_EPSILON * len {
        return false;
    }
    let t = (p - seg.start).dot(line);
    t >= -EDGE_EPSILON && t <= len * len + EDGE_EPSILON
}

/// Even-odd ray cast. Points on an edge are outside.
pub fn polygon_contains_point(polygon: &Polygon, point: Vec2) -> bool {
    if polygon.is_degenerate() {
        debug_assert!(false, "polygon with fewer than 3 points");
        return false;
    }
    if polygon.edges().any(|edge| point_on_segment(point, edge)) {
        return false;
    }

    let pts = polygon.points();
    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Orientation of the turn a→b→c: 1 counter-clockwise, -1 clockwise, 0 collinear
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i8 {
    let v = cross(b - a, c - a);
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Segment intersection; collinear overlap and touching endpoints count.
pub fn segments_intersect(a: Segment, b: Segment) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        debug_assert!(false, "zero-length segment in intersection test");
        return false;
    }

    let o1 = orientation(a.start, a.end, b.start);
    let o2 = orientation(a.start, a.end, b.end);
    let o3 = orientation(b.start, b.end, a.start);
    let o4 = orientation(b.start, b.end, a.end);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && point_on_segment(b.start, a))
        || (o2 == 0 && point_on_segment(b.end, a))
        || (o3 == 0 && point_on_segment(a.start, b))
        || (o4 == 0 && point_on_segment(a.end, b))
}

/// Any vertex of `p` inside `q`, or any edge of `p` crossing any edge of `q`.
pub fn polygon_overlaps_polygon(p: &Polygon, q: &Polygon) -> bool {
    if p.is_degenerate() || q.is_degenerate() {
        debug_assert!(false, "polygon with fewer than 3 points");
        return false;
    }
    if p.points().iter().any(|&v| polygon_contains_point(q, v)) {
        return true;
    }
    p.edges()
        .any(|pe| q.edges().any(|qe| segments_intersect(pe, qe)))
}

/// Segment passes within `radius` of `center`
pub fn line_intersects_circle(seg: Segment, circle: &Circle) -> bool {
    seg.closest_point(circle.center).distance_squared(circle.center)
        <= circle.radius * circle.radius
}

/// Center inside the polygon, or any polygon edge touching the circle.
pub fn circle_overlaps_polygon(circle: &Circle, polygon: &Polygon) -> bool {
    if circle.radius <= 0.0 || polygon.is_degenerate() {
        debug_assert!(false, "degenerate circle or polygon");
        return false;
    }
    polygon_contains_point(polygon, circle.center)
        || polygon.edges().any(|e| line_intersects_circle(e, circle))
}

/// Segment endpoint inside the rectangle, or the segment crossing a rectangle side
pub fn line_intersects_rectangle(seg: Segment, rect: &Rect) -> bool {
    if rect.contains_point(seg.start) || rect.contains_point(seg.end) {
        return true;
    }
    let c = rect.corners();
    (0..4).any(|i| segments_intersect(seg, Segment::new(c[i], c[(i + 1) % 4])))
}

/// Any rectangle corner inside the polygon, or any polygon edge touching the rectangle.
pub fn rectangle_overlaps_polygon(rect: &Rect, polygon: &Polygon) -> bool {
    if rect.width <= 0.0 || rect.height <= 0.0 || polygon.is_degenerate() {
        debug_assert!(false, "degenerate rectangle or polygon");
        return false;
    }
    rect.corners()
        .iter()
        .any(|&c| polygon_contains_point(polygon, c))
        || polygon.edges().any(|e| line_intersects_rectangle(e, rect))
}

/// Segment vs axis-aligned ellipse.
///
/// The segment is mapped into the ellipse's unit-circle space and
/// |p0 + t·d|² = 1 solved for t; a root in [0, 1] is a hit. A segment lying
/// wholly inside the ellipse has both roots outside [0, 1] and does not count.
pub fn line_intersects_ellipse(seg: Segment, ellipse: &Ellipse) -> bool {
    if ellipse.width <= 0.0 || ellipse.height <= 0.0 {
        debug_assert!(false, "degenerate ellipse");
        return false;
    }
    let p0 = ellipse_space(seg.start, ellipse);
    let d = ellipse_space(seg.end, ellipse) - p0;

    let a = d.dot(d);
    if a == 0.0 {
        debug_assert!(false, "zero-length segment in ellipse test");
        return false;
    }
    let b = 2.0 * p0.dot(d);
    let c = p0.dot(p0) - 1.0;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }
    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2)
}

/// Center inside the polygon, or any polygon edge crossing the ellipse outline.
pub fn ellipse_overlaps_polygon(ellipse: &Ellipse, polygon: &Polygon) -> bool {
    if ellipse.width <= 0.0 || ellipse.height <= 0.0 || polygon.is_degenerate() {
        debug_assert!(false, "degenerate ellipse or polygon");
        return false;
    }
    polygon_contains_point(polygon, ellipse.center)
        || polygon.edges().any(|e| line_intersects_ellipse(e, ellipse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    /// U-shaped concave polygon, opening upward between x=4 and x=6
    fn u_shape() -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(6.0, 10.0),
            Vec2::new(6.0, 3.0),
            Vec2::new(4.0, 3.0),
            Vec2::new(4.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
    }

    fn square(origin: Vec2, size: f32) -> Polygon {
        Polygon::from_rect(origin, size, size)
    }

    /// Independent reference: winding number by summed turning angle
    fn winding_reference(polygon: &Polygon, p: Vec2) -> bool {
        let pts = polygon.points();
        let mut total = 0.0;
        for i in 0..pts.len() {
            let a = pts[i] - p;
            let b = pts[(i + 1) % pts.len()] - p;
            total += cross(a, b).atan2(a.dot(b));
        }
        total.abs() > PI
    }

    fn near_edge(polygon: &Polygon, p: Vec2) -> bool {
        polygon
            .edges()
            .any(|e| e.closest_point(p).distance(p) < 0.01)
    }

    #[test]
    fn test_contains_point_matches_reference_on_grid() {
        let polygons = [u_shape(), square(Vec2::new(-3.0, -3.0), 7.0)];
        for polygon in &polygons {
            for ix in -40..=120 {
                for iy in -40..=120 {
                    let p = Vec2::new(ix as f32 * 0.1 + 0.013, iy as f32 * 0.1 + 0.007);
                    if near_edge(polygon, p) {
                        continue;
                    }
                    assert_eq!(
                        polygon_contains_point(polygon, p),
                        winding_reference(polygon, p),
                        "disagreement at {p:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_contains_point_concave_notch() {
        let u = u_shape();
        assert!(u.contains_point(Vec2::new(2.0, 5.0)));
        assert!(u.contains_point(Vec2::new(8.0, 5.0)));
        // Inside the notch of the U
        assert!(!u.contains_point(Vec2::new(5.0, 6.0)));
        // Below the notch floor
        assert!(u.contains_point(Vec2::new(5.0, 1.0)));
    }

    #[test]
    fn test_point_on_edge_is_outside() {
        let sq = square(Vec2::ZERO, 10.0);
        assert!(!sq.contains_point(Vec2::new(0.0, 5.0)));
        assert!(!sq.contains_point(Vec2::new(10.0, 5.0)));
        assert!(!sq.contains_point(Vec2::new(5.0, 0.0)));
        assert!(!sq.contains_point(Vec2::new(5.0, 10.0)));
        assert!(!sq.contains_point(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_segments_intersect() {
        let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Segment::new(Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0));
        assert!(segments_intersect(a, b));

        let c = Segment::new(Vec2::new(20.0, 0.0), Vec2::new(30.0, 0.0));
        assert!(!segments_intersect(a, c));

        // Collinear overlap
        let d = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0));
        let e = Segment::new(Vec2::new(3.0, 0.0), Vec2::new(8.0, 0.0));
        assert!(segments_intersect(d, e));

        // Collinear, disjoint
        let f = Segment::new(Vec2::new(6.0, 0.0), Vec2::new(8.0, 0.0));
        assert!(!segments_intersect(d, f));

        // Touching at an endpoint
        let g = Segment::new(Vec2::new(5.0, 0.0), Vec2::new(5.0, 5.0));
        assert!(segments_intersect(d, g));
    }

    #[test]
    fn test_polygon_overlaps_polygon() {
        let a = square(Vec2::ZERO, 10.0);
        let b = square(Vec2::new(5.0, 5.0), 10.0);
        let c = square(Vec2::new(20.0, 20.0), 5.0);
        assert!(polygon_overlaps_polygon(&a, &b));
        assert!(polygon_overlaps_polygon(&b, &a));
        assert!(!polygon_overlaps_polygon(&a, &c));

        // Crossing shapes with no vertex inside the other
        let wide = Polygon::from_rect(Vec2::new(-5.0, 3.0), 20.0, 4.0);
        let tall = Polygon::from_rect(Vec2::new(3.0, -5.0), 4.0, 20.0);
        assert!(polygon_overlaps_polygon(&wide, &tall));
    }

    #[test]
    fn test_polygon_overlap_containment_gap() {
        // Documented limitation: q strictly inside p
        let p = square(Vec2::ZERO, 100.0);
        let q = square(Vec2::new(40.0, 40.0), 10.0);

        // q's vertices are inside p, so the query from q's side sees it
        assert!(polygon_overlaps_polygon(&q, &p));
        // From p's side: no p vertex inside q, no crossing edges
        assert!(!polygon_overlaps_polygon(&p, &q));
    }

    #[test]
    fn test_circle_overlaps_polygon() {
        let sq = square(Vec2::ZERO, 10.0);
        // Center inside
        assert!(circle_overlaps_polygon(
            &Circle { center: Vec2::new(5.0, 5.0), radius: 1.0 },
            &sq
        ));
        // Center outside, edge within reach
        assert!(circle_overlaps_polygon(
            &Circle { center: Vec2::new(12.0, 5.0), radius: 3.0 },
            &sq
        ));
        assert!(!circle_overlaps_polygon(
            &Circle { center: Vec2::new(15.0, 5.0), radius: 3.0 },
            &sq
        ));
        // Circle swallowing the polygon
        assert!(circle_overlaps_polygon(
            &Circle { center: Vec2::new(5.0, 5.0), radius: 50.0 },
            &sq
        ));
    }

    #[test]
    fn test_rectangle_overlaps_polygon() {
        let sq = square(Vec2::ZERO, 10.0);
        let corner_in = Rect { origin: Vec2::new(8.0, 8.0), width: 5.0, height: 5.0 };
        let far = Rect { origin: Vec2::new(20.0, 20.0), width: 5.0, height: 5.0 };
        let around = Rect { origin: Vec2::new(-5.0, -5.0), width: 30.0, height: 30.0 };
        assert!(rectangle_overlaps_polygon(&corner_in, &sq));
        assert!(!rectangle_overlaps_polygon(&far, &sq));
        // Polygon wholly inside the rectangle: edge endpoints inside count
        assert!(rectangle_overlaps_polygon(&around, &sq));
    }

    #[test]
    fn test_line_intersects_ellipse() {
        let e = Ellipse { center: Vec2::ZERO, width: 20.0, height: 10.0 };
        // Horizontal line through the center
        assert!(line_intersects_ellipse(
            Segment::new(Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0)),
            &e
        ));
        // Passes above (semi-minor axis is 5)
        assert!(!line_intersects_ellipse(
            Segment::new(Vec2::new(-20.0, 6.0), Vec2::new(20.0, 6.0)),
            &e
        ));
        // Would hit if it were long enough
        assert!(!line_intersects_ellipse(
            Segment::new(Vec2::new(-30.0, 0.0), Vec2::new(-15.0, 0.0)),
            &e
        ));
        // Wholly inside: no boundary crossing
        assert!(!line_intersects_ellipse(
            Segment::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)),
            &e
        ));
    }

    #[test]
    fn test_ellipse_overlaps_polygon() {
        let sq = square(Vec2::ZERO, 10.0);
        let inside = Ellipse { center: Vec2::new(5.0, 5.0), width: 2.0, height: 2.0 };
        let grazing = Ellipse { center: Vec2::new(14.0, 5.0), width: 10.0, height: 4.0 };
        let clear = Ellipse { center: Vec2::new(30.0, 5.0), width: 10.0, height: 4.0 };
        assert!(ellipse_overlaps_polygon(&inside, &sq));
        assert!(ellipse_overlaps_polygon(&grazing, &sq));
        assert!(!ellipse_overlaps_polygon(&clear, &sq));
    }

    #[test]
    fn test_shape_dispatch_is_symmetric_for_curves() {
        let sq = Shape::Polygon(square(Vec2::ZERO, 10.0));
        let c = Shape::circle(Vec2::new(11.0, 5.0), 2.0);
        assert!(sq.overlaps(&c));
        assert!(c.overlaps(&sq));

        let c2 = Shape::circle(Vec2::new(14.0, 5.0), 2.0);
        assert!(c.overlaps(&c2));

        let r = Shape::rect(Vec2::new(12.0, 0.0), 4.0, 4.0);
        assert!(c.overlaps(&r));
    }

    #[test]
    fn test_centered_at_moves_anchor() {
        let s = Shape::ellipse(Vec2::new(3.0, 4.0), 2.0, 2.0);
        let moved = s.centered_at(Vec2::new(10.0, 10.0));
        assert_eq!(moved.anchor(), Vec2::new(10.0, 10.0));

        let r = Shape::rect(Vec2::ZERO, 4.0, 2.0);
        assert_eq!(r.centered_at(Vec2::new(10.0, 10.0)).anchor(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_edges_skip_repeated_points() {
        let p = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
        ]);
        assert_eq!(p.edges().count(), 3);
    }

    fn two_point_polygon() -> Polygon {
        Polygon::new(vec![Vec2::ZERO, Vec2::new(10.0, 0.0)])
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "fewer than 3 points")]
    fn test_contains_point_rejects_two_point_polygon() {
        polygon_contains_point(&two_point_polygon(), Vec2::new(5.0, 0.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "degenerate circle")]
    fn test_circle_overlap_rejects_zero_radius() {
        let circle = Circle {
            center: Vec2::new(5.0, 5.0),
            radius: 0.0,
        };
        circle_overlaps_polygon(&circle, &square(Vec2::ZERO, 10.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "zero-length segment")]
    fn test_segments_intersect_rejects_zero_length() {
        let point = Segment::new(Vec2::ONE, Vec2::ONE);
        segments_intersect(point, Segment::new(Vec2::ZERO, Vec2::new(2.0, 2.0)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "degenerate ellipse")]
    fn test_ellipse_line_rejects_flat_ellipse() {
        let flat = Ellipse {
            center: Vec2::ZERO,
            width: 10.0,
            height: 0.0,
        };
        line_intersects_ellipse(Segment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)), &flat);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_degenerate_shapes_report_no_hit_in_release() {
        assert!(!polygon_contains_point(&two_point_polygon(), Vec2::new(5.0, 0.0)));
        let circle = Circle {
            center: Vec2::new(5.0, 5.0),
            radius: 0.0,
        };
        assert!(!circle_overlaps_polygon(&circle, &square(Vec2::ZERO, 10.0)));
        let point = Segment::new(Vec2::ONE, Vec2::ONE);
        assert!(!segments_intersect(point, Segment::new(Vec2::ZERO, Vec2::new(2.0, 2.0))));
        let flat = Ellipse {
            center: Vec2::ZERO,
            width: 10.0,
            height: 0.0,
        };
        assert!(!line_intersects_ellipse(
            Segment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)),
            &flat
        ));
    }

    prop_compose! {
        /// Star-shaped (possibly concave) polygon around the origin
        fn star_polygon()(radii in prop::collection::vec(2.0f32..20.0, 3..12)) -> Polygon {
            let n = radii.len();
            let points = radii
                .iter()
                .enumerate()
                .map(|(i, &r)| crate::polar_to_cartesian(r, i as f32 / n as f32 * TAU))
                .collect();
            Polygon::new(points)
        }
    }

    proptest! {
        #[test]
        fn prop_contains_point_matches_winding(
            polygon in star_polygon(),
            x in -25.0f32..25.0,
            y in -25.0f32..25.0,
        ) {
            let p = Vec2::new(x, y);
            prop_assume!(!near_edge(&polygon, p));
            prop_assert_eq!(polygon_contains_point(&polygon, p), winding_reference(&polygon, p));
        }
    }
}
