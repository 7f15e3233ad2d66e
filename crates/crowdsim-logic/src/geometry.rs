//! Point and segment primitives.
//!
//! Everything here is a pure function over `DVec2` values. Orientation and
//! collinearity are exact (no epsilon): a zero cross product is the only
//! collinear case.

use glam::DVec2;

/// Turn direction of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Classify the triple `(a, b, c)` by the sign of `(b − a) × (c − b)`.
pub fn orientation(a: DVec2, b: DVec2, c: DVec2) -> Orientation {
    let cross = (b - a).perp_dot(c - b);
    if cross > 0.0 {
        Orientation::CounterClockwise
    } else if cross < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// For collinear `a, b, c`: does `b` lie inside the bounding box of `a` and `c`?
pub fn on_segment(a: DVec2, b: DVec2, c: DVec2) -> bool {
    let lo = a.min(c);
    let hi = a.max(c);
    b.x >= lo.x && b.x <= hi.x && b.y >= lo.y && b.y <= hi.y
}

/// A finite line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: DVec2,
    pub p2: DVec2,
}

impl Segment {
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        Self { p1, p2 }
    }

    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).length()
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.p1 + self.p2) * 0.5
    }

    pub fn intersects(&self, other: &Segment) -> bool {
        segments_intersect(self, other)
    }
}

/// Four-orientation segment intersection test, including touching and
/// collinear-overlap cases. Symmetric in its arguments.
pub fn segments_intersect(a: &Segment, b: &Segment) -> bool {
    let o1 = orientation(a.p1, a.p2, b.p1);
    let o2 = orientation(a.p1, a.p2, b.p2);
    let o3 = orientation(b.p1, b.p2, a.p1);
    let o4 = orientation(b.p1, b.p2, a.p2);

    // General case: each segment straddles the other's line
    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Degenerate cases: an endpoint lies on the other segment
    (o1 == Orientation::Collinear && on_segment(a.p1, b.p1, a.p2))
        || (o2 == Orientation::Collinear && on_segment(a.p1, b.p2, a.p2))
        || (o3 == Orientation::Collinear && on_segment(b.p1, a.p1, b.p2))
        || (o4 == Orientation::Collinear && on_segment(b.p1, a.p2, b.p2))
}

/// Foot of the perpendicular dropped from a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Foot {
    /// The foot itself, on the segment.
    pub point: DVec2,
    /// Vector from the foot to the projected point (points away from the segment).
    pub offset: DVec2,
    /// Length of `offset`.
    pub distance: f64,
}

/// Project `point` onto the segment's line as `p1 + k·(p2 − p1)`.
///
/// Returns `None` when `k` falls outside `[0, 1)`, i.e. the projection misses
/// the finite segment, or when the segment has zero length.
pub fn perpendicular_foot(segment: &Segment, point: DVec2) -> Option<Foot> {
    let q = segment.p2 - segment.p1;
    let len_sq = q.length_squared();
    if len_sq == 0.0 {
        return None;
    }
    let k = (point - segment.p1).dot(q) / len_sq;
    if !(0.0..1.0).contains(&k) {
        return None;
    }
    let foot = segment.p1 + q * k;
    let offset = point - foot;
    Some(Foot {
        point: foot,
        offset,
        distance: offset.length(),
    })
}

/// Vector from `point` to the segment's midpoint.
pub fn vector_to_midpoint(segment: &Segment, point: DVec2) -> DVec2 {
    segment.midpoint() - point
}

/// Euclidean distance from `point` to the segment's midpoint.
pub fn distance_to_midpoint(segment: &Segment, point: DVec2) -> f64 {
    vector_to_midpoint(segment, point).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(p(x1, y1), p(x2, y2))
    }

    #[test]
    fn collinear_triples_in_any_order() {
        let pts = [p(0.0, 0.0), p(1.0, 1.0), p(3.0, 3.0)];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for o in orders {
            assert_eq!(
                orientation(pts[o[0]], pts[o[1]], pts[o[2]]),
                Orientation::Collinear,
                "order {:?}",
                o
            );
        }
    }

    #[test]
    fn turn_directions() {
        assert_eq!(
            orientation(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)),
            Orientation::CounterClockwise
        );
        assert_eq!(
            orientation(p(0.0, 0.0), p(1.0, 0.0), p(1.0, -1.0)),
            Orientation::Clockwise
        );
    }

    #[test]
    fn on_segment_bounding_box() {
        assert!(on_segment(p(0.0, 0.0), p(2.0, 2.0), p(4.0, 4.0)));
        assert!(on_segment(p(4.0, 4.0), p(4.0, 4.0), p(0.0, 0.0)));
        assert!(!on_segment(p(0.0, 0.0), p(5.0, 5.0), p(4.0, 4.0)));
    }

    #[test]
    fn crossing_segments_intersect() {
        let a = seg(0.0, 0.0, 10.0, 10.0);
        let b = seg(0.0, 10.0, 10.0, 0.0);
        assert!(segments_intersect(&a, &b));
        assert!(segments_intersect(&b, &a));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let a = seg(0.0, 0.0, 10.0, 0.0);
        let b = seg(0.0, 1.0, 10.0, 1.0);
        assert!(!segments_intersect(&a, &b));
    }

    #[test]
    fn touching_endpoint_counts() {
        let a = seg(0.0, 0.0, 5.0, 0.0);
        let b = seg(5.0, 0.0, 5.0, 5.0);
        assert!(segments_intersect(&a, &b));
        assert!(segments_intersect(&b, &a));
    }

    #[test]
    fn collinear_overlap_and_gap() {
        assert!(segments_intersect(
            &seg(0.0, 0.0, 5.0, 0.0),
            &seg(3.0, 0.0, 8.0, 0.0)
        ));
        assert!(!segments_intersect(
            &seg(0.0, 0.0, 2.0, 0.0),
            &seg(3.0, 0.0, 8.0, 0.0)
        ));
    }

    #[test]
    fn intersection_is_symmetric_over_a_grid() {
        let coords = [-1.0, 0.0, 0.5, 2.0];
        let mut segments = Vec::new();
        for &x1 in &coords {
            for &y1 in &coords {
                segments.push(seg(x1, y1, 1.0 - y1, x1 + 0.5));
                segments.push(seg(x1, y1, x1, 2.0));
            }
        }
        for a in &segments {
            for b in &segments {
                assert_eq!(
                    segments_intersect(a, b),
                    segments_intersect(b, a),
                    "{:?} vs {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn foot_on_segment() {
        let wall = seg(0.0, 0.0, 10.0, 0.0);
        let foot = perpendicular_foot(&wall, p(4.0, 3.0)).unwrap();
        assert_eq!(foot.point, p(4.0, 0.0));
        assert_eq!(foot.offset, p(0.0, 3.0));
        assert!((foot.distance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn foot_outside_segment_is_none() {
        let wall = seg(0.0, 0.0, 10.0, 0.0);
        assert!(perpendicular_foot(&wall, p(-1.0, 3.0)).is_none());
        assert!(perpendicular_foot(&wall, p(11.0, 3.0)).is_none());
        // k == 1 lands on the far endpoint, which is excluded
        assert!(perpendicular_foot(&wall, p(10.0, 3.0)).is_none());
        assert!(perpendicular_foot(&wall, p(0.0, 3.0)).is_some());
    }

    #[test]
    fn foot_on_sloped_segment() {
        let wall = seg(0.0, 0.0, 10.0, 10.0);
        let foot = perpendicular_foot(&wall, p(0.0, 4.0)).unwrap();
        assert!((foot.point - p(2.0, 2.0)).length() < 1e-12);
        assert!((foot.distance - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn midpoint_distance_and_vector() {
        let door = seg(50.0, 45.0, 50.0, 55.0);
        assert_eq!(vector_to_midpoint(&door, p(10.0, 50.0)), p(40.0, 0.0));
        assert!((distance_to_midpoint(&door, p(50.0, 47.0)) - 3.0).abs() < 1e-12);
    }
}
