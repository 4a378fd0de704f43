use crate::components::{Orientation, Point, WireSegment};
use std::collections::BTreeMap;

/// How two perpendicular segments touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// The touching point is an endpoint of both segments.
    L,
    /// The touching point is an endpoint of exactly one segment.
    T,
    /// The touching point lies strictly inside both segments.
    X,
}

/// What the wires meeting at one point look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    NoCrossing,
    LCrossing,
    TCrossing,
    XCrossing,
}

/// The point where two perpendicular segments touch, if they do.
pub fn collision_point(a: &WireSegment, b: &WireSegment) -> Option<Point> {
    let point = match (a.orientation, b.orientation) {
        (Orientation::Horizontal, Orientation::Vertical) => Point::new(b.offset(), a.offset()),
        (Orientation::Vertical, Orientation::Horizontal) => Point::new(a.offset(), b.offset()),
        _ => return None,
    };

    if a.contains(point) && b.contains(point) {
        Some(point)
    } else {
        None
    }
}

pub fn classify_crossing(a: &WireSegment, b: &WireSegment) -> Option<(Point, Crossing)> {
    let point = collision_point(a, b)?;
    let crossing = match (a.is_endpoint(point), b.is_endpoint(point)) {
        (true, true) => Crossing::L,
        (false, false) => Crossing::X,
        _ => Crossing::T,
    };
    Some((point, crossing))
}

pub fn is_l_crossing(a: &WireSegment, b: &WireSegment) -> bool {
    matches!(classify_crossing(a, b), Some((_, Crossing::L)))
}

pub fn is_t_crossing(a: &WireSegment, b: &WireSegment) -> bool {
    matches!(classify_crossing(a, b), Some((_, Crossing::T)))
}

pub fn is_x_crossing(a: &WireSegment, b: &WireSegment) -> bool {
    matches!(classify_crossing(a, b), Some((_, Crossing::X)))
}

/// Classifies the wires meeting at `point`.
pub fn classify_point(segments: &[WireSegment], point: Point) -> PointKind {
    let touching = segments
        .iter()
        .filter(|s| s.contains(point))
        .collect::<Vec<_>>();

    if touching.len() <= 1 {
        return PointKind::NoCrossing;
    }

    let ending = touching.iter().filter(|s| s.is_endpoint(point)).count();
    if ending == touching.len() {
        PointKind::LCrossing
    } else if ending == 0 {
        PointKind::XCrossing
    } else {
        PointKind::TCrossing
    }
}

/// Points where `wire` forms a T-crossing with any of `segments`.
pub fn t_crossing_points(segments: &[WireSegment], wire: &WireSegment) -> Vec<Point> {
    let mut points = segments
        .iter()
        .filter_map(|s| match classify_crossing(wire, s) {
            Some((point, Crossing::T)) => Some(point),
            _ => None,
        })
        .collect::<Vec<_>>();
    points.sort();
    points.dedup();
    points
}

/// Merges collinear segments that touch or overlap into one segment spanning their union.
/// Segments covered by another disappear.
///
/// A merged segment takes the place of the first input segment it absorbed, so an already
/// merged list comes back unchanged.
pub fn merge_segments(segments: &[WireSegment]) -> Vec<WireSegment> {
    let mut lines: BTreeMap<(Orientation, i32), Vec<(i32, i32, usize)>> = BTreeMap::new();
    for (index, segment) in segments.iter().enumerate() {
        let (start, end) = segment.span();
        lines
            .entry((segment.orientation, segment.offset()))
            .or_default()
            .push((start, end, index));
    }

    let mut merged = Vec::with_capacity(segments.len());
    for ((orientation, offset), mut spans) in lines {
        spans.sort();

        let mut current: Option<(i32, i32, usize)> = None;
        for (start, end, index) in spans {
            current = match current {
                Some((cur_start, cur_end, first)) if start <= cur_end => {
                    Some((cur_start, cur_end.max(end), first.min(index)))
                }
                Some(done) => {
                    merged.push((done.2, orientation, offset, done.0, done.1));
                    Some((start, end, index))
                }
                None => Some((start, end, index)),
            };
        }
        if let Some((start, end, first)) = current {
            merged.push((first, orientation, offset, start, end));
        }
    }

    merged.sort_by_key(|(first, ..)| *first);
    merged
        .into_iter()
        .map(|(_, orientation, offset, start, end)| {
            WireSegment::spanning(orientation, offset, start, end)
        })
        .collect()
}
