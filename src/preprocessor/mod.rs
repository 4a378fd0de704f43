//! Turns placed wire geometry into net cells.
//!
//! The pipeline runs once when a simulation session starts:
//! 1. [`merge_segments`] normalizes collinear wires.
//! 2. [`group_segments`] partitions the segments into electrical groups by depth-first
//!    exploration. L-crossings and crossings carrying a FULL marker join; T- and X-crossings
//!    stay insulated.
//! 3. [`absorb_markers`] adds every FULL marker to the group of the segment beneath it.
//! 4. [`create_net_cells`] allocates one net cell per group.
//! 5. [`connect_pins`] wires component and bridge pins lying on a segment to its net.

mod geometry;


pub use self::geometry::{
    classify_crossing, classify_point, collision_point, is_l_crossing, is_t_crossing,
    is_x_crossing, merge_segments, t_crossing_points, Crossing, PointKind,
};

use crate::{
    cells::{CellId, LogicCell},
    components::{Component, ConnectionType, JunctionMarker, Orientation, Point, WireSegment},
    engine::Engine,
};
use fnv::FnvHashSet;
use std::{collections::BTreeMap, ops::Bound};
use tracing::debug;

/// Segments bucketed by their fixed coordinate, for range queries along the other axis.
#[derive(Clone, Debug)]
pub struct SegmentIndex {
    horizontals_by_y: BTreeMap<i32, Vec<usize>>,
    verticals_by_x: BTreeMap<i32, Vec<usize>>,
}

impl SegmentIndex {
    pub fn new(segments: &[WireSegment]) -> Self {
        let mut horizontals_by_y: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        let mut verticals_by_x: BTreeMap<i32, Vec<usize>> = BTreeMap::new();

        for (index, segment) in segments.iter().enumerate() {
            let bucket = match segment.orientation {
                Orientation::Horizontal => &mut horizontals_by_y,
                Orientation::Vertical => &mut verticals_by_x,
            };
            bucket.entry(segment.offset()).or_default().push(index);
        }

        SegmentIndex {
            horizontals_by_y,
            verticals_by_x,
        }
    }

    /// Perpendicular segments whose fixed coordinate falls inside the span of `segment`.
    pub fn perpendicular_candidates<'a>(
        &'a self,
        segment: &WireSegment,
    ) -> impl Iterator<Item = usize> + 'a {
        let (start, end) = segment.span();
        let bucket = match segment.orientation {
            Orientation::Horizontal => &self.verticals_by_x,
            Orientation::Vertical => &self.horizontals_by_y,
        };
        bucket
            .range((Bound::Included(start), Bound::Included(end)))
            .flat_map(|(_, indices)| indices.iter().copied())
    }

    /// Indices of all segments containing `point`, ascending.
    pub fn segments_at(&self, segments: &[WireSegment], point: Point) -> Vec<usize> {
        let mut found = self
            .horizontals_by_y
            .get(&point.y)
            .into_iter()
            .chain(self.verticals_by_x.get(&point.x))
            .flatten()
            .copied()
            .filter(|index| segments[*index].contains(point))
            .collect::<Vec<_>>();
        found.sort_unstable();
        found
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireGroup {
    pub segments: Vec<usize>,
    pub markers: Vec<usize>,
}

/// Transient partition of the segments, discarded once nets exist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireGroups {
    pub groups: Vec<WireGroup>,
    pub segment_groups: Vec<usize>,
    pub marker_groups: Vec<Option<usize>>,
}

struct GroupExplorer<'a> {
    segments: &'a [WireSegment],
    index: &'a SegmentIndex,
    full_markers: FnvHashSet<Point>,
    segment_groups: Vec<Option<usize>>,
}

impl<'a> GroupExplorer<'a> {
    fn explore_group(
        &mut self,
        segment: usize,
        group: &mut WireGroup,
        group_index: usize,
        heartbeat: &mut dyn FnMut(),
    ) {
        self.segment_groups[segment] = Some(group_index);
        group.segments.push(segment);

        let mut stack = vec![segment];
        while let Some(current) = stack.pop() {
            let candidates = self
                .index
                .perpendicular_candidates(&self.segments[current])
                .collect::<Vec<_>>();

            for other in candidates {
                if self.segment_groups[other].is_some() {
                    continue;
                }

                if let Some((point, crossing)) =
                    classify_crossing(&self.segments[current], &self.segments[other])
                {
                    if crossing == Crossing::L || self.full_markers.contains(&point) {
                        self.segment_groups[other] = Some(group_index);
                        group.segments.push(other);
                        stack.push(other);
                    }
                }
            }
            heartbeat();
        }
    }
}

/// Partitions `segments` into electrical groups. Every segment ends up in exactly one group;
/// groups are ordered by their lowest segment index.
pub fn group_segments(
    segments: &[WireSegment],
    index: &SegmentIndex,
    markers: &[JunctionMarker],
    heartbeat: &mut dyn FnMut(),
) -> WireGroups {
    let mut explorer = GroupExplorer {
        segments,
        index,
        full_markers: markers
            .iter()
            .filter(|m| m.connection == ConnectionType::Full)
            .map(|m| m.position)
            .collect(),
        segment_groups: vec![None; segments.len()],
    };

    let mut groups = Vec::new();
    for segment in 0..segments.len() {
        if explorer.segment_groups[segment].is_none() {
            let mut group = WireGroup::default();
            explorer.explore_group(segment, &mut group, groups.len(), heartbeat);
            groups.push(group);
        }
    }

    let segment_groups = explorer
        .segment_groups
        .into_iter()
        .map(|group| group.unwrap_or_default())
        .collect();

    WireGroups {
        groups,
        segment_groups,
        marker_groups: vec![None; markers.len()],
    }
}

/// Adds every FULL marker to the group of the lowest-indexed segment beneath it. A marker lying
/// on no wire forms a group of its own.
pub fn absorb_markers(
    groups: &mut WireGroups,
    segments: &[WireSegment],
    index: &SegmentIndex,
    markers: &[JunctionMarker],
    heartbeat: &mut dyn FnMut(),
) {
    for (marker_index, marker) in markers.iter().enumerate() {
        if marker.connection != ConnectionType::Full {
            continue;
        }

        let group = match index.segments_at(segments, marker.position).first() {
            Some(segment) => groups.segment_groups[*segment],
            None => {
                groups.groups.push(WireGroup::default());
                groups.groups.len() - 1
            }
        };
        groups.groups[group].markers.push(marker_index);
        groups.marker_groups[marker_index] = Some(group);
        heartbeat();
    }
}

/// One electrical node with the wire pieces bound to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Net {
    pub cell: CellId,
    pub segments: Vec<usize>,
    pub markers: Vec<usize>,
}

/// The nets of a session, with the normalized segments they were built from.
#[derive(Clone, Debug, Default)]
pub struct WireNetwork {
    segments: Vec<WireSegment>,
    index: Option<SegmentIndex>,
    nets: Vec<Net>,
    segment_nets: Vec<usize>,
    marker_nets: Vec<Option<usize>>,
}

impl WireNetwork {
    pub fn segments(&self) -> &[WireSegment] {
        &self.segments
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn net_of_segment(&self, segment: usize) -> &Net {
        &self.nets[self.segment_nets[segment]]
    }

    pub fn net_of_marker(&self, marker: usize) -> Option<&Net> {
        self.marker_nets
            .get(marker)
            .copied()
            .flatten()
            .map(|net| &self.nets[net])
    }

    /// The net of the lowest-indexed segment passing through `point`.
    pub fn net_at(&self, point: Point) -> Option<&Net> {
        let index = self.index.as_ref()?;
        index
            .segments_at(&self.segments, point)
            .first()
            .map(|segment| self.net_of_segment(*segment))
    }
}

/// Allocates one net cell per group and binds the group's segments and markers to it.
pub fn create_net_cells(
    groups: WireGroups,
    segments: Vec<WireSegment>,
    index: SegmentIndex,
    engine: &mut Engine,
    heartbeat: &mut dyn FnMut(),
) -> WireNetwork {
    let nets = groups
        .groups
        .into_iter()
        .map(|group| {
            heartbeat();
            Net {
                cell: engine.add_cell(LogicCell::net()),
                segments: group.segments,
                markers: group.markers,
            }
        })
        .collect();

    WireNetwork {
        segments,
        index: Some(index),
        nets,
        segment_nets: groups.segment_groups,
        marker_nets: groups.marker_groups,
    }
}

/// Counts of the pin connections made by [`connect_pins`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinConnections {
    pub drivers: usize,
    pub loads: usize,
}

fn nets_at(network: &WireNetwork, point: Point, orientation: Option<Orientation>) -> Vec<CellId> {
    let index = match network.index.as_ref() {
        Some(index) => index,
        None => return Vec::new(),
    };

    let mut cells = Vec::new();
    for segment in index.segments_at(&network.segments, point) {
        if orientation.map_or(true, |o| network.segments[segment].orientation == o) {
            let cell = network.net_of_segment(segment).cell;
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Wires every component pin and bridge terminal lying on a segment to that segment's net.
/// Output pins become driving slots of the net, input pins become fan-out targets.
pub fn connect_pins(
    network: &WireNetwork,
    components: &[(CellId, &Component)],
    bridges: &[(CellId, JunctionMarker)],
    engine: &mut Engine,
    heartbeat: &mut dyn FnMut(),
) -> PinConnections {
    let mut connections = PinConnections::default();

    for (cell, component) in components {
        for output in 0..component.output_pins.len() {
            for net in nets_at(network, component.output_pin(output), None) {
                let slot = engine.add_input_slot(net);
                engine.connect_output(*cell, output, net, slot);
                connections.drivers += 1;
            }
        }
        for input in 0..component.input_pins.len() {
            for net in nets_at(network, component.input_pin(input), None) {
                engine.append_output(net, *cell, input);
                connections.loads += 1;
            }
        }
        heartbeat();
    }

    for (cell, marker) in bridges {
        let (input_side, output_side) = match marker.connection.bridge_orientations() {
            Some(sides) => sides,
            None => continue,
        };
        for net in nets_at(network, marker.position, Some(output_side)) {
            let slot = engine.add_input_slot(net);
            engine.connect_output(*cell, 0, net, slot);
            connections.drivers += 1;
        }
        for net in nets_at(network, marker.position, Some(input_side)) {
            engine.append_output(net, *cell, 0);
            connections.loads += 1;
        }
        heartbeat();
    }

    connections
}

/// Runs the whole pipeline on the given geometry. `components` and `bridges` pair every
/// already allocated cell with the geometry its pins come from.
pub fn build_network(
    segments: &[WireSegment],
    markers: &[JunctionMarker],
    components: &[(CellId, &Component)],
    bridges: &[(CellId, JunctionMarker)],
    engine: &mut Engine,
    heartbeat: &mut dyn FnMut(),
) -> WireNetwork {
    let segments = merge_segments(segments);
    let index = SegmentIndex::new(&segments);

    let mut groups = group_segments(&segments, &index, markers, heartbeat);
    debug!(
        segments = segments.len(),
        groups = groups.groups.len(),
        "grouped wire segments"
    );

    absorb_markers(&mut groups, &segments, &index, markers, heartbeat);
    let absorbed = groups.marker_groups.iter().filter(|g| g.is_some()).count();
    debug!(markers = absorbed, "absorbed junction markers");

    let network = create_net_cells(groups, segments, index, engine, heartbeat);
    let connections = connect_pins(&network, components, bridges, engine, heartbeat);
    debug!(
        nets = network.nets.len(),
        drivers = connections.drivers,
        loads = connections.loads,
        "connected pins"
    );

    network
}
