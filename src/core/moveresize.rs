use crate::defaults;

use winsys::geometry::Axis;
use winsys::geometry::Dim;
use winsys::geometry::Distance;
use winsys::geometry::Edge;
use winsys::geometry::Extents;
use winsys::geometry::Grip;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::hints::SizeHints;
use winsys::screen::Screen;
use winsys::window::Window;

/// A guideline marks the edge a drag snapped to: a 1-pixel XOR line
/// across the whole screen, redrawn per motion and erased by drawing
/// again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Guideline {
    pub axis: Axis,
    pub coord: i32,
}

/// The candidate edges a moving or resizing frame may snap to: screen
/// edges, per-CRTC edges, and the outer edges of every other visible
/// client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapTargets {
    vertical: Vec<i32>,
    horizontal: Vec<i32>,
}

impl SnapTargets {
    pub fn assemble(
        screen: &Screen,
        others: &[Region],
    ) -> Self {
        let mut vertical = Vec::new();
        let mut horizontal = Vec::new();

        let mut add_region = |region: &Region| {
            vertical.push(region.edge(Edge::Left));
            vertical.push(region.edge(Edge::Right));
            horizontal.push(region.edge(Edge::Top));
            horizontal.push(region.edge(Edge::Bottom));
        };

        add_region(&screen.full_region());

        for crtc in screen.crtcs() {
            add_region(crtc);
        }

        for other in others {
            add_region(other);
        }

        vertical.sort_unstable();
        vertical.dedup();
        horizontal.sort_unstable();
        horizontal.dedup();

        Self {
            vertical,
            horizontal,
        }
    }

    fn nearest(
        coords: &[i32],
        target: i32,
        threshold: i32,
    ) -> Option<i32> {
        coords
            .iter()
            .copied()
            .min_by_key(|coord| (coord - target).abs())
            .filter(|coord| (coord - target).abs() <= threshold)
    }

    fn for_axis(
        &self,
        axis: Axis,
    ) -> &[i32] {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }
}

/// Snap a moving frame's nearest aligned edges to the closest targets
/// within the threshold, yielding the adjusted region and the guidelines
/// to render.
pub fn snap_move(
    candidate: Region,
    targets: &SnapTargets,
    threshold: i32,
) -> (Region, Vec<Guideline>) {
    let mut region = candidate;
    let mut guidelines = Vec::new();

    for axis in [Axis::Vertical, Axis::Horizontal] {
        let (lo_edge, hi_edge) = match axis {
            Axis::Vertical => (Edge::Left, Edge::Right),
            Axis::Horizontal => (Edge::Top, Edge::Bottom),
        };

        let coords = targets.for_axis(axis);

        let snaps = [
            (lo_edge, SnapTargets::nearest(coords, region.edge(lo_edge), threshold)),
            (hi_edge, SnapTargets::nearest(coords, region.edge(hi_edge), threshold)),
        ];

        let best = snaps
            .iter()
            .filter_map(|&(edge, snap)| snap.map(|coord| (edge, coord)))
            .min_by_key(|&(edge, coord)| (coord - region.edge(edge)).abs());

        if let Some((edge, coord)) = best {
            region.set_edge(edge, coord);
            guidelines.push(Guideline {
                axis,
                coord,
            });
        }
    }

    (region, guidelines)
}

/// Snap the active edges of a resizing frame, moving only those edges.
pub fn snap_resize(
    candidate: Region,
    grip: Grip,
    targets: &SnapTargets,
    threshold: i32,
) -> (Region, Vec<Guideline>) {
    let mut region = candidate;
    let mut guidelines = Vec::new();

    for edge in grip.active_edges() {
        let coords = targets.for_axis(edge.axis());

        if let Some(coord) = SnapTargets::nearest(coords, region.edge(edge), threshold) {
            match edge {
                Edge::Left => {
                    region.dim.w += region.pos.x - coord;
                    region.pos.x = coord;
                },
                Edge::Right => region.dim.w = coord - region.pos.x,
                Edge::Top => {
                    region.dim.h += region.pos.y - coord;
                    region.pos.y = coord;
                },
                Edge::Bottom => region.dim.h = coord - region.pos.y,
            };

            guidelines.push(Guideline {
                axis: edge.axis(),
                coord,
            });
        }
    }

    (region, guidelines)
}

/// Constrain a candidate frame region to the client's size hints,
/// keeping the edges opposite the grip anchored.
pub fn constrain_frame_region(
    original: Region,
    mut candidate: Region,
    grip: Grip,
    extents: Extents,
    size_hints: &Option<SizeHints>,
) -> Region {
    let mut inner = candidate.dim - extents;

    inner.w = std::cmp::max(inner.w, defaults::MIN_CLIENT_DIM.w);
    inner.h = std::cmp::max(inner.h, defaults::MIN_CLIENT_DIM.h);

    if let Some(size_hints) = size_hints {
        size_hints.apply(&mut inner);
    }

    candidate.dim = inner + extents;

    if grip.is_top_grip() {
        candidate.pos.y = original.edge(Edge::Bottom) - candidate.dim.h;
    } else {
        candidate.pos.y = original.edge(Edge::Top);
    }

    if grip.is_left_grip() {
        candidate.pos.x = original.edge(Edge::Right) - candidate.dim.w;
    } else {
        candidate.pos.x = original.edge(Edge::Left);
    }

    candidate
}

/// The candidate frame region for a resize drag: the grip's edges follow
/// the pointer delta, the rest stay anchored.
pub fn resized_frame_region(
    original: Region,
    grip: Grip,
    delta: Distance,
    extents: Extents,
    size_hints: &Option<SizeHints>,
) -> Region {
    let mut candidate = original;

    let dest_w = if grip.is_left_grip() {
        original.dim.w - delta.dx
    } else if grip.is_right_grip() {
        original.dim.w + delta.dx
    } else {
        original.dim.w
    };

    let dest_h = if grip.is_top_grip() {
        original.dim.h - delta.dy
    } else if grip.is_bottom_grip() {
        original.dim.h + delta.dy
    } else {
        original.dim.h
    };

    candidate.dim = Dim {
        w: dest_w,
        h: dest_h,
    };

    constrain_frame_region(original, candidate, grip, extents, size_hints)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpKind {
    Move,
    Resize,
}

/// The state of one interactive move or resize: the pointer and geometry
/// snapshots taken at the initiating button press, the active grip, and
/// the guidelines currently on screen.
#[derive(Debug, Clone)]
pub struct MoveResize {
    window: Window,
    kind: OpKind,
    grip: Grip,
    grip_pos: Pos,
    original: Region,
    move_delta: i32,
    engaged: bool,
    guidelines: Vec<Guideline>,
}

impl MoveResize {
    pub fn new_move(
        window: Window,
        pointer: Pos,
        original: Region,
    ) -> Self {
        Self {
            window,
            kind: OpKind::Move,
            grip: Grip::Corner(winsys::geometry::Corner::TopLeft),
            grip_pos: pointer,
            original,
            move_delta: defaults::MOVE_DELTA,
            engaged: false,
            guidelines: Vec::new(),
        }
    }

    pub fn new_resize(
        window: Window,
        pointer: Pos,
        original: Region,
        grip: Grip,
    ) -> Self {
        Self {
            window,
            kind: OpKind::Resize,
            grip,
            grip_pos: pointer,
            original,
            move_delta: 0,
            engaged: true,
            guidelines: Vec::new(),
        }
    }

    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    #[inline]
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    #[inline]
    pub fn grip(&self) -> Grip {
        self.grip
    }

    #[inline]
    pub fn original(&self) -> Region {
        self.original
    }

    #[inline]
    pub fn guidelines(&self) -> &[Guideline] {
        &self.guidelines
    }

    pub fn set_guidelines(
        &mut self,
        guidelines: Vec<Guideline>,
    ) {
        self.guidelines = guidelines;
    }

    /// Rotate to the next of the eight resize grips.
    pub fn cycle_grip(
        &mut self,
        pointer: Pos,
        current: Region,
    ) {
        if self.kind == OpKind::Resize {
            self.grip = self.grip.next();
            self.grip_pos = pointer;
            self.original = current;
        }
    }

    /// The frame region this drag requests for the given pointer
    /// position, before snapping. Returns the untouched original while
    /// the pointer has not yet broken away from the press position.
    pub fn candidate(
        &mut self,
        pointer: Pos,
        extents: Extents,
        size_hints: &Option<SizeHints>,
    ) -> Region {
        let delta = self.grip_pos.dist(pointer);

        if !self.engaged {
            if delta.pythagorean() < self.move_delta {
                return self.original;
            }

            self.engaged = true;
        }

        match self.kind {
            OpKind::Move => Region {
                pos: self.original.pos + delta,
                dim: self.original.dim,
            },
            OpKind::Resize => {
                resized_frame_region(self.original, self.grip, delta, extents, size_hints)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use winsys::geometry::Corner;

    const NO_EXTENTS: Extents = Extents {
        left: 0,
        right: 0,
        top: 0,
        bottom: 0,
    };

    fn screen() -> Screen {
        Screen::new(0, Region::new(0, 0, 1920, 1080), Vec::new())
    }

    #[test]
    fn move_snaps_left_edge_to_neighbouring_right_edge() {
        // Another window's right edge at x = 300; candidate left edge at
        // 303 with a threshold of 5 snaps to 300.
        let targets = SnapTargets::assemble(&screen(), &[Region::new(100, 100, 200, 300)]);
        let candidate = Region::new(303, 500, 200, 200);

        let (snapped, guidelines) = snap_move(candidate, &targets, defaults::SNAP_THRESHOLD);

        assert_eq!(snapped, Region::new(300, 500, 200, 200));
        assert_eq!(guidelines, vec![Guideline {
            axis: Axis::Vertical,
            coord: 300,
        }]);
    }

    #[test]
    fn move_beyond_threshold_does_not_snap() {
        let targets = SnapTargets::assemble(&screen(), &[]);
        let candidate = Region::new(700, 500, 200, 200);

        let (snapped, guidelines) = snap_move(candidate, &targets, defaults::SNAP_THRESHOLD);

        assert_eq!(snapped, candidate);
        assert!(guidelines.is_empty());
    }

    #[test]
    fn move_snaps_to_screen_edges() {
        let targets = SnapTargets::assemble(&screen(), &[]);
        let candidate = Region::new(4, 1077, 200, 200);

        let (snapped, guidelines) = snap_move(candidate, &targets, defaults::SNAP_THRESHOLD);

        assert_eq!(snapped.pos.x, 0);
        // Bottom edge 1277 is out of range of 1080; top edge at 1077 is
        // closer to the screen's bottom edge target.
        assert_eq!(snapped.pos.y, 1080);
        assert_eq!(guidelines.len(), 2);
    }

    #[test]
    fn move_snaps_to_crtc_edges() {
        let screen = Screen::new(0, Region::new(0, 0, 2560, 1024), vec![
            Region::new(0, 0, 1280, 1024),
            Region::new(1280, 0, 1280, 1024),
        ]);
        let targets = SnapTargets::assemble(&screen, &[]);
        let candidate = Region::new(1283, 200, 400, 300);

        let (snapped, _) = snap_move(candidate, &targets, defaults::SNAP_THRESHOLD);

        assert_eq!(snapped.pos.x, 1280);
    }

    #[test]
    fn resize_only_moves_active_edges() {
        let targets = SnapTargets::assemble(&screen(), &[Region::new(500, 0, 100, 100)]);
        // Right edge at 497 is within threshold of the other frame's
        // left edge at 500.
        let candidate = Region::new(100, 100, 397, 200);

        let (snapped, guidelines) = snap_resize(
            candidate,
            Grip::Edge(Edge::Right),
            &targets,
            defaults::SNAP_THRESHOLD,
        );

        assert_eq!(snapped, Region::new(100, 100, 400, 200));
        assert_eq!(guidelines.len(), 1);
    }

    #[test]
    fn resize_honors_size_increments() {
        // base 4, inc 6, min 80: a candidate width of 500 settles on
        // 496, the largest base + k*inc not above it.
        let size_hints = Some(SizeHints {
            min_width: Some(80),
            min_height: Some(25),
            base_width: Some(4),
            base_height: Some(4),
            inc_width: Some(6),
            inc_height: Some(13),
            ..Default::default()
        });

        let original = Region::new(100, 100, 200, 200);
        let mut op = MoveResize::new_resize(
            1,
            Pos {
                x: 300,
                y: 300,
            },
            original,
            Grip::Corner(Corner::BottomRight),
        );

        let candidate = op.candidate(
            Pos {
                x: 600,
                y: 400,
            },
            NO_EXTENTS,
            &size_hints,
        );

        assert_eq!(candidate.dim.w, 496);
        assert_eq!((candidate.dim.w - 4) % 6, 0);
        assert_eq!((candidate.dim.h - 4) % 13, 0);
        // North-west corner stays anchored.
        assert_eq!(candidate.pos, original.pos);
    }

    #[test]
    fn left_grip_resize_anchors_right_edge() {
        let original = Region::new(100, 100, 200, 200);
        let mut op = MoveResize::new_resize(
            1,
            Pos {
                x: 100,
                y: 200,
            },
            original,
            Grip::Edge(Edge::Left),
        );

        let candidate = op.candidate(
            Pos {
                x: 50,
                y: 200,
            },
            NO_EXTENTS,
            &None,
        );

        assert_eq!(candidate.edge(Edge::Right), original.edge(Edge::Right));
        assert_eq!(candidate.dim.w, 250);
    }

    #[test]
    fn move_below_delta_keeps_original_geometry() {
        let original = Region::new(100, 100, 200, 200);
        let mut op = MoveResize::new_move(
            1,
            Pos {
                x: 150,
                y: 150,
            },
            original,
        );

        let candidate = op.candidate(
            Pos {
                x: 151,
                y: 151,
            },
            NO_EXTENTS,
            &None,
        );

        assert_eq!(candidate, original);

        let candidate = op.candidate(
            Pos {
                x: 170,
                y: 160,
            },
            NO_EXTENTS,
            &None,
        );

        assert_eq!(candidate, Region::new(120, 110, 200, 200));
    }

    #[test]
    fn grip_cycling_rebases_geometry() {
        let original = Region::new(0, 0, 100, 100);
        let mut op = MoveResize::new_resize(
            1,
            Pos {
                x: 100,
                y: 100,
            },
            original,
            Grip::Corner(Corner::BottomRight),
        );

        op.cycle_grip(
            Pos {
                x: 10,
                y: 10,
            },
            Region::new(0, 0, 120, 120),
        );

        assert_eq!(op.grip(), Grip::Edge(Edge::Bottom));
        assert_eq!(op.original(), Region::new(0, 0, 120, 120));
    }
}
