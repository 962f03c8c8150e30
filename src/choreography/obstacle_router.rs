//! Axis-aligned routing with slide-clearing of blocking pieces.
//!
//! A move travels along at most two legs: one along a rank and one along a
//! file, forming an L for anything that is not a straight line. Both L
//! orientations are considered and the one with fewer blockers wins
//! (rank-first on ties). Blockers are the occupied cells strictly between a
//! leg's endpoints plus the L's corner; the source (the mover itself) and
//! the destination (about to be vacated or captured) never block.
//!
//! The piece goes straight, diagonals included, only when no occupied cell
//! lies within `lane_offset_mm` of the straight line. Otherwise every
//! blocker is pushed `obstacle_slide_mm` away from the lane of its leg, and
//! the mover leaves `from` sideways into a lane half a square off the cell
//! centres, runs both legs along lanes and recenters onto `to`. Each push is
//! recorded so the executor can slide the piece back once the move is done.
//! This is not a path search: one piece per cell, and a pushed piece is
//! assumed to clear the lane.

use log::debug;

use crate::board_state::board_state::BoardOccupancy;
use crate::board_state::chess_types::GridCell;
use crate::choreography::step::{Axis, DisplacedObstacle, Step};
use crate::geometry::coordinate_mapper::{CoordinateMapper, MillimeterPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegOrder {
    /// Along the source rank first, then along the destination file.
    RankFirst,
    /// Along the source file first, then along the destination rank.
    FileFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Blocker {
    cell: GridCell,
    /// Travel axis of the leg the blocker sits on; the corner counts for
    /// the leg arriving at it.
    leg_axis: Axis,
}

/// Which side of the cell centres each leg's lane runs on, as a unit sign.
/// `rank_leg` offsets along Y, `file_leg` along X.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LaneSides {
    rank_leg: f64,
    file_leg: f64,
}

impl LaneSides {
    /// The first lane lies toward the destination, the second short of it,
    /// so the two lanes meet without crossing the corner cell. A straight
    /// move runs on the board-centre side.
    fn new(from: GridCell, to: GridCell, order: LegOrder) -> Self {
        let df = f64::from((to.file - from.file).signum());
        let dr = f64::from((to.rank - from.rank).signum());
        if dr == 0.0 || df == 0.0 {
            return Self {
                rank_leg: toward_centre(from.rank),
                file_leg: toward_centre(from.file),
            };
        }
        match order {
            LegOrder::RankFirst => Self {
                rank_leg: dr,
                file_leg: -df,
            },
            LegOrder::FileFirst => Self {
                rank_leg: -dr,
                file_leg: df,
            },
        }
    }

    fn for_leg(&self, leg_axis: Axis) -> f64 {
        match leg_axis {
            Axis::X => self.rank_leg,
            Axis::Y => self.file_leg,
        }
    }
}

/// Result of routing one piece.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutePlan {
    pub steps: Vec<Step>,
    pub displaced: Vec<DisplacedObstacle>,
}

impl RoutePlan {
    /// True for a single straight step with nothing pushed aside.
    pub fn is_direct(&self) -> bool {
        self.displaced.is_empty() && self.steps.len() <= 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObstacleRouter {
    mapper: CoordinateMapper,
    lane_mm: f64,
    slide_mm: f64,
}

impl ObstacleRouter {
    pub fn new(mapper: CoordinateMapper, lane_offset_mm: f64, slide_mm: f64) -> Self {
        Self {
            mapper,
            lane_mm: lane_offset_mm,
            slide_mm,
        }
    }

    /// Plan the traversal of the piece on `from` to `to`.
    pub fn route(&self, from: GridCell, to: GridCell, occupancy: &BoardOccupancy) -> RoutePlan {
        if from == to {
            return RoutePlan::default();
        }

        if !self.straight_line_grazes(from, to, occupancy) {
            return RoutePlan {
                steps: vec![Step::new(
                    "move",
                    self.mapper.cell_to_mm(from),
                    self.mapper.cell_to_mm(to),
                    format!("direct move {from} -> {to}"),
                )],
                displaced: Vec::new(),
            };
        }

        let rank_first = self.blockers(from, to, LegOrder::RankFirst, occupancy);
        let file_first = self.blockers(from, to, LegOrder::FileFirst, occupancy);
        let (order, blockers) = if file_first.len() < rank_first.len() {
            (LegOrder::FileFirst, file_first)
        } else {
            (LegOrder::RankFirst, rank_first)
        };

        debug!(
            "route {from} -> {to}: {} blocker(s) on {:?} path",
            blockers.len(),
            order
        );

        let sides = LaneSides::new(from, to, order);
        let mut plan = RoutePlan::default();
        for blocker in &blockers {
            let obstacle = self.displacement_for(blocker, &sides);
            plan.steps.push(obstacle.slide_step());
            plan.displaced.push(obstacle);
        }
        plan.steps.extend(self.lane_steps(from, to, order, &sides));
        plan
    }

    /// Occupied cells that would be struck along the given L orientation.
    pub fn blocking_cells(
        &self,
        from: GridCell,
        to: GridCell,
        order: LegOrder,
        occupancy: &BoardOccupancy,
    ) -> Vec<GridCell> {
        self.blockers(from, to, order, occupancy).into_iter().map(|b| b.cell).collect()
    }

    /// Whether a piece other than the endpoints sits closer than a lane
    /// offset to the straight segment `from -> to`.
    fn straight_line_grazes(&self, from: GridCell, to: GridCell, occupancy: &BoardOccupancy) -> bool {
        let a = self.mapper.cell_to_mm(from);
        let b = self.mapper.cell_to_mm(to);
        occupancy
            .iter()
            .filter(|&&cell| cell != from && cell != to)
            .any(|&cell| distance_to_segment(self.mapper.cell_to_mm(cell), a, b) < self.lane_mm)
    }

    fn blockers(&self, from: GridCell, to: GridCell, order: LegOrder, occupancy: &BoardOccupancy) -> Vec<Blocker> {
        let corner = corner_cell(from, to, order);
        let turns = corner != from && corner != to;
        let mut found = Vec::new();

        for (leg_start, leg_end) in [(from, corner), (corner, to)] {
            if leg_start == leg_end {
                continue;
            }
            let leg_axis = if leg_start.rank == leg_end.rank { Axis::X } else { Axis::Y };
            for cell in cells_strictly_between(leg_start, leg_end) {
                if occupancy.contains(&cell) {
                    found.push(Blocker { cell, leg_axis });
                }
            }
            if turns && leg_end == corner && occupancy.contains(&corner) {
                found.push(Blocker { cell: corner, leg_axis });
            }
        }

        found.retain(|b| b.cell != from && b.cell != to);
        found
    }

    /// Push across the leg, to the side opposite that leg's lane.
    fn displacement_for(&self, blocker: &Blocker, sides: &LaneSides) -> DisplacedObstacle {
        DisplacedObstacle {
            cell: blocker.cell,
            origin: self.mapper.cell_to_mm(blocker.cell),
            axis: blocker.leg_axis.perpendicular(),
            offset_mm: -sides.for_leg(blocker.leg_axis) * self.slide_mm,
        }
    }

    fn lane_steps(&self, from: GridCell, to: GridCell, order: LegOrder, sides: &LaneSides) -> Vec<Step> {
        let start = self.mapper.cell_to_mm(from);
        let end = self.mapper.cell_to_mm(to);
        let lane_y = |y: f64| y + sides.rank_leg * self.lane_mm;
        let lane_x = |x: f64| x + sides.file_leg * self.lane_mm;

        let mut points = vec![start];
        if from.rank == to.rank {
            let y = lane_y(start.y);
            points.extend([MillimeterPoint::new(start.x, y), MillimeterPoint::new(end.x, y)]);
        } else if from.file == to.file {
            let x = lane_x(start.x);
            points.extend([MillimeterPoint::new(x, start.y), MillimeterPoint::new(x, end.y)]);
        } else {
            match order {
                LegOrder::RankFirst => {
                    let (x, y) = (lane_x(end.x), lane_y(start.y));
                    points.extend([
                        MillimeterPoint::new(start.x, y),
                        MillimeterPoint::new(x, y),
                        MillimeterPoint::new(x, end.y),
                    ]);
                }
                LegOrder::FileFirst => {
                    let (x, y) = (lane_x(start.x), lane_y(end.y));
                    points.extend([
                        MillimeterPoint::new(x, start.y),
                        MillimeterPoint::new(x, y),
                        MillimeterPoint::new(end.x, y),
                    ]);
                }
            }
        }
        points.push(end);

        let last = points.len() - 2;
        points
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let (action, note) = match i {
                    0 => ("route offset", format!("{from} into lane")),
                    i if i == last => ("route recenter", format!("onto {to}")),
                    _ => ("route lane", format!("{from} -> {to} along lane")),
                };
                Step::new(action, pair[0], pair[1], note)
            })
            .collect()
    }
}

fn toward_centre(coordinate: i8) -> f64 {
    if coordinate < 4 {
        1.0
    } else {
        -1.0
    }
}

fn corner_cell(from: GridCell, to: GridCell, order: LegOrder) -> GridCell {
    match order {
        LegOrder::RankFirst => GridCell::new(to.file, from.rank),
        LegOrder::FileFirst => GridCell::new(from.file, to.rank),
    }
}

fn leg_direction(from: GridCell, to: GridCell) -> (i8, i8) {
    ((to.file - from.file).signum(), (to.rank - from.rank).signum())
}

/// Cells strictly between two cells sharing a rank or a file.
fn cells_strictly_between(a: GridCell, b: GridCell) -> Vec<GridCell> {
    let (df, dr) = leg_direction(a, b);
    let mut cells = Vec::new();
    let mut cur = GridCell::new(a.file + df, a.rank + dr);
    while cur != b {
        cells.push(cur);
        cur = GridCell::new(cur.file + df, cur.rank + dr);
    }
    cells
}

/// Euclidean distance from `p` to the segment `a -> b`.
pub fn distance_to_segment(p: MillimeterPoint, a: MillimeterPoint, b: MillimeterPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
