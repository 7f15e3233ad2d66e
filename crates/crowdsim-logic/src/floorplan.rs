//! Floorplan: cells bounded by walls, and all-pairs door routing.
//!
//! Walls are stored once in an arena; each cell keeps indices into it, so an
//! interior wall shared by two cells is the same wall (and the same door
//! node) from both sides.
//!
//! Door routing graph:
//! - one node per door, numbered in cell-iteration order
//! - doors bounding the same cell are joined by an edge weighted with the
//!   distance between their midpoints
//! - shortest paths over all pairs are solved with Floyd–Warshall

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Segment;
use crate::wall::{CellId, DoorId, GeometryError, Wall, WallSpec, OUTSIDE};

/// Serializable floorplan description: a flat wall list plus the number of
/// agents destined for each cell id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorplanSpec {
    pub walls: Vec<WallSpec>,
    pub distribution: Vec<u32>,
}

/// Error raised while assembling a floorplan.
#[derive(Debug, Clone, PartialEq)]
pub enum FloorplanError {
    Geometry(GeometryError),
    /// No walls were given.
    NoCells,
    /// The distribution sends agents to a cell with no walls.
    UnknownCell(CellId),
}

impl From<GeometryError> for FloorplanError {
    fn from(e: GeometryError) -> Self {
        FloorplanError::Geometry(e)
    }
}

impl std::fmt::Display for FloorplanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloorplanError::Geometry(e) => write!(f, "geometry error: {}", e),
            FloorplanError::NoCells => write!(f, "floorplan has no cells"),
            FloorplanError::UnknownCell(id) => {
                write!(f, "distribution targets cell {} which has no walls", id)
            }
        }
    }
}

impl std::error::Error for FloorplanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FloorplanError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

/// How a point is mapped to a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellLocator {
    /// Ray-casting parity test against every cell. Works for any layout.
    RayCast,
    /// `x > x_split ⇒ right`, else `left`. Only valid for two cells split by
    /// a vertical line.
    Midline {
        x_split: f64,
        left: CellId,
        right: CellId,
    },
}

/// Immutable floorplan with its precomputed door distance matrix.
#[derive(Debug, Clone)]
pub struct Floorplan {
    walls: Vec<Wall>,
    /// cell id → indices into `walls`, in the order given
    cells: BTreeMap<CellId, Vec<usize>>,
    /// cell id → door nodes bounding it
    cell_doors: BTreeMap<CellId, Vec<DoorId>>,
    /// door node → index into `walls`
    doors: Vec<usize>,
    distribution: Vec<u32>,
    /// `distances[i][j]`; `f64::INFINITY` where no route exists
    distances: Vec<Vec<f64>>,
    min: DVec2,
    max: DVec2,
}

impl Floorplan {
    /// Build from a per-cell list of bounding walls. A wall listed under both
    /// of its cells is stored once.
    pub fn new(
        cells: BTreeMap<CellId, Vec<Wall>>,
        distribution: Vec<u32>,
    ) -> Result<Self, FloorplanError> {
        let mut walls: Vec<Wall> = Vec::new();
        let mut cell_walls: BTreeMap<CellId, Vec<usize>> = BTreeMap::new();

        for (&cell, list) in &cells {
            let indices = cell_walls.entry(cell).or_default();
            for wall in list {
                let idx = match walls.iter().position(|w| w.same_as(wall)) {
                    Some(i) => i,
                    None => {
                        walls.push(wall.clone());
                        walls.len() - 1
                    }
                };
                indices.push(idx);
            }
        }

        Self::assemble(walls, cell_walls, distribution)
    }

    /// Build from a flat wall list, filing each wall under both cells it
    /// connects.
    pub fn from_walls(walls: Vec<Wall>, distribution: Vec<u32>) -> Result<Self, FloorplanError> {
        let mut cell_walls: BTreeMap<CellId, Vec<usize>> = BTreeMap::new();
        for (i, wall) in walls.iter().enumerate() {
            let (a, b) = wall.connection();
            cell_walls.entry(a).or_default().push(i);
            if b != a {
                cell_walls.entry(b).or_default().push(i);
            }
        }
        Self::assemble(walls, cell_walls, distribution)
    }

    /// Build from a deserialized description.
    pub fn from_spec(spec: &FloorplanSpec) -> Result<Self, FloorplanError> {
        let walls = spec
            .walls
            .iter()
            .map(WallSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_walls(walls, spec.distribution.clone())
    }

    fn assemble(
        mut walls: Vec<Wall>,
        cells: BTreeMap<CellId, Vec<usize>>,
        distribution: Vec<u32>,
    ) -> Result<Self, FloorplanError> {
        if walls.is_empty() {
            return Err(FloorplanError::NoCells);
        }
        for (cell, &count) in distribution.iter().enumerate() {
            let cell = cell as CellId;
            if count > 0 && !cells.contains_key(&cell) {
                return Err(FloorplanError::UnknownCell(cell));
            }
        }

        // 1. Number doors in discovery order
        let mut doors: Vec<usize> = Vec::new();
        let mut cell_doors: BTreeMap<CellId, Vec<DoorId>> = BTreeMap::new();
        for (&cell, indices) in &cells {
            let list = cell_doors.entry(cell).or_default();
            for &i in indices {
                if !walls[i].is_door() {
                    continue;
                }
                let node = match walls[i].door_node() {
                    Some(node) => node,
                    None => {
                        let node = doors.len();
                        walls[i].set_door_node(node);
                        doors.push(i);
                        node
                    }
                };
                if !list.contains(&node) {
                    list.push(node);
                }
            }
        }

        // 2. Routing graph: same-cell door pairs, zero self-loops
        let n = doors.len();
        let mut distances = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in distances.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for nodes in cell_doors.values() {
            for (a_pos, &a) in nodes.iter().enumerate() {
                for &b in &nodes[a_pos + 1..] {
                    let w = walls[doors[a]].midpoint().distance(walls[doors[b]].midpoint());
                    if w < distances[a][b] {
                        distances[a][b] = w;
                        distances[b][a] = w;
                    }
                }
            }
        }

        // 3. Floyd–Warshall
        for k in 0..n {
            for i in 0..n {
                let dik = distances[i][k];
                if dik.is_infinite() {
                    continue;
                }
                for j in 0..n {
                    let through = dik + distances[k][j];
                    if through < distances[i][j] {
                        distances[i][j] = through;
                    }
                }
            }
        }

        let unreachable = distances
            .iter()
            .flatten()
            .filter(|d| d.is_infinite())
            .count();
        if unreachable > 0 {
            log::warn!("Floorplan: {} ordered door pairs have no route", unreachable);
        }

        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for w in &walls {
            min = min.min(w.p1()).min(w.p2());
            max = max.max(w.p1()).max(w.p2());
        }

        log::debug!(
            "Floorplan: {} cells, {} walls, {} doors, bounds ({:.1},{:.1})→({:.1},{:.1})",
            cells.len(),
            walls.len(),
            n,
            min.x,
            min.y,
            max.x,
            max.y
        );

        Ok(Self {
            walls,
            cells,
            cell_doors,
            doors,
            distribution,
            distances,
            min,
            max,
        })
    }

    /// Cell ids in ascending order, including the exterior if it has walls.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Walls bounding `cell`, in construction order. Empty for unknown cells.
    pub fn walls_of(&self, cell: CellId) -> impl Iterator<Item = &Wall> + '_ {
        self.cells
            .get(&cell)
            .into_iter()
            .flatten()
            .map(move |&i| &self.walls[i])
    }

    /// Doors bounding `cell`.
    pub fn doors_of(&self, cell: CellId) -> impl Iterator<Item = &Wall> + '_ {
        self.cell_doors
            .get(&cell)
            .into_iter()
            .flatten()
            .map(move |&node| &self.walls[self.doors[node]])
    }

    pub fn door(&self, node: DoorId) -> Option<&Wall> {
        self.doors.get(node).map(|&i| &self.walls[i])
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Agents destined for each cell id.
    pub fn distribution(&self) -> &[u32] {
        &self.distribution
    }

    /// Shortest routed distance between two doors, `None` if unreachable or
    /// out of range.
    pub fn route_distance(&self, from: DoorId, to: DoorId) -> Option<f64> {
        self.distances
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .filter(|d| d.is_finite())
    }

    /// Bounding rectangle of all walls as `(min, max)`.
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (self.min, self.max)
    }

    /// Which interior cell contains `(x, y)`, by ray-cast parity.
    ///
    /// A horizontal ray is cast from just left of the floorplan to the point.
    /// A wall counts as a crossing when it intersects the ray and its
    /// endpoints lie on opposite sides of the ray's height (half-open, so a
    /// vertex shared by two walls is counted once and horizontal walls never
    /// count). An odd count means the point is inside. The exterior cell is
    /// never returned; `None` means no interior cell claims the point.
    pub fn find_cell(&self, x: f64, y: f64) -> Option<CellId> {
        let ray = Segment::new(DVec2::new(self.min.x - 1.0, y), DVec2::new(x, y));
        self.cells
            .iter()
            .filter(|&(&cell, _)| cell != OUTSIDE)
            .find(|(_, indices)| {
                let crossings = indices
                    .iter()
                    .map(|&i| &self.walls[i])
                    .filter(|w| (w.p1().y > y) != (w.p2().y > y) && w.intersects(&ray))
                    .count();
                crossings % 2 == 1
            })
            .map(|(&cell, _)| cell)
    }

    /// Resolve a point with the given locator policy.
    pub fn locate(&self, x: f64, y: f64, locator: CellLocator) -> Option<CellId> {
        match locator {
            CellLocator::RayCast => self.find_cell(x, y),
            CellLocator::Midline {
                x_split,
                left,
                right,
            } => Some(if x > x_split { right } else { left }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts;
    use crate::wall::WallState;

    fn p(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    /// Three rooms in a row (ids 1, 2, 3), doors at x=10 and x=20.
    fn corridor() -> Floorplan {
        let w = |a: DVec2, b: DVec2, c: (CellId, CellId)| Wall::wall(a, b, c).unwrap();
        let d = |a: DVec2, b: DVec2, c: (CellId, CellId)| Wall::door(a, b, c).unwrap();
        let walls = vec![
            w(p(0.0, 0.0), p(30.0, 0.0), (0, 1)),
            w(p(0.0, 10.0), p(30.0, 10.0), (0, 1)),
            w(p(0.0, 0.0), p(0.0, 10.0), (0, 1)),
            w(p(30.0, 0.0), p(30.0, 10.0), (0, 3)),
            w(p(10.0, 0.0), p(10.0, 4.0), (1, 2)),
            d(p(10.0, 4.0), p(10.0, 6.0), (1, 2)),
            w(p(10.0, 6.0), p(10.0, 10.0), (1, 2)),
            w(p(20.0, 0.0), p(20.0, 4.0), (2, 3)),
            d(p(20.0, 4.0), p(20.0, 6.0), (2, 3)),
            w(p(20.0, 6.0), p(20.0, 10.0), (2, 3)),
        ];
        Floorplan::from_walls(walls, vec![0, 0, 0, 5]).unwrap()
    }

    #[test]
    fn doors_numbered_once() {
        let fp = layouts::two_room(10).unwrap();
        assert_eq!(fp.door_count(), 1);
        let from_1: Vec<_> = fp.doors_of(1).map(|d| d.door_node()).collect();
        let from_2: Vec<_> = fp.doors_of(2).map(|d| d.door_node()).collect();
        assert_eq!(from_1, vec![Some(0)]);
        assert_eq!(from_1, from_2);
    }

    #[test]
    fn per_cell_lists_share_walls() {
        let door = Wall::door(p(50.0, 45.0), p(50.0, 55.0), (1, 2)).unwrap();
        let mut cells = BTreeMap::new();
        cells.insert(1, vec![door.clone()]);
        cells.insert(2, vec![door]);
        let fp = Floorplan::new(cells, vec![]).unwrap();
        assert_eq!(fp.walls().len(), 1);
        assert_eq!(fp.door_count(), 1);
        assert_eq!(fp.route_distance(0, 0), Some(0.0));
    }

    #[test]
    fn routing_through_middle_room() {
        let fp = corridor();
        assert_eq!(fp.door_count(), 2);
        // Doors share room 2, midpoints 10 apart
        let d = fp.route_distance(0, 1).unwrap();
        assert!((d - 10.0).abs() < 1e-12);
        assert_eq!(fp.route_distance(1, 0), Some(d));
    }

    /// Five rooms in a row whose ids are shuffled along the chain, so the
    /// doors are numbered out of walking order. Doors zig-zag between
    /// `y = 2` and `y = 8`, every hop is √136 long.
    ///
    /// Walking order of rooms: 1, 3, 5, 2, 4. Walking order of door nodes:
    /// 0, 3, 1, 2.
    fn shuffled_chain() -> Floorplan {
        let d = |x: f64, y: f64, c: (CellId, CellId)| {
            Wall::door(p(x, y - 1.0), p(x, y + 1.0), c).unwrap()
        };
        let walls = vec![
            d(10.0, 2.0, (1, 3)),
            d(20.0, 8.0, (3, 5)),
            d(30.0, 2.0, (5, 2)),
            d(40.0, 8.0, (2, 4)),
        ];
        Floorplan::from_walls(walls, vec![]).unwrap()
    }

    #[test]
    fn routes_chain_through_intermediate_doors() {
        let fp = shuffled_chain();
        assert_eq!(fp.door_count(), 4);
        let hop = 136.0_f64.sqrt();
        let walk_pos: [f64; 4] = [0.0, 2.0, 3.0, 1.0];
        for i in 0..4 {
            for j in 0..4 {
                let want = (walk_pos[i] - walk_pos[j]).abs() * hop;
                let got = fp.route_distance(i, j).unwrap();
                assert!((got - want).abs() < 1e-9, "{} → {}: {} vs {}", i, j, got, want);
            }
        }
        // Door 0 to door 2 takes three hops, longer than the straight line
        let straight = fp.door(0).unwrap().midpoint().distance(fp.door(2).unwrap().midpoint());
        assert!(fp.route_distance(0, 2).unwrap() > straight + 1.0);
    }

    #[test]
    fn floyd_warshall_invariants() {
        for fp in [corridor(), shuffled_chain()] {
            assert_floyd_warshall_invariants(&fp);
        }
    }

    fn assert_floyd_warshall_invariants(fp: &Floorplan) {
        let n = fp.door_count();
        for i in 0..n {
            assert_eq!(fp.route_distance(i, i), Some(0.0));
            for j in 0..n {
                for k in 0..n {
                    if let (Some(ij), Some(ik), Some(kj)) = (
                        fp.route_distance(i, j),
                        fp.route_distance(i, k),
                        fp.route_distance(k, j),
                    ) {
                        assert!(ij <= ik + kj + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn unreachable_doors_have_no_route() {
        let walls = vec![
            Wall::door(p(0.0, 0.0), p(0.0, 1.0), (1, 2)).unwrap(),
            Wall::door(p(5.0, 0.0), p(5.0, 1.0), (3, 4)).unwrap(),
        ];
        let fp = Floorplan::from_walls(walls, vec![]).unwrap();
        assert_eq!(fp.route_distance(0, 1), None);
        assert_eq!(fp.route_distance(0, 7), None);
    }

    #[test]
    fn find_cell_two_rooms() {
        let fp = layouts::two_room(0).unwrap();
        assert_eq!(fp.find_cell(20.0, 30.0), Some(1));
        assert_eq!(fp.find_cell(70.0, 30.0), Some(2));
        assert_eq!(fp.find_cell(25.0, 50.0), Some(1));
        assert_eq!(fp.find_cell(75.0, 50.0), Some(2));
        assert_eq!(fp.find_cell(150.0, 50.0), None);
        assert_eq!(fp.find_cell(-5.0, 50.0), None);
        assert_eq!(fp.find_cell(20.0, 150.0), None);
    }

    #[test]
    fn find_cell_ray_through_shared_vertex() {
        // y = 45 passes exactly through the door/wall joint at (50, 45)
        let fp = layouts::two_room(0).unwrap();
        assert_eq!(fp.find_cell(20.0, 45.0), Some(1));
        assert_eq!(fp.find_cell(80.0, 45.0), Some(2));
    }

    #[test]
    fn find_cell_three_rooms() {
        let fp = corridor();
        assert_eq!(fp.find_cell(5.0, 5.0), Some(1));
        assert_eq!(fp.find_cell(15.0, 2.0), Some(2));
        assert_eq!(fp.find_cell(25.0, 8.0), Some(3));
    }

    #[test]
    fn midline_locator() {
        let fp = layouts::two_room(0).unwrap();
        let midline = layouts::two_room_locator();
        for &(x, y) in &[(10.0, 10.0), (60.0, 90.0), (49.0, 50.0), (51.0, 50.0)] {
            assert_eq!(
                fp.locate(x, y, midline),
                fp.locate(x, y, CellLocator::RayCast)
            );
        }
    }

    #[test]
    fn distribution_must_name_known_cells() {
        let walls = vec![Wall::wall(p(0.0, 0.0), p(1.0, 0.0), (0, 1)).unwrap()];
        let err = Floorplan::from_walls(walls.clone(), vec![0, 0, 3]).unwrap_err();
        assert_eq!(err, FloorplanError::UnknownCell(2));
        // Zero counts are fine for any id
        assert!(Floorplan::from_walls(walls, vec![0, 4, 0]).is_ok());
    }

    #[test]
    fn empty_floorplan_rejected() {
        let err = Floorplan::from_walls(vec![], vec![]).unwrap_err();
        assert_eq!(err, FloorplanError::NoCells);
    }

    #[test]
    fn spec_with_degenerate_wall_fails() {
        let spec = FloorplanSpec {
            walls: vec![WallSpec {
                p1: p(1.0, 1.0),
                p2: p(1.0, 1.0),
                state: WallState::Wall,
                connection: [0, 1],
            }],
            distribution: vec![],
        };
        assert!(matches!(
            Floorplan::from_spec(&spec),
            Err(FloorplanError::Geometry(GeometryError::ZeroLengthWall { .. }))
        ));
    }
}
