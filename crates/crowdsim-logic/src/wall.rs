//! Walls and doors bounding floorplan cells.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Foot, Segment};

/// Identifier of a floorplan cell.
pub type CellId = u32;

/// Index of a door in the routing graph.
pub type DoorId = usize;

/// The reserved exterior cell.
pub const OUTSIDE: CellId = 0;

/// Whether a wall blocks or admits passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallState {
    /// Impassable boundary.
    Wall,
    /// Passable opening, routed through by the goal force.
    Door,
}

/// Error raised while building geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Both endpoints coincide, so the wall has no direction.
    ZeroLengthWall { p1: DVec2 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::ZeroLengthWall { p1 } => {
                write!(f, "zero-length wall at ({}, {})", p1.x, p1.y)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Serializable wall description, as found in floorplan files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    pub p1: DVec2,
    pub p2: DVec2,
    pub state: WallState,
    pub connection: [CellId; 2],
}

impl WallSpec {
    pub fn build(&self) -> Result<Wall, GeometryError> {
        Wall::new(
            self.p1,
            self.p2,
            self.state,
            (self.connection[0], self.connection[1]),
        )
    }
}

/// A validated, non-degenerate wall segment separating two cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    segment: Segment,
    state: WallState,
    connection: (CellId, CellId),
    door_node: Option<DoorId>,
}

impl Wall {
    /// Build a wall, rejecting coincident endpoints.
    pub fn new(
        p1: DVec2,
        p2: DVec2,
        state: WallState,
        connection: (CellId, CellId),
    ) -> Result<Self, GeometryError> {
        if p1 == p2 {
            return Err(GeometryError::ZeroLengthWall { p1 });
        }
        Ok(Self {
            segment: Segment::new(p1, p2),
            state,
            connection,
            door_node: None,
        })
    }

    pub fn wall(p1: DVec2, p2: DVec2, connection: (CellId, CellId)) -> Result<Self, GeometryError> {
        Self::new(p1, p2, WallState::Wall, connection)
    }

    pub fn door(p1: DVec2, p2: DVec2, connection: (CellId, CellId)) -> Result<Self, GeometryError> {
        Self::new(p1, p2, WallState::Door, connection)
    }

    pub fn p1(&self) -> DVec2 {
        self.segment.p1
    }

    pub fn p2(&self) -> DVec2 {
        self.segment.p2
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn state(&self) -> WallState {
        self.state
    }

    pub fn is_door(&self) -> bool {
        self.state == WallState::Door
    }

    pub fn connection(&self) -> (CellId, CellId) {
        self.connection
    }

    /// Routing index, assigned by the floorplan to doors only.
    pub fn door_node(&self) -> Option<DoorId> {
        self.door_node
    }

    pub(crate) fn set_door_node(&mut self, node: DoorId) {
        self.door_node = Some(node);
    }

    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    /// Unit direction from `p1` to `p2`. Always defined since construction
    /// rejects zero-length walls.
    pub fn unit_vector(&self) -> DVec2 {
        (self.segment.p2 - self.segment.p1) / self.length()
    }

    pub fn midpoint(&self) -> DVec2 {
        self.segment.midpoint()
    }

    /// Does this wall separate `cell` from something?
    pub fn connects(&self, cell: CellId) -> bool {
        self.connection.0 == cell || self.connection.1 == cell
    }

    /// The cell on the far side of this wall as seen from `cell`.
    pub fn other_cell(&self, cell: CellId) -> CellId {
        if self.connection.0 == cell {
            self.connection.1
        } else {
            self.connection.0
        }
    }

    pub fn intersects(&self, line: &Segment) -> bool {
        line.intersects(&self.segment)
    }

    /// True when `point` lies on the line through this wall.
    pub fn is_on_line(&self, point: DVec2) -> bool {
        geometry::orientation(self.segment.p1, self.segment.p2, point)
            == geometry::Orientation::Collinear
    }

    pub fn perpendicular_foot(&self, point: DVec2) -> Option<Foot> {
        geometry::perpendicular_foot(&self.segment, point)
    }

    pub fn distance_to_door(&self, point: DVec2) -> f64 {
        geometry::distance_to_midpoint(&self.segment, point)
    }

    pub fn vector_to_door(&self, point: DVec2) -> DVec2 {
        geometry::vector_to_midpoint(&self.segment, point)
    }

    /// Same geometry, state and connection, ignoring the door index.
    pub(crate) fn same_as(&self, other: &Wall) -> bool {
        self.segment == other.segment
            && self.state == other.state
            && self.connection == other.connection
    }
}
