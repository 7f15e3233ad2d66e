//! Built-in floorplans used by the headless runner, benches and tests.

use glam::DVec2;

use crate::floorplan::{CellLocator, Floorplan, FloorplanError, FloorplanSpec};
use crate::wall::{CellId, WallSpec, WallState};

fn wall_spec(
    p1: (f64, f64),
    p2: (f64, f64),
    state: WallState,
    connection: [CellId; 2],
) -> WallSpec {
    WallSpec {
        p1: DVec2::new(p1.0, p1.1),
        p2: DVec2::new(p2.0, p2.1),
        state,
        connection,
    }
}

/// The 100×100 square split at `x = 50` into room 1 (left) and room 2
/// (right), joined by a door between `y = 45` and `y = 55`.
pub fn two_room_walls() -> Vec<WallSpec> {
    use WallState::{Door, Wall};
    vec![
        wall_spec((0.0, 0.0), (50.0, 0.0), Wall, [0, 1]),
        wall_spec((50.0, 0.0), (100.0, 0.0), Wall, [0, 2]),
        wall_spec((100.0, 0.0), (100.0, 100.0), Wall, [0, 2]),
        wall_spec((100.0, 100.0), (50.0, 100.0), Wall, [0, 2]),
        wall_spec((50.0, 100.0), (0.0, 100.0), Wall, [0, 1]),
        wall_spec((0.0, 100.0), (0.0, 0.0), Wall, [0, 1]),
        wall_spec((50.0, 0.0), (50.0, 45.0), Wall, [1, 2]),
        wall_spec((50.0, 55.0), (50.0, 100.0), Wall, [1, 2]),
        wall_spec((50.0, 45.0), (50.0, 55.0), Door, [1, 2]),
    ]
}

/// Two-room layout with everyone headed for room 2.
pub fn two_room_spec(population: u32) -> FloorplanSpec {
    FloorplanSpec {
        walls: two_room_walls(),
        distribution: vec![0, 0, population],
    }
}

pub fn two_room(population: u32) -> Result<Floorplan, FloorplanError> {
    Floorplan::from_spec(&two_room_spec(population))
}

/// Cell lookup shortcut valid for [`two_room`] only.
pub fn two_room_locator() -> CellLocator {
    CellLocator::Midline {
        x_split: 50.0,
        left: 1,
        right: 2,
    }
}

/// A closed 10×10 room with no doors; everyone stays in room 1.
pub fn single_room(population: u32) -> Result<Floorplan, FloorplanError> {
    use WallState::Wall;
    let spec = FloorplanSpec {
        walls: vec![
            wall_spec((0.0, 0.0), (10.0, 0.0), Wall, [0, 1]),
            wall_spec((10.0, 0.0), (10.0, 10.0), Wall, [0, 1]),
            wall_spec((10.0, 10.0), (0.0, 10.0), Wall, [0, 1]),
            wall_spec((0.0, 10.0), (0.0, 0.0), Wall, [0, 1]),
        ],
        distribution: vec![0, population],
    };
    Floorplan::from_spec(&spec)
}
