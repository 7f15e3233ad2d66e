//! Social-force terms acting on a single agent.
//!
//! Each term is a pure function of the agent, its surroundings and the
//! parameters. Zero distances are skipped, and so is any single contribution
//! whose `K / dⁿ` overflows at a vanishing distance, so no term ever returns
//! a NaN or infinite component.

use glam::DVec2;

use crate::agent::Agent;
use crate::floorplan::Floorplan;
use crate::params::SimParams;
use crate::wall::Wall;

/// `vec · constant / dⁿ`, or `None` when `dist` is zero or the result is not
/// finite.
fn scaled(vec: DVec2, constant: f64, dist: f64, n: i32) -> Option<DVec2> {
    if dist <= 0.0 {
        return None;
    }
    let f = vec * (constant / dist.powi(n));
    f.is_finite().then_some(f)
}

/// The three force terms for one agent, kept apart for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Forces {
    pub wall: DVec2,
    pub agent: DVec2,
    pub goal: DVec2,
}

impl Forces {
    pub fn total(&self) -> DVec2 {
        self.wall + self.agent + self.goal
    }
}

/// Repulsion from walls whose perpendicular foot lies within the margin.
pub fn wall_force<'a>(
    walls: impl IntoIterator<Item = &'a Wall>,
    position: DVec2,
    params: &SimParams,
) -> DVec2 {
    let n = params.wall_force_law.exponent();
    walls
        .into_iter()
        .filter_map(|w| w.perpendicular_foot(position))
        .filter(|foot| foot.distance <= params.wall_force_margin)
        .filter_map(|foot| scaled(foot.offset, params.wall_force_constant, foot.distance, n))
        .sum()
}

/// Inverse-cube repulsion from other agents closer than the margin.
pub fn agent_force<'a>(
    agent: &Agent,
    neighbours: impl IntoIterator<Item = &'a Agent>,
    params: &SimParams,
) -> DVec2 {
    neighbours
        .into_iter()
        .filter(|other| other.id != agent.id)
        .filter_map(|other| {
            let vec = agent.vec_from(other);
            let dist = vec.length();
            if dist < params.agent_force_margin {
                scaled(vec, params.agent_force_constant, dist, 3)
            } else {
                None
            }
        })
        .sum()
}

/// The door of the agent's current cell on the shortest route to any door of
/// its destination. Ties go to the first door found. `None` when the cell has
/// no doors or no door has a finite route.
pub fn best_door<'a>(agent: &Agent, floorplan: &'a Floorplan) -> Option<&'a Wall> {
    let mut best: Option<(&Wall, f64)> = None;
    for next in floorplan.doors_of(agent.cell) {
        let Some(from) = next.door_node() else {
            continue;
        };
        let to_door = next.distance_to_door(agent.position);
        for dest in floorplan.doors_of(agent.destination) {
            let Some(route) = dest.door_node().and_then(|to| floorplan.route_distance(from, to))
            else {
                continue;
            };
            let total = to_door + route;
            if best.map_or(true, |(_, d)| total < d) {
                best = Some((next, total));
            }
        }
    }
    best.map(|(door, _)| door)
}

/// Inverse-cube attraction toward the midpoint of the best door. Zero once
/// the agent is in its destination cell or when no route exists.
pub fn goal_force(agent: &Agent, floorplan: &Floorplan, params: &SimParams) -> DVec2 {
    if agent.at_destination() {
        return DVec2::ZERO;
    }
    let Some(door) = best_door(agent, floorplan) else {
        return DVec2::ZERO;
    };
    let vec = door.vector_to_door(agent.position);
    scaled(vec, params.goal_force_constant, vec.length(), 3).unwrap_or(DVec2::ZERO)
}

/// All three terms for `agent`, given the agents sharing its cell.
pub fn forces_on<'a>(
    agent: &Agent,
    cellmates: impl IntoIterator<Item = &'a Agent>,
    floorplan: &Floorplan,
    params: &SimParams,
) -> Forces {
    Forces {
        wall: wall_force(floorplan.walls_of(agent.cell), agent.position, params),
        agent: agent_force(agent, cellmates, params),
        goal: goal_force(agent, floorplan, params),
    }
}
