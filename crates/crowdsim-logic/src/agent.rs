//! Per-agent mutable state.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::wall::CellId;

/// Stable agent identifier, assigned in creation order.
pub type AgentId = u32;

/// A pedestrian: where it is, how it moves, where it is and where it's going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: DVec2,
    pub velocity: DVec2,
    /// Cell the agent currently occupies.
    pub cell: CellId,
    /// Cell the agent is routing toward.
    pub destination: CellId,
}

impl Agent {
    /// A stationary agent.
    pub fn new(id: AgentId, position: DVec2, cell: CellId, destination: CellId) -> Self {
        Self {
            id,
            position,
            velocity: DVec2::ZERO,
            cell,
            destination,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn at_destination(&self) -> bool {
        self.cell == self.destination
    }

    /// Vector pointing from `other` to `self`.
    pub fn vec_from(&self, other: &Agent) -> DVec2 {
        self.position - other.position
    }
}
