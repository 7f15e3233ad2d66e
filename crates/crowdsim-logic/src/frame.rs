//! Per-tick snapshots handed to renderers and harnesses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::wall::CellId;

/// Every agent's state after `tick` ticks (tick 0 is the initial scatter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: usize,
    pub agents: Vec<Agent>,
}

impl Frame {
    /// Agents grouped by the cell they occupy.
    pub fn by_cell(&self) -> BTreeMap<CellId, Vec<&Agent>> {
        let mut cells: BTreeMap<CellId, Vec<&Agent>> = BTreeMap::new();
        for agent in &self.agents {
            cells.entry(agent.cell).or_default().push(agent);
        }
        cells
    }

    pub fn count_in(&self, cell: CellId) -> usize {
        self.agents.iter().filter(|a| a.cell == cell).count()
    }

    /// Number of agents standing in their destination cell.
    pub fn arrived(&self) -> usize {
        self.agents.iter().filter(|a| a.at_destination()).count()
    }

    pub fn max_speed(&self) -> f64 {
        self.agents.iter().map(Agent::speed).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn grouping_and_counts() {
        let mut moving = Agent::new(2, DVec2::new(60.0, 5.0), 2, 2);
        moving.velocity = DVec2::new(0.3, 0.4);
        let frame = Frame {
            tick: 3,
            agents: vec![
                Agent::new(0, DVec2::new(1.0, 1.0), 1, 2),
                Agent::new(1, DVec2::new(2.0, 1.0), 1, 2),
                moving,
            ],
        };
        let cells = frame.by_cell();
        assert_eq!(cells[&1].len(), 2);
        assert_eq!(cells[&2][0].id, 2);
        assert_eq!(frame.count_in(1), 2);
        assert_eq!(frame.count_in(5), 0);
        assert_eq!(frame.arrived(), 1);
        assert!((frame.max_speed() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn serializes_to_json() {
        let frame = Frame {
            tick: 0,
            agents: vec![Agent::new(0, DVec2::new(1.0, 2.0), 1, 2)],
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"position\":[1.0,2.0]"));
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
