//! Simulation engine - owns the population and advances it tick by tick.
//!
//! Each tick:
//! 1. Sum wall, agent and goal forces for every agent from the state at the
//!    start of the tick
//! 2. Integrate `v += F`, cap speed at `max_velocity`, then `x += v`
//! 3. Move agents whose step crossed a wall of their cell into the cell on
//!    the other side
//! 4. Move transitioned agents between the per-cell index lists
//!
//! Agents live in one flat `Vec`; the per-cell grouping is an index over it.

use std::collections::{BTreeMap, BTreeSet};
use std::iter::FusedIterator;

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{Agent, AgentId};
use crate::floorplan::{Floorplan, FloorplanError};
use crate::force;
use crate::frame::Frame;
use crate::geometry::Segment;
use crate::params::{ConfigError, SimParams};
use crate::wall::CellId;

/// Error raised while setting up a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(Vec<ConfigError>),
    Floorplan(FloorplanError),
    /// No sample out of `attempts` landed inside a cell.
    PlacementFailed { destination: CellId, attempts: u32 },
    /// Two agents were given the same id.
    DuplicateAgentId(AgentId),
}

impl From<FloorplanError> for SimulationError {
    fn from(e: FloorplanError) -> Self {
        SimulationError::Floorplan(e)
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::Config(errors) => {
                write!(f, "invalid parameters: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            SimulationError::Floorplan(e) => write!(f, "floorplan error: {}", e),
            SimulationError::PlacementFailed {
                destination,
                attempts,
            } => write!(
                f,
                "could not place an agent bound for cell {} inside any cell after {} attempts",
                destination, attempts
            ),
            SimulationError::DuplicateAgentId(id) => write!(f, "agent id {} is used twice", id),
        }
    }
}

impl std::error::Error for SimulationError {}

/// Scatter the floorplan's distribution uniformly over the world bounds.
///
/// Each sample is resolved to a cell with [`Floorplan::find_cell`]; samples
/// outside every cell are redrawn up to `max_placement_attempts` times.
pub fn populate<R: Rng>(
    floorplan: &Floorplan,
    params: &SimParams,
    rng: &mut R,
) -> Result<Vec<Agent>, SimulationError> {
    check_params(params)?;
    let mut agents = Vec::new();
    let mut redraws = 0u64;

    for (destination, &count) in floorplan.distribution().iter().enumerate() {
        let destination = destination as CellId;
        for _ in 0..count {
            let mut placed = None;
            for _ in 0..params.max_placement_attempts {
                let x = rng.gen_range(0.0..params.width);
                let y = rng.gen_range(0.0..params.height);
                if let Some(cell) = floorplan.find_cell(x, y) {
                    placed = Some((DVec2::new(x, y), cell));
                    break;
                }
                redraws += 1;
            }
            let Some((position, cell)) = placed else {
                log::warn!(
                    "Placement gave up for destination {} after {} samples",
                    destination,
                    params.max_placement_attempts
                );
                return Err(SimulationError::PlacementFailed {
                    destination,
                    attempts: params.max_placement_attempts,
                });
            };
            let id = agents.len() as AgentId;
            agents.push(Agent::new(id, position, cell, destination));
        }
    }

    log::info!(
        "Placed {} agents ({} samples redrawn)",
        agents.len(),
        redraws
    );
    Ok(agents)
}

/// The cell an agent enters when moving from `from` to `to` inside `cell`,
/// or `None` if the step crosses none of the cell's walls.
///
/// A step that ends on a wall's line has not crossed it yet. A step that
/// starts on a wall's line crosses only if `to` no longer lies in `cell`.
pub fn crossed_cell(
    floorplan: &Floorplan,
    cell: CellId,
    from: DVec2,
    to: DVec2,
) -> Option<CellId> {
    if from == to {
        return None;
    }
    let step = Segment::new(from, to);
    floorplan
        .walls_of(cell)
        .filter(|w| w.intersects(&step) && !w.is_on_line(to))
        .find(|w| !w.is_on_line(from) || floorplan.find_cell(to.x, to.y) != Some(cell))
        .map(|w| w.other_cell(cell))
}

/// A single run: floorplan, parameters and the evolving population.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimParams,
    floorplan: Floorplan,
    agents: Vec<Agent>,
    /// cell id → indices into `agents`
    by_cell: BTreeMap<CellId, Vec<usize>>,
    /// agent index → its position in `by_cell[agent.cell]`
    slots: Vec<usize>,
    tick: usize,
}

impl Simulation {
    /// Validate `params` and scatter the floorplan's population using a
    /// generator seeded with `params.random_seed`.
    pub fn new(params: SimParams, floorplan: Floorplan) -> Result<Self, SimulationError> {
        let mut rng = StdRng::seed_from_u64(params.random_seed);
        Self::with_rng(params, floorplan, &mut rng)
    }

    /// Like [`Simulation::new`] but drawing from a caller-supplied generator.
    pub fn with_rng<R: Rng>(
        params: SimParams,
        floorplan: Floorplan,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let agents = populate(&floorplan, &params, rng)?;
        Self::with_agents(params, floorplan, agents)
    }

    /// Start from an explicit population instead of a random scatter.
    pub fn with_agents(
        params: SimParams,
        floorplan: Floorplan,
        agents: Vec<Agent>,
    ) -> Result<Self, SimulationError> {
        check_params(&params)?;
        let mut seen = BTreeSet::new();
        if let Some(dup) = agents.iter().find(|a| !seen.insert(a.id)) {
            return Err(SimulationError::DuplicateAgentId(dup.id));
        }
        let mut sim = Self {
            params,
            floorplan,
            agents,
            by_cell: BTreeMap::new(),
            slots: Vec::new(),
            tick: 0,
        };
        sim.reindex();
        log::info!(
            "Simulation ready: {} agents, {} cells, {} doors, {} ticks planned",
            sim.agents.len(),
            sim.floorplan.cell_count(),
            sim.floorplan.door_count(),
            sim.params.simulation_length
        );
        Ok(sim)
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn floorplan(&self) -> &Floorplan {
        &self.floorplan
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Ticks performed so far.
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Indices (into [`Simulation::agents`]) of agents in `cell`, in no
    /// particular order.
    pub fn agents_in(&self, cell: CellId) -> &[usize] {
        self.by_cell.get(&cell).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Force terms currently acting on agent `index`.
    pub fn forces_on(&self, index: usize) -> Option<force::Forces> {
        let agent = self.agents.get(index)?;
        let mates = self.agents_in(agent.cell).iter().map(|&i| &self.agents[i]);
        Some(force::forces_on(agent, mates, &self.floorplan, &self.params))
    }

    /// Advance one tick.
    pub fn step(&mut self) {
        let forces: Vec<DVec2> = (0..self.agents.len())
            .map(|i| self.forces_on(i).map(|f| f.total()).unwrap_or(DVec2::ZERO))
            .collect();

        let max_velocity = self.params.max_velocity;
        let mut transitions = Vec::new();
        for (i, (agent, f)) in self.agents.iter_mut().zip(forces).enumerate() {
            if f.is_finite() {
                agent.velocity += f;
            } else {
                log::warn!("Agent {}: dropped non-finite force {:?}", agent.id, f);
            }
            let speed = agent.velocity.length();
            if speed > max_velocity {
                agent.velocity *= max_velocity / speed;
            }

            let old = agent.position;
            agent.position += agent.velocity;

            if let Some(next) = crossed_cell(&self.floorplan, agent.cell, old, agent.position) {
                log::debug!("Agent {}: cell {} → {}", agent.id, agent.cell, next);
                transitions.push((i, agent.cell, next));
                agent.cell = next;
            }
        }

        for &(i, from, to) in &transitions {
            self.move_index(i, from, to);
        }
        self.tick += 1;
        log::trace!("Tick {}: {} cell transitions", self.tick, transitions.len());
    }

    /// Snapshot of the current state.
    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.tick,
            agents: self.agents.clone(),
        }
    }

    /// The initial frame followed by one frame per tick, `simulation_length`
    /// ticks in all. Consumes the simulation.
    pub fn run(self) -> Frames {
        let remaining = self.params.simulation_length;
        log::info!("Run started: {} ticks", remaining);
        Frames {
            sim: self,
            remaining,
            started: false,
        }
    }

    fn reindex(&mut self) {
        self.by_cell.clear();
        self.slots.clear();
        for (i, agent) in self.agents.iter().enumerate() {
            let list = self.by_cell.entry(agent.cell).or_default();
            self.slots.push(list.len());
            list.push(i);
        }
    }

    /// Move agent `index` from `from`'s list to `to`'s in constant time.
    fn move_index(&mut self, index: usize, from: CellId, to: CellId) {
        let slot = self.slots[index];
        if let Some(list) = self.by_cell.get_mut(&from) {
            list.swap_remove(slot);
            if let Some(&moved) = list.get(slot) {
                self.slots[moved] = slot;
            }
        }
        let list = self.by_cell.entry(to).or_default();
        self.slots[index] = list.len();
        list.push(index);
    }
}

fn check_params(params: &SimParams) -> Result<(), SimulationError> {
    let errors = params.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SimulationError::Config(errors))
    }
}

/// Lazy, finite frame sequence produced by [`Simulation::run`].
#[derive(Debug)]
pub struct Frames {
    sim: Simulation,
    remaining: usize,
    started: bool,
}

impl Frames {
    /// The simulation in whatever state the sequence has reached.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn into_simulation(self) -> Simulation {
        self.sim
    }
}

impl Iterator for Frames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if !self.started {
            self.started = true;
            return Some(self.sim.frame());
        }
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.sim.step();
        if self.remaining == 0 {
            log::info!("Run finished after {} ticks", self.sim.tick());
        }
        Some(self.sim.frame())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining + usize::from(!self.started);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Frames {}

impl FusedIterator for Frames {}
