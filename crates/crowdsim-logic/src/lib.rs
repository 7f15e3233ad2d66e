//! Pure simulation logic for crowdsim.
//!
//! Pedestrian agents move through a polygonal floorplan under a social-force
//! model: walls and other agents push them away, and the nearest door on
//! the shortest route pulls them toward their destination cell. Nothing here
//! renders, persists or spawns threads; functions take plain data and return
//! results.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geometry`] | Orientation, segment intersection, perpendicular foot |
//! | [`wall`] | Validated walls/doors and their derived data |
//! | [`floorplan`] | Cells, door numbering, Floyd–Warshall routing, cell lookup |
//! | [`agent`] | Per-agent position, velocity and cells |
//! | [`params`] | Tunable parameters and their validation |
//! | [`force`] | Wall, agent and goal force terms |
//! | [`simulation`] | Population scatter, tick stepper, frame sequence |
//! | [`frame`] | Per-tick snapshots |
//! | [`layouts`] | Built-in floorplans |
//!
//! # Example
//!
//! ```
//! use crowdsim_logic::layouts;
//! use crowdsim_logic::params::SimParams;
//! use crowdsim_logic::simulation::Simulation;
//!
//! let params = SimParams { simulation_length: 10, ..SimParams::default() };
//! let sim = Simulation::new(params, layouts::two_room(25).unwrap()).unwrap();
//! let frames: Vec<_> = sim.run().collect();
//! assert_eq!(frames.len(), 11);
//! ```

pub mod agent;
pub mod floorplan;
pub mod force;
pub mod frame;
pub mod geometry;
pub mod layouts;
pub mod params;
pub mod simulation;
pub mod wall;
