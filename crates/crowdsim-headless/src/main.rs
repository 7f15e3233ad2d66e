//! Crowdsim Headless Runner
//!
//! Drives a floorplan simulation to completion without rendering, reporting
//! per-cell occupancy as it goes and checking run invariants on every frame.
//!
//! Usage:
//!   cargo run -p crowdsim-headless
//!   cargo run -p crowdsim-headless -- --population 500 --ticks 300 --verbose
//!   cargo run -p crowdsim-headless -- --floorplan data/three_room.json \
//!       --params data/three_room_params.json --dump frames.json

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crowdsim_logic::floorplan::{Floorplan, FloorplanSpec};
use crowdsim_logic::frame::Frame;
use crowdsim_logic::layouts;
use crowdsim_logic::params::SimParams;
use crowdsim_logic::simulation::Simulation;

const DEFAULT_POPULATION: u32 = 100;
const SPEED_TOLERANCE: f64 = 1e-9;

// ── Command line ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Args {
    floorplan: Option<PathBuf>,
    params: Option<PathBuf>,
    seed: Option<u64>,
    ticks: Option<usize>,
    population: Option<u32>,
    dump: Option<PathBuf>,
    verbose: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(flag) = argv.next() {
        let mut value = || argv.next().ok_or_else(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--floorplan" => args.floorplan = Some(PathBuf::from(value()?)),
            "--params" => args.params = Some(PathBuf::from(value()?)),
            "--dump" => args.dump = Some(PathBuf::from(value()?)),
            "--seed" => args.seed = Some(parse_number(&flag, &value()?)?),
            "--ticks" => args.ticks = Some(parse_number(&flag, &value()?)?),
            "--population" => args.population = Some(parse_number(&flag, &value()?)?),
            "--verbose" => args.verbose = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    if args.floorplan.is_some() && args.population.is_some() {
        return Err("--population only applies to the built-in layout".into());
    }
    Ok(args)
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, raw))
}

// ── Setup ───────────────────────────────────────────────────────────────

type BoxError = Box<dyn std::error::Error>;

fn load_floorplan(args: &Args) -> Result<Floorplan, BoxError> {
    match &args.floorplan {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {}", path.display(), e))?;
            let spec: FloorplanSpec = serde_json::from_str(&text)
                .map_err(|e| format!("parsing {}: {}", path.display(), e))?;
            Ok(Floorplan::from_spec(&spec)?)
        }
        None => Ok(layouts::two_room(
            args.population.unwrap_or(DEFAULT_POPULATION),
        )?),
    }
}

fn load_params(args: &Args) -> Result<SimParams, BoxError> {
    let mut params: SimParams = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {}", path.display(), e))?;
            serde_json::from_str(&text).map_err(|e| format!("parsing {}: {}", path.display(), e))?
        }
        None => SimParams::default(),
    };
    if let Some(seed) = args.seed {
        params.random_seed = seed;
    }
    if let Some(ticks) = args.ticks {
        params.simulation_length = ticks;
    }
    Ok(params)
}

// ── Frame dump ──────────────────────────────────────────────────────────

/// Streams frames out as one JSON array.
struct FrameDump {
    out: BufWriter<File>,
    written: usize,
}

impl FrameDump {
    fn create(path: &Path) -> Result<Self, BoxError> {
        let file = File::create(path).map_err(|e| format!("creating {}: {}", path.display(), e))?;
        let mut out = BufWriter::new(file);
        out.write_all(b"[")?;
        Ok(Self { out, written: 0 })
    }

    fn push(&mut self, frame: &Frame) -> Result<(), BoxError> {
        if self.written > 0 {
            self.out.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut self.out, frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<usize, BoxError> {
        self.out.write_all(b"]\n")?;
        self.out.flush()?;
        Ok(self.written)
    }
}

// ── Run + checks ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn run(args: &Args) -> Result<Vec<TestResult>, BoxError> {
    let floorplan = load_floorplan(args)?;
    let params = load_params(args)?;
    let ticks = params.simulation_length;
    let cap = params.max_velocity;
    let report_every = (ticks / 10).max(1);

    let sim = Simulation::new(params, floorplan)?;
    let population = sim.agents().len();
    let mut dump = args.dump.as_deref().map(FrameDump::create).transpose()?;

    let mut frames = 0usize;
    let mut out_of_order = None;
    let mut fastest = 0.0f64;
    let mut speeding = None;
    let mut lost = None;
    let mut non_finite = None;
    let mut last: Option<Frame> = None;

    for frame in sim.run() {
        if frame.tick != frames && out_of_order.is_none() {
            out_of_order = Some((frames, frame.tick));
        }
        frames += 1;

        let top = frame.max_speed();
        fastest = fastest.max(top);
        if top > cap + SPEED_TOLERANCE && speeding.is_none() {
            speeding = Some((frame.tick, top));
        }
        if frame.agents.len() != population && lost.is_none() {
            lost = Some((frame.tick, frame.agents.len()));
        }
        if non_finite.is_none() {
            non_finite = frame
                .agents
                .iter()
                .find(|a| !a.position.is_finite() || !a.velocity.is_finite())
                .map(|a| (frame.tick, a.id));
        }

        if frame.tick % report_every == 0 || frame.tick == ticks {
            log::info!(
                "tick {:>5}: {} arrived, occupancy {}",
                frame.tick,
                frame.arrived(),
                occupancy(&frame)
            );
        }
        if let Some(dump) = dump.as_mut() {
            dump.push(&frame)?;
        }
        last = Some(frame);
    }

    if let (Some(dump), Some(path)) = (dump, &args.dump) {
        let written = dump.finish()?;
        log::info!("Wrote {} frames to {}", written, path.display());
    }

    let mut results = vec![
        TestResult {
            name: "frame_count".into(),
            passed: frames == ticks + 1,
            detail: format!("{} frames for {} ticks", frames, ticks),
        },
        TestResult {
            name: "tick_sequence".into(),
            passed: out_of_order.is_none(),
            detail: match out_of_order {
                Some((want, got)) => format!("frame {} reported tick {}", want, got),
                None => "ticks numbered 0..=N".into(),
            },
        },
        TestResult {
            name: "velocity_cap".into(),
            passed: speeding.is_none(),
            detail: match speeding {
                Some((tick, speed)) => format!("speed {:.6} > {} at tick {}", speed, cap, tick),
                None => format!("max speed {:.6} <= {}", fastest, cap),
            },
        },
        TestResult {
            name: "population_fixed".into(),
            passed: lost.is_none(),
            detail: match lost {
                Some((tick, n)) => format!("{} agents at tick {}, expected {}", n, tick, population),
                None => format!("{} agents throughout", population),
            },
        },
        TestResult {
            name: "finite_state".into(),
            passed: non_finite.is_none(),
            detail: match non_finite {
                Some((tick, id)) => format!("agent {} non-finite at tick {}", id, tick),
                None => "all positions and velocities finite".into(),
            },
        },
    ];

    if let Some(frame) = last {
        println!("\nFinal occupancy: {}", occupancy(&frame));
        results.push(TestResult {
            name: "arrivals".into(),
            passed: true,
            detail: format!("{}/{} agents in their destination cell", frame.arrived(), population),
        });
    }

    Ok(results)
}

fn occupancy(frame: &Frame) -> String {
    frame
        .by_cell()
        .iter()
        .map(|(cell, agents)| format!("cell {}={}", cell, agents.len()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    println!("=== Crowdsim Headless Run ===\n");

    let results = match run(&args) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}
