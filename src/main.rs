use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use emergency_traffic::simulation::{Rect, RoadGrid, SimConfig, SimWorld, VehicleClass};

/// Responder classes that can be dispatched from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Responder {
    Police,
    Fire,
    Ambulance,
}

impl From<Responder> for VehicleClass {
    fn from(responder: Responder) -> Self {
        match responder {
            Responder::Police => VehicleClass::Police,
            Responder::Fire => VehicleClass::Fire,
            Responder::Ambulance => VehicleClass::Ambulance,
        }
    }
}

#[derive(Parser)]
#[command(name = "emergency_traffic")]
#[command(about = "Headless emergency traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.0166667")]
    delta: f32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Width of the world
    #[arg(long, default_value = "1050")]
    width: f32,

    /// Height of the world
    #[arg(long, default_value = "700")]
    height: f32,

    /// Stop spawning civilians once this many vehicles are on the map
    #[arg(long, default_value = "35")]
    max_vehicles: usize,

    /// Responder to dispatch at the start of the run (repeatable)
    #[arg(long, value_enum)]
    dispatch: Vec<Responder>,

    /// Dispatch the matching responder whenever an incident starts
    #[arg(long)]
    auto_dispatch: bool,

    /// Seconds of simulated time between status lines
    #[arg(long, default_value = "10")]
    report_every: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!("Running emergency traffic simulation in headless mode...");
    info!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);

    let grid = RoadGrid::regular(Rect::new(0.0, 0.0, cli.width, cli.height))?;
    let config = SimConfig {
        max_vehicles: cli.max_vehicles,
        auto_dispatch: cli.auto_dispatch,
        ..SimConfig::default()
    };

    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(grid, config, seed),
        None => SimWorld::new(grid, config),
    };

    for responder in &cli.dispatch {
        // failures are logged and counted by the world
        let _ = world.dispatch((*responder).into());
    }

    // Calculate how many ticks equal one report interval
    let ticks_per_report = ((cli.report_every / cli.delta).ceil() as u32).max(1);

    world.log_status();
    for tick in 1..=cli.ticks {
        world.tick(cli.delta);
        if tick % ticks_per_report == 0 {
            world.log_status();
        }
    }

    world.log_summary();
    Ok(())
}
