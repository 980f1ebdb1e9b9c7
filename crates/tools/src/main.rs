use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use martian_core::{EngineConfig, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs the simulation headless and reports the outcome.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Turns to simulate with an idle player
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,
    /// TOML file overriding gameplay constants
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Resume from a save file instead of starting a new game
    #[arg(long)]
    load: Option<PathBuf>,
    /// Write the final state to this save file
    #[arg(long, conflicts_with = "save_default")]
    save: Option<PathBuf>,
    /// Write the final state to the per-user data directory
    #[arg(long)]
    save_default: bool,
    /// Print the final map as ASCII
    #[arg(long)]
    show: bool,
    /// Print the final render snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn default_save_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "Martian").map(|proj_dirs| {
        let mut path = proj_dirs.data_dir().to_path_buf();
        path.push("simulate_save.json");
        path
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut world = match &args.load {
        Some(path) => World::load(path)
            .with_context(|| format!("Failed to load save file: {}", path.display()))?,
        None => {
            let config = match &args.config {
                Some(path) => EngineConfig::load(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
                None => EngineConfig::default(),
            };
            World::new(config, args.seed)
        }
    };
    info!(seed = world.seed, ticks = args.ticks, "simulation starting");

    let result = world.run(args.ticks);
    let snapshot = world.snapshot();

    if args.show {
        print!("{}", snapshot.to_ascii());
    }
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?
        );
    }

    println!("Simulation complete.");
    println!("Turns: {}", result.simulated_turns);
    println!("Stop reason: {:?}", result.stop_reason);
    println!("Depth: {}", snapshot.status.depth);
    println!("HP: {}/{}", snapshot.status.hp, snapshot.status.max_hp);
    println!("Snapshot Hash: {:016x}", world.snapshot_hash());

    let save_path = if args.save_default { default_save_path() } else { args.save.clone() };
    if let Some(path) = save_path {
        world
            .save(&path)
            .with_context(|| format!("Failed to write save file: {}", path.display()))?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
