use clap::Parser;
use log::{error, info};
use server::config::ArenaConfig;
use server::engine::Engine;

/// Headless authoritative arena server.
///
/// Runs the simulation core until interrupted. A transport layer embeds the
/// same engine through its handle; this binary exists to run and observe
/// the simulation on its own.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Simulation ticks per second
    #[clap(short, long, default_value_t = shared::TICK_RATE)]
    tick_rate: u32,
    /// World edge length
    #[clap(short, long, default_value_t = shared::WORLD_SIZE)]
    world_size: f32,
    /// Number of AI-controlled players to keep alive
    #[clap(short = 'a', long, default_value_t = shared::NUM_AI_PLAYERS)]
    num_ai: usize,
    /// Number of food pellets to keep available
    #[clap(short = 'f', long, default_value_t = shared::NUM_FOOD)]
    num_food: usize,
    /// Maximum concurrent human players
    #[clap(short = 'p', long, default_value_t = shared::MAX_PLAYERS)]
    max_players: usize,
    /// RNG seed for a reproducible run
    #[clap(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = ArenaConfig {
        tick_rate: args.tick_rate,
        world_size: args.world_size,
        num_ai_players: args.num_ai,
        num_food: args.num_food,
        max_players: args.max_players,
        seed: args.seed,
        ..ArenaConfig::default()
    };

    let (engine, handle) = match Engine::new(config) {
        Ok(pair) => pair,
        Err(e) => {
            error!("refusing to start: {}", e);
            return Err(e.into());
        }
    };

    let simulation = tokio::spawn(engine.run());

    tokio::signal::ctrl_c().await?;
    info!("received ctrl-c, stopping simulation");
    handle.stop().await?;
    simulation.await?;

    Ok(())
}
