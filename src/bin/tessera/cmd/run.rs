use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use rand::SeedableRng;
use tracing::info;

use tessera::clock::SimClock;
use tessera::config::SimConfig;
use tessera::nvm::Nvm;
use tessera::power::PowerModel;
use tessera::ring::PolynomialRing;
use tessera::scheduler::IntermittentScheduler;

#[derive(ClapArgs)]
pub struct Args {
    /// Simulation duration, in simulated time units.
    #[arg(long, default_value_t = 1000.0)]
    pub duration: f64,

    /// Mean ON interval of the power source.
    #[arg(long, default_value_t = 120.0)]
    pub on_avg: f64,

    /// Mean OFF interval of the power source.
    #[arg(long, default_value_t = 40.0)]
    pub off_avg: f64,

    /// RNG seed, for reproducible runs.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Render a leakage-trace chart after the run.
    #[arg(long, default_value_t = false)]
    pub plot: bool,
}

pub fn execute(args: Args) -> Result<()> {
    let config = SimConfig {
        duration: args.duration,
        on_avg: args.on_avg,
        off_avg: args.off_avg,
        seed: args.seed,
        ..SimConfig::default()
    };

    println!("Initializing Tessera simulation (duration={})...", config.duration);

    let ring = PolynomialRing::default_params();
    let mut nvm = Nvm::new();
    let mut power = PowerModel::new(config.on_avg, config.off_avg);
    let mut clock = SimClock::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);

    let mut scheduler =
        IntermittentScheduler::with_costs(ring, &nvm, None, &mut rng, config.compute_cost, config.checkpoint_cost)
            .context("failed to start the scheduler from NVM state")?;

    let finished = scheduler.run_until(&mut nvm, &mut power, &mut clock, &mut rng, config.duration);

    info!(
        completed_layers = scheduler.completed_layers(),
        power_failures = scheduler.power_failures(),
        restores = scheduler.restores(),
        "simulation finished"
    );

    println!("Completed layers : {}", scheduler.completed_layers());
    println!("Power failures   : {}", scheduler.power_failures());
    println!("NVM restores     : {}", scheduler.restores());
    if let Some(stats) = nvm.stats() {
        println!("NVM leakage      : {stats}");
    }
    println!("Simulation {}.", if finished { "complete" } else { "ran out of time before finishing" });

    if args.plot {
        println!("(leakage chart rendering is not implemented in this build)");
    }

    Ok(())
}
