use anyhow::Result;
use clap::Args as ClapArgs;
use rand::{Rng, SeedableRng};

use tessera::ring::PolynomialRing;

#[derive(ClapArgs)]
pub struct Args {
    /// Number of random round-trip trials to run.
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// RNG seed, for reproducible trials.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

pub fn execute(args: Args) -> Result<()> {
    let ring = PolynomialRing::default_params();
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);

    println!("Trial  Input poly[:4]            Recovered poly[:4]        Result");
    let mut all_ok = true;
    for trial in 1..=args.count {
        let input: Vec<i64> = (0..ring.n()).map(|_| rng.gen_range(0..ring.q())).collect();
        let ok = ring.verify_round_trip(&input)?;
        all_ok &= ok;
        let recovered = ring.inv_ntt(&ring.ntt(&input)?)?;
        println!(
            "{trial:<6} {:<25?} {:<25?} {}",
            &input[..4],
            &recovered[..4],
            if ok { "PASS" } else { "FAIL" }
        );
    }

    if all_ok {
        println!("\nAll {} NTT round-trip trials passed.", args.count);
    } else {
        println!("\n{} of {} trials failed.", args.count, args.count);
        anyhow::bail!("round-trip verification failed");
    }
    Ok(())
}
