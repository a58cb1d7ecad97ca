use anyhow::Result;
use clap::Args as ClapArgs;
use rand::SeedableRng;

use tessera::kem::LatticeKem;
use tessera::ring::PolynomialRing;

#[derive(ClapArgs)]
pub struct Args {
    /// Number of keygen/encaps/decaps trials to run.
    #[arg(long, default_value_t = 5)]
    pub trials: usize,

    /// RNG seed, for reproducible trials.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn execute(args: Args) -> Result<()> {
    let kem = LatticeKem::new(PolynomialRing::default_params());
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);

    println!("Trial  pk(bytes)  sk(bytes)  ct(bytes)  shared-secret[enc]  shared-secret[dec]  match");
    let mut all_ok = true;
    for trial in 1..=args.trials {
        let (pk, sk) = kem.keygen(&mut rng);
        let (ct, ss_enc) = kem.encaps(&pk, &mut rng);
        let ss_dec = kem.decaps(&sk, &ct);
        let matched = ss_enc == ss_dec;
        all_ok &= matched;
        println!(
            "{trial:<6} {:<10} {:<10} {:<10} {:<19} {:<19} {}",
            pk.a.len() + pk.b.len(),
            sk.s.len(),
            ct.u.len() + ct.v.len(),
            &ss_enc.to_hex()[..16],
            &ss_dec.to_hex()[..16],
            if matched { "yes" } else { "no" },
        );
    }

    if all_ok {
        println!("\nAll {} KEM trials: shared secrets match.", args.trials);
    } else {
        anyhow::bail!("KEM shared-secret mismatch in at least one trial");
    }
    Ok(())
}
