use std::time::Instant;

use halo2_gcd::{ChainKeys, Error, ReductionPair, CIRCUIT_K, NUM_LIMBS, STEPS_PER_PROOF};
use log::info;
use num_bigint::BigInt;
use num_traits::One;

fn run() -> Result<(), Error> {
    // consecutive fibonacci numbers scaled by 2^2000: 23 reductions
    let scale = BigInt::one() << 2000;
    let input = ReductionPair::from_bigints(
        &(BigInt::from(75025) * &scale),
        &(BigInt::from(46368) * &scale),
    )?;

    let cache = std::env::temp_dir().join(format!("halo2-gcd-k{}.params", CIRCUIT_K));
    let start = Instant::now();
    let keys = ChainKeys::<NUM_LIMBS, STEPS_PER_PROOF>::setup(CIRCUIT_K, &cache, false)?;
    info!("setup took {:?}", start.elapsed());

    let start = Instant::now();
    let attestation = keys.solve(&input)?;
    info!("proving took {:?}", start.elapsed());

    keys.verify(&attestation)?;
    println!("gcd = {}", attestation.output().g0);
    println!("proofs = {}", attestation.links().len());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
