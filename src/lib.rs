/*
    euclidean gcd over signed big integers, proven in chunks

    a reduction pair (g0, g1) is walked by

        (g0, g1) -> (g1, g0 mod g1)     while g1 != 0

    each proof performs STEPS_PER_PROOF of these steps on 2088-bit values
    (18 limbs of 116 bits plus a sign bit) and exposes [input | output] as
    public inputs. proofs after the first additionally expose the output of
    the proof they continue, and the chain layer checks that it equals their
    input before producing the next link.

    layering, bottom to top:

        arith        one standard plonk gate, every native operation
        range_check  64-bit lookups over 8-bit chunks
        bounded      limb (116-bit) and signed carry (128-bit) range checks
        bigint       signed limb integers: add, sub, cmp, mul, div, mod
        gcd          reduction pair, one euclid step, the step loop
        circuit      base and step relations
        chain        keys, proving, verifying and the attestation chain
*/

pub mod arith;
pub mod bigint;
pub mod bounded;
pub mod chain;
pub mod circuit;
mod error;
pub mod gcd;
pub mod range_check;
pub mod witness_gen;

pub use chain::{Attestation, ChainKeys};
pub use circuit::{BaseCaseCircuit, StepCaseCircuit};
pub use error::Error;
pub use witness_gen::limbs::{ReductionPair, SignedLimbInt};

/// Width of one limb.
pub const LIMB_BITS: usize = 116;

/// Limbs per big integer, so values have 2088-bit magnitudes.
pub const NUM_LIMBS: usize = 18;

/// Euclid steps performed inside a single proof.
pub const STEPS_PER_PROOF: usize = 9;

/// Circuit size for the full-width relations, `2^CIRCUIT_K` rows.
pub const CIRCUIT_K: u32 = 15;
