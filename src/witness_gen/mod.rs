//! Native side of every relation: limb encodings, field conversions and the
//! reference arithmetic the oracle phase uses to produce witnesses.

pub mod limbs;
pub mod poly_mul;
pub mod trace_gen;
pub mod utils;
