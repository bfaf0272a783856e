use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;

use super::limbs::{ReductionPair, SignedLimbInt};

/// Floor division: the remainder takes the divisor's sign.
/// A zero divisor yields `(0, x)`, which no division relation accepts.
pub fn floor_div_rem(x: &BigInt, y: &BigInt) -> (BigInt, BigInt) {
    if y.is_zero() {
        log::error!("floor division of {} by zero", x);
        return (BigInt::zero(), x.clone());
    }
    x.div_mod_floor(y)
}

/// Truncating division: the remainder takes the dividend's sign.
pub fn trunc_div_rem(x: &BigInt, y: &BigInt) -> (BigInt, BigInt) {
    if y.is_zero() {
        log::error!("truncating division of {} by zero", x);
        return (BigInt::zero(), x.clone());
    }
    x.div_rem(y)
}

/// One reduction `(g0, g1) -> (g1, g0 mod g1)`, a no-op once `g1` is zero.
///
/// Mirrors the circuit bit for bit: the unchanged pair keeps its sign bits,
/// and the new remainder is encoded canonically.
pub fn euclid_step<const L: usize>(pair: &ReductionPair<L>) -> ReductionPair<L> {
    if pair.g1.is_zero() {
        return *pair;
    }
    let (_, r) = floor_div_rem(&pair.g0.to_bigint(), &pair.g1.to_bigint());
    ReductionPair::new(pair.g1, SignedLimbInt::from_bigint_truncated(&r))
}

pub fn euclid<const L: usize>(pair: &ReductionPair<L>, steps: usize) -> ReductionPair<L> {
    (0..steps).fold(*pair, |pair, _| euclid_step(&pair))
}

/// Single reductions applied before `is_solved` holds.
pub fn steps_to_converge<const L: usize>(pair: &ReductionPair<L>) -> usize {
    let mut pair = *pair;
    let mut steps = 0;
    while !pair.is_solved() {
        pair = euclid_step(&pair);
        steps += 1;
    }
    steps
}

/// Proofs a chain needs: the base case always runs, then one step proof per
/// further `steps_per_proof` reductions.
pub fn proofs_needed<const L: usize>(pair: &ReductionPair<L>, steps_per_proof: usize) -> usize {
    Integer::div_ceil(&steps_to_converge(pair), &steps_per_proof).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn pair<const L: usize>(a: i64, b: i64) -> ReductionPair<L> {
        ReductionPair::from_bigints(&a.into(), &b.into()).unwrap()
    }

    #[test]
    fn test_division_conventions() {
        let cases = [(7, 2, 3, 1, 3, 1), (-7, 2, -4, 1, -3, -1), (7, -2, -4, -1, -3, 1), (-7, -2, 3, -1, 3, -1)];
        for (x, y, fq, fr, tq, tr) in cases {
            let (x, y) = (BigInt::from(x), BigInt::from(y));
            assert_eq!(floor_div_rem(&x, &y), (fq.into(), fr.into()));
            assert_eq!(trunc_div_rem(&x, &y), (tq.into(), tr.into()));
        }
    }

    #[test]
    fn test_euclid_48_18() {
        let start = pair::<4>(48, 18);
        assert_eq!(steps_to_converge(&start), 3);
        let end = euclid(&start, 9);
        assert_eq!(end.g0.to_bigint(), BigInt::from(6));
        assert!(end.g1.is_zero());
        assert_eq!(proofs_needed(&start, 9), 1);
    }

    #[test]
    fn test_euclid_with_zero() {
        let x = pair::<4>(35, 0);
        assert_eq!(euclid(&x, 9), x);
        assert_eq!(steps_to_converge(&x), 0);

        let end = euclid(&pair::<4>(0, 35), 9);
        assert_eq!(end.g0.to_bigint(), BigInt::from(35));
        assert!(end.is_solved());
    }

    #[test]
    fn test_noop_keeps_sign_bits() {
        let start = ReductionPair::<2>::new(SignedLimbInt::from_bigint(&5.into()).unwrap(), -SignedLimbInt::ZERO);
        let end = euclid_step(&start);
        assert!(end.g1.sign());
    }

    #[test]
    fn test_proofs_needed() {
        // consecutive Fibonacci numbers are the worst case
        let start = pair::<4>(832040, 514229);
        let steps = steps_to_converge(&start);
        assert_eq!(steps, 28);
        assert_eq!(proofs_needed(&start, 9), 4);
        assert_eq!(euclid(&start, steps).g0.to_bigint(), BigInt::one());
    }
}
