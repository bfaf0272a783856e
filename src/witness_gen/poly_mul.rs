/*
    [a0, a1, a2] * [b0, b1, b2]

        a0b0  a0b1  a0b2
        a1b0  a1b1  a1b2
        a2b0  a2b1  a2b2

    coefficient k of the product is the sum along the anti-diagonal i + j = k
*/

use num_bigint::BigInt;
use num_traits::Zero;

/// Index pairs `(i, j)` with `i + j = k`, for two operands of `len` limbs.
pub fn diagonal(k: usize, len: usize) -> impl Iterator<Item = (usize, usize)> {
    let start = (k + 1).saturating_sub(len);
    let end = k.min(len - 1);
    (start..=end).map(move |i| (i, k - i))
}

pub fn poly_mul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    debug_assert_eq!(a.len(), b.len());
    let len = a.len();
    (0..2 * len - 1)
        .map(|k| diagonal(k, len).map(|(i, j)| &a[i] * &b[j]).sum())
        .collect()
}

/// Carries of `delta` read as a base `2^bits` number, or `None` when it is
/// not the integer zero.
pub fn carry_to_zero(delta: &[BigInt], bits: usize) -> Option<Vec<BigInt>> {
    let mut carry = BigInt::zero();
    let mut carries = Vec::with_capacity(delta.len());
    for coeff in delta {
        let sum = coeff + &carry;
        if (&sum >> bits) << bits != sum {
            return None;
        }
        carry = sum >> bits;
        carries.push(carry.clone());
    }
    carry.is_zero().then_some(carries)
}
