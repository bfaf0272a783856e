use ff::PrimeField;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;

/// Horner over 64-bit digits, most significant first.
pub fn biguint_to_field<F: PrimeField>(x: &BigUint) -> F {
    let base = F::from_u128(1u128 << 64);
    x.to_u64_digits()
        .iter()
        .rev()
        .fold(F::ZERO, |acc, &digit| acc * base + F::from(digit))
}

/// Negative values map to `p - |x|`.
pub fn bigint_to_field<F: PrimeField>(x: &BigInt) -> F {
    let magnitude = biguint_to_field::<F>(x.magnitude());
    match x.sign() {
        Sign::Minus => -magnitude,
        _ => magnitude,
    }
}

// assumes a little-endian repr, which holds for the bn256 and pasta scalars
pub fn field_to_biguint<F: PrimeField>(x: &F) -> BigUint {
    let repr = x.to_repr();
    BigUint::from_bytes_le(repr.as_ref())
}

/// Reads `x` as a signed integer in `(-p/2, p/2]`.
pub fn field_to_bigint<F: PrimeField>(x: &F) -> BigInt {
    let modulus = modulus::<F>();
    let value = field_to_biguint(x);
    if value.clone() << 1 > modulus {
        BigInt::from_biguint(Sign::Minus, modulus - value)
    } else {
        BigInt::from_biguint(Sign::Plus, value)
    }
}

pub fn modulus<F: PrimeField>() -> BigUint {
    field_to_biguint(&-F::ONE) + BigUint::one()
}

pub fn bool_to_field<F: PrimeField>(b: bool) -> F {
    if b {
        F::ONE
    } else {
        F::ZERO
    }
}

/// Bits `[offset, offset + width)` of `x`, as a field element.
pub fn bit_slice<F: PrimeField>(x: &BigUint, offset: usize, width: usize) -> F {
    let mask = (BigUint::one() << width) - BigUint::one();
    biguint_to_field(&((x >> offset) & mask))
}
