//! Signed big integers as a sign cell plus `L` little-endian limb cells of
//! `LIMB_BITS` bits each.
//!
//! Every limb that enters through `assign`/`witness` is range checked; results
//! of arithmetic are built from checked pieces so the bound holds
//! structurally. Any operation whose result depends on the operands' values
//! computes every outcome and picks one with `select`.

mod add;
mod compare;
mod div;
mod mul;

pub use compare::AssignedOrdering;
pub use div::Rounding;

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::Error,
};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::{
    arith::ArithConfig,
    bounded::BoundedConfig,
    witness_gen::{
        limbs::SignedLimbInt,
        utils::{bool_to_field, field_to_biguint},
    },
    LIMB_BITS,
};

#[derive(Clone, Debug)]
pub struct AssignedBigInt<F: PrimeField, const L: usize> {
    sign: AssignedCell<F, F>,
    limbs: Vec<AssignedCell<F, F>>,
}

impl<F: PrimeField, const L: usize> AssignedBigInt<F, L> {
    fn new(sign: AssignedCell<F, F>, limbs: Vec<AssignedCell<F, F>>) -> Self {
        debug_assert_eq!(limbs.len(), L);
        Self { sign, limbs }
    }

    pub fn sign(&self) -> &AssignedCell<F, F> {
        &self.sign
    }

    pub fn limbs(&self) -> &[AssignedCell<F, F>] {
        &self.limbs
    }

    /// Sign cell followed by the limbs, the public-input layout.
    pub fn cells(&self) -> impl Iterator<Item = &AssignedCell<F, F>> {
        std::iter::once(&self.sign).chain(self.limbs.iter())
    }

    pub fn magnitude(&self) -> Value<BigUint> {
        self.limbs
            .iter()
            .rev()
            .fold(Value::known(BigUint::zero()), |acc, limb| {
                acc.zip(limb.value())
                    .map(|(acc, limb)| (acc << LIMB_BITS) + field_to_biguint(limb))
            })
    }

    /// The integer the cells currently hold.
    pub fn value(&self) -> Value<BigInt> {
        self.sign
            .value()
            .zip(self.magnitude())
            .map(|(sign, magnitude)| {
                let sign = if *sign == F::ONE {
                    Sign::Minus
                } else {
                    Sign::Plus
                };
                BigInt::from_biguint(sign, magnitude)
            })
    }
}

#[derive(Clone, Debug)]
pub struct BigIntConfig {
    pub bounded: BoundedConfig,
}

impl BigIntConfig {
    pub fn new(bounded: BoundedConfig) -> Self {
        Self { bounded }
    }

    pub(crate) fn arith(&self) -> &ArithConfig {
        &self.bounded.arith
    }

    /// Assigns a native value, proving the sign is boolean and every limb is
    /// in range.
    pub fn assign<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        value: Value<SignedLimbInt<L>>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let sign = self
            .arith()
            .witness_bool(layouter.namespace(|| "sign"), value.map(|v| v.sign()))?;
        let limbs = self.assign_limbs(layouter.namespace(|| "limbs"), value)?;
        Ok(AssignedBigInt::new(sign, limbs))
    }

    fn assign_limbs<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        value: Value<SignedLimbInt<L>>,
    ) -> Result<Vec<AssignedCell<F, F>>, Error> {
        (0..L)
            .map(|i| {
                self.bounded.witness_limb(
                    layouter.namespace(|| format!("limb {}", i)),
                    value.map(|v| F::from_u128(v.limbs()[i])),
                )
            })
            .collect()
    }

    /// Assigns an oracle value. Values that do not fit are truncated, which
    /// leaves whatever identity they were meant to satisfy unsatisfied.
    pub fn witness<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        value: Value<BigInt>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        self.assign(
            layouter,
            value.map(|v| SignedLimbInt::from_bigint_truncated(&v)),
        )
    }

    /// Non-negative oracle value with a constant zero sign.
    pub(crate) fn witness_magnitude<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        value: Value<BigUint>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let value = value.map(|v| SignedLimbInt::<L>::from_bigint_truncated(&BigInt::from(v)));
        let sign = self.arith().constant(layouter.namespace(|| "sign"), F::ZERO)?;
        let limbs = self.assign_limbs(layouter.namespace(|| "limbs"), value)?;
        Ok(AssignedBigInt::new(sign, limbs))
    }

    pub fn constant<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        value: &SignedLimbInt<L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let sign = self
            .arith()
            .constant(layouter.namespace(|| "sign"), bool_to_field(value.sign()))?;
        let limbs = value
            .limbs()
            .iter()
            .map(|&limb| {
                self.arith()
                    .constant(layouter.namespace(|| "limb"), F::from_u128(limb))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AssignedBigInt::new(sign, limbs))
    }

    /// Flips the sign bit, so `-0` keeps its limbs and becomes the other zero.
    pub fn neg<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let sign = self.arith().not(layouter, &a.sign)?;
        Ok(AssignedBigInt::new(sign, a.limbs.clone()))
    }

    /// `cond ? a : b` over the sign and every limb; `cond` must be boolean.
    pub fn select<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        cond: &AssignedCell<F, F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let sign = self
            .arith()
            .select(layouter.namespace(|| "sign"), cond, &a.sign, &b.sign)?;
        let limbs = self.select_limbs(layouter.namespace(|| "limbs"), cond, &a.limbs, &b.limbs)?;
        Ok(AssignedBigInt::new(sign, limbs))
    }

    pub(crate) fn select_limbs<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        cond: &AssignedCell<F, F>,
        a: &[AssignedCell<F, F>],
        b: &[AssignedCell<F, F>],
    ) -> Result<Vec<AssignedCell<F, F>>, Error> {
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(i, (a, b))| {
                self.arith()
                    .select(layouter.namespace(|| format!("limb {}", i)), cond, a, b)
            })
            .collect()
    }

    /// One when every limb is zero, whatever the sign bit.
    ///
    /// Limbs are below `2^LIMB_BITS`, so their sum cannot wrap and is zero
    /// exactly when each limb is.
    pub fn is_zero<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let (first, rest) = a.limbs.split_first().ok_or(Error::Synthesis)?;
        let mut sum = first.clone();
        for limb in rest {
            sum = self
                .arith()
                .add(layouter.namespace(|| "sum limbs"), &sum, limb)?;
        }
        self.arith().is_zero(layouter.namespace(|| "sum == 0"), &sum)
    }
}
