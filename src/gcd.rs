use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Column, ConstraintSystem, Error, Instance},
};

use crate::{
    arith::ArithConfig,
    bigint::{AssignedBigInt, BigIntConfig},
    bounded::BoundedConfig,
    range_check::{RangeCheckConfig, NUM_CHUNKS},
    witness_gen::limbs::{ReductionPair, SignedLimbInt},
};

/// Smallest field the limb layout is sound in: two limb products plus the
/// carries must not wrap.
pub const MIN_FIELD_BITS: u32 = 250;

#[derive(Clone, Debug)]
pub struct AssignedPair<F: PrimeField, const L: usize> {
    pub g0: AssignedBigInt<F, L>,
    pub g1: AssignedBigInt<F, L>,
}

impl<F: PrimeField, const L: usize> AssignedPair<F, L> {
    /// `g0` then `g1`, each as sign followed by limbs.
    pub fn cells(&self) -> impl Iterator<Item = &AssignedCell<F, F>> {
        self.g0.cells().chain(self.g1.cells())
    }
}

/*
    columns

        advice 0..4   arith a, b, c, d      (range check value in 0)
        advice 1..9   range check chunks
        fixed         arith coefficients, constants
        instance      [pairs...], each pair 2 · (L + 1) cells
*/
#[derive(Clone, Debug)]
pub struct GcdConfig {
    pub bigint: BigIntConfig,
    pub instance: Column<Instance>,
}

impl GcdConfig {
    pub fn configure<F: PrimeField>(meta: &mut ConstraintSystem<F>) -> Self {
        assert!(
            F::NUM_BITS >= MIN_FIELD_BITS,
            "a {}-bit field cannot hold limb products",
            F::NUM_BITS
        );

        let advice = [(); 1 + NUM_CHUNKS].map(|_| meta.advice_column());
        for column in advice {
            meta.enable_equality(column);
        }
        let constants = meta.fixed_column();
        meta.enable_constant(constants);
        let instance = meta.instance_column();
        meta.enable_equality(instance);

        let [value, chunks @ ..] = advice;
        let arith = ArithConfig::configure(meta, [advice[0], advice[1], advice[2], advice[3]]);
        let range = RangeCheckConfig::configure(meta, value, chunks);

        Self {
            bigint: BigIntConfig::new(BoundedConfig::new(arith, range)),
            instance,
        }
    }

    pub fn load_table<F: PrimeField>(&self, layouter: impl Layouter<F>) -> Result<(), Error> {
        self.bigint.bounded.range.load(layouter)
    }

    pub fn load_pair<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        pair: Value<ReductionPair<L>>,
    ) -> Result<AssignedPair<F, L>, Error> {
        Ok(AssignedPair {
            g0: self
                .bigint
                .assign(layouter.namespace(|| "g0"), pair.map(|p| p.g0))?,
            g1: self
                .bigint
                .assign(layouter.namespace(|| "g1"), pair.map(|p| p.g1))?,
        })
    }

    /// Constrains the pair to the instance column from `row` on and returns
    /// the row after it.
    pub fn expose<F: PrimeField, const L: usize>(
        &self,
        layouter: &mut impl Layouter<F>,
        pair: &AssignedPair<F, L>,
        row: usize,
    ) -> Result<usize, Error> {
        let mut row = row;
        for cell in pair.cells() {
            layouter.constrain_instance(cell.cell(), self.instance, row)?;
            row += 1;
        }
        Ok(row)
    }

    /// `g0 == g1 or g1 == 0`
    pub fn is_solved<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        pair: &AssignedPair<F, L>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let equal = self
            .bigint
            .equals(layouter.namespace(|| "g0 == g1"), &pair.g0, &pair.g1)?;
        let g1_zero = self
            .bigint
            .is_zero(layouter.namespace(|| "g1 == 0"), &pair.g1)?;
        self.bigint
            .arith()
            .or(layouter.namespace(|| "solved"), &equal, &g1_zero)
    }

    /*
        (g0, g1) -> (g1, g0 mod g1), or unchanged once g1 == 0

        the division always runs; a zero g1 is replaced by the divisor 1 and
        the remainder is then discarded
    */
    pub fn euclid_step<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        pair: &AssignedPair<F, L>,
    ) -> Result<AssignedPair<F, L>, Error> {
        let bigint = &self.bigint;
        let done = bigint.is_zero(layouter.namespace(|| "g1 == 0"), &pair.g1)?;
        let one = bigint.constant(layouter.namespace(|| "one"), &SignedLimbInt::<L>::from_u64(1))?;
        let divisor = bigint.select(layouter.namespace(|| "divisor"), &done, &one, &pair.g1)?;
        let r = bigint.modulo(layouter.namespace(|| "g0 mod g1"), &pair.g0, &divisor)?;

        Ok(AssignedPair {
            g0: bigint.select(layouter.namespace(|| "next g0"), &done, &pair.g0, &pair.g1)?,
            g1: bigint.select(layouter.namespace(|| "next g1"), &done, &pair.g1, &r)?,
        })
    }

    /// `steps` unrolled reductions; the result need not be solved.
    pub fn euclid_gcd<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        pair: &AssignedPair<F, L>,
        steps: usize,
    ) -> Result<AssignedPair<F, L>, Error> {
        let mut pair = pair.clone();
        for step in 0..steps {
            pair = self.euclid_step(layouter.namespace(|| format!("step {}", step)), &pair)?;
        }
        Ok(pair)
    }
}
