use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::Error,
};

use crate::{
    arith::{ArithConfig, Coeffs, Term},
    range_check::{RangeCheckConfig, RANGE_BITS},
    witness_gen::utils::{bit_slice, field_to_biguint},
    LIMB_BITS,
};

/// Width of the signed carry check, values in `[-2^127, 2^127)`.
pub const CARRY_BITS: usize = 128;

/// Range checks of arbitrary width up to 128 bits, composed from the 64-bit
/// lookup check.
#[derive(Clone, Debug)]
pub struct BoundedConfig {
    pub arith: ArithConfig,
    pub range: RangeCheckConfig,
}

impl BoundedConfig {
    pub fn new(arith: ArithConfig, range: RangeCheckConfig) -> Self {
        Self { arith, range }
    }

    /*
        bits <= 64:
            x < 2^64 and x · 2^(64 - bits) < 2^64

        64 < bits <= 128:
            x0    x1    x     | x0 + 2^64 · x1 - x == 0
            x0 < 2^64, x1 < 2^(bits - 64)
    */
    pub fn check_bits<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedCell<F, F>,
        bits: usize,
    ) -> Result<(), Error> {
        debug_assert!(bits > 0 && bits <= 2 * RANGE_BITS);

        if bits <= RANGE_BITS {
            self.range.check(layouter.namespace(|| "x < 2^64"), x)?;
            if bits < RANGE_BITS {
                let shift = F::from_u128(1 << (RANGE_BITS - bits));
                let shifted = self.arith.affine(
                    layouter.namespace(|| "shift top bits"),
                    x,
                    shift,
                    F::ZERO,
                )?;
                self.range.check(layouter.namespace(|| "top bits are zero"), &shifted)?;
            }
            return Ok(());
        }

        let value = x.value().map(field_to_biguint);
        let x0 = value.as_ref().map(|x| bit_slice::<F>(x, 0, RANGE_BITS));
        let x1 = value
            .as_ref()
            .map(|x| bit_slice::<F>(x, RANGE_BITS, bits - RANGE_BITS));

        let [x0, x1, _, _] = self.arith.row(
            layouter.namespace(|| "x0 + 2^64 x1 = x"),
            [Term::Unassigned(x0), Term::Unassigned(x1), x.into(), Term::zero()],
            Coeffs {
                a: F::ONE,
                b: F::from_u128(1 << RANGE_BITS),
                c: -F::ONE,
                ..Coeffs::default()
            },
        )?;

        self.check_bits(layouter.namespace(|| "low half"), &x0, RANGE_BITS)?;
        self.check_bits(layouter.namespace(|| "high half"), &x1, bits - RANGE_BITS)
    }

    /// Proves `0 <= x < 2^116`.
    pub fn check_limb<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        x: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        self.check_bits(layouter, x, LIMB_BITS)
    }

    /// Proves `-2^127 <= x < 2^127`.
    pub fn check_signed<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        let bias = F::from_u128(1 << (CARRY_BITS - 1));
        let biased = self
            .arith
            .affine(layouter.namespace(|| "x + 2^127"), x, F::ONE, bias)?;
        self.check_bits(layouter.namespace(|| "biased carry"), &biased, CARRY_BITS)
    }

    /// Witnesses a limb and proves its bound.
    pub fn witness_limb<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        value: Value<F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let limb = self.arith.witness(layouter.namespace(|| "limb"), value)?;
        self.check_limb(layouter.namespace(|| "limb range"), &limb)?;
        Ok(limb)
    }
}
