use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter},
    plonk::Error,
};

use super::{AssignedBigInt, BigIntConfig};
use crate::{
    arith::{Coeffs, Term},
    witness_gen::utils::field_to_biguint,
    LIMB_BITS,
};

/// Three boolean cells, exactly one of which is set.
#[derive(Clone, Debug)]
pub struct AssignedOrdering<F: PrimeField> {
    pub lt: AssignedCell<F, F>,
    pub eq: AssignedCell<F, F>,
    pub gt: AssignedCell<F, F>,
}

impl BigIntConfig {
    /*
        a     b     lt    shifted   | a - b + 2^W · lt - shifted == 0
        lt boolean, shifted < 2^W

        for limbs a, b < 2^W this forces lt = (a < b), and shifted is zero
        exactly when a == b
    */
    fn cmp_limb<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<(AssignedCell<F, F>, AssignedCell<F, F>), Error> {
        let arith = self.arith();
        let base = F::from_u128(1 << LIMB_BITS);
        let lt = a
            .value()
            .zip(b.value())
            .map(|(a, b)| field_to_biguint(a) < field_to_biguint(b));
        let shifted = a.value().copied() - b.value().copied()
            + lt.map(|lt| if lt { base } else { F::ZERO });

        let [_, _, lt, shifted] = arith.row(
            layouter.namespace(|| "a - b + 2^W lt"),
            [
                a.into(),
                b.into(),
                Term::Unassigned(lt.map(|lt| if lt { F::ONE } else { F::ZERO })),
                Term::Unassigned(shifted),
            ],
            Coeffs {
                a: F::ONE,
                b: -F::ONE,
                c: base,
                d: -F::ONE,
                ..Coeffs::default()
            },
        )?;
        arith.assert_bool(layouter.namespace(|| "lt is boolean"), &lt)?;
        self.bounded
            .check_limb(layouter.namespace(|| "shifted range"), &shifted)?;
        let eq = arith.is_zero(layouter.namespace(|| "a == b"), &shifted)?;
        Ok((lt, eq))
    }

    /// Compares magnitudes only, scanning from the most significant limb;
    /// the first differing limb decides.
    pub fn cmp_magnitude<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedOrdering<F>, Error> {
        let arith = self.arith();
        let mut lt = arith.constant(layouter.namespace(|| "lt"), F::ZERO)?;
        let mut gt = arith.constant(layouter.namespace(|| "gt"), F::ZERO)?;

        for (i, (a, b)) in a.limbs.iter().zip(&b.limbs).enumerate().rev() {
            let mut layouter = layouter.namespace(|| format!("limb {}", i));
            let (limb_lt, limb_eq) = self.cmp_limb(layouter.namespace(|| "cmp"), a, b)?;
            let limb_gt = arith.linear(
                layouter.namespace(|| "gt"),
                (&limb_lt, -F::ONE),
                (&limb_eq, -F::ONE),
                F::ONE,
            )?;

            // state only moves while still undecided
            let undecided = arith.linear(
                layouter.namespace(|| "undecided"),
                (&lt, -F::ONE),
                (&gt, -F::ONE),
                F::ONE,
            )?;
            lt = arith.mul_add(layouter.namespace(|| "lt"), &undecided, &limb_lt, &lt, F::ONE)?;
            gt = arith.mul_add(layouter.namespace(|| "gt"), &undecided, &limb_gt, &gt, F::ONE)?;
        }

        let eq = arith.linear(layouter.namespace(|| "eq"), (&lt, -F::ONE), (&gt, -F::ONE), F::ONE)?;
        Ok(AssignedOrdering { lt, eq, gt })
    }

    /// Signed three-way comparison. A value whose limbs are all zero counts
    /// as non-negative whatever its sign bit.
    pub fn cmp<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedOrdering<F>, Error> {
        let arith = self.arith();
        let a_neg = self.is_negative(layouter.namespace(|| "a < 0"), a)?;
        let b_neg = self.is_negative(layouter.namespace(|| "b < 0"), b)?;
        let magnitude = self.cmp_magnitude(layouter.namespace(|| "|a| vs |b|"), a, b)?;

        let zero = arith.constant(layouter.namespace(|| "zero"), F::ZERO)?;
        let one = arith.constant(layouter.namespace(|| "one"), F::ONE)?;

        // both negative: magnitudes order the other way round
        let lt_if_a_neg = arith.select(layouter.namespace(|| "lt | a < 0"), &b_neg, &magnitude.gt, &one)?;
        let lt_if_a_pos = arith.select(layouter.namespace(|| "lt | a >= 0"), &b_neg, &zero, &magnitude.lt)?;
        let lt = arith.select(layouter.namespace(|| "lt"), &a_neg, &lt_if_a_neg, &lt_if_a_pos)?;

        let gt_if_a_neg = arith.select(layouter.namespace(|| "gt | a < 0"), &b_neg, &magnitude.lt, &zero)?;
        let gt_if_a_pos = arith.select(layouter.namespace(|| "gt | a >= 0"), &b_neg, &one, &magnitude.gt)?;
        let gt = arith.select(layouter.namespace(|| "gt"), &a_neg, &gt_if_a_neg, &gt_if_a_pos)?;

        let eq = arith.linear(layouter.namespace(|| "eq"), (&lt, -F::ONE), (&gt, -F::ONE), F::ONE)?;
        Ok(AssignedOrdering { lt, eq, gt })
    }

    /// Sign bit set and at least one limb non-zero.
    pub(crate) fn is_negative<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let zero = self.is_zero(layouter.namespace(|| "a == 0"), a)?;
        let nonzero = self.arith().not(layouter.namespace(|| "a != 0"), &zero)?;
        self.arith()
            .and(layouter.namespace(|| "sign and nonzero"), &a.sign, &nonzero)
    }

    /// Equal limbs, and equal signs unless both are zero.
    pub fn equals<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let arith = self.arith();
        let mut limbs_eq = arith.constant(layouter.namespace(|| "limbs eq"), F::ONE)?;
        for (i, (a, b)) in a.limbs.iter().zip(&b.limbs).enumerate() {
            let mut layouter = layouter.namespace(|| format!("limb {}", i));
            let diff = arith.sub(layouter.namespace(|| "a - b"), a, b)?;
            let eq = arith.is_zero(layouter.namespace(|| "a == b"), &diff)?;
            limbs_eq = arith.and(layouter.namespace(|| "all eq"), &limbs_eq, &eq)?;
        }

        let sign_ne = arith.xor(layouter.namespace(|| "signs differ"), &a.sign, &b.sign)?;
        let sign_eq = arith.not(layouter.namespace(|| "signs match"), &sign_ne)?;
        let a_zero = self.is_zero(layouter.namespace(|| "a == 0"), a)?;
        let sign_ok = arith.or(layouter.namespace(|| "sign ok"), &sign_eq, &a_zero)?;
        arith.and(layouter.namespace(|| "equal"), &limbs_eq, &sign_ok)
    }

    pub fn assert_equals<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<(), Error> {
        a.value().zip(b.value()).map(|(a, b)| {
            if a != b {
                log::error!("asserting {} == {}", a, b);
            }
        });
        let eq = self.equals(layouter.namespace(|| "a == b"), a, b)?;
        self.arith()
            .assert_constant(layouter.namespace(|| "assert equal"), &eq, F::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{random_bigint, TestConfig};
    use super::*;
    use crate::witness_gen::{limbs::SignedLimbInt, utils::bool_to_field};
    use halo2_proofs::{
        circuit::{SimpleFloorPlanner, Value},
        dev::MockProver,
        plonk::{Circuit, ConstraintSystem},
    };
    use halo2curves::bn256::Fr;
    use num_bigint::BigInt;
    use std::cmp::Ordering;

    const L: usize = 4;

    #[derive(Clone, Default)]
    struct CmpCircuit {
        a: Value<SignedLimbInt<L>>,
        b: Value<SignedLimbInt<L>>,
    }

    // public: [cmp(a, b) | cmp(|a|, |b|) | a == b], orderings as lt, eq, gt
    impl Circuit<Fr> for CmpCircuit {
        type Config = TestConfig;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self::default()
        }

        fn configure(meta: &mut ConstraintSystem<Fr>) -> Self::Config {
            TestConfig::configure(meta)
        }

        fn synthesize(
            &self,
            config: Self::Config,
            mut layouter: impl Layouter<Fr>,
        ) -> Result<(), Error> {
            let chip = &config.bigint;
            chip.bounded.range.load(layouter.namespace(|| "table"))?;
            let a = chip.assign(layouter.namespace(|| "a"), self.a)?;
            let b = chip.assign(layouter.namespace(|| "b"), self.b)?;

            let signed = chip.cmp(layouter.namespace(|| "a vs b"), &a, &b)?;
            let magnitude = chip.cmp_magnitude(layouter.namespace(|| "|a| vs |b|"), &a, &b)?;
            let equal = chip.equals(layouter.namespace(|| "a == b"), &a, &b)?;

            let cells = [
                &signed.lt,
                &signed.eq,
                &signed.gt,
                &magnitude.lt,
                &magnitude.eq,
                &magnitude.gt,
                &equal,
            ];
            config.expose(&mut layouter, cells, 0)?;
            Ok(())
        }
    }

    fn ordering(ordering: Ordering) -> [Fr; 3] {
        [
            bool_to_field(ordering == Ordering::Less),
            bool_to_field(ordering == Ordering::Equal),
            bool_to_field(ordering == Ordering::Greater),
        ]
    }

    fn verify(a: SignedLimbInt<L>, b: SignedLimbInt<L>) -> bool {
        let (x, y) = (a.to_bigint(), b.to_bigint());
        let mut public = ordering(x.cmp(&y)).to_vec();
        public.extend(ordering(x.magnitude().cmp(y.magnitude())));
        public.push(bool_to_field(x == y));

        let circuit = CmpCircuit {
            a: Value::known(a),
            b: Value::known(b),
        };
        MockProver::run(10, &circuit, vec![public])
            .unwrap()
            .verify()
            .is_ok()
    }

    fn limbs(x: &BigInt) -> SignedLimbInt<L> {
        SignedLimbInt::from_bigint(x).unwrap()
    }

    #[test]
    fn test_cmp_against_native() {
        for (a, b) in [(5, 7), (-5, 7), (5, -7), (-5, -7), (-7, -5), (7, 7), (-7, -7), (7, -7), (0, 3), (0, -3)] {
            assert!(verify(limbs(&a.into()), limbs(&b.into())), "{} vs {}", a, b);
        }
        for bits in [64, 116, 117, 464] {
            let (a, b) = (random_bigint(bits), random_bigint(bits));
            assert!(verify(limbs(&a), limbs(&b)), "{} vs {}", a, b);
            assert!(verify(limbs(&a), limbs(&a)));
            assert!(verify(limbs(&a), -limbs(&a)));
        }

        // differ only below the top limb
        let high = BigInt::from(1) << 300;
        assert!(verify(limbs(&(&high + 1)), limbs(&(&high + 2))));
    }

    #[test]
    fn test_zeros_compare_equal() {
        let zero = SignedLimbInt::<L>::ZERO;
        assert!(verify(zero, -zero));
        assert!(verify(-zero, zero));
        assert!(verify(-zero, limbs(&BigInt::from(-1))));
        assert!(verify(-zero, limbs(&BigInt::from(1))));
    }

    #[test]
    fn test_wrong_ordering_rejected() {
        let circuit = CmpCircuit {
            a: Value::known(limbs(&BigInt::from(-5))),
            b: Value::known(limbs(&BigInt::from(3))),
        };
        // claims -5 > 3
        let mut public = ordering(Ordering::Greater).to_vec();
        public.extend(ordering(Ordering::Greater));
        public.push(bool_to_field(false));
        let prover = MockProver::run(10, &circuit, vec![public]).unwrap();
        assert!(prover.verify().is_err());
    }
}
