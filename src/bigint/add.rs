use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::Error,
};

use super::{AssignedBigInt, BigIntConfig};
use crate::{
    arith::{Coeffs, Term},
    witness_gen::utils::{bool_to_field, field_to_biguint},
    LIMB_BITS,
};

impl BigIntConfig {
    /*
        one limb position of a carry (or borrow) chain, k = +1 for sums and
        -1 for differences:

          a_i   b_i   c_{i-1}   t     | a_i + k·b_i + k·c_{i-1} - t == 0
          c_i   t           s_i       | t - k·2^W · c_i - s_i == 0

        c_i boolean and s_i < 2^W; the returned carry is the final c_{L-1}
    */
    fn propagate<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &[AssignedCell<F, F>],
        b: &[AssignedCell<F, F>],
        k: F,
    ) -> Result<(Vec<AssignedCell<F, F>>, AssignedCell<F, F>), Error> {
        let arith = self.arith();
        let base = F::from_u128(1 << LIMB_BITS);
        let mut carry = arith.constant(layouter.namespace(|| "carry in"), F::ZERO)?;
        let mut out = Vec::with_capacity(a.len());

        for (i, (a, b)) in a.iter().zip(b).enumerate() {
            let mut layouter = layouter.namespace(|| format!("limb {}", i));
            let t = a.value().copied() + (b.value().copied() + carry.value().copied()) * Value::known(k);
            let [_, _, _, t] = arith.row(
                layouter.namespace(|| "t"),
                [a.into(), b.into(), (&carry).into(), Term::Unassigned(t)],
                Coeffs {
                    a: F::ONE,
                    b: k,
                    c: k,
                    d: -F::ONE,
                    ..Coeffs::default()
                },
            )?;

            // set exactly when t left [0, 2^W)
            let next_carry = t
                .value()
                .map(|t| bool_to_field::<F>(field_to_biguint(t).bits() > LIMB_BITS as u64));
            let s = t.value().copied() - next_carry * Value::known(k * base);
            let [next_carry, _, _, s] = arith.row(
                layouter.namespace(|| "s"),
                [Term::Unassigned(next_carry), (&t).into(), Term::zero(), Term::Unassigned(s)],
                Coeffs {
                    a: -k * base,
                    b: F::ONE,
                    d: -F::ONE,
                    ..Coeffs::default()
                },
            )?;
            arith.assert_bool(layouter.namespace(|| "carry is boolean"), &next_carry)?;
            self.bounded.check_limb(layouter.namespace(|| "s range"), &s)?;

            carry = next_carry;
            out.push(s);
        }
        Ok((out, carry))
    }

    /*
        |a| + |b| and ||a| - |b|| are both computed; which one is kept, and
        the sign, follow from

            is_sub       = sign_a xor sign_b
            this_smaller = |a| < |b|

            limbs = is_sub ? difference : sum
            sign  = (is_sub and this_smaller) ? sign_b : sign_a
    */
    pub fn add<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let arith = self.arith();
        let is_sub = arith.xor(layouter.namespace(|| "is sub"), &a.sign, &b.sign)?;
        let this_smaller = self
            .cmp_magnitude(layouter.namespace(|| "|a| < |b|"), a, b)?
            .lt;

        let (sum, sum_carry) =
            self.propagate(layouter.namespace(|| "|a| + |b|"), &a.limbs, &b.limbs, F::ONE)?;
        // the sum only has to fit when it is kept
        let is_add = arith.not(layouter.namespace(|| "is add"), &is_sub)?;
        arith.assert_zero_product(layouter.namespace(|| "no sum overflow"), &is_add, &sum_carry)?;

        let big = self.select_limbs(layouter.namespace(|| "big"), &this_smaller, &b.limbs, &a.limbs)?;
        let small = self.select_limbs(layouter.namespace(|| "small"), &this_smaller, &a.limbs, &b.limbs)?;
        let (difference, borrow) =
            self.propagate(layouter.namespace(|| "big - small"), &big, &small, -F::ONE)?;
        arith.assert_zero(layouter.namespace(|| "no borrow"), &borrow)?;

        let limbs = self.select_limbs(layouter.namespace(|| "limbs"), &is_sub, &difference, &sum)?;
        let flip = arith.and(layouter.namespace(|| "flip sign"), &is_sub, &this_smaller)?;
        let sign = arith.select(layouter.namespace(|| "sign"), &flip, &b.sign, &a.sign)?;

        Ok(AssignedBigInt::new(sign, limbs))
    }

    /// `a + (-b)`
    pub fn sub<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
        b: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let neg_b = self.neg(layouter.namespace(|| "-b"), b)?;
        self.add(layouter.namespace(|| "a + (-b)"), a, &neg_b)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{random_bigint, TestConfig};
    use super::*;
    use crate::witness_gen::limbs::SignedLimbInt;
    use halo2_proofs::{
        circuit::SimpleFloorPlanner,
        dev::MockProver,
        plonk::{Circuit, ConstraintSystem},
    };
    use ff::Field;
    use halo2curves::bn256::Fr;
    use num_bigint::{BigInt, Sign};
    use num_traits::{One, Zero};

    const L: usize = crate::NUM_LIMBS;

    #[derive(Clone, Default)]
    struct AddCircuit {
        a: Value<SignedLimbInt<L>>,
        b: Value<SignedLimbInt<L>>,
    }

    // public: [a + b | (a + b) - b | a + (-a)]
    impl Circuit<Fr> for AddCircuit {
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

            let sum = chip.add(layouter.namespace(|| "a + b"), &a, &b)?;
            let back = chip.sub(layouter.namespace(|| "(a + b) - b"), &sum, &b)?;
            chip.assert_equals(layouter.namespace(|| "(a + b) - b == a"), &back, &a)?;
            let neg_a = chip.neg(layouter.namespace(|| "-a"), &a)?;
            let zero = chip.add(layouter.namespace(|| "a + (-a)"), &a, &neg_a)?;
            let is_zero = chip.is_zero(layouter.namespace(|| "a + (-a) == 0"), &zero)?;
            chip.arith()
                .assert_constant(layouter.namespace(|| "is zero"), &is_zero, Fr::ONE)?;

            let row = config.expose(&mut layouter, sum.cells(), 0)?;
            let row = config.expose(&mut layouter, back.cells(), row)?;
            config.expose(&mut layouter, zero.limbs(), row)?;
            Ok(())
        }
    }

    // public: a + b
    #[derive(Clone, Default)]
    struct SumCircuit {
        a: Value<SignedLimbInt<L>>,
        b: Value<SignedLimbInt<L>>,
    }

    impl Circuit<Fr> for SumCircuit {
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
            let sum = chip.add(layouter.namespace(|| "a + b"), &a, &b)?;
            config.expose(&mut layouter, sum.cells(), 0)?;
            Ok(())
        }
    }

    // `a` must be non-zero: a zero result of `sub` may carry either sign
    fn check(a: &BigInt, b: &BigInt) {
        let limbs = |x: &BigInt| SignedLimbInt::<L>::from_bigint(x).unwrap();
        let circuit = AddCircuit {
            a: Value::known(limbs(a)),
            b: Value::known(limbs(b)),
        };

        let mut instance = limbs(&(a + b)).to_fields::<Fr>();
        if (a + b).is_zero() {
            // magnitudes tie, so a's sign bit is kept
            instance[0] = bool_to_field(a.sign() == Sign::Minus);
        }
        instance.extend(limbs(a).to_fields::<Fr>());
        instance.extend(vec![Fr::ZERO; L]);

        let prover = MockProver::run(12, &circuit, vec![instance]).unwrap();
        assert_eq!(prover.verify(), Ok(()));
    }

    #[test]
    fn test_add_sub() {
        let max = (BigInt::one() << (L * LIMB_BITS)) - 1;
        check(&BigInt::from(5), &BigInt::from(-7));
        check(&BigInt::from(-5), &BigInt::from(7));
        check(&max, &-max.clone());
        for _ in 0..2 {
            check(&random_bigint(2087), &random_bigint(2087));
        }
        check(&random_bigint(300), &random_bigint(2000));
    }

    #[test]
    fn test_sum_overflow_rejected() {
        let max = (BigInt::one() << (L * LIMB_BITS)) - 1;
        let limbs = |x: &BigInt| SignedLimbInt::<L>::from_bigint(x).unwrap();
        let run = |a: &BigInt, b: &BigInt, sum: Vec<Fr>| {
            let circuit = SumCircuit {
                a: Value::known(limbs(a)),
                b: Value::known(limbs(b)),
            };
            MockProver::run(12, &circuit, vec![sum]).unwrap().verify()
        };

        let below = &max - 1;
        assert_eq!(run(&below, &BigInt::one(), limbs(&max).to_fields()), Ok(()));
        assert_eq!(run(&-&below, &-BigInt::one(), limbs(&-&max).to_fields()), Ok(()));

        // the carry out of the top limb is dropped, leaving every limb zero
        let wrapped = vec![Fr::ZERO; L + 1];
        assert!(run(&max, &BigInt::one(), wrapped.clone()).is_err());
        let mut wrapped_negative = wrapped;
        wrapped_negative[0] = Fr::ONE;
        assert!(run(&-&max, &-BigInt::one(), wrapped_negative).is_err());
    }
}
