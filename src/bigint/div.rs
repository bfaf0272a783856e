use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::Error,
};
use num_bigint::BigInt;
use num_traits::Zero;

use super::{mul::Product, AssignedBigInt, BigIntConfig};
use crate::witness_gen::{
    poly_mul::diagonal,
    trace_gen::{floor_div_rem, trunc_div_rem},
};

/// Which remainder a division produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// The remainder takes the divisor's sign.
    Floor,
    /// The remainder takes the dividend's sign.
    Trunc,
}

impl Rounding {
    fn div_rem(self, x: &BigInt, y: &BigInt) -> (BigInt, BigInt) {
        match self {
            Rounding::Floor => floor_div_rem(x, y),
            Rounding::Trunc => trunc_div_rem(x, y),
        }
    }
}

impl BigIntConfig {
    /// `1 - 2·sign`, the sign as a `±1` factor.
    fn sign_factor<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedBigInt<F, L>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.arith().affine(layouter, &a.sign, -F::from(2), F::ONE)
    }

    /*
        with σ_v = ±1 the sign factor of v, for every position k

            delta_k = σ_y σ_q Σ_{i+j=k} y_i q_j + σ_r r_k - σ_x x_k

        must carry to zero, i.e. y · q + r == x over the integers
    */
    fn check_division<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
        q: &AssignedBigInt<F, L>,
        r: Option<&AssignedBigInt<F, L>>,
    ) -> Result<(), Error> {
        let arith = self.arith();
        let sigma_x = self.sign_factor(layouter.namespace(|| "σ_x"), x)?;
        let sigma_y = self.sign_factor(layouter.namespace(|| "σ_y"), y)?;
        let sigma_q = self.sign_factor(layouter.namespace(|| "σ_q"), q)?;
        let sigma_yq = arith.mul(layouter.namespace(|| "σ_y σ_q"), &sigma_y, &sigma_q)?;
        let sigma_r = match r {
            Some(r) => Some(self.sign_factor(layouter.namespace(|| "σ_r"), r)?),
            None => None,
        };

        let mut delta = Vec::with_capacity(2 * L - 1);
        for k in 0..2 * L - 1 {
            let mut layouter = layouter.namespace(|| format!("delta {}", k));
            let products: Vec<Product<'_, F>> = diagonal(k, L)
                .map(|(i, j)| (&y.limbs[i], &q.limbs[j], F::ONE))
                .collect();
            let yq = self.accumulate(layouter.namespace(|| "Σ y_i q_j"), None, &products)?;
            let mut acc = arith.mul(layouter.namespace(|| "signed"), &sigma_yq, &yq)?;
            if k < L {
                if let (Some(r), Some(sigma_r)) = (r, sigma_r.as_ref()) {
                    acc = arith.mul_add(
                        layouter.namespace(|| "+ σ_r r_k"),
                        sigma_r,
                        &r.limbs[k],
                        &acc,
                        F::ONE,
                    )?;
                }
                acc = arith.mul_add(
                    layouter.namespace(|| "- σ_x x_k"),
                    &sigma_x,
                    &x.limbs[k],
                    &acc,
                    -F::ONE,
                )?;
            }
            delta.push(acc);
        }

        self.check_carry_to_zero(layouter.namespace(|| "carry to zero"), &delta)
    }

    /// `(q, r)` with `y·q + r == x`, `|r| < |y|` and `r` either zero or signed
    /// as `rounding` dictates. `y` must be non-zero.
    pub fn div_rem<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
        rounding: Rounding,
    ) -> Result<(AssignedBigInt<F, L>, AssignedBigInt<F, L>), Error> {
        let arith = self.arith();
        let y_zero = self.is_zero(layouter.namespace(|| "y == 0"), y)?;
        arith.assert_zero(layouter.namespace(|| "y != 0"), &y_zero)?;

        let qr = x
            .value()
            .zip(y.value())
            .map(|(x, y)| rounding.div_rem(&x, &y));
        let q = self.witness(
            layouter.namespace(|| "q"),
            qr.as_ref().map(|(q, _)| q.clone()),
        )?;
        let r = self.witness(layouter.namespace(|| "r"), qr.map(|(_, r)| r))?;

        self.check_division(layouter.namespace(|| "y·q + r == x"), x, y, &q, Some(&r))?;

        let bound = self.cmp_magnitude(layouter.namespace(|| "|r| < |y|"), &r, y)?;
        arith.assert_constant(layouter.namespace(|| "assert |r| < |y|"), &bound.lt, F::ONE)?;

        let signed_like = match rounding {
            Rounding::Floor => y,
            Rounding::Trunc => x,
        };
        let r_zero = self.is_zero(layouter.namespace(|| "r == 0"), &r)?;
        let r_nonzero = arith.not(layouter.namespace(|| "r != 0"), &r_zero)?;
        let sign_diff = arith.sub(
            layouter.namespace(|| "sign difference"),
            &r.sign,
            &signed_like.sign,
        )?;
        arith.assert_zero_product(
            layouter.namespace(|| "r == 0 or signs match"),
            &r_nonzero,
            &sign_diff,
        )?;

        Ok((q, r))
    }

    pub fn floor_div<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
    ) -> Result<(AssignedBigInt<F, L>, AssignedBigInt<F, L>), Error> {
        self.div_rem(layouter, x, y, Rounding::Floor)
    }

    pub fn trunc_div<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
    ) -> Result<(AssignedBigInt<F, L>, AssignedBigInt<F, L>), Error> {
        self.div_rem(layouter, x, y, Rounding::Trunc)
    }

    /// Floor remainder, signed like `y`.
    pub fn modulo<F: PrimeField, const L: usize>(
        &self,
        layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let (_, r) = self.floor_div(layouter, x, y)?;
        Ok(r)
    }

    /// `q` with `y·q == x`. Nothing else is checked, so an inexact pair makes
    /// the relation unsatisfiable.
    pub fn div_exact<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let quotient = x.value().zip(y.value()).map(|(x, y)| {
            let (q, r) = floor_div_rem(&x, &y);
            if !r.is_zero() {
                log::error!("{} is not a multiple of {}", x, y);
            }
            q
        });
        let q = self.witness(layouter.namespace(|| "q"), quotient)?;
        self.check_division(layouter.namespace(|| "y·q == x"), x, y, &q, None)?;
        Ok(q)
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
    use halo2curves::bn256::Fr;

    const L: usize = crate::NUM_LIMBS;

    #[derive(Clone, Default)]
    struct DivCircuit {
        x: Value<SignedLimbInt<L>>,
        y: Value<SignedLimbInt<L>>,
        exact: bool,
    }

    // public: [floor q | floor r | trunc q | trunc r], or [x / y] when exact
    impl Circuit<Fr> for DivCircuit {
        type Config = TestConfig;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self {
                exact: self.exact,
                ..Self::default()
            }
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
            let x = chip.assign(layouter.namespace(|| "x"), self.x)?;
            let y = chip.assign(layouter.namespace(|| "y"), self.y)?;

            if self.exact {
                let q = chip.div_exact(layouter.namespace(|| "x / y"), &x, &y)?;
                config.expose(&mut layouter, q.cells(), 0)?;
                return Ok(());
            }

            let (fq, fr) = chip.floor_div(layouter.namespace(|| "floor"), &x, &y)?;
            let (tq, tr) = chip.trunc_div(layouter.namespace(|| "trunc"), &x, &y)?;
            let mut row = 0;
            for value in [&fq, &fr, &tq, &tr] {
                row = config.expose(&mut layouter, value.cells(), row)?;
            }
            Ok(())
        }
    }

    fn limbs(x: &BigInt) -> SignedLimbInt<L> {
        SignedLimbInt::from_bigint(x).unwrap()
    }

    fn run(x: &BigInt, y: &BigInt, exact: bool, public: Vec<Fr>) -> bool {
        let circuit = DivCircuit {
            x: Value::known(limbs(x)),
            y: Value::known(limbs(y)),
            exact,
        };
        MockProver::run(13, &circuit, vec![public]).unwrap().verify().is_ok()
    }

    fn division_public(x: &BigInt, y: &BigInt) -> Vec<Fr> {
        let (fq, fr) = floor_div_rem(x, y);
        let (tq, tr) = trunc_div_rem(x, y);
        [fq, fr, tq, tr]
            .iter()
            .flat_map(|v| limbs(v).to_fields::<Fr>())
            .collect()
    }

    #[test]
    fn test_division_against_native() {
        let mut cases = vec![
            (BigInt::from(7), BigInt::from(2)),
            (BigInt::from(-7), BigInt::from(2)),
            (BigInt::from(7), BigInt::from(-2)),
            (BigInt::from(-7), BigInt::from(-2)),
            (BigInt::from(6), BigInt::from(-3)),
        ];
        cases.push((random_bigint(2088), random_bigint(1000)));
        cases.push((random_bigint(2000), random_bigint(2088)));

        for (x, y) in cases {
            if y.is_zero() {
                continue;
            }
            let (q, r) = floor_div_rem(&x, &y);
            assert_eq!(&y * &q + &r, x);
            assert!(run(&x, &y, false, division_public(&x, &y)));
        }
    }

    #[test]
    fn test_wrong_remainder_convention() {
        // claim the truncating pair as the floor result
        let (x, y) = (BigInt::from(-7), BigInt::from(2));
        let (tq, tr) = trunc_div_rem(&x, &y);
        let mut public: Vec<Fr> = [&tq, &tr, &tq, &tr]
            .iter()
            .flat_map(|v| limbs(v).to_fields::<Fr>())
            .collect();
        assert!(!run(&x, &y, false, public.clone()));

        public = division_public(&x, &y);
        assert!(run(&x, &y, false, public));
    }

    #[test]
    fn test_division_by_zero_is_unsatisfiable() {
        let (x, y) = (BigInt::from(35), BigInt::zero());
        assert!(!run(&x, &y, false, division_public(&x, &y)));
    }

    #[test]
    fn test_div_exact() {
        let y = random_bigint(1000);
        let q = random_bigint(1000);
        let x = &y * &q;
        if y.is_zero() {
            return;
        }
        assert!(run(&x, &y, true, limbs(&q).to_fields()));

        let inexact = &x + 1;
        assert!(!run(&inexact, &y, true, limbs(&q).to_fields()));
    }
}
