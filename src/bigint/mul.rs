use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::Error,
};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

use super::{AssignedBigInt, BigIntConfig};
use crate::{
    arith::{Coeffs, Term},
    witness_gen::{
        limbs::SignedLimbInt,
        poly_mul::{carry_to_zero, diagonal},
        utils::field_to_bigint,
    },
    LIMB_BITS,
};

/// `m · a · b`, one term of a limb product.
pub(crate) type Product<'a, F> = (&'a AssignedCell<F, F>, &'a AssignedCell<F, F>, F);

impl BigIntConfig {
    /*
        given the coefficients of a limb polynomial in little-endian

            delta      carry_prev   carry
            d_0        0            c_0     | d_0 = c_0 · B
            d_1        c_0          c_1     | d_1 + c_0 = c_1 · B
            ...
            d_n        c_{n-1}              | d_n + c_{n-1} = 0

        with every carry in [-2^127, 2^127). no coefficient can then wrap the
        field, so the polynomial evaluated at B is the integer zero
    */
    pub(crate) fn check_carry_to_zero<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        delta: &[AssignedCell<F, F>],
    ) -> Result<(), Error> {
        let arith = self.arith();

        let native = delta.iter().fold(Value::known(Vec::new()), |acc, d| {
            acc.zip(d.value()).map(|(mut acc, d)| {
                acc.push(field_to_bigint(d));
                acc
            })
        });
        native.map(|delta| {
            if carry_to_zero(&delta, LIMB_BITS).is_none() {
                log::error!("limb polynomial does not vanish: {:?}", delta);
            }
        });

        let base = F::from_u128(1 << LIMB_BITS);
        let base_inv = Option::<F>::from(base.invert()).ok_or(Error::Synthesis)?;
        let (last, rest) = delta.split_last().ok_or(Error::Synthesis)?;

        let mut carry: Option<AssignedCell<F, F>> = None;
        for (k, d) in rest.iter().enumerate() {
            let mut layouter = layouter.namespace(|| format!("coeff {}", k));
            let carry_prev = carry
                .as_ref()
                .map(|c| c.value().copied())
                .unwrap_or_else(|| Value::known(F::ZERO));
            let next = (d.value().copied() + carry_prev) * Value::known(base_inv);

            let [_, _, next, _] = arith.row(
                layouter.namespace(|| "d + carry_prev = carry · B"),
                [
                    d.into(),
                    carry.as_ref().map(Term::from).unwrap_or_else(Term::zero),
                    Term::Unassigned(next),
                    Term::zero(),
                ],
                Coeffs {
                    a: F::ONE,
                    b: F::ONE,
                    c: -base,
                    ..Coeffs::default()
                },
            )?;
            self.bounded
                .check_signed(layouter.namespace(|| "carry range"), &next)?;
            carry = Some(next);
        }

        arith.row(
            layouter.namespace(|| "last coeff"),
            [
                last.into(),
                carry.as_ref().map(Term::from).unwrap_or_else(Term::zero),
                Term::zero(),
                Term::zero(),
            ],
            Coeffs {
                a: F::ONE,
                b: F::ONE,
                ..Coeffs::default()
            },
        )?;
        Ok(())
    }

    /// `init_coeff · init + Σ m · a · b`, one row per product.
    pub(crate) fn accumulate<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        init: Option<(&AssignedCell<F, F>, F)>,
        products: &[Product<'_, F>],
    ) -> Result<AssignedCell<F, F>, Error> {
        let arith = self.arith();
        let mut acc: Option<AssignedCell<F, F>> = None;
        for &(a, b, m) in products {
            let (term, coeff, value) = match (&acc, init) {
                (Some(acc), _) => (Term::Assigned(acc), F::ONE, acc.value().copied()),
                (None, Some((cell, coeff))) => (
                    Term::Assigned(cell),
                    coeff,
                    cell.value().copied() * Value::known(coeff),
                ),
                (None, None) => (Term::zero(), F::ZERO, Value::known(F::ZERO)),
            };
            let d = value + a.value().copied() * b.value().copied() * Value::known(m);
            let [_, _, _, d] = arith.row(
                layouter.namespace(|| "acc + m·a·b"),
                [a.into(), b.into(), term, Term::Unassigned(d)],
                Coeffs {
                    c: coeff,
                    m,
                    d: -F::ONE,
                    ..Coeffs::default()
                },
            )?;
            acc = Some(d);
        }

        match (acc, init) {
            (Some(acc), _) => Ok(acc),
            (None, Some((cell, coeff))) => {
                arith.affine(layouter.namespace(|| "scale"), cell, coeff, F::ZERO)
            }
            (None, None) => arith.constant(layouter.namespace(|| "empty sum"), F::ZERO),
        }
    }

    /*
        witness q, r with lhs = q · p + r, then for every position k

            delta_k = lhs_k - Σ_{i+j=k} q_i · p_j - r_k

        must carry to zero
    */
    fn reduce<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        lhs: Vec<Vec<Product<'_, F>>>,
        lhs_value: Value<BigUint>,
        p: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let qr = lhs_value.zip(p.magnitude()).map(|(lhs, p)| {
            if p.is_zero() {
                log::error!("reducing {} modulo zero", lhs);
                (BigUint::zero(), lhs)
            } else {
                lhs.div_rem(&p)
            }
        });
        let q = self.witness_magnitude::<F, L>(
            layouter.namespace(|| "q"),
            qr.as_ref().map(|(q, _)| q.clone()),
        )?;
        let r = self.witness_magnitude::<F, L>(
            layouter.namespace(|| "r"),
            qr.map(|(_, r)| r),
        )?;

        let mut delta = Vec::with_capacity(2 * L - 1);
        for (k, mut products) in lhs.into_iter().enumerate() {
            products.extend(diagonal(k, L).map(|(i, j)| (&q.limbs[i], &p.limbs[j], -F::ONE)));
            let init = r.limbs.get(k).map(|r_k| (r_k, -F::ONE));
            delta.push(self.accumulate(
                layouter.namespace(|| format!("delta {}", k)),
                init,
                &products,
            )?);
        }

        self.check_carry_to_zero(layouter.namespace(|| "carry to zero"), &delta)?;
        Ok(r)
    }

    /// `|x| · |y| mod |p|`. The result is only proven to fit in `L` limbs,
    /// bounding it below `p` is up to the caller.
    pub fn mod_mul<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        y: &AssignedBigInt<F, L>,
        p: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let lhs = (0..2 * L - 1)
            .map(|k| {
                diagonal(k, L)
                    .map(|(i, j)| (&x.limbs[i], &y.limbs[j], F::ONE))
                    .collect()
            })
            .collect();
        let value = x.magnitude().zip(y.magnitude()).map(|(x, y)| x * y);
        self.reduce(layouter.namespace(|| "x · y mod p"), lhs, value, p)
    }

    /// `|x|^2 mod |p|`, with each off-diagonal product computed once and
    /// doubled.
    pub fn mod_square<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedBigInt<F, L>,
        p: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let two = F::from(2);
        let lhs = (0..2 * L - 1)
            .map(|k| {
                diagonal(k, L)
                    .filter(|(i, j)| i <= j)
                    .map(|(i, j)| {
                        let m = if i == j { F::ONE } else { two };
                        (&x.limbs[i], &x.limbs[j], m)
                    })
                    .collect()
            })
            .collect();
        let value = x.magnitude().map(|x| &x * &x);
        self.reduce(layouter.namespace(|| "x^2 mod p"), lhs, value, p)
    }

    /// `|base|^exponent mod |p|` by square-and-multiply. The exponent is a
    /// circuit constant, so the shape only depends on its bits; the result
    /// is proven to be below `|p|`.
    pub fn pow_mod<F: PrimeField, const L: usize>(
        &self,
        mut layouter: impl Layouter<F>,
        base: &AssignedBigInt<F, L>,
        exponent: &BigUint,
        p: &AssignedBigInt<F, L>,
    ) -> Result<AssignedBigInt<F, L>, Error> {
        let one = self.constant(layouter.namespace(|| "one"), &SignedLimbInt::<L>::from_u64(1))?;

        let mut acc = if exponent.is_zero() {
            self.mod_mul(layouter.namespace(|| "1 mod p"), &one, &one, p)?
        } else {
            let base = self.mod_mul(layouter.namespace(|| "base mod p"), base, &one, p)?;
            let mut acc = base.clone();
            for i in (0..exponent.bits() - 1).rev() {
                let mut layouter = layouter.namespace(|| format!("bit {}", i));
                acc = self.mod_square(layouter.namespace(|| "square"), &acc, p)?;
                if exponent.bit(i) {
                    acc = self.mod_mul(layouter.namespace(|| "multiply"), &acc, &base, p)?;
                }
            }
            acc
        };

        let ordering = self.cmp_magnitude(layouter.namespace(|| "result < p"), &acc, p)?;
        self.arith()
            .assert_constant(layouter.namespace(|| "assert result < p"), &ordering.lt, F::ONE)?;
        Ok(acc)
    }
}
