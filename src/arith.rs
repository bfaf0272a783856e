use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Region, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Fixed},
    poly::Rotation,
};

/*
    one row, four values, six fixed coefficients

      a     b     c     d   | q_a·a + q_b·b + q_c·c + q_d·d + q_m·a·b + q_k == 0

    a result cell is always placed in d with q_d = -1, so e.g.
      mul:      q_m = 1                     => d = a·b
      mul_add:  q_m = m, q_c = 1            => d = m·a·b + c
      linear:   q_a = ka, q_b = kb, q_k = k => d = ka·a + kb·b + k
*/
#[derive(Clone, Debug)]
pub struct ArithConfig {
    a: Column<Advice>,
    b: Column<Advice>,
    c: Column<Advice>,
    d: Column<Advice>,
    q_a: Column<Fixed>,
    q_b: Column<Fixed>,
    q_c: Column<Fixed>,
    q_d: Column<Fixed>,
    q_m: Column<Fixed>,
    q_k: Column<Fixed>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Coeffs<F> {
    pub(crate) a: F,
    pub(crate) b: F,
    pub(crate) c: F,
    pub(crate) d: F,
    pub(crate) m: F,
    pub(crate) k: F,
}

impl<F: PrimeField> Default for Coeffs<F> {
    fn default() -> Self {
        Self {
            a: F::ZERO,
            b: F::ZERO,
            c: F::ZERO,
            d: F::ZERO,
            m: F::ZERO,
            k: F::ZERO,
        }
    }
}

impl<F: PrimeField> Coeffs<F> {
    /// Coefficients for a row whose `d` cell is the output.
    fn output() -> Self {
        Self {
            d: -F::ONE,
            ..Self::default()
        }
    }
}

/// A row operand: either copied from an earlier cell or freshly witnessed.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Term<'a, F: PrimeField> {
    Assigned(&'a AssignedCell<F, F>),
    Unassigned(Value<F>),
}

impl<'a, F: PrimeField> Term<'a, F> {
    pub(crate) fn zero() -> Self {
        Term::Unassigned(Value::known(F::ZERO))
    }
}

impl<'a, F: PrimeField> From<&'a AssignedCell<F, F>> for Term<'a, F> {
    fn from(cell: &'a AssignedCell<F, F>) -> Self {
        Term::Assigned(cell)
    }
}

impl ArithConfig {
    pub fn configure<F: PrimeField>(
        meta: &mut ConstraintSystem<F>,
        advice: [Column<Advice>; 4],
    ) -> Self {
        let [a, b, c, d] = advice;
        let [q_a, q_b, q_c, q_d, q_m, q_k] = [(); 6].map(|_| meta.fixed_column());

        meta.create_gate("standard arithmetic", |meta| {
            let [a, b, c, d] = [a, b, c, d].map(|column| meta.query_advice(column, Rotation::cur()));
            let [q_a, q_b, q_c, q_d, q_m, q_k] = [q_a, q_b, q_c, q_d, q_m, q_k]
                .map(|column| meta.query_fixed(column, Rotation::cur()));

            vec![q_a * a.clone() + q_b * b.clone() + q_c * c + q_d * d + q_m * a * b + q_k]
        });

        Self {
            a,
            b,
            c,
            d,
            q_a,
            q_b,
            q_c,
            q_d,
            q_m,
            q_k,
        }
    }

    // every row claims all advice and coefficient columns, otherwise the floor
    // planner could interleave two regions inside one gate evaluation
    pub(crate) fn assign_row<F: PrimeField>(
        &self,
        region: &mut Region<'_, F>,
        offset: usize,
        terms: [Term<'_, F>; 4],
        coeffs: Coeffs<F>,
    ) -> Result<[AssignedCell<F, F>; 4], Error> {
        let columns = [self.a, self.b, self.c, self.d];
        let names = ["a", "b", "c", "d"];
        let mut cells = Vec::with_capacity(4);
        for ((term, column), name) in terms.into_iter().zip(columns).zip(names) {
            let cell = match term {
                Term::Assigned(cell) => cell.copy_advice(|| name, region, column, offset)?,
                Term::Unassigned(value) => region.assign_advice(|| name, column, offset, || value)?,
            };
            cells.push(cell);
        }

        let fixed = [
            (self.q_a, coeffs.a),
            (self.q_b, coeffs.b),
            (self.q_c, coeffs.c),
            (self.q_d, coeffs.d),
            (self.q_m, coeffs.m),
            (self.q_k, coeffs.k),
        ];
        for (column, coeff) in fixed {
            region.assign_fixed(|| "coeff", column, offset, || Value::known(coeff))?;
        }

        cells.try_into().map_err(|_| Error::Synthesis)
    }

    pub(crate) fn row<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        terms: [Term<'_, F>; 4],
        coeffs: Coeffs<F>,
    ) -> Result<[AssignedCell<F, F>; 4], Error> {
        layouter.assign_region(
            || "arith row",
            |mut region| self.assign_row(&mut region, 0, terms, coeffs),
        )
    }

    /// Output cell of a row whose result goes into `d`.
    fn output<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        terms: [Term<'_, F>; 3],
        d: Value<F>,
        coeffs: Coeffs<F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let [a, b, c] = terms;
        let [_, _, _, d] = self.row(layouter, [a, b, c, Term::Unassigned(d)], coeffs)?;
        Ok(d)
    }

    pub fn witness<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        value: Value<F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let [cell, ..] = self.row(
            layouter,
            [Term::Unassigned(value), Term::zero(), Term::zero(), Term::zero()],
            Coeffs::default(),
        )?;
        Ok(cell)
    }

    pub fn constant<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        constant: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        layouter.assign_region(
            || "constant",
            |mut region| region.assign_advice_from_constant(|| "constant", self.a, 0, constant),
        )
    }

    /// `ka·a + kb·b + k`
    pub fn linear<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        (a, ka): (&AssignedCell<F, F>, F),
        (b, kb): (&AssignedCell<F, F>, F),
        k: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        let d = a.value().copied() * Value::known(ka) + b.value().copied() * Value::known(kb)
            + Value::known(k);
        self.output(
            layouter,
            [a.into(), b.into(), Term::zero()],
            d,
            Coeffs {
                a: ka,
                b: kb,
                k,
                ..Coeffs::output()
            },
        )
    }

    /// `ka·a + k`
    pub fn affine<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        ka: F,
        k: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        let d = a.value().copied() * Value::known(ka) + Value::known(k);
        self.output(
            layouter,
            [a.into(), Term::zero(), Term::zero()],
            d,
            Coeffs {
                a: ka,
                k,
                ..Coeffs::output()
            },
        )
    }

    pub fn add<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.linear(layouter, (a, F::ONE), (b, F::ONE), F::ZERO)
    }

    pub fn sub<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.linear(layouter, (a, F::ONE), (b, -F::ONE), F::ZERO)
    }

    pub fn mul<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let d = a.value().copied() * b.value().copied();
        self.output(
            layouter,
            [a.into(), b.into(), Term::zero()],
            d,
            Coeffs {
                m: F::ONE,
                ..Coeffs::output()
            },
        )
    }

    /// `m·a·b + c`, the accumulation step of every limb product.
    pub fn mul_add<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
        c: &AssignedCell<F, F>,
        m: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        let d = a.value().copied() * b.value().copied() * Value::known(m) + c.value().copied();
        self.output(
            layouter,
            [a.into(), b.into(), c.into()],
            d,
            Coeffs {
                m,
                c: F::ONE,
                ..Coeffs::output()
            },
        )
    }

    pub fn assert_equal<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        layouter.assign_region(
            || "assert equal",
            |mut region| region.constrain_equal(a.cell(), b.cell()),
        )
    }

    pub fn assert_constant<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        constant: F,
    ) -> Result<(), Error> {
        self.row(
            layouter,
            [a.into(), Term::zero(), Term::zero(), Term::zero()],
            Coeffs {
                a: F::ONE,
                k: -constant,
                ..Coeffs::default()
            },
        )?;
        Ok(())
    }

    pub fn assert_zero<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        self.assert_constant(layouter, a, F::ZERO)
    }

    /// `a·b == 0`
    pub fn assert_zero_product<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        self.row(
            layouter,
            [a.into(), b.into(), Term::zero(), Term::zero()],
            Coeffs {
                m: F::ONE,
                ..Coeffs::default()
            },
        )?;
        Ok(())
    }

    /// `a·a - a == 0`
    pub fn assert_bool<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        self.row(
            layouter,
            [a.into(), a.into(), Term::zero(), Term::zero()],
            Coeffs {
                a: -F::ONE,
                m: F::ONE,
                ..Coeffs::default()
            },
        )?;
        Ok(())
    }

    /// Witnesses a boolean and constrains it.
    pub fn witness_bool<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        value: Value<bool>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let bit = self.witness(
            layouter.namespace(|| "bit"),
            value.map(|b| if b { F::ONE } else { F::ZERO }),
        )?;
        self.assert_bool(layouter.namespace(|| "bit is boolean"), &bit)?;
        Ok(bit)
    }

    /*
        a     inv   out        | a·inv + out - 1 == 0
        a     out              | a·out == 0
    */
    pub fn is_zero<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let inv = a.value().map(|a| a.invert().unwrap_or(F::ZERO));
        let out = a
            .value()
            .map(|a| if bool::from(a.is_zero()) { F::ONE } else { F::ZERO });

        layouter.assign_region(
            || "is zero",
            |mut region| {
                let [_, _, out, _] = self.assign_row(
                    &mut region,
                    0,
                    [a.into(), Term::Unassigned(inv), Term::Unassigned(out), Term::zero()],
                    Coeffs {
                        m: F::ONE,
                        c: F::ONE,
                        k: -F::ONE,
                        ..Coeffs::default()
                    },
                )?;
                self.assign_row(
                    &mut region,
                    1,
                    [a.into(), (&out).into(), Term::zero(), Term::zero()],
                    Coeffs {
                        m: F::ONE,
                        ..Coeffs::default()
                    },
                )?;
                Ok(out)
            },
        )
    }

    pub fn not<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.affine(layouter, a, -F::ONE, F::ONE)
    }

    pub fn and<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.mul(layouter, a, b)
    }

    /// `a + b - m·a·b`: `or` for `m = 1`, `xor` for `m = 2`.
    fn boolean_sum<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
        m: F,
    ) -> Result<AssignedCell<F, F>, Error> {
        let (av, bv) = (a.value().copied(), b.value().copied());
        let d = av + bv - av * bv * Value::known(m);
        self.output(
            layouter,
            [a.into(), b.into(), Term::zero()],
            d,
            Coeffs {
                a: F::ONE,
                b: F::ONE,
                m: -m,
                ..Coeffs::output()
            },
        )
    }

    pub fn or<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.boolean_sum(layouter, a, b, F::ONE)
    }

    pub fn xor<F: PrimeField>(
        &self,
        layouter: impl Layouter<F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        self.boolean_sum(layouter, a, b, F::from(2))
    }

    /*
        a     b     a - b           | t = a - b
        cond  t     b      out      | out = cond·t + b
    */
    pub fn select<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        cond: &AssignedCell<F, F>,
        a: &AssignedCell<F, F>,
        b: &AssignedCell<F, F>,
    ) -> Result<AssignedCell<F, F>, Error> {
        let t = a.value().copied() - b.value().copied();
        let out = cond.value().copied() * t + b.value().copied();

        layouter.assign_region(
            || "select",
            |mut region| {
                let [_, _, _, t] = self.assign_row(
                    &mut region,
                    0,
                    [a.into(), b.into(), Term::zero(), Term::Unassigned(t)],
                    Coeffs {
                        a: F::ONE,
                        b: -F::ONE,
                        ..Coeffs::output()
                    },
                )?;
                let [_, _, _, out] = self.assign_row(
                    &mut region,
                    1,
                    [cond.into(), (&t).into(), b.into(), Term::Unassigned(out)],
                    Coeffs {
                        m: F::ONE,
                        c: F::ONE,
                        ..Coeffs::output()
                    },
                )?;
                Ok(out)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_proofs::{
        circuit::SimpleFloorPlanner,
        dev::MockProver,
        plonk::{Circuit, Column, Instance},
    };
    use halo2curves::bn256::Fr;

    #[derive(Clone, Debug)]
    struct TestConfig {
        arith: ArithConfig,
        instance: Column<Instance>,
    }

    #[derive(Clone, Default)]
    struct MyCircuit<F: PrimeField> {
        x: Value<F>,
        y: Value<F>,
        cond: Value<F>,
    }

    // public: [is_zero(x), select(cond, x, y), or(cond, is_zero(x)), xor(cond, is_zero(x)), 3x + 2y + 1]
    impl<F: PrimeField> Circuit<F> for MyCircuit<F> {
        type Config = TestConfig;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self::default()
        }

        fn configure(meta: &mut ConstraintSystem<F>) -> Self::Config {
            let advice = [(); 4].map(|_| meta.advice_column());
            for column in advice {
                meta.enable_equality(column);
            }
            let constants = meta.fixed_column();
            meta.enable_constant(constants);
            let instance = meta.instance_column();
            meta.enable_equality(instance);

            TestConfig {
                arith: ArithConfig::configure(meta, advice),
                instance,
            }
        }

        fn synthesize(
            &self,
            config: Self::Config,
            mut layouter: impl Layouter<F>,
        ) -> Result<(), Error> {
            let arith = &config.arith;
            let x = arith.witness(layouter.namespace(|| "x"), self.x)?;
            let y = arith.witness(layouter.namespace(|| "y"), self.y)?;
            let cond = arith.witness(layouter.namespace(|| "cond"), self.cond)?;
            arith.assert_bool(layouter.namespace(|| "cond is bool"), &cond)?;

            let x_zero = arith.is_zero(layouter.namespace(|| "x == 0"), &x)?;
            let selected = arith.select(layouter.namespace(|| "select"), &cond, &x, &y)?;
            let or = arith.or(layouter.namespace(|| "or"), &cond, &x_zero)?;
            let xor = arith.xor(layouter.namespace(|| "xor"), &cond, &x_zero)?;
            let lin = arith.linear(
                layouter.namespace(|| "3x + 2y + 1"),
                (&x, F::from(3)),
                (&y, F::from(2)),
                F::ONE,
            )?;
            let one = arith.constant(layouter.namespace(|| "one"), F::ONE)?;
            let x_plus_one = arith.add(layouter.namespace(|| "x + 1"), &x, &one)?;
            let back = arith.sub(layouter.namespace(|| "x + 1 - 1"), &x_plus_one, &one)?;
            arith.assert_equal(layouter.namespace(|| "x == x + 1 - 1"), &x, &back)?;

            for (row, cell) in [x_zero, selected, or, xor, lin].iter().enumerate() {
                layouter.constrain_instance(cell.cell(), config.instance, row)?;
            }
            Ok(())
        }
    }

    fn run(x: u64, y: u64, cond: bool, public: [u64; 5]) -> bool {
        let circuit = MyCircuit::<Fr> {
            x: Value::known(Fr::from(x)),
            y: Value::known(Fr::from(y)),
            cond: Value::known(Fr::from(cond as u64)),
        };
        let public = public.iter().map(|&v| Fr::from(v)).collect();
        MockProver::run(6, &circuit, vec![public]).unwrap().verify().is_ok()
    }

    #[test]
    fn test_arith_ops() {
        assert!(run(0, 7, true, [1, 0, 1, 0, 15]));
        assert!(run(5, 7, true, [0, 5, 1, 1, 30]));
        assert!(run(5, 7, false, [0, 7, 0, 0, 30]));
        assert!(run(0, 7, false, [1, 7, 1, 1, 15]));
    }

    #[test]
    fn test_arith_rejects_wrong_outputs() {
        assert!(!run(0, 7, true, [0, 0, 1, 0, 15]));
        assert!(!run(5, 7, true, [0, 7, 1, 1, 30]));
    }

    #[test]
    fn test_non_boolean_condition() {
        let circuit = MyCircuit::<Fr> {
            x: Value::known(Fr::from(5)),
            y: Value::known(Fr::from(7)),
            cond: Value::known(Fr::from(2)),
        };
        let public = [0u64, 3, 0, 0, 30].iter().map(|&v| Fr::from(v)).collect();
        let prover = MockProver::run(6, &circuit, vec![public]).unwrap();
        assert!(prover.verify().is_err());
    }
}
