use ff::PrimeField;
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};

use crate::{
    gcd::GcdConfig,
    witness_gen::limbs::ReductionPair,
    NUM_LIMBS, STEPS_PER_PROOF,
};

/// Instance cells taken by one pair.
pub const fn pair_cells(limbs: usize) -> usize {
    2 * (limbs + 1)
}

/// First link of a chain: `STEPS` reductions of the input pair.
///
/// Instance: `[input | output]`.
#[derive(Clone, Debug, Default)]
pub struct BaseCaseCircuit<const L: usize = NUM_LIMBS, const STEPS: usize = STEPS_PER_PROOF> {
    pub input: Value<ReductionPair<L>>,
}

impl<const L: usize, const STEPS: usize> BaseCaseCircuit<L, STEPS> {
    pub fn new(input: ReductionPair<L>) -> Self {
        Self {
            input: Value::known(input),
        }
    }

    pub fn instance<F: PrimeField>(input: &ReductionPair<L>, output: &ReductionPair<L>) -> Vec<F> {
        let mut instance = input.to_fields();
        instance.extend(output.to_fields::<F>());
        instance
    }
}

impl<F: PrimeField, const L: usize, const STEPS: usize> Circuit<F> for BaseCaseCircuit<L, STEPS> {
    type Config = GcdConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<F>) -> Self::Config {
        GcdConfig::configure(meta)
    }

    fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<F>) -> Result<(), Error> {
        config.load_table(layouter.namespace(|| "table"))?;

        let input = config.load_pair::<F, L>(layouter.namespace(|| "input"), self.input)?;
        let output = config.euclid_gcd(layouter.namespace(|| "euclid"), &input, STEPS)?;

        let row = config.expose(&mut layouter, &input, 0)?;
        config.expose(&mut layouter, &output, row)?;
        Ok(())
    }
}

/// Every later link: `STEPS` reductions of the previous link's output, with
/// the chain's first input carried along.
///
/// Instance: `[input | prior output | output]`.
#[derive(Clone, Debug, Default)]
pub struct StepCaseCircuit<const L: usize = NUM_LIMBS, const STEPS: usize = STEPS_PER_PROOF> {
    pub input: Value<ReductionPair<L>>,
    pub prior_output: Value<ReductionPair<L>>,
}

impl<const L: usize, const STEPS: usize> StepCaseCircuit<L, STEPS> {
    pub fn new(input: ReductionPair<L>, prior_output: ReductionPair<L>) -> Self {
        Self {
            input: Value::known(input),
            prior_output: Value::known(prior_output),
        }
    }

    pub fn instance<F: PrimeField>(
        input: &ReductionPair<L>,
        prior_output: &ReductionPair<L>,
        output: &ReductionPair<L>,
    ) -> Vec<F> {
        let mut instance = input.to_fields();
        instance.extend(prior_output.to_fields::<F>());
        instance.extend(output.to_fields::<F>());
        instance
    }
}

impl<F: PrimeField, const L: usize, const STEPS: usize> Circuit<F> for StepCaseCircuit<L, STEPS> {
    type Config = GcdConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<F>) -> Self::Config {
        GcdConfig::configure(meta)
    }

    fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<F>) -> Result<(), Error> {
        config.load_table(layouter.namespace(|| "table"))?;

        let input = config.load_pair::<F, L>(layouter.namespace(|| "input"), self.input)?;
        let prior_output =
            config.load_pair::<F, L>(layouter.namespace(|| "prior output"), self.prior_output)?;
        let output = config.euclid_gcd(layouter.namespace(|| "euclid"), &prior_output, STEPS)?;

        let row = config.expose(&mut layouter, &input, 0)?;
        let row = config.expose(&mut layouter, &prior_output, row)?;
        config.expose(&mut layouter, &output, row)?;
        Ok(())
    }
}
