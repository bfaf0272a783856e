use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector, TableColumn},
    poly::Rotation,
};

use crate::witness_gen::utils::{bit_slice, field_to_biguint};

pub const CHUNK_BITS: usize = 8;
pub const NUM_CHUNKS: usize = 8;
/// Width proven by a single `check`.
pub const RANGE_BITS: usize = CHUNK_BITS * NUM_CHUNKS;

/*
    selector   value   chunk_0 ... chunk_7
       1         x       x_0   ...   x_7     | x = Σ x_i · 2^(8i),  x_i ∈ [0, 256)
*/
#[derive(Clone, Debug)]
pub struct RangeCheckConfig {
    value: Column<Advice>,
    chunks: [Column<Advice>; NUM_CHUNKS],
    table: TableColumn,
    selector: Selector,
}

impl RangeCheckConfig {
    pub fn configure<F: PrimeField>(
        meta: &mut ConstraintSystem<F>,
        value: Column<Advice>,
        chunks: [Column<Advice>; NUM_CHUNKS],
    ) -> Self {
        let table = meta.lookup_table_column();
        let selector = meta.complex_selector();

        for chunk in chunks {
            meta.lookup("8-bit chunk", |meta| {
                let s = meta.query_selector(selector);
                let chunk = meta.query_advice(chunk, Rotation::cur());
                vec![(s * chunk, table)]
            });
        }

        meta.create_gate("recompose chunks", |meta| {
            let s = meta.query_selector(selector);
            let value = meta.query_advice(value, Rotation::cur());
            let base = F::from(1 << CHUNK_BITS);
            let recomposed = chunks
                .iter()
                .rev()
                .fold(Expression::Constant(F::ZERO), |acc, &chunk| {
                    acc * Expression::Constant(base) + meta.query_advice(chunk, Rotation::cur())
                });
            vec![s * (recomposed - value)]
        });

        Self {
            value,
            chunks,
            table,
            selector,
        }
    }

    pub fn load<F: PrimeField>(&self, mut layouter: impl Layouter<F>) -> Result<(), Error> {
        layouter.assign_table(
            || "8-bit table",
            |mut table| {
                for i in 0..1usize << CHUNK_BITS {
                    table.assign_cell(
                        || "chunk",
                        self.table,
                        i,
                        || Value::known(F::from(i as u64)),
                    )?;
                }
                Ok(())
            },
        )
    }

    /// Proves `0 <= x < 2^64`.
    pub fn check<F: PrimeField>(
        &self,
        mut layouter: impl Layouter<F>,
        x: &AssignedCell<F, F>,
    ) -> Result<(), Error> {
        let value = x.value().map(field_to_biguint);
        layouter.assign_region(
            || "range check",
            |mut region| {
                self.selector.enable(&mut region, 0)?;
                x.copy_advice(|| "value", &mut region, self.value, 0)?;
                for (i, &column) in self.chunks.iter().enumerate() {
                    let chunk = value
                        .as_ref()
                        .map(|value| bit_slice::<F>(value, i * CHUNK_BITS, CHUNK_BITS));
                    region.assign_advice(|| format!("chunk {}", i), column, 0, || chunk)?;
                }
                Ok(())
            },
        )
    }
}
