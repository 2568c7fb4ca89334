//! Benchmark data generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xarrow::column::PrimitiveColumn;
use xarrow::XArrowResult;

/// Generates random `i64` values with a fixed seed.
pub fn random_i64(count: usize) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| rng.gen()).collect()
}

/// Generates random `f64` values in `[0, 1)` with a fixed seed.
pub fn random_f64(count: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count).map(|_| rng.gen()).collect()
}

/// Builds an `i64` column filled with `values`.
pub fn i64_column(name: &str, values: &[i64]) -> XArrowResult<PrimitiveColumn<i64>> {
    let mut column = PrimitiveColumn::new(name)?;
    column.data_mut().extend_from_slice(values)?;
    Ok(column)
}
