//! Seeded train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::errors::TrainerError;

/// Row indices of the two halves of a split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_size * n_rows)`
/// rows for testing.
pub fn train_test_split(
    n_rows: usize,
    test_size: f64,
    seed: u64,
) -> Result<SplitIndices, TrainerError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainerError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n_test = (test_size * n_rows as f64).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(TrainerError::Dataset(format!(
            "with {n_rows} rows and test_size={test_size}, the train split would have {n_train} rows and the test split {n_test}"
        )));
    }

    let mut order: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(SplitIndices { train, test: order })
}
