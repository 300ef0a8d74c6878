use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, ConvertResult};
use crate::types::CorpusSplit;

/// Read the example id list: one id per line, the first space-separated token
/// of each line. Blank lines are ignored.
pub fn read_examples_list(path: &Path) -> ConvertResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(content
        .lines()
        .filter_map(|line| line.trim().split(' ').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

/// Shuffle the example ids with a seeded RNG and split them into training and
/// validation ids at `floor(train_ratio * len)`.
pub fn split_examples(example_ids: &[String], train_ratio: f64, seed: u64) -> CorpusSplit {
    let mut shuffled = example_ids.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let num_train = ((shuffled.len() as f64 * train_ratio).floor() as usize).min(shuffled.len());
    let val = shuffled.split_off(num_train);

    CorpusSplit {
        train: shuffled,
        val,
    }
}
