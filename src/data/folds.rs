//! K-fold partitioning of a view's training rows

use crate::data::view::DataView;
use crate::error::{Result, TabfitError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Shuffled, seeded k-fold index pairs `(train_indices, test_indices)` over
/// `n` rows. Fold sizes differ by at most one; the same seed always yields
/// the same partition.
pub(crate) fn k_fold_indices(
    n: usize,
    k: usize,
    seed: u64,
) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(TabfitError::Validation(
            "fold count must be at least 2".to_string(),
        ));
    }
    if n < k {
        return Err(TabfitError::Validation(format!(
            "cannot split {n} rows into {k} folds"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let base = n / k;
    let remainder = n % k;

    let mut splits = Vec::with_capacity(k);
    let mut current = 0;
    for fold_idx in 0..k {
        let fold_size = if fold_idx < remainder { base + 1 } else { base };
        let test: Vec<usize> = indices[current..current + fold_size].to_vec();
        let train: Vec<usize> = indices[..current]
            .iter()
            .chain(indices[current + fold_size..].iter())
            .copied()
            .collect();
        splits.push((train, test));
        current += fold_size;
    }

    Ok(splits)
}

/// Split a view's training rows into `k` per-fold views.
///
/// Each fold view treats its held-in rows as train data and its held-out
/// rows as test data. If the parent view scales its target, every fold view
/// refits the scaler on that fold's own train rows, so no fold's test rows
/// influence its transformation parameters. Folds are returned in
/// generation order, which is stable for a fixed seed.
pub fn k_fold_views(view: &DataView, k: usize, seed: u64) -> Result<Vec<DataView>> {
    let splits = k_fold_indices(view.n_train(), k, seed)?;
    let columns = view.columns_owned();
    let scaler_kind = view.scaler_kind();

    let mut views = Vec::with_capacity(k);
    for (train_idx, test_idx) in &splits {
        let (train_x, train_y) = view.train_rows_raw(train_idx);
        let (test_x, test_y) = view.train_rows_raw(test_idx);

        let fold_view = match scaler_kind {
            Some(kind) => DataView::with_scaled_target(
                train_x,
                train_y,
                test_x,
                test_y,
                columns.clone(),
                kind,
            )?,
            None => DataView::new(train_x, train_y, test_x, test_y, columns.clone())?,
        };
        views.push(fold_view);
    }

    Ok(views)
}
