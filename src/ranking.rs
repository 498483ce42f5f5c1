//! Top-k target selection from a score matrix

use std::cmp::{min, Ordering};
use ndarray::prelude::*;
use ndarray::Data;

/// Highest score first; equal scores go to the lower column index
#[inline]
fn by_score_desc(scores: &ArrayView1<f64>, a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then(a.cmp(&b))
}

/// Column indices of the `k` best scores in each row, best first.
///
/// `k` is clamped to the number of columns. Scores are compared with `f64::total_cmp`, so NaN
/// (which shouldn't happen, but would mean a broken embedding) gets a fixed place rather than
/// poisoning the order: above every number if its sign bit is clear, below if it is set, as for
/// the `0.0 / 0.0` most hardware produces. Exact ties are broken by lower column index, so the
/// same input always ranks the same way.
pub fn top_k<S: Data<Elem=f64>>(scores: &ArrayBase<S, Ix2>, k: usize) -> Array2<usize> {
    let k = min(k, scores.ncols());
    let mut out = Array2::zeros((scores.nrows(), k));
    if k == 0 {
        return out;
    }
    for (row, mut best) in scores.outer_iter().zip(out.outer_iter_mut()) {
        let mut candidates: Vec<usize> = (0..row.len()).collect();
        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, |&a, &b| by_score_desc(&row, a, b));
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(|&a, &b| by_score_desc(&row, a, b));
        for (slot, &col) in best.iter_mut().zip(candidates.iter()) {
            *slot = col;
        }
    }
    out
}
