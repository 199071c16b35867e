//! Ranking and regression metrics for GED similarity evaluation.
//!
//! Everything here operates on plain f32 slices of predictions and
//! ground-truth similarities; no tensors are involved. Rank correlations
//! are tie-corrected: Spearman's rho uses average ranks and Kendall's
//! tau is the tau-b variant.

/// Per-pair error metric used for validation and test reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairLossKind {
    /// (prediction - target)^2
    #[default]
    SquaredError,
    /// |prediction - target|
    AbsoluteError,
}

/// Scalar per-pair error.
pub fn pair_loss(prediction: f32, target: f32, kind: PairLossKind) -> f32 {
    let diff = prediction - target;
    match kind {
        PairLossKind::SquaredError => diff * diff,
        PairLossKind::AbsoluteError => diff.abs(),
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance around the mean; 0 for an empty slice.
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

/// Spearman's rank correlation: Pearson correlation of average ranks.
pub fn spearman_rho(x: &[f32], y: &[f32]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Kendall's tau-b with tie corrections.
pub fn kendall_tau(x: &[f32], y: &[f32]) -> f64 {
    let n = x.len();
    if n != y.len() || n < 2 {
        return 0.0;
    }

    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_x = 0i64;
    let mut ties_y = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                ties_x += 1;
                ties_y += 1;
            } else if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let n0 = (n * (n - 1) / 2) as i64;
    let denom = (((n0 - ties_x) as f64) * ((n0 - ties_y) as f64)).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (concordant - discordant) as f64 / denom
}

/// Precision at k: overlap between the top-k of the ground-truth ranking
/// and the top-k of the predicted ranking, divided by k.
///
/// Both rankings are by descending similarity. `k` is clamped to the
/// block length.
pub fn prec_at_ks(ground_truth: &[f32], predictions: &[f32], k: usize) -> f32 {
    if ground_truth.is_empty() || ground_truth.len() != predictions.len() || k == 0 {
        return 0.0;
    }
    let k = k.min(ground_truth.len());
    let top_gt = top_k_indices(ground_truth, k);
    let top_pred = top_k_indices(predictions, k);
    let hits = top_pred.iter().filter(|i| top_gt.contains(i)).count();
    hits as f32 / k as f32
}

fn top_k_indices(values: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(k);
    indices
}

/// Ranks starting at 1; tied values share the average of their positions.
fn average_ranks(values: &[f32]) -> Vec<f64> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0f64; values.len()];
    let mut i = 0;
    while i < indices.len() {
        let mut j = i;
        while j + 1 < indices.len() && values[indices[j + 1]] == values[indices[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &indices[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }
    if den_x == 0.0 || den_y == 0.0 {
        return 0.0;
    }
    num / (den_x.sqrt() * den_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_loss_kinds() {
        assert!((pair_loss(0.8, 0.5, PairLossKind::SquaredError) - 0.09).abs() < 1e-6);
        assert!((pair_loss(0.8, 0.5, PairLossKind::AbsoluteError) - 0.3).abs() < 1e-6);
        assert_eq!(PairLossKind::default(), PairLossKind::SquaredError);
    }

    #[test]
    fn test_spearman_perfect_and_reversed() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let monotone = [10.0, 20.0, 30.0, 40.0];
        let reversed = [4.0, 3.0, 2.0, 1.0];
        assert!((spearman_rho(&x, &monotone) - 1.0).abs() < 1e-9);
        assert!((spearman_rho(&x, &reversed) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spearman_handles_ties() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 2.0, 2.0, 3.0];
        assert!((spearman_rho(&x, &y) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kendall_perfect_and_reversed() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let monotone = [2.0, 4.0, 6.0, 8.0];
        let reversed = [4.0, 3.0, 2.0, 1.0];
        assert!((kendall_tau(&x, &monotone) - 1.0).abs() < 1e-9);
        assert!((kendall_tau(&x, &reversed) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kendall_degenerate() {
        assert_eq!(kendall_tau(&[1.0], &[1.0]), 0.0);
        assert_eq!(kendall_tau(&[1.0, 1.0], &[2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_prec_at_ks_identity_ranking() {
        let gt = [0.9, 0.8, 0.7, 0.6, 0.5];
        assert!((prec_at_ks(&gt, &gt, 3) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_prec_at_ks_partial_overlap() {
        let gt = [0.9, 0.8, 0.1, 0.2];
        let pred = [0.9, 0.1, 0.8, 0.2];
        // Top-2 of gt is {0, 1}; top-2 of pred is {0, 2}: one hit.
        assert!((prec_at_ks(&gt, &pred, 2) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_prec_at_ks_clamps_k() {
        let gt = [0.9, 0.8];
        assert!((prec_at_ks(&gt, &gt, 10) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_and_variance() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&v) - 2.5).abs() < 1e-6);
        assert!((variance(&v) - 1.25).abs() < 1e-6);
        assert_eq!(mean(&[]), 0.0);
    }
}
