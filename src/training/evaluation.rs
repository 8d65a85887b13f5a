use std::cmp::Ordering;

/// Decision threshold on the churn probability
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Rank-based ROC-AUC (Mann-Whitney U), ties share the average rank
///
/// `None` when either class is absent.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let n_pos = labels[..n].iter().filter(|&&y| y).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tie group i..=j shares the average rank
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}

/// Share of samples whose thresholded score matches the label
pub fn accuracy(labels: &[bool], scores: &[f64]) -> f64 {
    let n = labels.len().min(scores.len());
    if n == 0 {
        return 0.0;
    }
    let correct = labels
        .iter()
        .zip(scores)
        .filter(|&(&y, &p)| (p >= DECISION_THRESHOLD) == y)
        .count();
    correct as f64 / n as f64
}
