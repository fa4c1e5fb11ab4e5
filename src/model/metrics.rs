//! Ranking and classification metrics

use serde::{Deserialize, Serialize};

/// Tolerance used to group tied scores
const TIE_TOLERANCE: f64 = 1e-10;

/// Counts at a decision threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes when `score >= threshold` predicts a leaver.
    pub fn at_threshold(labels: &[u8], scores: &[f64], threshold: f64) -> Self {
        let mut cm = Self::default();
        for (label, score) in labels.iter().zip(scores) {
            match (*label == 1, *score >= threshold) {
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (true, false) => cm.false_negatives += 1,
                (true, true) => cm.true_positives += 1,
            }
        }
        cm
    }

    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positives + self.false_positives;
        (predicted > 0).then(|| self.true_positives as f64 / predicted as f64)
    }

    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positives + self.false_negatives;
        (actual > 0).then(|| self.true_positives as f64 / actual as f64)
    }
}

/// Metrics for one evaluated split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub rows: usize,
    pub positives: usize,
    pub average_precision: Option<f64>,
    pub roc_auc: Option<f64>,
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
}

impl SplitMetrics {
    pub fn evaluate(labels: &[u8], scores: &[f64], threshold: f64) -> Self {
        Self {
            rows: labels.len(),
            positives: labels.iter().filter(|v| **v == 1).count(),
            average_precision: average_precision(labels, scores),
            roc_auc: roc_auc(labels, scores),
            threshold,
            confusion: ConfusionMatrix::at_threshold(labels, scores, threshold),
        }
    }
}

/// (score, label) pairs sorted by descending score
fn sorted_desc(labels: &[u8], scores: &[f64]) -> Vec<(f64, u8)> {
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Average precision: sum of (R_n - R_{n-1}) * P_n over descending thresholds.
///
/// Tied scores form a single threshold. `None` when there is no positive.
pub fn average_precision(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let total_pos = labels.iter().filter(|v| **v == 1).count();
    if total_pos == 0 || labels.len() != scores.len() {
        return None;
    }

    let pairs = sorted_desc(labels, scores);
    let n = pairs.len();
    let mut ap = 0.0;
    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut prev_recall = 0.0;
    let mut i = 0;

    while i < n {
        let current = pairs[i].0;
        let mut j = i;
        while j < n && (pairs[j].0 - current).abs() < TIE_TOLERANCE {
            if pairs[j].1 == 1 {
                tp += 1;
            }
            j += 1;
        }
        seen += j - i;

        let recall = tp as f64 / total_pos as f64;
        let precision = tp as f64 / seen as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
        i = j;
    }

    Some(ap)
}

/// ROC AUC via the Mann-Whitney rank statistic with tie averaging.
///
/// `None` when either class is absent.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() {
        return None;
    }
    let total_pos = labels.iter().filter(|v| **v == 1).count() as f64;
    let total_neg = labels.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return None;
    }

    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut cumulative = 0.0;
    let mut i = 0;

    while i < n {
        let current = pairs[i].0;
        let mut j = i;
        while j < n && (pairs[j].0 - current).abs() < TIE_TOLERANCE {
            j += 1;
        }

        let group = (j - i) as f64;
        // midpoint rank of the tie group, zero-based
        let avg_rank = cumulative + group / 2.0;
        let positives = pairs[i..j].iter().filter(|(_, t)| *t == 1).count() as f64;
        rank_sum_pos += avg_rank * positives;

        cumulative += group;
        i = j;
    }

    let u = rank_sum_pos - total_pos * total_pos / 2.0;
    Some((u / (total_pos * total_neg)).clamp(0.0, 1.0))
}
