//! Leave-one-out self evaluation and the AUSR metric
//!
//! Each gene of interest is held out in turn: its cluster is re-finalized as if
//! the gene were a candidate, and the gene's rank position among all scored
//! genes is recorded. The area under the resulting recall curve, truncated at
//! rank K, is the AUSR. A ranking that puts its own genes of interest near the
//! top scores close to 1.

use std::cmp::Ordering;

use super::context::ClusterContext;
use super::finalize::finalize_cluster;
use super::view::ScoreVector;
use crate::correlation::CorrelationMatrix;
use crate::error::{MorphError, Result};

/// Rank threshold of the AUSR curve
pub const K: usize = 1000;

/// Position given to a gene of interest that cannot be scored when held out.
/// Anything at or beyond K does not count towards the AUSR.
pub const PENALTY_POSITION: usize = 2 * K - 1;

/// Sorted scores answering "how many exceed s"
struct ScoreIndex {
    sorted: Vec<f64>,
}

impl ScoreIndex {
    fn new<I: IntoIterator<Item = f64>>(scores: I) -> Self {
        let mut sorted: Vec<f64> = scores.into_iter().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Self { sorted }
    }

    fn count_above(&self, score: f64) -> usize {
        self.sorted.len() - self.sorted.partition_point(|&v| v <= score)
    }
}

/// Rank position of each gene of interest when held out, sorted ascending.
///
/// The position of a held-out gene is the number of other genes whose score
/// is strictly higher, counted over `final_scores` with its own cluster's
/// entries replaced by the held-out finalization. `final_scores` itself is
/// left untouched.
///
/// `goi_count` is the size of the gene of interest group; exactly that many
/// positions must come out.
pub fn leave_one_out_positions(
    contexts: &[ClusterContext],
    raw: &ScoreVector,
    final_scores: &ScoreVector,
    correlations: &CorrelationMatrix,
    goi_count: usize,
) -> Result<Vec<usize>> {
    let global = ScoreIndex::new(final_scores.iter_scored().map(|(_, v)| v));
    let mut positions = Vec::with_capacity(goi_count);

    for context in contexts {
        if !context.is_active() {
            // Nothing in the cluster can ever be scored
            positions.extend(std::iter::repeat(PENALTY_POSITION).take(context.goi_count()));
            continue;
        }

        let in_cluster = ScoreIndex::new(
            final_scores
                .gather(context.genes())
                .into_iter()
                .flatten(),
        );

        for &gene in context.goi_rows() {
            let held_out = finalize_cluster(context, raw, correlations, Some(gene))?;
            let own = held_out
                .iter()
                .find(|(g, _)| *g == gene)
                .and_then(|(_, s)| *s);

            let position = match own {
                None => {
                    log::debug!("Gene of interest {} unscored when held out", gene);
                    PENALTY_POSITION
                }
                Some(score) => {
                    let outside = global.count_above(score) - in_cluster.count_above(score);
                    let inside = held_out
                        .iter()
                        .filter(|(g, s)| *g != gene && s.map_or(false, |v| v > score))
                        .count();
                    outside + inside
                }
            };
            positions.push(position);
        }
    }

    if positions.len() != goi_count {
        return Err(MorphError::invariant(format!(
            "{} leave-one-out positions for {} genes of interest",
            positions.len(),
            goi_count
        )));
    }

    positions.sort_unstable();
    Ok(positions)
}

/// Area under the self-ranking curve with threshold [`K`]
pub fn ausr(positions: &[usize]) -> f64 {
    ausr_truncated(positions, K)
}

/// `(1/k) * sum_{t=0}^{k-1} |{p <= t}| / |positions|`
///
/// A position `p < k` is counted at thresholds `p..k`, so it contributes
/// `k - p`; positions at or beyond `k` contribute nothing. Returns 0 for no
/// positions.
pub fn ausr_truncated(positions: &[usize], k: usize) -> f64 {
    if positions.is_empty() || k == 0 {
        return 0.0;
    }
    let area: usize = positions.iter().map(|&p| k.saturating_sub(p)).sum();
    area as f64 / (k as f64 * positions.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Clustering, ExpressionMatrix, GoiGroup};
    use crate::ranking::context::score_clusters;
    use crate::ranking::finalize::finalize_ranking;
    use ndarray::{array, Array2};

    /// Threshold-by-threshold evaluation of the same integral
    fn ausr_by_thresholds(positions: &[usize], k: usize) -> f64 {
        let mut sorted = positions.to_vec();
        sorted.sort_unstable();
        let mut auc = 0.0;
        for t in 0..k {
            let count = sorted.partition_point(|&p| p <= t);
            auc += count as f64 / sorted.len() as f64;
        }
        auc / k as f64
    }

    #[test]
    fn test_ausr_closed_form_matches_thresholds() {
        for positions in [vec![0, 5, 17], vec![999, 1000, 3], vec![PENALTY_POSITION; 4], vec![0]] {
            let a = ausr(&positions);
            let b = ausr_by_thresholds(&positions, K);
            assert!((a - b).abs() < 1e-12, "{:?}: {} vs {}", positions, a, b);
        }
    }

    #[test]
    fn test_ausr_bounds() {
        assert_eq!(ausr(&[0, 0, 0]), 1.0);
        assert_eq!(ausr(&[PENALTY_POSITION, K]), 0.0);
        assert_eq!(ausr(&[]), 0.0);
    }

    #[test]
    fn test_position_zero_contributes_fully() {
        // Held-out gene at position 0 counts at every threshold: half of a
        // two-gene group
        assert!((ausr(&[0, PENALTY_POSITION]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ausr_monotone_in_positions() {
        let mut previous = -1.0;
        for p in (0..1200).rev() {
            let value = ausr(&[p, 10]);
            assert!(value >= previous);
            assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    /// Two tight co-expression modules, genes of interest in the first
    fn module_correlations() -> CorrelationMatrix {
        let a = [1.0, 3.0, 2.0, 5.0, 4.0, 6.0];
        let b = [6.0, 1.0, 5.0, 2.0, 4.0, 3.0];
        let mut values = Array2::zeros((8, 6));
        for k in 0..6 {
            values[[0, k]] = a[k];
            values[[1, k]] = a[k] * 2.0 + 0.1 * k as f64;
            values[[2, k]] = a[k] + 0.3 * (k % 2) as f64;
            values[[3, k]] = a[k] * 0.5 - 0.2 * (k % 3) as f64;
            values[[4, k]] = b[k];
            values[[5, k]] = b[k] * 1.5 + 0.2 * (k % 2) as f64;
            values[[6, k]] = b[k] - 0.4 * (k % 3) as f64;
            values[[7, k]] = (k as f64 - 2.5).powi(2);
        }
        let names: Vec<String> = (0..8).map(|i| format!("g{}", i)).collect();
        let expression = ExpressionMatrix::new("modules", &names, values).unwrap();
        CorrelationMatrix::compute(expression, &[0, 1, 2]).unwrap()
    }

    fn one_cluster(corr: &CorrelationMatrix) -> Clustering {
        let mut builder = Clustering::builder("all", corr.universe().clone());
        for g in 0..corr.n_genes() {
            builder.add("c", g).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_positions_one_per_goi_and_state_untouched() {
        let corr = module_correlations();
        let clustering = one_cluster(&corr);
        let goi = GoiGroup::from_indices("goi", &[0, 1, 2]);
        let (contexts, raw) = score_clusters(&goi, &clustering, &corr).unwrap();
        let scores = finalize_ranking(&contexts, &raw, &corr).unwrap();
        let before = scores.clone();

        let positions = leave_one_out_positions(&contexts, &raw, &scores, &corr, 3).unwrap();
        assert_eq!(positions.len(), 3);
        assert_eq!(scores, before);

        // Genes of interest belong to the same module: each is recovered first
        // (only gene 3 shares their profile, and it is a candidate)
        assert!(positions.iter().all(|&p| p <= 1), "{:?}", positions);
        assert!(ausr(&positions) > 0.99);
    }

    #[test]
    fn test_position_counts_other_clusters() {
        let corr = module_correlations();
        let mut builder = Clustering::builder("two", corr.universe().clone());
        for g in [0, 1, 2, 3] {
            builder.add("first", g).unwrap();
        }
        for g in [4, 5, 6, 7] {
            builder.add("second", g).unwrap();
        }
        let clustering = builder.build();
        let goi = GoiGroup::from_indices("goi", &[0, 1, 2]);
        let (contexts, raw) = score_clusters(&goi, &clustering, &corr).unwrap();
        let scores = finalize_ranking(&contexts, &raw, &corr).unwrap();

        // Second cluster has no genes of interest: nothing there is scored
        for g in 4..8 {
            assert_eq!(scores.get(g), None);
        }

        let positions = leave_one_out_positions(&contexts, &raw, &scores, &corr, 3).unwrap();
        // Held out gene and gene 3 are the only scored genes; two values
        // standardize to -1/sqrt(2), 1/sqrt(2)
        assert!(positions.iter().all(|&p| p <= 1));
    }

    #[test]
    fn test_inert_cluster_goi_get_penalty() {
        let corr = module_correlations();
        let mut builder = Clustering::builder("split", corr.universe().clone());
        builder.add("goi_only", 0).unwrap();
        builder.add("goi_only", 1).unwrap();
        let clustering = builder.build();
        let goi = GoiGroup::from_indices("goi", &[0, 1, 2]);
        let (contexts, raw) = score_clusters(&goi, &clustering, &corr).unwrap();
        let scores = finalize_ranking(&contexts, &raw, &corr).unwrap();

        // Genes 0 and 1 sit in a cluster without candidates; gene 2 is the only
        // gene of interest of the catch-all cluster, so holding it out leaves
        // nothing to correlate against
        let positions = leave_one_out_positions(&contexts, &raw, &scores, &corr, 3).unwrap();
        assert_eq!(positions, vec![PENALTY_POSITION; 3]);
        assert_eq!(ausr(&positions), 0.0);
    }

    #[test]
    fn test_count_mismatch_is_invariant_violation() {
        let corr = module_correlations();
        let clustering = one_cluster(&corr);
        let goi = GoiGroup::from_indices("goi", &[0, 1]);
        let (contexts, raw) = score_clusters(&goi, &clustering, &corr).unwrap();
        let scores = finalize_ranking(&contexts, &raw, &corr).unwrap();
        let result = leave_one_out_positions(&contexts, &raw, &scores, &corr, 3);
        assert!(matches!(result, Err(MorphError::InvariantViolation { .. })));
    }

    #[test]
    fn test_two_gene_group_held_out_at_top() {
        let values = array![
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [1.1, 2.1, 2.9, 4.2, 5.0],
            [5.0, 4.0, 3.0, 2.0, 1.0],
            [2.0, 2.5, 1.0, 3.0, 0.5],
            [0.3, 0.1, 0.9, 0.2, 0.4],
        ];
        let expression = ExpressionMatrix::new("ds", &["a", "b", "c", "d", "e"], values).unwrap();
        let corr = CorrelationMatrix::compute(expression, &[0, 1]).unwrap();
        let clustering = one_cluster(&corr);
        let goi = GoiGroup::from_indices("pair", &[0, 1]);
        let (contexts, raw) = score_clusters(&goi, &clustering, &corr).unwrap();
        let scores = finalize_ranking(&contexts, &raw, &corr).unwrap();

        let positions = leave_one_out_positions(&contexts, &raw, &scores, &corr, 2).unwrap();
        // a and b track each other, so each is top-ranked when held out
        assert_eq!(positions, vec![0, 0]);
        assert_eq!(ausr(&positions), 1.0);
    }
}
