//! Candidate gene rankings
//!
//! A [`Ranking`] scores every candidate gene of one dataset against one group
//! of genes of interest under one clustering:
//!
//! 1. raw scores: per cluster, sum of correlations with the cluster's genes of
//!    interest ([`context`])
//! 2. final scores: raw scores averaged and standardized per cluster
//!    ([`finalize`])
//! 3. AUSR: leave-one-out recovery of the genes of interest ([`self_eval`])

pub mod context;
pub mod finalize;
pub mod self_eval;
pub mod view;

use std::cmp::Ordering;
use std::sync::Arc;

use crate::correlation::CorrelationMatrix;
use crate::data::{Clustering, GeneUniverse, GoiGroup};
use crate::error::{MorphError, Result};

pub use context::{score_clusters, ClusterContext};
pub use finalize::{finalize_cluster, finalize_ranking};
pub use self_eval::{ausr, ausr_truncated, leave_one_out_positions, K, PENALTY_POSITION};
pub use view::{Score, ScoreVector, SubMatrix};

/// Scores of one (dataset, clustering, genes of interest) combination
#[derive(Debug, Clone)]
pub struct Ranking {
    dataset: String,
    clustering: String,
    universe: Arc<GeneUniverse>,
    goi: GoiGroup,
    scores: ScoreVector,
    /// Leave-one-out rank positions, ascending
    positions: Vec<usize>,
    ausr: f64,
}

/// One row of a ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGene {
    /// 1-based rank
    pub rank: usize,
    pub gene_idx: usize,
    pub score: f64,
}

impl Ranking {
    /// Rank the candidates of `clustering` against `goi`
    pub fn new(
        goi: &GoiGroup,
        clustering: &Clustering,
        correlations: &CorrelationMatrix,
    ) -> Result<Self> {
        let universe = correlations.universe();
        if !Arc::ptr_eq(universe, clustering.universe()) && **universe != **clustering.universe() {
            return Err(MorphError::DimensionMismatch {
                expected: format!("clustering over dataset '{}'", correlations.dataset()),
                got: format!("clustering '{}' over another gene universe", clustering.name()),
            });
        }
        if goi.is_empty() {
            return Err(MorphError::InsufficientSupport {
                goi: goi.name().to_string(),
                found: 0,
                required: 1,
            });
        }
        for &g in goi.genes() {
            universe.check_index(g)?;
        }

        let (contexts, raw) = score_clusters(goi, clustering, correlations)?;
        let scores = finalize_ranking(&contexts, &raw, correlations)?;
        let positions = leave_one_out_positions(&contexts, &raw, &scores, correlations, goi.len())?;
        let ausr = ausr(&positions);

        Ok(Self {
            dataset: correlations.dataset().to_string(),
            clustering: clustering.name().to_string(),
            universe: Arc::clone(universe),
            goi: goi.clone(),
            scores,
            positions,
            ausr,
        })
    }

    /// Name of the expression dataset
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Name of the clustering
    pub fn clustering(&self) -> &str {
        &self.clustering
    }

    pub fn universe(&self) -> &Arc<GeneUniverse> {
        &self.universe
    }

    pub fn goi(&self) -> &GoiGroup {
        &self.goi
    }

    /// Final scores over all genes
    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// Leave-one-out rank positions of the genes of interest, ascending
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn ausr(&self) -> f64 {
        self.ausr
    }

    /// Scored candidates, best first. Ties are broken by gene index.
    pub fn ranked_genes(&self) -> Vec<RankedGene> {
        let mut genes: Vec<(usize, f64)> = self.scores.iter_scored().collect();
        genes.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        genes
            .into_iter()
            .enumerate()
            .map(|(i, (gene_idx, score))| RankedGene {
                rank: i + 1,
                gene_idx,
                score,
            })
            .collect()
    }

    /// Placeholder ranking with a given AUSR
    #[cfg(test)]
    pub(crate) fn with_ausr(dataset: &str, ausr: f64) -> Self {
        let universe = Arc::new(GeneUniverse::new(["x"]).unwrap());
        Self {
            dataset: dataset.to_string(),
            clustering: "clustering".to_string(),
            universe,
            goi: GoiGroup::from_indices("goi", &[0]),
            scores: ScoreVector::unscored(1),
            positions: vec![0],
            ausr,
        }
    }
}
