//! Per-cluster index sets and raw scores
//!
//! Within each cluster the genes of interest are the ground truth and every
//! other member is a candidate. A candidate's raw score is the sum of its
//! correlations with the cluster's genes of interest.

use std::collections::HashSet;

use super::view::{scored, ScoreVector, SubMatrix};
use crate::correlation::CorrelationMatrix;
use crate::data::{Cluster, Clustering, GoiGroup};
use crate::error::{MorphError, Result};

/// Index sets of one cluster for one ranking
#[derive(Debug, Clone)]
pub struct ClusterContext {
    /// Position of the cluster in its clustering
    cluster: usize,
    /// Rows of the genes of interest in the cluster
    goi_rows: Vec<usize>,
    /// Correlation matrix columns of `goi_rows`, same order
    goi_columns: Vec<usize>,
    /// Rows of the other cluster members
    candidates: Vec<usize>,
    /// `goi_rows` followed by `candidates`
    genes: Vec<usize>,
}

impl ClusterContext {
    /// Split `cluster` into genes of interest and candidates
    pub fn new(
        cluster_position: usize,
        cluster: &Cluster,
        goi: &HashSet<usize>,
        correlations: &CorrelationMatrix,
    ) -> Result<Self> {
        let (goi_rows, candidates): (Vec<usize>, Vec<usize>) =
            cluster.genes().iter().copied().partition(|g| goi.contains(g));

        let goi_columns = goi_rows
            .iter()
            .map(|&g| {
                correlations.column_of(g).ok_or_else(|| {
                    MorphError::invariant(format!(
                        "gene of interest {} has no correlation column",
                        g
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let genes = goi_rows.iter().chain(&candidates).copied().collect();

        Ok(Self {
            cluster: cluster_position,
            goi_rows,
            goi_columns,
            candidates,
            genes,
        })
    }

    /// Position of the cluster in its clustering
    pub fn cluster(&self) -> usize {
        self.cluster
    }

    pub fn goi_rows(&self) -> &[usize] {
        &self.goi_rows
    }

    pub fn goi_columns(&self) -> &[usize] {
        &self.goi_columns
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// All cluster members, genes of interest first
    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn goi_count(&self) -> usize {
        self.goi_rows.len()
    }

    /// A cluster without genes of interest or without candidates is inert
    pub fn is_active(&self) -> bool {
        !self.goi_rows.is_empty() && !self.candidates.is_empty()
    }

    /// Correlation column of a gene of interest of this cluster
    pub fn goi_column(&self, gene_idx: usize) -> Option<usize> {
        self.goi_rows
            .iter()
            .position(|&g| g == gene_idx)
            .map(|p| self.goi_columns[p])
    }

    /// Raw score of every member: sum of its correlations with the cluster's
    /// genes of interest. Empty for an inert cluster.
    pub fn raw_scores(&self, correlations: &CorrelationMatrix) -> Vec<(usize, Option<f64>)> {
        if !self.is_active() {
            return Vec::new();
        }
        let view = SubMatrix::new(correlations.values(), &self.genes, &self.goi_columns);
        self.genes
            .iter()
            .copied()
            .zip(view.row_sums().into_iter().map(scored))
            .collect()
    }
}

/// Cluster contexts and raw scores of `goi` under `clustering`
pub fn score_clusters(
    goi: &GoiGroup,
    clustering: &Clustering,
    correlations: &CorrelationMatrix,
) -> Result<(Vec<ClusterContext>, ScoreVector)> {
    let goi_set: HashSet<usize> = goi.genes().iter().copied().collect();
    let mut raw = ScoreVector::unscored(correlations.n_genes());
    let mut contexts = Vec::with_capacity(clustering.n_clusters());

    for (position, cluster) in clustering.iter().enumerate() {
        let context = ClusterContext::new(position, cluster, &goi_set, correlations)?;
        if context.is_active() {
            raw.scatter(context.raw_scores(correlations));
        } else if context.goi_count() > 0 {
            log::debug!(
                "{}: cluster '{}' has {} genes of interest and no candidates",
                goi.name(),
                cluster.name(),
                context.goi_count()
            );
        }
        contexts.push(context);
    }

    Ok((contexts, raw))
}
