//! Builder for clusterings
//!
//! Collects named gene groups one membership at a time and produces a
//! [`Clustering`] that partitions the whole gene universe.

use std::collections::HashMap;
use std::sync::Arc;

use super::clustering::{Cluster, Clustering, UNCLUSTERED_NAME};
use super::GeneUniverse;
use crate::error::{MorphError, Result};

/// Builder for [`Clustering`]
///
/// # Example
///
/// ```ignore
/// let mut builder = Clustering::builder("k-means", universe.clone());
/// builder.add("cluster_1", 0)?;
/// builder.add_named("cluster_1", "at1g01010")?;
/// let clustering = builder.build();
/// ```
#[derive(Debug)]
pub struct ClusteringBuilder {
    name: String,
    universe: Arc<GeneUniverse>,
    /// Clusters in order of first appearance
    clusters: Vec<Cluster>,
    cluster_indices: HashMap<String, usize>,
    /// Gene index -> cluster position, for every assigned gene
    assignment: HashMap<usize, usize>,
}

impl ClusteringBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>, universe: Arc<GeneUniverse>) -> Self {
        Self {
            name: name.into(),
            universe,
            clusters: Vec::new(),
            cluster_indices: HashMap::new(),
            assignment: HashMap::new(),
        }
    }

    /// Add gene `gene_idx` to the cluster named `cluster`
    ///
    /// Fails if the gene is already in this cluster or in another one.
    pub fn add(&mut self, cluster: &str, gene_idx: usize) -> Result<&mut Self> {
        self.universe.check_index(gene_idx)?;

        if let Some(&existing) = self.assignment.get(&gene_idx) {
            let gene = self.gene_name(gene_idx);
            let first = self.clusters[existing].name();
            if first == cluster {
                return Err(MorphError::DuplicateMembership {
                    gene,
                    cluster: cluster.to_string(),
                });
            }
            return Err(MorphError::OverlappingClusters {
                gene,
                first: first.to_string(),
                second: cluster.to_string(),
            });
        }

        let position = match self.cluster_indices.get(cluster) {
            Some(&p) => p,
            None => {
                self.clusters.push(Cluster::new(cluster, Vec::new()));
                self.cluster_indices
                    .insert(cluster.to_string(), self.clusters.len() - 1);
                self.clusters.len() - 1
            }
        };

        self.assignment.insert(gene_idx, position);
        self.clusters[position].genes.push(gene_idx);
        Ok(self)
    }

    /// Add a gene by name. Returns `Ok(false)` when the gene is not part of
    /// the universe; clusterings need not be derived from the same dataset.
    pub fn add_named(&mut self, cluster: &str, gene: &str) -> Result<bool> {
        match self.universe.index_of(gene) {
            Some(idx) => {
                self.add(cluster, idx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of genes assigned so far
    pub fn n_assigned(&self) -> usize {
        self.assignment.len()
    }

    /// Build the clustering, collecting unassigned genes into the catch-all
    /// cluster (omitted when every gene is assigned)
    pub fn build(self) -> Clustering {
        let mut clusters = self.clusters;
        let unassigned: Vec<usize> = (0..self.universe.len())
            .filter(|g| !self.assignment.contains_key(g))
            .collect();
        if !unassigned.is_empty() {
            clusters.push(Cluster::new(UNCLUSTERED_NAME, unassigned));
        }
        Clustering::from_parts(self.name, self.universe, clusters)
    }

    fn gene_name(&self, gene_idx: usize) -> String {
        self.universe
            .name(gene_idx)
            .map(str::to_string)
            .unwrap_or_else(|| gene_idx.to_string())
    }
}
