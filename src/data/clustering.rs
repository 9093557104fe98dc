//! Gene clusterings of one expression dataset

use std::sync::Arc;

use super::{ClusteringBuilder, GeneUniverse};

/// Name of the cluster that collects genes no input cluster mentions.
/// The leading space keeps it from clashing with a cluster named "unclustered".
pub const UNCLUSTERED_NAME: &str = " unclustered";

/// Named set of gene indices
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    name: String,
    pub(super) genes: Vec<usize>,
}

impl Cluster {
    pub(crate) fn new(name: impl Into<String>, genes: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            genes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member gene indices, in insertion order
    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Whether this is the synthetic catch-all cluster
    pub fn is_unclustered(&self) -> bool {
        self.name == UNCLUSTERED_NAME
    }
}

/// A partition of a gene universe into clusters.
///
/// Every gene of the universe is in exactly one cluster. Built through
/// [`ClusteringBuilder`], which folds unassigned genes into a cluster named
/// [`UNCLUSTERED_NAME`].
#[derive(Debug, Clone)]
pub struct Clustering {
    name: String,
    universe: Arc<GeneUniverse>,
    clusters: Vec<Cluster>,
}

impl Clustering {
    /// Start building a clustering over `universe`
    pub fn builder(name: impl Into<String>, universe: Arc<GeneUniverse>) -> ClusteringBuilder {
        ClusteringBuilder::new(name, universe)
    }

    pub(crate) fn from_parts(
        name: String,
        universe: Arc<GeneUniverse>,
        clusters: Vec<Cluster>,
    ) -> Self {
        Self {
            name,
            universe,
            clusters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gene universe the clustering partitions
    pub fn universe(&self) -> &Arc<GeneUniverse> {
        &self.universe
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }
}

impl<'a> IntoIterator for &'a Clustering {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}
