//! Ranking runs over species, data sets and clusterings
//!
//! For every species, each group of genes of interest is ranked against every
//! (expression matrix, clustering) combination. The best ranking of each group
//! is reported along with the mean AUSR over all combinations.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{ClusteringSpec, Config, ExpressionSpec, GoiSpec, JobList, SpeciesSpec};
use crate::correlation::CorrelationMatrix;
use crate::data::{Clustering, ExpressionMatrix, GeneDescriptions, GeneUniverse, GenesOfInterest, GoiGroup};
use crate::error::{MorphError, Result};
use crate::io::{RankingReport, ReportSink};
use crate::ranking::Ranking;
use crate::selection::{Offer, RankingSelector, DEFAULT_MIN_SUPPORT};

/// Where expression matrices, clusterings and gene lists come from
pub trait DatasetSource {
    fn load_expression(&self, spec: &ExpressionSpec) -> Result<ExpressionMatrix>;

    /// Load a clustering over the genes of an already loaded matrix
    fn load_clustering(&self, spec: &ClusteringSpec, universe: Arc<GeneUniverse>) -> Result<Clustering>;

    fn load_genes_of_interest(&self, spec: &GoiSpec) -> Result<GenesOfInterest>;

    fn load_gene_descriptions(&self, path: &Path) -> Result<GeneDescriptions>;
}

/// Parameters of a ranking run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingParams {
    /// Minimum number of genes of interest, both in a group and present in a
    /// data set
    pub min_support: usize,
    /// Maximum number of candidates per report
    pub top_k: Option<usize>,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            top_k: None,
        }
    }
}

/// Cooperative cancellation flag, shared between clones
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MorphError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Rank every group of `gois` against every combination of `species` and
/// emit one report per group that got ranked at least once.
///
/// Returns the number of reports emitted.
pub fn run_species<S, R>(
    species: &SpeciesSpec,
    gois: &[GenesOfInterest],
    source: &S,
    params: &RankingParams,
    sink: &mut R,
    cancel: &CancellationToken,
) -> Result<usize>
where
    S: DatasetSource + ?Sized,
    R: ReportSink + ?Sized,
{
    let gois: Vec<&GenesOfInterest> = gois
        .iter()
        .filter(|goi| {
            let keep = goi.len() >= params.min_support;
            if !keep {
                warn!(
                    "Dropping GOI {}: too few genes: {} < {}",
                    goi.name(),
                    goi.len(),
                    params.min_support
                );
            }
            keep
        })
        .collect();
    if gois.is_empty() {
        return Ok(0);
    }

    let mut selector = RankingSelector::new(params.min_support);

    for expression_spec in &species.expression_matrices {
        cancel.check()?;
        let expression = source.load_expression(expression_spec)?;
        info!(
            "{}: loaded {} ({} genes, {} samples)",
            species.name,
            expression.name(),
            expression.n_genes(),
            expression.n_samples()
        );

        let universe = Arc::clone(expression.universe());
        let groups: Vec<GoiGroup> = gois.iter().map(|goi| goi.resolve(&universe)).collect();
        let targets: Vec<usize> = groups.iter().flat_map(|g| g.genes().iter().copied()).collect();
        if targets.is_empty() {
            warn!(
                "{}: no genes of interest present in {}, skipping",
                species.name,
                expression.name()
            );
            continue;
        }

        let correlations = CorrelationMatrix::compute(expression, &targets)?;
        debug!(
            "{}: {} correlation columns",
            correlations.dataset(),
            correlations.n_targets()
        );

        for clustering_spec in &expression_spec.clusterings {
            cancel.check()?;
            let clustering = source.load_clustering(clustering_spec, Arc::clone(&universe))?;
            rank_clustering(species, &groups, &clustering, &correlations, &mut selector, cancel)?;
        }
        // Correlations of this data set are dropped here
    }

    let descriptions = match &species.gene_descriptions {
        Some(path) => source.load_gene_descriptions(path)?,
        None => GeneDescriptions::new(),
    };

    let mut emitted = 0;
    for (_, result) in selector.into_results() {
        let average = result.average_ausr();
        if let (Some(best), Some(average)) = (result.into_best(), average) {
            sink.emit(RankingReport::new(species, &best, average, &descriptions, params.top_k))?;
            emitted += 1;
        }
    }
    Ok(emitted)
}

/// Rank all groups against one clustering and offer the rankings, in group
/// order. Cancellation is checked before ranking and before every offer.
fn rank_clustering(
    species: &SpeciesSpec,
    groups: &[GoiGroup],
    clustering: &Clustering,
    correlations: &CorrelationMatrix,
    selector: &mut RankingSelector,
    cancel: &CancellationToken,
) -> Result<()> {
    cancel.check()?;
    let min_support = selector.min_support();
    let rankings: Vec<Option<Result<Ranking>>> = groups
        .par_iter()
        .map(|group| {
            (group.len() >= min_support).then(|| Ranking::new(group, clustering, correlations))
        })
        .collect();

    for (i, (group, ranking)) in groups.iter().zip(rankings).enumerate() {
        cancel.check()?;
        let label = format!(
            "{}, {}, {}, {}",
            species.name,
            group.name(),
            correlations.dataset(),
            clustering.name()
        );
        let Some(ranking) = ranking else {
            warn!(
                "{}: Skipping: Too few genes of interest found in dataset: {} < {}",
                label,
                group.len(),
                min_support
            );
            continue;
        };
        match selector.offer(i, ranking?) {
            Offer::Recorded { ausr, best } => {
                info!("{}: AUSR={:.2}{}", label, ausr, if best { " (best so far)" } else { "" });
            }
            Offer::Skipped { found } => {
                warn!("{}: Skipping: {} genes of interest found", label, found);
            }
        }
    }
    Ok(())
}

/// Run every job of `jobs` against the species of `config`, species in
/// configuration order. Returns the number of reports emitted.
pub fn run<S, R>(
    config: &Config,
    jobs: &JobList,
    source: &S,
    params: &RankingParams,
    sink: &mut R,
    cancel: &CancellationToken,
) -> Result<usize>
where
    S: DatasetSource + ?Sized,
    R: ReportSink + ?Sized,
{
    let assigned = jobs.assign(config)?;
    let mut emitted = 0;

    for (species, specs) in config.species.iter().zip(assigned) {
        if specs.is_empty() {
            continue;
        }
        cancel.check()?;
        let pattern = species.gene_pattern()?;
        let gois = specs
            .into_iter()
            .map(|spec| {
                let goi = source.load_genes_of_interest(spec)?;
                if let Some(pattern) = &pattern {
                    goi.check_names(pattern)?;
                }
                Ok(goi)
            })
            .collect::<Result<Vec<_>>>()?;

        info!("{}: {} groups of genes of interest", species.name, gois.len());
        emitted += run_species(species, &gois, source, params, sink, cancel)?;
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoiSource;
    use ndarray::Array2;
    use std::collections::HashMap;

    /// Data sets held in memory; clusterings are given as gene name lists
    #[derive(Default)]
    struct MemorySource {
        expression: HashMap<String, (Vec<String>, Array2<f64>)>,
        clusterings: HashMap<String, Vec<(String, Vec<String>)>>,
    }

    impl DatasetSource for MemorySource {
        fn load_expression(&self, spec: &ExpressionSpec) -> Result<ExpressionMatrix> {
            let (names, values) = self
                .expression
                .get(&spec.name)
                .ok_or_else(|| MorphError::invariant("unknown expression matrix"))?;
            ExpressionMatrix::new(spec.name.as_str(), names, values.clone())
        }

        fn load_clustering(&self, spec: &ClusteringSpec, universe: Arc<GeneUniverse>) -> Result<Clustering> {
            let clusters = self
                .clusterings
                .get(&spec.name)
                .ok_or_else(|| MorphError::invariant("unknown clustering"))?;
            let mut builder = Clustering::builder(spec.name.as_str(), universe);
            for (cluster, genes) in clusters {
                for gene in genes {
                    builder.add_named(cluster, gene)?;
                }
            }
            Ok(builder.build())
        }

        fn load_genes_of_interest(&self, spec: &GoiSpec) -> Result<GenesOfInterest> {
            match &spec.source {
                GoiSource::Inline { genes } => Ok(GenesOfInterest::new(spec.name.as_str(), genes)),
                GoiSource::File { .. } => Err(MorphError::invariant("no files here")),
            }
        }

        fn load_gene_descriptions(&self, _path: &Path) -> Result<GeneDescriptions> {
            let mut descriptions = GeneDescriptions::new();
            descriptions.insert("g1", "first candidate");
            Ok(descriptions)
        }
    }

    /// 15 genes in three co-expression modules of five
    fn modules() -> (Vec<String>, Array2<f64>) {
        let names: Vec<String> = (0..15).map(|i| format!("g{}", i)).collect();
        let mut values = Array2::zeros((15, 10));
        for i in 0..15 {
            let module = (i / 5) as f64;
            for k in 0..10 {
                values[[i, k]] = ((k as f64) * (1.0 + module)).sin() * (1.0 + 0.2 * i as f64)
                    + 0.01 * ((i * 5 + k * 7) % 11) as f64;
            }
        }
        (names, values)
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::default();
        source.expression.insert("first".to_string(), modules());
        source.expression.insert("second".to_string(), modules());
        source.clusterings.insert(
            "by_module".to_string(),
            (0..3)
                .map(|m| {
                    let genes = (0..5).map(|i| format!("g{}", m * 5 + i)).collect();
                    (format!("m{}", m), genes)
                })
                .collect(),
        );
        source.clusterings.insert("none".to_string(), Vec::new());
        source
    }

    fn species() -> SpeciesSpec {
        let config = Config::from_yaml_str(
            "
species:
  - name: test species
    gene_descriptions: descriptions.tsv
    expression_matrices:
      - name: first
        path: first.tsv
        clusterings:
          - {name: by_module, path: m.tsv}
          - {name: none, path: n.tsv}
      - name: second
        path: second.tsv
        clusterings:
          - {name: by_module, path: m.tsv}
",
        )
        .unwrap();
        config.species[0].clone()
    }

    fn params() -> RankingParams {
        RankingParams {
            min_support: 2,
            top_k: Some(3),
        }
    }

    #[test]
    fn test_run_species_reports_best_ranking() {
        let gois = vec![GenesOfInterest::new("module0", ["g0", "g2", "g3"])];
        let mut reports: Vec<RankingReport> = Vec::new();
        let emitted = run_species(
            &species(),
            &gois,
            &source(),
            &params(),
            &mut reports,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(emitted, 1);
        let report = &reports[0];
        assert_eq!(report.goi_name, "module0");
        assert_eq!(report.species, "test species");
        assert_eq!(report.goi_genes_present, vec!["g0", "g2", "g3"]);
        assert!(report.goi_genes_missing.is_empty());
        assert!(report.candidates.len() <= 3);
        assert!((0.0..=1.0).contains(&report.best_ausr));
        assert!(report.average_ausr <= report.best_ausr);
        // The second data set repeats the first, so it never wins
        assert_eq!(report.gene_expression_name, "first");
        // Module 0 candidates lead under either clustering
        assert!(["g1", "g4"].contains(&report.candidates[0].gene.as_str()));
        let g1 = report.candidates.iter().find(|c| c.gene == "g1");
        assert_eq!(g1.map(|c| c.annotation.as_str()), Some("first candidate"));
    }

    #[test]
    fn test_small_groups_dropped() {
        let gois = vec![GenesOfInterest::new("tiny", ["g0"])];
        let mut reports: Vec<RankingReport> = Vec::new();
        let emitted = run_species(
            &species(),
            &gois,
            &source(),
            &params(),
            &mut reports,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(emitted, 0);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_groups_absent_from_data_sets_get_no_report() {
        // Large enough as a list, but only one name exists in the data sets
        let gois = vec![GenesOfInterest::new("absent", ["g0", "x1", "x2"])];
        let mut reports: Vec<RankingReport> = Vec::new();
        let emitted = run_species(
            &species(),
            &gois,
            &source(),
            &params(),
            &mut reports,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_cancelled_run() {
        let cancel = CancellationToken::new();
        let clone = cancel.clone();
        clone.cancel();
        assert!(cancel.is_cancelled());

        let gois = vec![GenesOfInterest::new("module0", ["g0", "g2", "g3"])];
        let mut reports: Vec<RankingReport> = Vec::new();
        let result = run_species(&species(), &gois, &source(), &params(), &mut reports, &cancel);
        assert!(matches!(result, Err(MorphError::Cancelled)));
    }

    #[test]
    fn test_cancelled_between_offers() {
        let source = source();
        let expression = source
            .load_expression(&species().expression_matrices[0])
            .unwrap();
        let universe = Arc::clone(expression.universe());
        let group = GenesOfInterest::new("module0", ["g0", "g2", "g3"]).resolve(&universe);
        let correlations = CorrelationMatrix::compute(expression, group.genes()).unwrap();
        let clustering = source
            .load_clustering(&species().expression_matrices[0].clusterings[0], universe)
            .unwrap();

        let mut selector = RankingSelector::new(2);
        let cancel = CancellationToken::new();
        let groups = vec![group];
        rank_clustering(&species(), &groups, &clustering, &correlations, &mut selector, &cancel).unwrap();
        assert_eq!(selector.result(0).map(|r| r.n_rankings()), Some(1));

        cancel.cancel();
        let result = rank_clustering(&species(), &groups, &clustering, &correlations, &mut selector, &cancel);
        assert!(matches!(result, Err(MorphError::Cancelled)));
        assert_eq!(selector.result(0).map(|r| r.n_rankings()), Some(1));
    }

    #[test]
    fn test_run_validates_gene_names() {
        let config = Config::from_yaml_str(
            "
species:
  - name: strict
    gene_pattern: 'g[0-9]+'
",
        )
        .unwrap();
        let jobs = JobList::from_yaml_str(
            "
jobs:
  - species_name: strict
    genes_of_interest:
      - {name: bad, genes: [g1, g2, bogus]}
",
        )
        .unwrap();
        let mut reports: Vec<RankingReport> = Vec::new();
        let result = run(
            &config,
            &jobs,
            &source(),
            &RankingParams::default(),
            &mut reports,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(MorphError::InvalidGeneName { .. })));
    }
}
