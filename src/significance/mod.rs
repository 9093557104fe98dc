//! Significance of AUSR values
//!
//! Random gene sets of each size in a range are ranked like real groups of
//! genes of interest ("random baits"); their best AUSRs form a null
//! distribution per set size. A group's best AUSR is compared against the
//! random sets of its size to get an empirical p-value, and the p-values of
//! all groups of a run are corrected with Benjamini-Hochberg.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::SpeciesSpec;
use crate::data::GenesOfInterest;
use crate::error::{MorphError, Result};
use crate::io::{RankingReport, ReportSink};
use crate::pipeline::{run_species, CancellationToken, DatasetSource, RankingParams};

/// False discovery rate at which groups count as significant
pub const DEFAULT_FDR_LEVEL: f64 = 0.05;

/// Best AUSRs of random gene sets, per set size
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullDistribution {
    /// Set size -> AUSRs, ascending
    by_size: BTreeMap<usize, Vec<f64>>,
}

impl NullDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, size: usize, ausr: f64) {
        let samples = self.by_size.entry(size).or_default();
        let at = samples.partition_point(|&v| v <= ausr);
        samples.insert(at, ausr);
    }

    /// Set sizes with at least one sample, ascending
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_size.keys().copied()
    }

    /// AUSRs of random sets of `size`, ascending
    pub fn samples(&self, size: usize) -> &[f64] {
        self.by_size.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_size(&self) -> Option<usize> {
        self.by_size.keys().next_back().copied()
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.by_size.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_size.is_empty()
    }

    /// `(size, ausr)` for every sample, by size
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.by_size
            .iter()
            .flat_map(|(&size, samples)| samples.iter().map(move |&a| (size, a)))
    }

    /// Fraction of random sets of `n` genes whose AUSR is strictly higher
    /// than `ausr`.
    ///
    /// Sets larger than any random set are compared against the largest
    /// random sets, which overestimates the p-value. `None` when there are no
    /// random sets of the size looked up.
    pub fn p_value(&self, n: usize, ausr: f64) -> Option<f64> {
        let size = n.min(self.max_size()?);
        let samples = self.by_size.get(&size)?;
        if samples.is_empty() {
            return None;
        }
        let above = samples.len() - samples.partition_point(|&v| v <= ausr);
        Some(above as f64 / samples.len() as f64)
    }
}

/// Benjamini-Hochberg adjusted p-values. Missing p-values stay missing and
/// do not count as tests.
pub fn benjamini_hochberg(p_values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut order: Vec<usize> = (0..p_values.len())
        .filter(|&i| p_values[i].map_or(false, |p| !p.is_nan()))
        .collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });

    let m = order.len() as f64;
    let mut adjusted = vec![None; p_values.len()];
    let mut cummin = f64::INFINITY;

    for (rank, &i) in order.iter().enumerate().rev() {
        if let Some(p) = p_values[i] {
            cummin = cummin.min((p * m / (rank + 1) as f64).min(1.0));
            adjusted[i] = Some(cummin);
        }
    }

    adjusted
}

/// One line of a run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub species: String,
    pub group: String,
    #[serde(rename = "AUSR")]
    pub ausr: f64,
    pub genes_in_data: usize,
    pub genes_missing: usize,
    pub candidates: usize,
    #[serde(rename = "p-value")]
    pub p_value: Option<f64>,
    #[serde(rename = "BH-corrected")]
    pub bh_corrected: Option<f64>,
}

/// Summary of all groups of a run, most significant first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Correct the p-values of `rows` and sort by p-value; rows without one
    /// go last, in their original order
    pub fn new(mut rows: Vec<SummaryRow>) -> Self {
        let p_values: Vec<Option<f64>> = rows.iter().map(|r| r.p_value).collect();
        for (row, adjusted) in rows.iter_mut().zip(benjamini_hochberg(&p_values)) {
            row.bh_corrected = adjusted;
        }
        rows.sort_by(|a, b| match (a.p_value, b.p_value) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Groups whose corrected p-value is below `fdr_level`
    pub fn n_significant(&self, fdr_level: f64) -> usize {
        self.rows
            .iter()
            .filter(|r| r.bh_corrected.map_or(false, |p| p < fdr_level))
            .count()
    }
}

/// Report sink that attaches p-values and records a summary row per report
/// before passing it on
pub struct SummarySink<'a, R: ReportSink + ?Sized> {
    inner: &'a mut R,
    null: Option<&'a NullDistribution>,
    rows: Vec<SummaryRow>,
}

impl<'a, R: ReportSink + ?Sized> SummarySink<'a, R> {
    pub fn new(inner: &'a mut R, null: Option<&'a NullDistribution>) -> Self {
        Self {
            inner,
            null,
            rows: Vec::new(),
        }
    }

    pub fn finish(self) -> SummaryTable {
        SummaryTable::new(self.rows)
    }
}

impl<R: ReportSink + ?Sized> ReportSink for SummarySink<'_, R> {
    fn emit(&mut self, mut report: RankingReport) -> Result<()> {
        let genes_in_data = report.goi_genes_present.len();
        report.p_value = self
            .null
            .and_then(|null| null.p_value(genes_in_data, report.best_ausr));

        self.rows.push(SummaryRow {
            species: report.species.clone(),
            group: report.goi_name.clone(),
            ausr: report.best_ausr,
            genes_in_data,
            genes_missing: report.goi_genes_missing.len(),
            candidates: report.candidates.len(),
            p_value: report.p_value,
            bh_corrected: None,
        });
        self.inner.emit(report)
    }
}

/// Settings of a random gene set run
#[derive(Debug, Clone, PartialEq)]
pub struct RandomBaitParams {
    /// Gene set sizes, end exclusive
    pub sizes: Range<usize>,
    /// Random gene sets per size
    pub per_size: usize,
    pub seed: u64,
    /// Only sample from these genes (lower-case), if given
    pub background: Option<HashSet<String>>,
}

/// Rank random gene sets of every size in `baits.sizes` against all data
/// sets of `species` and collect their best AUSRs.
///
/// Each set is drawn without replacement from the genes of one randomly
/// chosen expression matrix, restricted to the background set if one is
/// given. AUSRs are recorded under the number of genes present in the data
/// set of the best ranking.
pub fn random_baits<S>(
    species: &SpeciesSpec,
    source: &S,
    params: &RankingParams,
    baits: &RandomBaitParams,
    cancel: &CancellationToken,
) -> Result<NullDistribution>
where
    S: DatasetSource + ?Sized,
{
    if baits.sizes.is_empty() || baits.per_size == 0 {
        return Err(MorphError::InvalidConfig {
            reason: format!(
                "no random gene sets to draw: sizes {}..{}, {} per size",
                baits.sizes.start, baits.sizes.end, baits.per_size
            ),
        });
    }
    if baits.sizes.start < params.min_support {
        return Err(MorphError::InvalidConfig {
            reason: format!(
                "random gene sets need at least {} genes, got a minimum size of {}",
                params.min_support, baits.sizes.start
            ),
        });
    }

    let mut pools: Vec<(String, Vec<String>)> = Vec::with_capacity(species.expression_matrices.len());
    for spec in &species.expression_matrices {
        cancel.check()?;
        let expression = source.load_expression(spec)?;
        let genes: Vec<String> = expression
            .universe()
            .names()
            .iter()
            .filter(|g| baits.background.as_ref().map_or(true, |b| b.contains(g.as_str())))
            .cloned()
            .collect();
        debug!("{}: {} genes to sample from", spec.name, genes.len());
        pools.push((spec.name.clone(), genes));
    }

    let mut rng = StdRng::seed_from_u64(baits.seed);
    let mut null = NullDistribution::new();
    let ranking_params = RankingParams {
        top_k: Some(0),
        ..*params
    };

    for size in baits.sizes.clone() {
        cancel.check()?;
        let mut gois = Vec::with_capacity(baits.per_size);
        for j in 0..baits.per_size {
            let (name, pool) = pools.choose(&mut rng).ok_or_else(|| MorphError::InvalidConfig {
                reason: format!("species {} has no expression matrices", species.name),
            })?;
            if pool.len() < size {
                return Err(MorphError::InvalidConfig {
                    reason: format!(
                        "{}: only {} genes to sample from, cannot draw {}",
                        name,
                        pool.len(),
                        size
                    ),
                });
            }
            let genes = pool.choose_multiple(&mut rng, size);
            gois.push(GenesOfInterest::new(format!("random {} {}", size, j), genes));
        }

        let mut reports: Vec<RankingReport> = Vec::new();
        run_species(species, &gois, source, &ranking_params, &mut reports, cancel)?;
        for report in &reports {
            null.push(report.goi_genes_present.len(), report.best_ausr);
        }
        info!(
            "{}: ranked {} random gene sets of size {}",
            species.name,
            reports.len(),
            size
        );
    }

    Ok(null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::io::FileDatasetSource;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn null() -> NullDistribution {
        let mut null = NullDistribution::new();
        for ausr in [0.9, 0.1, 0.5, 0.3] {
            null.push(5, ausr);
        }
        for ausr in [0.2, 0.6] {
            null.push(6, ausr);
        }
        null
    }

    #[test]
    fn test_samples_kept_sorted() {
        let null = null();
        assert_eq!(null.samples(5), &[0.1, 0.3, 0.5, 0.9]);
        assert_eq!(null.len(), 6);
        assert_eq!(null.max_size(), Some(6));
        assert_eq!(null.sizes().collect::<Vec<_>>(), vec![5, 6]);
        assert!(null.samples(7).is_empty());
    }

    #[test]
    fn test_p_value_counts_strictly_higher() {
        let null = null();
        assert_eq!(null.p_value(5, 0.4), Some(0.5));
        assert_eq!(null.p_value(5, 0.5), Some(0.25));
        assert_eq!(null.p_value(5, 0.95), Some(0.0));
        assert_eq!(null.p_value(5, 0.0), Some(1.0));
    }

    #[test]
    fn test_p_value_falls_back_to_largest_size() {
        let null = null();
        // 40 genes: compared against the sets of 6
        assert_eq!(null.p_value(40, 0.3), Some(0.5));
        assert_eq!(null.p_value(40, 0.7), Some(0.0));
        // Smaller than any random set
        assert_eq!(null.p_value(4, 0.3), None);
        assert_eq!(NullDistribution::new().p_value(5, 0.3), None);
    }

    #[test]
    fn test_benjamini_hochberg() {
        let p = [Some(0.01), Some(0.04), Some(0.03), Some(0.5)];
        let adjusted: Vec<f64> = benjamini_hochberg(&p).into_iter().map(|q| q.unwrap()).collect();
        let expected = [0.04, 0.16 / 3.0, 0.16 / 3.0, 0.5];
        for (a, e) in adjusted.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-12, "{} vs {}", a, e);
        }
    }

    #[test]
    fn test_benjamini_hochberg_skips_missing_and_caps() {
        let p = [Some(0.9), None, Some(0.8)];
        let adjusted = benjamini_hochberg(&p);
        assert_eq!(adjusted[1], None);
        assert!((adjusted[0].unwrap() - 0.9).abs() < 1e-12);
        assert!((adjusted[2].unwrap() - 0.9).abs() < 1e-12);
        assert!(benjamini_hochberg(&[]).is_empty());
        assert_eq!(benjamini_hochberg(&[Some(1.0), Some(1.0)]), vec![Some(1.0), Some(1.0)]);
    }

    fn report(group: &str, ausr: f64, present: usize) -> RankingReport {
        RankingReport {
            species: "sp".to_string(),
            goi_name: group.to_string(),
            best_ausr: ausr,
            average_ausr: ausr,
            gene_expression_name: "e".to_string(),
            clustering_name: "c".to_string(),
            goi_genes_present: (0..present).map(|i| format!("g{}", i)).collect(),
            goi_genes_missing: vec!["gx".to_string()],
            p_value: None,
            candidates: Vec::new(),
        }
    }

    #[test]
    fn test_summary_sink_attaches_p_values() {
        let null = null();
        let mut reports: Vec<RankingReport> = Vec::new();
        let mut sink = SummarySink::new(&mut reports, Some(&null));
        sink.emit(report("weak", 0.2, 5)).unwrap();
        sink.emit(report("strong", 0.95, 5)).unwrap();
        sink.emit(report("big", 0.4, 12)).unwrap();
        let summary = sink.finish();

        assert_eq!(reports[0].p_value, Some(0.75));
        assert_eq!(reports[1].p_value, Some(0.0));
        assert_eq!(reports[2].p_value, Some(0.5));

        let groups: Vec<&str> = summary.rows().iter().map(|r| r.group.as_str()).collect();
        assert_eq!(groups, vec!["strong", "big", "weak"]);
        assert_eq!(summary.rows()[0].bh_corrected, Some(0.0));
        assert_eq!(summary.rows()[2].bh_corrected, Some(0.75));
        assert_eq!(summary.rows()[1].genes_missing, 1);
        assert_eq!(summary.n_significant(DEFAULT_FDR_LEVEL), 1);
    }

    #[test]
    fn test_summary_without_null() {
        let mut reports: Vec<RankingReport> = Vec::new();
        let mut sink = SummarySink::new(&mut reports, None);
        sink.emit(report("a", 0.5, 5)).unwrap();
        let summary = sink.finish();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.rows()[0].p_value, None);
        assert_eq!(summary.rows()[0].bh_corrected, None);
        assert_eq!(summary.n_significant(1.0), 0);
        assert_eq!(reports[0].p_value, None);
    }

    /// One data set of 15 genes in three modules of five, clustered by module
    fn write_species(dir: &Path) -> SpeciesSpec {
        let mut content = String::from("gene");
        for k in 0..10 {
            content.push_str(&format!("\ts{}", k));
        }
        content.push('\n');
        let mut clustering = String::new();
        for i in 0..15 {
            content.push_str(&format!("g{}", i));
            let module = i / 5;
            for k in 0..10 {
                let value = ((k as f64) * (1.0 + module as f64)).sin() * (1.0 + 0.2 * i as f64)
                    + 0.01 * ((i * 5 + k * 7) % 11) as f64;
                content.push_str(&format!("\t{:.6}", value));
            }
            content.push('\n');
            clustering.push_str(&format!("g{}\tm{}\n", i, module));
        }
        fs::write(dir.join("expr.tsv"), content).unwrap();
        fs::write(dir.join("modules.tsv"), clustering).unwrap();

        let config = Config::from_yaml_str(&format!(
            "
species_data_path: {}
species:
  - name: test
    expression_matrices:
      - name: expr
        path: expr.tsv
        clusterings:
          - {{name: modules, path: modules.tsv}}
",
            dir.display()
        ))
        .unwrap();
        config.species[0].clone()
    }

    fn baits(sizes: Range<usize>) -> RandomBaitParams {
        RandomBaitParams {
            sizes,
            per_size: 3,
            seed: 7,
            background: None,
        }
    }

    #[test]
    fn test_random_baits_fill_every_size() {
        let dir = tempdir().unwrap();
        let species = write_species(dir.path());
        let params = RankingParams::default();
        let cancel = CancellationToken::new();

        let null = random_baits(&species, &FileDatasetSource, &params, &baits(5..7), &cancel).unwrap();
        assert_eq!(null.sizes().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(null.samples(5).len(), 3);
        assert_eq!(null.samples(6).len(), 3);
        assert!(null.iter().all(|(_, a)| (0.0..=1.0).contains(&a)));

        // Same seed, same draws
        let again = random_baits(&species, &FileDatasetSource, &params, &baits(5..7), &cancel).unwrap();
        assert_eq!(null, again);
    }

    #[test]
    fn test_random_baits_rejects_bad_sizes() {
        let dir = tempdir().unwrap();
        let species = write_species(dir.path());
        let params = RankingParams::default();
        let cancel = CancellationToken::new();

        let result = random_baits(&species, &FileDatasetSource, &params, &baits(3..6), &cancel);
        assert!(matches!(result, Err(MorphError::InvalidConfig { .. })));
        let result = random_baits(&species, &FileDatasetSource, &params, &baits(6..6), &cancel);
        assert!(matches!(result, Err(MorphError::InvalidConfig { .. })));

        // Five background genes cannot fill a set of six
        let mut limited = baits(6..7);
        limited.background = Some((0..5).map(|i| format!("g{}", i)).collect());
        let result = random_baits(&species, &FileDatasetSource, &params, &limited, &cancel);
        assert!(matches!(result, Err(MorphError::InvalidConfig { .. })));
    }
}
