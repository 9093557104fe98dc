//! Tab-separated readers and writers for expression data, clusterings,
//! genes of interest and gene descriptions

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, warn};
use ndarray::Array2;

use crate::config::{ClusteringSpec, ExpressionSpec, GoiSource, GoiSpec};
use crate::correlation::CorrelationMatrix;
use crate::data::{Clustering, ExpressionMatrix, GeneDescriptions, GeneUniverse, GenesOfInterest};
use crate::error::{MorphError, Result};
use crate::pipeline::DatasetSource;
use crate::significance::SummaryTable;

fn tab_reader<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(BufReader::new(file)))
}

pub(super) fn line_of(record: &StringRecord) -> usize {
    record.position().map_or(0, |p| p.line() as usize)
}

pub(super) fn parse_error(path: &Path, line: usize, reason: impl Into<String>) -> MorphError {
    MorphError::Parse {
        path: path.display().to_string(),
        line,
        reason: reason.into(),
    }
}

/// Read an expression matrix.
///
/// Expected format: a header row whose first cell is ignored and whose other
/// cells name the samples, then one row per gene: the gene name followed by
/// one value per sample.
pub fn read_expression_matrix<P: AsRef<Path>>(path: P, name: &str) -> Result<ExpressionMatrix> {
    let path = path.as_ref();
    let mut reader = tab_reader(path, true)?;

    let n_samples = reader.headers()?.len().saturating_sub(1);
    if n_samples == 0 {
        return Err(MorphError::InvalidExpressionMatrix {
            reason: format!("{}: header names no samples", path.display()),
        });
    }

    let mut genes: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        if record.len() != n_samples + 1 {
            return Err(parse_error(
                path,
                line,
                format!("expected {} columns, got {}", n_samples + 1, record.len()),
            ));
        }

        genes.push(record[0].to_string());
        for field in record.iter().skip(1) {
            let value = field
                .parse::<f64>()
                .map_err(|_| parse_error(path, line, format!("invalid expression value: {}", field)))?;
            values.push(value);
        }
    }

    if genes.is_empty() {
        return Err(MorphError::InvalidExpressionMatrix {
            reason: format!("{}: no genes", path.display()),
        });
    }

    let values = Array2::from_shape_vec((genes.len(), n_samples), values)
        .map_err(|e| MorphError::invariant(format!("expression matrix shape: {}", e)))?;
    ExpressionMatrix::new(name, &genes, values)
}

/// Read a clustering of `universe`.
///
/// Expected format: `gene<TAB>cluster` per line, no header. Genes the
/// universe lacks are skipped with a warning; genes the file does not assign
/// end up in the catch-all cluster.
pub fn read_clustering<P: AsRef<Path>>(
    path: P,
    name: &str,
    universe: Arc<GeneUniverse>,
) -> Result<Clustering> {
    let path = path.as_ref();
    let mut reader = tab_reader(path, false)?;
    let mut builder = Clustering::builder(name, universe);
    let mut missing = 0usize;

    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            return Err(parse_error(
                path,
                line_of(&record),
                "expected gene and cluster columns",
            ));
        }
        if !builder.add_named(&record[1], &record[0])? {
            missing += 1;
        }
    }

    if missing > 0 {
        warn!(
            "{}: {} genes in clustering not present in expression matrix",
            name, missing
        );
    }

    let clustering = builder.build();
    debug!("{}: {} clusters", name, clustering.n_clusters());
    Ok(clustering)
}

/// Read a file of gene names separated by whitespace or commas
pub fn read_genes_of_interest<P: AsRef<Path>>(path: P, name: &str) -> Result<GenesOfInterest> {
    let content = std::fs::read_to_string(path)?;
    let genes = content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|g| !g.is_empty());
    Ok(GenesOfInterest::new(name, genes))
}

/// Read a background gene set: the first word of every non-empty line
pub fn read_background_set<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|gene| gene.to_lowercase())
        .collect())
}

/// Read `gene<TAB>description` lines
pub fn read_gene_descriptions<P: AsRef<Path>>(path: P) -> Result<GeneDescriptions> {
    let path = path.as_ref();
    let mut reader = tab_reader(path, false)?;
    let mut descriptions = GeneDescriptions::new();

    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            return Err(parse_error(
                path,
                line_of(&record),
                "expected gene and description columns",
            ));
        }
        if !descriptions.insert(&record[0], &record[1]) {
            warn!("Found multiple descriptions for: {}", &record[0]);
        }
    }

    Ok(descriptions)
}

/// Write the gene x target correlation table
pub fn write_correlations<P: AsRef<Path>>(path: P, correlations: &CorrelationMatrix) -> Result<()> {
    let universe = correlations.universe();
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;

    let mut header = vec!["gene".to_string()];
    for &target in correlations.targets() {
        header.push(universe.name(target).unwrap_or_default().to_string());
    }
    writer.write_record(&header)?;

    let values = correlations.values();
    for (gene, row) in universe.names().iter().zip(values.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(gene.clone());
        record.extend(row.iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a run summary, one row per reported group
pub fn write_summary<P: AsRef<Path>>(path: P, summary: &SummaryTable) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    for row in summary.rows() {
        writer.serialize(row)?;
    }
    if summary.is_empty() {
        writer.write_record([
            "species",
            "group",
            "AUSR",
            "genes_in_data",
            "genes_missing",
            "candidates",
            "p-value",
            "BH-corrected",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads data sets from the files named in the configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDatasetSource;

impl DatasetSource for FileDatasetSource {
    fn load_expression(&self, spec: &ExpressionSpec) -> Result<ExpressionMatrix> {
        read_expression_matrix(&spec.path, &spec.name)
    }

    fn load_clustering(&self, spec: &ClusteringSpec, universe: Arc<GeneUniverse>) -> Result<Clustering> {
        read_clustering(&spec.path, &spec.name, universe)
    }

    fn load_genes_of_interest(&self, spec: &GoiSpec) -> Result<GenesOfInterest> {
        match &spec.source {
            GoiSource::Inline { genes } => Ok(GenesOfInterest::new(spec.name.as_str(), genes)),
            GoiSource::File { path } => read_genes_of_interest(path, &spec.name),
        }
    }

    fn load_gene_descriptions(&self, path: &Path) -> Result<GeneDescriptions> {
        read_gene_descriptions(path)
    }
}
