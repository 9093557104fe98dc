//! rust_morph: co-expression based candidate gene ranking
//!
//! Given groups of genes of interest, ranks every other gene of an expression
//! data set by its co-expression with the group, within the clusters of a
//! clustering. Each (data set, clustering) combination is scored by how well
//! it recovers the group's own genes when they are held out one at a time
//! (the AUSR); the best combination is reported per group.
//!
//! # Example
//!
//! ```ignore
//! use rust_morph::prelude::*;
//!
//! let config = Config::from_yaml("config.yaml")?;
//! let jobs = JobList::from_yaml("jobs.yaml")?;
//! let mut sink = DirectoryReportSink::new("rankings", ReportFormat::Text)?;
//!
//! rust_morph::pipeline::run(
//!     &config,
//!     &jobs,
//!     &FileDatasetSource,
//!     &RankingParams::default(),
//!     &mut sink,
//!     &CancellationToken::new(),
//! )?;
//! ```

pub mod cli;
pub mod config;
pub mod correlation;
pub mod data;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod ranking;
pub mod selection;
pub mod significance;
pub mod stats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ClusteringSpec, Config, ExpressionSpec, GoiSource, GoiSpec, JobList, SpeciesSpec};
    pub use crate::correlation::CorrelationMatrix;
    pub use crate::data::{
        Cluster, Clustering, ClusteringBuilder, ExpressionMatrix, GeneDescriptions, GeneUniverse,
        GenesOfInterest, GoiGroup,
    };
    pub use crate::error::{MorphError, Result};
    pub use crate::io::{
        read_background_set, read_clustering, read_expression_matrix, read_gene_descriptions,
        read_genes_of_interest, read_null_distribution, write_correlations,
        write_null_distribution, write_summary, DirectoryReportSink, FileDatasetSource,
        RankingReport, ReportFormat, ReportSink,
    };
    pub use crate::pipeline::{CancellationToken, DatasetSource, RankingParams};
    pub use crate::ranking::{RankedGene, Ranking, Score, ScoreVector};
    pub use crate::selection::{GoiResult, RankingSelector};
    pub use crate::significance::{
        benjamini_hochberg, random_baits, NullDistribution, RandomBaitParams, SummaryRow,
        SummarySink, SummaryTable,
    };
}

use std::path::Path;

use prelude::*;

/// Name of the run summary in the output directory
pub const SUMMARY_FILE: &str = "summary.tsv";

/// Load the configuration and job list from YAML files, rank every job and
/// write the reports to `output_dir`.
///
/// With a null distribution of random gene set AUSRs, every report gets an
/// empirical p-value. The summary of all reports, with Benjamini-Hochberg
/// corrected p-values, is written to [`SUMMARY_FILE`] and returned.
pub fn run_from_files<P: AsRef<Path>>(
    config_path: P,
    jobs_path: P,
    output_dir: P,
    format: ReportFormat,
    params: &RankingParams,
    null: Option<&NullDistribution>,
    cancel: &CancellationToken,
) -> Result<SummaryTable> {
    let config = Config::from_yaml(config_path)?;
    let jobs = JobList::from_yaml(jobs_path)?;
    let summary_path = output_dir.as_ref().join(SUMMARY_FILE);
    let mut reports = DirectoryReportSink::new(output_dir, format)?;

    let mut sink = SummarySink::new(&mut reports, null);
    pipeline::run(&config, &jobs, &FileDatasetSource, params, &mut sink, cancel)?;
    let summary = sink.finish();

    write_summary(&summary_path, &summary)?;
    log::info!("Wrote {}", summary_path.display());
    Ok(summary)
}
