//! Command-line interface for rust_morph

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rust_morph")]
#[command(version)]
#[command(about = "Co-expression based candidate gene ranking")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank candidate genes for every job
    #[command(
        about = "Rank candidate genes for every job",
        long_about = "Rank candidate genes for every job\n\n\
            For each species in the job list, every group of genes of interest is\n\
            ranked against every (expression matrix, clustering) combination of the\n\
            species. The ranking with the highest AUSR is written per group, along\n\
            with the average AUSR over all combinations.",
        after_long_help = "\
Examples:
  # Plain text reports, top 100 candidates
  rust_morph run -c config.yaml -j jobs.yaml -o rankings --top-k 100

  # YAML reports on 8 threads
  rust_morph run -c config.yaml -j jobs.yaml -o rankings --format yaml -t 8

  # With p-values from random gene sets
  rust_morph run -c config.yaml -j jobs.yaml --null null.csv --fdr 0.01"
    )]
    Run {
        /// Path to species configuration YAML
        #[arg(short, long,
            long_help = "Path to species configuration YAML.\n\
                Lists species with their expression matrices, clusterings and\n\
                optional gene descriptions.")]
        config: String,

        /// Path to job list YAML
        #[arg(short, long,
            long_help = "Path to job list YAML.\n\
                Lists groups of genes of interest per species, inline or as files of\n\
                names separated by whitespace or commas.")]
        jobs: String,

        /// Output directory [default: rankings]
        #[arg(short, long, default_value = "rankings")]
        output: String,

        /// Maximum number of candidates per report (0 = all) [default: 0]
        #[arg(short = 'k', long, default_value = "0")]
        top_k: usize,

        /// Report format [default: text]
        #[arg(short, long, default_value = "text",
            long_help = "Report format.\n\
                text: plain text with a tab-separated candidate table\n\
                yaml: YAML document\n\
                json: JSON document")]
        format: String,

        /// Minimum number of genes of interest [default: 5]
        #[arg(long, default_value = "5",
            long_help = "Minimum number of genes of interest.\n\
                Groups with fewer genes are dropped; combinations where fewer genes\n\
                of the group are present in the expression matrix are skipped.")]
        min_support: usize,

        /// Random gene set results for p-values (CSV with size and AUSR columns)
        #[arg(long,
            long_help = "Random gene set results for p-values.\n\
                CSV with 'size' and 'AUSR' columns, as written by `random-baits`.\n\
                Each report then gets an empirical p-value, and the summary\n\
                Benjamini-Hochberg corrected p-values.")]
        null: Option<String>,

        /// False discovery rate for counting significant groups [default: 0.05]
        #[arg(long, default_value = "0.05")]
        fdr: f64,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Build a null distribution of AUSRs from random gene sets
    #[command(
        name = "random-baits",
        long_about = "Build a null distribution of AUSRs from random gene sets.\n\n\
            For every gene set size in [min-size, max-size), random gene sets are\n\
            drawn from the genes of a randomly chosen expression matrix of the\n\
            species and ranked like groups of genes of interest. The best AUSR of\n\
            each set is written as a `size,AUSR` row.",
        after_long_help = "\
Examples:
  # 100 random sets for each size from 5 to 49
  rust_morph random-baits -c config.yaml --min-size 5 --max-size 50 -o null.csv

  # Sample only from expressed genes, fixed seed
  rust_morph random-baits -c config.yaml --max-size 20 --background expressed.txt --seed 1"
    )]
    RandomBaits {
        /// Path to species configuration YAML
        #[arg(short, long)]
        config: String,

        /// Species to sample from [default: first in configuration]
        #[arg(short, long)]
        species: Option<String>,

        /// Smallest gene set size [default: 5]
        #[arg(long, default_value = "5")]
        min_size: usize,

        /// Largest gene set size, exclusive
        #[arg(long)]
        max_size: usize,

        /// Random gene sets per size [default: 100]
        #[arg(short = 'n', long, default_value = "100")]
        per_size: usize,

        /// File of genes to sample from, first word per line
        #[arg(short, long)]
        background: Option<String>,

        /// Random seed [default: 42]
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Minimum number of genes of interest [default: 5]
        #[arg(long, default_value = "5")]
        min_support: usize,

        /// Output file path [default: random_baits.csv]
        #[arg(short, long, default_value = "random_baits.csv")]
        output: String,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Write correlations against a set of genes
    #[command(
        long_about = "Write correlations against a set of genes.\n\n\
            Computes the Pearson correlation of every gene of an expression matrix\n\
            with each of the given genes and writes a gene x gene table.",
        after_long_help = "\
Examples:
  rust_morph correlate -e seedling.tsv -g at1g01010,at1g01020 -o correlations.tsv"
    )]
    Correlate {
        /// Path to expression matrix TSV file
        #[arg(short, long)]
        expression: String,

        /// Comma-separated gene names
        #[arg(short, long, value_delimiter = ',')]
        genes: Vec<String>,

        /// Output file path [default: correlations.tsv]
        #[arg(short, long, default_value = "correlations.tsv")]
        output: String,
    },
}
