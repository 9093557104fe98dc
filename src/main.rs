//! rust_morph command-line interface

use clap::Parser;
use log::{info, LevelFilter};

use rust_morph::cli::{Cli, Commands};
use rust_morph::prelude::*;
use rust_morph::run_from_files;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["run", "random-baits", "correlate", "help"];
    let has_subcommand = first_positional
        .map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("rust_morph {}", VERSION);
            return;
        }
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            config,
            jobs,
            output,
            top_k,
            format,
            min_support,
            null,
            fdr,
            threads,
        }) => run_jobs(
            &config,
            &jobs,
            &output,
            top_k,
            &format,
            min_support,
            null.as_deref(),
            fdr,
            threads,
        ),
        Some(Commands::RandomBaits {
            config,
            species,
            min_size,
            max_size,
            per_size,
            background,
            seed,
            min_support,
            output,
            threads,
        }) => {
            let baits = RandomBaitArgs {
                species: species.as_deref(),
                min_size,
                max_size,
                per_size,
                background: background.as_deref(),
                seed,
                min_support,
            };
            run_random_baits(&config, &baits, &output, threads)
        }
        Some(Commands::Correlate {
            expression,
            genes,
            output,
        }) => run_correlate(&expression, &genes, &output),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("rust_morph v{}", VERSION);
    println!("Run `rust_morph -h` for usage or `rust_morph --help` for detailed information.");
}

fn print_short_help() {
    println!("rust_morph v{}", VERSION);
    println!();
    println!("Usage: rust_morph <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run           Rank candidate genes for every job");
    println!("  random-baits  Build a null distribution from random gene sets");
    println!("  correlate     Write correlations against a set of genes");
    println!();
    println!("Run `rust_morph <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("rust_morph v{}", VERSION);
    println!("Co-expression based candidate gene ranking");
    println!();
    println!("Usage: rust_morph <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run           Rank candidate genes for every job");
    println!("                  - every expression matrix x clustering combination");
    println!("                  - leave-one-out self-evaluation (AUSR)");
    println!("                  - best ranking and average AUSR per gene group");
    println!("                  - text, YAML or JSON reports and a summary table");
    println!("                  - empirical p-values with BH correction (--null)");
    println!("  random-baits  Build a null distribution from random gene sets");
    println!("  correlate     Write correlations against a set of genes");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  rust_morph run -c config.yaml -j jobs.yaml -o rankings --top-k 100");
    println!();
    println!("  rust_morph run -c config.yaml -j jobs.yaml -o rankings --format yaml -t 8");
    println!();
    println!("  rust_morph random-baits -c config.yaml --max-size 50 -o null.csv");
    println!("  rust_morph run -c config.yaml -j jobs.yaml --null null.csv");
    println!();
    println!("  rust_morph correlate -e seedling.tsv -g at1g01010,at1g01020 -o correlations.tsv");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn init_thread_pool(threads: usize) {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }
}

fn check_min_support(min_support: usize) -> Result<()> {
    if min_support == 0 {
        return Err(MorphError::InvalidConfig {
            reason: "--min-support must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn run_jobs(
    config_path: &str,
    jobs_path: &str,
    output_dir: &str,
    top_k: usize,
    format: &str,
    min_support: usize,
    null_path: Option<&str>,
    fdr: f64,
    threads: usize,
) -> Result<()> {
    init_thread_pool(threads);

    let format: ReportFormat = format.parse()?;
    check_min_support(min_support)?;
    if !(fdr > 0.0 && fdr <= 1.0) {
        return Err(MorphError::InvalidConfig {
            reason: format!("--fdr must be in (0, 1], got {}", fdr),
        });
    }

    let null = match null_path {
        Some(path) => {
            info!("Loading random gene set results from: {}", path);
            let null = read_null_distribution(path)?;
            info!("  {} results over {} set sizes", null.len(), null.sizes().count());
            Some(null)
        }
        None => None,
    };

    let params = RankingParams {
        min_support,
        top_k: (top_k > 0).then_some(top_k),
    };

    info!("Running jobs from {} against {}", jobs_path, config_path);
    let summary = run_from_files(
        config_path,
        jobs_path,
        output_dir,
        format,
        &params,
        null.as_ref(),
        &CancellationToken::new(),
    )?;
    info!("Wrote {} rankings to {}", summary.len(), output_dir);
    if null.is_some() {
        info!(
            "{} of {} gene sets significant at FDR {}",
            summary.n_significant(fdr),
            summary.len(),
            fdr
        );
    }
    Ok(())
}

struct RandomBaitArgs<'a> {
    species: Option<&'a str>,
    min_size: usize,
    max_size: usize,
    per_size: usize,
    background: Option<&'a str>,
    seed: u64,
    min_support: usize,
}

fn run_random_baits(config_path: &str, args: &RandomBaitArgs<'_>, output_path: &str, threads: usize) -> Result<()> {
    init_thread_pool(threads);
    check_min_support(args.min_support)?;

    let config = Config::from_yaml(config_path)?;
    let species = match args.species {
        Some(name) => config.species(name),
        None => config.species.first(),
    }
    .ok_or_else(|| MorphError::InvalidConfig {
        reason: format!("Unknown species: {}", args.species.unwrap_or("<none configured>")),
    })?;

    let background = match args.background {
        Some(path) => {
            let genes = read_background_set(path)?;
            info!("Sampling from {} background genes", genes.len());
            Some(genes)
        }
        None => None,
    };

    let baits = RandomBaitParams {
        sizes: args.min_size..args.max_size,
        per_size: args.per_size,
        seed: args.seed,
        background,
    };
    let params = RankingParams {
        min_support: args.min_support,
        top_k: None,
    };

    info!(
        "{}: {} random gene sets per size, sizes {}..{}",
        species.name, args.per_size, args.min_size, args.max_size
    );
    let null = random_baits(species, &FileDatasetSource, &params, &baits, &CancellationToken::new())?;
    write_null_distribution(output_path, &null)?;
    info!("Random gene set results written to: {}", output_path);
    Ok(())
}

fn run_correlate(expression_path: &str, genes: &[String], output_path: &str) -> Result<()> {
    info!("Loading expression matrix from: {}", expression_path);
    let expression = read_expression_matrix(expression_path, expression_path)?;
    info!("  {} genes, {} samples", expression.n_genes(), expression.n_samples());

    let universe = expression.universe().clone();
    let mut targets = Vec::with_capacity(genes.len());
    for gene in genes {
        match universe.index_of(gene) {
            Some(idx) => targets.push(idx),
            None => log::warn!("Gene not in expression matrix: {}", gene),
        }
    }
    if targets.is_empty() {
        return Err(MorphError::InvalidConfig {
            reason: "none of the requested genes is in the expression matrix".to_string(),
        });
    }

    info!("Computing correlations against {} genes...", targets.len());
    let correlations = CorrelationMatrix::compute(expression, &targets)?;
    write_correlations(output_path, &correlations)?;
    info!("Correlations written to: {}", output_path);
    Ok(())
}
