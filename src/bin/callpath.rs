//! Callpath CLI: analyze call-center CSV exports.
//!
//! Usage:
//!   callpath analyze <FILES|DIRS>... [--config path] [--out file] [--views-dir dir]
//!   callpath tree <FILES|DIRS>...
//!   callpath summary <FILES|DIRS>...

use callpath::{
    write_bundle, write_views, AnalyticsBundle, AnalyticsConfig, FileErrorPolicy, Pipeline,
    PathSource, TreeNode,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "callpath",
    version,
    about = "Decision-tree and navigation analytics for call-center logs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full analytics bundle
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        /// Write the bundle here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write one JSON file per view into this directory
        #[arg(long)]
        views_dir: Option<PathBuf>,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print the button tree as JSON
    Tree {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print a short human-readable report
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// CSV files, or directories scanned for *.csv
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Path to config.yaml (default: <config dir>/callpath/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fail the batch on the first unreadable file instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "callpath=debug" } else { "callpath=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_batch(input: &InputArgs) -> Result<AnalyticsBundle, String> {
    let mut config = AnalyticsConfig::load(input.config.as_deref())
        .map_err(|e| format!("Failed to load config: {}", e))?;
    if input.strict {
        config.file_error_policy = FileErrorPolicy::Abort;
    }
    let source = PathSource::new(input.paths.iter());
    Pipeline::new(config)
        .run_async(&source)
        .await
        .map_err(|e| format!("Analysis failed ({}): {}", e.kind(), e))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|e| format!("Failed to serialize: {}", e))
}

async fn cmd_analyze(
    input: &InputArgs,
    out: Option<PathBuf>,
    views_dir: Option<PathBuf>,
    pretty: bool,
) -> Result<(), String> {
    let bundle = run_batch(input).await?;

    if let Some(dir) = views_dir {
        let written = write_views(&bundle, &dir).map_err(|e| e.to_string())?;
        eprintln!("Wrote {} view files to {}", written.len(), dir.display());
    }
    match out {
        Some(path) => {
            write_bundle(&bundle, &path, pretty).map_err(|e| e.to_string())?;
            eprintln!("Wrote bundle to {}", path.display());
        }
        None => println!("{}", to_json(&bundle, pretty)?),
    }
    Ok(())
}

async fn cmd_tree(input: &InputArgs) -> Result<(), String> {
    let bundle = run_batch(input).await?;
    println!("{}", to_json(&bundle.button_tree, true)?);
    Ok(())
}

fn print_tree_outline(nodes: &[TreeNode], indent: usize, max_depth: usize) {
    if indent >= max_depth {
        return;
    }
    for node in nodes {
        println!("{}{} ({})", "  ".repeat(indent + 1), node.text, node.rule_id);
        if let Some(children) = &node.children {
            print_tree_outline(children, indent + 1, max_depth);
        }
    }
}

async fn cmd_summary(input: &InputArgs) -> Result<(), String> {
    let bundle = run_batch(input).await?;
    let views = &bundle.views;
    let lengths = &views.lengths_summary;

    println!(
        "Files: {}  Nodes: {}  Calls: {}",
        bundle.files_processed, bundle.total_nodes, bundle.total_calls
    );
    for skipped in &bundle.skipped_files {
        println!("  skipped {}: {}", skipped.file, skipped.reason);
    }
    println!(
        "Path length: avg {:.2}  median {}  p90 {}  p95 {}  max {}",
        lengths.avg, lengths.median, lengths.p90, lengths.p95, lengths.max
    );

    println!("\nTree (top levels):");
    print_tree_outline(&bundle.button_tree, 0, 2);

    println!("\n{:<10}  {:>7}  TEXT", "INTENT", "CALLS");
    println!("{}", "-".repeat(48));
    for row in &views.top_intents_top10 {
        println!("{:<10}  {:>7}  {}", row.rule_id, row.count, row.text);
    }

    println!("\n{:<10}  {:>7}  {:>6}  TEXT", "DEAD END", "STOPS", "RATE");
    println!("{}", "-".repeat(48));
    for row in views.dead_ends_top20.iter().take(10) {
        println!(
            "{:<10}  {:>7}  {:>5.1}%  {}",
            row.rule_id,
            row.terminations,
            row.termination_rate * 100.0,
            row.text
        );
    }

    println!("\nWeekday calls:");
    for (day, count) in &views.weekday_trends {
        println!("  {:<5} {}", day, count);
    }
    if !views.anomalies_top20.is_empty() {
        println!("\nOff-tree transitions: {}", views.anomalies_top20.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Analyze {
            input,
            out,
            views_dir,
            pretty,
        } => cmd_analyze(input, out.clone(), views_dir.clone(), *pretty).await,
        Commands::Tree { input } => cmd_tree(input).await,
        Commands::Summary { input } => cmd_summary(input).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
