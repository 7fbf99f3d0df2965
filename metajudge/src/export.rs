//! metajudge-export - export review results without the TUI
//!
//! Reads a save file (and the data files it points at) and writes the
//! results or per-judge statistics CSV.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Saves: $XDG_DATA_HOME/metajudge/saves/ (~/.local/share/metajudge/saves/)
//! - Config: $XDG_CONFIG_HOME/metajudge/config.toml (~/.config/metajudge/config.toml)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use metajudge_core::export::{
    default_results_file_name, default_statistics_file_name, write_results, write_statistics,
};
use metajudge_core::format::{format_percent, format_relative_time};
use metajudge_core::{Config, ExportSort, ReviewSession, SaveFile, SaveStore, Statistics};

#[derive(Parser)]
#[command(name = "metajudge-export")]
#[command(about = "Export metajudge review results and statistics")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved reviews, most recent first
    List,

    /// Export every completed review as CSV
    Results {
        #[command(flatten)]
        source: SaveSource,

        /// Row order: insight or judge
        #[arg(short, long, default_value_t = ExportSort::Insight)]
        sort: ExportSort,

        /// Output file (default: export dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export per-judge issue statistics as CSV
    Stats {
        #[command(flatten)]
        source: SaveSource,

        /// Output file (default: export dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Which save to export from.
#[derive(ClapArgs)]
struct SaveSource {
    /// Save file to export
    #[arg(long, conflicts_with = "last")]
    save_file: Option<PathBuf>,

    /// Use the most recently saved review (default)
    #[arg(long)]
    last: bool,

    /// Insights CSV, if it moved since the review was saved
    #[arg(long)]
    insights: Option<PathBuf>,

    /// Workout history CSV, if it moved since the review was saved
    #[arg(long)]
    workouts: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        metajudge_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let store = SaveStore::open(config.review.save_dir()).context("failed to open save directory")?;

    match args.command {
        Command::List => cmd_list(&store),
        Command::Results {
            source,
            sort,
            output,
        } => cmd_results(&config, &store, &source, sort, output),
        Command::Stats { source, output } => cmd_stats(&config, &store, &source, output),
    }
}

fn cmd_list(store: &SaveStore) -> Result<()> {
    let entries = store.list().context("failed to list saved reviews")?;
    if entries.is_empty() {
        println!("No saved reviews in {}", store.dir().display());
        return Ok(());
    }

    println!("Saved reviews in {}", store.dir().display());
    println!();
    for entry in entries {
        match SaveFile::read(&entry.path) {
            Ok(save) => println!(
                "  {}  {:>10}  {}/{} reviewed  {}",
                entry.file_name(),
                format_relative_time(entry.modified),
                save.reviews.len(),
                save.total_reviews(),
                save.insights_file.display()
            ),
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "Unreadable save file");
                println!("  {}  (unreadable: {})", entry.file_name(), e);
            }
        }
    }
    Ok(())
}

fn cmd_results(
    config: &Config,
    store: &SaveStore,
    source: &SaveSource,
    sort: ExportSort,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = open_source(config, store, source)?;
    let path = output.unwrap_or_else(|| {
        config
            .export
            .dir()
            .join(default_results_file_name(sort, Local::now()))
    });

    let rows = write_results(&path, session.dataset(), session.reviews(), sort)
        .with_context(|| format!("failed to export results to {}", path.display()))?;
    println!("Exported {} reviews to {}", rows, path.display());
    Ok(())
}

fn cmd_stats(
    config: &Config,
    store: &SaveStore,
    source: &SaveSource,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = open_source(config, store, source)?;
    let stats = Statistics::compute(session.dataset(), session.reviews());
    let path = output.unwrap_or_else(|| {
        config
            .export
            .dir()
            .join(default_statistics_file_name(Local::now()))
    });

    let rows = write_statistics(&path, &stats)
        .with_context(|| format!("failed to export statistics to {}", path.display()))?;
    println!(
        "Exported statistics for {} judges to {} (overall issue rate {})",
        rows,
        path.display(),
        format_percent(stats.summary.levels.issue_rate())
    );
    Ok(())
}

/// Resolve and open the save named on the command line.
fn open_source(config: &Config, store: &SaveStore, source: &SaveSource) -> Result<ReviewSession> {
    let save_path = match (&source.save_file, source.last) {
        (Some(path), false) => path.clone(),
        _ => match store.last_review().context("failed to list saved reviews")? {
            Some(path) => path,
            None => bail!("No saved reviews found in {}", store.dir().display()),
        },
    };

    let (session, warnings) = open_save(config, &save_path, source)?;
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(session)
}

fn open_save(
    config: &Config,
    save_path: &Path,
    source: &SaveSource,
) -> Result<(ReviewSession, Vec<String>)> {
    tracing::info!(path = %save_path.display(), "Exporting from save");
    ReviewSession::open_save(
        save_path,
        source.insights.as_deref(),
        source.workouts.as_deref(),
        config.review.categories(),
    )
    .with_context(|| {
        format!(
            "failed to open {} (use --insights/--workouts if the data files moved)",
            save_path.display()
        )
    })
}
