//! metajudge - review AI judge evaluations
//!
//! Terminal UI for checking each judge's verdict on an insight against the
//! user's workout history, recording an assessment per judgment.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use metajudge_core::format::format_relative_time;
use metajudge_core::{Config, Dataset, ReviewSession, SaveStore};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

/// UI tick; also drives the explanation autosave.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "metajudge")]
#[command(about = "Review AI judge evaluations against workout history")]
#[command(version)]
struct Args {
    /// Insights CSV (insight_text, email, goal, {judge}_score, {judge}_reasoning)
    #[arg(long)]
    insights: Option<PathBuf>,

    /// Workout history CSV (email, workout_summary)
    #[arg(long)]
    workouts: Option<PathBuf>,

    /// Discard earlier progress for these files and start over
    #[arg(long, conflicts_with_all = ["last", "save_file"])]
    fresh: bool,

    /// Resume the most recently saved review
    #[arg(long, conflicts_with = "save_file")]
    last: bool,

    /// Resume a specific save file
    #[arg(long)]
    save_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        metajudge_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("metajudge TUI starting up");

    let (session, mut warnings) = open_session(&args, &config)?;
    let mut status = session.dataset().describe();
    if let Some(saved) = session.last_saved() {
        status.push_str(&format!(
            " Resumed progress saved {}.",
            format_relative_time(saved)
        ));
    }
    warnings.extend(session.dataset().warnings.iter().cloned());

    let mut app = App::new(session, &config);
    if warnings.is_empty() {
        app.set_info(status);
    } else {
        app.set_warning(format!("{} {}", status, warnings.join(" ")));
    }

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    if let (Some(path), Some(_)) = (app.session.save_path(), app.session.last_saved()) {
        println!("Progress saved to {}", path.display());
    }
    tracing::info!("metajudge TUI shutting down");

    result
}

/// Build the review session from the command line.
///
/// Returns the session plus warnings to show on the first screen.
fn open_session(args: &Args, config: &Config) -> Result<(ReviewSession, Vec<String>)> {
    let store = SaveStore::open(config.review.save_dir()).context("failed to open save directory")?;
    let categories = config.review.categories();

    let save_path = if let Some(path) = &args.save_file {
        Some(path.clone())
    } else if args.last {
        let Some(path) = store.last_review().context("failed to list saved reviews")? else {
            bail!("No saved reviews found in {}", store.dir().display());
        };
        Some(path)
    } else {
        None
    };

    if let Some(save_path) = save_path {
        tracing::info!(path = %save_path.display(), "Opening saved review");
        return ReviewSession::open_save(
            &save_path,
            args.insights.as_deref(),
            args.workouts.as_deref(),
            categories,
        )
        .with_context(|| {
            format!(
                "failed to open {} (use --insights/--workouts if the data files moved)",
                save_path.display()
            )
        });
    }

    let Some(insights) = args.insights.as_deref() else {
        bail!("Pass --insights <csv> to start a review, or --last / --save-file to resume one");
    };
    let workouts = args.workouts.as_deref();

    let save_path = store.path_for(insights, workouts);
    if save_path.exists() {
        if args.fresh {
            store
                .discard(&save_path)
                .context("failed to discard previous progress")?;
        } else {
            tracing::info!(path = %save_path.display(), "Resuming earlier progress");
            return ReviewSession::open_save(&save_path, Some(insights), workouts, categories)
                .with_context(|| format!("failed to resume {}", save_path.display()));
        }
    }

    let dataset = Dataset::load(insights, workouts, categories).context("failed to load data")?;
    Ok((ReviewSession::new(dataset, Some(save_path)), Vec::new()))
}

/// Run the application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
