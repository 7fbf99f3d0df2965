//! # metajudge-core
//!
//! Core library for metajudge - a tool for reviewing the verdicts of AI
//! judges against the data they judged.
//!
//! This library provides:
//! - Domain types for insights, judges, and reviews
//! - CSV loading of insights and workout history
//! - Highlight search over workout history text
//! - The review session with JSON save files
//! - Statistics and CSV exports
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use metajudge_core::{Config, Dataset, ReviewSession, SaveStore};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let insights = Path::new("insights.csv");
//! let workouts = Path::new("workouts.csv");
//!
//! let dataset = Dataset::load(insights, Some(workouts), config.review.categories())
//!     .expect("failed to load data");
//! let store = SaveStore::open(config.review.save_dir()).expect("failed to open saves");
//! let save_path = store.path_for(insights, Some(workouts));
//! let session = ReviewSession::new(dataset, Some(save_path));
//! println!("{}", session.dataset().describe());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use export::ExportSort;
pub use review::{ReviewState, SaveFile, SaveStore};
pub use search::{find_occurrences, HighlightSearch, Occurrence};
pub use session::{ReviewSession, SaveOutcome};
pub use stats::Statistics;
pub use types::*;

// Public modules
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod review;
pub mod search;
pub mod session;
pub mod stats;
pub mod types;
