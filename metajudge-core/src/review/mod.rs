//! Review state and its on-disk save file.
//!
//! [`ReviewState`] is the only data created during a session. It is written
//! to a JSON save file after every stored assessment, so a review can be
//! resumed after a restart.

mod store;

pub use store::{SaveEntry, SaveStore};

use crate::error::{Error, Result};
use crate::types::{IssueLevel, Review, ReviewKey};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Keys every save file must carry.
const REQUIRED_KEYS: [&str; 4] = ["insights_file", "reviews", "total_insights", "total_judges"];

/// Stored assessments, ordered by (insight, judge).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewState {
    reviews: BTreeMap<ReviewKey, Review>,
}

impl ReviewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ReviewKey) -> Option<&Review> {
        self.reviews.get(&key)
    }

    /// Store `review` for `key`, replacing any earlier assessment.
    pub fn record(&mut self, key: ReviewKey, review: Review) -> Option<Review> {
        self.reviews.insert(key, review)
    }

    pub fn contains(&self, key: ReviewKey) -> bool {
        self.reviews.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReviewKey, &Review)> {
        self.reviews.iter()
    }

    /// Number of distinct insights with at least one review.
    pub fn insights_reviewed(&self) -> usize {
        let mut count = 0;
        let mut last = None;
        for key in self.reviews.keys() {
            if last != Some(key.insight) {
                count += 1;
                last = Some(key.insight);
            }
        }
        count
    }

    pub fn count_level(&self, level: IssueLevel) -> usize {
        self.reviews
            .values()
            .filter(|r| r.issue_level == level)
            .count()
    }

    /// Drop reviews pointing outside a dataset of the given shape.
    pub fn retain_within(&mut self, total_insights: usize, total_judges: usize) -> usize {
        let before = self.reviews.len();
        self.reviews
            .retain(|key, _| key.insight < total_insights && key.judge < total_judges);
        before - self.reviews.len()
    }
}

/// Contents of a `review_*.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub insights_file: PathBuf,
    /// Written as `""` when no workout file was used
    #[serde(
        default,
        serialize_with = "serialize_optional_path",
        deserialize_with = "deserialize_optional_path"
    )]
    pub workout_file: Option<PathBuf>,
    pub reviews: ReviewState,
    #[serde(default)]
    pub current_insight_index: usize,
    #[serde(default)]
    pub current_judge_index: usize,
    #[serde(default)]
    pub last_saved: Option<String>,
    pub total_insights: usize,
    pub total_judges: usize,
}

fn serialize_optional_path<S: Serializer>(
    path: &Option<PathBuf>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match path {
        Some(p) => serializer.collect_str(&p.display()),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_optional_path<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<PathBuf>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

impl SaveFile {
    /// Read and validate a save file.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingFile {
                kind: "save",
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| Error::InvalidSaveFile {
                path: path.to_path_buf(),
                message: format!("not valid JSON: {}", e),
            })?;

        let Some(object) = value.as_object() else {
            return Err(Error::InvalidSaveFile {
                path: path.to_path_buf(),
                message: "expected a JSON object".to_string(),
            });
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidSaveFile {
                path: path.to_path_buf(),
                message: format!("missing required data: {}", missing.join(", ")),
            });
        }

        serde_json::from_value(value).map_err(|e| Error::InvalidSaveFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the save file, replacing any previous version atomically.
    pub fn write(&mut self, path: &Path) -> Result<()> {
        self.last_saved = Some(Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Temp name includes the PID so concurrent writers never share it
        let tmp_path = path.with_extension(format!("json.tmp.{}", std::process::id()));
        std::fs::write(&tmp_path, json.as_bytes())?;
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), reviews = self.reviews.len(), "Save file written");
        Ok(())
    }

    /// Number of judgments the saved dataset had.
    pub fn total_reviews(&self) -> usize {
        self.total_insights * self.total_judges
    }
}
