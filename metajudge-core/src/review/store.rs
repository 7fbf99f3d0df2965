//! Save directory management.
//!
//! Each (insights file, workout file) pair maps to one deterministic save
//! file name, `review_{insights}_{workouts}_{hash8}.json`, so starting a
//! review over the same files finds the earlier progress.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const SAVE_PREFIX: &str = "review_";
const SAVE_EXTENSION: &str = "json";

/// A save file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl SaveEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The directory holding review save files.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Open (creating if needed) the save directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic save path for a pair of data files.
    pub fn path_for(&self, insights: &Path, workouts: Option<&Path>) -> PathBuf {
        self.dir.join(save_file_name(insights, workouts))
    }

    /// The save for this pair of files, if one exists.
    pub fn find_existing(&self, insights: &Path, workouts: Option<&Path>) -> Option<PathBuf> {
        let path = self.path_for(insights, workouts);
        path.exists().then_some(path)
    }

    /// All save files, most recently modified first.
    pub fn list(&self) -> Result<Vec<SaveEntry>> {
        let pattern = format!(
            "{}/{}*.{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            SAVE_PREFIX,
            SAVE_EXTENSION
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| Error::InvalidInput(format!("bad save directory pattern: {}", e)))?;

        let mut entries = Vec::new();
        for path in paths.flatten() {
            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable save file");
                    continue;
                }
            };
            entries.push(SaveEntry { path, modified });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }

    /// The most recently modified save file.
    pub fn last_review(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.into_iter().next().map(|entry| entry.path))
    }

    /// Delete a save so a review can start fresh.
    pub fn discard(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Discarding previous review progress");
        std::fs::remove_file(path)?;
        Ok(())
    }
}

fn file_stem(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `review_{insights}_{workouts}_{hash8}.json`
pub(crate) fn save_file_name(insights: &Path, workouts: Option<&Path>) -> String {
    let insights_name = file_stem(Some(insights));
    let workouts_name = file_stem(workouts);

    let mut hasher = Sha256::new();
    hasher.update(format!("{}_{}", insights_name, workouts_name).as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}{}_{}_{}.{}",
        SAVE_PREFIX,
        insights_name,
        workouts_name,
        &digest[..8],
        SAVE_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_save_file_name_is_deterministic() {
        let a = save_file_name(Path::new("/a/insights.csv"), Some(Path::new("/b/workouts.csv")));
        let b = save_file_name(
            Path::new("/elsewhere/insights.csv"),
            Some(Path::new("/c/workouts.csv")),
        );
        assert_eq!(a, b);
        assert!(a.starts_with("review_insights_workouts_"));
        assert!(a.ends_with(".json"));
        assert_eq!(a.len(), "review_insights_workouts_".len() + 8 + ".json".len());

        let other = save_file_name(Path::new("/a/insights.csv"), None);
        assert!(other.starts_with("review_insights_unknown_"));
        assert_ne!(a, other);
    }

    #[test]
    fn test_find_existing_and_last_review() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::open(dir.path().join("saves")).unwrap();
        assert!(store.last_review().unwrap().is_none());

        let insights = Path::new("/data/insights.csv");
        assert!(store.find_existing(insights, None).is_none());

        let older = store.path_for(insights, None);
        std::fs::write(&older, "{}").unwrap();
        let newer = store.dir().join("review_other_unknown_00000000.json");
        std::fs::write(&newer, "{}").unwrap();
        std::fs::write(store.dir().join("notes.json"), "{}").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert_eq!(store.find_existing(insights, None), Some(older.clone()));
        let listed: Vec<_> = store.list().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(listed, vec![newer.clone(), older.clone()]);
        assert_eq!(store.last_review().unwrap(), Some(newer));

        store.discard(&older).unwrap();
        assert!(store.find_existing(insights, None).is_none());
    }
}
