//! Loading of the insights and workout history CSV files.
//!
//! Insights file columns: `insight_text`, `email`, `goal`, and for every
//! judge category `{category}_score` and `{category}_reasoning`.
//! Workout history columns: `email`, `workout_summary`.
//!
//! Missing columns are reported as warnings, not errors: the affected values
//! read as absent.

use crate::error::{Error, Result};
use crate::types::{Insight, JudgeCategory, Judgment, WorkoutHistory};
use csv::StringRecord;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

const INSIGHT_TEXT: &str = "insight_text";
const EMAIL: &str = "email";
const GOAL: &str = "goal";
const WORKOUT_SUMMARY: &str = "workout_summary";

/// Column name -> position, from a CSV header row.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_string(), i))
                .collect(),
        )
    }

    fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Non-empty trimmed value of `name` in `record`.
    fn get(&self, record: &StringRecord, name: &str) -> Option<String> {
        let idx = *self.0.get(name)?;
        let value = record.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn missing(&self, expected: &[String]) -> Vec<String> {
        expected
            .iter()
            .filter(|name| !self.has(name))
            .cloned()
            .collect()
    }
}

/// How many insight users have workout history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSummary {
    pub insight_users: usize,
    pub linked_users: usize,
}

/// The data under review.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub insights_path: PathBuf,
    pub workouts_path: Option<PathBuf>,
    pub categories: Vec<JudgeCategory>,
    pub insights: Vec<Insight>,
    /// None when no workout file was given
    workouts: Option<WorkoutTable>,
    /// Non-fatal problems found while loading
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct WorkoutTable {
    has_email: bool,
    has_summary: bool,
    /// First row per email wins
    by_email: HashMap<String, WorkoutHistory>,
    rows: usize,
}

impl Dataset {
    /// Load the insights file and, if given, the workout history file.
    pub fn load(
        insights_path: &Path,
        workouts_path: Option<&Path>,
        categories: Vec<JudgeCategory>,
    ) -> Result<Self> {
        let mut warnings = Vec::new();

        let insights = load_insights(insights_path, &categories, &mut warnings)?;
        if insights.is_empty() {
            return Err(Error::EmptyDataset(insights_path.to_path_buf()));
        }

        let workouts = match workouts_path {
            Some(path) => Some(load_workouts(path, &mut warnings)?),
            None => None,
        };

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let dataset = Self {
            insights_path: insights_path.to_path_buf(),
            workouts_path: workouts_path.map(Path::to_path_buf),
            categories,
            insights,
            workouts,
            warnings,
        };

        tracing::info!(
            insights = dataset.insights.len(),
            workout_rows = dataset.workouts.as_ref().map(|w| w.rows).unwrap_or(0),
            path = %insights_path.display(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    pub fn total_insights(&self) -> usize {
        self.insights.len()
    }

    pub fn total_judges(&self) -> usize {
        self.categories.len()
    }

    /// Every (insight, judge) pair that can be reviewed.
    pub fn total_reviews(&self) -> usize {
        self.total_insights() * self.total_judges()
    }

    pub fn insight(&self, index: usize) -> Option<&Insight> {
        self.insights.get(index)
    }

    pub fn category(&self, judge_index: usize) -> Option<&JudgeCategory> {
        self.categories.get(judge_index)
    }

    pub fn has_workouts(&self) -> bool {
        self.workouts.is_some()
    }

    /// Workout history text for `email`, or a placeholder explaining its absence.
    pub fn workout_history_for(&self, email: Option<&str>) -> String {
        let Some(table) = &self.workouts else {
            return "No workout history data loaded.".to_string();
        };
        if !table.has_email {
            return "Workout history data missing 'email' column.".to_string();
        }
        if !table.has_summary {
            return "Workout history data missing 'workout_summary' column.".to_string();
        }
        let email = email.unwrap_or("");
        match table.by_email.get(email) {
            None => format!("No workout history found for: {}", email),
            Some(history) => history
                .summary
                .clone()
                .unwrap_or_else(|| "Workout summary is empty.".to_string()),
        }
    }

    /// Distinct insight emails, and how many of them have workout history.
    pub fn link_summary(&self) -> Option<LinkSummary> {
        let table = self.workouts.as_ref()?;
        if !table.has_email {
            return None;
        }
        let emails: BTreeSet<&str> = self
            .insights
            .iter()
            .filter_map(|i| i.email.as_deref())
            .collect();
        let linked = emails
            .iter()
            .filter(|e| table.by_email.contains_key(**e))
            .count();
        Some(LinkSummary {
            insight_users: emails.len(),
            linked_users: linked,
        })
    }

    /// One-line description of what was loaded.
    pub fn describe(&self) -> String {
        let mut msg = format!("Loaded {} insights", self.insights.len());
        match &self.workouts {
            None => msg.push_str(". No workout history loaded."),
            Some(table) => {
                msg.push_str(&format!(" and {} workout histories.", table.rows));
                match self.link_summary() {
                    Some(link) => msg.push_str(&format!(
                        " Data linking: {}/{} insights have workout history.",
                        link.linked_users, link.insight_users
                    )),
                    None => msg.push_str(" Warning: cannot link data - missing email column."),
                }
            }
        }
        msg
    }
}

fn open_reader(kind: &'static str, path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(Error::MissingFile {
            kind,
            path: path.to_path_buf(),
        });
    }
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv(path, e))
}

fn load_insights(
    path: &Path,
    categories: &[JudgeCategory],
    warnings: &mut Vec<String>,
) -> Result<Vec<Insight>> {
    let mut reader = open_reader("insights", path)?;
    let columns = Columns::from_headers(reader.headers().map_err(|e| Error::csv(path, e))?);

    let mut expected = vec![INSIGHT_TEXT.to_string(), EMAIL.to_string(), GOAL.to_string()];
    for category in categories {
        expected.push(category.score_column());
        expected.push(category.reasoning_column());
    }
    let missing = columns.missing(&expected);
    if !missing.is_empty() {
        warnings.push(format!(
            "Insights file is missing expected columns: {}",
            missing.join(", ")
        ));
    }

    let judge_columns: Vec<(String, String)> = categories
        .iter()
        .map(|c| (c.score_column(), c.reasoning_column()))
        .collect();

    let mut insights = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::csv(path, e))?;
        let judgments = judge_columns
            .iter()
            .map(|(score, reasoning)| Judgment {
                score: columns.get(&record, score),
                reasoning: columns.get(&record, reasoning),
            })
            .collect();
        insights.push(Insight {
            index,
            text: columns.get(&record, INSIGHT_TEXT),
            email: columns.get(&record, EMAIL),
            goal: columns.get(&record, GOAL),
            judgments,
        });
    }

    Ok(insights)
}

fn load_workouts(path: &Path, warnings: &mut Vec<String>) -> Result<WorkoutTable> {
    let mut reader = open_reader("workout history", path)?;
    let columns = Columns::from_headers(reader.headers().map_err(|e| Error::csv(path, e))?);

    let missing = columns.missing(&[EMAIL.to_string(), WORKOUT_SUMMARY.to_string()]);
    if !missing.is_empty() {
        warnings.push(format!(
            "Workout history file is missing expected columns: {}",
            missing.join(", ")
        ));
    }

    let mut by_email = HashMap::new();
    let mut rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| Error::csv(path, e))?;
        rows += 1;
        let Some(email) = columns.get(&record, EMAIL) else {
            continue;
        };
        by_email
            .entry(email.clone())
            .or_insert_with(|| WorkoutHistory {
                email,
                summary: columns.get(&record, WORKOUT_SUMMARY),
            });
    }

    Ok(WorkoutTable {
        has_email: columns.has(EMAIL),
        has_summary: columns.has(WORKOUT_SUMMARY),
        by_email,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_JUDGE_CATEGORIES;
    use std::fs;
    use tempfile::TempDir;

    fn categories() -> Vec<JudgeCategory> {
        vec![JudgeCategory::new("factuality"), JudgeCategory::new("tone")]
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_insights_and_workouts() {
        let dir = TempDir::new().unwrap();
        let insights = write(
            &dir,
            "insights.csv",
            "insight_text,email,goal,factuality_score,factuality_reasoning,tone_score,tone_reasoning\n\
             You squat more on Mondays,a@x.com,strength,2,\"Matches, mostly\",3,Friendly\n\
             Run more,b@x.com,endurance,1,No runs logged,,\n",
        );
        let workouts = write(
            &dir,
            "workouts.csv",
            "email,workout_summary\na@x.com,Monday: squat 5x5\na@x.com,ignored duplicate\n",
        );

        let ds = Dataset::load(&insights, Some(&workouts), categories()).unwrap();
        assert!(ds.warnings.is_empty());
        assert_eq!(ds.total_insights(), 2);
        assert_eq!(ds.total_reviews(), 4);

        let first = ds.insight(0).unwrap();
        assert_eq!(first.number(), 1);
        assert_eq!(first.judgments[0].score.as_deref(), Some("2"));
        assert_eq!(first.judgments[0].reasoning.as_deref(), Some("Matches, mostly"));

        let second = ds.insight(1).unwrap();
        assert_eq!(second.judgments[1], Judgment::default());

        assert_eq!(ds.workout_history_for(Some("a@x.com")), "Monday: squat 5x5");
        assert_eq!(
            ds.workout_history_for(Some("b@x.com")),
            "No workout history found for: b@x.com"
        );
        assert_eq!(
            ds.link_summary(),
            Some(LinkSummary {
                insight_users: 2,
                linked_users: 1
            })
        );
        assert!(ds.describe().contains("Data linking: 1/2"));
    }

    #[test]
    fn test_missing_columns_are_warnings() {
        let dir = TempDir::new().unwrap();
        let insights = write(&dir, "insights.csv", "insight_text,email\nhello,a@x.com\n");
        let workouts = write(&dir, "workouts.csv", "email,notes\na@x.com,x\n");

        let ds = Dataset::load(&insights, Some(&workouts), categories()).unwrap();
        assert_eq!(ds.warnings.len(), 2);
        assert!(ds.warnings[0].contains("goal"));
        assert!(ds.warnings[0].contains("tone_reasoning"));
        assert!(ds.warnings[1].contains("workout_summary"));
        assert_eq!(
            ds.workout_history_for(Some("a@x.com")),
            "Workout history data missing 'workout_summary' column."
        );
    }

    #[test]
    fn test_missing_files_fail_fast() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::load(&dir.path().join("nope.csv"), None, categories()).unwrap_err();
        assert!(matches!(err, Error::MissingFile { kind: "insights", .. }));

        let insights = write(&dir, "insights.csv", "insight_text\nhello\n");
        let err = Dataset::load(&insights, Some(&dir.path().join("gone.csv")), categories())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingFile {
                kind: "workout history",
                ..
            }
        ));
        assert!(err.to_string().contains("gone.csv"));
    }

    #[test]
    fn test_empty_insights_is_error() {
        let dir = TempDir::new().unwrap();
        let insights = write(&dir, "insights.csv", "insight_text,email,goal\n");
        let err = Dataset::load(&insights, None, categories()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset(_)));
    }

    #[test]
    fn test_no_workout_file() {
        let dir = TempDir::new().unwrap();
        let insights = write(&dir, "insights.csv", "insight_text,email,goal\nx,a@x.com,g\n");
        let cats = DEFAULT_JUDGE_CATEGORIES
            .iter()
            .map(|c| JudgeCategory::new(*c))
            .collect();
        let ds = Dataset::load(&insights, None, cats).unwrap();
        assert!(!ds.has_workouts());
        assert_eq!(ds.total_judges(), 7);
        assert_eq!(
            ds.workout_history_for(Some("a@x.com")),
            "No workout history data loaded."
        );
        assert!(ds.link_summary().is_none());
    }
}
