//! CSV export of review results and judge statistics.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::review::ReviewState;
use crate::stats::{round1, Statistics};
use crate::types::IssueLevel;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Row order of a results export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportSort {
    /// By insight, then judge category
    #[default]
    Insight,
    /// By judge category, then insight
    Judge,
}

impl ExportSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportSort::Insight => "insight",
            ExportSort::Judge => "judge",
        }
    }
}

impl fmt::Display for ExportSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insight" | "i" => Ok(ExportSort::Insight),
            "judge" | "j" => Ok(ExportSort::Judge),
            _ => Err(format!("unknown sort order '{}' (expected insight or judge)", s)),
        }
    }
}

/// One line of the results export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub judge_category: String,
    /// 1-based
    pub insight_index: usize,
    pub metajudge_assessment: IssueLevel,
    pub metajudge_explanation: String,
    pub judge_score: Option<String>,
    pub judge_reasoning: Option<String>,
    pub insight_text: Option<String>,
    pub user_email: Option<String>,
    pub user_goal: Option<String>,
    pub review_timestamp: String,
}

/// One line of the statistics export.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct StatisticsRow {
    judge_category: String,
    total_reviews: usize,
    no_issues_count: usize,
    minor_issues_count: usize,
    major_issues_count: usize,
    issue_rate_percent: f64,
    no_issues_percent: f64,
    minor_issues_percent: f64,
    major_issues_percent: f64,
    export_timestamp: String,
}

/// Build the result rows for every stored review, in `sort` order.
///
/// Reviews made before timestamps were recorded carry `exported_at`.
pub fn result_rows(
    dataset: &Dataset,
    reviews: &ReviewState,
    sort: ExportSort,
    exported_at: DateTime<Local>,
) -> Vec<ResultRow> {
    let fallback = exported_at.format(TIMESTAMP_FORMAT).to_string();

    let mut rows: Vec<ResultRow> = reviews
        .iter()
        .filter_map(|(key, review)| {
            let insight = dataset.insight(key.insight)?;
            let category = dataset.category(key.judge)?;
            let judgment = insight.judgment(key.judge).cloned().unwrap_or_default();
            let review_timestamp = review
                .reviewed_at
                .map(|ts| ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| fallback.clone());
            Some(ResultRow {
                judge_category: category.name().to_string(),
                insight_index: insight.number(),
                metajudge_assessment: review.issue_level,
                metajudge_explanation: review.explanation.clone(),
                judge_score: judgment.score,
                judge_reasoning: judgment.reasoning,
                insight_text: insight.text.clone(),
                user_email: insight.email.clone(),
                user_goal: insight.goal.clone(),
                review_timestamp,
            })
        })
        .collect();

    match sort {
        ExportSort::Insight => rows.sort_by(|a, b| {
            (a.insight_index, &a.judge_category).cmp(&(b.insight_index, &b.judge_category))
        }),
        ExportSort::Judge => rows.sort_by(|a, b| {
            (&a.judge_category, a.insight_index).cmp(&(&b.judge_category, b.insight_index))
        }),
    }
    rows
}

/// Write the results export to `path`. Returns the number of rows.
pub fn write_results(
    path: &Path,
    dataset: &Dataset,
    reviews: &ReviewState,
    sort: ExportSort,
) -> Result<usize> {
    if reviews.is_empty() {
        return Err(Error::NothingToExport);
    }
    let rows = result_rows(dataset, reviews, sort, Local::now());
    write_rows(path, &rows)?;

    tracing::info!(path = %path.display(), rows = rows.len(), sort = %sort, "Exported results");
    Ok(rows.len())
}

/// Write the per-judge statistics export to `path`. Returns the number of rows.
pub fn write_statistics(path: &Path, stats: &Statistics) -> Result<usize> {
    if stats.is_empty() {
        return Err(Error::NothingToExport);
    }
    let exported_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let rows: Vec<StatisticsRow> = stats
        .judges
        .iter()
        .map(|judge| StatisticsRow {
            judge_category: judge.category.name().to_string(),
            total_reviews: judge.total(),
            no_issues_count: judge.levels.no_issues,
            minor_issues_count: judge.levels.minor_issues,
            major_issues_count: judge.levels.major_issues,
            issue_rate_percent: round1(judge.issue_rate()),
            no_issues_percent: round1(judge.levels.percent(IssueLevel::NoIssues)),
            minor_issues_percent: round1(judge.levels.percent(IssueLevel::MinorIssues)),
            major_issues_percent: round1(judge.levels.percent(IssueLevel::MajorIssues)),
            export_timestamp: exported_at.clone(),
        })
        .collect();
    write_rows(path, &rows)?;

    tracing::info!(path = %path.display(), judges = rows.len(), "Exported statistics");
    Ok(rows.len())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| Error::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| Error::csv(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// `metajudge_results_{sort}_{YYYYmmdd_HHMMSS}.csv`
pub fn default_results_file_name(sort: ExportSort, now: DateTime<Local>) -> String {
    format!(
        "metajudge_results_{}_{}.csv",
        sort,
        now.format(FILE_TIMESTAMP_FORMAT)
    )
}

/// `judge_statistics_{YYYYmmdd_HHMMSS}.csv`
pub fn default_statistics_file_name(now: DateTime<Local>) -> String {
    format!("judge_statistics_{}.csv", now.format(FILE_TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JudgeCategory, Review, ReviewKey};
    use chrono::TimeZone;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn dataset(dir: &TempDir) -> Dataset {
        let path = dir.path().join("insights.csv");
        fs::write(
            &path,
            "insight_text,email,goal,tone_score,tone_reasoning,factuality_score,factuality_reasoning\n\
             Lift more,a@x.com,strength,4,Warm,2,\"Wrong day, see log\"\n\
             Sleep more,b@x.com,recovery,5,Kind,5,Correct\n",
        )
        .unwrap();
        // Configured order differs from lexical order on purpose
        let categories = vec![JudgeCategory::new("tone"), JudgeCategory::new("factuality")];
        Dataset::load(&path, None, categories).unwrap()
    }

    fn reviews() -> ReviewState {
        let mut state = ReviewState::new();
        state.record(ReviewKey::new(1, 0), Review::new(IssueLevel::NoIssues, ""));
        state.record(
            ReviewKey::new(0, 1),
            Review::new(IssueLevel::MajorIssues, "judge missed the wrong day"),
        );
        state.record(ReviewKey::new(0, 0), Review::new(IssueLevel::NoIssues, ""));
        state.record(
            ReviewKey::new(1, 1),
            Review::new(IssueLevel::MinorIssues, "too lenient"),
        );
        state
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_sort_by_insight() {
        let dir = TempDir::new().unwrap();
        let rows = result_rows(&dataset(&dir), &reviews(), ExportSort::Insight, now());
        let order: Vec<(usize, &str)> = rows
            .iter()
            .map(|r| (r.insight_index, r.judge_category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![(1, "factuality"), (1, "tone"), (2, "factuality"), (2, "tone")]
        );
        assert_eq!(rows[0].judge_score.as_deref(), Some("2"));
        assert_eq!(rows[0].user_goal.as_deref(), Some("strength"));
    }

    #[test]
    fn test_sort_by_judge_groups_categories() {
        let dir = TempDir::new().unwrap();
        let state = reviews();
        let rows = result_rows(&dataset(&dir), &state, ExportSort::Judge, now());

        // Each category forms one contiguous run
        let mut seen = BTreeSet::new();
        let mut last: Option<&str> = None;
        for row in &rows {
            if last != Some(row.judge_category.as_str()) {
                assert!(seen.insert(row.judge_category.clone()), "{:?}", rows);
                last = Some(row.judge_category.as_str());
            }
        }

        // Every rated key appears exactly once
        let exported: BTreeSet<(usize, String)> = rows
            .iter()
            .map(|r| (r.insight_index, r.judge_category.clone()))
            .collect();
        assert_eq!(exported.len(), rows.len());
        assert_eq!(rows.len(), state.len());
    }

    #[test]
    fn test_write_results_csv() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out/results.csv");
        let written = write_results(&out, &dataset(&dir), &reviews(), ExportSort::Judge).unwrap();
        assert_eq!(written, 4);

        let content = fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "judge_category,insight_index,metajudge_assessment,metajudge_explanation,\
             judge_score,judge_reasoning,insight_text,user_email,user_goal,review_timestamp"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("factuality,1,Major Issues,judge missed the wrong day,2,\"Wrong day, see log\""));
    }

    #[test]
    fn test_nothing_to_export() {
        let dir = TempDir::new().unwrap();
        let ds = dataset(&dir);
        let err = write_results(
            &dir.path().join("r.csv"),
            &ds,
            &ReviewState::new(),
            ExportSort::Insight,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NothingToExport));

        let stats = Statistics::compute(&ds, &ReviewState::new());
        assert!(matches!(
            write_statistics(&dir.path().join("s.csv"), &stats),
            Err(Error::NothingToExport)
        ));
    }

    #[test]
    fn test_write_statistics_csv() {
        let dir = TempDir::new().unwrap();
        let path = dataset(&dir).insights_path.clone();
        // safety has no columns and no reviews, but is still configured
        let categories = ["tone", "factuality", "safety"]
            .iter()
            .map(|c| JudgeCategory::new(*c))
            .collect();
        let ds = Dataset::load(&path, None, categories).unwrap();
        let stats = Statistics::compute(&ds, &reviews());
        let out = dir.path().join("stats.csv");
        assert_eq!(write_statistics(&out, &stats).unwrap(), 3);

        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("judge_category,total_reviews,no_issues_count"));
        assert!(lines[1].starts_with("factuality,2,0,1,1,100.0,0.0,50.0,50.0,"));
        assert!(lines[2].starts_with("tone,2,2,0,0,0.0,100.0,0.0,0.0,"));
        assert!(lines[3].starts_with("safety,0,0,0,0,0.0,0.0,0.0,0.0,"));
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(
            default_results_file_name(ExportSort::Judge, now()),
            "metajudge_results_judge_20250301_093005.csv"
        );
        assert_eq!(
            default_statistics_file_name(now()),
            "judge_statistics_20250301_093005.csv"
        );
    }

    #[test]
    fn test_sort_parses() {
        assert_eq!("insight".parse::<ExportSort>().unwrap(), ExportSort::Insight);
        assert_eq!("J".parse::<ExportSort>().unwrap(), ExportSort::Judge);
        assert!("date".parse::<ExportSort>().is_err());
    }
}
