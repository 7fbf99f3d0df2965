//! Core domain types for metajudge
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Insight** | An AI-generated statement about a user's training, one row of the insights file |
//! | **Judge** | An automated evaluator that scored the insight along one [`JudgeCategory`] |
//! | **Judgment** | One judge's score and reasoning for one insight |
//! | **Review** | The human assessment of one judgment, keyed by [`ReviewKey`] |
//! | **Workout history** | The user's training record, used as ground truth |

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Judge categories shipped with the default configuration.
pub const DEFAULT_JUDGE_CATEGORIES: [&str; 7] = [
    "factuality",
    "insightfulness",
    "personalization",
    "actionability",
    "safety",
    "tone",
    "toxicity",
];

// ============================================
// Judges
// ============================================

/// A judge dimension, e.g. `factuality`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgeCategory(String);

impl JudgeCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Column holding this judge's score in the insights file.
    pub fn score_column(&self) -> String {
        format!("{}_score", self.0)
    }

    /// Column holding this judge's reasoning in the insights file.
    pub fn reasoning_column(&self) -> String {
        format!("{}_reasoning", self.0)
    }

    /// Capitalized display name ("Factuality").
    pub fn title(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for JudgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================
// Insights
// ============================================

/// One judge's verdict on an insight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Judgment {
    /// Score as written in the file (judges are not consistent about numeric formats)
    pub score: Option<String>,
    pub reasoning: Option<String>,
}

/// An AI-generated insight with its per-judge verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    /// 0-based row position in the insights file; unique within a dataset
    pub index: usize,
    pub text: Option<String>,
    pub email: Option<String>,
    pub goal: Option<String>,
    /// Parallel to the dataset's judge categories
    pub judgments: Vec<Judgment>,
}

impl Insight {
    /// 1-based number shown to reviewers and written to exports.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn judgment(&self, judge_index: usize) -> Option<&Judgment> {
        self.judgments.get(judge_index)
    }
}

/// A user's workout history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutHistory {
    pub email: String,
    pub summary: Option<String>,
}

// ============================================
// Reviews
// ============================================

/// Human assessment of a judge's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueLevel {
    #[serde(rename = "No Issues")]
    NoIssues,
    #[serde(rename = "Minor Issues")]
    MinorIssues,
    #[serde(rename = "Major Issues")]
    MajorIssues,
}

impl IssueLevel {
    pub const ALL: [IssueLevel; 3] = [
        IssueLevel::NoIssues,
        IssueLevel::MinorIssues,
        IssueLevel::MajorIssues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueLevel::NoIssues => "No Issues",
            IssueLevel::MinorIssues => "Minor Issues",
            IssueLevel::MajorIssues => "Major Issues",
        }
    }

    /// Minor and major issues must be explained.
    pub fn requires_explanation(&self) -> bool {
        !matches!(self, IssueLevel::NoIssues)
    }

    /// Rating hotkey digit.
    pub fn from_hotkey(c: char) -> Option<Self> {
        match c {
            '1' => Some(IssueLevel::NoIssues),
            '2' => Some(IssueLevel::MinorIssues),
            '3' => Some(IssueLevel::MajorIssues),
            _ => None,
        }
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No Issues" => Ok(IssueLevel::NoIssues),
            "Minor Issues" => Ok(IssueLevel::MinorIssues),
            "Major Issues" => Ok(IssueLevel::MajorIssues),
            _ => Err(format!("unknown issue level: {}", s)),
        }
    }
}

/// Identifies one judgment: (insight index, judge index), both 0-based.
///
/// Serialized as the string `"(i, j)"` so it can key a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReviewKey {
    pub insight: usize,
    pub judge: usize,
}

impl ReviewKey {
    pub fn new(insight: usize, judge: usize) -> Self {
        Self { insight, judge }
    }
}

impl fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.insight, self.judge)
    }
}

impl std::str::FromStr for ReviewKey {
    type Err = String;

    /// Accepts `"(i, j)"` and `"i:j"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let (insight, judge) = inner
            .split_once(',')
            .or_else(|| inner.split_once(':'))
            .ok_or_else(|| format!("invalid review key: {}", s))?;
        let insight = insight
            .trim()
            .parse()
            .map_err(|_| format!("invalid insight index in review key: {}", s))?;
        let judge = judge
            .trim()
            .parse()
            .map_err(|_| format!("invalid judge index in review key: {}", s))?;
        Ok(ReviewKey { insight, judge })
    }
}

impl Serialize for ReviewKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReviewKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A stored assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub issue_level: IssueLevel,
    pub explanation: String,
    /// Absent in saves written before timestamps were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn new(issue_level: IssueLevel, explanation: impl Into<String>) -> Self {
        Self {
            issue_level,
            explanation: explanation.into(),
            reviewed_at: Some(Utc::now()),
        }
    }
}

/// Whether the current judgment has a stored review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Reviewed,
    Pending,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Reviewed => "REVIEWED",
            ReviewStatus::Pending => "PENDING",
        }
    }
}
