//! Review statistics.
//!
//! Summary figures for the whole review and a per-judge breakdown, computed
//! from the stored assessments on demand.

use crate::dataset::Dataset;
use crate::review::ReviewState;
use crate::types::{IssueLevel, JudgeCategory};

/// Count of reviews at each issue level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub no_issues: usize,
    pub minor_issues: usize,
    pub major_issues: usize,
}

impl LevelCounts {
    fn add(&mut self, level: IssueLevel) {
        match level {
            IssueLevel::NoIssues => self.no_issues += 1,
            IssueLevel::MinorIssues => self.minor_issues += 1,
            IssueLevel::MajorIssues => self.major_issues += 1,
        }
    }

    pub fn get(&self, level: IssueLevel) -> usize {
        match level {
            IssueLevel::NoIssues => self.no_issues,
            IssueLevel::MinorIssues => self.minor_issues,
            IssueLevel::MajorIssues => self.major_issues,
        }
    }

    pub fn total(&self) -> usize {
        self.no_issues + self.minor_issues + self.major_issues
    }

    pub fn with_issues(&self) -> usize {
        self.minor_issues + self.major_issues
    }

    /// Share of reviews at `level`, in percent; 0 when there are none.
    pub fn percent(&self, level: IssueLevel) -> f64 {
        percent(self.get(level), self.total())
    }

    /// Share of reviews with minor or major issues, in percent.
    pub fn issue_rate(&self) -> f64 {
        percent(self.with_issues(), self.total())
    }
}

/// Whole-review figures.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub completed: usize,
    /// insights x judges
    pub possible: usize,
    pub insights_reviewed: usize,
    pub total_insights: usize,
    pub levels: LevelCounts,
}

impl ReviewSummary {
    pub fn completion_percent(&self) -> f64 {
        percent(self.completed, self.possible)
    }
}

/// Figures for one judge.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeStats {
    pub category: JudgeCategory,
    pub levels: LevelCounts,
}

impl JudgeStats {
    pub fn total(&self) -> usize {
        self.levels.total()
    }

    pub fn issue_rate(&self) -> f64 {
        self.levels.issue_rate()
    }
}

/// Summary plus per-judge breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub summary: ReviewSummary,
    /// Every configured judge, highest issue rate first
    pub judges: Vec<JudgeStats>,
}

impl Statistics {
    pub fn compute(dataset: &Dataset, reviews: &ReviewState) -> Self {
        let mut overall = LevelCounts::default();
        let mut per_judge = vec![LevelCounts::default(); dataset.total_judges()];

        for (key, review) in reviews.iter() {
            overall.add(review.issue_level);
            if let Some(counts) = per_judge.get_mut(key.judge) {
                counts.add(review.issue_level);
            }
        }

        let mut judges: Vec<JudgeStats> = dataset
            .categories
            .iter()
            .zip(per_judge)
            .map(|(category, levels)| JudgeStats {
                category: category.clone(),
                levels,
            })
            .collect();
        // Ranked by the rate as displayed; sort_by is stable, so judges that
        // tie after rounding keep configured category order
        judges.sort_by(|a, b| round1(b.issue_rate()).total_cmp(&round1(a.issue_rate())));

        Self {
            summary: ReviewSummary {
                completed: reviews.len(),
                possible: dataset.total_reviews(),
                insights_reviewed: reviews.insights_reviewed(),
                total_insights: dataset.total_insights(),
                levels: overall,
            },
            judges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.completed == 0
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Round to one decimal place for display and export.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Review, ReviewKey};
    use std::fs;
    use tempfile::TempDir;

    fn dataset(dir: &TempDir) -> Dataset {
        let path = dir.path().join("insights.csv");
        fs::write(
            &path,
            "insight_text,email,goal,factuality_score,factuality_reasoning,tone_score,tone_reasoning,safety_score,safety_reasoning\n\
             a,a@x.com,g,1,r,1,r,1,r\n\
             b,b@x.com,g,1,r,1,r,1,r\n\
             c,c@x.com,g,1,r,1,r,1,r\n",
        )
        .unwrap();
        let categories = ["factuality", "tone", "safety"]
            .iter()
            .map(|c| JudgeCategory::new(*c))
            .collect();
        Dataset::load(&path, None, categories).unwrap()
    }

    fn rate(state: &mut ReviewState, insight: usize, judge: usize, level: IssueLevel) {
        state.record(ReviewKey::new(insight, judge), Review::new(level, "why"));
    }

    #[test]
    fn test_summary_counts() {
        let dir = TempDir::new().unwrap();
        let ds = dataset(&dir);
        let mut state = ReviewState::new();
        rate(&mut state, 0, 0, IssueLevel::NoIssues);
        rate(&mut state, 0, 1, IssueLevel::MinorIssues);
        rate(&mut state, 2, 0, IssueLevel::MajorIssues);

        let stats = Statistics::compute(&ds, &state);
        let summary = &stats.summary;
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.possible, 9);
        assert_eq!(summary.insights_reviewed, 2);
        assert_eq!(round1(summary.completion_percent()), 33.3);
        assert_eq!(summary.levels.with_issues(), 2);
        assert_eq!(round1(summary.levels.issue_rate()), 66.7);
    }

    #[test]
    fn test_judges_ordered_by_issue_rate() {
        let dir = TempDir::new().unwrap();
        let ds = dataset(&dir);
        let mut state = ReviewState::new();
        // factuality 50%, tone 100%, safety 50%
        rate(&mut state, 0, 0, IssueLevel::NoIssues);
        rate(&mut state, 1, 0, IssueLevel::MajorIssues);
        rate(&mut state, 0, 1, IssueLevel::MinorIssues);
        rate(&mut state, 0, 2, IssueLevel::NoIssues);
        rate(&mut state, 1, 2, IssueLevel::MinorIssues);

        let stats = Statistics::compute(&ds, &state);
        let order: Vec<&str> = stats.judges.iter().map(|j| j.category.name()).collect();
        assert_eq!(order, vec!["tone", "factuality", "safety"]);
        assert_eq!(stats.judges[1].levels.percent(IssueLevel::MajorIssues), 50.0);
    }

    #[test]
    fn test_unreviewed_judges_are_listed() {
        let dir = TempDir::new().unwrap();
        let ds = dataset(&dir);
        let mut state = ReviewState::new();
        rate(&mut state, 0, 2, IssueLevel::MajorIssues);

        let stats = Statistics::compute(&ds, &state);
        let order: Vec<&str> = stats.judges.iter().map(|j| j.category.name()).collect();
        assert_eq!(order, vec!["safety", "factuality", "tone"]);
        assert_eq!(stats.judges[1].total(), 0);
        assert_eq!(stats.judges[1].issue_rate(), 0.0);
    }

    #[test]
    fn test_rates_equal_after_rounding_keep_category_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("many.csv");
        let mut csv = String::from("insight_text,factuality_score,tone_score\n");
        for i in 0..35 {
            csv.push_str(&format!("i{i},1,1\n"));
        }
        fs::write(&path, csv).unwrap();
        let categories = vec![JudgeCategory::new("factuality"), JudgeCategory::new("tone")];
        let ds = Dataset::load(&path, None, categories).unwrap();

        // factuality 1/35 = 2.86%, tone 1/34 = 2.94%: both shown as 2.9%
        let mut state = ReviewState::new();
        for i in 0..35 {
            let level = if i == 0 { IssueLevel::MinorIssues } else { IssueLevel::NoIssues };
            rate(&mut state, i, 0, level);
            if i < 34 {
                rate(&mut state, i, 1, level);
            }
        }

        let stats = Statistics::compute(&ds, &state);
        let order: Vec<&str> = stats.judges.iter().map(|j| j.category.name()).collect();
        assert_eq!(order, vec!["factuality", "tone"]);
        assert!(stats.judges[1].issue_rate() > stats.judges[0].issue_rate());
        assert_eq!(round1(stats.judges[0].issue_rate()), 2.9);
        assert_eq!(round1(stats.judges[1].issue_rate()), 2.9);
    }

    #[test]
    fn test_empty_review() {
        let dir = TempDir::new().unwrap();
        let stats = Statistics::compute(&dataset(&dir), &ReviewState::new());
        assert!(stats.is_empty());
        assert_eq!(stats.judges.len(), 3);
        assert!(stats.judges.iter().all(|j| j.total() == 0));
        assert_eq!(stats.summary.completion_percent(), 0.0);
        assert_eq!(stats.summary.levels.issue_rate(), 0.0);
    }
}
