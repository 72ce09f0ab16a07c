//! Aggregated per-user statistics and the derived rank.

#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// Display name, falling back to the login when unset on the profile.
    pub name: String,
    pub total_stars: u64,
    pub total_commits: u64,
    pub total_prs: u64,
    pub total_prs_merged: u64,
    pub merged_prs_percentage: f64,
    pub total_issues: u64,
    pub total_discussions_started: u64,
    pub total_discussions_answered: u64,
    pub contributed_to: u64,
    pub followers: u64,
    pub rank: Rank,
}

#[derive(Debug, Clone)]
pub struct Rank {
    pub level: &'static str,
    /// 0 is the top of the distribution, 100 the bottom.
    pub percentile: f64,
}

impl Default for Rank {
    fn default() -> Self {
        Rank {
            level: "C",
            percentile: 100.0,
        }
    }
}

// Medians and weights for the percentile estimate. Activity is scored against
// an assumed exponential distribution per metric, then blended.
const COMMITS_MEDIAN: f64 = 250.0;
const ALL_COMMITS_MEDIAN: f64 = 1000.0;
const PRS_MEDIAN: f64 = 50.0;
const ISSUES_MEDIAN: f64 = 25.0;
const STARS_MEDIAN: f64 = 50.0;
const FOLLOWERS_MEDIAN: f64 = 10.0;

const COMMITS_WEIGHT: f64 = 2.0;
const PRS_WEIGHT: f64 = 3.0;
const ISSUES_WEIGHT: f64 = 1.0;
const STARS_WEIGHT: f64 = 4.0;
const FOLLOWERS_WEIGHT: f64 = 1.0;

fn exponential_cdf(x: f64) -> f64 {
    1.0 - 2f64.powf(-x)
}

/// Percentile-based rank across the tracked metrics.
pub fn calculate_rank(
    all_commits: bool,
    commits: u64,
    prs: u64,
    issues: u64,
    stars: u64,
    followers: u64,
) -> Rank {
    let commits_median = if all_commits {
        ALL_COMMITS_MEDIAN
    } else {
        COMMITS_MEDIAN
    };

    let total_weight =
        COMMITS_WEIGHT + PRS_WEIGHT + ISSUES_WEIGHT + STARS_WEIGHT + FOLLOWERS_WEIGHT;
    let score = (COMMITS_WEIGHT * exponential_cdf(commits as f64 / commits_median)
        + PRS_WEIGHT * exponential_cdf(prs as f64 / PRS_MEDIAN)
        + ISSUES_WEIGHT * exponential_cdf(issues as f64 / ISSUES_MEDIAN)
        + STARS_WEIGHT * exponential_cdf(stars as f64 / STARS_MEDIAN)
        + FOLLOWERS_WEIGHT * exponential_cdf(followers as f64 / FOLLOWERS_MEDIAN))
        / total_weight;

    let percentile = (1.0 - score) * 100.0;

    const THRESHOLDS: &[(f64, &str)] = &[
        (1.0, "S"),
        (12.5, "A+"),
        (25.0, "A"),
        (37.5, "A-"),
        (50.0, "B+"),
        (62.5, "B"),
        (75.0, "B-"),
        (87.5, "C+"),
        (100.0, "C"),
    ];

    let level = THRESHOLDS
        .iter()
        .find(|(bound, _)| percentile <= *bound)
        .map(|(_, level)| *level)
        .unwrap_or("C");

    Rank { level, percentile }
}
