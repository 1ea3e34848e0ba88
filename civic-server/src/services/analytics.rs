//! Aggregate sentiment analytics over completed submissions

use civic_common::{
    AnalyticsSnapshot, FeedbackSubmission, ProcessingStatus, SentimentDistribution, SentimentLabel,
};
use std::collections::{BTreeMap, BTreeSet};

/// Negative share above which a group is reported
const NEGATIVE_THRESHOLD: u32 = 30;
/// Positive share below which a group is reported and a recommendation made
const POSITIVE_THRESHOLD: u32 = 40;

const NEGATIVE_INSIGHT_MARKER: &str = "negative sentiment";
const LOW_SATISFACTION_MARKER: &str = "low satisfaction";

#[derive(Default)]
struct LabelCounts {
    positive: u32,
    neutral: u32,
    negative: u32,
    total: u32,
}

impl LabelCounts {
    /// Unlabeled records count toward the total only
    fn add(&mut self, label: Option<SentimentLabel>) {
        self.total += 1;
        match label {
            Some(SentimentLabel::Positive) => self.positive += 1,
            Some(SentimentLabel::Neutral) => self.neutral += 1,
            Some(SentimentLabel::Negative) => self.negative += 1,
            None => {}
        }
    }

    /// Each share rounded on its own, so the three may not sum to 100
    fn percentages(&self) -> SentimentDistribution {
        SentimentDistribution {
            positive: percentage(self.positive, self.total),
            neutral: percentage(self.neutral, self.total),
            negative: percentage(self.negative, self.total),
        }
    }
}

/// `round(count / total * 100)`, half away from zero
fn percentage(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(count) / f64::from(total) * 100.0).round() as u32
}

/// Compute a snapshot from all submissions; only completed ones count
pub fn compute_snapshot(submissions: &[FeedbackSubmission]) -> AnalyticsSnapshot {
    let completed: Vec<&FeedbackSubmission> = submissions
        .iter()
        .filter(|s| s.processing_status == ProcessingStatus::Completed)
        .collect();

    if completed.is_empty() {
        return AnalyticsSnapshot::empty();
    }

    let translated_count = completed.iter().filter(|s| s.was_translated()).count() as u32;

    let groups: BTreeSet<&str> = completed
        .iter()
        .flat_map(|s| s.demographic_tags.iter().map(String::as_str))
        .collect();

    let mut overall = LabelCounts::default();
    for submission in &completed {
        overall.add(submission.sentiment_label);
    }

    let mut demographic_sentiment = BTreeMap::new();
    for group in &groups {
        let mut counts = LabelCounts::default();
        for submission in completed.iter().filter(|s| s.has_tag(group)) {
            counts.add(submission.sentiment_label);
        }
        demographic_sentiment.insert((*group).to_string(), counts.percentages());
    }

    let mut insights = Vec::new();
    let mut recommendations = Vec::new();
    for (group, distribution) in &demographic_sentiment {
        if distribution.negative > NEGATIVE_THRESHOLD {
            insights.push(format!(
                "{} communities report {}% {}",
                group, distribution.negative, NEGATIVE_INSIGHT_MARKER
            ));
        }
        if distribution.positive < POSITIVE_THRESHOLD {
            insights.push(format!(
                "{} communities show {} ({}% positive)",
                group, LOW_SATISFACTION_MARKER, distribution.positive
            ));
            recommendations.push(format!(
                "Implement targeted engagement programs for {} communities",
                group
            ));
        }
    }

    let representation_gaps = insights
        .iter()
        .filter(|i| i.contains(NEGATIVE_INSIGHT_MARKER) || i.contains(LOW_SATISFACTION_MARKER))
        .count() as u32;

    AnalyticsSnapshot {
        total_feedback: overall.total,
        translated_count,
        demographic_groups: groups.len() as u32,
        representation_gaps,
        sentiment_distribution: overall.percentages(),
        demographic_sentiment,
        insights,
        recommendations,
    }
}
