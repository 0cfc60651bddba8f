//! Feedback submissions and the analytics built over stored records.

use crate::core::error::{CoreError, CoreResult};
use crate::core::sentiment::{HIGH_CONFIDENCE_THRESHOLD, SentimentLabel};
use crate::infrastructure::entities::{FeedbackCategory, FeedbackRecord, GuestProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
pub const MAX_BATCH: usize = 10;
pub const MAX_SUMMARY_DAYS: u32 = 365;
/// Most recent submissions considered when scoring recommendation uptake.
pub const EFFECTIVENESS_SAMPLE: usize = 3;
/// Ratings at or above this count as a positive outcome.
pub const SATISFIED_RATING: u8 = 4;

/// A submission as received from the caller. Every field is optional here so
/// that missing fields are reported as validation failures naming the field.
/// The rating is kept as raw JSON so a wrongly typed value (`4.5`, `"5"`) is
/// reported against `rating` rather than failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackSubmission {
    pub category: Option<String>,
    pub rating: Option<Value>,
    pub subject: Option<String>,
    pub comment: Option<String>,
    pub location: Option<String>,
    pub staff_member: Option<String>,
    pub anonymous: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub category: FeedbackCategory,
    pub rating: u8,
    pub subject: String,
    pub comment: String,
    pub location: Option<String>,
    pub staff_member: Option<String>,
    pub anonymous: bool,
}

fn required(field: &'static str, value: Option<String>) -> CoreResult<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(CoreError::validation(field, "is required and must not be empty")),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_rating(value: Option<Value>) -> CoreResult<u8> {
    let rating = match value {
        None | Some(Value::Null) => return Err(CoreError::validation("rating", "is required")),
        Some(Value::Number(n)) => n.as_i64(),
        Some(_) => None,
    };
    match rating {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(r as u8),
        Some(r) => Err(CoreError::validation(
            "rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}, got {r}"),
        )),
        None => Err(CoreError::validation(
            "rating",
            format!("must be an integer between {MIN_RATING} and {MAX_RATING}"),
        )),
    }
}

impl FeedbackSubmission {
    pub fn validate(self) -> CoreResult<ValidSubmission> {
        let category = required("category", self.category)?;
        let category = FeedbackCategory::from_str(&category).map_err(|_| {
            CoreError::validation("category", format!("unknown category '{category}'"))
        })?;

        let rating = parse_rating(self.rating)?;

        Ok(ValidSubmission {
            category,
            rating,
            subject: required("subject", self.subject)?,
            comment: required("comment", self.comment)?,
            location: optional(self.location),
            staff_member: optional(self.staff_member),
            anonymous: self.anonymous.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub feedback_id: String,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub alert_created: bool,
    pub alert_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    fn from_records<'a>(records: impl IntoIterator<Item = &'a FeedbackRecord>) -> SentimentCounts {
        let mut counts = SentimentCounts::default();
        for record in records {
            counts.add(record.sentiment.sentiment);
        }
        counts
    }

    fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn shares(&self) -> SentimentShares {
        let total = self.total();
        SentimentShares {
            positive_percentage: percentage(self.positive, total),
            negative_percentage: percentage(self.negative, total),
            neutral_percentage: percentage(self.neutral, total),
        }
    }
}

/// Percentages rounded to one decimal. All zero when nothing was counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentShares {
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub neutral_percentage: f64,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

/// Aggregate over the feedback received in a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub period_days: u32,
    pub total: usize,
    pub average_rating: Option<f64>,
    pub sentiment: SentimentCounts,
    pub ratings: BTreeMap<u8, usize>,
    pub high_confidence_negative: usize,
}

impl FeedbackSummary {
    pub fn from_records(period_days: u32, records: &[FeedbackRecord]) -> FeedbackSummary {
        let mut ratings: BTreeMap<u8, usize> = (1..=MAX_RATING as u8).map(|r| (r, 0)).collect();
        let mut high_confidence_negative = 0;

        for record in records {
            *ratings.entry(record.rating).or_default() += 1;
            if record.sentiment.sentiment == SentimentLabel::Negative
                && record.sentiment.confidence > HIGH_CONFIDENCE_THRESHOLD
            {
                high_confidence_negative += 1;
            }
        }

        FeedbackSummary {
            period_days,
            total: records.len(),
            average_rating: average_rating(records),
            sentiment: SentimentCounts::from_records(records),
            ratings,
            high_confidence_negative,
        }
    }
}

/// Sentiment mix for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub total: usize,
    #[serde(flatten)]
    pub shares: SentimentShares,
}

/// Day-by-day sentiment over a trailing window, oldest day first. Days
/// without feedback are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentTrends {
    pub period_days: u32,
    pub total: usize,
    pub trends: Vec<DailySentiment>,
}

impl SentimentTrends {
    pub fn from_records(period_days: u32, records: &[FeedbackRecord]) -> SentimentTrends {
        let mut days: BTreeMap<NaiveDate, SentimentCounts> = BTreeMap::new();
        for record in records {
            days.entry(record.submitted_at.date_naive())
                .or_default()
                .add(record.sentiment.sentiment);
        }

        SentimentTrends {
            period_days,
            total: records.len(),
            trends: days
                .into_iter()
                .map(|(date, counts)| DailySentiment {
                    date,
                    total: counts.total(),
                    shares: counts.shares(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceAnalysis {
    pub cuisine: Option<String>,
    pub activity_level: Option<String>,
    pub loyalty_tier: String,
    /// Submissions per category.
    pub feedback_topics: BTreeMap<String, usize>,
    /// Category with the most submissions. Ties go to the one used first.
    pub most_discussed_topic: Option<FeedbackCategory>,
}

/// Share of the guest's latest submissions rated [`SATISFIED_RATING`] or better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationEffectiveness {
    pub effectiveness_score: f64,
    pub sample_size: usize,
    pub recent_positive_feedback: usize,
}

/// Everything staff see about one guest's feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestInsights {
    pub guest_id: String,
    pub guest_name: String,
    pub total_feedback: usize,
    pub average_rating: Option<f64>,
    pub sentiment: SentimentCounts,
    pub sentiment_shares: SentimentShares,
    pub preference_analysis: PreferenceAnalysis,
    pub recommendations_effectiveness: RecommendationEffectiveness,
}

impl GuestInsights {
    /// `records` must be the guest's history, most recent first.
    pub fn build(profile: &GuestProfile, records: &[FeedbackRecord]) -> GuestInsights {
        let sentiment = SentimentCounts::from_records(records);

        let mut topics: Vec<(FeedbackCategory, usize)> = Vec::new();
        for record in records.iter().rev() {
            match topics.iter_mut().find(|(category, _)| *category == record.category) {
                Some((_, count)) => *count += 1,
                None => topics.push((record.category, 1)),
            }
        }
        let mut most_discussed_topic: Option<(FeedbackCategory, usize)> = None;
        for &(category, count) in &topics {
            if most_discussed_topic.is_none_or(|(_, best)| count > best) {
                most_discussed_topic = Some((category, count));
            }
        }

        let recent = &records[..records.len().min(EFFECTIVENESS_SAMPLE)];
        let recent_positive_feedback = recent
            .iter()
            .filter(|r| r.rating >= SATISFIED_RATING)
            .count();

        GuestInsights {
            guest_id: profile.guest_id.clone(),
            guest_name: profile.display_name.clone(),
            total_feedback: records.len(),
            average_rating: average_rating(records),
            sentiment,
            sentiment_shares: sentiment.shares(),
            preference_analysis: PreferenceAnalysis {
                cuisine: profile.preferences.cuisine.clone(),
                activity_level: profile.preferences.activity_level.clone(),
                loyalty_tier: profile.loyalty_tier.clone(),
                feedback_topics: topics
                    .iter()
                    .map(|(category, count)| (category.to_string(), *count))
                    .collect(),
                most_discussed_topic: most_discussed_topic.map(|(category, _)| category),
            },
            recommendations_effectiveness: RecommendationEffectiveness {
                effectiveness_score: percentage(recent_positive_feedback, recent.len()),
                sample_size: recent.len(),
                recent_positive_feedback,
            },
        }
    }
}

/// Mean rating rounded to two decimals, `None` for no records.
pub fn average_rating(records: &[FeedbackRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: u32 = records.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(sum) / records.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::generate_id;
    use crate::core::sentiment::classify;
    use crate::infrastructure::entities::{FeedbackStatus, GuestPreferences};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn submission() -> FeedbackSubmission {
        FeedbackSubmission {
            category: Some("dining".to_owned()),
            rating: Some(json!(4)),
            subject: Some("  Dinner  ".to_owned()),
            comment: Some("The pasta was delicious".to_owned()),
            location: Some("   ".to_owned()),
            staff_member: Some("Marco".to_owned()),
            anonymous: None,
        }
    }

    fn record(rating: u8, comment: &str) -> FeedbackRecord {
        FeedbackRecord {
            feedback_id: generate_id("FB", Utc::now()),
            guest_id: "guest_001".to_owned(),
            guest_name: "Ada Lovelace".to_owned(),
            rating,
            category: FeedbackCategory::General,
            subject: "Stay".to_owned(),
            comment: comment.to_owned(),
            location: None,
            staff_member: None,
            anonymous: false,
            sentiment: classify(comment),
            submitted_at: Utc::now(),
            status: FeedbackStatus::New,
        }
    }

    fn rejected_field(submission: FeedbackSubmission) -> &'static str {
        match submission.validate() {
            Err(CoreError::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_submission_is_normalized() {
        let valid = submission().validate().unwrap();
        assert_eq!(valid.category, FeedbackCategory::Dining);
        assert_eq!(valid.rating, 4);
        assert_eq!(valid.subject, "Dinner");
        assert_eq!(valid.location, None);
        assert_eq!(valid.staff_member.as_deref(), Some("Marco"));
        assert!(!valid.anonymous);
    }

    #[test]
    fn test_rating_bounds() {
        for rating in [0, 6, -1] {
            let s = FeedbackSubmission {
                rating: Some(json!(rating)),
                ..submission()
            };
            assert_eq!(rejected_field(s), "rating");
        }
        for rating in 1..=5 {
            let s = FeedbackSubmission {
                rating: Some(json!(rating)),
                ..submission()
            };
            assert!(s.validate().is_ok());
        }
    }

    #[test]
    fn test_wrongly_typed_rating_names_the_field() {
        for rating in [json!(4.5), json!("5"), json!(true), json!([4]), Value::Null] {
            let s = FeedbackSubmission {
                rating: Some(rating),
                ..submission()
            };
            assert_eq!(rejected_field(s), "rating");
        }
    }

    #[test]
    fn test_rating_read_from_json_body() {
        let s: FeedbackSubmission = serde_json::from_value(json!({
            "category": "room",
            "rating": 4.5,
            "subject": "Stay",
            "comment": "fine"
        }))
        .unwrap();
        assert_eq!(rejected_field(s), "rating");

        let s: FeedbackSubmission = serde_json::from_value(json!({
            "category": "room",
            "rating": 2,
            "subject": "Stay",
            "comment": "fine"
        }))
        .unwrap();
        assert_eq!(s.validate().unwrap().rating, 2);
    }

    #[test]
    fn test_missing_or_blank_fields() {
        assert_eq!(
            rejected_field(FeedbackSubmission {
                rating: None,
                ..submission()
            }),
            "rating"
        );
        assert_eq!(
            rejected_field(FeedbackSubmission {
                category: None,
                ..submission()
            }),
            "category"
        );
        assert_eq!(
            rejected_field(FeedbackSubmission {
                subject: Some("   ".to_owned()),
                ..submission()
            }),
            "subject"
        );
        assert_eq!(
            rejected_field(FeedbackSubmission {
                comment: Some(String::new()),
                ..submission()
            }),
            "comment"
        );
    }

    #[test]
    fn test_unknown_category() {
        let s = FeedbackSubmission {
            category: Some("parking".to_owned()),
            ..submission()
        };
        assert_eq!(rejected_field(s), "category");

        let s = FeedbackSubmission {
            category: Some("Business_Services".to_owned()),
            ..submission()
        };
        assert_eq!(
            s.validate().unwrap().category,
            FeedbackCategory::BusinessServices
        );
    }

    #[test]
    fn test_summary() {
        let records = vec![
            record(5, "amazing and wonderful and excellent"),
            record(1, "terrible, awful, horrible"),
            record(3, "it was adequate"),
            record(4, "good"),
        ];
        let summary = FeedbackSummary::from_records(7, &records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.average_rating, Some(3.25));
        assert_eq!(
            summary.sentiment,
            SentimentCounts {
                positive: 2,
                negative: 1,
                neutral: 1
            }
        );
        assert_eq!(summary.ratings[&1], 1);
        assert_eq!(summary.ratings[&2], 0);
        assert_eq!(summary.high_confidence_negative, 1);
    }

    fn profile() -> GuestProfile {
        GuestProfile {
            guest_id: "guest_001".to_owned(),
            display_name: "Ada Lovelace".to_owned(),
            loyalty_tier: "Gold".to_owned(),
            preferences: GuestPreferences {
                cuisine: Some("Italian".to_owned()),
                activity_level: None,
            },
        }
    }

    fn in_category(category: FeedbackCategory, rating: u8, comment: &str) -> FeedbackRecord {
        FeedbackRecord {
            category,
            ..record(rating, comment)
        }
    }

    #[test]
    fn test_daily_trends() {
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let at = |when, rating, comment| FeedbackRecord {
            submitted_at: when,
            ..record(rating, comment)
        };
        let records = vec![
            at(monday + Duration::days(1), 1, "terrible and awful"),
            at(monday + Duration::hours(14), 3, "it was adequate"),
            at(monday, 5, "excellent"),
            at(monday + Duration::hours(2), 4, "great"),
        ];

        let trends = SentimentTrends::from_records(30, &records);
        assert_eq!(trends.period_days, 30);
        assert_eq!(trends.total, 4);
        assert_eq!(trends.trends.len(), 2);

        let first = &trends.trends[0];
        assert_eq!(first.date, monday.date_naive());
        assert_eq!(first.total, 3);
        assert_eq!(first.shares.positive_percentage, 66.7);
        assert_eq!(first.shares.neutral_percentage, 33.3);
        assert_eq!(first.shares.negative_percentage, 0.0);

        let second = &trends.trends[1];
        assert_eq!(second.total, 1);
        assert_eq!(second.shares.negative_percentage, 100.0);

        assert!(SentimentTrends::from_records(7, &[]).trends.is_empty());
    }

    #[test]
    fn test_guest_insights() {
        // most recent first
        let records = vec![
            in_category(FeedbackCategory::Room, 2, "noisy and dirty"),
            in_category(FeedbackCategory::Dining, 5, "excellent pasta"),
            in_category(FeedbackCategory::Room, 4, "good"),
            in_category(FeedbackCategory::Dining, 1, "terrible"),
        ];

        let insights = GuestInsights::build(&profile(), &records);
        assert_eq!(insights.guest_name, "Ada Lovelace");
        assert_eq!(insights.total_feedback, 4);
        assert_eq!(insights.average_rating, Some(3.0));
        assert_eq!(insights.sentiment.total(), 4);
        assert_eq!(insights.sentiment_shares.negative_percentage, 50.0);

        let preferences = &insights.preference_analysis;
        assert_eq!(preferences.cuisine.as_deref(), Some("Italian"));
        assert_eq!(preferences.feedback_topics["room"], 2);
        assert_eq!(preferences.feedback_topics["dining"], 2);
        // tie: dining was raised first
        assert_eq!(preferences.most_discussed_topic, Some(FeedbackCategory::Dining));

        let effectiveness = insights.recommendations_effectiveness;
        assert_eq!(effectiveness.sample_size, 3);
        assert_eq!(effectiveness.recent_positive_feedback, 2);
        assert_eq!(effectiveness.effectiveness_score, 66.7);
    }

    #[test]
    fn test_guest_insights_without_feedback() {
        let insights = GuestInsights::build(&profile(), &[]);
        assert_eq!(insights.total_feedback, 0);
        assert_eq!(insights.average_rating, None);
        assert_eq!(insights.sentiment_shares, SentimentShares::default());
        assert!(insights.preference_analysis.feedback_topics.is_empty());
        assert_eq!(insights.preference_analysis.most_discussed_topic, None);
        assert_eq!(insights.recommendations_effectiveness.sample_size, 0);
        assert_eq!(insights.recommendations_effectiveness.effectiveness_score, 0.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = FeedbackSummary::from_records(30, &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_rating, None);
        assert_eq!(summary.ratings.len(), 5);
    }
}
