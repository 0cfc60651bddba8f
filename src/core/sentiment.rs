//! Keyword-based sentiment classification.
//!
//! The classifier counts how many keywords of each class occur as plain
//! substrings of the lower-cased text. There is no tokenization, so
//! "unfriendly" scores for both "friendly" and "unfriendly".

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::Display;
use thiserror::Error;

/// Confidence above which a negative result is flagged as `is_negative`.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;

const BASE_CONFIDENCE: f64 = 0.6;
const CONFIDENCE_STEP: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.9;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

const POSITIVE_KEYWORDS: &[&str] = &[
    "excellent",
    "amazing",
    "wonderful",
    "great",
    "fantastic",
    "love",
    "perfect",
    "outstanding",
    "exceptional",
    "brilliant",
    "superb",
    "awesome",
    "incredible",
    "good",
    "nice",
    "happy",
    "satisfied",
    "pleased",
    "comfortable",
    "clean",
    "friendly",
    "helpful",
    "professional",
    "recommend",
    "beautiful",
    "relaxing",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "terrible",
    "awful",
    "horrible",
    "hate",
    "worst",
    "disappointing",
    "bad",
    "poor",
    "unacceptable",
    "disgusting",
    "rude",
    "slow",
    "dirty",
    "broken",
    "uncomfortable",
    "noisy",
    "expensive",
    "crowded",
    "unfriendly",
    "unhelpful",
    "unprofessional",
    "outdated",
    "smelly",
    "cold",
    "hot",
    "boring",
];

static DEFAULT_CLASSIFIER: LazyLock<SentimentClassifier> =
    LazyLock::new(SentimentClassifier::default);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub scores: SentimentScores,
    pub is_negative: bool,
    pub timestamp: DateTime<Utc>,
    /// Set only on the degraded path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentimentResult {
    fn from_label(sentiment: SentimentLabel, confidence: f64) -> Self {
        let scores = match sentiment {
            SentimentLabel::Positive => SentimentScores {
                positive: confidence,
                negative: 1.0 - confidence,
            },
            SentimentLabel::Negative => SentimentScores {
                positive: 1.0 - confidence,
                negative: confidence,
            },
            SentimentLabel::Neutral => SentimentScores {
                positive: 1.0 - confidence,
                negative: 1.0 - confidence,
            },
        };

        SentimentResult {
            sentiment,
            confidence,
            scores,
            is_negative: sentiment == SentimentLabel::Negative
                && confidence > HIGH_CONFIDENCE_THRESHOLD,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Neutral fallback returned when classification itself fails.
    pub fn degraded(error: impl Into<String>) -> Self {
        SentimentResult {
            error: Some(error.into()),
            ..Self::from_label(SentimentLabel::Neutral, NEUTRAL_CONFIDENCE)
        }
    }
}

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("lexicon contains an empty {0} keyword")]
    EmptyKeyword(SentimentLabel),
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Lexicon {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Lexicon {
            positive: positive
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            negative: negative
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), SentimentError> {
        if self.positive.iter().any(|k| k.is_empty()) {
            return Err(SentimentError::EmptyKeyword(SentimentLabel::Positive));
        }
        if self.negative.iter().any(|k| k.is_empty()) {
            return Err(SentimentError::EmptyKeyword(SentimentLabel::Negative));
        }
        Ok(())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon::new(POSITIVE_KEYWORDS, NEGATIVE_KEYWORDS)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentClassifier {
    lexicon: Lexicon,
}

impl SentimentClassifier {
    pub fn new(lexicon: Lexicon) -> Self {
        SentimentClassifier { lexicon }
    }

    /// Classifies `text`. Never fails: internal errors produce a neutral
    /// result with confidence 0.5 and the error recorded in `error`.
    pub fn classify(&self, text: &str) -> SentimentResult {
        self.try_classify(text).unwrap_or_else(|e| {
            warn!("sentiment classification degraded: {e}");
            SentimentResult::degraded(e.to_string())
        })
    }

    pub fn try_classify(&self, text: &str) -> Result<SentimentResult, SentimentError> {
        self.lexicon.validate()?;

        let text = text.to_lowercase();
        let hits = |keywords: &[String]| keywords.iter().filter(|k| text.contains(k.as_str())).count();
        let positive = hits(&self.lexicon.positive);
        let negative = hits(&self.lexicon.negative);

        let result = if positive > negative {
            SentimentResult::from_label(SentimentLabel::Positive, confidence_for(positive))
        } else if negative > positive {
            SentimentResult::from_label(SentimentLabel::Negative, confidence_for(negative))
        } else {
            SentimentResult::from_label(SentimentLabel::Neutral, NEUTRAL_CONFIDENCE)
        };

        Ok(result)
    }

    /// Classifies each text independently, preserving order.
    pub fn analyze_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SentimentResult> {
        texts.iter().map(|t| self.classify(t.as_ref())).collect()
    }
}

fn confidence_for(hits: usize) -> f64 {
    (BASE_CONFIDENCE + CONFIDENCE_STEP * hits as f64).min(MAX_CONFIDENCE)
}

/// Classifies with the built-in lexicon.
pub fn classify(text: &str) -> SentimentResult {
    DEFAULT_CLASSIFIER.classify(text)
}

/// Batch classification with the built-in lexicon.
pub fn analyze_batch<S: AsRef<str>>(texts: &[S]) -> Vec<SentimentResult> {
    DEFAULT_CLASSIFIER.analyze_batch(texts)
}
