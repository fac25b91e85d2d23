//! # Sentiment and Impact Scoring
//!
//! Intentionally naive heuristics: literal keyword tables plus counting for
//! sentiment, and a reputation/recency/keyword sum for the 0-100 impact
//! score. No ML model is involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Keywords counting toward a positive label.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "surge", "rally", "gain", "bull", "soar", "record", "adoption", "growth", "profit",
    "upgrade", "breakout", "partnership", "approval",
];

/// Keywords counting toward a negative label.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "crash", "plunge", "drop", "bear", "fall", "loss", "hack", "ban", "lawsuit", "selloff",
    "downgrade", "fraud", "exploit",
];

/// High-signal topic flags adding to the impact score.
const IMPACT_FLAGS: &[&str] = &[
    "etf", "sec", "regulation", "halving", "fed", "rate", "institutional",
];

/// Source reputation table: substring match on the lowercase source name.
const SOURCE_REPUTATION: &[(&str, u32)] = &[
    ("reuters", 30),
    ("bloomberg", 30),
    ("coindesk", 25),
    ("the block", 25),
    ("cointelegraph", 20),
    ("cnbc", 20),
    ("forbes", 15),
    ("decrypt", 15),
];

/// Baseline score for any article before bonuses.
const BASE_SCORE: u32 = 20;

/// Sentiment label for a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| text.matches(kw).count()).sum()
}

/// Classify a text by counting keyword hits.
///
/// Strictly more positive hits than negative ones yields `positive`,
/// strictly more negative yields `negative`, and ties (including zero hits
/// on both sides) yield `neutral`.
pub fn classify(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = keyword_hits(&lower, POSITIVE_KEYWORDS);
    let negative = keyword_hits(&lower, NEGATIVE_KEYWORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

fn reputation_bonus(source: &str) -> u32 {
    let lower = source.to_lowercase();
    SOURCE_REPUTATION
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}

fn recency_bonus(published_at: DateTime<Utc>) -> u32 {
    let hours = (Utc::now() - published_at).num_hours().max(0);
    match hours {
        0 => 25,
        1..=5 => 18,
        6..=23 => 10,
        24..=71 => 4,
        _ => 0,
    }
}

fn flag_bonus(text: &str) -> u32 {
    let lower = text.to_lowercase();
    IMPACT_FLAGS
        .iter()
        .filter(|flag| lower.contains(*flag))
        .count() as u32
        * 8
}

/// Heuristic 0-100 rating of an article's likely market relevance.
///
/// Sum of a baseline, source reputation, recency, and topic flags, clamped
/// to [0, 100] for every input combination.
pub fn impact_score(source: &str, published_at: DateTime<Utc>, text: &str) -> u8 {
    let score = BASE_SCORE + reputation_bonus(source) + recency_bonus(published_at) + flag_bonus(text);
    score.min(100) as u8
}
