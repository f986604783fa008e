// Blended similarity + recency scoring for retrieved candidates
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::index::Candidate;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReRankConfig {
    /// Weight for recency (0.0 = pure similarity, 1.0 = pure recency)
    pub recency_weight: f64,
    /// Age in days at which recency reaches zero
    pub horizon_days: f64,
    /// Age assumed for documents whose date is missing or unparseable
    pub undated_age_days: f64,
}

impl Default for ReRankConfig {
    fn default() -> Self {
        Self {
            recency_weight: 0.3,
            horizon_days: 730.0,
            undated_age_days: 365.0,
        }
    }
}

/// A candidate with its derived scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub candidate: Candidate,
    /// `1 / (1 + distance)`, in (0, 1]
    pub similarity: f64,
    /// Linear decay of document age, in [0, 1]
    pub recency_score: f64,
    pub blended_score: f64,
}

/// Map an L2-style distance into a bounded, higher-is-better similarity
pub fn similarity_from_distance(distance: f32) -> f64 {
    1.0 / (1.0 + f64::from(distance.max(0.0)))
}

/// Parse a loosely formatted date.
///
/// Accepts RFC 2822 (email headers, with or without a trailing
/// `(UTC)`-style comment), RFC 3339, and a few plain formats which are
/// taken as UTC. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_comment = match trimmed.rfind(" (") {
        Some(pos) if trimmed.ends_with(')') => trimmed[..pos].trim_end(),
        _ => trimmed,
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(dt.with_timezone(&Utc));
    }
    // Mail clients sometimes send a weekday that does not match the date
    if let Some((weekday, rest)) = without_comment.split_once(',') {
        if weekday.trim().chars().all(|c| c.is_ascii_alphabetic()) {
            if let Ok(dt) = DateTime::parse_from_rfc2822(rest.trim()) {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(without_comment) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(without_comment, "%d %b %Y %H:%M %z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_comment, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(without_comment, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}

/// Linear recency decay: 1.0 for today, 0.0 at `horizon_days` and beyond
pub fn recency_score(days_ago: f64, horizon_days: f64) -> f64 {
    if horizon_days <= 0.0 {
        return 0.0;
    }
    (1.0 - days_ago.max(0.0) / horizon_days).max(0.0)
}

/// Re-ranker blending similarity with document recency
#[derive(Debug, Clone)]
pub struct ReRanker {
    config: ReRankConfig,
}

impl ReRanker {
    /// Create new re-ranker with default config
    pub fn new() -> Self {
        Self {
            config: ReRankConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: ReRankConfig) -> Self {
        Self { config }
    }

    /// Age of a candidate in days relative to `now`.
    ///
    /// Future dates count as "now"; missing or unparseable dates get the
    /// configured undated age.
    pub fn days_ago(&self, candidate: &Candidate, now: DateTime<Utc>) -> f64 {
        match candidate.metadata.date.as_deref().and_then(parse_date) {
            Some(timestamp) => {
                let seconds = (now - timestamp).num_seconds() as f64;
                (seconds / SECONDS_PER_DAY).max(0.0)
            }
            None => self.config.undated_age_days,
        }
    }

    /// Score a single candidate
    pub fn score(&self, candidate: Candidate, now: DateTime<Utc>) -> RankedHit {
        let weight = self.config.recency_weight.clamp(0.0, 1.0);
        let similarity = similarity_from_distance(candidate.distance);
        let recency = recency_score(self.days_ago(&candidate, now), self.config.horizon_days);
        let blended_score = (1.0 - weight) * similarity + weight * recency;

        RankedHit {
            candidate,
            similarity,
            recency_score: recency,
            blended_score,
        }
    }

    /// Score all candidates and sort best first.
    ///
    /// The sort is stable, so candidates with equal blended scores keep the
    /// index's distance-ascending order.
    pub fn rerank(&self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<RankedHit> {
        let mut ranked: Vec<RankedHit> = candidates
            .into_iter()
            .map(|candidate| self.score(candidate, now))
            .collect();

        ranked.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));
        ranked
    }

    /// Get current configuration
    pub fn config(&self) -> &ReRankConfig {
        &self.config
    }

    /// Update configuration
    pub fn set_config(&mut self, config: ReRankConfig) {
        self.config = config;
    }
}

impl Default for ReRanker {
    fn default() -> Self {
        Self::new()
    }
}
