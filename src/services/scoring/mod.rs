pub mod reason;

use crate::config::{Config, ScoringConfig};
use crate::error::EngineResult;
use crate::models::*;
use crate::services::profile::ProfileService;
use crate::utils::{clamp_score, normalize_rating};
use crate::utils::validation::{validate_dietary_restrictions, validate_user_id};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// The scoring engine. Reads a profile snapshot and ranks a batch of candidate
/// restaurants; never mutates stored state.
pub struct ScoringService {
    profiles: Arc<ProfileService>,
    config: Arc<Config>,
}

impl ScoringService {
    pub fn new(profiles: Arc<ProfileService>, config: Arc<Config>) -> Self {
        Self { profiles, config }
    }

    /// Scores every candidate against the user's learned preferences and
    /// returns them best-first. Output length always equals input length;
    /// candidates with missing fields score with the documented defaults.
    pub async fn rank(
        &self,
        user_id: &str,
        candidates: Vec<Restaurant>,
        dietary_restrictions: &[String],
    ) -> EngineResult<Vec<ScoredRestaurant>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        validate_user_id(user_id)?;
        validate_dietary_restrictions(dietary_restrictions)?;

        let profile = self.profiles.get_profile(user_id).await?;
        let scoring = &self.config.scoring;

        let mut scored: Vec<ScoredRestaurant> = candidates
            .into_iter()
            .map(|restaurant| {
                let score =
                    composite_score(&profile, &restaurant, dietary_restrictions, scoring);
                let reason = reason::build_reason(&profile, &restaurant, score);
                ScoredRestaurant {
                    restaurant,
                    score,
                    reason,
                }
            })
            .collect();

        // Best first; ties fall back to base rating, then id, so the order is
        // reproducible across calls.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.restaurant
                        .rating_or_default()
                        .partial_cmp(&a.restaurant.rating_or_default())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.restaurant.id.cmp(&b.restaurant.id))
        });

        debug!("ranked {} candidates for user {}", scored.len(), user_id);
        Ok(scored)
    }
}

/// Weighted sum of the four preference sub-scores (plus dietary compliance when
/// restrictions are supplied), clamped to the configured range.
pub fn composite_score(
    profile: &UserProfile,
    restaurant: &Restaurant,
    dietary_restrictions: &[String],
    scoring: &ScoringConfig,
) -> f32 {
    let mut score = f64::from(restaurant.rating_or_default()) * scoring.rating_weight;
    score += distance_score(profile, restaurant.distance_or_default()) * scoring.distance_weight;
    score += cuisine_score(profile, &restaurant.cuisine_tags) * scoring.cuisine_weight;
    score += price_score(profile, restaurant.price_level_or_default()) * scoring.price_weight;
    if !dietary_restrictions.is_empty() {
        score += dietary_score(dietary_restrictions, &restaurant.dietary_flags)
            * scoring.dietary_weight;
    }
    clamp_score(score, scoring.max_score)
}

/// Share of historical selections in the bucket containing this distance; with
/// no history, closer is better and anything past 10 miles scores zero.
pub fn distance_score(profile: &UserProfile, distance_miles: f64) -> f64 {
    match profile.distance_affinity.share_for(distance_miles) {
        Some(share) => share,
        None => (1.0 - distance_miles / 10.0).max(0.0),
    }
}

/// Selection frequency blended with the average rating the user gave each
/// matching cuisine. Neutral 0.5 when the candidate is untagged or the user
/// has no cuisine history; capped at 1.0 across tags.
pub fn cuisine_score(profile: &UserProfile, cuisine_tags: &[String]) -> f64 {
    let affinity = &profile.cuisine_affinity;
    if cuisine_tags.is_empty() || affinity.total_selections == 0 {
        return 0.5;
    }

    let total = affinity.total_selections as f64;
    let mut score = 0.0;
    for tag in cuisine_tags {
        if let Some(stats) = affinity.get(tag) {
            let frequency = stats.selections as f64 / total;
            let rating = normalize_rating(stats.avg_rating);
            score += 0.7 * frequency + 0.3 * rating;
        }
    }
    score.min(1.0)
}

/// Share of historical selections at the candidate's price level; neutral 0.5
/// with no price history.
pub fn price_score(profile: &UserProfile, price_level: u8) -> f64 {
    profile
        .price_affinity
        .share_for(price_level)
        .unwrap_or(0.5)
}

/// Fraction of the supplied restrictions the candidate's dietary flags cover.
/// A candidate with no flags gives no signal and scores neutral.
pub fn dietary_score(dietary_restrictions: &[String], dietary_flags: &[String]) -> f64 {
    if dietary_flags.is_empty() || dietary_restrictions.is_empty() {
        return 0.5;
    }
    let flags: Vec<String> = dietary_flags
        .iter()
        .map(|f| f.trim().to_lowercase())
        .collect();
    let matched = dietary_restrictions
        .iter()
        .filter(|r| flags.contains(&r.trim().to_lowercase()))
        .count();
    matched as f64 / dietary_restrictions.len() as f64
}
