use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub const DEFAULT_DISTANCE_MILES: f64 = 10.0;
pub const DEFAULT_PRICE_LEVEL: u8 = 2;
pub const DEFAULT_RATING: f32 = 3.0;

/// Fixed mile ranges used to bucket distance selections.
pub const DISTANCE_RANGES: [(f64, f64); 5] = [
    (0.0, 1.0),
    (1.0, 3.0),
    (3.0, 7.0),
    (7.0, 15.0),
    (15.0, 25.0),
];

/// Maps a distance onto its bucket index. Ranges are left-closed/right-open,
/// so exactly 1.0 miles lands in the 1-3 bucket; anything past the last
/// internal edge lands in the final bucket.
pub fn distance_bucket_index(distance_miles: f64) -> usize {
    let distance = distance_miles.max(0.0);
    if distance < 1.0 {
        0
    } else if distance < 3.0 {
        1
    } else if distance < 7.0 {
        2
    } else if distance < 15.0 {
        3
    } else {
        4
    }
}

/// Cuisine names are matched case-insensitively across profiles and candidates.
pub fn normalize_cuisine(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub cuisine_tags: Vec<String>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub dietary_flags: Vec<String>,
}

impl Restaurant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating: None,
            price_level: None,
            cuisine_tags: Vec::new(),
            distance_miles: None,
            dietary_flags: Vec::new(),
        }
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_price_level(mut self, price_level: u8) -> Self {
        self.price_level = Some(price_level);
        self
    }

    pub fn with_cuisines(mut self, cuisine_tags: Vec<String>) -> Self {
        self.cuisine_tags = cuisine_tags;
        self
    }

    pub fn with_distance(mut self, distance_miles: f64) -> Self {
        self.distance_miles = Some(distance_miles);
        self
    }

    pub fn with_dietary_flags(mut self, dietary_flags: Vec<String>) -> Self {
        self.dietary_flags = dietary_flags;
        self
    }

    /// Base rating clamped to 0-5; missing or non-finite values fall back to 3.0.
    pub fn rating_or_default(&self) -> f32 {
        self.rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 5.0))
            .unwrap_or(DEFAULT_RATING)
    }

    /// Price level 1-4; anything else falls back to 2.
    pub fn price_level_or_default(&self) -> u8 {
        self.price_level
            .filter(|p| (1..=4).contains(p))
            .unwrap_or(DEFAULT_PRICE_LEVEL)
    }

    /// Distance from the route in miles; missing or negative values fall back to 10.0.
    pub fn distance_or_default(&self) -> f64 {
        self.distance_miles
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(DEFAULT_DISTANCE_MILES)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub score: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Selected,
    Visited,
    Dismissed,
    Rated,
}

impl InteractionKind {
    /// Only selections and visits feed the affinity sub-models; dismissals and
    /// standalone ratings are history-only.
    pub fn updates_affinity(self) -> bool {
        matches!(self, Self::Selected | Self::Visited)
    }

    /// Collapses a feedback report into an interaction kind. A visit outranks a
    /// like, which outranks a bare rating.
    pub fn from_feedback(feedback: &Feedback) -> Self {
        if feedback.visited {
            Self::Visited
        } else if feedback.liked {
            Self::Selected
        } else if feedback.rating.is_some() {
            Self::Rated
        } else {
            Self::Dismissed
        }
    }
}

/// User feedback on a recommendation, as reported by the app layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub visited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub cuisine_tags: Vec<String>,
    pub distance_miles: f64,
    pub price_level: u8,
    pub restaurant_rating: f32,
    pub kind: InteractionKind,
    pub trip_id: Option<String>,
    pub user_rating: Option<f32>,
}

impl Interaction {
    /// Builds an event from a restaurant snapshot, applying the documented
    /// defaults for any missing fields.
    pub fn from_parts(
        user_id: impl Into<String>,
        restaurant: &Restaurant,
        kind: InteractionKind,
        user_rating: Option<f32>,
        trip_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            restaurant_id: restaurant.id.clone(),
            restaurant_name: restaurant.name.clone(),
            cuisine_tags: restaurant.cuisine_tags.clone(),
            distance_miles: restaurant.distance_or_default(),
            price_level: restaurant.price_level_or_default(),
            restaurant_rating: restaurant.rating_or_default(),
            kind,
            trip_id,
            user_rating: user_rating.filter(|r| r.is_finite() && *r > 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBucket {
    pub min_miles: f64,
    pub max_miles: f64,
    pub selections: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceAffinity {
    #[serde(default = "default_distance_buckets")]
    pub buckets: Vec<DistanceBucket>,
    pub total_selections: u64,
}

fn default_distance_buckets() -> Vec<DistanceBucket> {
    DISTANCE_RANGES
        .iter()
        .map(|&(min_miles, max_miles)| DistanceBucket {
            min_miles,
            max_miles,
            selections: 0,
        })
        .collect()
}

impl Default for DistanceAffinity {
    fn default() -> Self {
        Self {
            buckets: default_distance_buckets(),
            total_selections: 0,
        }
    }
}

impl DistanceAffinity {
    pub fn record(&mut self, distance_miles: f64) {
        if self.buckets.len() != DISTANCE_RANGES.len() {
            self.buckets = default_distance_buckets();
        }
        let index = distance_bucket_index(distance_miles);
        self.buckets[index].selections += 1;
        self.total_selections += 1;
    }

    /// Fraction of historical selections that fell into the bucket containing
    /// this distance. `None` when there is no distance history yet.
    pub fn share_for(&self, distance_miles: f64) -> Option<f64> {
        if self.total_selections == 0 {
            return None;
        }
        let index = distance_bucket_index(distance_miles);
        let selections = self.buckets.get(index).map_or(0, |b| b.selections);
        Some(selections as f64 / self.total_selections as f64)
    }

    /// The bucket with the most selections, if any were recorded.
    pub fn preferred_bucket(&self) -> Option<&DistanceBucket> {
        self.buckets
            .iter()
            .filter(|b| b.selections > 0)
            .max_by_key(|b| b.selections)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuisineStats {
    pub selections: u64,
    pub total_rating: f64,
    pub rating_count: u64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuisineAffinity {
    #[serde(default)]
    pub cuisines: HashMap<String, CuisineStats>,
    pub total_selections: u64,
}

impl CuisineAffinity {
    pub fn record(&mut self, cuisine_tags: &[String], user_rating: Option<f32>) {
        for tag in cuisine_tags {
            let name = normalize_cuisine(tag);
            if name.is_empty() {
                continue;
            }
            let stats = self.cuisines.entry(name).or_default();
            stats.selections += 1;
            if let Some(rating) = user_rating.filter(|r| *r > 0.0) {
                stats.total_rating += f64::from(rating);
                stats.rating_count += 1;
                stats.avg_rating = stats.total_rating / stats.rating_count as f64;
            }
            self.total_selections += 1;
        }
    }

    pub fn get(&self, cuisine: &str) -> Option<&CuisineStats> {
        self.cuisines.get(&normalize_cuisine(cuisine))
    }

    /// Cuisines ordered by selection count, most selected first. Ties resolve
    /// alphabetically so the ordering is stable across runs.
    pub fn top_cuisines(&self, limit: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .cuisines
            .iter()
            .map(|(name, stats)| (name.clone(), stats.selections))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAffinity {
    #[serde(default)]
    pub levels: BTreeMap<u8, u64>,
    pub total_selections: u64,
}

impl PriceAffinity {
    pub fn record(&mut self, price_level: u8) {
        *self.levels.entry(price_level).or_insert(0) += 1;
        self.total_selections += 1;
    }

    /// Fraction of historical selections at this price level. `None` when there
    /// is no price history yet.
    pub fn share_for(&self, price_level: u8) -> Option<f64> {
        if self.total_selections == 0 {
            return None;
        }
        let selections = self.levels.get(&price_level).copied().unwrap_or(0);
        Some(selections as f64 / self.total_selections as f64)
    }

    pub fn preferred_level(&self) -> Option<u8> {
        self.levels
            .iter()
            .filter(|(_, count)| **count > 0)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(level, _)| *level)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub distance_affinity: DistanceAffinity,
    #[serde(default)]
    pub cuisine_affinity: CuisineAffinity,
    #[serde(default)]
    pub price_affinity: PriceAffinity,
    #[serde(default)]
    pub trip_ids: Vec<String>,
    #[serde(default)]
    pub total_interactions: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            distance_affinity: DistanceAffinity::default(),
            cuisine_affinity: CuisineAffinity::default(),
            price_affinity: PriceAffinity::default(),
            trip_ids: Vec::new(),
            total_interactions: 0,
            created_at: Utc::now(),
            last_interaction_at: None,
        }
    }

    /// Folds one interaction into the profile. The affinity sub-models and their
    /// running totals move together so the sum invariants hold after every call.
    /// Dismissals and standalone ratings only touch the bookkeeping fields.
    pub fn record(&mut self, interaction: &Interaction) {
        self.total_interactions += 1;
        self.last_interaction_at = Some(interaction.timestamp);
        if let Some(trip_id) = &interaction.trip_id {
            if !self.trip_ids.contains(trip_id) {
                self.trip_ids.push(trip_id.clone());
            }
        }
        if interaction.kind.updates_affinity() {
            self.distance_affinity.record(interaction.distance_miles);
            self.cuisine_affinity
                .record(&interaction.cuisine_tags, interaction.user_rating);
            self.price_affinity.record(interaction.price_level);
        }
    }

    pub fn trip_count(&self) -> usize {
        self.trip_ids.len()
    }
}

/// Derived view of what the engine has learned about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInsights {
    pub user_id: String,
    pub total_interactions: u64,
    pub trip_count: usize,
    pub top_cuisines: Vec<String>,
    pub preferred_distance: Option<DistanceBucket>,
    pub preferred_price_level: Option<u8>,
    pub last_interaction_at: Option<DateTime<Utc>>,
}

impl ProfileInsights {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            total_interactions: profile.total_interactions,
            trip_count: profile.trip_count(),
            top_cuisines: profile
                .cuisine_affinity
                .top_cuisines(5)
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
            preferred_distance: profile.distance_affinity.preferred_bucket().cloned(),
            preferred_price_level: profile.price_affinity.preferred_level(),
            last_interaction_at: profile.last_interaction_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_users: usize,
    pub total_interactions: u64,
}
