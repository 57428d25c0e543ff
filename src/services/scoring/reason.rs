use crate::models::{Restaurant, UserProfile};

const HIGH_SCORE: f32 = 4.0;
const GOOD_SCORE: f32 = 3.0;
const VERY_CLOSE_MILES: f64 = 2.0;
const CONVENIENT_MILES: f64 = 5.0;
const HIGHLY_RATED: f32 = 4.5;

/// Builds the human-readable explanation attached to each scored candidate:
/// a score-tier clause, then a cuisine-match clause for the first tag the user
/// has selected before, a proximity clause, and a quality clause.
pub fn build_reason(profile: &UserProfile, restaurant: &Restaurant, score: f32) -> String {
    let mut reasons: Vec<String> = Vec::new();

    let tier = if score >= HIGH_SCORE {
        "Highly recommended based on your preferences"
    } else if score >= GOOD_SCORE {
        "Good match for your tastes"
    } else {
        "Might be worth trying"
    };
    reasons.push(tier.to_string());

    for tag in &restaurant.cuisine_tags {
        let known = profile
            .cuisine_affinity
            .get(tag)
            .is_some_and(|stats| stats.selections > 0);
        if known {
            reasons.push(format!("You've enjoyed {} food before", tag.trim()));
            break;
        }
    }

    let distance = restaurant.distance_or_default();
    if distance <= VERY_CLOSE_MILES {
        reasons.push("Very close to your route".to_string());
    } else if distance <= CONVENIENT_MILES {
        reasons.push("Conveniently located".to_string());
    }

    if restaurant.rating_or_default() >= HIGHLY_RATED {
        reasons.push("Highly rated by other customers".to_string());
    }

    reasons.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interaction, InteractionKind};

    #[test]
    fn test_score_tiers() {
        let profile = UserProfile::new("u1");
        let restaurant = Restaurant::new("r1", "Plain").with_distance(8.0);

        assert!(build_reason(&profile, &restaurant, 4.2).starts_with("Highly recommended"));
        assert!(build_reason(&profile, &restaurant, 3.1).starts_with("Good match"));
        assert!(build_reason(&profile, &restaurant, 1.2).starts_with("Might be worth trying"));
    }

    #[test]
    fn test_proximity_and_quality_clauses() {
        let profile = UserProfile::new("u1");

        let near = Restaurant::new("r1", "Near").with_distance(1.5).with_rating(4.8);
        let reason = build_reason(&profile, &near, 1.5);
        assert!(reason.contains("Very close to your route"));
        assert!(reason.contains("Highly rated by other customers"));

        let close = Restaurant::new("r2", "Close").with_distance(4.0).with_rating(3.9);
        let reason = build_reason(&profile, &close, 1.5);
        assert!(reason.contains("Conveniently located"));
        assert!(!reason.contains("Highly rated"));

        let far = Restaurant::new("r3", "Far").with_distance(12.0);
        let reason = build_reason(&profile, &far, 1.5);
        assert!(!reason.contains("close"));
        assert!(!reason.contains("Conveniently"));
    }

    #[test]
    fn test_cuisine_clause_needs_prior_selections() {
        let mut profile = UserProfile::new("u1");
        let tagged = Restaurant::new("r1", "Luigi's")
            .with_cuisines(vec!["Italian".to_string()])
            .with_distance(8.0);

        let reason = build_reason(&profile, &tagged, 1.5);
        assert!(!reason.contains("enjoyed"));

        let interaction =
            Interaction::from_parts("u1", &tagged, InteractionKind::Selected, None, None);
        profile.record(&interaction);

        let reason = build_reason(&profile, &tagged, 1.5);
        assert!(reason.contains("You've enjoyed Italian food before"));
    }
}
