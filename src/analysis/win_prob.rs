use serde::{Deserialize, Serialize};

use crate::models::{InjuryImpact, Sport, Team};

/// Version tag attached to every board record produced with the house weights
pub const HOUSE_MODEL_VERSION: &str = "v1";

/// Weight vector applied to the model inputs.
/// `recent_form` and `conference` are accepted and persisted but do not
/// enter the formula yet; they exist so user configs stay forward-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub rating: f64,
    pub hfa: f64,
    pub injury: f64,
    pub recent_form: f64,
    pub conference: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            rating: 1.0,
            hfa: 1.0,
            injury: 1.0,
            recent_form: 1.0,
            conference: 1.0,
        }
    }
}

/// The fixed house parameterization: uniform weights, versioned as
/// [`HOUSE_MODEL_VERSION`]. Never mutated at runtime.
pub const HOUSE_WEIGHTS: ModelWeights = ModelWeights {
    rating: 1.0,
    hfa: 1.0,
    injury: 1.0,
    recent_form: 1.0,
    conference: 1.0,
};

/// Per-sport model constants
#[derive(Debug, Clone, Copy)]
pub struct SportParams {
    /// Home advantage in rating points when not at a neutral site
    pub hfa: f64,
    /// Logistic scale; smaller values push probabilities toward the extremes
    pub scale: f64,
}

impl SportParams {
    pub fn for_sport(sport: Sport) -> Self {
        match sport {
            Sport::Cbb => SportParams { hfa: 3.5, scale: 15.0 },
            // Golf events have no head-to-head model; game params are
            // only meaningful for CFB/CBB.
            Sport::Cfb | Sport::Golf => SportParams { hfa: 3.0, scale: 15.0 },
        }
    }
}

/// Sum the injury magnitudes reported against `team_id`, scaled by the
/// injury weight. Accumulation is linear and uncapped: three high-impact
/// reports count three times.
pub fn injury_adjustment(injuries: &[InjuryImpact], team_id: u32, weight: f64) -> f64 {
    let adj: f64 = injuries
        .iter()
        .filter(|inj| inj.team_id == team_id)
        .map(|inj| inj.impact_level.magnitude())
        .sum();
    adj * weight
}

/// Home win probability from team ratings, venue, and injury reports.
///
/// Rating difference, home advantage, and the injury differential (scaled
/// to rating units; away injuries favor home) combine into one score which
/// a logistic transform maps to a probability. The result is clamped to
/// [0.01, 0.99] so downstream odds math never divides by zero.
pub fn win_probability(
    home: &Team,
    away: &Team,
    neutral_site: bool,
    injuries: &[InjuryImpact],
    weights: &ModelWeights,
    params: SportParams,
) -> f64 {
    let rating_diff = (home.rating - away.rating) * weights.rating;

    let hfa = if neutral_site { 0.0 } else { params.hfa * weights.hfa };

    let home_injury = injury_adjustment(injuries, home.id, weights.injury);
    let away_injury = injury_adjustment(injuries, away.id, weights.injury);
    let injury_effect = (away_injury - home_injury) * 100.0;

    let score = rating_diff + hfa + injury_effect;
    let prob = 1.0 / (1.0 + (-score / params.scale).exp());

    prob.clamp(0.01, 0.99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImpactLevel;
    use uuid::Uuid;

    fn team(id: u32, rating: f64) -> Team {
        Team {
            id,
            name: format!("Team {}", id),
            conference_id: 1,
            rating,
        }
    }

    fn injury(team_id: u32, level: ImpactLevel) -> InjuryImpact {
        InjuryImpact {
            game_id: Uuid::nil(),
            team_id,
            impact_level: level,
            notes: String::new(),
        }
    }

    #[test]
    fn test_equal_ratings_neutral_site_is_even() {
        let home = team(1, 80.0);
        let away = team(2, 80.0);
        let p = win_probability(
            &home,
            &away,
            true,
            &[],
            &HOUSE_WEIGHTS,
            SportParams::for_sport(Sport::Cfb),
        );
        assert_eq!(p, 0.5);
    }

    #[test]
    fn test_home_field_advantage_favors_home() {
        let home = team(1, 80.0);
        let away = team(2, 80.0);
        let p = win_probability(
            &home,
            &away,
            false,
            &[],
            &HOUSE_WEIGHTS,
            SportParams::for_sport(Sport::Cfb),
        );
        assert!(p > 0.5 && p < 0.6);
    }

    #[test]
    fn test_deterministic() {
        let home = team(1, 85.3);
        let away = team(2, 77.9);
        let injuries = vec![injury(1, ImpactLevel::Med), injury(2, ImpactLevel::High)];
        let params = SportParams::for_sport(Sport::Cbb);
        let a = win_probability(&home, &away, false, &injuries, &HOUSE_WEIGHTS, params);
        let b = win_probability(&home, &away, false, &injuries, &HOUSE_WEIGHTS, params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let strong = team(1, 500.0);
        let weak = team(2, 0.0);
        let params = SportParams::for_sport(Sport::Cfb);
        let high = win_probability(&strong, &weak, true, &[], &HOUSE_WEIGHTS, params);
        let low = win_probability(&weak, &strong, true, &[], &HOUSE_WEIGHTS, params);
        assert_eq!(high, 0.99);
        assert_eq!(low, 0.01);
    }

    #[test]
    fn test_away_injuries_favor_home() {
        let home = team(1, 80.0);
        let away = team(2, 80.0);
        let injuries = vec![injury(2, ImpactLevel::High)];
        let params = SportParams::for_sport(Sport::Cfb);
        let baseline = win_probability(&home, &away, true, &[], &HOUSE_WEIGHTS, params);
        let with_injury = win_probability(&home, &away, true, &injuries, &HOUSE_WEIGHTS, params);
        assert!(with_injury > baseline);
    }

    #[test]
    fn test_injuries_accumulate_linearly() {
        let one = vec![injury(1, ImpactLevel::Med)];
        let three = vec![
            injury(1, ImpactLevel::Med),
            injury(1, ImpactLevel::Med),
            injury(1, ImpactLevel::Med),
        ];
        assert!((injury_adjustment(&one, 1, 1.0) - 0.03).abs() < 1e-12);
        assert!((injury_adjustment(&three, 1, 1.0) - 0.09).abs() < 1e-12);
        // reports against the other team do not count
        assert_eq!(injury_adjustment(&one, 2, 1.0), 0.0);
    }

    #[test]
    fn test_user_weights_shift_probability() {
        let home = team(1, 84.0);
        let away = team(2, 80.0);
        let params = SportParams::for_sport(Sport::Cfb);
        let house = win_probability(&home, &away, false, &[], &HOUSE_WEIGHTS, params);
        let heavy_rating = ModelWeights {
            rating: 2.0,
            ..ModelWeights::default()
        };
        let user = win_probability(&home, &away, false, &[], &heavy_rating, params);
        assert!(user > house);
    }
}
