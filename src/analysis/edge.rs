use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OddsSnapshot;

/// Line movement beyond this many percentage points between the two most
/// recent snapshots is flagged on the board
pub const LINE_MOVE_THRESHOLD_PCT: f64 = 0.5;

/// Round to one decimal place, ties away from zero (standard `f64::round`).
/// All percentage figures on the board use this rule so equality checks
/// downstream are stable.
pub fn round_pct(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Edge values in percentage points, one decimal place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeSet {
    /// House probability minus market probability
    pub house_edge: f64,
    /// User probability minus market probability, when a user model ran
    pub user_edge: Option<f64>,
    /// User probability minus house probability
    pub delta: Option<f64>,
}

/// Compare model probabilities (0-1 fractions) to the market's.
/// Positive edge = the model favors the outcome more than the market does.
pub fn compute_edges(market_prob: f64, house_prob: f64, user_prob: Option<f64>) -> EdgeSet {
    let market_pct = market_prob * 100.0;
    let house_pct = house_prob * 100.0;
    let (user_edge, delta) = match user_prob {
        Some(p) => {
            let user_pct = p * 100.0;
            (
                Some(round_pct(user_pct - market_pct)),
                Some(round_pct(user_pct - house_pct)),
            )
        }
        None => (None, None),
    };
    EdgeSet {
        house_edge: round_pct(house_pct - market_pct),
        user_edge,
        delta,
    }
}

/// Freshness/completeness tier for the data behind a board record.
/// A decision-table heuristic, not a statistical confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataConfidence {
    High,
    Med,
    Low,
}

impl DataConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataConfidence::High => "high",
            DataConfidence::Med => "med",
            DataConfidence::Low => "low",
        }
    }

    /// Display color used by board consumers
    pub fn css_class(&self) -> &'static str {
        match self {
            DataConfidence::High => "green",
            DataConfidence::Med => "yellow",
            DataConfidence::Low => "red",
        }
    }
}

/// Tier from snapshot age and injury coverage: fresh odds plus at least one
/// injury report is High; odds under 12 hours old is Med; anything staler,
/// or no snapshot at all, is Low.
pub fn data_confidence(
    latest_odds: Option<&OddsSnapshot>,
    has_injuries: bool,
    now: DateTime<Utc>,
) -> DataConfidence {
    let Some(odds) = latest_odds else {
        return DataConfidence::Low;
    };

    let age_hours = (now - odds.captured_at).num_seconds() as f64 / 3600.0;

    if age_hours < 2.0 && has_injuries {
        DataConfidence::High
    } else if age_hours < 12.0 {
        DataConfidence::Med
    } else {
        DataConfidence::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMovement {
    Up,
    Down,
}

/// Direction of the home win probability between the two most recent
/// snapshots (newest first). Requires two snapshots; movement within
/// [`LINE_MOVE_THRESHOLD_PCT`] reads as no movement.
pub fn line_movement(snapshots: &[&OddsSnapshot]) -> Option<LineMovement> {
    if snapshots.len() < 2 {
        return None;
    }
    let diff_pct = (snapshots[0].market_home_win_prob - snapshots[1].market_home_win_prob) * 100.0;
    if diff_pct.abs() > LINE_MOVE_THRESHOLD_PCT {
        if diff_pct > 0.0 {
            Some(LineMovement::Up)
        } else {
            Some(LineMovement::Down)
        }
    } else {
        None
    }
}
