pub mod mockbet;

pub use mockbet::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Sports covered by the board and the mock-bet ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Cfb,
    Cbb,
    Golf,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cfb => "cfb",
            Sport::Cbb => "cbb",
            Sport::Golf => "golf",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cfb" => Ok(Sport::Cfb),
            "cbb" => Ok(Sport::Cbb),
            "golf" => Ok(Sport::Golf),
            other => Err(format!("unknown sport: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conference {
    pub id: u32,
    pub name: String,
}

/// A team with its current power rating (arbitrary scale, higher = stronger)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub conference_id: u32,
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
}

/// A scheduled or completed game between two teams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub sport: Sport,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub start_time: DateTime<Utc>,
    pub neutral_site: bool,
    pub status: GameStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl Game {
    /// A game is eligible for settlement once it is final with both scores recorded
    pub fn is_final_with_scores(&self) -> bool {
        self.status == GameStatus::Final && self.home_score.is_some() && self.away_score.is_some()
    }
}

/// One point-in-time capture of the market for a game.
/// Snapshots are append-only; the newest capture is the market of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub game_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub sportsbook: String,
    pub market_home_win_prob: f64,
    pub market_away_win_prob: Option<f64>,
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub moneyline_home: Option<i32>,
    pub moneyline_away: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Med,
    High,
}

impl ImpactLevel {
    /// Probability-point magnitude applied per injury report
    pub fn magnitude(&self) -> f64 {
        match self {
            ImpactLevel::Low => 0.01,
            ImpactLevel::Med => 0.03,
            ImpactLevel::High => 0.06,
        }
    }
}

/// A qualitative injury report affecting one team in one game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjuryImpact {
    pub game_id: Uuid,
    pub team_id: u32,
    pub impact_level: ImpactLevel,
    #[serde(default)]
    pub notes: String,
}

/// A multi-day golf tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GolfEvent {
    pub id: u32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Golfer {
    pub id: u32,
    pub name: String,
}

/// One round of stroke play. A missing score means the round was not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GolfRound {
    pub event_id: u32,
    pub golfer_id: u32,
    pub round_number: u32,
    pub score: Option<i32>,
}

/// Per-user weight overrides for the probability model.
/// Weights are expected in [0, 3]; 1.0 reproduces the house model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModelConfig {
    pub username: String,
    pub rating_weight: f64,
    pub hfa_weight: f64,
    pub injury_weight: f64,
    pub recent_form_weight: f64,
    pub conference_weight: f64,
}

impl UserModelConfig {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            rating_weight: 1.0,
            hfa_weight: 1.0,
            injury_weight: 1.0,
            recent_form_weight: 1.0,
            conference_weight: 1.0,
        }
    }
}

/// Display-side preferences that feed the board (favorite-team flagging)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub favorite_team_id: Option<u32>,
}
