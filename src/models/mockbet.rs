use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Sport;

/// Markets a mock bet can be placed on. The first three apply to game
/// sports (CFB/CBB); the rest are golf tournament markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Moneyline,
    Spread,
    Total,
    Outright,
    Top5,
    Top10,
    Top20,
    MakeCut,
    Matchup,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Moneyline => "moneyline",
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Outright => "outright",
            BetType::Top5 => "top_5",
            BetType::Top10 => "top_10",
            BetType::Top20 => "top_20",
            BetType::MakeCut => "make_cut",
            BetType::Matchup => "matchup",
        }
    }
}

/// Lifecycle state of a mock bet. Pending transitions exactly once to one
/// of the terminal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Pending,
    Win,
    Loss,
    Push,
}

impl BetResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetResult::Pending => "pending",
            BetResult::Win => "win",
            BetResult::Loss => "loss",
            BetResult::Push => "push",
        }
    }
}

/// Bettor-stated conviction at placement time (not the data-freshness tier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

/// Which model the bettor leaned on when placing the bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    House,
    User,
}

impl ModelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSource::House => "house",
            ModelSource::User => "user",
        }
    }
}

/// Post-settlement decision review annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFlag {
    Repeat,
    Avoid,
}

/// Convert American odds to implied probability.
/// Positive odds (+150) mean you win $150 on a $100 bet.
/// Negative odds (-150) mean you need to bet $150 to win $100.
pub fn implied_probability(odds: i32) -> f64 {
    if odds > 0 {
        100.0 / (odds as f64 + 100.0)
    } else {
        let abs_odds = odds.abs() as f64;
        abs_odds / (abs_odds + 100.0)
    }
}

/// Profit on a winning ticket at the given American odds, rounded to
/// cents. Positive odds pay stake * odds/100; negative pay stake * 100/|odds|.
pub fn win_payout(odds: i32, stake: Decimal) -> Decimal {
    let payout = if odds > 0 {
        stake * Decimal::from(odds) / Decimal::from(100)
    } else {
        stake * Decimal::from(100) / Decimal::from(odds.abs())
    };
    payout.round_dp(2)
}

/// A simulated no-money wager. Exactly one of `game_id` or the
/// `golf_event_id`/`golfer_id` pair is set, depending on sport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockBet {
    pub id: Uuid,
    pub username: String,
    pub sport: Sport,
    pub game_id: Option<Uuid>,
    pub golf_event_id: Option<u32>,
    pub golfer_id: Option<u32>,
    pub bet_type: BetType,
    pub selection: String,
    pub odds_american: i32,
    pub implied_probability: f64,
    pub stake_amount: Decimal,
    pub result: BetResult,
    pub simulated_payout: Option<Decimal>,
    pub confidence_level: ConfidenceLevel,
    pub model_source: ModelSource,
    /// Model edge in percentage points claimed at placement time
    pub expected_edge: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub review_flag: Option<ReviewFlag>,
    #[serde(default)]
    pub review_notes: String,
}

impl MockBet {
    pub fn is_settled(&self) -> bool {
        self.result != BetResult::Pending
    }

    /// Simulated payout for the current result.
    /// Win pays the profit only (stake excluded); push returns the stake;
    /// loss pays nothing. Pending bets have no payout.
    pub fn calculate_payout(&self) -> Option<Decimal> {
        match self.result {
            BetResult::Win => Some(win_payout(self.odds_american, self.stake_amount)),
            BetResult::Push => Some(self.stake_amount),
            BetResult::Loss => Some(Decimal::ZERO),
            BetResult::Pending => None,
        }
    }

    /// Net P/L for this bet: profit on a win, zero on a push, the stake
    /// lost on a loss. None while pending.
    pub fn net_result(&self) -> Option<Decimal> {
        match self.result {
            BetResult::Pending => None,
            BetResult::Win => self.simulated_payout,
            BetResult::Push => Some(Decimal::ZERO),
            BetResult::Loss => Some(-self.stake_amount),
        }
    }
}

/// One append-only audit entry per settlement transition. The ledger
/// guarantees a record is written if and only if a bet settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub bet_id: Uuid,
    pub settled_at: DateTime<Utc>,
    pub result: BetResult,
    pub payout: Decimal,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bet(odds: i32, stake: Decimal, result: BetResult) -> MockBet {
        MockBet {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            sport: Sport::Cfb,
            game_id: None,
            golf_event_id: None,
            golfer_id: None,
            bet_type: BetType::Moneyline,
            selection: "Alabama".to_string(),
            odds_american: odds,
            implied_probability: implied_probability(odds),
            stake_amount: stake,
            result,
            simulated_payout: None,
            confidence_level: ConfidenceLevel::Medium,
            model_source: ModelSource::House,
            expected_edge: None,
            notes: String::new(),
            placed_at: Utc::now(),
            settled_at: None,
            review_flag: None,
            review_notes: String::new(),
        }
    }

    #[test]
    fn test_implied_probability() {
        assert!((implied_probability(150) - 0.4).abs() < 1e-9);
        assert!((implied_probability(-150) - 0.6).abs() < 1e-9);
        assert!((implied_probability(100) - 0.5).abs() < 1e-9);
        assert!((implied_probability(-110) - 0.5238095238).abs() < 1e-6);
    }

    #[test]
    fn test_payout_win_positive_odds() {
        let b = bet(150, dec!(100.00), BetResult::Win);
        assert_eq!(b.calculate_payout(), Some(dec!(150.00)));
    }

    #[test]
    fn test_payout_win_negative_odds() {
        let b = bet(-200, dec!(100.00), BetResult::Win);
        assert_eq!(b.calculate_payout(), Some(dec!(50.00)));
    }

    #[test]
    fn test_payout_push_returns_stake() {
        let b = bet(-110, dec!(100.00), BetResult::Push);
        assert_eq!(b.calculate_payout(), Some(dec!(100.00)));
    }

    #[test]
    fn test_payout_loss_is_zero() {
        let b = bet(-110, dec!(100.00), BetResult::Loss);
        assert_eq!(b.calculate_payout(), Some(dec!(0.00)));
    }

    #[test]
    fn test_payout_pending_is_none() {
        let b = bet(-110, dec!(100.00), BetResult::Pending);
        assert_eq!(b.calculate_payout(), None);
        assert!(!b.is_settled());
    }

    #[test]
    fn test_net_result() {
        let mut win = bet(150, dec!(100.00), BetResult::Win);
        win.simulated_payout = win.calculate_payout();
        assert_eq!(win.net_result(), Some(dec!(150.00)));

        let loss = bet(-110, dec!(100.00), BetResult::Loss);
        assert_eq!(loss.net_result(), Some(dec!(-100.00)));

        let push = bet(-110, dec!(100.00), BetResult::Push);
        assert_eq!(push.net_result(), Some(dec!(0.00)));

        let pending = bet(-110, dec!(100.00), BetResult::Pending);
        assert_eq!(pending.net_result(), None);
    }
}
