use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::analysis::ModelWeights;
use crate::models::{
    BetResult, Conference, Game, GolfEvent, GolfRound, Golfer, InjuryImpact, MockBet, OddsSnapshot, ReviewFlag,
    SettlementRecord, Sport, Team, UserModelConfig, UserProfile,
};

/// Everything a computation reads or the settlement engine mutates, backed
/// by one JSON file. Ingestion providers append snapshots and injuries out
/// of band; this layer only loads, queries, and saves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub conferences: Vec<Conference>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub odds_snapshots: Vec<OddsSnapshot>,
    #[serde(default)]
    pub injuries: Vec<InjuryImpact>,
    #[serde(default)]
    pub golf_events: Vec<GolfEvent>,
    #[serde(default)]
    pub golfers: Vec<Golfer>,
    #[serde(default)]
    pub golf_rounds: Vec<GolfRound>,
    #[serde(default)]
    pub user_configs: Vec<UserModelConfig>,
    #[serde(default)]
    pub user_profiles: Vec<UserProfile>,
    #[serde(default)]
    pub mock_bets: Vec<MockBet>,
    #[serde(default)]
    pub settlement_log: Vec<SettlementRecord>,
}


impl Dataset {
    /// Load the dataset from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read dataset file {}", path.as_ref().display())
        })?;
        serde_json::from_str(&json).context("Failed to deserialize dataset")
    }

    /// Save the dataset back to its JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize dataset")?;
        std::fs::write(path.as_ref(), json).with_context(|| {
            format!("Failed to write dataset file {}", path.as_ref().display())
        })?;
        Ok(())
    }

    pub fn team(&self, id: u32) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn game(&self, id: Uuid) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    pub fn golf_event(&self, id: u32) -> Option<&GolfEvent> {
        self.golf_events.iter().find(|e| e.id == id)
    }

    pub fn golfer(&self, id: u32) -> Option<&Golfer> {
        self.golfers.iter().find(|g| g.id == id)
    }

    pub fn games_for_sport(&self, sport: Sport) -> Vec<&Game> {
        self.games.iter().filter(|g| g.sport == sport).collect()
    }

    /// The most recent snapshot for a game. Equal capture times resolve to
    /// the later row, so re-ingested captures are deterministic.
    pub fn latest_odds(&self, game_id: Uuid) -> Option<&OddsSnapshot> {
        let mut latest: Option<&OddsSnapshot> = None;
        for snap in self.odds_snapshots.iter().filter(|s| s.game_id == game_id) {
            match latest {
                Some(best) if snap.captured_at < best.captured_at => {}
                _ => latest = Some(snap),
            }
        }
        latest
    }

    /// Up to `n` snapshots for a game, newest first. Ties on capture time
    /// break by row position (later rows first) to stay deterministic.
    pub fn recent_odds(&self, game_id: Uuid, n: usize) -> Vec<&OddsSnapshot> {
        let mut rows: Vec<(usize, &OddsSnapshot)> = self
            .odds_snapshots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.game_id == game_id)
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| ib.cmp(ia))
        });
        rows.into_iter().take(n).map(|(_, s)| s).collect()
    }

    pub fn game_injuries(&self, game_id: Uuid) -> Vec<&InjuryImpact> {
        self.injuries.iter().filter(|i| i.game_id == game_id).collect()
    }

    /// Rounds with a recorded score for one event
    pub fn scored_rounds(&self, event_id: u32) -> Vec<&GolfRound> {
        self.golf_rounds
            .iter()
            .filter(|r| r.event_id == event_id && r.score.is_some())
            .collect()
    }

    /// The weight vector a user's model runs with; absent configs fall back
    /// to defaults (which reproduce the house model).
    pub fn user_weights(&self, username: &str) -> ModelWeights {
        self.user_configs
            .iter()
            .find(|c| c.username == username)
            .map(|c| ModelWeights {
                rating: c.rating_weight,
                hfa: c.hfa_weight,
                injury: c.injury_weight,
                recent_form: c.recent_form_weight,
                conference: c.conference_weight,
            })
            .unwrap_or_default()
    }

    pub fn favorite_team_id(&self, username: &str) -> Option<u32> {
        self.user_profiles
            .iter()
            .find(|p| p.username == username)
            .and_then(|p| p.favorite_team_id)
    }

    pub fn bet(&self, id: Uuid) -> Option<&MockBet> {
        self.mock_bets.iter().find(|b| b.id == id)
    }

    pub fn bets_for_user(&self, username: &str) -> Vec<&MockBet> {
        self.mock_bets
            .iter()
            .filter(|b| b.username == username)
            .collect()
    }

    /// Settle one bet and write its audit record in a single step.
    ///
    /// The transition is check-and-set: only a still-pending bet settles,
    /// so overlapping sweeps cannot double-settle or double-log. Returns
    /// whether the transition happened. Bet mutation and log append live in
    /// this one method so the two can never diverge.
    pub fn apply_settlement(
        &mut self,
        bet_id: Uuid,
        result: BetResult,
        reason: String,
        now: DateTime<Utc>,
    ) -> bool {
        if result == BetResult::Pending {
            return false;
        }
        let Some(bet) = self.mock_bets.iter_mut().find(|b| b.id == bet_id) else {
            return false;
        };
        if bet.result != BetResult::Pending {
            return false;
        }

        bet.result = result;
        bet.simulated_payout = bet.calculate_payout();
        bet.settled_at = Some(now);
        let payout = bet.simulated_payout.unwrap_or(Decimal::ZERO);

        self.settlement_log.push(SettlementRecord {
            bet_id,
            settled_at: now,
            result,
            payout,
            reason,
        });
        true
    }

    /// Attach a decision-review annotation to a settled bet
    pub fn review_bet(&mut self, bet_id: Uuid, flag: ReviewFlag, notes: &str) -> Result<()> {
        let Some(bet) = self.mock_bets.iter_mut().find(|b| b.id == bet_id) else {
            bail!("No mock bet with id {}", bet_id);
        };
        if !bet.is_settled() {
            bail!("Cannot review a pending bet");
        }
        bet.review_flag = Some(flag);
        bet.review_notes = notes.to_string();
        Ok(())
    }
}

/// Export the settled ledger to CSV
pub fn export_ledger_csv<P: AsRef<Path>>(bets: &[&MockBet], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref()).context("Failed to create CSV file")?;

    writer.write_record([
        "placed_at",
        "sport",
        "bet_type",
        "selection",
        "odds",
        "stake",
        "result",
        "payout",
        "net",
        "settled_at",
        "confidence",
        "model_source",
    ])?;

    for bet in bets.iter().filter(|b| b.is_settled()) {
        writer.write_record([
            bet.placed_at.format("%Y-%m-%d %H:%M").to_string(),
            bet.sport.to_string(),
            bet.bet_type.as_str().to_string(),
            bet.selection.clone(),
            format!("{:+}", bet.odds_american),
            bet.stake_amount.to_string(),
            bet.result.as_str().to_string(),
            bet.simulated_payout.unwrap_or(Decimal::ZERO).to_string(),
            bet.net_result().unwrap_or(Decimal::ZERO).to_string(),
            bet.settled_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            bet.confidence_level.as_str().to_string(),
            bet.model_source.as_str().to_string(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetType, ConfidenceLevel, ModelSource};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn snapshot(game_id: Uuid, prob: f64, captured_at: DateTime<Utc>, book: &str) -> OddsSnapshot {
        OddsSnapshot {
            game_id,
            captured_at,
            sportsbook: book.to_string(),
            market_home_win_prob: prob,
            market_away_win_prob: Some(1.0 - prob),
            spread: None,
            total: None,
            moneyline_home: None,
            moneyline_away: None,
        }
    }

    fn pending_bet(id: Uuid, odds: i32) -> MockBet {
        MockBet {
            id,
            username: "testuser".to_string(),
            sport: Sport::Cfb,
            game_id: None,
            golf_event_id: None,
            golfer_id: None,
            bet_type: BetType::Moneyline,
            selection: "Alabama".to_string(),
            odds_american: odds,
            implied_probability: crate::models::implied_probability(odds),
            stake_amount: dec!(100.00),
            result: BetResult::Pending,
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
    fn test_latest_odds_ties_resolve_to_later_row() {
        let game_id = Uuid::new_v4();
        let at = Utc::now();
        let mut ds = Dataset::default();
        ds.odds_snapshots.push(snapshot(game_id, 0.50, at, "first"));
        ds.odds_snapshots.push(snapshot(game_id, 0.55, at, "second"));

        let latest = ds.latest_odds(game_id).unwrap();
        assert_eq!(latest.sportsbook, "second");
    }

    #[test]
    fn test_recent_odds_newest_first() {
        let game_id = Uuid::new_v4();
        let now = Utc::now();
        let mut ds = Dataset::default();
        ds.odds_snapshots
            .push(snapshot(game_id, 0.50, now - Duration::hours(3), "old"));
        ds.odds_snapshots.push(snapshot(game_id, 0.55, now, "new"));
        ds.odds_snapshots
            .push(snapshot(game_id, 0.52, now - Duration::hours(1), "mid"));
        // another game's rows never leak in
        ds.odds_snapshots.push(snapshot(Uuid::new_v4(), 0.9, now, "other"));

        let rows = ds.recent_odds(game_id, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sportsbook, "new");
        assert_eq!(rows[1].sportsbook, "mid");
    }

    #[test]
    fn test_apply_settlement_pairs_bet_and_log() {
        let bet_id = Uuid::new_v4();
        let mut ds = Dataset::default();
        ds.mock_bets.push(pending_bet(bet_id, 150));
        let now = Utc::now();

        let applied =
            ds.apply_settlement(bet_id, BetResult::Win, "won outright".to_string(), now);
        assert!(applied);

        let bet = ds.bet(bet_id).unwrap();
        assert_eq!(bet.result, BetResult::Win);
        assert_eq!(bet.simulated_payout, Some(dec!(150.00)));
        assert_eq!(bet.settled_at, Some(now));
        assert_eq!(ds.settlement_log.len(), 1);
        assert_eq!(ds.settlement_log[0].bet_id, bet_id);
        assert_eq!(ds.settlement_log[0].payout, dec!(150.00));
    }

    #[test]
    fn test_apply_settlement_is_idempotent() {
        let bet_id = Uuid::new_v4();
        let mut ds = Dataset::default();
        ds.mock_bets.push(pending_bet(bet_id, -110));
        let now = Utc::now();

        assert!(ds.apply_settlement(bet_id, BetResult::Loss, "lost".to_string(), now));
        assert!(!ds.apply_settlement(bet_id, BetResult::Win, "retry".to_string(), now));

        let bet = ds.bet(bet_id).unwrap();
        assert_eq!(bet.result, BetResult::Loss);
        assert_eq!(ds.settlement_log.len(), 1);
    }

    #[test]
    fn test_apply_settlement_rejects_pending_result() {
        let bet_id = Uuid::new_v4();
        let mut ds = Dataset::default();
        ds.mock_bets.push(pending_bet(bet_id, -110));

        assert!(!ds.apply_settlement(bet_id, BetResult::Pending, "noop".to_string(), Utc::now()));
        assert!(ds.settlement_log.is_empty());
        assert_eq!(ds.bet(bet_id).unwrap().result, BetResult::Pending);
    }

    #[test]
    fn test_review_requires_settled_bet() {
        let bet_id = Uuid::new_v4();
        let mut ds = Dataset::default();
        ds.mock_bets.push(pending_bet(bet_id, -110));

        assert!(ds.review_bet(bet_id, ReviewFlag::Repeat, "good read").is_err());

        ds.apply_settlement(bet_id, BetResult::Win, "won".to_string(), Utc::now());
        ds.review_bet(bet_id, ReviewFlag::Repeat, "good read").unwrap();
        let bet = ds.bet(bet_id).unwrap();
        assert_eq!(bet.review_flag, Some(ReviewFlag::Repeat));
        assert_eq!(bet.review_notes, "good read");
    }

    #[test]
    fn test_user_weights_default_when_missing() {
        let ds = Dataset::default();
        let weights = ds.user_weights("nobody");
        assert_eq!(weights, ModelWeights::default());
    }
}
