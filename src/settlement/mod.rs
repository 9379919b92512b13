use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BetResult, BetType, Game, MockBet, Sport};
use crate::store::Dataset;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("bet {0} references game {1} which does not exist")]
    MissingGame(Uuid, Uuid),
    #[error("bet {0} has no game attached")]
    NoGameReference(Uuid),
    #[error("bet {0} references golf event {1} which does not exist")]
    MissingEvent(Uuid, u32),
    #[error("bet {0} has no golf event attached")]
    NoEventReference(Uuid),
}

/// Counts of bets settled per sport by one sweep
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub cfb: usize,
    pub cbb: usize,
    pub golf: usize,
}

impl SettlementSummary {
    pub fn total(&self) -> usize {
        self.cfb + self.cbb + self.golf
    }
}

/// Outcome of resolving one bet against its finalized event.
///
/// `Defer` keeps the bet pending: the outcome data needed to grade it is
/// not there yet (golf rounds not recorded, or a market that needs manual
/// review). Unresolvable inputs (an unparseable line, a selection that
/// matches neither team) grade as a loss with a diagnostic reason instead,
/// so a malformed ticket cannot sit open forever.
#[derive(Debug)]
enum Resolution {
    Win(String),
    Loss(String),
    Push(String),
    Defer(String),
}

/// Settle every pending bet whose underlying event has concluded.
///
/// Each bet resolves independently: a bet that errors is logged and
/// skipped, never aborting the sweep. Safe to run repeatedly, since
/// settled bets are not eligible and the per-bet transition is guarded by
/// the ledger's check-and-set.
pub fn settle_pending(
    dataset: &mut Dataset,
    sport: Option<Sport>,
    now: DateTime<Utc>,
) -> SettlementSummary {
    let today = now.date_naive();

    let mut planned: Vec<(Uuid, Sport, Resolution)> = Vec::new();
    for bet in dataset.mock_bets.iter() {
        if bet.result != BetResult::Pending {
            continue;
        }
        if let Some(filter) = sport {
            if bet.sport != filter {
                continue;
            }
        }

        let resolution = match bet.sport {
            Sport::Cfb | Sport::Cbb => match game_for_bet(dataset, bet) {
                Ok(Some(game)) => resolve_game_bet(dataset, bet, game),
                Ok(None) => continue, // not final yet
                Err(err) => {
                    tracing::error!("Failed to settle mock bet {}: {}", bet.id, err);
                    continue;
                }
            },
            Sport::Golf => match event_concluded(dataset, bet, today) {
                Ok(true) => match resolve_golf_bet(dataset, bet) {
                    Ok(resolution) => resolution,
                    Err(err) => {
                        tracing::error!("Failed to settle mock bet {}: {}", bet.id, err);
                        continue;
                    }
                },
                Ok(false) => continue,
                Err(err) => {
                    tracing::error!("Failed to settle mock bet {}: {}", bet.id, err);
                    continue;
                }
            },
        };

        planned.push((bet.id, bet.sport, resolution));
    }

    let mut summary = SettlementSummary::default();
    for (bet_id, bet_sport, resolution) in planned {
        let (result, reason) = match resolution {
            Resolution::Win(reason) => (BetResult::Win, reason),
            Resolution::Loss(reason) => (BetResult::Loss, reason),
            Resolution::Push(reason) => (BetResult::Push, reason),
            Resolution::Defer(reason) => {
                tracing::debug!("Mock bet {} left pending: {}", bet_id, reason);
                continue;
            }
        };
        if dataset.apply_settlement(bet_id, result, reason, now) {
            match bet_sport {
                Sport::Cfb => summary.cfb += 1,
                Sport::Cbb => summary.cbb += 1,
                Sport::Golf => summary.golf += 1,
            }
        }
    }
    summary
}

/// The bet's game if it is ready to grade (final with both scores)
fn game_for_bet<'a>(
    dataset: &'a Dataset,
    bet: &MockBet,
) -> Result<Option<&'a Game>, SettlementError> {
    let game_id = bet.game_id.ok_or(SettlementError::NoGameReference(bet.id))?;
    let game = dataset
        .game(game_id)
        .ok_or(SettlementError::MissingGame(bet.id, game_id))?;
    Ok(game.is_final_with_scores().then_some(game))
}

fn event_concluded(
    dataset: &Dataset,
    bet: &MockBet,
    today: chrono::NaiveDate,
) -> Result<bool, SettlementError> {
    let event_id = bet
        .golf_event_id
        .ok_or(SettlementError::NoEventReference(bet.id))?;
    let event = dataset
        .golf_event(event_id)
        .ok_or(SettlementError::MissingEvent(bet.id, event_id))?;
    Ok(event.end_date < today)
}

fn resolve_game_bet(dataset: &Dataset, bet: &MockBet, game: &Game) -> Resolution {
    // eligibility guarantees both scores
    let home_score = game.home_score.unwrap_or_default();
    let away_score = game.away_score.unwrap_or_default();
    let home_name = dataset
        .team(game.home_team_id)
        .map(|t| t.name.as_str())
        .unwrap_or_default();
    let away_name = dataset
        .team(game.away_team_id)
        .map(|t| t.name.as_str())
        .unwrap_or_default();

    match bet.bet_type {
        BetType::Moneyline => {
            resolve_moneyline(&bet.selection, home_score, away_score, home_name, away_name)
        }
        BetType::Spread => resolve_spread(dataset, bet, game, home_score, away_score, home_name),
        BetType::Total => resolve_total(&bet.selection, home_score, away_score),
        other => Resolution::Loss(format!(
            "Bet type {} is not valid for a game market",
            other.as_str()
        )),
    }
}

fn resolve_moneyline(
    selection: &str,
    home_score: i32,
    away_score: i32,
    home_name: &str,
    away_name: &str,
) -> Resolution {
    if home_score == away_score {
        return Resolution::Push(format!(
            "Game ended in a tie {}-{}",
            home_score, away_score
        ));
    }

    let selection_lower = selection.to_lowercase();
    let home_won = home_score > away_score;

    let picked_home = !home_name.is_empty() && selection_lower.contains(&home_name.to_lowercase());
    let picked_away = !away_name.is_empty() && selection_lower.contains(&away_name.to_lowercase());

    let won = if picked_home {
        home_won
    } else if picked_away {
        !home_won
    } else {
        return Resolution::Loss(format!(
            "Could not match selection \"{}\" to either team",
            selection
        ));
    };

    let winner = if home_won { home_name } else { away_name };
    let reason = format!("{} won {}-{}", winner, home_score, away_score);
    if won {
        Resolution::Win(reason)
    } else {
        Resolution::Loss(reason)
    }
}

/// Selection format: "Team Name -3.5" or "Team Name +7". When the line is
/// missing from the selection, the most recent snapshot captured before
/// kickoff stands in.
fn resolve_spread(
    dataset: &Dataset,
    bet: &MockBet,
    game: &Game,
    home_score: i32,
    away_score: i32,
    home_name: &str,
) -> Resolution {
    let selection = &bet.selection;

    let mut spread_val: Option<f64> = selection
        .split_whitespace()
        .rev()
        .find_map(|token| token.trim_start_matches('+').parse::<f64>().ok());

    if spread_val.is_none() {
        spread_val = dataset
            .recent_odds(game.id, usize::MAX)
            .into_iter()
            .filter(|s| s.captured_at < game.start_time)
            .find_map(|s| s.spread);
    }

    let Some(spread) = spread_val else {
        return Resolution::Loss(format!(
            "Could not determine spread from selection: {}",
            selection
        ));
    };

    let margin = home_score - away_score;
    let picked_home =
        !home_name.is_empty() && selection.to_lowercase().contains(&home_name.to_lowercase());
    let adjusted = if picked_home {
        margin as f64 + spread
    } else {
        -(margin as f64) + spread
    };

    if adjusted > 0.0 {
        Resolution::Win(format!(
            "Covered the spread ({:+}). Margin: {}",
            spread, margin
        ))
    } else if adjusted == 0.0 {
        Resolution::Push(format!(
            "Pushed on the spread ({:+}). Margin: {}",
            spread, margin
        ))
    } else {
        Resolution::Loss(format!(
            "Did not cover the spread ({:+}). Margin: {}",
            spread, margin
        ))
    }
}

/// Selection format: "Over 145.5" or "Under 53"
fn resolve_total(selection: &str, home_score: i32, away_score: i32) -> Resolution {
    let selection_lower = selection.to_lowercase();
    let actual_total = (home_score + away_score) as f64;

    let Some(target) = selection_lower
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
    else {
        return Resolution::Loss(format!("Could not parse a total from: {}", selection));
    };

    let is_over = selection_lower.contains("over");

    if actual_total == target {
        return Resolution::Push(format!("Total {} equals the line {}", actual_total, target));
    }

    let won = if is_over {
        actual_total > target
    } else {
        actual_total < target
    };

    let reason = format!(
        "Total: {}, Line: {}, Selection: {}",
        actual_total, target, selection
    );
    if won {
        Resolution::Win(reason)
    } else {
        Resolution::Loss(reason)
    }
}

/// Grade a golf bet from recorded round data. Finishing position is the
/// ascending rank of summed round scores (stroke play: lower is better),
/// ties broken by golfer id for determinism.
fn resolve_golf_bet(dataset: &Dataset, bet: &MockBet) -> Result<Resolution, SettlementError> {
    let event_id = bet
        .golf_event_id
        .ok_or(SettlementError::NoEventReference(bet.id))?;

    let Some(golfer_id) = bet.golfer_id else {
        return Ok(Resolution::Loss(
            "No golfer associated with bet".to_string(),
        ));
    };
    let golfer_name = dataset
        .golfer(golfer_id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| format!("Golfer #{}", golfer_id));

    let rounds = dataset.scored_rounds(event_id);
    if rounds.is_empty() {
        return Ok(Resolution::Defer(
            "No round data recorded for the event yet".to_string(),
        ));
    }

    let mut totals: HashMap<u32, i32> = HashMap::new();
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for round in &rounds {
        *totals.entry(round.golfer_id).or_insert(0) += round.score.unwrap_or_default();
        *counts.entry(round.golfer_id).or_insert(0) += 1;
    }

    let mut standings: Vec<(u32, i32)> = totals.into_iter().collect();
    standings.sort_by_key(|&(id, total)| (total, id));

    let field_size = standings.len();
    let position = standings
        .iter()
        .position(|&(id, _)| id == golfer_id)
        .map(|idx| idx + 1);

    let Some(position) = position else {
        let reason = if bet.bet_type == BetType::MakeCut {
            format!("{} did not complete the event", golfer_name)
        } else {
            format!("{} did not finish the event", golfer_name)
        };
        return Ok(Resolution::Loss(reason));
    };

    let resolution = match bet.bet_type {
        BetType::Outright => place_resolution(&golfer_name, position, field_size, 1),
        BetType::Top5 => place_resolution(&golfer_name, position, field_size, 5),
        BetType::Top10 => place_resolution(&golfer_name, position, field_size, 10),
        BetType::Top20 => place_resolution(&golfer_name, position, field_size, 20),
        BetType::MakeCut => {
            // a golfer with three or more recorded rounds survived the cut
            let played = counts.get(&golfer_id).copied().unwrap_or_default();
            let reason = format!("{} completed {} rounds", golfer_name, played);
            if played >= 3 {
                Resolution::Win(reason)
            } else {
                Resolution::Loss(reason)
            }
        }
        BetType::Matchup => Resolution::Defer(
            "Head-to-head matchup resolution requires manual review".to_string(),
        ),
        other => Resolution::Loss(format!(
            "Bet type {} is not valid for a golf market",
            other.as_str()
        )),
    };
    Ok(resolution)
}

fn place_resolution(name: &str, position: usize, field: usize, cutoff: usize) -> Resolution {
    let reason = format!("{} finished #{} of {}", name, position, field);
    if position <= cutoff {
        Resolution::Win(reason)
    } else {
        Resolution::Loss(reason)
    }
}
