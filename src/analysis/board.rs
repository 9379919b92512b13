use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::edge::{
    compute_edges, data_confidence, line_movement, round_pct, DataConfidence, LineMovement,
};
use crate::analysis::win_prob::{
    win_probability, ModelWeights, SportParams, HOUSE_MODEL_VERSION, HOUSE_WEIGHTS,
};
use crate::models::{Game, GameStatus, InjuryImpact, OddsSnapshot, Sport};
use crate::store::Dataset;

/// The requesting user's model settings and preferences, resolved by the
/// caller. Anonymous views pass `None` and get house numbers only.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub username: String,
    pub weights: ModelWeights,
    pub favorite_team_id: Option<u32>,
}

impl UserContext {
    pub fn for_user(dataset: &Dataset, username: &str) -> Self {
        Self {
            username: username.to_string(),
            weights: dataset.user_weights(username),
            favorite_team_id: dataset.favorite_team_id(username),
        }
    }
}

/// One display-ready board record for a game. Probabilities and edges are
/// percentages; the market/house/user unit mix is fixed here and nowhere
/// else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub game_id: Uuid,
    pub sport: Sport,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub status: GameStatus,
    pub latest_odds: Option<OddsSnapshot>,
    pub market_prob: f64,
    pub house_prob: f64,
    pub user_prob: Option<f64>,
    pub house_edge: f64,
    pub user_edge: Option<f64>,
    pub delta: Option<f64>,
    pub confidence: DataConfidence,
    pub confidence_class: String,
    pub is_favorite: bool,
    pub line_movement: Option<LineMovement>,
    pub injuries: Vec<InjuryImpact>,
    pub model_version: String,
}

impl GameAnalysis {
    /// Format the record as a readable line for terminal output
    pub fn format(&self) -> String {
        format!(
            "{} @ {} | Market: {:.1}% | House: {:.1}% ({:+.1}) | Confidence: {} | {}",
            self.away_team,
            self.home_team,
            self.market_prob,
            self.house_prob,
            self.house_edge,
            self.confidence.as_str(),
            match self.line_movement {
                Some(LineMovement::Up) => "line up",
                Some(LineMovement::Down) => "line down",
                None => "line steady",
            }
        )
    }
}

/// Assemble the full analysis record for one game: latest market snapshot,
/// house and (optionally) user probabilities, edges, confidence tier, and
/// line movement. Pure with respect to `dataset`; a missing snapshot
/// defaults the market to a coin flip rather than failing.
pub fn analyze_game(
    dataset: &Dataset,
    game: &Game,
    user: Option<&UserContext>,
    now: DateTime<Utc>,
) -> Result<GameAnalysis> {
    let home = dataset
        .team(game.home_team_id)
        .with_context(|| format!("Game {} references unknown home team", game.id))?;
    let away = dataset
        .team(game.away_team_id)
        .with_context(|| format!("Game {} references unknown away team", game.id))?;

    let latest_odds = dataset.latest_odds(game.id);
    let injuries: Vec<InjuryImpact> = dataset
        .game_injuries(game.id)
        .into_iter()
        .cloned()
        .collect();

    let market_prob = latest_odds.map(|o| o.market_home_win_prob).unwrap_or(0.5);
    let params = SportParams::for_sport(game.sport);

    let house_prob = win_probability(
        home,
        away,
        game.neutral_site,
        &injuries,
        &HOUSE_WEIGHTS,
        params,
    );
    let user_prob = user.map(|ctx| {
        win_probability(home, away, game.neutral_site, &injuries, &ctx.weights, params)
    });

    let edges = compute_edges(market_prob, house_prob, user_prob);
    let confidence = data_confidence(latest_odds, !injuries.is_empty(), now);

    let is_favorite = user
        .and_then(|ctx| ctx.favorite_team_id)
        .map(|fav| fav == game.home_team_id || fav == game.away_team_id)
        .unwrap_or(false);

    let recent = dataset.recent_odds(game.id, 2);
    let movement = line_movement(&recent);

    Ok(GameAnalysis {
        game_id: game.id,
        sport: game.sport,
        home_team: home.name.clone(),
        away_team: away.name.clone(),
        start_time: game.start_time,
        status: game.status,
        latest_odds: latest_odds.cloned(),
        market_prob: round_pct(market_prob * 100.0),
        house_prob: round_pct(house_prob * 100.0),
        user_prob: user_prob.map(|p| round_pct(p * 100.0)),
        house_edge: edges.house_edge,
        user_edge: edges.user_edge,
        delta: edges.delta,
        confidence,
        confidence_class: confidence.css_class().to_string(),
        is_favorite,
        line_movement: movement,
        injuries,
        model_version: HOUSE_MODEL_VERSION.to_string(),
    })
}

/// Analyze every game of a sport. A game that cannot be analyzed (broken
/// team reference) is logged and skipped so one bad row never takes down
/// the whole board.
pub fn build_board(
    dataset: &Dataset,
    sport: Sport,
    user: Option<&UserContext>,
    now: DateTime<Utc>,
) -> Vec<GameAnalysis> {
    let mut board = Vec::new();
    for game in dataset.games_for_sport(sport) {
        match analyze_game(dataset, game, user, now) {
            Ok(analysis) => board.push(analysis),
            Err(err) => {
                tracing::warn!("Skipping game {} on the {} board: {}", game.id, sport, err);
            }
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImpactLevel, Team, UserProfile};
    use chrono::Duration;

    fn dataset_with_game() -> (Dataset, Uuid) {
        let mut ds = Dataset::default();
        ds.teams.push(Team {
            id: 1,
            name: "Alabama".to_string(),
            conference_id: 1,
            rating: 92.0,
        });
        ds.teams.push(Team {
            id: 2,
            name: "Auburn".to_string(),
            conference_id: 1,
            rating: 85.0,
        });
        let game_id = Uuid::new_v4();
        ds.games.push(Game {
            id: game_id,
            sport: Sport::Cfb,
            home_team_id: 1,
            away_team_id: 2,
            start_time: Utc::now() + Duration::days(1),
            neutral_site: false,
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
        });
        (ds, game_id)
    }

    fn push_snapshot(ds: &mut Dataset, game_id: Uuid, prob: f64, captured_at: DateTime<Utc>) {
        ds.odds_snapshots.push(OddsSnapshot {
            game_id,
            captured_at,
            sportsbook: "consensus".to_string(),
            market_home_win_prob: prob,
            market_away_win_prob: Some(1.0 - prob),
            spread: Some(-6.5),
            total: Some(52.5),
            moneyline_home: Some(-240),
            moneyline_away: Some(195),
        });
    }

    #[test]
    fn test_analyze_game_defaults_without_snapshot() {
        let (ds, game_id) = dataset_with_game();
        let game = ds.game(game_id).unwrap().clone();
        let analysis = analyze_game(&ds, &game, None, Utc::now()).unwrap();

        assert_eq!(analysis.market_prob, 50.0);
        assert_eq!(analysis.confidence, DataConfidence::Low);
        assert_eq!(analysis.confidence_class, "red");
        assert_eq!(analysis.user_prob, None);
        assert_eq!(analysis.user_edge, None);
        assert_eq!(analysis.line_movement, None);
        assert_eq!(analysis.model_version, "v1");
    }

    #[test]
    fn test_analyze_game_with_user_context() {
        let (mut ds, game_id) = dataset_with_game();
        let now = Utc::now();
        push_snapshot(&mut ds, game_id, 0.60, now - Duration::hours(1));
        ds.injuries.push(InjuryImpact {
            game_id,
            team_id: 2,
            impact_level: ImpactLevel::High,
            notes: "starting QB out".to_string(),
        });
        ds.user_profiles.push(UserProfile {
            username: "testuser".to_string(),
            favorite_team_id: Some(2),
        });

        let game = ds.game(game_id).unwrap().clone();
        let user = UserContext::for_user(&ds, "testuser");
        let analysis = analyze_game(&ds, &game, Some(&user), now).unwrap();

        assert_eq!(analysis.market_prob, 60.0);
        // default user weights reproduce the house model
        assert_eq!(analysis.user_prob, Some(analysis.house_prob));
        assert_eq!(analysis.delta, Some(0.0));
        assert_eq!(analysis.confidence, DataConfidence::High);
        assert!(analysis.is_favorite);
        assert_eq!(analysis.injuries.len(), 1);
    }

    #[test]
    fn test_line_movement_reaches_the_board() {
        let (mut ds, game_id) = dataset_with_game();
        let now = Utc::now();
        push_snapshot(&mut ds, game_id, 0.55, now - Duration::hours(2));
        push_snapshot(&mut ds, game_id, 0.60, now - Duration::hours(1));

        let game = ds.game(game_id).unwrap().clone();
        let analysis = analyze_game(&ds, &game, None, now).unwrap();
        assert_eq!(analysis.line_movement, Some(LineMovement::Up));
    }

    #[test]
    fn test_build_board_skips_broken_games() {
        let (mut ds, _) = dataset_with_game();
        ds.games.push(Game {
            id: Uuid::new_v4(),
            sport: Sport::Cfb,
            home_team_id: 99,
            away_team_id: 2,
            start_time: Utc::now(),
            neutral_site: false,
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
        });

        let board = build_board(&ds, Sport::Cfb, None, Utc::now());
        assert_eq!(board.len(), 1);
    }
}
