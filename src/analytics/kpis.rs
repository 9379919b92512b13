use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{bet_return, net_f64, roi_pct, round1, round2};
use crate::models::{BetResult, ConfidenceLevel, MockBet, ModelSource};

/// Headline metrics over one ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    pub total_bets: usize,
    pub settled_count: usize,
    pub pending_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub total_stake: Decimal,
    pub total_return: Decimal,
    pub net_pl: Decimal,
    pub win_pct: f64,
    pub roi: f64,
    pub avg_odds: f64,
    pub avg_implied: f64,
}

pub fn compute_kpis(bets: &[MockBet]) -> Kpis {
    let settled: Vec<&MockBet> = bets.iter().filter(|b| b.is_settled()).collect();
    let pending_count = bets.len() - settled.len();

    let total_stake: Decimal = settled.iter().map(|b| b.stake_amount).sum();
    let total_return: Decimal = settled.iter().map(|b| bet_return(b)).sum();
    let net_pl = total_return - total_stake;

    let wins = settled.iter().filter(|b| b.result == BetResult::Win).count();
    let losses = settled
        .iter()
        .filter(|b| b.result == BetResult::Loss)
        .count();
    let pushes = settled
        .iter()
        .filter(|b| b.result == BetResult::Push)
        .count();

    let win_pct = if settled.is_empty() {
        0.0
    } else {
        round1(wins as f64 / settled.len() as f64 * 100.0)
    };

    let (avg_odds, avg_implied) = if settled.is_empty() {
        (0.0, 0.0)
    } else {
        let n = settled.len() as f64;
        let odds_sum: f64 = settled.iter().map(|b| b.odds_american as f64).sum();
        let implied_sum: f64 = settled.iter().map(|b| b.implied_probability).sum();
        (
            (odds_sum / n).round(),
            round1(implied_sum / n * 100.0),
        )
    };

    Kpis {
        total_bets: bets.len(),
        settled_count: settled.len(),
        pending_count,
        wins,
        losses,
        pushes,
        total_stake,
        total_return,
        net_pl,
        win_pct,
        roi: roi_pct(net_pl, total_stake),
        avg_odds,
        avg_implied,
    }
}

/// Summary stats for one model side of the house-vs-user comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    pub count: usize,
    pub wins: usize,
    pub win_pct: f64,
    pub roi: f64,
    pub avg_odds: f64,
    pub avg_implied: f64,
    pub volatility: f64,
    pub net_pl: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub house: Option<ModelStats>,
    pub user: Option<ModelStats>,
}

/// Head-to-head record of bets placed off the house model vs the user's own
pub fn compute_comparison(bets: &[MockBet]) -> ModelComparison {
    let side = |source: ModelSource| -> Option<ModelStats> {
        let settled: Vec<&MockBet> = bets
            .iter()
            .filter(|b| b.model_source == source && b.is_settled())
            .collect();
        if settled.is_empty() {
            return None;
        }

        let stake: Decimal = settled.iter().map(|b| b.stake_amount).sum();
        let ret: Decimal = settled.iter().map(|b| bet_return(b)).sum();
        let net = ret - stake;
        let wins = settled.iter().filter(|b| b.result == BetResult::Win).count();
        let n = settled.len() as f64;
        let avg_odds = settled.iter().map(|b| b.odds_american as f64).sum::<f64>() / n;
        let avg_implied = settled.iter().map(|b| b.implied_probability).sum::<f64>() / n;

        let returns: Vec<f64> = settled.iter().map(|b| net_f64(b)).collect();

        Some(ModelStats {
            count: settled.len(),
            wins,
            win_pct: round1(wins as f64 / n * 100.0),
            roi: roi_pct(net, stake),
            avg_odds: avg_odds.round(),
            avg_implied: round1(avg_implied * 100.0),
            volatility: round2(sample_stdev(&returns)),
            net_pl: net,
        })
    };

    ModelComparison {
        house: side(ModelSource::House),
        user: side(ModelSource::User),
    }
}

/// Expected vs actual win rate at one stated confidence level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub count: usize,
    pub expected_win_pct: f64,
    pub actual_win_pct: f64,
    /// Actual minus expected; negative means the label overpromised
    pub diff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    pub low: Option<CalibrationRow>,
    pub medium: Option<CalibrationRow>,
    pub high: Option<CalibrationRow>,
}

/// Does a stated confidence level predict anything? Compare the mean
/// implied probability of each level's bets to how often they actually won.
pub fn compute_calibration(bets: &[MockBet]) -> Calibration {
    let row = |level: ConfidenceLevel| -> Option<CalibrationRow> {
        let settled: Vec<&MockBet> = bets
            .iter()
            .filter(|b| b.confidence_level == level && b.is_settled())
            .collect();
        if settled.is_empty() {
            return None;
        }
        let n = settled.len() as f64;
        let expected = settled.iter().map(|b| b.implied_probability).sum::<f64>() / n * 100.0;
        let wins = settled.iter().filter(|b| b.result == BetResult::Win).count();
        let actual = wins as f64 / n * 100.0;
        Some(CalibrationRow {
            count: settled.len(),
            expected_win_pct: round1(expected),
            actual_win_pct: round1(actual),
            diff: round1(actual - expected),
        })
    };

    Calibration {
        low: row(ConfidenceLevel::Low),
        medium: row(ConfidenceLevel::Medium),
        high: row(ConfidenceLevel::High),
    }
}

/// Performance of one expected-edge bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeBucket {
    pub range: String,
    pub count: usize,
    pub win_pct: f64,
    pub roi: f64,
}

/// Settled bets bucketed by the edge claimed at placement time. If the
/// edge field means anything, ROI should rise with the bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeAnalysis {
    pub negative: Option<EdgeBucket>,
    pub small: Option<EdgeBucket>,
    pub medium: Option<EdgeBucket>,
    pub large: Option<EdgeBucket>,
}

pub fn compute_edge_analysis(bets: &[MockBet]) -> Option<EdgeAnalysis> {
    let settled: Vec<&MockBet> = bets
        .iter()
        .filter(|b| b.is_settled() && b.expected_edge.is_some())
        .collect();
    if settled.is_empty() {
        return None;
    }

    let bucket = |range: &str, bucket_bets: Vec<&&MockBet>| -> Option<EdgeBucket> {
        if bucket_bets.is_empty() {
            return None;
        }
        let stake: Decimal = bucket_bets.iter().map(|b| b.stake_amount).sum();
        let ret: Decimal = bucket_bets.iter().map(|b| bet_return(b)).sum();
        let wins = bucket_bets
            .iter()
            .filter(|b| b.result == BetResult::Win)
            .count();
        Some(EdgeBucket {
            range: range.to_string(),
            count: bucket_bets.len(),
            win_pct: round1(wins as f64 / bucket_bets.len() as f64 * 100.0),
            roi: roi_pct(ret - stake, stake),
        })
    };

    let in_range = |lo: Option<f64>, hi: Option<f64>| -> Vec<&&MockBet> {
        settled
            .iter()
            .filter(|b| {
                let edge = b.expected_edge.unwrap_or_default();
                lo.map_or(true, |lo| edge >= lo) && hi.map_or(true, |hi| edge < hi)
            })
            .collect()
    };

    Some(EdgeAnalysis {
        negative: bucket("< 0%", in_range(None, Some(0.0))),
        small: bucket("0-3%", in_range(Some(0.0), Some(3.0))),
        medium: bucket("3-7%", in_range(Some(3.0), Some(7.0))),
        large: bucket("7%+", in_range(Some(7.0), None)),
    })
}

/// Sample standard deviation; zero for fewer than two observations
pub(crate) fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
