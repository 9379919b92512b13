pub mod charts;
pub mod kpis;
pub mod variance;

pub use charts::*;
pub use kpis::*;
pub use variance::*;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BetResult, ConfidenceLevel, MockBet, ModelSource, Sport};

/// Every analytics payload for one ledger, ready for JSON serialization.
/// Percentages are percentages, fractions are fractions, and money stays
/// decimal throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub kpis: Kpis,
    pub chart_data: ChartData,
    pub comparison: ModelComparison,
    pub calibration: Calibration,
    pub edge: Option<EdgeAnalysis>,
    pub variance: Option<VarianceStats>,
}

/// Compute the full analytics report over a caller-filtered ledger
pub fn compute_report(bets: &[MockBet]) -> AnalyticsReport {
    AnalyticsReport {
        kpis: compute_kpis(bets),
        chart_data: compute_chart_data(bets),
        comparison: compute_comparison(bets),
        calibration: compute_calibration(bets),
        edge: compute_edge_analysis(bets),
        variance: compute_variance(bets),
    }
}

/// Narrow a ledger by sport, stated confidence, and model source
pub fn filter_ledger(
    bets: &[MockBet],
    sport: Option<Sport>,
    confidence: Option<ConfidenceLevel>,
    model_source: Option<ModelSource>,
) -> Vec<MockBet> {
    bets.iter()
        .filter(|b| sport.map_or(true, |s| b.sport == s))
        .filter(|b| confidence.map_or(true, |c| b.confidence_level == c))
        .filter(|b| model_source.map_or(true, |m| b.model_source == m))
        .cloned()
        .collect()
}

/// Settled bets in settlement order (placement time stands in for legacy
/// rows without a settlement timestamp)
pub(crate) fn settled_chronological(bets: &[MockBet]) -> Vec<&MockBet> {
    let mut settled: Vec<&MockBet> = bets.iter().filter(|b| b.is_settled()).collect();
    settled.sort_by_key(|b| b.settled_at.unwrap_or(b.placed_at));
    settled
}

/// Total returned to the bettor: stake plus profit on a win, the stake back
/// on a push, nothing on a loss
pub(crate) fn bet_return(bet: &MockBet) -> Decimal {
    match bet.result {
        BetResult::Win => bet.stake_amount + bet.simulated_payout.unwrap_or(Decimal::ZERO),
        BetResult::Push => bet.stake_amount,
        _ => Decimal::ZERO,
    }
}

/// Signed per-bet net result as a float, for sequence statistics
pub(crate) fn net_f64(bet: &MockBet) -> f64 {
    match bet.result {
        BetResult::Win => decimal_f64(bet.simulated_payout.unwrap_or(Decimal::ZERO)),
        BetResult::Loss => -decimal_f64(bet.stake_amount),
        _ => 0.0,
    }
}

pub(crate) fn decimal_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ROI in percent at one decimal place; zero when nothing was staked
pub(crate) fn roi_pct(net: Decimal, stake: Decimal) -> f64 {
    if stake.is_zero() {
        0.0
    } else {
        round1(decimal_f64(net) / decimal_f64(stake) * 100.0)
    }
}
