use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::charts::PlPoint;
use crate::analytics::kpis::sample_stdev;
use crate::analytics::{decimal_f64, net_f64, round2, roi_pct, settled_chronological};
use crate::models::{win_payout, BetResult, MockBet};

/// Stretch window for the best/worst run statistics, in settled bets
pub const STRETCH_WINDOW: usize = 10;

/// Sum of a contiguous run of bet results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stretch {
    pub value: f64,
    pub window: usize,
    /// 1-based index of the first bet in the run
    pub start: usize,
}

/// Streak, drawdown, and dispersion statistics over the settled ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceStats {
    pub longest_losing_streak: usize,
    pub longest_winning_streak: usize,
    pub max_drawdown: f64,
    pub worst_stretch: Stretch,
    pub best_stretch: Stretch,
    pub volatility: f64,
}

/// Variance metrics need at least two settled bets; below that, None
pub fn compute_variance(bets: &[MockBet]) -> Option<VarianceStats> {
    let settled = settled_chronological(bets);
    if settled.len() < 2 {
        return None;
    }

    let results: Vec<f64> = settled.iter().map(|b| net_f64(b)).collect();

    // streaks: a push interrupts both runs
    let mut max_losing = 0usize;
    let mut current_losing = 0usize;
    let mut max_winning = 0usize;
    let mut current_winning = 0usize;
    for bet in &settled {
        match bet.result {
            BetResult::Loss => {
                current_losing += 1;
                max_losing = max_losing.max(current_losing);
                current_winning = 0;
            }
            BetResult::Win => {
                current_winning += 1;
                max_winning = max_winning.max(current_winning);
                current_losing = 0;
            }
            _ => {
                current_losing = 0;
                current_winning = 0;
            }
        }
    }

    // peak-to-trough of the running cumulative sum
    let mut running = 0.0;
    let mut peak = 0.0;
    let mut max_drawdown = 0.0f64;
    for r in &results {
        running += r;
        if running > peak {
            peak = running;
        }
        max_drawdown = max_drawdown.max(peak - running);
    }

    // best and worst contiguous n-bet sums
    let n = STRETCH_WINDOW.min(results.len());
    let mut best = f64::NEG_INFINITY;
    let mut worst = f64::INFINITY;
    let mut best_start = 0usize;
    let mut worst_start = 0usize;
    for i in 0..=(results.len() - n) {
        let sum: f64 = results[i..i + n].iter().sum();
        if sum > best {
            best = sum;
            best_start = i;
        }
        if sum < worst {
            worst = sum;
            worst_start = i;
        }
    }

    Some(VarianceStats {
        longest_losing_streak: max_losing,
        longest_winning_streak: max_winning,
        max_drawdown: round2(max_drawdown),
        worst_stretch: Stretch {
            value: round2(worst),
            window: n,
            start: worst_start + 1,
        },
        best_stretch: Stretch {
            value: round2(best),
            window: n,
            start: best_start + 1,
        },
        volatility: round2(sample_stdev(&results)),
    })
}

/// What the ledger would have done under disciplined flat staking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatSimResult {
    pub flat_stake: Decimal,
    pub total_bets: usize,
    pub total_stake: Decimal,
    pub total_return: Decimal,
    pub net_pl: Decimal,
    pub roi: f64,
    pub max_drawdown: Decimal,
    pub cumulative_pl: Vec<PlPoint>,
}

/// Replay every settled bet at a fixed stake, using the same payout rules
/// the settlement engine applies. None when nothing has settled.
pub fn flat_stake_simulation(bets: &[MockBet], flat_stake: Decimal) -> Option<FlatSimResult> {
    let settled = settled_chronological(bets);
    if settled.is_empty() {
        return None;
    }

    let total_stake = flat_stake * Decimal::from(settled.len() as u64);
    let mut total_return = Decimal::ZERO;
    let mut running = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;
    let mut cumulative = Vec::with_capacity(settled.len());

    for bet in &settled {
        match bet.result {
            BetResult::Win => {
                let payout = win_payout(bet.odds_american, flat_stake);
                total_return += flat_stake + payout;
                running += payout;
            }
            BetResult::Push => total_return += flat_stake,
            _ => running -= flat_stake,
        }

        if running > peak {
            peak = running;
        }
        let drawdown = peak - running;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }

        cumulative.push(PlPoint {
            date: bet
                .settled_at
                .unwrap_or(bet.placed_at)
                .format("%Y-%m-%d")
                .to_string(),
            pl: decimal_f64(running),
        });
    }

    let net_pl = total_return - total_stake;
    Some(FlatSimResult {
        flat_stake,
        total_bets: settled.len(),
        total_stake,
        total_return,
        net_pl,
        roi: roi_pct(net_pl, total_stake),
        max_drawdown,
        cumulative_pl: cumulative,
    })
}
