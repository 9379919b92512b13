use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{bet_return, decimal_f64, round1, roi_pct, settled_chronological};
use crate::models::{BetResult, ConfidenceLevel, MockBet, Sport};

/// Rolling win-rate window size, in settled bets
pub const ROLLING_WINDOW: usize = 10;

/// One point on the cumulative P/L series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlPoint {
    pub date: String,
    pub pl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingPoint {
    pub bet_num: usize,
    pub win_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiRow {
    pub roi: f64,
    pub count: usize,
    pub net: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportRoi {
    pub cfb: Option<RoiRow>,
    pub cbb: Option<RoiRow>,
    pub golf: Option<RoiRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceRow {
    pub count: usize,
    pub win_pct: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidencePerformance {
    pub low: Option<ConfidenceRow>,
    pub medium: Option<ConfidenceRow>,
    pub high: Option<ConfidenceRow>,
}

/// One settled bet plotted as odds vs outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsPoint {
    pub odds: i32,
    pub result: BetResult,
    pub implied_prob: f64,
}

/// Series data behind the ledger charts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    pub cumulative_pl: Vec<PlPoint>,
    pub rolling_win_pct: Vec<RollingPoint>,
    pub roi_by_sport: SportRoi,
    pub performance_by_confidence: ConfidencePerformance,
    pub odds_distribution: Vec<OddsPoint>,
}

pub fn compute_chart_data(bets: &[MockBet]) -> ChartData {
    let settled = settled_chronological(bets);

    ChartData {
        cumulative_pl: cumulative_pl(&settled),
        rolling_win_pct: rolling_win_pct(&settled, ROLLING_WINDOW),
        roi_by_sport: roi_by_sport(&settled),
        performance_by_confidence: performance_by_confidence(&settled),
        odds_distribution: settled
            .iter()
            .map(|b| OddsPoint {
                odds: b.odds_american,
                result: b.result,
                implied_prob: b.implied_probability * 100.0,
            })
            .collect(),
    }
}

/// Running P/L after each settled bet, dated by settlement
fn cumulative_pl(settled: &[&MockBet]) -> Vec<PlPoint> {
    let mut running = Decimal::ZERO;
    let mut series = Vec::with_capacity(settled.len());
    for bet in settled {
        match bet.result {
            BetResult::Win => running += bet.simulated_payout.unwrap_or(Decimal::ZERO),
            BetResult::Loss => running -= bet.stake_amount,
            _ => {} // push: no change
        }
        let date = bet
            .settled_at
            .unwrap_or(bet.placed_at)
            .format("%Y-%m-%d")
            .to_string();
        series.push(PlPoint {
            date,
            pl: decimal_f64(running),
        });
    }
    series
}

/// Win rate over the trailing `window` settled bets, one point per bet
fn rolling_win_pct(settled: &[&MockBet], window: usize) -> Vec<RollingPoint> {
    let mut series = Vec::with_capacity(settled.len());
    for i in 0..settled.len() {
        let start = (i + 1).saturating_sub(window);
        let chunk = &settled[start..=i];
        let wins = chunk.iter().filter(|b| b.result == BetResult::Win).count();
        series.push(RollingPoint {
            bet_num: i + 1,
            win_pct: round1(wins as f64 / chunk.len() as f64 * 100.0),
        });
    }
    series
}

fn roi_by_sport(settled: &[&MockBet]) -> SportRoi {
    let row = |sport: Sport| -> Option<RoiRow> {
        let group: Vec<&&MockBet> = settled.iter().filter(|b| b.sport == sport).collect();
        if group.is_empty() {
            return None;
        }
        let stake: Decimal = group.iter().map(|b| b.stake_amount).sum();
        let ret: Decimal = group.iter().map(|b| bet_return(b)).sum();
        let net = ret - stake;
        Some(RoiRow {
            roi: roi_pct(net, stake),
            count: group.len(),
            net,
        })
    };

    SportRoi {
        cfb: row(Sport::Cfb),
        cbb: row(Sport::Cbb),
        golf: row(Sport::Golf),
    }
}

fn performance_by_confidence(settled: &[&MockBet]) -> ConfidencePerformance {
    let row = |level: ConfidenceLevel| -> Option<ConfidenceRow> {
        let group: Vec<&&MockBet> = settled
            .iter()
            .filter(|b| b.confidence_level == level)
            .collect();
        if group.is_empty() {
            return None;
        }
        let stake: Decimal = group.iter().map(|b| b.stake_amount).sum();
        let ret: Decimal = group.iter().map(|b| bet_return(b)).sum();
        let wins = group.iter().filter(|b| b.result == BetResult::Win).count();
        Some(ConfidenceRow {
            count: group.len(),
            win_pct: round1(wins as f64 / group.len() as f64 * 100.0),
            roi: roi_pct(ret - stake, stake),
        })
    };

    ConfidencePerformance {
        low: row(ConfidenceLevel::Low),
        medium: row(ConfidenceLevel::Medium),
        high: row(ConfidenceLevel::High),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::settled_bet;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_cumulative_pl_series() {
        let now = Utc::now();
        let mut first = settled_bet(100, dec!(100.00), BetResult::Win, 0.5);
        first.settled_at = Some(now - Duration::days(2));
        let mut second = settled_bet(-110, dec!(100.00), BetResult::Loss, 0.5238);
        second.settled_at = Some(now - Duration::days(1));
        let mut third = settled_bet(-110, dec!(100.00), BetResult::Push, 0.5238);
        third.settled_at = Some(now);

        let data = compute_chart_data(&[first, second, third]);
        let pls: Vec<f64> = data.cumulative_pl.iter().map(|p| p.pl).collect();
        assert_eq!(pls, vec![100.0, 0.0, 0.0]);
    }

    #[test]
    fn test_series_ordered_by_settlement_time() {
        let now = Utc::now();
        let mut newer = settled_bet(100, dec!(100.00), BetResult::Loss, 0.5);
        newer.settled_at = Some(now);
        let mut older = settled_bet(100, dec!(100.00), BetResult::Win, 0.5);
        older.settled_at = Some(now - Duration::days(3));

        // rows arrive out of order; the series must not
        let data = compute_chart_data(&[newer, older]);
        assert_eq!(data.cumulative_pl[0].pl, 100.0);
        assert_eq!(data.cumulative_pl[1].pl, 0.0);
    }

    #[test]
    fn test_rolling_win_pct_window() {
        let mut bets = Vec::new();
        let now = Utc::now();
        // 12 bets: first two losses, then ten straight wins
        for i in 0..12 {
            let result = if i < 2 { BetResult::Loss } else { BetResult::Win };
            let mut bet = settled_bet(100, dec!(100.00), result, 0.5);
            bet.settled_at = Some(now + Duration::minutes(i));
            bets.push(bet);
        }
        let data = compute_chart_data(&bets);
        let series = data.rolling_win_pct;
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].win_pct, 0.0);
        assert_eq!(series[1].win_pct, 0.0);
        // bet 3: one win of three
        assert!((series[2].win_pct - 33.3).abs() < 1e-9);
        // bet 12: the window has rolled past both losses
        assert_eq!(series[11].bet_num, 12);
        assert_eq!(series[11].win_pct, 100.0);
    }

    #[test]
    fn test_roi_by_sport_groups() {
        let mut cfb = settled_bet(100, dec!(100.00), BetResult::Win, 0.5);
        cfb.sport = Sport::Cfb;
        let mut golf = settled_bet(100, dec!(100.00), BetResult::Loss, 0.5);
        golf.sport = Sport::Golf;

        let data = compute_chart_data(&[cfb, golf]);
        let cfb_row = data.roi_by_sport.cfb.unwrap();
        assert_eq!(cfb_row.count, 1);
        assert!((cfb_row.roi - 100.0).abs() < 1e-9);
        assert_eq!(cfb_row.net, dec!(100.00));
        let golf_row = data.roi_by_sport.golf.unwrap();
        assert!((golf_row.roi - (-100.0)).abs() < 1e-9);
        assert!(data.roi_by_sport.cbb.is_none());
    }

    #[test]
    fn test_performance_by_confidence_groups() {
        let mut high = settled_bet(100, dec!(100.00), BetResult::Win, 0.5);
        high.confidence_level = ConfidenceLevel::High;
        let mut low = settled_bet(100, dec!(100.00), BetResult::Loss, 0.5);
        low.confidence_level = ConfidenceLevel::Low;

        let data = compute_chart_data(&[high, low]);
        assert_eq!(data.performance_by_confidence.high.unwrap().win_pct, 100.0);
        assert_eq!(data.performance_by_confidence.low.unwrap().win_pct, 0.0);
        assert!(data.performance_by_confidence.medium.is_none());
    }

    #[test]
    fn test_odds_distribution_points() {
        let bets = vec![settled_bet(-150, dec!(100.00), BetResult::Win, 0.6)];
        let data = compute_chart_data(&bets);
        assert_eq!(data.odds_distribution.len(), 1);
        assert_eq!(data.odds_distribution[0].odds, -150);
        assert!((data.odds_distribution[0].implied_prob - 60.0).abs() < 1e-9);
    }
}
