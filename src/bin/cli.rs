use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use edgebook::analytics::{compute_report, filter_ledger, flat_stake_simulation};
use edgebook::models::{
    BetResult, BetType, ConfidenceLevel, Conference, Game, GameStatus, GolfEvent, GolfRound,
    Golfer, ImpactLevel, InjuryImpact, MockBet, ModelSource, OddsSnapshot, Sport, Team,
    UserModelConfig, UserProfile,
};
use edgebook::settlement::settle_pending;
use edgebook::store::{export_ledger_csv, Dataset};
use edgebook::{build_board, UserContext};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "edgebook", about = "Sports odds edge board and mock bet ledger")]
struct Cli {
    /// Path to the JSON dataset file (defaults to $DATASET_PATH, then data/dataset.json)
    #[arg(long)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the analysis board for a sport
    Board {
        sport: Sport,
        /// Also run the user model with this user's weights
        #[arg(long)]
        user: Option<String>,
    },
    /// Settle pending mock bets for finalized games and events
    Settle {
        /// Limit the sweep to one sport
        #[arg(long)]
        sport: Option<Sport>,
    },
    /// Print performance analytics for the mock bet ledger
    Report {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        sport: Option<Sport>,
    },
    /// Export settled mock bets to CSV
    Export {
        #[arg(long, default_value = "mockbets.csv")]
        out: PathBuf,
        #[arg(long)]
        user: Option<String>,
    },
    /// Resimulate the settled ledger at a fixed flat stake
    FlatSim {
        #[arg(long)]
        stake: Decimal,
        #[arg(long)]
        user: Option<String>,
    },
    /// Write a small demo dataset to the dataset path
    Seed,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let path = cli
        .dataset
        .or_else(|| std::env::var("DATASET_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data/dataset.json"));

    if let Command::Seed = cli.command {
        let dataset = seed_dataset();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).context("Failed to create dataset directory")?;
        }
        dataset.save(&path)?;
        println!("Wrote demo dataset to {}", path.display());
        println!("  - {} teams", dataset.teams.len());
        println!("  - {} games", dataset.games.len());
        println!("  - {} odds snapshots", dataset.odds_snapshots.len());
        println!("  - {} mock bets", dataset.mock_bets.len());
        return Ok(());
    }

    let mut dataset = Dataset::load(&path)?;
    let now = Utc::now();

    match cli.command {
        Command::Board { sport, user } => {
            let ctx = user.map(|u| UserContext::for_user(&dataset, &u));
            let board = build_board(&dataset, sport, ctx.as_ref(), now);
            if board.is_empty() {
                println!("No {} games on the board.", sport);
            } else {
                println!("{} BOARD ({} games)\n", sport.to_string().to_uppercase(), board.len());
                for (i, analysis) in board.iter().enumerate() {
                    println!("{}. {}", i + 1, analysis.format());
                }
            }
        }
        Command::Settle { sport } => {
            let summary = settle_pending(&mut dataset, sport, now);
            dataset.save(&path)?;
            println!(
                "Settled {} mock bets (CFB: {}, CBB: {}, Golf: {})",
                summary.total(),
                summary.cfb,
                summary.cbb,
                summary.golf
            );
        }
        Command::Report { user, sport } => {
            let bets = ledger_for(&dataset, user.as_deref(), sport);
            let report = compute_report(&bets);

            println!("MOCK BET REPORT\n");
            let k = &report.kpis;
            println!(
                "Bets: {} ({} settled, {} pending)",
                k.total_bets, k.settled_count, k.pending_count
            );
            println!("Record: {}-{}-{} (W-L-P)", k.wins, k.losses, k.pushes);
            println!(
                "Staked: {} | Returned: {} | Net: {}",
                k.total_stake, k.total_return, k.net_pl
            );
            println!("Win %: {:.1} | ROI: {:+.1}%", k.win_pct, k.roi);
            println!(
                "Avg odds: {:+.0} | Avg implied: {:.1}%",
                k.avg_odds, k.avg_implied
            );

            if let Some(variance) = &report.variance {
                println!("\nVARIANCE\n");
                println!(
                    "Longest streaks: {} wins / {} losses",
                    variance.longest_winning_streak, variance.longest_losing_streak
                );
                println!("Max drawdown: {:.2}", variance.max_drawdown);
                println!("Volatility: {:.2}", variance.volatility);
                println!(
                    "Best {}-bet stretch: {:+.2} (from bet {})",
                    variance.best_stretch.window,
                    variance.best_stretch.value,
                    variance.best_stretch.start
                );
                println!(
                    "Worst {}-bet stretch: {:+.2} (from bet {})",
                    variance.worst_stretch.window,
                    variance.worst_stretch.value,
                    variance.worst_stretch.start
                );
            }

            println!("\nCALIBRATION\n");
            for (label, row) in [
                ("low", &report.calibration.low),
                ("medium", &report.calibration.medium),
                ("high", &report.calibration.high),
            ] {
                if let Some(row) = row {
                    println!(
                        "{:>6}: {} bets | expected {:.1}% | actual {:.1}% | diff {:+.1}",
                        label, row.count, row.expected_win_pct, row.actual_win_pct, row.diff
                    );
                }
            }

            if let Some(edge) = &report.edge {
                println!("\nEDGE BUCKETS\n");
                for bucket in [&edge.negative, &edge.small, &edge.medium, &edge.large]
                    .into_iter()
                    .flatten()
                {
                    println!(
                        "{:>5}: {} bets | win {:.1}% | ROI {:+.1}%",
                        bucket.range, bucket.count, bucket.win_pct, bucket.roi
                    );
                }
            }
        }
        Command::Export { out, user } => {
            let bets = ledger_for(&dataset, user.as_deref(), None);
            let refs: Vec<&MockBet> = bets.iter().collect();
            export_ledger_csv(&refs, &out)?;
            println!(
                "Exported {} settled bets to {}",
                refs.iter().filter(|b| b.is_settled()).count(),
                out.display()
            );
        }
        Command::FlatSim { stake, user } => {
            let bets = ledger_for(&dataset, user.as_deref(), None);
            match flat_stake_simulation(&bets, stake) {
                Some(sim) => {
                    println!("FLAT STAKE SIMULATION ({} per bet)\n", sim.flat_stake);
                    println!("Bets: {}", sim.total_bets);
                    println!(
                        "Staked: {} | Returned: {} | Net: {}",
                        sim.total_stake, sim.total_return, sim.net_pl
                    );
                    println!("ROI: {:+.1}% | Max drawdown: {}", sim.roi, sim.max_drawdown);
                }
                None => println!("No settled bets to simulate."),
            }
        }
        // handled before the dataset load
        Command::Seed => unreachable!(),
    }

    Ok(())
}

fn ledger_for(dataset: &Dataset, user: Option<&str>, sport: Option<Sport>) -> Vec<MockBet> {
    let scoped: Vec<MockBet> = dataset
        .mock_bets
        .iter()
        .filter(|b| user.map_or(true, |u| b.username == u))
        .cloned()
        .collect();
    filter_ledger(&scoped, sport, None, None)
}

/// A small, self-contained dataset for trying the CLI and web server
fn seed_dataset() -> Dataset {
    let now = Utc::now();
    let mut ds = Dataset::default();

    ds.conferences.push(Conference {
        id: 1,
        name: "SEC".to_string(),
    });
    ds.conferences.push(Conference {
        id: 2,
        name: "Big Ten".to_string(),
    });

    for (id, name, conference_id, rating) in [
        (1u32, "Alabama", 1u32, 92.0),
        (2, "Auburn", 1, 85.5),
        (3, "Ohio State", 2, 93.5),
        (4, "Michigan", 2, 90.0),
    ] {
        ds.teams.push(Team {
            id,
            name: name.to_string(),
            conference_id,
            rating,
        });
    }

    // one finalized CFB game with a pending bet, one upcoming
    let final_game = Uuid::new_v4();
    ds.games.push(Game {
        id: final_game,
        sport: Sport::Cfb,
        home_team_id: 1,
        away_team_id: 2,
        start_time: now - Duration::days(2),
        neutral_site: false,
        status: GameStatus::Final,
        home_score: Some(31),
        away_score: Some(17),
    });
    let upcoming = Uuid::new_v4();
    ds.games.push(Game {
        id: upcoming,
        sport: Sport::Cfb,
        home_team_id: 3,
        away_team_id: 4,
        start_time: now + Duration::days(3),
        neutral_site: false,
        status: GameStatus::Scheduled,
        home_score: None,
        away_score: None,
    });

    for (game_id, prob, spread, total, hours_ago) in [
        (final_game, 0.68, -7.5, 52.5, 50i64),
        (upcoming, 0.55, -3.0, 48.5, 8),
        (upcoming, 0.58, -3.5, 49.0, 1),
    ] {
        ds.odds_snapshots.push(OddsSnapshot {
            game_id,
            captured_at: now - Duration::hours(hours_ago),
            sportsbook: "consensus".to_string(),
            market_home_win_prob: prob,
            market_away_win_prob: Some(1.0 - prob),
            spread: Some(spread),
            total: Some(total),
            moneyline_home: Some(-180),
            moneyline_away: Some(150),
        });
    }

    ds.injuries.push(InjuryImpact {
        game_id: upcoming,
        team_id: 4,
        impact_level: ImpactLevel::Med,
        notes: "Starting RB questionable".to_string(),
    });

    ds.golf_events.push(GolfEvent {
        id: 1,
        name: "Demo Invitational".to_string(),
        start_date: (now - Duration::days(6)).date_naive(),
        end_date: (now - Duration::days(3)).date_naive(),
    });
    for (id, name) in [(1u32, "S. Scheffler"), (2, "R. McIlroy")] {
        ds.golfers.push(Golfer {
            id,
            name: name.to_string(),
        });
    }
    for golfer_id in [1u32, 2] {
        for round_number in 1..=4u32 {
            ds.golf_rounds.push(GolfRound {
                event_id: 1,
                golfer_id,
                round_number,
                score: Some(if golfer_id == 1 { 68 } else { 70 }),
            });
        }
    }

    ds.user_configs.push(UserModelConfig::new("demo"));
    ds.user_profiles.push(UserProfile {
        username: "demo".to_string(),
        favorite_team_id: Some(1),
    });

    ds.mock_bets.push(MockBet {
        id: Uuid::new_v4(),
        username: "demo".to_string(),
        sport: Sport::Cfb,
        game_id: Some(final_game),
        golf_event_id: None,
        golfer_id: None,
        bet_type: BetType::Moneyline,
        selection: "Alabama".to_string(),
        odds_american: -150,
        implied_probability: edgebook::models::implied_probability(-150),
        stake_amount: dec!(100.00),
        result: BetResult::Pending,
        simulated_payout: None,
        confidence_level: ConfidenceLevel::High,
        model_source: ModelSource::House,
        expected_edge: Some(4.5),
        notes: String::new(),
        placed_at: now - Duration::days(3),
        settled_at: None,
        review_flag: None,
        review_notes: String::new(),
    });
    ds.mock_bets.push(MockBet {
        id: Uuid::new_v4(),
        username: "demo".to_string(),
        sport: Sport::Golf,
        game_id: None,
        golf_event_id: Some(1),
        golfer_id: Some(1),
        bet_type: BetType::Outright,
        selection: "S. Scheffler".to_string(),
        odds_american: 450,
        implied_probability: edgebook::models::implied_probability(450),
        stake_amount: dec!(25.00),
        result: BetResult::Pending,
        simulated_payout: None,
        confidence_level: ConfidenceLevel::Medium,
        model_source: ModelSource::User,
        expected_edge: Some(1.5),
        notes: String::new(),
        placed_at: now - Duration::days(5),
        settled_at: None,
        review_flag: None,
        review_notes: String::new(),
    });

    ds
}
