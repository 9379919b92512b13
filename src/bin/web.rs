use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use edgebook::analytics::{compute_report, filter_ledger, flat_stake_simulation};
use edgebook::models::{ConfidenceLevel, MockBet, ModelSource, Sport};
use edgebook::settlement::settle_pending;
use edgebook::store::Dataset;
use edgebook::{build_board, UserContext};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

struct AppState {
    dataset: RwLock<Dataset>,
    path: PathBuf,
}

type SharedState = Arc<AppState>;

#[derive(Deserialize)]
struct BoardQuery {
    user: Option<String>,
}

async fn board(
    Path(sport): Path<String>,
    Query(query): Query<BoardQuery>,
    State(state): State<SharedState>,
) -> Response {
    let sport = match sport.parse::<Sport>() {
        Ok(sport) => sport,
        Err(err) => return (StatusCode::BAD_REQUEST, err).into_response(),
    };

    let dataset = state.dataset.read().await;
    let ctx = query.user.map(|u| UserContext::for_user(&dataset, &u));
    let board = build_board(&dataset, sport, ctx.as_ref(), Utc::now());
    Json(board).into_response()
}

async fn user_bets(Path(user): Path<String>, State(state): State<SharedState>) -> Response {
    let dataset = state.dataset.read().await;
    let bets: Vec<MockBet> = dataset
        .bets_for_user(&user)
        .into_iter()
        .cloned()
        .collect();
    Json(bets).into_response()
}

#[derive(Deserialize)]
struct AnalyticsQuery {
    sport: Option<Sport>,
    confidence: Option<ConfidenceLevel>,
    model_source: Option<ModelSource>,
}

async fn user_analytics(
    Path(user): Path<String>,
    Query(query): Query<AnalyticsQuery>,
    State(state): State<SharedState>,
) -> Response {
    let dataset = state.dataset.read().await;
    let scoped: Vec<MockBet> = dataset
        .bets_for_user(&user)
        .into_iter()
        .cloned()
        .collect();
    let bets = filter_ledger(&scoped, query.sport, query.confidence, query.model_source);
    Json(compute_report(&bets)).into_response()
}

#[derive(Deserialize)]
struct FlatSimRequest {
    flat_stake: Decimal,
}

async fn user_flat_sim(
    Path(user): Path<String>,
    State(state): State<SharedState>,
    Json(request): Json<FlatSimRequest>,
) -> Response {
    let dataset = state.dataset.read().await;
    let bets: Vec<MockBet> = dataset
        .bets_for_user(&user)
        .into_iter()
        .cloned()
        .collect();
    match flat_stake_simulation(&bets, request.flat_stake) {
        Some(sim) => Json(sim).into_response(),
        None => (StatusCode::BAD_REQUEST, "No settled bets to simulate").into_response(),
    }
}

#[derive(Deserialize)]
struct SettleQuery {
    sport: Option<Sport>,
}

async fn settle(Query(query): Query<SettleQuery>, State(state): State<SharedState>) -> Response {
    let mut dataset = state.dataset.write().await;
    let summary = settle_pending(&mut dataset, query.sport, Utc::now());

    if let Err(err) = dataset.save(&state.path) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Settled {} bets but failed to save: {}", summary.total(), err),
        )
            .into_response();
    }
    Json(summary).into_response()
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let path = std::env::var("DATASET_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/dataset.json"));

    let dataset = match Dataset::load(&path) {
        Ok(dataset) => {
            println!("Loaded dataset from {}", path.display());
            println!("  - {} games", dataset.games.len());
            println!("  - {} odds snapshots", dataset.odds_snapshots.len());
            println!("  - {} mock bets", dataset.mock_bets.len());
            dataset
        }
        Err(err) => {
            eprintln!("Error loading dataset: {}", err);
            eprintln!("Server will start with an empty dataset");
            Dataset::default()
        }
    };

    let state: SharedState = Arc::new(AppState {
        dataset: RwLock::new(dataset),
        path,
    });

    println!("\nStarting web server at http://127.0.0.1:3000");
    println!("Press Ctrl+C to stop\n");

    let app = Router::new()
        .route("/api/board/:sport", get(board))
        .route("/api/mockbets/:user/bets", get(user_bets))
        .route("/api/mockbets/:user/analytics", get(user_analytics))
        .route("/api/mockbets/:user/flat-sim", post(user_flat_sim))
        .route("/api/settle", post(settle))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
