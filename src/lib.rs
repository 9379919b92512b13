pub mod analysis;
pub mod analytics;
pub mod models;
pub mod settlement;
pub mod store;

pub use analysis::*;
pub use analytics::*;
pub use models::*;
pub use settlement::*;
pub use store::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analysis boards for both game sports, as served to the web layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllBoards {
    pub cfb: Vec<GameAnalysis>,
    pub cbb: Vec<GameAnalysis>,
}

/// Build the CFB and CBB boards in one pass over the dataset
pub fn build_all_boards(
    dataset: &Dataset,
    user: Option<&UserContext>,
    now: DateTime<Utc>,
) -> AllBoards {
    AllBoards {
        cfb: build_board(dataset, Sport::Cfb, user, now),
        cbb: build_board(dataset, Sport::Cbb, user, now),
    }
}
