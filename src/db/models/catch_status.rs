//! Per-user, per-fish catch state.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Join row keyed by `(user_id, fish_id)`. The composite primary key
/// guarantees at most one row per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CatchStatus {
    pub user_id: i64,
    pub fish_id: i64,
    pub is_caught: bool,
}

/// A catalog fish joined with one user's catch state, for the track board.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrackedFish {
    pub id: i64,
    pub name: String,
    pub icon_url: String,
    pub catchphrase: Option<String>,
    pub is_caught: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkMarkRequest {
    pub fish_ids: Vec<i64>,
    pub caught: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_status_json_shape_round_trips() {
        let status = CatchStatus {
            user_id: 7,
            fish_id: 42,
            is_caught: true,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user_id": 7, "fish_id": 42, "is_caught": true})
        );

        let back: CatchStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }
}
