use serde::{Deserialize, Serialize};

use super::game::Game;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub address: String,
    pub user_name: String,
    pub total_points: u32,
}

/// Players ranked by total points, highest first; ties keep join order.
pub fn leaderboard(game: &Game) -> Vec<PlayerResult> {
    let mut results: Vec<PlayerResult> = game
        .players
        .iter()
        .map(|p| PlayerResult {
            address: p.address.clone(),
            user_name: p.user_name.clone(),
            total_points: p.total_points(),
        })
        .collect();
    results.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    results
}
