use crate::model::Category;
use serde::Serialize;

/// Tier recorded when the listing row carries no tier image
pub const NO_TIER: &str = "None";

/// One ranked participant of the leaderboard
///
/// Created by the listing crawl with every listing field filled in and
/// `category` left at [`Category::Unknown`]; the detail pool sets `category`
/// exactly once.
///
/// Field order here is the archive column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entrant {
    pub name: String,
    pub id: u64,
    #[serde(rename = "cur_rank")]
    pub current_rank: u32,
    /// 0 when the site shows no previous rank
    #[serde(rename = "prev_rank")]
    pub previous_rank: u32,
    pub world: String,
    #[serde(rename = "dc")]
    pub group: String,
    pub points: i64,
    pub points_delta: i64,
    /// Portrait path with the image host prefix stripped
    pub portrait: String,
    pub tier: String,
    pub wins: i64,
    pub wins_delta: i64,
    #[serde(rename = "job")]
    pub category: Category,
}

/// Archive column names, in serialization order
pub const ENTRANT_COLUMNS: [&str; 13] = [
    "name",
    "id",
    "cur_rank",
    "prev_rank",
    "world",
    "dc",
    "points",
    "points_delta",
    "portrait",
    "tier",
    "wins",
    "wins_delta",
    "job",
];

#[cfg(test)]
pub(crate) fn sample_entrant(id: u64, group: &str) -> Entrant {
    Entrant {
        name: format!("Player {}", id),
        id,
        current_rank: 1,
        previous_rank: 0,
        world: "Cerberus".to_string(),
        group: group.to_string(),
        points: 1000,
        points_delta: 0,
        portrait: format!("ab/{}_c0.jpg", id),
        tier: NO_TIER.to_string(),
        wins: 10,
        wins_delta: 0,
        category: Category::Unknown,
    }
}
