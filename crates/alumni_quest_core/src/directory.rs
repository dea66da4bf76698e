//! crates/alumni_quest_core/src/directory.rs
//!
//! Read-only projections over backend rows: directory search and filters, and
//! leaderboard ranking.

use crate::domain::{LeaderboardEntry, Peer, UserProfile};

const RECOMMENDED_LIMIT: usize = 5;
const RECENTLY_MET_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryCategory {
    #[default]
    All,
    Recommended,
    RecentlyMet,
    SameIndustry,
}

/// Case-insensitive match over the visible profile fields.
pub fn search_peers(peers: &[Peer], query: &str) -> Vec<Peer> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return peers.to_vec();
    }
    peers
        .iter()
        .filter(|p| {
            [&p.name, &p.title, &p.company, &p.batch, &p.industry]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

pub fn filter_peers(peers: Vec<Peer>, category: DirectoryCategory, viewer: Option<&UserProfile>) -> Vec<Peer> {
    match category {
        DirectoryCategory::All => peers,
        DirectoryCategory::Recommended => peers.into_iter().take(RECOMMENDED_LIMIT).collect(),
        DirectoryCategory::RecentlyMet => peers.into_iter().take(RECENTLY_MET_LIMIT).collect(),
        DirectoryCategory::SameIndustry => match viewer.map(|v| v.industry.trim()).filter(|i| !i.is_empty()) {
            Some(industry) => peers
                .into_iter()
                .filter(|p| p.industry.eq_ignore_ascii_case(industry))
                .collect(),
            None => Vec::new(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeaderboardFilter {
    #[default]
    Overall,
    /// The viewer's own batch.
    Batch,
    Industry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub medal: Option<Medal>,
    pub entry: LeaderboardEntry,
}

/// Sorts by points (ties by name), applies the filter, then numbers the result.
pub fn rank_leaderboard(
    mut entries: Vec<LeaderboardEntry>,
    filter: &LeaderboardFilter,
    viewer: Option<&UserProfile>,
) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

    let keep = |e: &LeaderboardEntry| match filter {
        LeaderboardFilter::Overall => true,
        LeaderboardFilter::Batch => viewer.is_some_and(|v| !v.batch.is_empty() && v.batch == e.batch),
        LeaderboardFilter::Industry(industry) => e.industry.eq_ignore_ascii_case(industry),
    };

    entries
        .into_iter()
        .filter(|e| keep(e))
        .enumerate()
        .map(|(i, entry)| {
            let rank = i + 1;
            let medal = match rank {
                1 => Some(Medal::Gold),
                2 => Some(Medal::Silver),
                3 => Some(Medal::Bronze),
                _ => None,
            };
            RankedEntry { rank, medal, entry }
        })
        .collect()
}
