//! Ranking rules used by committee submissions.
//!
//! A committee orders teams by finishing position and lists tied positions as
//! free text (`"1-2, 4-6"`). Positions in one tie group share a rank, and ranks
//! are dense: positions `1-2, 3, 4` rank `1, 1, 2, 3`.

use std::sync::LazyLock;

use regex::Regex;

use crate::entities::ResultSubmission;

static TIE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("tie group pattern compiles"));

/// A run of 1-based positions `start..=end` that share one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieGroup {
    pub start: usize,
    pub end: usize,
}

/// Extract tie groups from free text.
///
/// Every `a-b` with `a < b` becomes a group; anything else (including `3-3`
/// and `5-2`) is ignored. Groups keep the order they appear in.
#[must_use]
pub fn parse_tie_groups(spec: &str) -> Vec<TieGroup> {
    TIE_RE
        .captures_iter(spec)
        .filter_map(|caps| {
            let start = caps[1].parse::<usize>().ok()?;
            let end = caps[2].parse::<usize>().ok()?;
            (start < end).then_some(TieGroup { start, end })
        })
        .collect()
}

/// Assign a rank to each of `positions` ordered positions.
///
/// Walks positions from 1 with a running rank. When the first tie group that
/// starts at the current position exists, every position it covers (up to
/// `positions`) gets the running rank and the walk skips past the group.
/// Groups starting at 0 never match a position.
/// The running rank goes up by one per step.
#[must_use]
pub fn assign_ranks(positions: usize, groups: &[TieGroup]) -> Vec<u32> {
    let mut ranks = vec![0_u32; positions];
    let mut rank: u32 = 1;
    let mut position = 1;

    while position <= positions {
        if let Some(group) = groups.iter().find(|g| g.start == position) {
            for slot in &mut ranks[group.start - 1..group.end.min(positions)] {
                *slot = rank;
            }
            position = group.end.saturating_add(1);
        } else {
            ranks[position - 1] = rank;
            position += 1;
        }
        rank = rank.saturating_add(1);
    }

    ranks
}

/// Medals for one placement: the event's medal value goes to the podium
/// colour matching the rank. Returns `(gold, silver, bronze)`.
#[must_use]
pub const fn medals_for_rank(rank: u32, medal_value: u32) -> (u32, u32, u32) {
    match rank {
        1 => (medal_value, 0, 0),
        2 => (0, medal_value, 0),
        3 => (0, 0, medal_value),
        _ => (0, 0, 0),
    }
}

/// Turn an ordered list of team IDs plus a tie spec into a full submission.
#[must_use]
pub fn build_ranked_results(
    team_ids: &[String],
    groups: &[TieGroup],
    medal_value: u32,
) -> Vec<ResultSubmission> {
    let ranks = assign_ranks(team_ids.len(), groups);
    team_ids
        .iter()
        .zip(ranks)
        .map(|(team_id, rank)| {
            let (gold, silver, bronze) = medals_for_rank(rank, medal_value);
            ResultSubmission {
                team_id: team_id.clone(),
                rank,
                gold_awarded: gold,
                silver_awarded: silver,
                bronze_awarded: bronze,
            }
        })
        .collect()
}
