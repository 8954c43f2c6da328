//! Medal tally aggregation.
//!
//! The tally is a pure function of a team snapshot and the results that
//! qualify (results of published events). It is recomputed on every request;
//! nothing here caches or updates incrementally.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::TeamSummary;

/// Gold, silver, and bronze counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCount {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl MedalCount {
    #[must_use]
    pub const fn new(gold: u32, silver: u32, bronze: u32) -> Self {
        Self {
            gold,
            silver,
            bronze,
        }
    }

    #[must_use]
    pub const fn total(self) -> u32 {
        self.gold
            .saturating_add(self.silver)
            .saturating_add(self.bronze)
    }

    pub const fn add(&mut self, other: Self) {
        self.gold = self.gold.saturating_add(other.gold);
        self.silver = self.silver.saturating_add(other.silver);
        self.bronze = self.bronze.saturating_add(other.bronze);
    }
}

/// Medals one team earned from one qualifying result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingResult {
    pub team_id: String,
    pub medals: MedalCount,
}

/// One leaderboard row. Team fields are flattened into the JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    #[serde(flatten)]
    pub team: TeamSummary,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub total: u32,
}

impl TallyEntry {
    fn zero(team: TeamSummary) -> Self {
        Self {
            team,
            gold: 0,
            silver: 0,
            bronze: 0,
            total: 0,
        }
    }

    #[must_use]
    pub const fn medals(&self) -> MedalCount {
        MedalCount::new(self.gold, self.silver, self.bronze)
    }
}

/// Leaderboard order: more gold first, then silver, then bronze, then team
/// name ascending. The team ID breaks any remaining tie so the order is total.
#[must_use]
pub fn leaderboard_order(a: &TallyEntry, b: &TallyEntry) -> Ordering {
    b.gold
        .cmp(&a.gold)
        .then_with(|| b.silver.cmp(&a.silver))
        .then_with(|| b.bronze.cmp(&a.bronze))
        .then_with(|| a.team.name.cmp(&b.team.name))
        .then_with(|| a.team.id.cmp(&b.team.id))
}

/// Build the sorted medal tally.
///
/// Every team in `teams` appears exactly once (duplicate IDs keep the first
/// occurrence), including teams with no qualifying results. Results whose
/// team is not in `teams` are ignored.
#[must_use]
pub fn compute_tally<I>(teams: Vec<TeamSummary>, results: I) -> Vec<TallyEntry>
where
    I: IntoIterator<Item = QualifyingResult>,
{
    let mut index: HashMap<String, usize> = HashMap::with_capacity(teams.len());
    let mut entries: Vec<TallyEntry> = Vec::with_capacity(teams.len());
    for team in teams {
        if index.contains_key(&team.id) {
            continue;
        }
        index.insert(team.id.clone(), entries.len());
        entries.push(TallyEntry::zero(team));
    }

    let mut sums = vec![MedalCount::default(); entries.len()];
    for result in results {
        if let Some(&i) = index.get(&result.team_id) {
            sums[i].add(result.medals);
        }
    }

    for (entry, sum) in entries.iter_mut().zip(sums) {
        entry.gold = sum.gold;
        entry.silver = sum.silver;
        entry.bronze = sum.bronze;
        entry.total = sum.total();
    }

    entries.sort_by(leaderboard_order);
    entries
}

/// Category view of the tally: teams that earned nothing in the category are dropped.
#[must_use]
pub fn without_empty(entries: Vec<TallyEntry>) -> Vec<TallyEntry> {
    entries.into_iter().filter(|e| e.total > 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn team(id: &str, name: &str) -> TeamSummary {
        TeamSummary {
            id: id.into(),
            name: name.into(),
            acronym: name.chars().take(3).collect(),
            logo_url: None,
        }
    }

    fn won(team_id: &str, gold: u32, silver: u32, bronze: u32) -> QualifyingResult {
        QualifyingResult {
            team_id: team_id.into(),
            medals: MedalCount::new(gold, silver, bronze),
        }
    }

    fn names(entries: &[TallyEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.team.name.as_str()).collect()
    }

    #[test]
    fn gold_outranks_total() {
        let tally = compute_tally(
            vec![team("tm-b", "B"), team("tm-a", "A")],
            vec![won("tm-a", 2, 0, 1), won("tm-b", 1, 3, 0)],
        );
        assert_eq!(names(&tally), vec!["A", "B"]);
        assert_eq!(tally[0].total, 3);
        assert_eq!(tally[1].total, 4);
    }

    #[test]
    fn sums_across_multiple_results() {
        let tally = compute_tally(
            vec![team("tm-a", "A")],
            vec![won("tm-a", 1, 0, 0), won("tm-a", 0, 2, 0), won("tm-a", 3, 0, 5)],
        );
        assert_eq!(tally[0].medals(), MedalCount::new(4, 2, 5));
        assert_eq!(tally[0].total, 11);
    }

    #[test]
    fn teams_without_results_appear_with_zeros() {
        let tally = compute_tally(
            vec![team("tm-a", "Arts"), team("tm-b", "Business")],
            vec![won("tm-b", 1, 0, 0)],
        );
        assert_eq!(tally.len(), 2);
        assert_eq!(tally[1].team.id, "tm-a");
        assert_eq!(tally[1].medals(), MedalCount::default());
        assert_eq!(tally[1].total, 0);
    }

    #[test]
    fn tie_breaks_silver_then_bronze_then_name() {
        let tally = compute_tally(
            vec![
                team("tm-1", "Delta"),
                team("tm-2", "Charlie"),
                team("tm-3", "Bravo"),
                team("tm-4", "Alpha"),
            ],
            vec![
                won("tm-1", 1, 2, 0),
                won("tm-2", 1, 1, 5),
                won("tm-3", 1, 1, 5),
                won("tm-4", 1, 1, 4),
            ],
        );
        assert_eq!(names(&tally), vec!["Delta", "Bravo", "Charlie", "Alpha"]);
    }

    #[test]
    fn duplicate_names_ordered_by_id() {
        let tally = compute_tally(vec![team("tm-z", "Same"), team("tm-a", "Same")], vec![]);
        assert_eq!(tally[0].team.id, "tm-a");
        assert_eq!(tally[1].team.id, "tm-z");
    }

    #[test]
    fn one_entry_per_team() {
        let tally = compute_tally(
            vec![team("tm-a", "A"), team("tm-a", "A again"), team("tm-b", "B")],
            vec![won("tm-a", 1, 0, 0)],
        );
        assert_eq!(tally.len(), 2);
        assert_eq!(tally[0].team.name, "A");
        assert_eq!(tally[0].gold, 1);
    }

    #[test]
    fn results_for_unknown_teams_are_ignored() {
        let tally = compute_tally(vec![team("tm-a", "A")], vec![won("tm-ghost", 9, 9, 9)]);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally[0].total, 0);
    }

    #[test]
    fn order_is_deterministic_regardless_of_input_order() {
        let teams = vec![team("tm-a", "A"), team("tm-b", "B"), team("tm-c", "C")];
        let results = vec![won("tm-c", 1, 0, 0), won("tm-b", 1, 0, 0), won("tm-a", 0, 0, 2)];

        let forward = compute_tally(teams.clone(), results.clone());
        let mut reversed_teams = teams;
        reversed_teams.reverse();
        let mut reversed_results = results;
        reversed_results.reverse();
        let backward = compute_tally(reversed_teams, reversed_results);

        assert_eq!(forward, backward);
        assert_eq!(names(&forward), vec!["B", "C", "A"]);
    }

    #[test]
    fn category_view_drops_empty_rows() {
        let tally = compute_tally(
            vec![team("tm-a", "A"), team("tm-b", "B")],
            vec![won("tm-a", 0, 0, 1)],
        );
        let filtered = without_empty(tally);
        assert_eq!(names(&filtered), vec!["A"]);
    }

    #[test]
    fn entry_serializes_flat() {
        let tally = compute_tally(vec![team("tm-a", "Arts")], vec![won("tm-a", 1, 2, 3)]);
        let json = serde_json::to_value(&tally[0]).unwrap();
        assert_eq!(json["id"], "tm-a");
        assert_eq!(json["name"], "Arts");
        assert_eq!(json["gold"], 1);
        assert_eq!(json["total"], 6);
    }
}
