// Record types shared by the fetch, scan, ranking and report stages.
//
// A `StandingsRow` is what the standings endpoint reports for one entrant.
// Once that entrant's history has been fetched and decoded it becomes an
// `Entry`, and a `League` owns the entries that survived the fetch phase.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Standings input
// ---------------------------------------------------------------------------

/// One row of a league's standings table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StandingsRow {
    /// API identity of the standings row.
    pub id: u64,
    /// The entrant's persistent account identifier.
    pub entry: u64,
    pub entry_name: String,
    pub player_name: String,
    /// Cumulative score at the time of the snapshot.
    pub total: i32,
    pub rank: u32,
}

/// Identity of a league as reported alongside its standings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeagueHeader {
    pub id: u64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// History input
// ---------------------------------------------------------------------------

/// One game week of an entrant's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeekScore {
    pub event: u32,
    pub points: i32,
    #[serde(default)]
    pub event_transfers_cost: i32,
}

impl WeekScore {
    /// Points for the week after the transfer penalty.
    pub fn net(&self) -> i32 {
        self.points - self.event_transfers_cost
    }
}

/// Body of the per-entrant history endpoint. Only the `current` season
/// array is used; past seasons and chips are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub current: Vec<WeekScore>,
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One league participant's aggregated season record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: u64,
    pub entry_num: u64,
    pub entry_name: String,
    pub player_name: String,
    /// Net score per game week. Weeks missing from the history are absent,
    /// not zero.
    pub points: BTreeMap<u32, i32>,
    /// Cumulative total from the standings snapshot. Never recomputed from
    /// `points`.
    pub total: i32,
    /// Overwritten by the ranking engine.
    pub rank: u32,
}

impl Entry {
    /// Combine a standings row with the entrant's decoded history.
    ///
    /// If the history repeats a week, the last occurrence wins.
    pub fn from_history(row: &StandingsRow, history: &[WeekScore]) -> Self {
        let points = history.iter().map(|w| (w.event, w.net())).collect();
        Self {
            id: row.id,
            entry_num: row.entry,
            entry_name: row.entry_name.clone(),
            player_name: row.player_name.clone(),
            points,
            total: row.total,
            rank: row.rank,
        }
    }

    /// Net score for `week`, or `None` if the entrant has no data for it.
    pub fn week_points(&self, week: u32) -> Option<i32> {
        self.points.get(&week).copied()
    }
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

/// A named competition and the entries fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct League {
    pub id: u64,
    pub name: String,
    pub entries: Vec<Entry>,
}

impl League {
    pub fn new(header: LeagueHeader, entries: Vec<Entry>) -> Self {
        Self {
            id: header.id,
            name: header.name,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Exclusion set
// ---------------------------------------------------------------------------

/// Account identifiers whose standings rows are dropped before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: HashSet<u64>,
}

impl ExclusionSet {
    pub fn contains(&self, entry_num: u64) -> bool {
        self.ids.contains(&entry_num)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<u64> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
