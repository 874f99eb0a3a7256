// League data model and the aggregate facts derived from it.
//
// The league service returns loosely-shaped JSON. These types pin down the
// fields the pipeline actually depends on (rank, name, user, total for
// standings; gameweek for match results) and carry everything else through
// untouched in flattened maps, so prompts still see the full record.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A scheduling round of the season. Always >= 1.
pub type Gameweek = NonZeroU32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeagueError {
    #[error("cannot derive the current gameweek: match results are empty")]
    EmptyDataset,
}

// ---------------------------------------------------------------------------
// Raw service shapes
// ---------------------------------------------------------------------------

/// One standings row as served by the league API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStanding {
    pub rank: NonZeroU32,
    /// Team name.
    pub name: String,
    /// Manager name.
    pub user: String,
    /// Cumulative points.
    pub total: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single match result. Only `gameweek` is interpreted; the rest of the
/// record is forwarded verbatim to prompt construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResultRecord {
    pub gameweek: Gameweek,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The match-results envelope: `{ "data": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResults {
    pub data: Vec<MatchResultRecord>,
}

/// A roster/player record. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquadRecord(pub Map<String, Value>);

// ---------------------------------------------------------------------------
// Normalized projection
// ---------------------------------------------------------------------------

/// Compact standings row handed to the prompt builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsEntry {
    pub rank: NonZeroU32,
    pub team: String,
    pub manager: String,
    pub points: i64,
}

impl From<RawStanding> for StandingsEntry {
    fn from(raw: RawStanding) -> Self {
        StandingsEntry {
            rank: raw.rank,
            team: raw.name,
            manager: raw.user,
            points: raw.total,
        }
    }
}

/// Sort raw standings ascending by rank and project them to `StandingsEntry`.
///
/// The sort is stable, so rows sharing a rank keep their input order. The
/// output always has exactly as many entries as the input.
pub fn normalize(mut raw: Vec<RawStanding>) -> Vec<StandingsEntry> {
    raw.sort_by_key(|entry| entry.rank);
    raw.into_iter().map(StandingsEntry::from).collect()
}

/// The current gameweek: the highest gameweek observed across all match
/// results. Fails on an empty collection instead of inventing a value.
pub fn current_gameweek(results: &MatchResults) -> Result<Gameweek, LeagueError> {
    results
        .data
        .iter()
        .map(|record| record.gameweek)
        .max()
        .ok_or(LeagueError::EmptyDataset)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
