// Raw dataset export. Fetches one league dataset and writes it out unchanged,
// for dashboard pages that chart the records directly.

use std::io::Write;

use thiserror::Error;
use tracing::info;

use crate::output;
use crate::source::{LeagueSource, SourceError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write {dataset}: {source}")]
    Write {
        dataset: Dataset,
        #[source]
        source: std::io::Error,
    },
}

/// A league dataset that can be exported as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Standings,
    Squads,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Standings => write!(f, "standings"),
            Dataset::Squads => write!(f, "squads"),
        }
    }
}

/// Fetch `dataset` for `league_id` and emit it to `out`. Nothing is written
/// when the fetch fails. Returns the number of records written.
pub async fn export<S, W>(
    source: &S,
    dataset: Dataset,
    league_id: &str,
    out: W,
) -> Result<usize, ExportError>
where
    S: LeagueSource + ?Sized,
    W: Write,
{
    let write_error = |source: std::io::Error| ExportError::Write { dataset, source };
    let count = match dataset {
        Dataset::Standings => {
            let records = source.standings(league_id).await?;
            output::emit(&records, out).map_err(write_error)?;
            records.len()
        }
        Dataset::Squads => {
            let records = source.squads(league_id).await?;
            output::emit(&records, out).map_err(write_error)?;
            records.len()
        }
    };
    info!(league = league_id, %dataset, records = count, "dataset exported");
    Ok(count)
}
