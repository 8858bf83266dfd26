use serde::Serialize;
use thiserror::Error;

use crate::{StopID, Table, TripID};

/// A problem found while loading one table. These never abort a load; they're collected in
/// `GTFS::errors`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GTFSError {
    pub table: Table,
    /// The line in the source file, when the problem belongs to one row
    pub line: Option<u64>,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
pub enum ErrorKind {
    #[error("required table is missing from the archive")]
    MissingTable,
    #[error("feed_id is undefined")]
    MissingFeedId,
    #[error("couldn't parse row: {0}")]
    Parse(String),
    #[error("{field} references unknown {id:?}")]
    ReferentialIntegrity { field: &'static str, id: String },
    #[error("duplicate key {0}")]
    DuplicateKey(String),
}

impl GTFSError {
    pub fn new(table: Table, line: Option<u64>, kind: ErrorKind) -> Self {
        Self { table, line, kind }
    }
}

impl std::fmt::Display for GTFSError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.table, line, self.kind),
            None => write!(f, "{}: {}", self.table, self.kind),
        }
    }
}

/// Failure of a single query. The feed is left untouched.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown trip {0:?}")]
    UnknownTrip(TripID),
    #[error("unknown stop {0:?}")]
    UnknownStop(StopID),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
