use std::io::Read;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::optional_time;
use crate::tables::{read_rows, Table};
use crate::{DuplicatePolicy, ErrorKind, GTFSError, StopID, TripID, GTFS};

/// One visit of a trip to a stop. These live in the disk-backed store, keyed by
/// `(trip_id, stop_sequence)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: TripID,
    /// Seconds since the start of the service day. Only required at timepoints.
    #[serde(default, with = "optional_time")]
    pub arrival_time: Option<u32>,
    #[serde(default, with = "optional_time")]
    pub departure_time: Option<u32>,
    pub stop_id: StopID,
    /// Increases along the trip, but needn't be contiguous
    pub stop_sequence: u32,
    #[serde(default)]
    pub stop_headsign: Option<String>,
    #[serde(default)]
    pub pickup_type: Option<u8>,
    #[serde(default)]
    pub drop_off_type: Option<u8>,
    #[serde(default)]
    pub shape_dist_traveled: Option<f64>,
    #[serde(default)]
    pub timepoint: Option<u8>,
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::StopTimes, reader, |stop_time: StopTime, row| {
        let mut resolved = row.require("trip_id", &stop_time.trip_id, &gtfs.trips);
        resolved &= row.require("stop_id", &stop_time.stop_id, &gtfs.stops);
        if !row.keep(resolved, dangling) {
            return Ok(());
        }

        let seq = i64::from(stop_time.stop_sequence);
        if gtfs.stop_times.contains(stop_time.trip_id.as_str(), seq)? {
            row.report(ErrorKind::DuplicateKey(format!(
                "({:?}, {})",
                stop_time.trip_id, stop_time.stop_sequence
            )));
            if duplicates == DuplicatePolicy::FirstWins {
                return Ok(());
            }
        }
        gtfs.stop_times
            .put(stop_time.trip_id.as_str(), seq, &stop_time)
    })
}
