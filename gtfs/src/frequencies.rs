use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::time;
use crate::tables::{read_rows, Table};
use crate::{GTFSError, TripID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub trip_id: TripID,
    /// Seconds since the start of the service day
    #[serde(with = "time")]
    pub start_time: u32,
    #[serde(with = "time")]
    pub end_time: u32,
    pub headway_secs: u32,
    #[serde(default)]
    pub exact_times: Option<u8>,
}

impl Frequency {
    pub fn key(&self) -> (TripID, u32) {
        (self.trip_id.clone(), self.start_time)
    }
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::Frequencies, reader, |frequency: Frequency, row| {
        let resolved = row.require("trip_id", &frequency.trip_id, &gtfs.trips);
        if row.keep(resolved, dangling) {
            row.insert_unique(
                duplicates,
                Rc::make_mut(&mut gtfs.frequencies),
                frequency.key(),
                frequency,
            );
        }
        Ok(())
    })
}
