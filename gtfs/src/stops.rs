use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{GTFSError, StopID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: StopID,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub stop_desc: Option<String>,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub stop_url: Option<String>,
    #[serde(default)]
    pub location_type: Option<u8>,
    // Can point forwards in the same file, so it isn't checked while loading
    #[serde(default)]
    pub parent_station: Option<StopID>,
    #[serde(default)]
    pub wheelchair_boarding: Option<u8>,
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::Stops, reader, |stop: Stop, row| {
        row.insert_unique(
            duplicates,
            Rc::make_mut(&mut gtfs.stops),
            stop.stop_id.clone(),
            stop,
        );
        Ok(())
    })
}
