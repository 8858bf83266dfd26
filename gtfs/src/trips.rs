use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{GTFSError, RouteID, ServiceID, ShapeID, TripID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub route_id: RouteID,
    pub service_id: ServiceID,
    pub trip_id: TripID,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub trip_short_name: Option<String>,
    /// 0 and 1 are arbitrary, but consistent within a route
    #[serde(default)]
    pub direction_id: Option<u8>,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub shape_id: Option<ShapeID>,
    #[serde(default)]
    pub wheelchair_accessible: Option<u8>,
    #[serde(default)]
    pub bikes_allowed: Option<u8>,
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::Trips, reader, |trip: Trip, row| {
        let mut resolved = row.require("route_id", &trip.route_id, &gtfs.routes);
        resolved &= row.require("service_id", &trip.service_id, &gtfs.services);
        if let Some(ref shape_id) = trip.shape_id {
            resolved &= row.require("shape_id", shape_id, &gtfs.shapes);
        }
        if row.keep(resolved, dangling) {
            row.insert_unique(
                duplicates,
                Rc::make_mut(&mut gtfs.trips),
                trip.trip_id.clone(),
                trip,
            );
        }
        Ok(())
    })
}
