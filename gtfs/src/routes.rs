use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{AgencyID, GTFSError, RouteID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteID,
    #[serde(default)]
    pub agency_id: Option<AgencyID>,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
    #[serde(default)]
    pub route_desc: Option<String>,
    /// Kept numeric, since feeds use the extended route types too
    pub route_type: u16,
    #[serde(default)]
    pub route_url: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[serde(default)]
    pub route_text_color: Option<String>,
}

impl Route {
    pub fn describe(&self) -> String {
        let name = self
            .route_short_name
            .as_ref()
            .or(self.route_long_name.as_ref())
            .or(self.route_desc.as_ref())
            .map(|x| x.to_string())
            .unwrap_or_else(|| self.route_id.to_string());
        format!("{name} (route_type {})", self.route_type)
    }
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::Routes, reader, |route: Route, row| {
        let mut resolved = true;
        if let Some(ref agency_id) = route.agency_id {
            resolved &= row.require("agency_id", agency_id, &gtfs.agencies);
        }
        if row.keep(resolved, dangling) {
            row.insert_unique(
                duplicates,
                Rc::make_mut(&mut gtfs.routes),
                route.route_id.clone(),
                route,
            );
        }
        Ok(())
    })
}
