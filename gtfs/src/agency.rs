use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{AgencyID, GTFSError, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    /// Feeds with only one agency may leave this out
    #[serde(default)]
    pub agency_id: Option<AgencyID>,
    pub agency_name: String,
    pub agency_url: String,
    pub agency_timezone: String,
    #[serde(default)]
    pub agency_lang: Option<String>,
    #[serde(default)]
    pub agency_phone: Option<String>,
    #[serde(default)]
    pub agency_fare_url: Option<String>,
    #[serde(default)]
    pub agency_email: Option<String>,
}

impl Agency {
    pub fn key(&self) -> AgencyID {
        self.agency_id.clone().unwrap_or_default()
    }
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::Agency, reader, |agency: Agency, row| {
        row.insert_unique(
            duplicates,
            Rc::make_mut(&mut gtfs.agencies),
            agency.key(),
            agency,
        );
        Ok(())
    })
}
