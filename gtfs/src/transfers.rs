use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{GTFSError, StopID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_stop_id: StopID,
    pub to_stop_id: StopID,
    #[serde(default)]
    pub transfer_type: Option<u8>,
    #[serde(default)]
    pub min_transfer_time: Option<u32>,
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::Transfers, reader, |transfer: Transfer, row| {
        let mut resolved = row.require("from_stop_id", &transfer.from_stop_id, &gtfs.stops);
        resolved &= row.require("to_stop_id", &transfer.to_stop_id, &gtfs.stops);
        if row.keep(resolved, dangling) {
            let key = (transfer.from_stop_id.clone(), transfer.to_stop_id.clone());
            row.insert_unique(duplicates, Rc::make_mut(&mut gtfs.transfers), key, transfer);
        }
        Ok(())
    })
}
