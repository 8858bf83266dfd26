use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::optional_date;
use crate::tables::{read_rows, Table};
use crate::{GTFSError, GTFS};

/// Used as the key when a feed_info row has no feed_id
pub const NO_FEED_ID: &str = "NONE";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedInfo {
    #[serde(default)]
    pub feed_id: Option<String>,
    pub feed_publisher_name: String,
    pub feed_publisher_url: String,
    pub feed_lang: String,
    #[serde(default, with = "optional_date")]
    pub feed_start_date: Option<NaiveDate>,
    #[serde(default, with = "optional_date")]
    pub feed_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub feed_version: Option<String>,
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::FeedInfo, reader, |info: FeedInfo, row| {
        if gtfs.feed_id.is_none() {
            gtfs.feed_id = info.feed_id.clone();
        }
        let key = info
            .feed_id
            .clone()
            .unwrap_or_else(|| NO_FEED_ID.to_string());
        row.insert_unique(duplicates, Rc::make_mut(&mut gtfs.feed_info), key, info);
        Ok(())
    })
}
