use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipArchive;

use crate::tables::{find_entry, Table};
use crate::{
    agency, calendar, fares, feed_info, frequencies, routes, shapes, stop_times, stops,
    transfers, trips, ErrorKind, FeedConfig, GTFSError, GTFS,
};

impl GTFS {
    pub fn load_from_path<P: AsRef<Path>>(path: P, config: FeedConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .with_context(|| format!("reading {} as a zip archive", path.display()))?;
        Self::load_from_zip(&mut archive, config)
    }

    /// Loads every table in `Table::LOAD_ORDER`. Problems with individual rows are collected in
    /// `errors`; only an unreadable archive or a failing scratch store aborts the load.
    pub fn load_from_zip<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        config: FeedConfig,
    ) -> Result<Self> {
        let mut gtfs = Self::empty(config)?;
        for table in Table::LOAD_ORDER {
            gtfs.load_table(archive, table)?;

            if table == Table::FeedInfo {
                match gtfs.feed_id {
                    Some(ref id) => info!("Feed ID is {id:?}"),
                    None => {
                        warn!("Feed ID is undefined");
                        gtfs.errors.push(GTFSError::new(
                            Table::FeedInfo,
                            None,
                            ErrorKind::MissingFeedId,
                        ));
                    }
                }
            }
        }

        info!("{} errors", gtfs.errors.len());
        for error in &gtfs.errors {
            debug!("{error}");
        }
        Ok(gtfs)
    }

    /// Loads one table into this feed. References are checked against whatever is already
    /// loaded, so loading out of `Table::LOAD_ORDER` reports every forward reference as an
    /// error.
    pub fn load_table<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        table: Table,
    ) -> Result<()> {
        let Some(path) = find_entry(archive, table) else {
            if table.required() {
                error!("{table} is missing");
                self.errors
                    .push(GTFSError::new(table, None, ErrorKind::MissingTable));
            } else {
                debug!("No {table}");
            }
            return Ok(());
        };
        let file = archive
            .by_name(&path)
            .map_err(|err| anyhow!("{path}: {err}"))?;

        let errors = match table {
            Table::FeedInfo => feed_info::load(self, file)?,
            Table::Agency => agency::load(self, file)?,
            Table::Calendar => calendar::load(self, file)?,
            Table::CalendarDates => calendar::load_dates(self, file)?,
            Table::FareAttributes => fares::load_attributes(self, file)?,
            Table::FareRules => fares::load_rules(self, file)?,
            Table::Routes => routes::load(self, file)?,
            Table::Shapes => shapes::load(self, file)?,
            Table::Stops => stops::load(self, file)?,
            Table::Transfers => transfers::load(self, file)?,
            Table::Trips => trips::load(self, file)?,
            Table::Frequencies => frequencies::load(self, file)?,
            Table::StopTimes => stop_times::load(self, file)?,
        };
        self.errors.extend(errors);

        match table {
            Table::StopTimes => self.stop_times.commit(),
            Table::Shapes => self.shape_points.commit(),
            _ => Ok(()),
        }
    }
}
