use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipWriter;

use crate::store::CompositeStore;
use crate::tables::{write_rows, write_table, Table};
use crate::GTFS;

impl GTFS {
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        self.write_to_zip(&mut zip)
            .with_context(|| format!("writing {}", path.display()))?;
        zip.finish()?.flush()?;
        info!("GTFS written to {}", path.display());
        Ok(())
    }

    /// Writes every non-empty table. The caller finishes the archive.
    pub fn write_to_zip<W: Write + Seek>(&self, zip: &mut ZipWriter<W>) -> Result<()> {
        write_rows(zip, Table::FeedInfo, self.feed_info.values())?;
        write_rows(zip, Table::Agency, self.agencies.values())?;
        write_rows(
            zip,
            Table::Calendar,
            self.services.values().filter_map(|s| s.calendar.as_ref()),
        )?;
        write_rows(
            zip,
            Table::CalendarDates,
            self.services.values().flat_map(|s| s.calendar_dates.values()),
        )?;
        write_rows(
            zip,
            Table::FareAttributes,
            self.fares.values().filter_map(|f| f.fare_attribute.as_ref()),
        )?;
        write_rows(
            zip,
            Table::FareRules,
            self.fares.values().flat_map(|f| f.fare_rules.iter()),
        )?;
        write_rows(zip, Table::Routes, self.routes.values())?;
        write_store(zip, Table::Shapes, &self.shape_points)?;
        write_rows(zip, Table::Stops, self.stops.values())?;
        write_rows(zip, Table::Transfers, self.transfers.values())?;
        write_rows(zip, Table::Trips, self.trips.values())?;
        write_rows(zip, Table::Frequencies, self.frequencies.values())?;
        write_store(zip, Table::StopTimes, &self.stop_times)?;
        Ok(())
    }
}

// Streams rows straight from disk, never holding the whole table
fn write_store<W, V>(zip: &mut ZipWriter<W>, table: Table, store: &CompositeStore<V>) -> Result<()>
where
    W: Write + Seek,
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    if store.is_empty()? {
        return Ok(());
    }
    write_table(zip, table, |writer| {
        let mut n = 0;
        store.for_each(|_, _, row| {
            writer.serialize(row)?;
            n += 1;
            Ok(())
        })?;
        Ok(n)
    })
}
