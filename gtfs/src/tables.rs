use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::{DanglingPolicy, DuplicatePolicy, ErrorKind, GTFSError};

/// One file in a GTFS archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Table {
    FeedInfo,
    Agency,
    Calendar,
    CalendarDates,
    FareAttributes,
    FareRules,
    Routes,
    Shapes,
    Stops,
    Transfers,
    Trips,
    Frequencies,
    StopTimes,
}

impl Table {
    /// References are checked while rows stream in, so every table has to come after the tables
    /// it references. feed_info goes first to learn the feed ID. stop_times is last: it can be
    /// checked against everything else, and it's the one table too big to buffer.
    pub const LOAD_ORDER: [Table; 13] = [
        Table::FeedInfo,
        Table::Agency,
        Table::Calendar,
        Table::CalendarDates,
        Table::FareAttributes,
        Table::FareRules,
        Table::Routes,
        Table::Shapes,
        Table::Stops,
        Table::Transfers,
        Table::Trips,
        Table::Frequencies,
        Table::StopTimes,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Table::FeedInfo => "feed_info.txt",
            Table::Agency => "agency.txt",
            Table::Calendar => "calendar.txt",
            Table::CalendarDates => "calendar_dates.txt",
            Table::FareAttributes => "fare_attributes.txt",
            Table::FareRules => "fare_rules.txt",
            Table::Routes => "routes.txt",
            Table::Shapes => "shapes.txt",
            Table::Stops => "stops.txt",
            Table::Transfers => "transfers.txt",
            Table::Trips => "trips.txt",
            Table::Frequencies => "frequencies.txt",
            Table::StopTimes => "stop_times.txt",
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            Table::Agency | Table::Routes | Table::Stops | Table::Trips | Table::StopTimes
        )
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Tables may sit at the root of the archive or inside one directory.
pub(crate) fn find_entry<R: Read + Seek>(archive: &ZipArchive<R>, table: Table) -> Option<String> {
    let name = table.file_name();
    let suffix = format!("/{name}");
    archive
        .file_names()
        .filter(|path| *path == name || path.ends_with(&suffix))
        .min_by_key(|path| path.len())
        .map(|path| path.to_string())
}

/// Where a row came from, and the place to report its problems
pub(crate) struct RowContext<'a> {
    table: Table,
    line: Option<u64>,
    errors: &'a mut Vec<GTFSError>,
}

impl RowContext<'_> {
    pub fn report(&mut self, kind: ErrorKind) {
        self.errors.push(GTFSError::new(self.table, self.line, kind));
    }

    /// Records an error if `id` isn't a key of `map`.
    pub fn require<K: Ord + std::fmt::Display, V>(
        &mut self,
        field: &'static str,
        id: &K,
        map: &BTreeMap<K, V>,
    ) -> bool {
        if map.contains_key(id) {
            return true;
        }
        self.report(ErrorKind::ReferentialIntegrity {
            field,
            id: id.to_string(),
        });
        false
    }

    pub fn keep(&self, resolved: bool, policy: DanglingPolicy) -> bool {
        resolved || policy == DanglingPolicy::Retain
    }

    /// Inserts a row into a unique-key table, following the duplicate policy.
    pub fn insert_unique<K: Ord + std::fmt::Debug, V>(
        &mut self,
        policy: DuplicatePolicy,
        map: &mut BTreeMap<K, V>,
        key: K,
        value: V,
    ) {
        if map.contains_key(&key) {
            self.report(ErrorKind::DuplicateKey(format!("{key:?}")));
            if policy == DuplicatePolicy::FirstWins {
                return;
            }
        }
        map.insert(key, value);
    }
}

/// Streams rows out of one table. Rows that can't be parsed become errors; only failing to
/// read the underlying file is fatal. `handle` returns an error only for fatal problems too.
pub(crate) fn read_rows<T, R, F>(table: Table, reader: R, mut handle: F) -> Result<Vec<GTFSError>>
where
    T: DeserializeOwned,
    R: Read,
    F: FnMut(T, &mut RowContext<'_>) -> Result<()>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| anyhow!("{table}: {err}"))?
        .clone();

    let mut errors = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut rows = 0;
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                if let csv::ErrorKind::Io(_) = err.kind() {
                    bail!("{table}: {err}");
                }
                let line = err.position().map(|pos| pos.line());
                errors.push(GTFSError::new(table, line, ErrorKind::Parse(err.to_string())));
                continue;
            }
        }
        rows += 1;
        let line = record.position().map(|pos| pos.line());
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => {
                let mut ctx = RowContext {
                    table,
                    line,
                    errors: &mut errors,
                };
                handle(row, &mut ctx)?;
            }
            Err(err) => {
                errors.push(GTFSError::new(table, line, ErrorKind::Parse(err.to_string())));
            }
        }
    }
    info!("Read {rows} rows from {table}, with {} problems", errors.len());
    Ok(errors)
}

/// Writes one table as a CSV file in the archive. `fill` serializes the rows and returns how
/// many it wrote.
pub(crate) fn write_table<W, F>(zip: &mut ZipWriter<W>, table: Table, fill: F) -> Result<()>
where
    W: Write + Seek,
    F: FnOnce(&mut csv::Writer<&mut ZipWriter<W>>) -> Result<usize>,
{
    zip.start_file(table.file_name(), FileOptions::default())
        .map_err(|err| anyhow!("{table}: {err}"))?;
    let mut writer = csv::Writer::from_writer(&mut *zip);
    let rows = fill(&mut writer)?;
    writer.flush()?;
    debug!("Wrote {rows} rows to {table}");
    Ok(())
}

/// Serializes every row from an in-memory table.
pub(crate) fn write_rows<'a, T, W, I>(zip: &mut ZipWriter<W>, table: Table, rows: I) -> Result<()>
where
    T: Serialize + 'a,
    W: Write + Seek,
    I: IntoIterator<Item = &'a T>,
{
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        return Ok(());
    }
    write_table(zip, table, |writer| {
        let mut n = 0;
        for row in rows {
            writer.serialize(row)?;
            n += 1;
        }
        Ok(n)
    })
}
