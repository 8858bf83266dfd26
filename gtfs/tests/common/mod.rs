#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use gtfs_feed::{FeedConfig, GTFS};

pub type Archive = ZipArchive<Cursor<Vec<u8>>>;

// Four trips on one route. T1 and T2 visit the same stops; T1 follows shape SH1 and T2 doesn't.
// T3 is a short-turn, T4 runs the other way. Rows are deliberately out of order.
pub const FEED_INFO: &str = "\
feed_id,feed_publisher_name,feed_publisher_url,feed_lang
test,Test Transit,http://example.com,en
";

pub const AGENCY: &str = "\
agency_id,agency_name,agency_url,agency_timezone
A,Test Transit,http://example.com,America/Los_Angeles
";

pub const CALENDAR: &str = "\
service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WK,1,1,1,1,1,0,0,20240101,20241231
";

pub const CALENDAR_DATES: &str = "\
service_id,date,exception_type
WK,20241225,2
";

pub const ROUTES: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type
R1,A,1,Crosstown,3
";

pub const SHAPES: &str = "\
shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence
SH1,41.0,-71.0,2
SH1,40.0,-70.0,1
";

pub const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
S1,First,0.0,0.0
S2,Second,1.0,10.0
S3,Third,2.0,20.0
";

pub const TRIPS: &str = "\
route_id,service_id,trip_id,shape_id
R1,WK,T1,SH1
R1,WK,T2,
R1,WK,T3,
R1,WK,T4,
";

pub const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,08:10:00,08:10:00,S2,20
T1,08:00:00,08:00:00,S1,10
T2,09:00:00,09:00:00,S1,1
T1,08:20:00,08:20:00,S3,30
T2,09:10:00,09:10:00,S2,2
T2,09:20:00,09:20:00,S3,3
T3,10:00:00,10:00:00,S1,5
T3,10:05:00,10:05:00,S2,7
T4,25:20:00,25:20:00,S1,3
T4,25:00:00,25:00:00,S3,1
T4,25:10:00,25:10:00,S2,2
";

pub const NUM_STOP_TIMES: usize = 11;

pub fn basic_files() -> Vec<(&'static str, String)> {
    vec![
        ("feed_info.txt", FEED_INFO.to_string()),
        ("agency.txt", AGENCY.to_string()),
        ("calendar.txt", CALENDAR.to_string()),
        ("calendar_dates.txt", CALENDAR_DATES.to_string()),
        ("routes.txt", ROUTES.to_string()),
        ("shapes.txt", SHAPES.to_string()),
        ("stops.txt", STOPS.to_string()),
        ("trips.txt", TRIPS.to_string()),
        ("stop_times.txt", STOP_TIMES.to_string()),
    ]
}

/// Replaces (or adds) one file
pub fn with_file(
    mut files: Vec<(&'static str, String)>,
    name: &'static str,
    contents: &str,
) -> Vec<(&'static str, String)> {
    files.retain(|(existing, _)| *existing != name);
    files.push((name, contents.to_string()));
    files
}

pub fn without_file(
    mut files: Vec<(&'static str, String)>,
    name: &str,
) -> Vec<(&'static str, String)> {
    files.retain(|(existing, _)| *existing != name);
    files
}

pub fn archive<S: AsRef<str>>(files: &[(&str, S)]) -> Archive {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(contents.as_ref().as_bytes()).unwrap();
    }
    ZipArchive::new(Cursor::new(zip.finish().unwrap().into_inner())).unwrap()
}

pub fn load(files: &[(&'static str, String)]) -> GTFS {
    load_with(files, FeedConfig::default())
}

pub fn load_with(files: &[(&'static str, String)], config: FeedConfig) -> GTFS {
    GTFS::load_from_zip(&mut archive(files), config).unwrap()
}
