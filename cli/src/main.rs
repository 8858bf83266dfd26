#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use gtfs_feed::{FeedConfig, TripID, GTFS};

#[derive(StructOpt)]
#[structopt(about = "Load a GTFS feed, report problems, and optionally mine patterns")]
struct Args {
    /// The path to a GTFS zip file
    feed: String,
    /// A JSON file overriding the default FeedConfig
    #[structopt(long)]
    config: Option<String>,
    /// Group trips by the stops they visit
    #[structopt(long)]
    patterns: bool,
    /// Print the GeoJSON path of this trip
    #[structopt(long)]
    geometry: Option<String>,
    /// Write the loaded feed back out to this zip file
    #[structopt(long)]
    write: Option<String>,
    /// Print every problem found while loading
    #[structopt(long)]
    errors: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::from_args();

    let config = match args.config {
        Some(ref path) => FeedConfig::from_json_path(path)?,
        None => FeedConfig::default(),
    };
    let mut gtfs = GTFS::load_from_path(&args.feed, config)?;

    println!("Feed {:?}", gtfs.feed_id);
    println!("  {} agencies", gtfs.agencies.len());
    println!("  {} routes", gtfs.routes.len());
    println!("  {} stops", gtfs.stops.len());
    println!("  {} trips", gtfs.trips.len());
    println!("  {} stop times", gtfs.stop_times().len()?);
    println!("  {} shapes", gtfs.shapes.len());
    println!("  {} services", gtfs.services.len());
    println!("  {} fares", gtfs.fares.len());
    println!("  {} problems", gtfs.errors.len());
    if args.errors {
        for error in &gtfs.errors {
            println!("    {error}");
        }
    }

    if args.patterns {
        gtfs.mine_patterns()?;
        for pattern in gtfs.patterns.values() {
            println!("{}: {}", pattern.pattern_id, pattern.name);
            for route_id in &pattern.routes {
                if let Some(route) = gtfs.routes.get(route_id) {
                    println!("  {}", route.describe());
                }
            }
        }
    }

    if let Some(trip_id) = args.geometry {
        let feature = gtfs.trip_geojson(&TripID::new(trip_id))?;
        println!("{}", serde_json::to_string_pretty(&feature)?);
    }

    if let Some(path) = args.write {
        gtfs.write_to_path(&path)?;
    }

    gtfs.close()?;
    info!("Done");
    Ok(())
}
