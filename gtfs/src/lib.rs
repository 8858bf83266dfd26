#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod agency;
mod calendar;
mod config;
mod error;
mod export;
mod fares;
mod feed_info;
mod frequencies;
mod geometry;
mod ids;
mod load;
mod patterns;
mod routes;
pub mod serde_helpers;
mod shapes;
mod stop_times;
mod stops;
pub mod store;
mod tables;
mod transfers;
mod trips;

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;

pub use agency::Agency;
pub use calendar::{Calendar, CalendarDate, DaysOfWeek, Exception, Service};
pub use config::{DanglingPolicy, DuplicatePolicy, FeedConfig, StoreConfig};
pub use error::{ErrorKind, GTFSError, QueryError};
pub use fares::{Fare, FareAttribute, FareRule};
pub use feed_info::{FeedInfo, NO_FEED_ID};
pub use frequencies::Frequency;
pub use ids::{AgencyID, FareID, PatternID, RouteID, ServiceID, ShapeID, StopID, TripID};
pub use patterns::Pattern;
pub use routes::Route;
pub use shapes::{ShapePoint, ShapeView};
pub use stop_times::StopTime;
pub use stops::Stop;
pub use tables::Table;
pub use transfers::Transfer;
pub use trips::Trip;

use store::CompositeStore;

/// One feed. Everything in it belongs to a single namespace.
///
/// The small tables are plain maps behind an `Rc`. They're only mutated through
/// `Rc::make_mut`, so a feed made by `share` never sees the other's changes. Stop times and
/// shape points are too big for memory and live in disk-backed stores instead.
///
/// Single-threaded; this isn't `Send`.
pub struct GTFS {
    pub feed_id: Option<String>,
    pub config: FeedConfig,

    pub agencies: Rc<BTreeMap<AgencyID, Agency>>,
    /// Keyed by feed_id, or `NO_FEED_ID`
    pub feed_info: Rc<BTreeMap<String, FeedInfo>>,
    pub frequencies: Rc<BTreeMap<(TripID, u32), Frequency>>,
    pub routes: Rc<BTreeMap<RouteID, Route>>,
    pub stops: Rc<BTreeMap<StopID, Stop>>,
    pub transfers: Rc<BTreeMap<(StopID, StopID), Transfer>>,
    pub trips: Rc<BTreeMap<TripID, Trip>>,
    /// Every shape with points, and how many. Use `shape` to get the points.
    pub shapes: Rc<BTreeMap<ShapeID, usize>>,
    pub services: Rc<BTreeMap<ServiceID, Service>>,
    pub fares: Rc<BTreeMap<FareID, Fare>>,

    /// Filled out by `mine_patterns`
    pub patterns: BTreeMap<PatternID, Pattern>,
    pub trip_patterns: BTreeMap<TripID, PatternID>,

    /// Everything wrong with the input, in the order tables were loaded, then by row
    pub errors: Vec<GTFSError>,

    stop_times: CompositeStore<StopTime>,
    shape_points: CompositeStore<ShapePoint>,
}

impl GTFS {
    /// A feed with no data, backed by fresh scratch stores
    pub fn empty(config: FeedConfig) -> Result<Self> {
        let stop_times = CompositeStore::create("stop_times", &config.store)?;
        let shape_points = CompositeStore::create("shapes", &config.store)?;
        Ok(Self {
            feed_id: None,
            config,

            agencies: Rc::new(BTreeMap::new()),
            feed_info: Rc::new(BTreeMap::new()),
            frequencies: Rc::new(BTreeMap::new()),
            routes: Rc::new(BTreeMap::new()),
            stops: Rc::new(BTreeMap::new()),
            transfers: Rc::new(BTreeMap::new()),
            trips: Rc::new(BTreeMap::new()),
            shapes: Rc::new(BTreeMap::new()),
            services: Rc::new(BTreeMap::new()),
            fares: Rc::new(BTreeMap::new()),

            patterns: BTreeMap::new(),
            trip_patterns: BTreeMap::new(),

            errors: Vec::new(),

            stop_times,
            shape_points,
        })
    }

    /// Returns the service, creating an empty one the first time an ID is seen.
    pub fn get_or_create_service(&mut self, service_id: &ServiceID) -> &mut Service {
        Rc::make_mut(&mut self.services)
            .entry(service_id.clone())
            .or_insert_with(|| Service::new(service_id.clone()))
    }

    /// Returns the fare, creating an empty one the first time an ID is seen.
    pub fn get_or_create_fare(&mut self, fare_id: &FareID) -> &mut Fare {
        Rc::make_mut(&mut self.fares)
            .entry(fare_id.clone())
            .or_insert_with(|| Fare::new(fare_id.clone()))
    }

    pub fn stop_times(&self) -> &CompositeStore<StopTime> {
        &self.stop_times
    }

    pub fn shape_points(&self) -> &CompositeStore<ShapePoint> {
        &self.shape_points
    }

    /// Sorted by stop_sequence. This is one seek into the stop times store, not a scan.
    pub fn ordered_stop_times(&self, trip_id: &TripID) -> Result<Vec<StopTime>, QueryError> {
        if !self.trips.contains_key(trip_id) {
            return Err(QueryError::UnknownTrip(trip_id.clone()));
        }
        Ok(self.stop_times.range_scan(trip_id.as_str(), ..)?)
    }

    pub fn ordered_stop_list(&self, trip_id: &TripID) -> Result<Vec<StopID>, QueryError> {
        Ok(self
            .ordered_stop_times(trip_id)?
            .into_iter()
            .map(|st| st.stop_id)
            .collect())
    }

    pub fn shape(&self, shape_id: &ShapeID) -> Option<ShapeView> {
        let (shape_id, num_points) = self.shapes.get_key_value(shape_id)?;
        Some(ShapeView::new(shape_id, *num_points, &self.shape_points))
    }

    /// The shape a trip follows, if it has one with points
    pub fn trip_shape(&self, trip_id: &TripID) -> Option<ShapeView> {
        self.shape(self.trips.get(trip_id)?.shape_id.as_ref()?)
    }

    /// Makes another feed from this one. Tables listed in `copy` are deep-copied; everything
    /// else is shared.
    ///
    /// Shared in-memory tables are copy-on-write, so changes in one feed never show up in the
    /// other. Shared stop times and shapes really are the same disk store, though: closing
    /// either feed closes them for both. Copy those tables to get an independent store.
    pub fn share(&self, copy: &[Table]) -> Result<GTFS> {
        fn pick<T: Clone>(table: &Rc<T>, deep: bool) -> Rc<T> {
            if deep {
                Rc::new(T::clone(table))
            } else {
                table.clone()
            }
        }
        let deep = |tables: &[Table]| tables.iter().any(|t| copy.contains(t));

        let stop_times = if deep(&[Table::StopTimes]) {
            copy_store(&self.stop_times, &self.config.store)?
        } else {
            self.stop_times.clone()
        };
        let shape_points = if deep(&[Table::Shapes]) {
            copy_store(&self.shape_points, &self.config.store)?
        } else {
            self.shape_points.clone()
        };

        Ok(GTFS {
            feed_id: self.feed_id.clone(),
            config: self.config.clone(),

            agencies: pick(&self.agencies, deep(&[Table::Agency])),
            feed_info: pick(&self.feed_info, deep(&[Table::FeedInfo])),
            frequencies: pick(&self.frequencies, deep(&[Table::Frequencies])),
            routes: pick(&self.routes, deep(&[Table::Routes])),
            stops: pick(&self.stops, deep(&[Table::Stops])),
            transfers: pick(&self.transfers, deep(&[Table::Transfers])),
            trips: pick(&self.trips, deep(&[Table::Trips])),
            shapes: pick(&self.shapes, deep(&[Table::Shapes])),
            services: pick(&self.services, deep(&[Table::Calendar, Table::CalendarDates])),
            fares: pick(&self.fares, deep(&[Table::FareAttributes, Table::FareRules])),

            patterns: self.patterns.clone(),
            trip_patterns: self.trip_patterns.clone(),
            errors: self.errors.clone(),

            stop_times,
            shape_points,
        })
    }

    /// Releases the disk stores. Afterwards stop times and shapes can't be queried. Safe to call
    /// more than once.
    pub fn close(&self) -> Result<()> {
        self.stop_times.close()?;
        self.shape_points.close()
    }

    pub fn is_closed(&self) -> bool {
        self.stop_times.is_closed() && self.shape_points.is_closed()
    }
}

fn copy_store<V>(from: &CompositeStore<V>, config: &StoreConfig) -> Result<CompositeStore<V>>
where
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    let to = CompositeStore::create(from.name(), config)?;
    from.for_each(|primary, secondary, value| to.put(primary, secondary, &value))?;
    to.commit()?;
    Ok(to)
}
