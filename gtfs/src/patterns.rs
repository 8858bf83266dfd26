use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{PatternID, RouteID, StopID, TripID, GTFS};

/// All the trips visiting exactly the same stops in the same order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_id: PatternID,
    pub stops: Vec<StopID>,
    /// In the order they were found, which is sorted by trip ID
    pub trips: Vec<TripID>,
    pub routes: BTreeSet<RouteID>,
    pub name: String,
}

impl GTFS {
    /// Bins all trips by the sequence of stops they visit, filling out `patterns` and
    /// `trip_patterns`. Pattern IDs are assigned in order of first appearance, so they're stable
    /// for the same feed. Returns a map from each stop sequence to its trips.
    pub fn mine_patterns(&mut self) -> Result<BTreeMap<Vec<StopID>, Vec<TripID>>> {
        let mut trips_per_pattern: BTreeMap<Vec<StopID>, Vec<TripID>> = BTreeMap::new();
        let mut first_seen: Vec<Vec<StopID>> = Vec::new();
        for (n, trip_id) in self.trips.keys().enumerate() {
            if (n + 1) % 100_000 == 0 {
                info!("Finding patterns, trip {}", n + 1);
            }
            let stops = self.ordered_stop_list(trip_id)?;
            let trips = trips_per_pattern.entry(stops).or_insert_with_key(|stops| {
                first_seen.push(stops.clone());
                Vec::new()
            });
            trips.push(trip_id.clone());
        }
        info!("Total patterns: {}", trips_per_pattern.len());

        self.patterns.clear();
        self.trip_patterns.clear();
        for (idx, stops) in first_seen.into_iter().enumerate() {
            let pattern_id = PatternID(idx);
            let trips = trips_per_pattern[&stops].clone();
            let routes: BTreeSet<RouteID> = trips
                .iter()
                .filter_map(|trip_id| self.trips.get(trip_id))
                .map(|trip| trip.route_id.clone())
                .collect();
            for trip_id in &trips {
                self.trip_patterns.insert(trip_id.clone(), pattern_id);
            }
            let name = self.describe_pattern(&stops, trips.len());
            self.patterns.insert(
                pattern_id,
                Pattern {
                    pattern_id,
                    stops,
                    trips,
                    routes,
                    name,
                },
            );
        }

        Ok(trips_per_pattern)
    }

    fn describe_pattern(&self, stops: &[StopID], num_trips: usize) -> String {
        let stop_name = |id: &StopID| {
            self.stops
                .get(id)
                .and_then(|stop| stop.stop_name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        match (stops.first(), stops.last()) {
            (Some(first), Some(last)) => format!(
                "{} stops from {} to {} ({num_trips} trips)",
                stops.len(),
                stop_name(first),
                stop_name(last)
            ),
            _ => format!("no stops ({num_trips} trips)"),
        }
    }
}
