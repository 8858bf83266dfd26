use geo_types::{Coord, LineString};
use geojson::Feature;

use crate::{QueryError, TripID, GTFS};

impl GTFS {
    /// The path a trip travels, as (longitude, latitude). If the trip has a shape with points,
    /// that's used. Otherwise this is the straight lines between the trip's stops. The two are
    /// never mixed. A path with zero or one points is returned as-is.
    pub fn trip_geometry(&self, trip_id: &TripID) -> Result<LineString<f64>, QueryError> {
        Ok(self.trip_geometry_with_source(trip_id)?.0)
    }

    /// `trip_geometry` as a GeoJSON feature
    pub fn trip_geojson(&self, trip_id: &TripID) -> Result<Feature, QueryError> {
        let (line, source) = self.trip_geometry_with_source(trip_id)?;
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&line))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("trip_id", trip_id.as_str());
        feature.set_property("route_id", self.trips[trip_id].route_id.as_str());
        feature.set_property("source", source);
        Ok(feature)
    }

    fn trip_geometry_with_source(
        &self,
        trip_id: &TripID,
    ) -> Result<(LineString<f64>, &'static str), QueryError> {
        let Some(trip) = self.trips.get(trip_id) else {
            return Err(QueryError::UnknownTrip(trip_id.clone()));
        };

        if let Some(shape) = self.trip_shape(trip_id) {
            if !shape.is_empty() {
                let coords: Vec<Coord<f64>> = shape
                    .points()?
                    .into_iter()
                    .map(|pt| Coord {
                        x: pt.shape_pt_lon,
                        y: pt.shape_pt_lat,
                    })
                    .collect();
                return Ok((LineString::new(coords), "shape"));
            }
        }

        let mut coords = Vec::new();
        for stop_time in self.ordered_stop_times(&trip.trip_id)? {
            let Some(stop) = self.stops.get(&stop_time.stop_id) else {
                return Err(QueryError::UnknownStop(stop_time.stop_id));
            };
            coords.push(Coord {
                x: stop.stop_lon,
                y: stop.stop_lat,
            });
        }
        Ok((LineString::new(coords), "stops"))
    }
}
