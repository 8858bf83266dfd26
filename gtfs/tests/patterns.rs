mod common;

use geo_types::Coord;

use gtfs_feed::{DanglingPolicy, FeedConfig, PatternID, QueryError, StopID, TripID};

use common::*;

fn stops(ids: &[&str]) -> Vec<StopID> {
    ids.iter().map(|id| StopID::new(*id)).collect()
}

fn trips(ids: &[&str]) -> Vec<TripID> {
    ids.iter().map(|id| TripID::new(*id)).collect()
}

#[test]
fn trips_group_by_stop_sequence() {
    let mut gtfs = load(&basic_files());
    let found = gtfs.mine_patterns().unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(found[&stops(&["S1", "S2", "S3"])], trips(&["T1", "T2"]));
    assert_eq!(found[&stops(&["S1", "S2"])], trips(&["T3"]));
    assert_eq!(found[&stops(&["S3", "S2", "S1"])], trips(&["T4"]));

    let total: usize = found.values().map(|trips| trips.len()).sum();
    assert_eq!(total, gtfs.trips.len());
}

#[test]
fn one_different_stop_splits_a_pattern() {
    let files = with_file(
        with_file(basic_files(), "trips.txt", &format!("{TRIPS}R1,WK,T5,\n")),
        "stop_times.txt",
        &format!(
            "{STOP_TIMES}\
            T5,11:00:00,11:00:00,S1,1\n\
            T5,11:10:00,11:10:00,S3,2\n\
            T5,11:20:00,11:20:00,S3,3\n"
        ),
    );
    let mut gtfs = load(&files);
    assert_eq!(gtfs.errors, Vec::new());
    let found = gtfs.mine_patterns().unwrap();

    assert_eq!(found.len(), 4);
    assert_eq!(found[&stops(&["S1", "S2", "S3"])], trips(&["T1", "T2"]));
    assert_eq!(found[&stops(&["S1", "S3", "S3"])], trips(&["T5"]));
    assert_ne!(
        gtfs.trip_patterns[&TripID::new("T1")],
        gtfs.trip_patterns[&TripID::new("T5")]
    );
}

#[test]
fn every_trip_gets_one_pattern() {
    let mut gtfs = load(&basic_files());
    gtfs.mine_patterns().unwrap();

    assert_eq!(gtfs.patterns.len(), 3);
    assert_eq!(gtfs.trip_patterns.len(), 4);
    for (pattern_id, pattern) in &gtfs.patterns {
        assert_eq!(*pattern_id, pattern.pattern_id);
        for trip_id in &pattern.trips {
            assert_eq!(gtfs.trip_patterns[trip_id], *pattern_id);
            assert_eq!(gtfs.ordered_stop_list(trip_id).unwrap(), pattern.stops);
        }
    }

    // Numbered by the first trip found with each sequence
    assert_eq!(gtfs.trip_patterns[&TripID::new("T1")], PatternID(0));
    assert_eq!(gtfs.trip_patterns[&TripID::new("T2")], PatternID(0));
    assert_eq!(gtfs.trip_patterns[&TripID::new("T3")], PatternID(1));
    assert_eq!(gtfs.trip_patterns[&TripID::new("T4")], PatternID(2));

    let pattern = &gtfs.patterns[&PatternID(0)];
    assert_eq!(pattern.name, "3 stops from First to Third (2 trips)");
    assert_eq!(pattern.routes.len(), 1);
}

#[test]
fn mining_twice_gives_the_same_answer() {
    let mut gtfs = load(&basic_files());
    let first = gtfs.mine_patterns().unwrap();
    let patterns = gtfs.patterns.clone();
    let second = gtfs.mine_patterns().unwrap();
    assert_eq!(first, second);
    assert_eq!(patterns, gtfs.patterns);
    assert_eq!(gtfs.trip_patterns.len(), 4);
}

#[test]
fn trip_without_stop_times_has_empty_pattern() {
    let files = with_file(basic_files(), "trips.txt", &format!("{TRIPS}R1,WK,T5,\n"));
    let mut gtfs = load(&files);
    let found = gtfs.mine_patterns().unwrap();
    assert_eq!(found[&stops(&[])], trips(&["T5"]));
    let pattern = &gtfs.patterns[&gtfs.trip_patterns[&TripID::new("T5")]];
    assert!(pattern.stops.is_empty());
    assert_eq!(pattern.name, "no stops (1 trips)");
}

#[test]
fn geometry_prefers_the_shape() {
    let gtfs = load(&basic_files());
    let line = gtfs.trip_geometry(&TripID::new("T1")).unwrap();
    assert_eq!(
        line.0,
        vec![Coord { x: -70.0, y: 40.0 }, Coord { x: -71.0, y: 41.0 }]
    );
}

#[test]
fn geometry_falls_back_to_stops() {
    let gtfs = load(&basic_files());
    let line = gtfs.trip_geometry(&TripID::new("T3")).unwrap();
    assert_eq!(
        line.0,
        vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 1.0 }]
    );

    let line = gtfs.trip_geometry(&TripID::new("T4")).unwrap();
    assert_eq!(line.0.len(), 3);
    assert_eq!(line.0[0], Coord { x: 20.0, y: 2.0 });
}

#[test]
fn degenerate_paths_are_returned_as_is() {
    let files = with_file(
        with_file(
            basic_files(),
            "trips.txt",
            &format!("{TRIPS}R1,WK,T5,\nR1,WK,T6,\n"),
        ),
        "stop_times.txt",
        &format!("{STOP_TIMES}T5,12:00:00,12:00:00,S2,1\n"),
    );
    let gtfs = load(&files);
    assert_eq!(
        gtfs.trip_geometry(&TripID::new("T5")).unwrap().0,
        vec![Coord { x: 10.0, y: 1.0 }]
    );
    assert!(gtfs.trip_geometry(&TripID::new("T6")).unwrap().0.is_empty());
}

#[test]
fn geometry_of_unknown_trip() {
    let gtfs = load(&basic_files());
    assert!(matches!(
        gtfs.trip_geometry(&TripID::new("T99")),
        Err(QueryError::UnknownTrip(_))
    ));
}

#[test]
fn retained_rows_surface_at_query_time() {
    let config = FeedConfig {
        dangling: DanglingPolicy::Retain,
        ..Default::default()
    };
    let files = with_file(
        with_file(
            basic_files(),
            "trips.txt",
            &format!("{TRIPS}R1,WK,T5,NOSHAPE\n"),
        ),
        "stop_times.txt",
        &format!("{STOP_TIMES}T5,12:00:00,12:00:00,S1,1\nT5,12:05:00,12:05:00,S9,2\n"),
    );
    let gtfs = load_with(&files, config);
    assert_eq!(gtfs.errors.len(), 2);

    // The shape has no points, so the stops are used, and one of them doesn't exist
    assert!(gtfs.trip_shape(&TripID::new("T5")).is_none());
    match gtfs.trip_geometry(&TripID::new("T5")) {
        Err(QueryError::UnknownStop(stop_id)) => assert_eq!(stop_id, StopID::new("S9")),
        other => panic!("expected an unknown stop, got {other:?}"),
    }
}

#[test]
fn geojson_says_where_the_path_came_from() {
    let gtfs = load(&basic_files());
    let feature = gtfs.trip_geojson(&TripID::new("T1")).unwrap();
    let properties = feature.properties.as_ref().unwrap();
    assert_eq!(properties["trip_id"], "T1");
    assert_eq!(properties["route_id"], "R1");
    assert_eq!(properties["source"], "shape");
    match feature.geometry.unwrap().value {
        geojson::Value::LineString(coords) => {
            assert_eq!(coords, vec![vec![-70.0, 40.0], vec![-71.0, 41.0]])
        }
        other => panic!("unexpected geometry {other:?}"),
    }

    let feature = gtfs.trip_geojson(&TripID::new("T2")).unwrap();
    assert_eq!(feature.properties.unwrap()["source"], "stops");
}
