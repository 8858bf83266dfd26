use std::io::Read;
use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::CompositeStore;
use crate::tables::{read_rows, Table};
use crate::{DuplicatePolicy, ErrorKind, GTFSError, ShapeID, GTFS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapePoint {
    pub shape_id: ShapeID,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
    #[serde(default)]
    pub shape_dist_traveled: Option<f64>,
}

/// The points of one shape, read from the disk-backed table on demand
pub struct ShapeView<'a> {
    shape_id: &'a ShapeID,
    num_points: usize,
    store: &'a CompositeStore<ShapePoint>,
}

impl<'a> ShapeView<'a> {
    pub(crate) fn new(
        shape_id: &'a ShapeID,
        num_points: usize,
        store: &'a CompositeStore<ShapePoint>,
    ) -> Self {
        Self {
            shape_id,
            num_points,
            store,
        }
    }

    pub fn shape_id(&self) -> &ShapeID {
        self.shape_id
    }

    pub fn len(&self) -> usize {
        self.num_points
    }

    pub fn is_empty(&self) -> bool {
        self.num_points == 0
    }

    /// Sorted by shape_pt_sequence
    pub fn points(&self) -> Result<Vec<ShapePoint>> {
        self.store.range_scan(self.shape_id.as_str(), ..)
    }

    pub fn point(&self, sequence: u32) -> Result<Option<ShapePoint>> {
        self.store.get(self.shape_id.as_str(), i64::from(sequence))
    }
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::Shapes, reader, |pt: ShapePoint, row| {
        let seq = i64::from(pt.shape_pt_sequence);
        if gtfs.shape_points.contains(pt.shape_id.as_str(), seq)? {
            row.report(ErrorKind::DuplicateKey(format!(
                "({:?}, {})",
                pt.shape_id, pt.shape_pt_sequence
            )));
            if duplicates == DuplicatePolicy::FirstWins {
                return Ok(());
            }
        } else {
            *Rc::make_mut(&mut gtfs.shapes)
                .entry(pt.shape_id.clone())
                .or_insert(0) += 1;
        }
        gtfs.shape_points.put(pt.shape_id.as_str(), seq, &pt)
    })
}
