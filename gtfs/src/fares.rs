use std::io::Read;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::tables::{read_rows, Table};
use crate::{AgencyID, DuplicatePolicy, ErrorKind, FareID, GTFSError, RouteID, GTFS};

/// A fare_attribute and all of the fare_rules referencing it, in either order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub fare_id: FareID,
    pub fare_attribute: Option<FareAttribute>,
    pub fare_rules: Vec<FareRule>,
}

impl Fare {
    pub fn new(fare_id: FareID) -> Self {
        Self {
            fare_id,
            fare_attribute: None,
            fare_rules: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareAttribute {
    pub fare_id: FareID,
    pub price: f64,
    pub currency_type: String,
    pub payment_method: u8,
    /// Empty means unlimited transfers
    #[serde(default)]
    pub transfers: Option<u8>,
    #[serde(default)]
    pub agency_id: Option<AgencyID>,
    #[serde(default)]
    pub transfer_duration: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareRule {
    pub fare_id: FareID,
    // routes.txt hasn't been loaded yet, so this can't be checked here
    #[serde(default)]
    pub route_id: Option<RouteID>,
    #[serde(default)]
    pub origin_id: Option<String>,
    #[serde(default)]
    pub destination_id: Option<String>,
    #[serde(default)]
    pub contains_id: Option<String>,
}

pub(crate) fn load_attributes<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    let dangling = gtfs.config.dangling;
    read_rows(Table::FareAttributes, reader, |attribute: FareAttribute, row| {
        let mut resolved = true;
        if let Some(ref agency_id) = attribute.agency_id {
            resolved &= row.require("agency_id", agency_id, &gtfs.agencies);
        }
        if !row.keep(resolved, dangling) {
            return Ok(());
        }
        let fare = gtfs.get_or_create_fare(&attribute.fare_id);
        if fare.fare_attribute.is_some() {
            row.report(ErrorKind::DuplicateKey(format!("{:?}", attribute.fare_id)));
            if duplicates == DuplicatePolicy::FirstWins {
                return Ok(());
            }
        }
        fare.fare_attribute = Some(attribute);
        Ok(())
    })
}

pub(crate) fn load_rules<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    read_rows(Table::FareRules, reader, |rule: FareRule, _| {
        gtfs.get_or_create_fare(&rule.fare_id).fare_rules.push(rule);
        Ok(())
    })
}
