use std::collections::BTreeMap;
use std::io::Read;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::{bool_as_int, date};
use crate::tables::{read_rows, Table};
use crate::{DuplicatePolicy, ErrorKind, GTFSError, ServiceID, GTFS};

/// A calendar entry and all the calendar_dates that modify it. Either part may be missing, and
/// they can show up in any order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: ServiceID,
    pub calendar: Option<Calendar>,
    pub calendar_dates: BTreeMap<NaiveDate, CalendarDate>,
}

/// One row of calendar.txt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: ServiceID,
    #[serde(with = "bool_as_int")]
    pub monday: bool,
    #[serde(with = "bool_as_int")]
    pub tuesday: bool,
    #[serde(with = "bool_as_int")]
    pub wednesday: bool,
    #[serde(with = "bool_as_int")]
    pub thursday: bool,
    #[serde(with = "bool_as_int")]
    pub friday: bool,
    #[serde(with = "bool_as_int")]
    pub saturday: bool,
    #[serde(with = "bool_as_int")]
    pub sunday: bool,
    #[serde(with = "date")]
    pub start_date: NaiveDate,
    #[serde(with = "date")]
    pub end_date: NaiveDate,
}

/// One row of calendar_dates.txt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub service_id: ServiceID,
    #[serde(with = "date")]
    pub date: NaiveDate,
    pub exception_type: Exception,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Exception {
    Added,
    Removed,
}

impl TryFrom<u8> for Exception {
    type Error = String;

    fn try_from(x: u8) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(Exception::Added),
            2 => Ok(Exception::Removed),
            _ => Err(format!("Unknown exception_type {x}")),
        }
    }
}

impl From<Exception> for u8 {
    fn from(x: Exception) -> u8 {
        match x {
            Exception::Added => 1,
            Exception::Removed => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DaysOfWeek {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Service {
    pub fn new(service_id: ServiceID) -> Self {
        Self {
            service_id,
            calendar: None,
            calendar_dates: BTreeMap::new(),
        }
    }

    /// Exceptions take precedence over the weekly calendar.
    pub fn active_on(&self, day: NaiveDate) -> bool {
        if let Some(exception) = self.calendar_dates.get(&day) {
            return exception.exception_type == Exception::Added;
        }
        match self.calendar {
            Some(ref calendar) => {
                day >= calendar.start_date
                    && day <= calendar.end_date
                    && calendar.days_of_week().includes(&day)
            }
            None => false,
        }
    }

    pub fn describe(&self) -> String {
        let weekly = match self.calendar {
            Some(ref calendar) => calendar.days_of_week().describe(),
            None => "only on listed dates".to_string(),
        };
        if self.calendar_dates.is_empty() {
            weekly
        } else {
            format!("{weekly}, {} exceptions", self.calendar_dates.len())
        }
    }
}

impl Calendar {
    pub fn days_of_week(&self) -> DaysOfWeek {
        DaysOfWeek {
            monday: self.monday,
            tuesday: self.tuesday,
            wednesday: self.wednesday,
            thursday: self.thursday,
            friday: self.friday,
            saturday: self.saturday,
            sunday: self.sunday,
        }
    }
}

impl DaysOfWeek {
    pub fn describe(&self) -> String {
        let weekdays = [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
        ]
        .into_iter()
        .filter(|x| *x)
        .count();
        let weekends = [self.saturday, self.sunday]
            .into_iter()
            .filter(|x| *x)
            .count();
        if weekdays + weekends == 7 {
            return "every day".to_string();
        }
        if weekdays == 5 && weekends == 0 {
            return "weekdays".to_string();
        }
        if weekdays == 0 && weekends == 2 {
            return "weekends".to_string();
        }
        if weekdays == 0 && weekends == 0 {
            return "never".to_string();
        }
        let mut result = String::new();
        for (day, operates) in [
            ("M", self.monday),
            ("T", self.tuesday),
            ("W", self.wednesday),
            ("Th", self.thursday),
            ("F", self.friday),
            ("Sat", self.saturday),
            ("Sun", self.sunday),
        ] {
            if operates {
                result.push_str(day);
            }
        }
        result
    }

    pub fn includes(&self, day: &NaiveDate) -> bool {
        match day.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

pub(crate) fn load<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::Calendar, reader, |calendar: Calendar, row| {
        let service = gtfs.get_or_create_service(&calendar.service_id);
        if service.calendar.is_some() {
            row.report(ErrorKind::DuplicateKey(format!("{:?}", calendar.service_id)));
            if duplicates == DuplicatePolicy::FirstWins {
                return Ok(());
            }
        }
        service.calendar = Some(calendar);
        Ok(())
    })
}

pub(crate) fn load_dates<R: Read>(gtfs: &mut GTFS, reader: R) -> Result<Vec<GTFSError>> {
    let duplicates = gtfs.config.duplicates;
    read_rows(Table::CalendarDates, reader, |exception: CalendarDate, row| {
        let service = gtfs.get_or_create_service(&exception.service_id);
        row.insert_unique(
            duplicates,
            &mut service.calendar_dates,
            exception.date,
            exception,
        );
        Ok(())
    })
}
