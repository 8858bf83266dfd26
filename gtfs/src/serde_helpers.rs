//! GTFS encodes dates as `YYYYMMDD`, times as `HH:MM:SS` (hours may exceed 24), and booleans as
//! `0` / `1`. These are used through `#[serde(with = ...)]` on the row types, so the same
//! representation is used for CSV and for the values held in the disk store.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

const DATE_FORMAT: &str = "%Y%m%d";

pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

pub mod optional_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => super::date::serialize(date, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.is_empty() => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// Seconds since the start of the service day
pub fn parse_time(raw: &str) -> Result<u32, String> {
    let mut parts = raw.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("'{raw}' is not a valid time; HH:MM:SS format is expected"));
    };
    let parse = |x: &str| {
        x.parse::<u32>()
            .map_err(|_| format!("'{raw}' is not a valid time; HH:MM:SS format is expected"))
    };
    let (h, m, s) = (parse(h)?, parse(m)?, parse(s)?);
    if m >= 60 || s >= 60 {
        return Err(format!("'{raw}' has out-of-range minutes or seconds"));
    }
    Ok(h * 3600 + m * 60 + s)
}

pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

pub mod time {
    use super::*;

    pub fn serialize<S: Serializer>(secs: &u32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_time(*secs))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(d)?;
        parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod optional_time {
    use super::*;

    pub fn serialize<S: Serializer>(secs: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match secs {
            Some(secs) => s.serialize_str(&format_time(*secs)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.is_empty() => parse_time(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

pub mod bool_as_int {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let n = <u8>::deserialize(d)?;
        if n == 1 {
            return Ok(true);
        }
        if n == 0 {
            return Ok(false);
        }
        Err(serde::de::Error::custom(format!("Unknown bool value {n}")))
    }
}
