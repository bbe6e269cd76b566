use chrono::{NaiveDate, NaiveTime};

/// One fatal-collision event as loaded from a source file.
///
/// Every field is optional: source rows routinely carry blank or garbage
/// cells, and a record missing a field is simply excluded from the views
/// that need it rather than rejected at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionRecord {
    /// Calendar year of the collision.
    pub year: Option<i32>,

    /// Full date, when the row carried a parseable one.
    pub date: Option<NaiveDate>,

    /// Time of day, minute resolution.
    pub time: Option<NaiveTime>,

    /// WGS84 longitude in degrees.
    pub longitude: Option<f64>,

    /// WGS84 latitude in degrees.
    pub latitude: Option<f64>,
}

impl CollisionRecord {
    /// Hour of day (0-23), when a time is present.
    pub fn hour(&self) -> Option<u32> {
        use chrono::Timelike;
        self.time.map(|t| t.hour())
    }

    /// Map coordinate as (longitude, latitude), when both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}
