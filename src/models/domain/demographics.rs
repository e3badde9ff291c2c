use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const MAX_PLAUSIBLE_AGE: i32 = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    IpLookup,
    Headers,
    Browser,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub region: String,
    pub city: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub source: LocationSource,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        GeoLocation {
            country: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            latitude: None,
            longitude: None,
            source: LocationSource::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source == LocationSource::Unknown
    }
}

/// Normalizes an optional text field, mapping blanks to `"Unknown"`.
pub fn or_unknown(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemographicsRecord {
    pub user_id: String,
    pub age: Option<u8>,
    pub gender: String,
    pub denomination: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_source: LocationSource,
    pub ip_hash: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Age in whole years on `today`. Implausible ages (negative or above
/// [`MAX_PLAUSIBLE_AGE`]) are discarded.
pub fn age_from_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Option<u8> {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    plausible_age(age)
}

pub fn age_from_birth_year(birth_year: i32, today: NaiveDate) -> Option<u8> {
    plausible_age(today.year() - birth_year)
}

fn plausible_age(age: i32) -> Option<u8> {
    if (0..=MAX_PLAUSIBLE_AGE).contains(&age) {
        u8::try_from(age).ok()
    } else {
        None
    }
}
