//! Coverage request values and their rendering into a submission URL.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::fmt;

use crate::error::{Error, Result};
use crate::util::{append_query, encode_segment, urljoin};

const COVERAGE_PATH: &str = "ogc-api-coverages/1.0.0/collections/all/coverage/rangeset";

/// A Harmony data collection, identified by its CMR concept id (e.g. `C1940468263-POCLOUD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection {
    id: String,
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A spatial subset in degrees: west, south, east, north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl BoundingBox {
    /// Fails if a longitude lies outside [-180, 180] or a latitude outside [-90, 90].
    ///
    /// West/east and south/north ordering is not checked.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        check_range("west", west, 180.0)?;
        check_range("south", south, 90.0)?;
        check_range("east", east, 180.0)?;
        check_range("north", north, 90.0)?;
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }
}

fn check_range(name: &str, value: f64, limit: f64) -> Result<()> {
    if !value.is_finite() || value < -limit || value > limit {
        return Err(Error::Validation(format!(
            "bounding box {} = {} is outside [-{}, {}]",
            name, value, limit, limit
        )));
    }
    Ok(())
}

/// A point in time, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    fn is_aware(&self) -> bool {
        matches!(self, Timestamp::Aware(_))
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(t: NaiveDateTime) -> Self {
        Timestamp::Naive(t)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Timestamp::Aware(t)
    }
}

impl fmt::Display for Timestamp {
    /// ISO-8601; fractional seconds only when non-zero, offset only for aware values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Naive(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Aware(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f%:z")),
        }
    }
}

/// A start/stop pair. Both ends must agree on whether they carry an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalRange {
    start: Timestamp,
    stop: Timestamp,
}

impl TemporalRange {
    pub fn new(start: impl Into<Timestamp>, stop: impl Into<Timestamp>) -> Result<Self> {
        let (start, stop) = (start.into(), stop.into());
        if start.is_aware() != stop.is_aware() {
            return Err(Error::Validation(
                "temporal range mixes timezone-aware and naive timestamps".to_string(),
            ));
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn stop(&self) -> Timestamp {
        self.stop
    }
}

/// A coverage request against one collection.
///
/// Query parameters are always emitted in the order latitude, longitude, time:
///
/// ```
/// use harmony_client::{BoundingBox, Collection, Request};
///
/// let request = Request::new(Collection::new("C1234-EXAMPLE"))
///     .with_spatial(BoundingBox::new(-107.0, 40.0, -105.0, 42.0)?);
/// let url = request.submit_url("https://harmony.example.com");
/// assert!(url.ends_with("rangeset?subset=lat%2840%3A42%29&subset=lon%28-107%3A-105%29"));
/// # Ok::<(), harmony_client::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    collection: Collection,
    spatial: Option<BoundingBox>,
    temporal: Option<TemporalRange>,
}

impl Request {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            spatial: None,
            temporal: None,
        }
    }

    pub fn with_spatial(mut self, bbox: BoundingBox) -> Self {
        self.spatial = Some(bbox);
        self
    }

    pub fn with_temporal(mut self, range: TemporalRange) -> Self {
        self.temporal = Some(range);
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn spatial(&self) -> Option<&BoundingBox> {
        self.spatial.as_ref()
    }

    pub fn temporal(&self) -> Option<&TemporalRange> {
        self.temporal.as_ref()
    }

    /// The `subset` parameter values, unencoded, in lat, lon, time order.
    pub fn subsets(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(3);
        if let Some(b) = &self.spatial {
            out.push(format!("lat({}:{})", b.south, b.north));
            out.push(format!("lon({}:{})", b.west, b.east));
        }
        if let Some(t) = &self.temporal {
            out.push(format!("time(\"{}\":\"{}\")", t.start, t.stop));
        }
        out
    }

    /// Full submission URL below `base`. No query string when the request has no subsets.
    pub fn submit_url(&self, base: &str) -> String {
        let path = format!("{}/{}", encode_segment(self.collection.id()), COVERAGE_PATH);
        let params: Vec<(&str, String)> =
            self.subsets().into_iter().map(|s| ("subset", s)).collect();
        append_query(&urljoin(base, &path), &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BASE: &str = "https://harmony.uat.earthdata.nasa.gov";

    fn naive(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn decoded(url: &str) -> String {
        urlencoding::decode(url).unwrap().into_owned()
    }

    #[test]
    fn bounding_box_renders_lat_then_lon() {
        let request = Request::new(Collection::new("C1940468263-POCLOUD"))
            .with_spatial(BoundingBox::new(-107.0, 40.0, -105.0, 42.0).unwrap());

        assert_eq!(
            decoded(&request.submit_url(BASE)),
            format!(
                "{}/C1940468263-POCLOUD/{}?subset=lat(40:42)&subset=lon(-107:-105)",
                BASE, COVERAGE_PATH
            )
        );
    }

    #[test]
    fn temporal_range_renders_quoted_iso_timestamps() {
        let request = Request::new(Collection::new("C1234-TATOOINE")).with_temporal(
            TemporalRange::new(naive(2010, 12, 1), naive(2010, 12, 31)).unwrap(),
        );

        assert_eq!(
            decoded(&request.submit_url(BASE)),
            format!(
                "{}/C1234-TATOOINE/{}?subset=time(\"2010-12-01T00:00:00\":\"2010-12-31T00:00:00\")",
                BASE, COVERAGE_PATH
            )
        );
    }

    #[test]
    fn both_constraints_yield_three_subsets_in_order() {
        let request = Request::new(Collection::new("C333666999-EOSDIS"))
            .with_spatial(BoundingBox::new(-107.0, 40.0, -105.0, 42.0).unwrap())
            .with_temporal(TemporalRange::new(naive(2001, 1, 1), naive(2003, 3, 31)).unwrap());

        let url = decoded(&request.submit_url(BASE));
        let query = url.split_once('?').unwrap().1;
        let params: Vec<&str> = query.split('&').collect();
        assert_eq!(
            params,
            vec![
                "subset=lat(40:42)",
                "subset=lon(-107:-105)",
                "subset=time(\"2001-01-01T00:00:00\":\"2003-03-31T00:00:00\")",
            ]
        );
    }

    #[test]
    fn no_constraints_has_no_query_string() {
        let url = Request::new(Collection::new("C1-ABC")).submit_url(BASE);
        assert!(!url.contains('?'));
        assert!(url.ends_with("/C1-ABC/ogc-api-coverages/1.0.0/collections/all/coverage/rangeset"));
    }

    #[test]
    fn emitted_url_has_no_raw_reserved_characters_in_query() {
        let request = Request::new(Collection::new("C1-ABC"))
            .with_temporal(TemporalRange::new(naive(2020, 1, 1), naive(2020, 2, 1)).unwrap());
        let url = request.submit_url(BASE);
        let query = url.split_once('?').unwrap().1;
        assert!(!query.contains('"'));
        assert!(!query.contains(':'));
        assert!(!query.contains(' '));
    }

    #[test]
    fn fractional_coordinates_render_plain_decimal() {
        let request = Request::new(Collection::new("C1-ABC"))
            .with_spatial(BoundingBox::new(-0.000001, 45.5, 179.25, 89.999).unwrap());
        assert_eq!(
            request.subsets(),
            vec!["lat(45.5:89.999)".to_string(), "lon(-0.000001:179.25)".to_string()]
        );
    }

    #[test]
    fn out_of_range_bounding_box_is_rejected() {
        let err = BoundingBox::new(-190.0, -100.0, 100.0, 190.0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert!(BoundingBox::new(-180.0, -90.0, 180.0, 90.0).is_ok());
        assert!(BoundingBox::new(0.0, 0.0, 181.0, 10.0).is_err());
        assert!(BoundingBox::new(0.0, f64::NAN, 10.0, 10.0).is_err());
    }

    #[test]
    fn aware_timestamps_keep_their_offset() {
        let start = DateTime::parse_from_rfc3339("2021-06-01T12:30:00+02:00").unwrap();
        let stop = DateTime::parse_from_rfc3339("2021-06-02T00:00:00.5+00:00").unwrap();
        let range = TemporalRange::new(start, stop).unwrap();
        assert_eq!(range.start().to_string(), "2021-06-01T12:30:00+02:00");
        assert_eq!(range.stop().to_string(), "2021-06-02T00:00:00.500+00:00");
    }

    #[test]
    fn mixed_timestamp_kinds_are_rejected() {
        let aware = DateTime::parse_from_rfc3339("2021-06-01T00:00:00Z").unwrap();
        let err = TemporalRange::new(naive(2021, 6, 1), aware).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }
}
