//! Wire types for the two remote endpoints
//!
//! Field sets mirror the upstream JSON exactly; everything defaults so a
//! sparse response still deserializes. Date fields use [`Timestamp`],
//! which accepts either epoch seconds or an RFC3339 string and never
//! fails to parse.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Epoch-seconds timestamp with a lenient wire representation
///
/// Accepts a JSON integer (epoch seconds) or an RFC3339 date-time
/// string. Malformed or too-short strings normalize to zero; this is a
/// deliberate lenient-parse contract, not an error path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Epoch seconds value
    #[inline]
    #[must_use]
    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// Lenient string parse: RFC3339, then naive `%Y-%m-%dT%H:%M:%S`
    /// over the first 19 chars treated as UTC, else zero
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        let Some(head) = s.get(..19) else {
            return Self(0);
        };
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Self(dt.timestamp());
        }
        match NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
            Ok(naive) => Self(naive.and_utc().timestamp()),
            Err(_) => Self(0),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TimestampVisitor;

        impl serde::de::Visitor<'_> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("epoch seconds or an RFC3339 date-time string")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Timestamp, E> {
                Ok(Timestamp(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Timestamp, E> {
                Ok(Timestamp(v as i64))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Timestamp, E> {
                Ok(Timestamp(v as i64))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Timestamp, E> {
                Ok(Timestamp::parse_lenient(v))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Timestamp, E> {
                Ok(Timestamp(0))
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Timestamp, E> {
                Ok(Timestamp(0))
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// One listing entry: identifies a case and a specific child in it
///
/// Consumed exactly once by exactly one resolver worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseSummary {
    pub portrait: String,
    pub full_name: String,
    pub birth_date: Timestamp,
    pub case_id: String,
    pub agency_code: String,
    pub status: String,
    pub public: bool,
    #[serde(rename = "type")]
    pub case_type: String,
    pub state: String,
    pub city: String,
    pub missing_since: Timestamp,
    pub country: String,
    pub open_date: Timestamp,
    pub create_date: Timestamp,
    pub last_update: Timestamp,
    pub child_id: String,
}

/// Paged listing body inside the list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseList {
    pub total: i64,
    pub results: Vec<CaseSummary>,
}

/// Top-level list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCasesResponse {
    pub cases: CaseList,
}

/// Image references on a child record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildImages {
    pub portrait: String,
}

/// Per-child attributes inside a case detail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChildRecord {
    pub child_id: String,
    pub full_name: String,
    pub birth_date: Timestamp,
    pub sex: String,
    pub eye_color: String,
    pub hair_color: String,
    pub height: String,
    pub height_unit: String,
    pub weight: String,
    pub weight_unit: String,
    pub missing_date: Timestamp,
    pub images: ChildImages,
}

/// Geo coordinates on a case detail
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Fully resolved case record
///
/// Only the first child record is used by the pipeline. `miscellaneous`
/// is a BTreeMap so the auxiliary-image key selection is deterministic
/// (lexicographically smallest key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseDetail {
    pub agency_code: String,
    pub case_id: String,
    pub case_type: String,
    pub children: Vec<ChildRecord>,
    pub circumstances: String,
    pub city: String,
    pub contact_information: String,
    pub country: String,
    pub create_date: Timestamp,
    pub miscellaneous: BTreeMap<String, String>,
    pub missing_date: Timestamp,
    pub open_date: Timestamp,
    pub poster: String,
    pub public: bool,
    pub state: String,
    pub status: String,
    pub etl: bool,
    pub center: GeoPoint,
    pub last_update: Timestamp,
}

impl CaseDetail {
    /// First key of the auxiliary map, if any: the supplementary image URL
    #[inline]
    #[must_use]
    pub fn auxiliary_url(&self) -> Option<&str> {
        self.miscellaneous.keys().next().map(String::as_str)
    }
}

/// Top-level detail response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDetailResponse {
    #[serde(rename = "case")]
    pub case: CaseDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_from_integer() {
        let ts: Timestamp = serde_json::from_str("1091000000").unwrap();
        assert_eq!(ts.as_secs(), 1_091_000_000);
    }

    #[test]
    fn timestamp_from_rfc3339_string() {
        let ts: Timestamp = serde_json::from_str("\"2004-02-27T07:00:00.000Z\"").unwrap();
        assert_eq!(ts.as_secs(), 1_077_865_200);
    }

    #[test]
    fn timestamp_without_fraction() {
        let ts: Timestamp = serde_json::from_str("\"2004-02-27T07:00:00\"").unwrap();
        assert_eq!(ts.as_secs(), 1_077_865_200);
    }

    #[test]
    fn timestamp_short_string_is_zero() {
        let ts: Timestamp = serde_json::from_str("\"2004-02-27\"").unwrap();
        assert_eq!(ts.as_secs(), 0);
    }

    #[test]
    fn timestamp_garbage_is_zero() {
        let ts: Timestamp = serde_json::from_str("\"not a timestamp at all\"").unwrap();
        assert_eq!(ts.as_secs(), 0);
    }

    #[test]
    fn timestamp_missing_field_is_zero() {
        let summary: CaseSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(summary.birth_date.as_secs(), 0);
    }

    #[test]
    fn list_response_shape() {
        let body = r#"{
            "cases": {
                "total": 2,
                "results": [
                    {
                        "caseId": "C-1",
                        "childId": "K-1",
                        "fullName": "Jane Roe",
                        "missingSince": 1600000000,
                        "birthDate": "2004-02-27T07:00:00.000Z",
                        "country": "US",
                        "state": "OH",
                        "city": "Akron",
                        "type": "endangered"
                    }
                ]
            }
        }"#;
        let resp: SearchCasesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.cases.total, 2);
        let first = &resp.cases.results[0];
        assert_eq!(first.case_id, "C-1");
        assert_eq!(first.case_type, "endangered");
        assert_eq!(first.birth_date.as_secs(), 1_077_865_200);
    }

    #[test]
    fn auxiliary_url_is_smallest_key() {
        let detail: CaseDetail = serde_json::from_str(
            r#"{"miscellaneous": {"b.jpg": "x", "a.jpg": "y", "c.jpg": "z"}}"#,
        )
        .unwrap();
        assert_eq!(detail.auxiliary_url(), Some("a.jpg"));
    }

    #[test]
    fn auxiliary_url_empty_map() {
        let detail = CaseDetail::default();
        assert_eq!(detail.auxiliary_url(), None);
    }

    #[test]
    fn detail_response_children() {
        let body = r#"{
            "case": {
                "caseId": "C-9",
                "status": "open",
                "children": [
                    {
                        "childId": "K-9",
                        "hairColor": "brown",
                        "eyeColor": "green",
                        "height": "52",
                        "heightUnit": "in",
                        "weight": "80",
                        "weightUnit": "lb",
                        "sex": "F",
                        "images": {"portrait": "http://img/p.jpg"}
                    }
                ]
            }
        }"#;
        let resp: CaseDetailResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.case.children.len(), 1);
        assert_eq!(resp.case.children[0].images.portrait, "http://img/p.jpg");
    }
}
