//! Sample ingestion: field-data documents and raw measurement records.
//!
//! Records follow the GeoJSON point layout, `geometry.coordinates = [lng, lat, …]`,
//! with the index reading stored under one of several dated property names.
//! Bad records are skipped and counted; only an unusable document is an error.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OverlayError, Result};
use crate::sample::Sample;

/// Property names tried, in order, for the index reading.
pub const DEFAULT_VALUE_ALIASES: [&str; 4] = [
    "NDVI_2023-06-14",
    "NDVI_2023_06_14",
    "CLP_2023-06-14",
    "CLP_2023_06_14",
];

/// Why a record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingGeometry,
    TooFewCoordinates,
    NonFinite,
}

/// Outcome counts of one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub valid_count: usize,
    pub rejected_count: usize,
    pub missing_geometry: usize,
    pub too_few_coordinates: usize,
    pub non_finite: usize,
}

impl IngestReport {
    fn reject(&mut self, reason: RejectReason) {
        self.rejected_count += 1;
        match reason {
            RejectReason::MissingGeometry => self.missing_geometry += 1,
            RejectReason::TooFewCoordinates => self.too_few_coordinates += 1,
            RejectReason::NonFinite => self.non_finite += 1,
        }
    }
}

/// Valid samples plus diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub samples: Vec<Sample>,
    pub report: IngestReport,
}

/// Quartiles as published in the feed's own statistics block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedQuartiles {
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub q50: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
}

/// Summary statistics shipped alongside the raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedStatistics {
    pub mean: f64,
    pub std: f64,
    pub quartiles: ReportedQuartiles,
}

/// A parsed field-data document.
#[derive(Debug, Clone)]
pub struct FieldDocument {
    pub raw_values: Vec<Value>,
    pub statistics: Option<ReportedStatistics>,
}

impl FieldDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)
            .map_err(|e| OverlayError::InvalidFieldData(format!("Invalid field data: {e}")))?;
        Self::from_value(root)
    }

    pub fn from_value(mut root: Value) -> Result<Self> {
        let raw_values = match root.get_mut("raw_values").map(Value::take) {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(OverlayError::InvalidFieldData(
                    "Invalid field data format".to_string(),
                ))
            }
        };

        let statistics = match root.get("statistics") {
            None | Some(Value::Null) => None,
            Some(v) => match ReportedStatistics::deserialize(v) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!("ignoring malformed statistics block: {e}");
                    None
                }
            },
        };

        Ok(Self { raw_values, statistics })
    }
}

/// Validate and normalise every record, skipping the bad ones.
pub fn ingest_records<S: AsRef<str>>(records: &[Value], aliases: &[S]) -> Ingested {
    info!("processing {} field records", records.len());

    let mut out = Ingested {
        samples: Vec::with_capacity(records.len()),
        report: IngestReport::default(),
    };

    for (i, record) in records.iter().enumerate() {
        match parse_record(record, aliases) {
            Ok(sample) => out.samples.push(sample),
            Err(reason) => {
                debug!("record {i} rejected: {reason:?}");
                out.report.reject(reason);
            }
        }
    }
    out.report.valid_count = out.samples.len();

    info!(
        "ingested {} valid samples, {} rejected",
        out.report.valid_count, out.report.rejected_count
    );
    out
}

/// Turn one raw record into a sample.
pub fn parse_record<S: AsRef<str>>(
    record: &Value,
    aliases: &[S],
) -> std::result::Result<Sample, RejectReason> {
    let coords = record
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or(RejectReason::MissingGeometry)?;

    if coords.len() < 2 {
        return Err(RejectReason::TooFewCoordinates);
    }

    // GeoJSON: longitude first.
    let lng = as_number(&coords[0]);
    let lat = as_number(&coords[1]);
    let raw_value = resolve_value(record, aliases);

    Sample::from_raw(lat, lng, raw_value).ok_or(RejectReason::NonFinite)
}

/// First alias holding a truthy value wins; no match reads as 0.
fn resolve_value<S: AsRef<str>>(record: &Value, aliases: &[S]) -> f64 {
    aliases
        .iter()
        .filter_map(|alias| record.get(alias.as_ref()))
        .find(|v| is_truthy(v))
        .map(as_number)
        .unwrap_or(0.0)
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Lenient numeric coercion; anything unusable is NaN.
fn as_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Bool(true) => 1.0,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aliases() -> Vec<String> {
        DEFAULT_VALUE_ALIASES.iter().map(|s| s.to_string()).collect()
    }

    fn point(lng: f64, lat: f64, key: &str, value: Value) -> Value {
        json!({
            "geometry": { "type": "Point", "coordinates": [lng, lat] },
            key: value,
        })
    }

    #[test]
    fn longitude_comes_first() {
        let record = point(81.1, 16.9, "NDVI_2023-06-14", json!(0.82));
        let s = parse_record(&record, &aliases()).unwrap();
        assert_eq!(s.lat, 16.9);
        assert_eq!(s.lng, 81.1);
        assert!((s.value - 82.0).abs() < 1e-9);
    }

    #[test]
    fn aliases_are_tried_in_order() {
        let rec = json!({
            "geometry": { "coordinates": [81.1, 16.9] },
            "CLP_2023_06_14": 0.1,
            "NDVI_2023_06_14": 0.6,
        });
        let s = parse_record(&rec, &aliases()).unwrap();
        assert!((s.value - 60.0).abs() < 1e-9);
    }

    #[test]
    fn zero_reading_falls_through_to_next_alias() {
        let rec = json!({
            "geometry": { "coordinates": [81.1, 16.9] },
            "NDVI_2023-06-14": 0,
            "CLP_2023-06-14": 0.3,
        });
        let s = parse_record(&rec, &aliases()).unwrap();
        assert!((s.value - 30.0).abs() < 1e-9);
    }

    #[test]
    fn missing_value_defaults_to_zero() {
        let rec = json!({ "geometry": { "coordinates": [81.1, 16.9] } });
        assert_eq!(parse_record(&rec, &aliases()).unwrap().value, 0.0);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let rec = json!({
            "geometry": { "coordinates": ["81.1", "16.9"] },
            "NDVI_2023-06-14": "45",
        });
        let s = parse_record(&rec, &aliases()).unwrap();
        assert_eq!(s.value, 45.0);
        assert_eq!(s.lng, 81.1);
    }

    #[test]
    fn malformed_records_report_reasons() {
        let aliases = aliases();
        assert_eq!(
            parse_record(&json!({ "NDVI_2023-06-14": 0.4 }), &aliases),
            Err(RejectReason::MissingGeometry)
        );
        assert_eq!(
            parse_record(&json!({ "geometry": { "coordinates": "81,16" } }), &aliases),
            Err(RejectReason::MissingGeometry)
        );
        assert_eq!(
            parse_record(&json!({ "geometry": { "coordinates": [81.1] } }), &aliases),
            Err(RejectReason::TooFewCoordinates)
        );
        assert_eq!(
            parse_record(&point(81.1, 16.9, "NDVI_2023-06-14", json!("n/a")), &aliases),
            Err(RejectReason::NonFinite)
        );
        assert_eq!(
            parse_record(&json!({ "geometry": { "coordinates": [null, 16.9] } }), &aliases),
            Err(RejectReason::NonFinite)
        );
    }

    #[test]
    fn batch_skips_bad_records_and_counts_them() {
        let records = vec![
            point(81.10, 16.90, "NDVI_2023-06-14", json!(82)),
            json!(null),
            point(81.10, 16.90, "NDVI_2023_06_14", json!(0.4)),
            json!({ "geometry": { "coordinates": [81.1] } }),
            point(81.101, 16.901, "CLP_2023-06-14", json!(90)),
        ];
        let out = ingest_records(&records, &aliases());
        assert_eq!(out.samples.len(), 3);
        assert_eq!(out.report.valid_count, 3);
        assert_eq!(out.report.rejected_count, 2);
        assert_eq!(out.report.missing_geometry, 1);
        assert_eq!(out.report.too_few_coordinates, 1);
    }

    #[test]
    fn document_requires_raw_values_array() {
        let err = FieldDocument::from_json(r#"{"values": []}"#).unwrap_err();
        assert_eq!(err, OverlayError::InvalidFieldData("Invalid field data format".into()));
        assert!(FieldDocument::from_json("not json").is_err());
    }

    #[test]
    fn document_statistics_are_optional() {
        let doc = FieldDocument::from_json(
            r#"{
                "raw_values": [],
                "statistics": { "mean": 0.61, "std": 0.12,
                                "quartiles": { "25%": 0.5, "50%": 0.6, "75%": 0.7 } }
            }"#,
        )
        .unwrap();
        let stats = doc.statistics.unwrap();
        assert_eq!(stats.quartiles.q50, 0.6);

        let bare = FieldDocument::from_json(r#"{"raw_values": [], "statistics": "n/a"}"#).unwrap();
        assert!(bare.statistics.is_none());
    }
}
