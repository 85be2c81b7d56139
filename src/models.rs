use crate::storage::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::BTreeMap;

/// One worker's janjang count for one section on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(deserialize_with = "lenient_date")]
    pub tanggal: NaiveDate,
    pub seksi: String,
    pub nama: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub janjang: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub y: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCount {
    pub nama: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub janjang: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatesResponse {
    #[serde(default)]
    pub dates: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct YearsResponse {
    #[serde(default)]
    pub years: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthsResponse {
    #[serde(default)]
    pub months: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct RowsResponse {
    pub ok: bool,
    pub rows: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupedDayResponse {
    pub by_seksi: BTreeMap<String, Vec<WorkerCount>>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_all: u64,
}

#[derive(Debug, Serialize)]
pub struct LabeledSeriesResponse {
    pub ok: bool,
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CombinedSeriesResponse {
    #[serde(default)]
    pub daily: Vec<SeriesPoint>,
    #[serde(default)]
    pub monthly: Vec<SeriesPoint>,
}

/// `/chart_data/*` payload; `month` is absent for the yearly variant.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChartDataResponse {
    pub ok: bool,
    pub section: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub data: Vec<SeriesPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub msg: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagResponse {
    pub ok: bool,
    pub rows: usize,
    pub dates_sample: Vec<String>,
    pub cols: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvDiagResponse {
    pub ok: bool,
    pub port: u16,
    pub data_path: String,
    pub api_url: String,
    pub has_api_url: bool,
    pub sections: Vec<String>,
    pub roster_size: usize,
    pub http_timeout_secs: u64,
}

/// A labelled numeric series ready for a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<SeriesPoint>> for Series {
    fn from(points: Vec<SeriesPoint>) -> Self {
        let (labels, data) = points.into_iter().map(|point| (point.x, point.y)).unzip();
        Self { labels, data }
    }
}

/// Reads a date in any of the sheet's formats (`2025-10-01`, `01/10/2025`, ...).
pub fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_date(&value).ok_or_else(|| de::Error::custom(format!("unreadable date '{value}'")))
}

/// Reads a count that may be missing, null, negative, fractional or a
/// numeric string. Anything unusable becomes 0.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(count_from_value).unwrap_or(0))
}

pub fn count_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite() && *v > 0.0).map(|v| v as u64))
            .unwrap_or(0),
        Value::String(text) => count_from_str(text),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => 0,
    }
}

pub fn count_from_str(text: &str) -> u64 {
    let text = text.trim();
    text.parse::<u64>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0)
}
