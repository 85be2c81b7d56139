//! HTTP client for the harvest backend.

use crate::errors::{ClientError, ClientResult};
use crate::models::{
    CombinedSeriesResponse, DatesResponse, GroupedDayResponse, MonthsResponse, Row, Series,
    YearsResponse, count_from_value,
};
use crate::storage::parse_date;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Rows are kept as raw values so one unreadable row does not sink the day.
#[derive(Debug, Deserialize)]
struct RowsPayload {
    rows: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayPayload {
    Rows(RowsPayload),
    Grouped(GroupedDayResponse),
}

#[derive(Debug, Deserialize)]
struct LabeledPayload {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    data: Vec<Value>,
}

/// Client for the `/api/*` endpoints.
///
/// Every call is a same-origin style GET; responses carrying
/// `{ok: false, error}` come back as [`ClientError::Api`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn dates(&self) -> ClientResult<Vec<NaiveDate>> {
        let response: DatesResponse = self.get("/api/dates", &[]).await?;
        Ok(response
            .dates
            .iter()
            .filter_map(|value| parse_date(value))
            .collect())
    }

    pub async fn years(&self) -> ClientResult<Vec<i32>> {
        let response: YearsResponse = self.get("/api/years", &[]).await?;
        Ok(response.years)
    }

    pub async fn months(&self, year: i32) -> ClientResult<Vec<u32>> {
        let response: MonthsResponse = self
            .get("/api/months", &[("year", year.to_string())])
            .await?;
        Ok(response.months)
    }

    /// Rows for one date. Accepts both the row list and the grouped
    /// `{by_seksi, total_all}` shape.
    pub async fn rows_on(&self, date: NaiveDate) -> ClientResult<Vec<Row>> {
        let payload: DayPayload = self
            .get("/api/by-date", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;
        Ok(match payload {
            DayPayload::Rows(payload) => decode_rows(payload.rows),
            DayPayload::Grouped(grouped) => rows_from_grouped(date, grouped),
        })
    }

    /// Same as [`ApiClient::rows_on`] through the `/api/daily` variant.
    pub async fn daily(&self, date: NaiveDate) -> ClientResult<Vec<Row>> {
        let grouped: GroupedDayResponse = self
            .get("/api/daily", &[("date", date.format("%Y-%m-%d").to_string())])
            .await?;
        Ok(rows_from_grouped(date, grouped))
    }

    pub async fn month_series(&self, seksi: &str, year: i32, month: u32) -> ClientResult<Series> {
        let payload: LabeledPayload = self
            .get(
                "/api/series/month",
                &[
                    ("seksi", seksi.to_string()),
                    ("year", year.to_string()),
                    ("month", month.to_string()),
                ],
            )
            .await?;
        Ok(labeled_series(payload))
    }

    pub async fn year_series(&self, seksi: &str, year: i32) -> ClientResult<Series> {
        let payload: LabeledPayload = self
            .get(
                "/api/series/year",
                &[("seksi", seksi.to_string()), ("year", year.to_string())],
            )
            .await?;
        Ok(labeled_series(payload))
    }

    /// Daily and monthly series in one call.
    pub async fn series(
        &self,
        seksi: &str,
        month: u32,
        year: i32,
    ) -> ClientResult<(Series, Series)> {
        let payload: CombinedSeriesResponse = self
            .get(
                "/api/series",
                &[
                    ("seksi", seksi.to_string()),
                    ("month", month.to_string()),
                    ("year", year.to_string()),
                ],
            )
            .await?;
        Ok((Series::from(payload.daily), Series::from(payload.monthly)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let url = format!("{base}{endpoint}", base = self.base_url);
        debug!(%url, ?query, "fetching");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(message) = api_failure(endpoint, &body) {
            return Err(ClientError::Api(message));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        serde_json::from_value(body)
            .map_err(|err| ClientError::Api(format!("unexpected response from {endpoint}: {err}")))
    }
}

/// Message of an `{ok: false, error}` body. `error` may be any JSON value.
fn api_failure(endpoint: &str, body: &Value) -> Option<String> {
    if body.get("ok").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let message = match body.get("error") {
        None | Some(Value::Null) => format!("{endpoint} reported a failure"),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    Some(message)
}

fn decode_rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Row>(value) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!("skipping unreadable row: {err}");
                None
            }
        })
        .collect()
}

fn rows_from_grouped(date: NaiveDate, grouped: GroupedDayResponse) -> Vec<Row> {
    grouped
        .by_seksi
        .into_iter()
        .flat_map(|(seksi, workers)| {
            workers.into_iter().map(move |worker| Row {
                tanggal: date,
                seksi: seksi.clone(),
                nama: worker.nama,
                janjang: worker.janjang,
            })
        })
        .collect()
}

fn labeled_series(payload: LabeledPayload) -> Series {
    let mut labels = payload.labels;
    let mut data: Vec<u64> = payload.data.iter().map(count_from_value).collect();
    let len = labels.len().min(data.len());
    labels.truncate(len);
    data.truncate(len);
    Series { labels, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkerCount;
    use axum::{Json, Router, routing::get};
    use serde_json::json;
    use std::collections::BTreeMap;

    async fn stub(router: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn grouped_payload_becomes_rows() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let mut by_seksi = BTreeMap::new();
        by_seksi.insert(
            "A III".to_string(),
            vec![
                WorkerCount { nama: "Agus".into(), janjang: 3 },
                WorkerCount { nama: "Bagol".into(), janjang: 4 },
            ],
        );
        let rows = rows_from_grouped(date, GroupedDayResponse { by_seksi, total_all: 7 });
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.tanggal == date && row.seksi == "A III"));
    }

    #[test]
    fn day_payload_accepts_both_shapes() {
        let rows: DayPayload = serde_json::from_str(
            r#"{"ok":true,"rows":[{"tanggal":"2025-10-01","seksi":"A","nama":"Agus","janjang":2}]}"#,
        )
        .unwrap();
        assert!(matches!(rows, DayPayload::Rows(ref payload) if payload.rows.len() == 1));

        let grouped: DayPayload =
            serde_json::from_str(r#"{"by_seksi":{"A":[{"nama":"Agus","janjang":2}]},"total_all":2}"#)
                .unwrap();
        assert!(matches!(grouped, DayPayload::Grouped(ref payload) if payload.total_all == 2));
    }

    #[test]
    fn labeled_series_tolerates_bad_values_and_length_mismatch() {
        let payload: LabeledPayload =
            serde_json::from_str(r#"{"ok":true,"labels":["a","b","c"],"data":[1,null,"x",9]}"#)
                .unwrap();
        let series = labeled_series(payload);
        assert_eq!(series.labels, vec!["a", "b", "c"]);
        assert_eq!(series.data, vec![1, 0, 0]);
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn failure_message_reads_any_error_value() {
        let body = json!({"ok": false, "error": "sheet down"});
        assert_eq!(api_failure("/api/dates", &body).as_deref(), Some("sheet down"));

        let body = json!({"ok": false, "error": {"msg": "sheet down"}});
        assert_eq!(
            api_failure("/api/dates", &body).as_deref(),
            Some(r#"{"msg":"sheet down"}"#)
        );

        let body = json!({"ok": false, "error": 42});
        assert_eq!(api_failure("/api/dates", &body).as_deref(), Some("42"));

        let body = json!({"ok": false});
        assert_eq!(
            api_failure("/api/dates", &body).as_deref(),
            Some("/api/dates reported a failure")
        );

        assert_eq!(api_failure("/api/dates", &json!({"ok": true, "dates": []})), None);
        assert_eq!(api_failure("/api/dates", &json!({"dates": []})), None);
        assert_eq!(api_failure("/api/dates", &json!({"ok": "false"})), None);
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let rows = decode_rows(vec![
            json!({"tanggal": "2025-10-01", "seksi": "A III", "nama": "Agus", "janjang": 4}),
            json!({"tanggal": "01/10/2025", "seksi": "A III", "nama": "Bagol", "janjang": 6}),
            json!({"tanggal": "kemarin", "seksi": "A III", "nama": "Cecep", "janjang": 9}),
        ]);
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.tanggal == date));
        assert_eq!(rows.iter().map(|row| row.janjang).sum::<u64>(), 10);
    }

    #[tokio::test]
    async fn non_string_errors_still_fail_the_call() {
        let router = Router::new()
            .route(
                "/api/dates",
                get(|| async { Json(json!({"ok": false, "error": {"msg": "sheet down"}})) }),
            )
            .route(
                "/api/series/month",
                get(|| async { Json(json!({"ok": false, "error": 42})) }),
            );
        let client = stub(router).await;

        match client.dates().await {
            Err(ClientError::Api(message)) => assert!(message.contains("sheet down")),
            other => panic!("expected an api error, got {other:?}"),
        }
        match client.month_series("A III", 2025, 10).await {
            Err(ClientError::Api(message)) => assert_eq!(message, "42"),
            other => panic!("expected an api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn by_date_accepts_mixed_date_formats() {
        let router = Router::new().route(
            "/api/by-date",
            get(|| async {
                Json(json!({"ok": true, "rows": [
                    {"tanggal": "2025-10-01", "seksi": "A III", "nama": "Agus", "janjang": 10},
                    {"tanggal": "01/10/2025", "seksi": "B III", "nama": "Bagol", "janjang": 5},
                ]}))
            }),
        );
        let client = stub(router).await;

        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let rows = client.rows_on(date).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.tanggal == date));
    }
}
