use crate::errors::AppError;
use crate::models::{
    ChartDataResponse, CombinedSeriesResponse, DatesResponse, DiagResponse, EnvDiagResponse,
    GroupedDayResponse, HealthResponse, LabeledSeriesResponse, MonthsResponse, RowsResponse,
    SeriesPoint, YearsResponse,
};
use crate::state::AppState;
use crate::storage::{COL_JANJANG, COL_NAMA, COL_SEKSI, COL_TANGGAL, parse_date};
use crate::ui::render_dashboard;
use crate::view::DashboardRequest;
use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Raw query parameters; parsed by hand so bad input gets the JSON
/// error envelope instead of a plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ApiQuery {
    pub date: Option<String>,
    pub seksi: Option<String>,
    pub section: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tanggal: Option<String>,
    pub bulan: Option<String>,
    pub tahun_bulanan: Option<String>,
    pub tahun_tahunan: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let request = DashboardRequest {
        date: query.tanggal.as_deref().and_then(parse_date),
        month: query.bulan.as_deref().and_then(|v| v.trim().parse().ok()),
        year_monthly: query.tahun_bulanan.as_deref().and_then(|v| v.trim().parse().ok()),
        year_yearly: query.tahun_tahunan.as_deref().and_then(|v| v.trim().parse().ok()),
    };

    let mut controller = state.controller.lock().await;
    let view = controller.dashboard(request, today()).await;
    Html(render_dashboard(&view))
}

/// Unhealthy when the data file existed but could not be loaded.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    if let Some(err) = state.store.load_error() {
        return Err(AppError::internal(err));
    }
    Ok(Json(HealthResponse {
        ok: true,
        msg: "healthy".to_string(),
    }))
}

pub async fn diag(State(state): State<AppState>) -> Result<Json<DiagResponse>, AppError> {
    if let Some(err) = state.store.load_error() {
        return Err(AppError::internal(err));
    }
    let cols = [
        ("COL_TANGGAL", COL_TANGGAL),
        ("COL_SEKSI", COL_SEKSI),
        ("COL_NAMA", COL_NAMA),
        ("COL_JANJANG", COL_JANJANG),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect::<BTreeMap<_, _>>();

    Ok(Json(DiagResponse {
        ok: true,
        rows: state.store.len(),
        dates_sample: state.store.dates().iter().take(5).map(date_key).collect(),
        cols,
    }))
}

pub async fn diag_env(State(state): State<AppState>) -> Json<EnvDiagResponse> {
    let config = &state.config;
    Json(EnvDiagResponse {
        ok: true,
        port: config.port,
        data_path: config.data_path.display().to_string(),
        api_url: config.api_url.clone(),
        has_api_url: config.api_url_from_env,
        sections: config.sections.clone(),
        roster_size: config.roster.len(),
        http_timeout_secs: config.http_timeout.as_secs(),
    })
}

pub async fn get_dates(State(state): State<AppState>) -> Json<DatesResponse> {
    Json(DatesResponse {
        dates: state.store.dates().iter().map(date_key).collect(),
    })
}

pub async fn get_years(State(state): State<AppState>) -> Json<YearsResponse> {
    Json(YearsResponse {
        years: state.store.years(),
    })
}

pub async fn get_months(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<MonthsResponse>, AppError> {
    let year = year_param(query.year.as_deref())?;
    Ok(Json(MonthsResponse {
        months: state.store.months(year),
    }))
}

pub async fn get_by_date(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<RowsResponse>, AppError> {
    let date = date_param(query.date.as_deref())?;
    Ok(Json(RowsResponse {
        ok: true,
        rows: state.store.rows_on(date),
    }))
}

pub async fn get_daily(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<GroupedDayResponse>, AppError> {
    let date = date_param(query.date.as_deref())?;
    let (by_seksi, total_all) = state.store.grouped_on(date);
    Ok(Json(GroupedDayResponse {
        by_seksi,
        total_all,
    }))
}

pub async fn get_month_series(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<LabeledSeriesResponse>, AppError> {
    let seksi = seksi_param(query.seksi.as_deref())?;
    let year = year_param(query.year.as_deref())?;
    let month = month_param(query.month.as_deref())?;
    Ok(Json(labeled(state.store.monthly_series(seksi, year, month))))
}

pub async fn get_year_series(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<LabeledSeriesResponse>, AppError> {
    let seksi = seksi_param(query.seksi.as_deref())?;
    let year = year_param(query.year.as_deref())?;
    Ok(Json(labeled(state.store.yearly_series(seksi, year))))
}

pub async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<CombinedSeriesResponse>, AppError> {
    let seksi = seksi_param(query.seksi.as_deref())?;
    let year = year_param(query.year.as_deref())?;
    let month = month_param(query.month.as_deref())?;
    Ok(Json(CombinedSeriesResponse {
        daily: points(state.store.monthly_series(seksi, year, month)),
        monthly: points(state.store.yearly_series(seksi, year)),
    }))
}

pub async fn chart_data_monthly(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<ChartDataResponse>, AppError> {
    let section = section_param(query.section.as_deref(), &state.config.sections)?;
    let year = year_param(query.year.as_deref())?;
    let month = month_param(query.month.as_deref())?;
    let data = points(state.store.monthly_series(&section, year, month));
    Ok(Json(ChartDataResponse {
        ok: true,
        section,
        year,
        month: Some(month),
        data,
    }))
}

pub async fn chart_data_yearly(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<ChartDataResponse>, AppError> {
    let section = section_param(query.section.as_deref(), &state.config.sections)?;
    let year = year_param(query.year.as_deref())?;
    let data = points(state.store.yearly_series(&section, year));
    Ok(Json(ChartDataResponse {
        ok: true,
        section,
        year,
        month: None,
        data,
    }))
}

fn labeled(series: Vec<(String, u64)>) -> LabeledSeriesResponse {
    let (labels, data): (Vec<String>, Vec<u64>) = series.into_iter().unzip();
    LabeledSeriesResponse {
        ok: true,
        labels,
        data,
    }
}

fn points(series: Vec<(String, u64)>) -> Vec<SeriesPoint> {
    series
        .into_iter()
        .map(|(x, y)| SeriesPoint { x, y })
        .collect()
}

fn date_param(value: Option<&str>) -> Result<NaiveDate, AppError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request("date is required"))?;
    parse_date(value).ok_or_else(|| AppError::bad_request(format!("invalid date '{value}'")))
}

fn seksi_param(value: Option<&str>) -> Result<&str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request("seksi is required"))
}

/// Missing section means the first configured one.
fn section_param(value: Option<&str>, sections: &[String]) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| sections.first().cloned())
        .ok_or_else(|| AppError::bad_request("section is required"))
}

/// Missing year means the current one.
fn year_param(value: Option<&str>) -> Result<i32, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(today().year()),
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|year| (1..=9999).contains(year))
            .ok_or_else(|| AppError::bad_request(format!("invalid year '{raw}'"))),
    }
}

/// Missing month means the current one.
fn month_param(value: Option<&str>) -> Result<u32, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(today().month()),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|month| (1..=12).contains(month))
            .ok_or_else(|| AppError::bad_request(format!("invalid month '{raw}'"))),
    }
}

fn date_key(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::config::Config;
    use crate::storage::RowStore;
    use crate::view::ViewController;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::time::Duration;

    fn state(store: RowStore) -> AppState {
        let config = Config::from_lookup(|_| None);
        let client = ApiClient::new(&config.api_url, Duration::from_secs(1)).unwrap();
        let controller = ViewController::new(client, config.sections.clone(), Vec::new());
        AppState::new(store, controller, config)
    }

    #[test]
    fn params_reject_bad_values() {
        assert!(date_param(None).is_err());
        assert!(date_param(Some("besok")).is_err());
        assert!(date_param(Some(" 2025-10-01 ")).is_ok());
        assert!(seksi_param(Some("  ")).is_err());
        assert_eq!(seksi_param(Some(" A III ")).unwrap(), "A III");
        assert!(year_param(Some("0")).is_err());
        assert_eq!(year_param(Some("2025")).unwrap(), 2025);
        assert!(month_param(Some("13")).is_err());
        assert_eq!(month_param(Some("7")).unwrap(), 7);
    }

    #[test]
    fn missing_year_and_month_default_to_today() {
        assert_eq!(year_param(None).unwrap(), today().year());
        assert_eq!(month_param(Some("")).unwrap(), today().month());
    }

    #[test]
    fn section_defaults_to_first_configured() {
        let sections = vec!["C II".to_string(), "D I".to_string()];
        assert_eq!(section_param(None, &sections).unwrap(), "C II");
        assert_eq!(section_param(Some(" D I "), &sections).unwrap(), "D I");
        assert!(section_param(Some(""), &[]).is_err());
    }

    #[tokio::test]
    async fn health_reports_load_failure() {
        assert!(health(State(state(RowStore::default()))).await.is_ok());

        let err = health(State(state(RowStore::failed("cannot parse data/panen.csv"))))
            .await
            .unwrap_err();
        assert_eq!(err.message, "cannot parse data/panen.csv");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn chart_data_yearly_omits_month() {
        let store = RowStore::new(vec![crate::models::Row {
            tanggal: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
            seksi: "A III".to_string(),
            nama: "Agus".to_string(),
            janjang: 11,
        }]);
        let query = ApiQuery {
            year: Some("2025".to_string()),
            ..ApiQuery::default()
        };
        let Json(body) = chart_data_yearly(State(state(store)), Query(query))
            .await
            .unwrap();
        assert_eq!(body.section, "A III");
        assert_eq!(body.month, None);
        assert_eq!(body.data.len(), 12);
        assert_eq!(body.data[2].y, 11);

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("month").is_none());
    }
}
