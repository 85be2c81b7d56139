use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/dashboard", get(handlers::dashboard))
        .route("/health", get(handlers::health))
        .route("/api/diag", get(handlers::diag))
        .route("/diag_sheets", get(handlers::diag))
        .route("/diag_env", get(handlers::diag_env))
        .route("/chart_data/monthly", get(handlers::chart_data_monthly))
        .route("/chart_data/yearly", get(handlers::chart_data_yearly))
        .route("/api/dates", get(handlers::get_dates))
        .route("/api/years", get(handlers::get_years))
        .route("/api/list_years", get(handlers::get_years))
        .route("/api/months", get(handlers::get_months))
        .route("/api/by-date", get(handlers::get_by_date))
        .route("/api/daily", get(handlers::get_daily))
        .route("/api/series/month", get(handlers::get_month_series))
        .route("/api/series_month", get(handlers::get_month_series))
        .route("/api/series/year", get(handlers::get_year_series))
        .route("/api/series_year", get(handlers::get_year_series))
        .route("/api/series", get(handlers::get_series))
        .with_state(state)
}
