//! Page controller: fetches from the backend, aggregates and builds the
//! view model the renderer consumes.

use crate::chart::{ChartInstance, ChartRegistry, chart_id, line_chart, ranked_bar_chart};
use crate::client::ApiClient;
use crate::errors::ClientResult;
use crate::models::Series;
use crate::stats::{SectionTable, aggregate, fill_known_sections, ordered_sections, section_table};
use chrono::{Datelike, NaiveDate};
use tracing::{error, info, warn};

pub const KIND_WORKERS: &str = "workers";
pub const KIND_MONTH: &str = "bulan";
pub const KIND_YEAR: &str = "tahun";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSelection {
    pub month: u32,
    pub year_monthly: i32,
    pub year_yearly: i32,
}

impl ChartSelection {
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            month: today.month(),
            year_monthly: today.year(),
            year_yearly: today.year(),
        }
    }
}

/// What the user picked; anything left out falls back to defaults.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year_monthly: Option<i32>,
    pub year_yearly: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// Newest first.
    pub dates: Vec<NaiveDate>,
    pub selected_date: Option<NaiveDate>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub selection: ChartSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: Option<NaiveDate>,
    pub grand_total: u64,
    pub badges: Vec<Badge>,
    pub tables: Vec<SectionTable>,
    pub charts: Vec<ChartInstance>,
}

impl DayView {
    pub fn is_empty(&self) -> bool {
        self.grand_total == 0 && self.tables.iter().all(|table| !table.has_counts())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionCharts {
    pub seksi: String,
    pub monthly: Option<ChartInstance>,
    pub yearly: Option<ChartInstance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selectors: Selectors,
    pub day: DayView,
    pub charts: Vec<SectionCharts>,
    pub alerts: Vec<String>,
}

/// Owns the backend client and the chart registry for one dashboard.
pub struct ViewController {
    client: ApiClient,
    registry: ChartRegistry,
    sections: Vec<String>,
    roster: Vec<String>,
}

impl ViewController {
    pub fn new(client: ApiClient, sections: Vec<String>, roster: Vec<String>) -> Self {
        Self {
            client,
            registry: ChartRegistry::new(),
            sections,
            roster,
        }
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Fills the date, year and month dropdowns.
    pub async fn load_selectors(
        &self,
        request: &DashboardRequest,
        today: NaiveDate,
        alerts: &mut Vec<String>,
    ) -> Selectors {
        let defaults = ChartSelection::for_today(today);
        let selection = ChartSelection {
            month: request.month.filter(|m| (1..=12).contains(m)).unwrap_or(defaults.month),
            year_monthly: request.year_monthly.unwrap_or(defaults.year_monthly),
            year_yearly: request.year_yearly.unwrap_or(defaults.year_yearly),
        };

        let mut dates = report(self.client.dates().await, "tanggal", alerts).unwrap_or_default();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        let selected_date = request
            .date
            .filter(|date| dates.contains(date))
            .or_else(|| dates.first().copied());

        let mut years = report(self.client.years().await, "tahun", alerts).unwrap_or_default();
        for year in [selection.year_monthly, selection.year_yearly] {
            if !years.contains(&year) {
                years.push(year);
            }
        }
        years.sort_unstable();

        let mut months = report(self.client.months(selection.year_monthly).await, "bulan", alerts)
            .unwrap_or_default();
        if months.is_empty() {
            months = (1..=12).collect();
        } else if !months.contains(&selection.month) {
            months.push(selection.month);
        }
        months.sort_unstable();

        Selectors {
            dates,
            selected_date,
            years,
            months,
            selection,
        }
    }

    /// Fetches one day, aggregates it and renders one worker chart per
    /// section.
    pub async fn load_day(&mut self, date: NaiveDate) -> ClientResult<DayView> {
        let rows = self.client.rows_on(date).await?;
        let mut totals = aggregate(&rows);
        fill_known_sections(&mut totals, &self.sections);

        let sections = ordered_sections(&self.sections, &totals);
        let badges = sections
            .iter()
            .map(|seksi| Badge {
                label: seksi.clone(),
                value: totals.section_total(seksi),
            })
            .collect();

        let tables: Vec<SectionTable> = sections
            .iter()
            .map(|seksi| section_table(&totals, seksi, &self.roster))
            .collect();

        let mut charts = Vec::with_capacity(tables.len());
        for table in &tables {
            let series = Series {
                labels: table.workers.iter().map(|line| line.nama.clone()).collect(),
                data: table.workers.iter().map(|line| line.janjang).collect(),
            };
            let spec = ranked_bar_chart(chart_id(&table.seksi, KIND_WORKERS), &table.seksi, series);
            charts.push(self.registry.render(spec).clone());
        }

        info!(%date, rows = rows.len(), total = totals.grand_total, "loaded day");
        Ok(DayView {
            date: Some(date),
            grand_total: totals.grand_total,
            badges,
            tables,
            charts,
        })
    }

    /// A day view with every known section at zero.
    pub fn empty_day(&self, date: Option<NaiveDate>) -> DayView {
        let totals = aggregate(&[]);
        DayView {
            date,
            grand_total: 0,
            badges: self
                .sections
                .iter()
                .map(|seksi| Badge {
                    label: seksi.clone(),
                    value: 0,
                })
                .collect(),
            tables: self
                .sections
                .iter()
                .map(|seksi| section_table(&totals, seksi, &self.roster))
                .collect(),
            charts: Vec::new(),
        }
    }

    /// Renders the monthly and yearly line charts of every section.
    /// A failing section is reported in `alerts` and its chart skipped.
    pub async fn render_charts(
        &mut self,
        selection: ChartSelection,
        alerts: &mut Vec<String>,
    ) -> Vec<SectionCharts> {
        let sections = self.sections.clone();
        let mut result = Vec::with_capacity(sections.len());

        for seksi in sections {
            let monthly = match self
                .client
                .month_series(&seksi, selection.year_monthly, selection.month)
                .await
            {
                Ok(series) => {
                    let spec = line_chart(
                        chart_id(&seksi, KIND_MONTH),
                        format!("{seksi} · Bulanan"),
                        series,
                    );
                    Some(self.registry.render(spec).clone())
                }
                Err(err) => {
                    alerts.push(format!("Grafik bulanan {seksi}: {err}"));
                    self.registry.dispose(&chart_id(&seksi, KIND_MONTH));
                    None
                }
            };

            let yearly = match self.client.year_series(&seksi, selection.year_yearly).await {
                Ok(series) => {
                    let spec = line_chart(
                        chart_id(&seksi, KIND_YEAR),
                        format!("{seksi} · Tahunan"),
                        series,
                    );
                    Some(self.registry.render(spec).clone())
                }
                Err(err) => {
                    alerts.push(format!("Grafik tahunan {seksi}: {err}"));
                    self.registry.dispose(&chart_id(&seksi, KIND_YEAR));
                    None
                }
            };

            result.push(SectionCharts {
                seksi,
                monthly,
                yearly,
            });
        }

        result
    }

    /// Builds the whole page: selectors, the selected day and the charts.
    /// Failures never abort the page; they end up in `alerts`.
    pub async fn dashboard(
        &mut self,
        request: DashboardRequest,
        today: NaiveDate,
    ) -> DashboardView {
        let mut alerts = Vec::new();
        self.registry.clear();

        let selectors = self.load_selectors(&request, today, &mut alerts).await;

        let day = match selectors.selected_date {
            Some(date) => match self.load_day(date).await {
                Ok(day) => day,
                Err(err) => {
                    error!(%date, "failed to load day: {err}");
                    alerts.push(format!("Data {date}: {err}"));
                    self.empty_day(Some(date))
                }
            },
            None => self.empty_day(None),
        };

        let charts = self.render_charts(selectors.selection, &mut alerts).await;

        DashboardView {
            selectors,
            day,
            charts,
            alerts,
        }
    }
}

fn report<T>(result: ClientResult<T>, what: &str, alerts: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("failed to load {what} list: {err}");
            alerts.push(format!("Daftar {what}: {err}"));
            None
        }
    }
}
