use crate::models::{Row, WorkerCount, count_from_str};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use tracing::{error, info, warn};

pub const COL_TANGGAL: &str = "Tanggal";
pub const COL_SEKSI: &str = "Seksi";
pub const COL_NAMA: &str = "Nama Pemanen";
pub const COL_JANJANG: &str = "Jumlah Janjang";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// One record of the harvest sheet export.
#[derive(Debug, Deserialize)]
struct SheetRecord {
    #[serde(rename = "Tanggal", default)]
    tanggal: String,
    #[serde(rename = "Seksi", default)]
    seksi: String,
    #[serde(rename = "Nama Pemanen", default)]
    nama: String,
    #[serde(rename = "Jumlah Janjang", default)]
    janjang: String,
}

/// All harvest rows known to the backend, sorted by date.
///
/// A store whose data file could not be read or parsed is empty and keeps
/// the failure in [`RowStore::load_error`] for the health check.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    load_error: Option<String>,
}

impl RowStore {
    pub fn new(mut rows: Vec<Row>) -> Self {
        rows.sort_by(|a, b| {
            a.tanggal
                .cmp(&b.tanggal)
                .then_with(|| a.seksi.cmp(&b.seksi))
                .then_with(|| a.nama.cmp(&b.nama))
        });
        Self {
            rows,
            load_error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            load_error: Some(message.into()),
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|row| row.tanggal).collect();
        dates.dedup();
        dates
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|row| row.tanggal.year()).collect();
        years.dedup();
        years
    }

    pub fn months(&self, year: i32) -> Vec<u32> {
        let mut months: Vec<u32> = self
            .rows
            .iter()
            .filter(|row| row.tanggal.year() == year)
            .map(|row| row.tanggal.month())
            .collect();
        months.dedup();
        months
    }

    pub fn rows_on(&self, date: NaiveDate) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| row.tanggal == date)
            .cloned()
            .collect()
    }

    /// Worker counts per section for one date, plus the day total.
    pub fn grouped_on(&self, date: NaiveDate) -> (BTreeMap<String, Vec<WorkerCount>>, u64) {
        let mut sums: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let mut total = 0u64;
        for row in self.rows.iter().filter(|row| row.tanggal == date) {
            let entry = sums
                .entry(row.seksi.clone())
                .or_default()
                .entry(row.nama.clone())
                .or_default();
            *entry = entry.saturating_add(row.janjang);
            total = total.saturating_add(row.janjang);
        }

        let grouped = sums
            .into_iter()
            .map(|(seksi, workers)| {
                let workers = workers
                    .into_iter()
                    .map(|(nama, janjang)| WorkerCount { nama, janjang })
                    .collect();
                (seksi, workers)
            })
            .collect();
        (grouped, total)
    }

    /// One zero-filled point per calendar day of the month, labelled
    /// `YYYY-MM-DD`. Empty when the month is invalid.
    pub fn monthly_series(&self, seksi: &str, year: i32, month: u32) -> Vec<(String, u64)> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };

        let mut points: Vec<(NaiveDate, u64)> = first
            .iter_days()
            .take_while(|date| date.month() == month)
            .map(|date| (date, 0))
            .collect();

        for row in self.section_rows(seksi, year) {
            if row.tanggal.month() == month {
                let index = row.tanggal.day0() as usize;
                points[index].1 = points[index].1.saturating_add(row.janjang);
            }
        }

        points
            .into_iter()
            .map(|(date, value)| (date.format("%Y-%m-%d").to_string(), value))
            .collect()
    }

    /// Twelve zero-filled points labelled `YYYY-MM`.
    pub fn yearly_series(&self, seksi: &str, year: i32) -> Vec<(String, u64)> {
        let mut totals = [0u64; 12];
        for row in self.section_rows(seksi, year) {
            let index = row.tanggal.month0() as usize;
            totals[index] = totals[index].saturating_add(row.janjang);
        }

        totals
            .iter()
            .enumerate()
            .map(|(index, value)| (format!("{year:04}-{:02}", index + 1), *value))
            .collect()
    }

    fn section_rows<'a>(&'a self, seksi: &'a str, year: i32) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.seksi == seksi && row.tanggal.year() == year)
    }
}

pub async fn load_store(path: &Path) -> RowStore {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("data file {} not found, starting empty", path.display());
            return RowStore::default();
        }
        Err(err) => {
            error!("failed to read data file: {err}");
            return RowStore::failed(format!("cannot read {}: {err}", path.display()));
        }
    };

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let parsed = if is_csv {
        parse_csv(&bytes)
    } else {
        serde_json::from_slice::<Vec<Row>>(&bytes).map_err(|err| err.to_string())
    };

    match parsed {
        Ok(rows) => {
            info!("loaded {} rows from {}", rows.len(), path.display());
            RowStore::new(rows)
        }
        Err(err) => {
            error!("failed to parse data file: {err}");
            RowStore::failed(format!("cannot parse {}: {err}", path.display()))
        }
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<SheetRecord>().enumerate() {
        let record = record.map_err(|err| err.to_string())?;
        let Some(tanggal) = parse_date(&record.tanggal) else {
            warn!(line = index + 2, value = %record.tanggal, "skipping row with unreadable date");
            continue;
        };
        rows.push(Row {
            tanggal,
            seksi: record.seksi,
            nama: record.nama,
            janjang: count_from_str(&record.janjang),
        });
    }
    Ok(rows)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(tanggal: NaiveDate, seksi: &str, nama: &str, janjang: u64) -> Row {
        Row {
            tanggal,
            seksi: seksi.to_string(),
            nama: nama.to_string(),
            janjang,
        }
    }

    fn store() -> RowStore {
        RowStore::new(vec![
            row(date(2025, 10, 2), "A III", "Agus", 12),
            row(date(2025, 9, 30), "A III", "Bagol", 4),
            row(date(2025, 10, 2), "A III", "Bagol", 8),
            row(date(2025, 10, 2), "C II", "Agus", 3),
            row(date(2024, 12, 31), "A III", "Agus", 1),
        ])
    }

    #[test]
    fn dates_years_months_are_distinct_and_ascending() {
        let store = store();
        assert_eq!(
            store.dates(),
            vec![date(2024, 12, 31), date(2025, 9, 30), date(2025, 10, 2)]
        );
        assert_eq!(store.years(), vec![2024, 2025]);
        assert_eq!(store.months(2025), vec![9, 10]);
        assert!(store.months(2023).is_empty());
    }

    #[test]
    fn grouped_on_sums_workers_per_section() {
        let (grouped, total) = store().grouped_on(date(2025, 10, 2));
        assert_eq!(total, 23);
        assert_eq!(grouped["A III"].len(), 2);
        assert_eq!(grouped["C II"][0].janjang, 3);
    }

    #[test]
    fn monthly_series_is_zero_filled() {
        let series = store().monthly_series("A III", 2025, 10);
        assert_eq!(series.len(), 31);
        assert_eq!(series[0], ("2025-10-01".to_string(), 0));
        assert_eq!(series[1], ("2025-10-02".to_string(), 20));
        assert!(store().monthly_series("A III", 2025, 13).is_empty());
    }

    #[test]
    fn yearly_series_has_twelve_months() {
        let series = store().yearly_series("A III", 2025);
        assert_eq!(series.len(), 12);
        assert_eq!(series[8], ("2025-09".to_string(), 4));
        assert_eq!(series[9], ("2025-10".to_string(), 20));
        assert_eq!(series.iter().map(|(_, v)| v).sum::<u64>(), 24);
    }

    #[test]
    fn parse_csv_reads_sheet_headers() {
        let csv = "Tanggal , Seksi,Nama Pemanen,Jumlah Janjang\n\
                   2025-10-01,A III,Agus,12\n\
                   01/10/2025,B III,Bagol,\n\
                   kemarin,C II,Cecep,5\n\
                   2025-10-02 07:30:00,D I,Dodi,abc\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].janjang, 12);
        assert_eq!(rows[1].tanggal, date(2025, 10, 1));
        assert_eq!(rows[1].janjang, 0);
        assert_eq!(rows[2].tanggal, date(2025, 10, 2));
        assert_eq!(rows[2].janjang, 0);
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2025-01-05"), Some(date(2025, 1, 5)));
        assert_eq!(parse_date("05/01/2025"), Some(date(2025, 1, 5)));
        assert_eq!(parse_date(""), None);
    }

    #[tokio::test]
    async fn load_store_missing_file_is_empty() {
        let mut path = std::env::temp_dir();
        path.push(format!("panen_missing_{}.csv", std::process::id()));
        let store = load_store(&path).await;
        assert!(store.is_empty());
        assert_eq!(store.load_error(), None);
    }

    #[tokio::test]
    async fn load_store_keeps_parse_failure() {
        let mut path = std::env::temp_dir();
        path.push(format!("panen_broken_{}.json", std::process::id()));
        std::fs::write(&path, "bukan json").unwrap();

        let store = load_store(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert!(store.is_empty());
        assert!(store.load_error().unwrap().contains("cannot parse"));
    }

    #[tokio::test]
    async fn load_store_reads_json_with_mixed_dates() {
        let mut path = std::env::temp_dir();
        path.push(format!("panen_rows_{}.json", std::process::id()));
        let body = r#"[
            {"tanggal":"2025-10-01","seksi":"A III","nama":"Agus","janjang":4},
            {"tanggal":"02/10/2025","seksi":"A III","nama":"Bagol","janjang":"6"}
        ]"#;
        std::fs::write(&path, body).unwrap();

        let store = load_store(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert_eq!(store.load_error(), None);
        assert_eq!(store.dates(), vec![date(2025, 10, 1), date(2025, 10, 2)]);
    }
}
