use crate::chart::{ChartInstance, ChartKind, ChartSpec};
use crate::stats::{SectionTable, WorkerLine};
use crate::view::{DashboardView, DayView, SectionCharts, Selectors};
use std::fmt::Write;

const MONTH_NAMES: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

const NO_DATA: &str = "Tidak ada data";

pub fn render_dashboard(view: &DashboardView) -> String {
    let selected = view
        .selectors
        .selected_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{ALERTS}}", &render_alerts(&view.alerts))
        .replace("{{DATE_FORM}}", &render_date_form(&view.selectors))
        .replace("{{SELECTED_DATE}}", &escape(&selected))
        .replace("{{BADGES}}", &render_badges(&view.day))
        .replace("{{TABLES}}", &render_tables(&view.day))
        .replace("{{CHART_FORM}}", &render_chart_form(&view.selectors, &selected))
        .replace("{{CHARTS}}", &render_chart_grid(&view.charts))
}

/// Formats a count with `.` as the thousands separator.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_alerts(alerts: &[String]) -> String {
    alerts
        .iter()
        .map(|alert| format!(r#"<div class="alert" role="alert">{}</div>"#, escape(alert)))
        .collect()
}

fn render_date_form(selectors: &Selectors) -> String {
    let mut options = String::new();
    if selectors.dates.is_empty() {
        options.push_str(r#"<option value="">Belum ada data</option>"#);
    }
    for date in &selectors.dates {
        let value = date.format("%Y-%m-%d").to_string();
        let selected = if Some(*date) == selectors.selected_date { " selected" } else { "" };
        let _ = write!(options, r#"<option value="{value}"{selected}>{value}</option>"#);
    }

    let selection = selectors.selection;
    format!(
        r#"<form class="controls" method="get" action="/dashboard">
        <label>Tanggal <select id="tanggalSel" name="tanggal">{options}</select></label>
        <input type="hidden" name="bulan" value="{}" />
        <input type="hidden" name="tahun_bulanan" value="{}" />
        <input type="hidden" name="tahun_tahunan" value="{}" />
        <button id="btnLoad" type="submit">Tampilkan</button>
      </form>"#,
        selection.month, selection.year_monthly, selection.year_yearly
    )
}

fn render_chart_form(selectors: &Selectors, selected_date: &str) -> String {
    let selection = selectors.selection;
    let months: String = selectors
        .months
        .iter()
        .map(|month| {
            let name = month_name(*month);
            let selected = if *month == selection.month { " selected" } else { "" };
            format!(r#"<option value="{month}"{selected}>{name}</option>"#)
        })
        .collect();

    let years = |current: i32| -> String {
        selectors
            .years
            .iter()
            .map(|year| {
                let selected = if *year == current { " selected" } else { "" };
                format!(r#"<option value="{year}"{selected}>{year}</option>"#)
            })
            .collect()
    };

    format!(
        r#"<form class="controls" method="get" action="/dashboard">
        <input type="hidden" name="tanggal" value="{}" />
        <label>Bulan <select id="bulanSel" name="bulan">{months}</select></label>
        <label>Tahun (bulanan) <select id="tahunBulananSel" name="tahun_bulanan">{}</select></label>
        <label>Tahun (tahunan) <select id="tahunTahunanSel" name="tahun_tahunan">{}</select></label>
        <button id="btnRender" type="submit">Render Grafik</button>
      </form>"#,
        escape(selected_date),
        years(selection.year_monthly),
        years(selection.year_yearly)
    )
}

fn render_badges(day: &DayView) -> String {
    let mut out = format!(
        r#"<div class="stat total"><span class="label">Total hari ini</span><span id="totalAll" class="value">{}</span></div>"#,
        format_count(day.grand_total)
    );
    for badge in &day.badges {
        let _ = write!(
            out,
            r#"<div class="stat"><span class="label">{}</span><span class="value" data-seksi="{}">{}</span></div>"#,
            escape(&badge.label),
            escape(&badge.label),
            format_count(badge.value)
        );
    }
    out
}

fn render_tables(day: &DayView) -> String {
    day.tables
        .iter()
        .map(|table| {
            let chart = day
                .charts
                .iter()
                .find(|chart| chart.spec.title == table.seksi)
                .map(render_chart)
                .unwrap_or_default();
            format!(
                r#"<div class="card"><h3>{}</h3>{}{}</div>"#,
                escape(&table.seksi),
                render_table(table),
                chart
            )
        })
        .collect()
}

fn render_table(table: &SectionTable) -> String {
    if table.workers.is_empty() {
        return format!(r#"<p class="placeholder">{NO_DATA}</p>"#);
    }

    let row = |line: &WorkerLine, class: &str| {
        format!(
            r#"<tr class="{class}"><td>{}</td><td class="num">{}</td></tr>"#,
            escape(&line.nama),
            format_count(line.janjang)
        )
    };

    let body: String = table.workers.iter().map(|line| row(line, "")).collect();
    format!(
        r#"<table><thead><tr><th>Nama</th><th class="num">Janjang</th></tr></thead><tbody>{body}{}</tbody></table>"#,
        row(&table.total_line(), "total")
    )
}

fn render_chart_grid(charts: &[SectionCharts]) -> String {
    let mut out = String::new();
    for section in charts {
        for (kind, chart) in [("bulan", &section.monthly), ("tahun", &section.yearly)] {
            let body = match chart {
                Some(chart) => render_chart(chart),
                None => format!(r#"<p class="placeholder">{NO_DATA}</p>"#),
            };
            let _ = write!(
                out,
                r#"<div class="card" data-seksi="{}" data-kind="{kind}">{body}</div>"#,
                escape(&section.seksi)
            );
        }
    }
    out
}

fn render_chart(chart: &ChartInstance) -> String {
    let spec = &chart.spec;
    let body = if spec.is_empty() || spec.data.iter().all(|value| *value == 0) {
        format!(r#"<p class="placeholder">{NO_DATA}</p>"#)
    } else {
        match spec.kind {
            ChartKind::Line => svg_line_chart(spec),
            ChartKind::HorizontalBar => svg_bar_chart(spec),
        }
    };
    format!(
        r#"<figure class="chart" data-chart-id="{}" data-generation="{}"><figcaption>{}</figcaption>{body}</figure>"#,
        escape(&spec.id),
        chart.generation,
        escape(&spec.title)
    )
}

fn svg_line_chart(spec: &ChartSpec) -> String {
    let width = 600.0;
    let height = 260.0;
    let padding_x = 44.0;
    let padding_y = 34.0;
    let top = 24.0;

    let min = spec.value_min;
    let max = if spec.value_max > min { spec.value_max } else { min + 1.0 };
    let range = max - min;
    let count = spec.data.len();
    let x_step = if count > 1 {
        (width - padding_x * 2.0) / (count - 1) as f64
    } else {
        0.0
    };
    let scale_y = (height - top - padding_y) / range;
    let x = |index: usize| padding_x + index as f64 * x_step;
    let y = |value: f64| height - padding_y - (value - min) * scale_y;

    let mut svg = format!(
        r#"<svg viewBox="0 0 {width} {height}" role="img" aria-label="{}">"#,
        escape(&spec.title)
    );

    let ticks = 4;
    for i in 0..=ticks {
        let value = min + range * i as f64 / ticks as f64;
        let y_pos = y(value);
        let _ = write!(
            svg,
            r#"<line class="chart-grid" x1="{padding_x}" y1="{y_pos:.2}" x2="{}" y2="{y_pos:.2}" /><text class="chart-label" x="{}" y="{:.2}" text-anchor="end">{}</text>"#,
            width - padding_x,
            padding_x - 10.0,
            y_pos + 4.0,
            format_count(value.round() as u64)
        );
    }

    let path: Vec<String> = spec
        .data
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{command} {:.2} {:.2}", x(index), y(*value as f64))
        })
        .collect();
    let _ = write!(svg, r#"<path class="chart-line" d="{}" />"#, path.join(" "));

    for (index, value) in spec.data.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<circle class="chart-point" cx="{:.2}" cy="{:.2}" r="3" />"#,
            x(index),
            y(*value as f64)
        );
    }

    let label_every = count.div_ceil(8).max(1);
    for (index, label) in spec.labels.iter().enumerate() {
        if index % label_every != 0 {
            continue;
        }
        let short = label.get(5..).filter(|s| !s.is_empty()).unwrap_or(label);
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{:.2}" y="{}" text-anchor="middle">{}</text>"#,
            x(index),
            height - padding_y + 18.0,
            escape(short)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn svg_bar_chart(spec: &ChartSpec) -> String {
    let width = 600.0;
    let label_width = 120.0;
    let padding_right = 56.0;
    let bar_height = 22.0;
    let gap = 8.0;
    let top = 8.0;
    let height = top * 2.0 + spec.data.len() as f64 * (bar_height + gap);

    let max = if spec.value_max > 0.0 { spec.value_max } else { 1.0 };
    let scale = (width - label_width - padding_right) / max;

    let mut svg = format!(
        r#"<svg viewBox="0 0 {width} {height}" role="img" aria-label="{}">"#,
        escape(&spec.title)
    );
    for (index, (label, value)) in spec.labels.iter().zip(&spec.data).enumerate() {
        let y = top + index as f64 * (bar_height + gap);
        let bar = *value as f64 * scale;
        let _ = write!(
            svg,
            r#"<text class="chart-label" x="{}" y="{:.2}" text-anchor="end">{}</text><rect class="chart-bar" x="{label_width}" y="{y:.2}" width="{bar:.2}" height="{bar_height}" rx="4" /><text class="chart-label" x="{:.2}" y="{:.2}">{}</text>"#,
            label_width - 8.0,
            y + bar_height * 0.7,
            escape(label),
            label_width + bar + 6.0,
            y + bar_height * 0.7,
            format_count(*value)
        );
    }
    svg.push_str("</svg>");
    svg
}

fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("?")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Dashboard Izul Janjang</title>
  <style>
    :root {
      --bg-1: #eef5e9;
      --ink: #23301f;
      --accent: #d9822b;
      --accent-2: #2f5d3a;
      --card: rgba(255, 255, 255, 0.92);
      --shadow: 0 18px 40px rgba(47, 93, 58, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: linear-gradient(160deg, var(--bg-1), #f8f4e8 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 18px 48px;
    }

    .app {
      width: min(1180px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-family: "Georgia", serif;
    }

    h3 {
      margin: 0 0 10px;
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: end;
    }

    select,
    button {
      font: inherit;
      padding: 8px 12px;
      border-radius: 10px;
      border: 1px solid rgba(47, 93, 58, 0.25);
    }

    button {
      background: var(--accent-2);
      color: white;
      cursor: pointer;
    }

    .alert {
      background: #fde8e4;
      color: #9c2b1c;
      border-radius: 12px;
      padding: 10px 14px;
    }

    .panel,
    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 16px;
    }

    .panel {
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
    }

    .stat,
    .card {
      background: var(--card);
      border-radius: 16px;
      padding: 16px;
      box-shadow: var(--shadow);
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #6d7a67;
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .stat.total .value {
      color: var(--accent);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    td,
    th {
      padding: 4px 6px;
      border-bottom: 1px solid rgba(47, 93, 58, 0.1);
      text-align: left;
    }

    .num {
      text-align: right;
    }

    tr.total td {
      font-weight: 600;
    }

    .placeholder {
      color: #8b9386;
      font-style: italic;
    }

    .chart {
      margin: 12px 0 0;
    }

    .chart svg {
      width: 100%;
      display: block;
    }

    .chart-line {
      fill: none;
      stroke: var(--accent);
      stroke-width: 2.5;
    }

    .chart-point {
      fill: white;
      stroke: var(--accent);
      stroke-width: 2;
    }

    .chart-bar {
      fill: var(--accent-2);
    }

    .chart-grid {
      stroke: rgba(47, 93, 58, 0.12);
    }

    .chart-label {
      fill: #6d7a67;
      font-size: 11px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Dashboard Izul Janjang</h1>
    </header>

    {{ALERTS}}

    <section>
      {{DATE_FORM}}
    </section>

    <section class="panel" data-date="{{SELECTED_DATE}}">
      {{BADGES}}
    </section>

    <section class="grid" id="tables">
      {{TABLES}}
    </section>

    <section>
      {{CHART_FORM}}
    </section>

    <section class="grid" id="chartGrid">
      {{CHARTS}}
    </section>
  </main>
</body>
</html>
"#;
