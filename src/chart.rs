//! Chart specs and the registry that owns rendered chart instances.
//!
//! A chart is identified by a stable id such as `"A III-bulan"`. Rendering
//! an id that is already registered disposes the old instance first, so the
//! registry never holds two charts for one id.

use crate::models::Series;
use std::collections::BTreeMap;
use tracing::debug;

/// Headroom added above the largest bar.
pub const BAR_HEADROOM: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Time axis, value axis starting at zero.
    Line,
    /// Ranked categories on the vertical axis.
    HorizontalBar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: String,
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub data: Vec<u64>,
    pub animation: bool,
    pub value_min: f64,
    pub value_max: f64,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub fn chart_id(seksi: &str, kind: &str) -> String {
    format!("{seksi}-{kind}")
}

pub fn line_chart(id: impl Into<String>, title: impl Into<String>, series: Series) -> ChartSpec {
    let max = series.data.iter().copied().max().unwrap_or(0) as f64;
    ChartSpec {
        id: id.into(),
        kind: ChartKind::Line,
        title: title.into(),
        labels: series.labels,
        data: series.data,
        animation: false,
        value_min: 0.0,
        value_max: if max > 0.0 { max } else { 1.0 },
    }
}

/// Bar chart ranked by value, largest first, with 10% headroom.
pub fn ranked_bar_chart(
    id: impl Into<String>,
    title: impl Into<String>,
    series: Series,
) -> ChartSpec {
    let mut pairs: Vec<(String, u64)> = series.labels.into_iter().zip(series.data).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let max = pairs.first().map(|(_, value)| *value).unwrap_or(0) as f64;
    let (labels, data): (Vec<String>, Vec<u64>) = pairs.into_iter().unzip();
    ChartSpec {
        id: id.into(),
        kind: ChartKind::HorizontalBar,
        title: title.into(),
        labels,
        data,
        animation: false,
        value_min: 0.0,
        value_max: if max > 0.0 { max * BAR_HEADROOM } else { 1.0 },
    }
}

/// A chart currently held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInstance {
    pub spec: ChartSpec,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: BTreeMap<String, ChartInstance>,
    next_generation: u64,
    disposed: u64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disposes any chart under the same id, then registers the new one.
    pub fn render(&mut self, spec: ChartSpec) -> &ChartInstance {
        let id = spec.id.clone();
        if let Some(previous) = self.charts.remove(&id) {
            debug!(chart = %id, generation = previous.generation, "replacing chart");
            self.disposed += 1;
        }

        self.next_generation += 1;
        let instance = ChartInstance {
            spec,
            generation: self.next_generation,
        };
        self.charts.entry(id).or_insert(instance)
    }

    pub fn dispose(&mut self, id: &str) -> bool {
        let removed = self.charts.remove(id).is_some();
        if removed {
            self.disposed += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.disposed += self.charts.len() as u64;
        self.charts.clear();
    }

    pub fn get(&self, id: &str) -> Option<&ChartInstance> {
        self.charts.get(id)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Number of instances disposed since the registry was created.
    pub fn disposed(&self) -> u64 {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(&str, u64)]) -> Series {
        Series {
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            data: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }

    #[test]
    fn rendering_same_id_replaces_chart() {
        let mut registry = ChartRegistry::new();
        let first = registry
            .render(line_chart("A III-bulan", "A III", series(&[("01", 3)])))
            .generation;
        let second = registry
            .render(line_chart("A III-bulan", "A III", series(&[("01", 5)])))
            .generation;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.disposed(), 1);
        assert!(second > first);
        assert_eq!(registry.get("A III-bulan").unwrap().spec.data, vec![5]);
    }

    #[test]
    fn distinct_ids_coexist_and_clear_disposes_all() {
        let mut registry = ChartRegistry::new();
        registry.render(line_chart(chart_id("A III", "bulan"), "", Series::default()));
        registry.render(line_chart(chart_id("A III", "tahun"), "", Series::default()));
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.disposed(), 2);
        assert!(!registry.dispose("A III-bulan"));
    }

    #[test]
    fn ranked_bar_sorts_descending_with_headroom() {
        let spec = ranked_bar_chart(
            "A-workers",
            "A",
            series(&[("Agus", 5), ("Bagol", 20), ("Cecep", 10)]),
        );
        assert_eq!(spec.kind, ChartKind::HorizontalBar);
        assert_eq!(spec.labels, vec!["Bagol", "Cecep", "Agus"]);
        assert_eq!(spec.data, vec![20, 10, 5]);
        assert!((spec.value_max - 22.0).abs() < 1e-9);
        assert!(!spec.animation);
    }

    #[test]
    fn line_chart_starts_at_zero_without_animation() {
        let spec = line_chart("x", "x", series(&[("a", 4), ("b", 9)]));
        assert_eq!(spec.value_min, 0.0);
        assert_eq!(spec.value_max, 9.0);
        assert!(!spec.animation);
        assert!(line_chart("y", "y", Series::default()).is_empty());
    }
}
