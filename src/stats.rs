use crate::models::Row;
use std::collections::BTreeMap;

pub const TOTAL_LABEL: &str = "Total";

/// Presentation totals for one set of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub grand_total: u64,
    pub totals_by_section: BTreeMap<String, u64>,
    pub totals_by_worker_per_section: BTreeMap<String, BTreeMap<String, u64>>,
}

impl Aggregate {
    pub fn section_total(&self, seksi: &str) -> u64 {
        self.totals_by_section.get(seksi).copied().unwrap_or(0)
    }

    pub fn worker_total(&self, seksi: &str, nama: &str) -> u64 {
        self.totals_by_worker_per_section
            .get(seksi)
            .and_then(|workers| workers.get(nama))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLine {
    pub nama: String,
    pub janjang: u64,
}

/// Worker table for one section, ending with the synthetic total line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTable {
    pub seksi: String,
    pub workers: Vec<WorkerLine>,
    pub total: u64,
}

impl SectionTable {
    pub fn total_line(&self) -> WorkerLine {
        WorkerLine {
            nama: TOTAL_LABEL.to_string(),
            janjang: self.total,
        }
    }

    pub fn has_counts(&self) -> bool {
        self.workers.iter().any(|line| line.janjang > 0)
    }
}

pub fn aggregate(rows: &[Row]) -> Aggregate {
    let mut result = Aggregate::default();

    for row in rows {
        result.grand_total = result.grand_total.saturating_add(row.janjang);

        let section = result.totals_by_section.entry(row.seksi.clone()).or_default();
        *section = section.saturating_add(row.janjang);

        let worker = result
            .totals_by_worker_per_section
            .entry(row.seksi.clone())
            .or_default()
            .entry(row.nama.clone())
            .or_default();
        *worker = worker.saturating_add(row.janjang);
    }

    result
}

/// Section names in display order: the known sections first, then any
/// other section present in the totals.
pub fn ordered_sections(known: &[String], aggregate: &Aggregate) -> Vec<String> {
    let mut sections: Vec<String> = known.to_vec();
    for seksi in aggregate.totals_by_section.keys() {
        if !sections.contains(seksi) {
            sections.push(seksi.clone());
        }
    }
    sections
}

/// Ensures every known section has an entry, zero when absent.
pub fn fill_known_sections(aggregate: &mut Aggregate, known: &[String]) {
    for seksi in known {
        aggregate.totals_by_section.entry(seksi.clone()).or_insert(0);
        aggregate
            .totals_by_worker_per_section
            .entry(seksi.clone())
            .or_default();
    }
}

/// Builds the worker table of a section.
///
/// With an empty roster only workers that have rows are listed, highest
/// count first. With a roster every roster worker is listed in roster
/// order (zero when absent), followed by any off-roster worker that has
/// rows, so the table always sums to the section total.
pub fn section_table(aggregate: &Aggregate, seksi: &str, roster: &[String]) -> SectionTable {
    let empty = BTreeMap::new();
    let counts = aggregate
        .totals_by_worker_per_section
        .get(seksi)
        .unwrap_or(&empty);

    let mut workers: Vec<WorkerLine> = roster
        .iter()
        .map(|nama| WorkerLine {
            nama: nama.clone(),
            janjang: counts.get(nama).copied().unwrap_or(0),
        })
        .collect();

    let mut extra: Vec<WorkerLine> = counts
        .iter()
        .filter(|(nama, _)| !roster.contains(*nama))
        .map(|(nama, janjang)| WorkerLine {
            nama: nama.clone(),
            janjang: *janjang,
        })
        .collect();
    extra.sort_by(|a, b| b.janjang.cmp(&a.janjang).then_with(|| a.nama.cmp(&b.nama)));
    workers.extend(extra);

    let total = workers
        .iter()
        .fold(0u64, |acc, line| acc.saturating_add(line.janjang));

    SectionTable {
        seksi: seksi.to_string(),
        workers,
        total,
    }
}
