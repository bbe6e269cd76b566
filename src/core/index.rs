use std::collections::BTreeMap;

use crate::core::CollisionRecord;

/// Derived per-year aggregate over the loaded records.
#[derive(Debug, Clone, PartialEq)]
pub struct YearAggregate {
    pub year: i32,

    /// Count of every record of this year, including records with no
    /// parseable time.
    pub total: u32,

    /// Count per hour of day. Only records with a present time contribute,
    /// so the hour counts may sum to less than `total`.
    pub hour_counts: [u32; 24],
}

impl YearAggregate {
    fn new(year: i32) -> Self {
        Self {
            year,
            total: 0,
            hour_counts: [0; 24],
        }
    }

    /// Largest single hour bucket.
    pub fn max_hour_count(&self) -> u32 {
        self.hour_counts.iter().copied().max().unwrap_or(0)
    }
}

/// Owns the loaded records and the derived year index.
///
/// Built once after load and never mutated; playback and the chart windows
/// only ever read from it.
#[derive(Debug, Default)]
pub struct DatasetIndex {
    records: Vec<CollisionRecord>,
    years: Vec<i32>,
    aggregates: BTreeMap<i32, YearAggregate>,
}

impl DatasetIndex {
    /// Build the index from raw records.
    ///
    /// Records without a year contribute to nothing; an empty input yields
    /// an empty index, which callers must treat as "no data" rather than
    /// an error.
    pub fn build(records: Vec<CollisionRecord>) -> Self {
        let mut aggregates: BTreeMap<i32, YearAggregate> = BTreeMap::new();

        for record in &records {
            let Some(year) = record.year else { continue };
            let agg = aggregates
                .entry(year)
                .or_insert_with(|| YearAggregate::new(year));
            agg.total += 1;
            if let Some(hour) = record.hour() {
                agg.hour_counts[hour as usize] += 1;
            }
        }

        // BTreeMap keys are already distinct and ascending
        let years: Vec<i32> = aggregates.keys().copied().collect();

        Self {
            records,
            years,
            aggregates,
        }
    }

    /// Distinct years present in the data, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of distinct years.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn aggregate(&self, year: i32) -> Option<&YearAggregate> {
        self.aggregates.get(&year)
    }

    /// All records of one year, for the map layer's point filter.
    pub fn records_in(&self, year: i32) -> impl Iterator<Item = &CollisionRecord> {
        self.records
            .iter()
            .filter(move |r| r.year == Some(year))
    }

    /// `(year, total)` pairs in year order, for the timeline line chart.
    pub fn year_series(&self) -> Vec<(i32, u32)> {
        self.years
            .iter()
            .map(|&y| (y, self.aggregates[&y].total))
            .collect()
    }

    /// Total record count, including records without a year.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
