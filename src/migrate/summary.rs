use std::fmt::Display;

use chrono::{SecondsFormat, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};

use super::options::Outcome;

/// Outcome counts of a run.
///
/// Serializes to a map from outcome names to counts, following the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    counts: [i64; 7],
    ordering: [Outcome; 7],
}

impl Default for Summary {
    fn default() -> Self {
        Self::new(Outcome::ALL)
    }
}

impl Summary {
    pub fn new(ordering: [Outcome; 7]) -> Self {
        Self {
            counts: [0; 7],
            ordering,
        }
    }

    pub fn get(&self, outcome: Outcome) -> i64 {
        self.counts[outcome.position()]
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.counts[outcome.position()] += 1;
    }

    /// `(outcome, count)` pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, i64)> + '_ {
        self.ordering
            .iter()
            .map(|outcome| (*outcome, self.get(*outcome)))
    }

    /// Counts unused source keys: `distinct` minus every deducted outcome, folded in
    /// reporting order with `Unused` last. The count goes negative when more target rows
    /// were deducted than there are source keys.
    pub(crate) fn finalize_unused(&mut self, distinct: usize, deductions: &[Outcome]) {
        // Key counts are bounded by the sheet size
        let unused = self
            .ordering
            .iter()
            .filter(|outcome| **outcome != Outcome::Unused)
            .filter(|outcome| deductions.contains(*outcome))
            .fold(distinct as i64, |remaining, outcome| {
                remaining - self.get(*outcome)
            });
        self.counts[Outcome::Unused.position()] = unused;
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.ordering.len()))?;
        for (outcome, count) in self.iter() {
            map.serialize_entry(outcome.name(), &count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Read,
    Write,
    Done,
}

/// A snapshot of a run, emitted every batch of rows and once at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub phase: Phase,
    /// Rows processed so far, over both phases
    pub rows_processed: usize,
    pub summary: Summary,
}

/// The final report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Target rows matched plus target rows that could not be matched
    pub processed: i64,
    pub unmatched: i64,
    /// Distinct keys found in the sources
    pub found: i64,
    pub filled_in: i64,
    pub overwritten: i64,
    pub different: i64,
    pub ignored: i64,
    pub unused: i64,
    pub redundant: i64,
    pub summary: Summary,
    pub run_at: String,
}

impl MigrationReport {
    pub fn new(summary: Summary, distinct: usize) -> Self {
        let unmatched = summary.get(Outcome::Mismatched);
        // Key counts are bounded by the sheet size
        let found = distinct as i64;
        Self {
            processed: found + unmatched,
            unmatched,
            found,
            filled_in: summary.get(Outcome::FilledIn),
            overwritten: summary.get(Outcome::Overwritten),
            different: summary.get(Outcome::Different),
            ignored: summary.get(Outcome::Ignored),
            unused: summary.get(Outcome::Unused),
            redundant: summary.get(Outcome::Redundant),
            summary,
            run_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "------------------------------------------")?;
        writeln!(f, "Migration results ({}):", self.run_at)?;
        writeln!(f, "    {} records processed", self.processed)?;
        writeln!(f, "        {} target rows did not match the sources", self.unmatched)?;
        writeln!(f, "        {} records found in the sources", self.found)?;
        writeln!(f, "            {} values filled in", self.filled_in)?;
        writeln!(f, "            {} values overwritten", self.overwritten)?;
        writeln!(f, "            {} different values kept", self.different)?;
        writeln!(f, "            {} unchanged values skipped", self.ignored)?;
        writeln!(f, "            {} records unused", self.unused)?;
        writeln!(f, "            ---")?;
        writeln!(f, "            {} records with multiple values", self.redundant)?;
        write!(f, "------------------------------------------")
    }
}
