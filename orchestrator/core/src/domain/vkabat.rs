// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Aggregation Engine
//!
//! Turns the collected `ResultSet` into one `VkabatRecord` per residue.
//!
//! For residue `i` with labels `L_i` drawn from every successful result:
//!
//! | Field | Definition |
//! |-------|------------|
//! | `N`   | `|L_i|`, the number of results (not providers) |
//! | `k`   | number of distinct labels in `L_i` |
//! | `n1`  | count of the most frequent label |
//! | `vkabat` | `k * N / n1` |
//!
//! Percentages are rounded to two decimals with exact decimal arithmetic
//! (round-half-to-even on the true ratio), so they never drift with binary
//! float rounding.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::label::CanonicalLabel;
use crate::domain::prediction::ResultSet;

/// Errors that abort a whole run.
#[derive(Debug, Error, PartialEq)]
pub enum VkabatError {
    #[error("No usable provider results; nothing to aggregate")]
    NoData,

    #[error("Residue {residue} has no predictions (division by zero)")]
    DivisionByZero { residue: usize },

    #[error("Provider '{0}' returned more than one result under the same name")]
    DuplicateProvider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Percentage held as an exact count of hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percentage {
    hundredths: u64,
}

impl Percentage {
    /// `count / total * 100`, rounded half-to-even at two decimals.
    pub fn from_ratio(count: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let numerator = count as u64 * 10_000;
        let total = total as u64;
        let quotient = numerator / total;
        let twice_remainder = (numerator % total) * 2;

        let hundredths = if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        };
        Some(Self { hundredths })
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-residue vkabat statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VkabatRecord {
    /// 1-based residue position
    pub residue: usize,
    pub count_h: usize,
    pub count_e: usize,
    pub count_c: usize,
    pub count_t: usize,
    pub total: usize,
    pub pct_h: Percentage,
    pub pct_e: Percentage,
    pub pct_c: Percentage,
    pub pct_t: Percentage,
    pub k: usize,
    pub n: usize,
    pub n1: usize,
    pub vkabat: f64,
}

impl VkabatRecord {
    /// Compute the statistics for the labels observed at one residue.
    pub fn from_labels<I>(residue: usize, labels: I) -> Result<Self, VkabatError>
    where
        I: IntoIterator<Item = CanonicalLabel>,
    {
        let mut counts = [0usize; 4];
        let mut n = 0usize;
        for label in labels {
            counts[label.index()] += 1;
            n += 1;
        }

        let total: usize = counts.iter().sum();
        if total == 0 {
            return Err(VkabatError::DivisionByZero { residue });
        }

        let pct = |label: CanonicalLabel| {
            Percentage::from_ratio(counts[label.index()], total)
                .ok_or(VkabatError::DivisionByZero { residue })
        };

        let k = counts.iter().filter(|c| **c > 0).count();
        let n1 = counts.iter().copied().max().unwrap_or(0);

        Ok(Self {
            residue,
            count_h: counts[CanonicalLabel::Helix.index()],
            count_e: counts[CanonicalLabel::Strand.index()],
            count_c: counts[CanonicalLabel::Coil.index()],
            count_t: counts[CanonicalLabel::Turn.index()],
            total,
            pct_h: pct(CanonicalLabel::Helix)?,
            pct_e: pct(CanonicalLabel::Strand)?,
            pct_c: pct(CanonicalLabel::Coil)?,
            pct_t: pct(CanonicalLabel::Turn)?,
            k,
            n,
            n1,
            vkabat: (k * n) as f64 / n1 as f64,
        })
    }
}

/// Read-only per-residue view over a `ResultSet`.
pub struct PredictionMatrix<'a> {
    results: &'a ResultSet,
}

impl<'a> PredictionMatrix<'a> {
    pub fn new(results: &'a ResultSet) -> Self {
        Self { results }
    }

    pub fn residue_count(&self) -> usize {
        self.results.residue_count()
    }

    /// Labels every result assigned to the residue at 0-based `index`.
    pub fn column(&self, index: usize) -> impl Iterator<Item = CanonicalLabel> + 'a {
        let results = self.results;
        results
            .iter()
            .filter_map(move |(_, labels)| labels.get(index).copied())
    }
}

/// Output of one aggregation: the label matrix plus the statistics.
#[derive(Debug, Clone, Serialize)]
pub struct VkabatReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub job_name: String,
    pub sequence: String,
    /// Result names, in column order
    pub columns: Vec<String>,
    /// `predictions[c][i]` is the label of column `c` at residue `i`
    pub predictions: Vec<Vec<CanonicalLabel>>,
    pub records: Vec<VkabatRecord>,
}

impl VkabatReport {
    pub fn residue_count(&self) -> usize {
        self.records.len()
    }

    /// Labels of every column at a 0-based residue index, in column order.
    pub fn row(&self, index: usize) -> Vec<CanonicalLabel> {
        self.predictions
            .iter()
            .filter_map(|column| column.get(index).copied())
            .collect()
    }

    pub fn vkabat_series(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.vkabat).collect()
    }
}

/// Compute one record per residue, in residue order.
pub fn aggregate(results: &ResultSet) -> Result<Vec<VkabatRecord>, VkabatError> {
    let matrix = PredictionMatrix::new(results);
    (0..matrix.residue_count())
        .map(|i| VkabatRecord::from_labels(i + 1, matrix.column(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::ProviderResult;
    use CanonicalLabel::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(Percentage::from_ratio(1, 3).unwrap().to_string(), "33.33");
        assert_eq!(Percentage::from_ratio(2, 3).unwrap().to_string(), "66.67");
        assert_eq!(Percentage::from_ratio(1, 2).unwrap().to_string(), "50.00");
        assert_eq!(Percentage::from_ratio(0, 7).unwrap().to_string(), "0.00");
        assert_eq!(Percentage::from_ratio(15, 15).unwrap().to_string(), "100.00");
        // 1/160 = 0.625% exactly; ties go to the even neighbour
        assert_eq!(Percentage::from_ratio(1, 160).unwrap().to_string(), "0.62");
        // 3/160 = 1.875%
        assert_eq!(Percentage::from_ratio(3, 160).unwrap().to_string(), "1.88");
        assert_eq!(Percentage::from_ratio(1, 0), None);
    }

    #[test]
    fn test_record_for_split_residue() {
        let record = VkabatRecord::from_labels(2, vec![Helix, Coil]).unwrap();
        assert_eq!(record.count_h, 1);
        assert_eq!(record.count_c, 1);
        assert_eq!(record.total, 2);
        assert_eq!(record.k, 2);
        assert_eq!(record.n, 2);
        assert_eq!(record.n1, 1);
        assert_eq!(record.vkabat, 4.0);
        assert_eq!(record.pct_h.to_string(), "50.00");
        assert_eq!(record.pct_e.to_string(), "0.00");
    }

    #[test]
    fn test_record_with_three_classes() {
        let labels = vec![Helix, Helix, Strand, Coil, Coil, Coil];
        let record = VkabatRecord::from_labels(1, labels).unwrap();
        assert_eq!(record.k, 3);
        assert_eq!(record.n1, 3);
        assert_eq!(record.vkabat, 6.0);
        assert_eq!(record.pct_e.to_string(), "16.67");
    }

    #[test]
    fn test_empty_residue_is_division_by_zero() {
        let err = VkabatRecord::from_labels(7, Vec::new()).unwrap_err();
        assert_eq!(err, VkabatError::DivisionByZero { residue: 7 });
    }

    #[test]
    fn test_aggregate_end_to_end_example() {
        let mut set = ResultSet::new(4);
        set.insert(ProviderResult::new("a", vec![Helix, Helix, Coil, Strand])).unwrap();
        set.insert(ProviderResult::new("b", vec![Helix, Coil, Coil, Strand])).unwrap();

        let records = aggregate(&set).unwrap();
        let vkabat: Vec<f64> = records.iter().map(|r| r.vkabat).collect();
        assert_eq!(vkabat, vec![1.0, 4.0, 1.0, 1.0]);

        assert_eq!(records[0].count_h, 2);
        assert_eq!(records[0].k, 1);
        assert_eq!(records[0].n1, 2);
        assert_eq!(records[1].k, 2);
        assert_eq!(records[1].n1, 1);
        assert_eq!(records[3].count_e, 2);
        assert_eq!(records.iter().map(|r| r.residue).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_aggregate_empty_set_fails() {
        let set = ResultSet::new(3);
        assert_eq!(aggregate(&set), Err(VkabatError::DivisionByZero { residue: 1 }));
    }

    #[test]
    fn test_counts_match_result_count() {
        let mut set = ResultSet::new(3);
        set.insert(ProviderResult::new("gor1", vec![Helix, Turn, Coil])).unwrap();
        set.insert(ProviderResult::new("dsc", vec![Strand, Turn, Coil])).unwrap();
        set.insert(ProviderResult::new("hnn", vec![Coil, Helix, Coil])).unwrap();

        for record in aggregate(&set).unwrap() {
            assert_eq!(
                record.count_h + record.count_e + record.count_c + record.count_t,
                record.n
            );
            assert_eq!(record.total, set.len());
            assert!(record.k >= 1 && record.k <= record.n.min(4));
            assert_eq!(
                record.n1,
                *[record.count_h, record.count_e, record.count_c, record.count_t]
                    .iter()
                    .max()
                    .unwrap()
            );
        }
    }
}
