// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Label Normalizer
//!
//! Maps each provider family's raw per-residue symbols onto the canonical
//! `{H, E, C, T}` alphabet, and slices the fixed-width aligned text blocks
//! some providers return.
//!
//! # Mapping tables
//!
//! | Family  | Extra rules on top of identity |
//! |---------|--------------------------------|
//! | PRABI   | `T → C`                        |
//! | JPred   | `- → C`                        |
//! | YASPIN  | `- → C`                        |
//! | SymPred | `' ' → C`                      |
//!
//! A symbol missing from the table fails the whole result with
//! `PredictionError::Normalization`; nothing is dropped or defaulted.
//!
//! Normalizing twice gives the same labels as normalizing once. Canonical
//! input comes back unchanged for every family except PRABI, whose `T → C`
//! rule also applies to an already-canonical turn.

use std::collections::HashMap;

use crate::domain::label::CanonicalLabel;
use crate::domain::prediction::PredictionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    table: HashMap<char, CanonicalLabel>,
}

impl LabelMap {
    /// Every canonical symbol maps to itself.
    pub fn identity() -> Self {
        let table = CanonicalLabel::ALL
            .iter()
            .map(|label| (label.symbol(), *label))
            .collect();
        Self { table }
    }

    /// Add or replace a rule.
    pub fn with(mut self, raw: char, label: CanonicalLabel) -> Self {
        self.table.insert(raw, label);
        self
    }

    /// PRABI folds turns into coil.
    pub fn prabi() -> Self {
        Self::identity().with('T', CanonicalLabel::Coil)
    }

    /// Job-based providers emit `-` for unassigned residues.
    pub fn gapped() -> Self {
        Self::identity().with('-', CanonicalLabel::Coil)
    }

    /// SymPred leaves coil columns blank.
    pub fn blank_coil() -> Self {
        Self::identity().with(' ', CanonicalLabel::Coil)
    }

    pub fn map(&self, raw: char) -> Option<CanonicalLabel> {
        self.table.get(&raw).copied()
    }

    pub fn normalize(&self, raw: &str) -> Result<Vec<CanonicalLabel>, PredictionError> {
        raw.chars()
            .enumerate()
            .map(|(idx, symbol)| {
                self.map(symbol).ok_or(PredictionError::Normalization {
                    symbol,
                    position: idx + 1,
                })
            })
            .collect()
    }

    pub fn normalize_labels(&self, labels: &[CanonicalLabel]) -> Result<Vec<CanonicalLabel>, PredictionError> {
        let raw: String = labels.iter().map(|l| l.symbol()).collect();
        self.normalize(&raw)
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::identity()
    }
}

/// Column offset of a fixed-width block, taken from the amino-acid header
/// line: the tag itself plus the whitespace run that follows it.
pub fn column_offset(header_line: &str, tag: &str) -> Result<usize, PredictionError> {
    let tag_start = header_line
        .find(tag)
        .ok_or_else(|| PredictionError::Parse(format!("header line has no '{}' tag", tag)))?;
    let after_tag = tag_start + tag.len();
    let padding = header_line[after_tag..]
        .chars()
        .take_while(|c| *c == ' ')
        .count();

    if padding == 0 {
        return Err(PredictionError::Parse(format!(
            "no column padding after '{}' tag",
            tag
        )));
    }
    Ok(after_tag + padding)
}

/// Concatenate the columns of every aligned line from `offset` onwards.
pub fn slice_columns<'a, I>(lines: I, offset: usize) -> Result<String, PredictionError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for line in lines {
        let columns = line.get(offset..).ok_or_else(|| {
            PredictionError::Parse(format!(
                "aligned line shorter than column offset {}: {:?}",
                offset, line
            ))
        })?;
        out.push_str(columns);
    }
    Ok(out)
}
