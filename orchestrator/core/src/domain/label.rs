// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical secondary-structure alphabet shared by every provider after
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalLabel {
    #[serde(rename = "H")]
    Helix,
    #[serde(rename = "E")]
    Strand,
    #[serde(rename = "C")]
    Coil,
    #[serde(rename = "T")]
    Turn,
}

impl CanonicalLabel {
    pub const ALL: [CanonicalLabel; 4] = [
        CanonicalLabel::Helix,
        CanonicalLabel::Strand,
        CanonicalLabel::Coil,
        CanonicalLabel::Turn,
    ];

    pub fn symbol(self) -> char {
        match self {
            CanonicalLabel::Helix => 'H',
            CanonicalLabel::Strand => 'E',
            CanonicalLabel::Coil => 'C',
            CanonicalLabel::Turn => 'T',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'H' => Some(CanonicalLabel::Helix),
            'E' => Some(CanonicalLabel::Strand),
            'C' => Some(CanonicalLabel::Coil),
            'T' => Some(CanonicalLabel::Turn),
            _ => None,
        }
    }

    /// Slot in the `[H, E, C, T]` count array.
    pub fn index(self) -> usize {
        match self {
            CanonicalLabel::Helix => 0,
            CanonicalLabel::Strand => 1,
            CanonicalLabel::Coil => 2,
            CanonicalLabel::Turn => 3,
        }
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Render labels back into a compact string, mostly for logs.
pub fn labels_to_string(labels: &[CanonicalLabel]) -> String {
    labels.iter().map(|l| l.symbol()).collect()
}
