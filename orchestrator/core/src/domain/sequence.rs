// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Protein sequence value object.
//!
//! Every prediction collected during a run is aligned against the residues
//! held here, so the sequence is validated once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence is empty")]
    Empty,

    #[error("Invalid residue '{symbol}' at position {position}")]
    InvalidResidue { symbol: char, position: usize },
}

/// Amino-acid sequence in one-letter codes, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence(String);

impl Sequence {
    /// Parse a raw sequence. Surrounding whitespace is ignored and lower-case
    /// letters are accepted; anything that is not an ASCII letter is rejected.
    pub fn parse(raw: &str) -> Result<Self, SequenceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SequenceError::Empty);
        }

        for (idx, symbol) in trimmed.chars().enumerate() {
            if !symbol.is_ascii_alphabetic() {
                return Err(SequenceError::InvalidResidue {
                    symbol,
                    position: idx + 1,
                });
            }
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Residue at a 1-based position.
    pub fn residue(&self, position: usize) -> Option<char> {
        if position == 0 {
            return None;
        }
        self.0.as_bytes().get(position - 1).map(|b| *b as char)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Sequence {
    type Error = SequenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Sequence> for String {
    fn from(value: Sequence) -> Self {
        value.0
    }
}
