// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Sequence, label alphabet, prediction results, polling state machine,
//! vkabat statistics and the run configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and computations; no network access

pub mod config;
pub mod label;
pub mod normalizer;
pub mod polling;
pub mod prediction;
pub mod provider;
pub mod sequence;
pub mod vkabat;
