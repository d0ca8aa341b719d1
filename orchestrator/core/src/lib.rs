// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Multi-provider secondary-structure prediction and vkabat statistics.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, provider adapters and the run orchestrator

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
