// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod analysis;
pub mod orchestrator;

// Re-export use cases for convenience
pub use analysis::{AnalysisOutcome, VkabatService};
pub use orchestrator::{CollectedResults, Orchestrator};
