// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod extract;
pub mod http;
pub mod providers;
pub mod report_writer;

pub use http::{Fetcher, ReqwestFetcher};
pub use providers::ProviderRegistry;
pub use report_writer::ReportWriter;
