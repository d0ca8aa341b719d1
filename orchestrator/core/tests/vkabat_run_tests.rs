// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end runs through the registry, orchestrator, aggregation and
//! report writer, with every provider endpoint served from memory.
//!
//! Covers:
//! - mixed success and failure across provider families
//! - length-mismatched results being excluded
//! - total failure ending in `NoData` with no files written

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use vkabat_core::application::{Orchestrator, VkabatService};
use vkabat_core::domain::config::VkabatConfig;
use vkabat_core::domain::polling::ManualClock;
use vkabat_core::domain::prediction::PredictionError;
use vkabat_core::domain::provider::PredictionRequest;
use vkabat_core::domain::sequence::Sequence;
use vkabat_core::domain::vkabat::VkabatError;
use vkabat_core::infrastructure::http::{Document, FetchError, Fetcher, Payload};
use vkabat_core::infrastructure::{ProviderRegistry, ReportWriter};

const PRABI: &str = "https://prabi.test/cgi-bin";
const JPRED_FORM: &str = "https://jpred.test/cgi-bin/jpred_form";
const JPRED_RESULTS: &str = "http://jpred.test/results";
const YASPIN: &str = "https://yaspin.test/programs/yaspinwww/";

/// Serves a fixed document per URL.
#[derive(Default)]
struct StaticSite {
    pages: HashMap<String, Document>,
}

impl StaticSite {
    fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Document {
                status,
                url: url.to_string(),
                location: None,
                body: body.to_string(),
            },
        );
        self
    }

    fn lookup(&self, url: &str) -> Result<Document, FetchError> {
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for StaticSite {
    async fn get(&self, url: &str) -> Result<Document, FetchError> {
        self.lookup(url)
    }

    async fn post(&self, url: &str, _payload: Payload) -> Result<Document, FetchError> {
        self.lookup(url)
    }
}

fn prabi_page(symbols: &str) -> String {
    let fonts: String = symbols.chars().map(|c| format!("<font>{}</font>", c)).collect();
    format!("<html><code>{}</code></html>", fonts)
}

fn config() -> VkabatConfig {
    let mut config = VkabatConfig::default();
    config.job_name = "lyso".to_string();
    config.providers.prabi.base_url = PRABI.to_string();
    config.providers.prabi.algorithms = vec!["gor1".to_string(), "dpm".to_string()];
    config.providers.jpred.form_url = JPRED_FORM.to_string();
    config.providers.jpred.results_base = JPRED_RESULTS.to_string();
    config.providers.yaspin.submit_url = YASPIN.to_string();
    config.providers.sympred.enabled = false;
    config
}

fn jpred_confirmation() -> &'static str {
    r#"<div id="content"><a href="x">http://jpred.test/cgi-bin/chklog?jp_E2E</a></div>"#
}

fn jpred_simple_url() -> String {
    format!("{}/jp_E2E/jp_E2E.simple.html", JPRED_RESULTS)
}

fn service(site: StaticSite, config: &VkabatConfig) -> VkabatService {
    let registry =
        ProviderRegistry::from_config(config, Arc::new(site), Arc::new(ManualClock::new())).unwrap();
    VkabatService::new(Orchestrator::new(registry.providers().to_vec()))
}

fn request() -> PredictionRequest {
    PredictionRequest::new(Sequence::parse("mkvl").unwrap(), "lyso")
}

#[tokio::test]
async fn test_partial_failure_still_produces_report() {
    let site = StaticSite::default()
        .page(&format!("{}/secpred_gor.pl", PRABI), 200, &prabi_page("hhte"))
        .page(&format!("{}/secpred_dpm.pl", PRABI), 200, &prabi_page("hhhe"))
        .page(JPRED_FORM, 200, jpred_confirmation())
        .page(&jpred_simple_url(), 200, "<code>MKVL\n-HH-\n</code>")
        .page(YASPIN, 503, "Service Unavailable");

    let config = config();
    let outcome = service(site, &config).run(&request()).await.unwrap();
    let report = &outcome.report;

    assert_eq!(report.columns, vec!["JPred", "dpm", "gor1"]);
    assert_eq!(report.vkabat_series(), vec![3.0, 1.0, 3.0, 3.0]);
    assert_eq!(report.records[0].count_c, 1);
    assert_eq!(report.records[0].count_h, 2);
    assert_eq!(report.records[0].pct_h.to_string(), "66.67");

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].provider, "YASPIN");
    assert!(matches!(
        outcome.failures[0].error,
        PredictionError::ProviderUnavailable(_)
    ));

    let dir = tempfile::tempdir().unwrap();
    let written = ReportWriter::new(dir.path()).write(report, false).unwrap();
    let series = std::fs::read_to_string(&written.series).unwrap();
    assert_eq!(series, "vkabat\n3.0\n1.0\n3.0\n3.0\n");
    assert!(written.json.is_none());
}

#[tokio::test]
async fn test_length_mismatch_excluded_from_matrix() {
    let site = StaticSite::default()
        .page(&format!("{}/secpred_gor.pl", PRABI), 200, &prabi_page("hhhhh"))
        .page(&format!("{}/secpred_dpm.pl", PRABI), 200, &prabi_page("eeee"))
        .page(JPRED_FORM, 503, "busy")
        .page(YASPIN, 503, "busy");

    let config = config();
    let outcome = service(site, &config).run(&request()).await.unwrap();

    assert_eq!(outcome.report.columns, vec!["dpm"]);
    assert!(outcome.report.records.iter().all(|r| r.n == 1 && r.vkabat == 1.0));
    assert!(outcome.failures.iter().any(|f| f.provider == "gor1"
        && f.error == PredictionError::LengthMismatch { expected: 4, actual: 5 }));
}

#[tokio::test]
async fn test_total_failure_writes_nothing() {
    let site = StaticSite::default();
    let config = config();

    let err = service(site, &config).run(&request()).await.unwrap_err();
    assert_eq!(err, VkabatError::NoData);

    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(dir.path());
    assert!(!writer.dataframe_path("lyso").exists());
    assert!(!writer.series_path("lyso").exists());
}
