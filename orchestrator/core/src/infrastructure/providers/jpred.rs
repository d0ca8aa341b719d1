// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// JPred Provider Adapter
//
// Asynchronous, job-based. Two submission paths share one result format:
//
// - Form API (default): multipart POST to the web form, job id read from the
//   "chklog?" link of the confirmation page, then the simple result page is
//   polled directly (404 while running).
// - REST API: raw POST to the REST job endpoint, job id from the Location
//   header, then the slow text status endpoint is polled until it reports
//   the job finished, and the simple result page is fetched once.
//
// The simple page holds the prediction on the odd lines of its <code> block,
// with '-' for unassigned residues.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::config::{JpredApi, JpredConfig};
use crate::domain::label::CanonicalLabel;
use crate::domain::normalizer::LabelMap;
use crate::domain::polling::{Clock, JobProbe};
use crate::domain::prediction::{Prediction, PredictionError, ProviderFailure, ProviderResult};
use crate::domain::provider::{PredictionProvider, PredictionRequest};
use crate::infrastructure::extract::Markup;
use crate::infrastructure::http::{Document, FormField, Fetcher, Payload};

use super::{expect_status, job_id_from_link, probe_result_page};

pub const RESULT_NAME: &str = "JPred";

/// Field separator of the REST submission body
const REST_SEPARATOR: &str = "£€£€";

pub struct JpredAdapter {
    config: JpredConfig,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    labels: LabelMap,
}

impl JpredAdapter {
    pub fn new(config: JpredConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            fetcher,
            clock,
            labels: LabelMap::gapped(),
        }
    }

    fn simple_result_url(&self, job_id: &str) -> String {
        format!(
            "{}/{}/{}.simple.html",
            self.config.results_base.trim_end_matches('/'),
            job_id,
            job_id
        )
    }

    fn rest_base(&self) -> &str {
        self.config.rest_url.trim_end_matches('/')
    }

    async fn run(&self, request: &PredictionRequest) -> Result<Vec<CanonicalLabel>, PredictionError> {
        let started = self.clock.now();
        let body = match self.config.api {
            JpredApi::Form => self.run_form(request, started).await?,
            JpredApi::Rest => self.run_rest(request, started).await?,
        };
        let elapsed = self.clock.now().saturating_duration_since(started);
        info!(provider = RESULT_NAME, elapsed_secs = elapsed.as_secs(), "Job complete");

        let raw = extract_prediction(&body)?;
        self.labels.normalize(&raw)
    }

    async fn run_form(&self, request: &PredictionRequest, started: Instant) -> Result<String, PredictionError> {
        let fields = vec![
            FormField::text("seq", request.sequence.as_str()),
            FormField::empty_file("fileup"),
            FormField::text("input", "seq"),
            FormField::text("pdb", "on"),
            FormField::text("email", request.email.as_str()),
            FormField::text("queryName", request.job_name.as_str()),
        ];
        let doc = self
            .fetcher
            .post(&self.config.form_url, Payload::Multipart(fields))
            .await?;
        expect_status(&doc, &[200], RESULT_NAME)?;

        let link = Markup::new(&doc.body).by_id("div", "content")?.first("a")?.text();
        let job_id = job_id_from_link(&link)?;
        info!(provider = RESULT_NAME, job_id = %job_id, "Job submitted");

        let url = self.simple_result_url(&job_id);
        let fetcher = self.fetcher.as_ref();
        let url = url.as_str();
        self.config
            .polling()
            .run(self.clock.as_ref(), started, &job_id, move || {
                probe_result_page(fetcher, url, &[404])
            })
            .await
            .into_body()
    }

    async fn run_rest(&self, request: &PredictionRequest, started: Instant) -> Result<String, PredictionError> {
        let body = [
            "skipPDB=on".to_string(),
            "format=seq".to_string(),
            format!("email={}", request.email),
            format!("name={}", request.job_name),
            format!(">query\n{}", request.sequence),
        ]
        .join(REST_SEPARATOR);

        let url = format!("{}/job", self.rest_base());
        let doc = self
            .fetcher
            .post(
                &url,
                Payload::Raw {
                    content_type: "text/txt".to_string(),
                    body,
                },
            )
            .await?;
        expect_status(&doc, &[202, 200], RESULT_NAME)?;

        let job_id = rest_job_id(&doc)?;
        info!(provider = RESULT_NAME, job_id = %job_id, "Job submitted");

        let status_url = format!("{}/job/id/{}", self.rest_base(), job_id);
        let fetcher = self.fetcher.as_ref();
        let status_url = status_url.as_str();
        self.config
            .polling()
            .run(self.clock.as_ref(), started, &job_id, move || async move {
                let doc = fetcher.get(status_url).await.map_err(PredictionError::from)?;
                classify_status(&doc)
            })
            .await
            .into_body()?;

        let doc = self.fetcher.get(&self.simple_result_url(&job_id)).await?;
        expect_status(&doc, &[200], RESULT_NAME)?;
        Ok(doc.body)
    }
}

/// Job id from the Location header, or from the first link of the body.
fn rest_job_id(doc: &Document) -> Result<String, PredictionError> {
    if let Some(location) = &doc.location {
        return job_id_from_link(location);
    }
    let link = Markup::new(&doc.body).first("a")?.text();
    job_id_from_link(&link)
}

/// Interpret one response of the REST status endpoint.
fn classify_status(doc: &Document) -> Result<JobProbe, PredictionError> {
    if doc.status != 200 {
        return Ok(JobProbe::Unexpected(doc.status));
    }
    let text = doc.body.as_str();
    if text.contains("finished") || text.contains("100% complete") {
        Ok(JobProbe::Ready(doc.body.clone()))
    } else if text.contains("complete...") {
        Ok(JobProbe::NotReady)
    } else {
        Err(PredictionError::Parse(format!(
            "unrecognised job status: {}",
            text.lines().next().unwrap_or_default()
        )))
    }
}

/// Concatenate the odd-numbered lines of the first <code> block.
fn extract_prediction(body: &str) -> Result<String, PredictionError> {
    let text = Markup::new(body).first("code")?.text();
    let prediction: String = text
        .split('\n')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, line)| line.trim_end_matches('\r'))
        .collect();

    if prediction.is_empty() {
        return Err(PredictionError::Parse("empty JPred prediction block".to_string()));
    }
    Ok(prediction)
}

#[async_trait]
impl PredictionProvider for JpredAdapter {
    fn name(&self) -> &str {
        RESULT_NAME
    }

    async fn predict(&self, request: &PredictionRequest) -> Vec<Prediction> {
        info!(api = ?self.config.api, "Running JPred");
        let outcome = self
            .run(request)
            .await
            .map(|labels| ProviderResult::new(RESULT_NAME, labels))
            .map_err(|e| {
                warn!(provider = RESULT_NAME, error = %e, "Prediction failed");
                ProviderFailure::new(RESULT_NAME, e)
            });
        vec![outcome]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::labels_to_string;
    use crate::domain::polling::ManualClock;
    use crate::domain::sequence::Sequence;
    use crate::infrastructure::providers::testing::{doc, ScriptedFetcher};
    use std::time::Duration;

    const FORM: &str = "https://jpred.test/cgi-bin/jpred_form";
    const RESULTS: &str = "http://jpred.test/results";
    const REST: &str = "http://jpred.test/cgi-bin/rest";

    const CONFIRMATION: &str = r#"<html><body>
<div id="header"><a href="/">JPred</a></div>
<div id="content"><p>Your job has been submitted.</p>
<a href="http://jpred.test/cgi-bin/chklog?jp_Ab12">http://jpred.test/cgi-bin/chklog?jp_Ab12</a>
</div></body></html>"#;

    const SIMPLE: &str = "<html><body><code>MKVLAA\n-HHEE-\n</code></body></html>";

    fn config(api: JpredApi, timeout_secs: u64) -> JpredConfig {
        JpredConfig {
            api,
            timeout_secs,
            form_url: FORM.to_string(),
            results_base: RESULTS.to_string(),
            rest_url: REST.to_string(),
            ..JpredConfig::default()
        }
    }

    fn request() -> PredictionRequest {
        PredictionRequest::new(Sequence::parse("MKVLAA").unwrap(), "lyso").with_email("a@b.org")
    }

    fn simple_url() -> String {
        format!("{}/jp_Ab12/jp_Ab12.simple.html", RESULTS)
    }

    #[tokio::test]
    async fn test_form_api_polls_until_ready() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(FORM, doc(200, FORM, CONFIRMATION))
                .on_get(&simple_url(), doc(404, &simple_url(), "Not Found"))
                .on_get(&simple_url(), doc(404, &simple_url(), "Not Found"))
                .on_get(&simple_url(), doc(200, &simple_url(), SIMPLE)),
        );
        let clock = Arc::new(ManualClock::new());
        let adapter = JpredAdapter::new(config(JpredApi::Form, 1300), fetcher.clone(), clock.clone());

        let results = adapter.predict(&request()).await;
        let result = results[0].as_ref().unwrap();
        assert_eq!(result.provider, "JPred");
        assert_eq!(labels_to_string(&result.labels), "CHHEEC");
        assert_eq!(fetcher.get_count(&simple_url()), 3);
        assert_eq!(clock.elapsed(), Duration::from_secs(10));

        let posted = fetcher.posted.lock();
        match &posted[0].1 {
            Payload::Multipart(fields) => {
                let names: Vec<&str> = fields.iter().map(FormField::name).collect();
                assert_eq!(names, vec!["seq", "fileup", "input", "pdb", "email", "queryName"]);
            }
            other => panic!("Expected multipart form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_form_api_times_out() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(FORM, doc(200, FORM, CONFIRMATION))
                .on_get(&simple_url(), doc(404, &simple_url(), "Not Found")),
        );
        let clock = Arc::new(ManualClock::new());
        let adapter = JpredAdapter::new(config(JpredApi::Form, 12), fetcher.clone(), clock);

        let results = adapter.predict(&request()).await;
        let failure = results[0].as_ref().unwrap_err();
        assert!(matches!(failure.error, PredictionError::TimedOut { .. }));
        // probes at 0s, 5s and 10s; deadline passed before the fourth
        assert_eq!(fetcher.get_count(&simple_url()), 3);
    }

    #[tokio::test]
    async fn test_form_submission_errors() {
        let fetcher = Arc::new(ScriptedFetcher::new().on_post(FORM, doc(503, FORM, "busy")));
        let adapter = JpredAdapter::new(
            config(JpredApi::Form, 1300),
            fetcher,
            Arc::new(ManualClock::new()),
        );
        let results = adapter.predict(&request()).await;
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            PredictionError::ProviderUnavailable(_)
        ));

        let fetcher = Arc::new(ScriptedFetcher::new().on_post(FORM, doc(200, FORM, "<html>queue full</html>")));
        let adapter = JpredAdapter::new(
            config(JpredApi::Form, 1300),
            fetcher,
            Arc::new(ManualClock::new()),
        );
        let results = adapter.predict(&request()).await;
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            PredictionError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn test_rest_api_waits_on_status_endpoint() {
        let job_url = format!("{}/job", REST);
        let status_url = format!("{}/job/id/jp_Ab12", REST);
        let accepted = Document {
            status: 202,
            url: job_url.clone(),
            location: Some("http://jpred.test/cgi-bin/chklog?jp_Ab12".to_string()),
            body: String::new(),
        };
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(&job_url, accepted)
                .on_get(&status_url, doc(200, &status_url, "Job jp_Ab12 is 40% complete..."))
                .on_get(
                    &status_url,
                    doc(200, &status_url, "Job jp_Ab12 finished. Results available at the following URL:"),
                )
                .on_get(&simple_url(), doc(200, &simple_url(), SIMPLE)),
        );
        let clock = Arc::new(ManualClock::new());
        let adapter = JpredAdapter::new(config(JpredApi::Rest, 1300), fetcher.clone(), clock.clone());

        let results = adapter.predict(&request()).await;
        assert_eq!(labels_to_string(&results[0].as_ref().unwrap().labels), "CHHEEC");
        assert_eq!(clock.elapsed(), Duration::from_secs(30));

        let posted = fetcher.posted.lock();
        match &posted[0].1 {
            Payload::Raw { content_type, body } => {
                assert_eq!(content_type, "text/txt");
                assert_eq!(
                    body,
                    "skipPDB=on£€£€format=seq£€£€email=a@b.org£€£€name=lyso£€£€>query\nMKVLAA"
                );
            }
            other => panic!("Expected raw body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rest_api_unknown_status_fails() {
        let job_url = format!("{}/job", REST);
        let status_url = format!("{}/job/id/jp_Ab12", REST);
        let accepted = Document {
            status: 202,
            url: job_url.clone(),
            location: Some("http://jpred.test/cgi-bin/chklog?jp_Ab12".to_string()),
            body: String::new(),
        };
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(&job_url, accepted)
                .on_get(&status_url, doc(200, &status_url, "Job not found")),
        );
        let adapter = JpredAdapter::new(config(JpredApi::Rest, 1300), fetcher, Arc::new(ManualClock::new()));

        let results = adapter.predict(&request()).await;
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            PredictionError::Parse(_)
        ));
    }

    #[test]
    fn test_extract_prediction_takes_odd_lines() {
        let body = "<code>SEQ1\nPRED1\nSEQ2\nPRED2</code>";
        assert_eq!(extract_prediction(body).unwrap(), "PRED1PRED2");
        assert!(extract_prediction("<code>only one line</code>").is_err());
    }
}
