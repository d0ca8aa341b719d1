// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prediction Provider Infrastructure - Anti-Corruption Layer Implementations
//
// One adapter per external provider family. Each adapter translates the
// family's forms, job identifiers and result pages into normalized
// `ProviderResult`s behind the domain `PredictionProvider` trait.

pub mod jpred;
pub mod prabi;
pub mod registry;
pub mod sympred;
pub mod yaspin;

pub use jpred::JpredAdapter;
pub use prabi::PrabiAdapter;
pub use registry::ProviderRegistry;
pub use sympred::SympredAdapter;
pub use yaspin::YaspinAdapter;

use crate::domain::polling::JobProbe;
use crate::domain::prediction::{Prediction, PredictionError, ProviderFailure};
use crate::infrastructure::http::{Document, Fetcher};

/// GET a result page and classify it: 200 is ready, any status listed in
/// `not_ready` means keep polling, everything else aborts the job.
pub(crate) async fn probe_result_page(
    fetcher: &dyn Fetcher,
    url: &str,
    not_ready: &[u16],
) -> Result<JobProbe, PredictionError> {
    let doc = fetcher.get(url).await?;
    Ok(match doc.status {
        200 => JobProbe::Ready(doc.body),
        status if not_ready.contains(&status) => JobProbe::NotReady,
        status => JobProbe::Unexpected(status),
    })
}

/// Fail unless the submission answered with one of `expected`.
pub(crate) fn expect_status(doc: &Document, expected: &[u16], provider: &str) -> Result<(), PredictionError> {
    if expected.contains(&doc.status) {
        Ok(())
    } else {
        Err(PredictionError::ProviderUnavailable(format!(
            "{} submission returned HTTP {}",
            provider, doc.status
        )))
    }
}

/// Job id embedded in a redirect URL of the form `.../{job_id}/`.
pub(crate) fn job_id_from_redirect(url: &str) -> Result<String, PredictionError> {
    let segments: Vec<&str> = url.split('/').collect();
    segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PredictionError::Parse(format!("no job id in redirect URL '{}'", url)))
}

/// Job id from a status link, `.../chklog?{job_id}` or `.../{job_id}`.
pub(crate) fn job_id_from_link(link: &str) -> Result<String, PredictionError> {
    let link = link.trim();
    let id = match link.rfind("chklog?") {
        Some(pos) => &link[pos + "chklog?".len()..],
        None => link.rsplit('/').next().unwrap_or_default(),
    };

    if id.is_empty() {
        return Err(PredictionError::Parse(format!("no job id in link '{}'", link)));
    }
    Ok(id.to_string())
}

/// One failure per result name, all carrying the same cause.
pub(crate) fn fail_all(names: &[&str], error: PredictionError) -> Vec<Prediction> {
    names
        .iter()
        .map(|name| Err(ProviderFailure::new(*name, error.clone())))
        .collect()
}
