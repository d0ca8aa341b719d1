// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Report Writer
//
// Persists a `VkabatReport` as two comma-separated tables and, on request,
// as JSON:
//
// - `{job}_vkabat_dataframe.csv`: unnamed 0-based index, one label column
//   per result, then the per-residue statistics
// - `{job}_vkabat.csv`: the vkabat series alone
// - `{job}_vkabat.json`: the full serialized report

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::vkabat::VkabatReport;

const STAT_COLUMNS: [&str; 13] = [
    "E_COUNT",
    "H_COUNT",
    "C_COUNT",
    "T_COUNT",
    "total_counts",
    "E_perc",
    "H_perc",
    "C_perc",
    "T_perc",
    "k",
    "N",
    "n1",
    "vkabat",
];

/// Paths of the files produced for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub dataframe: PathBuf,
    pub series: PathBuf,
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn dataframe_path(&self, job_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_vkabat_dataframe.csv", job_name))
    }

    pub fn series_path(&self, job_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_vkabat.csv", job_name))
    }

    pub fn json_path(&self, job_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_vkabat.json", job_name))
    }

    pub fn write(&self, report: &VkabatReport, with_json: bool) -> Result<WrittenReport> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;

        let dataframe = self.dataframe_path(&report.job_name);
        let mut w = create(&dataframe)?;
        write_dataframe(&mut w, report)?;
        w.flush()?;

        let series = self.series_path(&report.job_name);
        let mut w = create(&series)?;
        write_series(&mut w, report)?;
        w.flush()?;

        let json = if with_json {
            let path = self.json_path(&report.job_name);
            let mut w = create(&path)?;
            serde_json::to_writer_pretty(&mut w, report)
                .with_context(|| format!("failed to serialize report to {}", path.display()))?;
            w.flush()?;
            Some(path)
        } else {
            None
        };

        info!(
            dataframe = %dataframe.display(),
            series = %series.display(),
            "Report written"
        );
        Ok(WrittenReport {
            dataframe,
            series,
            json,
        })
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Label matrix plus statistics, one row per residue.
pub fn write_dataframe<W: Write>(w: &mut W, report: &VkabatReport) -> Result<()> {
    let mut header = vec![String::new()];
    header.extend(report.columns.iter().cloned());
    header.extend(STAT_COLUMNS.iter().map(|c| c.to_string()));
    writeln!(w, "{}", header.join(","))?;

    for (i, record) in report.records.iter().enumerate() {
        let mut row = vec![i.to_string()];
        row.extend(report.row(i).iter().map(|label| label.symbol().to_string()));
        row.extend([
            record.count_e.to_string(),
            record.count_h.to_string(),
            record.count_c.to_string(),
            record.count_t.to_string(),
            record.total.to_string(),
            record.pct_e.to_string(),
            record.pct_h.to_string(),
            record.pct_c.to_string(),
            record.pct_t.to_string(),
            record.k.to_string(),
            record.n.to_string(),
            record.n1.to_string(),
            format!("{:?}", record.vkabat),
        ]);
        writeln!(w, "{}", row.join(","))?;
    }
    Ok(())
}

/// The vkabat column alone, no index.
pub fn write_series<W: Write>(w: &mut W, report: &VkabatReport) -> Result<()> {
    writeln!(w, "vkabat")?;
    for value in report.vkabat_series() {
        writeln!(w, "{:?}", value)?;
    }
    Ok(())
}
