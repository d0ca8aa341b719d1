// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Run Configuration Types
//
// Immutable configuration consumed by the provider registry and every
// adapter. Loaded once from YAML (or defaults), patched by environment
// variables and CLI flags, validated, then shared behind an `Arc`.
//
// - Job identity (name, contact email, output directory)
// - Per-provider enable flags, endpoints and timeouts
// - PRABI algorithm parameters (GOR I constants, PREDATOR matrix, SOPM)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::polling::{PollingPolicy, FAST_POLL_INTERVAL, SLOW_POLL_INTERVAL};

/// Algorithms served by the PRABI secondary-structure portal.
pub const PRABI_ALGORITHMS: [&str; 8] = ["gor1", "gor3", "dpm", "predator", "hnn", "sopm", "mlrc", "dsc"];

/// Top-level configuration for one vkabat run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkabatConfig {
    /// Job / sequence name; prefixes the output file names
    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Directory the report files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Contact email forwarded to providers that accept one
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub prabi: PrabiConfig,

    #[serde(default)]
    pub jpred: JpredConfig,

    #[serde(default)]
    pub yaspin: YaspinConfig,

    #[serde(default)]
    pub sympred: SympredConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrabiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// CGI base, e.g. "https://npsa-prabi.ibcp.fr/cgi-bin"
    #[serde(default = "default_prabi_base_url")]
    pub base_url: String,

    /// Width of the alignment blocks in the result page
    #[serde(default = "default_alignment_width")]
    pub alignment_width: u32,

    /// Subset of `PRABI_ALGORITHMS` to run
    #[serde(default = "default_prabi_algorithms")]
    pub algorithms: Vec<String>,

    #[serde(default)]
    pub gor1: Gor1Params,

    /// Substitution matrix source for PREDATOR
    #[serde(default)]
    pub predator_matrix: PredatorMatrix,

    #[serde(default)]
    pub sopm: SopmParams,
}

/// GOR I decision constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gor1Params {
    pub constants: i32,
    pub dch: i32,
    pub dce: i32,
    pub dct: i32,
    pub dcc: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredatorMatrix {
    #[default]
    Dssp,
    Stride,
}

impl PredatorMatrix {
    pub fn as_str(self) -> &'static str {
        match self {
            PredatorMatrix::Dssp => "dssp",
            PredatorMatrix::Stride => "stride",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SopmParams {
    /// 3 = helix/sheet/coil, 4 adds turn
    pub states: u8,
    /// Similarity threshold
    pub threshold: u32,
    /// Window width
    pub width: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JpredApi {
    /// Web form submission, result page polled directly
    #[default]
    Form,
    /// REST job API, slow status endpoint polled
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JpredConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_fast_poll_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub api: JpredApi,

    #[serde(default = "default_jpred_form_url")]
    pub form_url: String,

    #[serde(default = "default_jpred_results_base")]
    pub results_base: String,

    #[serde(default = "default_jpred_rest_url")]
    pub rest_url: String,

    #[serde(default = "default_slow_poll_secs")]
    pub status_poll_interval_secs: u64,
}

impl JpredConfig {
    pub fn polling(&self) -> PollingPolicy {
        let interval = match self.api {
            JpredApi::Form => self.poll_interval_secs,
            JpredApi::Rest => self.status_poll_interval_secs,
        };
        PollingPolicy::new(Duration::from_secs(interval), Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YaspinConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_fast_poll_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_yaspin_submit_url")]
    pub submit_url: String,

    #[serde(default = "default_jobs_base")]
    pub jobs_base: String,
}

impl YaspinConfig {
    pub fn polling(&self) -> PollingPolicy {
        PollingPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SympredConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_fast_poll_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_sympred_submit_url")]
    pub submit_url: String,

    #[serde(default = "default_jobs_base")]
    pub jobs_base: String,

    /// Consensus window
    #[serde(default = "default_sympred_window")]
    pub window: u32,

    /// Sequence database used for profile generation
    #[serde(default = "default_sympred_database")]
    pub database: String,
}

impl SympredConfig {
    pub fn polling(&self) -> PollingPolicy {
        PollingPolicy::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_job_name() -> String {
    "test".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    1300
}

fn default_fast_poll_secs() -> u64 {
    FAST_POLL_INTERVAL.as_secs()
}

fn default_slow_poll_secs() -> u64 {
    SLOW_POLL_INTERVAL.as_secs()
}

fn default_prabi_base_url() -> String {
    "https://npsa-prabi.ibcp.fr/cgi-bin".to_string()
}

fn default_alignment_width() -> u32 {
    100
}

fn default_prabi_algorithms() -> Vec<String> {
    PRABI_ALGORITHMS.iter().map(|a| a.to_string()).collect()
}

fn default_jpred_form_url() -> String {
    "https://www.compbio.dundee.ac.uk/jpred/cgi-bin/jpred_form".to_string()
}

fn default_jpred_results_base() -> String {
    "http://www.compbio.dundee.ac.uk/jpred4/results".to_string()
}

fn default_jpred_rest_url() -> String {
    "http://www.compbio.dundee.ac.uk/jpred4/cgi-bin/rest".to_string()
}

fn default_yaspin_submit_url() -> String {
    "https://www.ibi.vu.nl/programs/yaspinwww/".to_string()
}

fn default_sympred_submit_url() -> String {
    "https://www.ibi.vu.nl/programs/sympredwww/".to_string()
}

fn default_jobs_base() -> String {
    "http://zeus.few.vu.nl/jobs".to_string()
}

fn default_sympred_window() -> u32 {
    21
}

fn default_sympred_database() -> String {
    "nr".to_string()
}

impl Default for Gor1Params {
    fn default() -> Self {
        Self {
            constants: 0,
            dch: 40,
            dce: 35,
            dct: 0,
            dcc: 0,
        }
    }
}

impl Default for SopmParams {
    fn default() -> Self {
        Self {
            states: 3,
            threshold: 8,
            width: 17,
        }
    }
}

impl Default for PrabiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_prabi_base_url(),
            alignment_width: default_alignment_width(),
            algorithms: default_prabi_algorithms(),
            gor1: Gor1Params::default(),
            predator_matrix: PredatorMatrix::default(),
            sopm: SopmParams::default(),
        }
    }
}

impl Default for JpredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_fast_poll_secs(),
            api: JpredApi::default(),
            form_url: default_jpred_form_url(),
            results_base: default_jpred_results_base(),
            rest_url: default_jpred_rest_url(),
            status_poll_interval_secs: default_slow_poll_secs(),
        }
    }
}

impl Default for YaspinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_fast_poll_secs(),
            submit_url: default_yaspin_submit_url(),
            jobs_base: default_jobs_base(),
        }
    }
}

impl Default for SympredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_fast_poll_secs(),
            submit_url: default_sympred_submit_url(),
            jobs_base: default_jobs_base(),
            window: default_sympred_window(),
            database: default_sympred_database(),
        }
    }
}

impl Default for VkabatConfig {
    fn default() -> Self {
        Self {
            job_name: default_job_name(),
            output_dir: default_output_dir(),
            email: String::new(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl VkabatConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. VKABAT_CONFIG_PATH environment variable
    /// 2. ./vkabat.yaml (working directory)
    /// 3. ~/.vkabat/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VKABAT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./vkabat.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vkabat").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found. Using built-in defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(email) = std::env::var("VKABAT_EMAIL") {
            tracing::info!("Environment override: VKABAT_EMAIL");
            self.email = email;
        }

        if let Ok(dir) = std::env::var("VKABAT_OUTPUT_DIR") {
            tracing::info!("Environment override: VKABAT_OUTPUT_DIR={}", dir);
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.job_name.trim().is_empty() {
            anyhow::bail!("job_name cannot be empty");
        }

        let prabi = &self.providers.prabi;
        if prabi.enabled {
            if prabi.base_url.is_empty() {
                anyhow::bail!("providers.prabi.base_url cannot be empty");
            }
            if prabi.alignment_width == 0 {
                anyhow::bail!("providers.prabi.alignment_width must be greater than 0");
            }
            if prabi.algorithms.is_empty() {
                anyhow::bail!("providers.prabi.algorithms cannot be empty when PRABI is enabled");
            }
            for (idx, algorithm) in prabi.algorithms.iter().enumerate() {
                if prabi.algorithms[..idx].contains(algorithm) {
                    anyhow::bail!("PRABI algorithm '{}' is listed more than once", algorithm);
                }
                if !PRABI_ALGORITHMS.contains(&algorithm.as_str()) {
                    anyhow::bail!(
                        "Unknown PRABI algorithm '{}'. Expected one of: {}",
                        algorithm,
                        PRABI_ALGORITHMS.join(", ")
                    );
                }
            }
            if !matches!(prabi.sopm.states, 3 | 4) {
                anyhow::bail!("providers.prabi.sopm.states must be 3 or 4, got {}", prabi.sopm.states);
            }
        }

        let jpred = &self.providers.jpred;
        if jpred.enabled {
            check_timing("jpred", jpred.timeout_secs, jpred.poll_interval_secs)?;
            check_timing("jpred", jpred.timeout_secs, jpred.status_poll_interval_secs)?;
            let url = match jpred.api {
                JpredApi::Form => &jpred.form_url,
                JpredApi::Rest => &jpred.rest_url,
            };
            if url.is_empty() || jpred.results_base.is_empty() {
                anyhow::bail!("providers.jpred endpoints cannot be empty");
            }
        }

        let yaspin = &self.providers.yaspin;
        if yaspin.enabled {
            check_timing("yaspin", yaspin.timeout_secs, yaspin.poll_interval_secs)?;
            if yaspin.submit_url.is_empty() || yaspin.jobs_base.is_empty() {
                anyhow::bail!("providers.yaspin endpoints cannot be empty");
            }
        }

        let sympred = &self.providers.sympred;
        if sympred.enabled {
            check_timing("sympred", sympred.timeout_secs, sympred.poll_interval_secs)?;
            if sympred.submit_url.is_empty() || sympred.jobs_base.is_empty() {
                anyhow::bail!("providers.sympred endpoints cannot be empty");
            }
        }

        Ok(())
    }
}

fn check_timing(provider: &str, timeout_secs: u64, interval_secs: u64) -> anyhow::Result<()> {
    if timeout_secs == 0 {
        anyhow::bail!("providers.{}.timeout_secs must be greater than 0", provider);
    }
    if interval_secs == 0 {
        anyhow::bail!("providers.{} poll interval must be greater than 0", provider);
    }
    Ok(())
}
