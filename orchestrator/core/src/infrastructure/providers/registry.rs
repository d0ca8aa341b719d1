// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prediction Provider Registry
//
// Builds the set of provider adapters for one run from the configuration.
// Disabled providers are skipped; the remaining ones share one fetcher and
// one clock.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::config::VkabatConfig;
use crate::domain::polling::Clock;
use crate::domain::provider::PredictionProvider;
use crate::infrastructure::http::Fetcher;

use super::{JpredAdapter, PrabiAdapter, SympredAdapter, YaspinAdapter};

/// Registry of the provider adapters taking part in a run
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn PredictionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the registry from configuration, in the order PRABI, JPred,
    /// YASPIN, SymPred.
    pub fn from_config(
        config: &VkabatConfig,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        let providers = &config.providers;

        info!("Initializing prediction provider registry");

        if providers.prabi.enabled {
            registry.register(Arc::new(PrabiAdapter::new(
                providers.prabi.clone(),
                fetcher.clone(),
            )))?;
        } else {
            info!("Provider 'PRABI' disabled, skipping");
        }

        if providers.jpred.enabled {
            registry.register(Arc::new(JpredAdapter::new(
                providers.jpred.clone(),
                fetcher.clone(),
                clock.clone(),
            )))?;
        } else {
            info!("Provider 'JPred' disabled, skipping");
        }

        if providers.yaspin.enabled {
            registry.register(Arc::new(YaspinAdapter::new(
                providers.yaspin.clone(),
                fetcher.clone(),
                clock.clone(),
            )))?;
        } else {
            info!("Provider 'YASPIN' disabled, skipping");
        }

        if providers.sympred.enabled {
            registry.register(Arc::new(SympredAdapter::new(
                providers.sympred.clone(),
                fetcher,
                clock,
            )))?;
        } else {
            info!("Provider 'SymPred' disabled, skipping");
        }

        if registry.is_empty() {
            warn!("No prediction providers enabled - every run will end with no data");
        }

        Ok(registry)
    }

    /// Add a provider. Names must be unique within a registry.
    pub fn register(&mut self, provider: Arc<dyn PredictionProvider>) -> anyhow::Result<()> {
        if self.providers.iter().any(|p| p.name() == provider.name()) {
            anyhow::bail!("Provider '{}' is already registered", provider.name());
        }
        info!("Registered provider: {}", provider.name());
        self.providers.push(provider);
        Ok(())
    }

    pub fn providers(&self) -> &[Arc<dyn PredictionProvider>] {
        &self.providers
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::polling::ManualClock;
    use crate::infrastructure::providers::testing::ScriptedFetcher;

    fn build(config: &VkabatConfig) -> ProviderRegistry {
        ProviderRegistry::from_config(
            config,
            Arc::new(ScriptedFetcher::new()),
            Arc::new(ManualClock::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_all_providers_in_fixed_order() {
        let registry = build(&VkabatConfig::default());
        assert_eq!(registry.names(), vec!["PRABI", "JPred", "YASPIN", "SymPred"]);
    }

    #[test]
    fn test_disabled_providers_are_skipped() {
        let mut config = VkabatConfig::default();
        config.providers.jpred.enabled = false;
        config.providers.sympred.enabled = false;

        let registry = build(&config);
        assert_eq!(registry.names(), vec!["PRABI", "YASPIN"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut config = VkabatConfig::default();
        config.providers.prabi.enabled = false;
        config.providers.jpred.enabled = false;
        config.providers.sympred.enabled = false;
        let mut registry = build(&config);

        let again = Arc::new(YaspinAdapter::new(
            config.providers.yaspin.clone(),
            Arc::new(ScriptedFetcher::new()),
            Arc::new(ManualClock::new()),
        ));
        assert!(registry.register(again).is_err());
        assert_eq!(registry.len(), 1);
    }
}
