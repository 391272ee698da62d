//! Provider adapter trait and registry.

use crate::config::GeneratorConfig;
use crate::error::{ClipError, Result};
use crate::video::types::{JobStatus, PayloadFormat, SubmitRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// One remote image-to-video provider.
///
/// Adapters are stateless with respect to jobs: every call receives the
/// generator configuration, and the task id returned by `submit` is the only
/// state carried between calls.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider id this adapter is registered under.
    fn id(&self) -> &str;

    /// Image encoding the adapter expects in [`SubmitRequest::image`].
    fn payload_format(&self) -> PayloadFormat;

    /// Starts a generation job and returns the provider's task id.
    async fn submit(&self, request: &SubmitRequest, config: &GeneratorConfig) -> Result<String>;

    /// Fetches the current status of a job.
    async fn poll(&self, task_id: &str, config: &GeneratorConfig) -> Result<JobStatus>;

    /// Returns the configured API key, failing before any network I/O when absent.
    fn credential<'a>(&self, config: &'a GeneratorConfig) -> Result<&'a str> {
        config
            .api_key()
            .ok_or_else(|| ClipError::MissingCredential(self.id().to_string()))
    }
}

/// Adapters keyed by provider id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every adapter enabled at compile time.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "stability")]
        registry.register(Arc::new(crate::video::providers::StabilityAdapter::new()));
        #[cfg(feature = "runway")]
        registry.register(Arc::new(crate::video::providers::RunwayAdapter::new()));
        registry
    }

    /// Registers an adapter, replacing any previous one with the same id.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id().to_ascii_lowercase(), adapter);
    }

    /// Looks up the adapter for a provider id (case-insensitive).
    pub fn get(&self, id: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(&id.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ClipError::UnsupportedProvider(id.to_string()))
    }

    /// Registered provider ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("adapters", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAdapter;

    #[async_trait]
    impl ProviderAdapter for NullAdapter {
        fn id(&self) -> &str {
            "Null"
        }

        fn payload_format(&self) -> PayloadFormat {
            PayloadFormat::Bytes
        }

        async fn submit(&self, _: &SubmitRequest, config: &GeneratorConfig) -> Result<String> {
            self.credential(config)?;
            Ok("task".into())
        }

        async fn poll(&self, _: &str, _: &GeneratorConfig) -> Result<JobStatus> {
            Ok(JobStatus::Unknown)
        }
    }

    #[test]
    fn test_register_and_lookup_case_insensitive() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(NullAdapter));
        assert_eq!(registry.get("null").unwrap().id(), "Null");
        assert_eq!(registry.get(" NULL ").unwrap().id(), "Null");
        assert_eq!(registry.ids(), vec!["null".to_string()]);
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        let err = registry.get("pika").err().unwrap();
        assert!(matches!(err, ClipError::UnsupportedProvider(ref id) if id == "pika"));
    }

    #[test]
    fn test_credential_missing() {
        let adapter = NullAdapter;
        let config = GeneratorConfig::default();
        let err = adapter.credential(&config).unwrap_err();
        assert!(matches!(err, ClipError::MissingCredential(ref p) if p == "Null"));
    }

    #[cfg(all(feature = "stability", feature = "runway"))]
    #[test]
    fn test_defaults_hold_builtin_adapters() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(registry.ids(), vec!["runway".to_string(), "stability".to_string()]);
    }
}
