//! Model Catalog
//!
//! The ordered set of model identifiers currently offered by the
//! backend. Refreshed on demand; nothing is persisted beyond the
//! process. An empty catalog is a normal state (backend down, no
//! models pulled) and renders as a placeholder in the UI.

use crate::backend::ChatBackend;

/// Sorted, deduplicated list of available model identifiers
#[derive(Clone, Debug, Default)]
pub struct ModelCatalog {
    names: Vec<String>,
}

impl ModelCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from known identifiers (sorted, deduplicated)
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    /// Replace the catalog contents with whatever the backend lists now
    pub async fn refresh(&mut self, backend: &dyn ChatBackend) {
        let mut names: Vec<String> = backend
            .list_models()
            .await
            .into_iter()
            .map(|m| m.name)
            .collect();
        names.sort();
        names.dedup();
        tracing::debug!(count = names.len(), "model catalog refreshed");
        self.names = names;
    }

    /// All identifiers in order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Identifier at the given position, if any
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of models
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty (show a placeholder, not an error)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatOutcome, ModelInfo};
    use crate::request::ChatRequest;
    use async_trait::async_trait;

    struct FixedBackend(Vec<&'static str>);

    #[async_trait]
    impl ChatBackend for FixedBackend {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn probe(&self) -> bool {
            true
        }

        async fn send(&self, _request: &ChatRequest) -> ChatOutcome {
            ChatOutcome::Success {
                text: String::new(),
            }
        }

        async fn list_models(&self) -> Vec<ModelInfo> {
            self.0
                .iter()
                .map(|name| ModelInfo {
                    name: (*name).to_string(),
                    size: None,
                    parameter_size: None,
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn test_refresh_sorts_and_dedups() {
        let backend = FixedBackend(vec!["mistral", "llava", "mistral", "llama3.2"]);
        let mut catalog = ModelCatalog::new();
        catalog.refresh(&backend).await;

        assert_eq!(catalog.names(), &["llama3.2", "llava", "mistral"]);
        assert_eq!(catalog.get(1), Some("llava"));
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_backend_gives_empty_catalog() {
        let backend = FixedBackend(vec![]);
        let mut catalog = ModelCatalog::new();
        catalog.refresh(&backend).await;

        assert!(catalog.is_empty());
        assert_eq!(catalog.get(0), None);
    }
}
