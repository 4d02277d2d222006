//! Provider registration metadata.

use std::fmt;
use std::sync::Arc;

use provider_core::Provider;

/// Constructor for a provider instance.
///
/// Factories must be cheap and synchronous; expensive work belongs in
/// [`Provider::initialize`], which the registry awaits exactly once per
/// successful load.
pub type ProviderFactory = Arc<dyn Fn() -> Arc<dyn Provider> + Send + Sync>;

/// Everything the registry knows about a provider before it is built.
#[derive(Clone)]
pub struct ProviderRegistration {
    /// Unique lookup name.
    pub name: String,
    pub factory: ProviderFactory,
    /// Deferred providers are skipped by essential initialization and only
    /// built on first use.
    pub defer_loading: bool,
    /// Higher loads earlier and ranks first in search results.
    pub priority: u32,
    pub tags: Vec<String>,
    pub description: String,
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("name", &self.name)
            .field("defer_loading", &self.defer_loading)
            .field("priority", &self.priority)
            .field("tags", &self.tags)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl ProviderRegistration {
    /// Register a factory under `name`. Deferred by default.
    pub fn new(name: impl Into<String>, factory: ProviderFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            defer_loading: true,
            priority: 0,
            tags: Vec::new(),
            description: String::new(),
        }
    }

    /// Register an already-built provider instance.
    pub fn instance(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self::new(name, Arc::new(move || Arc::clone(&provider)))
    }

    /// Mark the provider essential: `initialize_essential` loads it eagerly.
    pub fn essential(mut self) -> Self {
        self.defer_loading = false;
        self
    }

    pub fn with_defer_loading(mut self, defer_loading: bool) -> Self {
        self.defer_loading = defer_loading;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
