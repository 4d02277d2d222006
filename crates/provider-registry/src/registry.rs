//! The lazy registry.

use std::cmp::Reverse;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use provider_core::Provider;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::registration::ProviderRegistration;

struct RegistryEntry {
    registration: ProviderRegistration,
    cell: Arc<OnceCell<Arc<dyn Provider>>>,
}

/// Counters for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_configured: usize,
    pub loaded: usize,
    pub deferred: usize,
}

/// Listing row for one configured provider.
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub name: String,
    pub loaded: bool,
    pub defer_loading: bool,
    pub priority: u32,
}

/// What essential initialization accomplished.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
}

/// Constructs providers on first use and memoizes the instances.
///
/// Registration order is preserved and breaks priority ties in search
/// results. Each entry carries its own `OnceCell`, so concurrent lookups of
/// the same cold provider coalesce into a single construction.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<IndexMap<String, RegistryEntry>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a registration. Nothing is constructed here.
    ///
    /// Re-registering a name replaces the previous entry, dropping any
    /// loaded instance with it.
    pub async fn register(&self, registration: ProviderRegistration) {
        let mut entries = self.entries.write().await;
        let name = registration.name.clone();
        if entries.contains_key(&name) {
            warn!("provider '{}' re-registered; replacing the previous entry", name);
        }
        debug!(
            "registered provider '{}' (defer_loading: {}, priority: {})",
            name, registration.defer_loading, registration.priority
        );
        entries.insert(
            name,
            RegistryEntry {
                registration,
                cell: Arc::new(OnceCell::new()),
            },
        );
    }

    /// Resolve a provider, constructing and initializing it on first use.
    ///
    /// Concurrent callers of the same cold entry wait on one construction;
    /// the factory and `initialize` fire at most once per successful load.
    /// A failed initialization leaves the entry empty, so a later call may
    /// try again.
    pub async fn get(&self, name: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        let (cell, factory) = {
            let entries = self.entries.read().await;
            let entry = entries
                .get(name)
                .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
            (
                Arc::clone(&entry.cell),
                Arc::clone(&entry.registration.factory),
            )
        };

        if let Some(provider) = cell.get() {
            return Ok(Arc::clone(provider));
        }

        let owned = name.to_string();
        let provider = cell
            .get_or_try_init(|| async {
                info!("loading provider '{}' on demand", owned);
                let provider = factory();
                provider.initialize().await.map_err(|source| {
                    warn!("provider '{}' failed to initialize: {}", owned, source);
                    RegistryError::InitFailed {
                        name: owned.clone(),
                        source,
                    }
                })?;
                info!("provider '{}' loaded", owned);
                Ok::<_, RegistryError>(provider)
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// Eagerly load every non-deferred provider, highest priority first.
    ///
    /// Loads run concurrently; a failing provider is logged and reported
    /// without blocking its siblings.
    pub async fn initialize_essential(&self) -> InitReport {
        let mut essential: Vec<(String, u32)> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|e| !e.registration.defer_loading)
                .map(|e| (e.registration.name.clone(), e.registration.priority))
                .collect()
        };
        // Stable sort: registration order breaks priority ties.
        essential.sort_by_key(|(_, priority)| Reverse(*priority));

        if essential.is_empty() {
            debug!("no essential providers to initialize");
            return InitReport::default();
        }
        info!("initializing {} essential provider(s)", essential.len());

        let results = join_all(
            essential
                .iter()
                .map(|(name, _)| async move { (name.clone(), self.get(name).await) }),
        )
        .await;

        let mut report = InitReport::default();
        for (name, result) in results {
            match result {
                Ok(_) => report.loaded.push(name),
                Err(e) => {
                    warn!("essential provider '{}' failed to load: {}", name, e);
                    report.failed.push(name);
                }
            }
        }
        info!(
            "essential initialization complete: {} loaded, {} failed",
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    /// Force-load one provider ahead of demand. Returns whether it loaded.
    pub async fn preload(&self, name: &str) -> bool {
        match self.get(name).await {
            Ok(_) => true,
            Err(e) => {
                warn!("preload of '{}' failed: {}", name, e);
                false
            }
        }
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        let entries = self.entries.read().await;
        entries.get(name).map(|e| e.cell.initialized()).unwrap_or(false)
    }

    /// Names of providers carrying `tag`, highest priority first,
    /// registration order on ties.
    pub async fn search_by_tag(&self, tag: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut matches: Vec<(String, u32)> = entries
            .values()
            .filter(|e| e.registration.tags.iter().any(|t| t == tag))
            .map(|e| (e.registration.name.clone(), e.registration.priority))
            .collect();
        matches.sort_by_key(|(_, priority)| Reverse(*priority));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    /// Names whose description contains `query` (case-insensitive), ordered
    /// like [`search_by_tag`](Self::search_by_tag).
    pub async fn search_by_description(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        let entries = self.entries.read().await;
        let mut matches: Vec<(String, u32)> = entries
            .values()
            .filter(|e| e.registration.description.to_lowercase().contains(&needle))
            .map(|e| (e.registration.name.clone(), e.registration.priority))
            .collect();
        matches.sort_by_key(|(_, priority)| Reverse(*priority));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    pub async fn stats(&self) -> RegistryStats {
        let entries = self.entries.read().await;
        let total_configured = entries.len();
        let loaded = entries.values().filter(|e| e.cell.initialized()).count();
        RegistryStats {
            total_configured,
            loaded,
            deferred: total_configured - loaded,
        }
    }

    /// Every configured provider, in registration order.
    pub async fn list_available(&self) -> Vec<ProviderStatus> {
        let entries = self.entries.read().await;
        entries
            .values()
            .map(|e| ProviderStatus {
                name: e.registration.name.clone(),
                loaded: e.cell.initialized(),
                defer_loading: e.registration.defer_loading,
                priority: e.registration.priority,
            })
            .collect()
    }

    /// Shut down every loaded provider and forget the instances.
    ///
    /// Registrations survive: the registry returns to the all-deferred state
    /// and later lookups construct fresh instances.
    pub async fn shutdown(&self) {
        let loaded: Vec<(String, Arc<dyn Provider>)> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter_map(|e| {
                    e.cell
                        .get()
                        .map(|p| (e.registration.name.clone(), Arc::clone(p)))
                })
                .collect()
        };

        for (name, provider) in loaded {
            match provider.shutdown().await {
                Ok(()) => debug!("provider '{}' shut down", name),
                Err(e) => warn!("provider '{}' failed to shut down cleanly: {}", name, e),
            }
        }

        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            entry.cell = Arc::new(OnceCell::new());
        }
        info!("registry shut down; {} registration(s) reset", entries.len());
    }
}
