//! Registry errors.

use provider_core::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// No registration exists under this name.
    #[error("provider not registered: {0}")]
    NotRegistered(String),

    /// The factory produced a provider that failed to initialize.
    #[error("provider '{name}' failed to initialize: {source}")]
    InitFailed {
        name: String,
        #[source]
        source: ProviderError,
    },
}
