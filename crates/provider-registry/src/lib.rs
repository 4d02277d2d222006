//! Lazy provider registry.
//!
//! Providers register cheap metadata up front; construction and
//! initialization happen on first use and at most once per name. Essential
//! providers (those not marked `defer_loading`) can be warmed eagerly at
//! startup, highest priority first, with failures isolated per provider.

mod error;
mod registration;
mod registry;

pub use error::RegistryError;
pub use registration::{ProviderFactory, ProviderRegistration};
pub use registry::{InitReport, ProviderRegistry, ProviderStatus, RegistryStats};
