//! Mock provider implementations for the Amparo conversation pipeline.
//!
//! This crate provides mock implementations of the `Provider` trait for
//! testing:
//! - `EchoProvider` - Echoes chat messages back
//! - `CannedProvider` - Fixed replies and emotion payloads, with call counters
//! - `DelayedProvider` - Wraps another provider with artificial delay
//! - `FlakyProvider` - Fails the first N requests, then recovers
//! - `FailingProvider` - Always fails, at the transport or envelope level
//!
//! For production traffic, register real SDK adapters instead.
//!
//! # Example
//!
//! ```rust
//! use mock_provider::EchoProvider;
//! use provider_core::{ChatParams, Method, Provider, ProviderRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), provider_core::ProviderError> {
//!     let provider = EchoProvider::new();
//!
//!     let request =
//!         ProviderRequest::new(Method::ChatSend, ChatParams::new("Oi!").into_params());
//!
//!     let response = provider.handle_request(request).await?;
//!     println!("success: {}", response.success);
//!     Ok(())
//! }
//! ```

// Mock implementations
mod canned;
mod delayed;
mod echo;
mod failing;
mod flaky;

// Re-export provider-core types for convenience
pub use provider_core::{
    async_trait, Method, Provider, ProviderError, ProviderRequest, ProviderResponse,
};

// Export mock implementations
pub use canned::CannedProvider;
pub use delayed::DelayedProvider;
pub use echo::EchoProvider;
pub use failing::{FailingProvider, FailureMode};
pub use flaky::FlakyProvider;
