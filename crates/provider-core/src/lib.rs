//! Core trait and shared types for Amparo AI providers.
//!
//! Everything that talks to a provider (the executor, the registry, the
//! orchestrator) speaks in terms of this crate: [`ProviderRequest`] and
//! [`ProviderResponse`] envelopes, the closed [`Method`] set, and the
//! [`Provider`] trait implemented by SDK adapters and mocks alike.

mod chat;
mod envelope;
mod error;
mod method;
mod provider;
pub mod tasks;

// Re-export async_trait for implementers
pub use async_trait::async_trait;

pub use chat::{ChatParams, ChatReply, HistoryMessage, Role, TurnContext};
pub use envelope::{ProviderRequest, ProviderResponse, ResponseError};
pub use error::ProviderError;
pub use method::{Method, UnknownMethod};
pub use provider::Provider;
