use crate::Result;

/// One call to a translation provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderRequest<'a> {
    pub engine: &'a str,
    pub text: &'a str,
    pub target_language: &'a str,
    /// Ask for the provider's detailed payload (detected source language etc).
    pub detailed: bool,
}

/// Hexagonal port for translation providers.
///
/// Implementations only move bytes: they return the provider's raw JSON
/// payload and leave all interpretation to the backends in
/// [`crate::translation`]. Calls are blocking; retries and timeouts belong to
/// the implementation.
pub trait ProviderClient: Send + Sync {
    fn fetch(&self, req: &ProviderRequest<'_>) -> Result<serde_json::Value>;
}
