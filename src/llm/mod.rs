//! External text-generation capability.

mod remote;

pub use remote::RemoteGenerator;

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Narrow contract against the external generation service: one prompt in,
/// one completion out. Synchronous request/response, no streaming.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ApiError>;
}
