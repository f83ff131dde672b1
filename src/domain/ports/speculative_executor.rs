//! Speculative request issuance port (§6: `SpeculativeRequestExecutor`, Core B).

use async_trait::async_trait;

use crate::domain::errors::PortError;

#[async_trait]
pub trait SpeculativeRequestExecutor: Send + Sync {
    /// `issueSpeculativeRequest()`. `Ok(true)` means "issue another
    /// hedge after the next backoff delay", `Ok(false)` means "the
    /// original request was satisfied, stop", and `Err` means the
    /// request itself failed (§4.6: logged, chain stops).
    async fn issue_speculative_request(&self) -> Result<bool, PortError>;
}
