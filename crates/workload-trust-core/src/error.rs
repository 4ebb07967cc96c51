//! Error types for trust verification hops

use thiserror::Error;

/// Result type alias using TrustError
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors a trust-verification hop can end with
///
/// The aggregator never propagates these to its caller. They are folded
/// into a failed [`HopStatus`](crate::HopStatus) and one failure event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustError {
    /// The downstream peer could not be reached
    #[error("downstream unavailable: {0}")]
    DownstreamUnavailable(String),

    /// The downstream peer refused the presented credential
    #[error("downstream rejected credential: {0}")]
    DownstreamRejected(String),

    /// The request deadline elapsed before the hop completed
    #[error("deadline exceeded: {0}")]
    Timeout(String),

    /// The request was cancelled before the hop completed
    #[error("request cancelled before direct trust verification completed")]
    Cancelled,

    /// The upstream gateway forwarded a request without a usable identity
    /// assertion. A correctly configured gateway never does this.
    #[error("malformed upstream trust assertion: {0}")]
    MalformedUpstreamTrust(String),
}

impl TrustError {
    /// Whether the hop ended because the request ran out of time or was
    /// abandoned, as opposed to a verdict from the peer
    pub fn is_interrupted(&self) -> bool {
        matches!(self, TrustError::Timeout(_) | TrustError::Cancelled)
    }
}
