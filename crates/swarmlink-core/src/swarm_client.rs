//! The storage-network seam.
//!
//! Onion routing, snode selection, and retry are transport concerns that
//! live behind this trait; the pipeline hands over a fully assembled
//! [`SwarmMessage`] and only cares whether the swarm accepted it. This is
//! the pipeline's single suspension point on the send path.

use async_trait::async_trait;

use swarmlink_proto::SwarmMessage;

/// Client for the replicated storage network.
#[async_trait]
pub trait SwarmClient: Send + Sync {
    /// Submit one message to the recipient's swarm.
    ///
    /// Implementations report rejection or transport failure as an error
    /// string; the pipeline surfaces it as
    /// [`SendError::DeliveryFailed`](crate::SendError::DeliveryFailed)
    /// without retrying.
    async fn submit(&self, message: SwarmMessage) -> Result<(), String>;
}
