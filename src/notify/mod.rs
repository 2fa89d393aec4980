//! Push notifications to the team behind the agent.

mod ntfy;

pub use ntfy::NtfyNotifier;

use async_trait::async_trait;

/// Trait for notification delivery.
///
/// Delivery problems are reported through the return value and never raised,
/// so a failed notification cannot end a conversation.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a notification. Returns true when it was delivered.
    async fn notify(&self, title: &str, message: &str) -> bool;
}
