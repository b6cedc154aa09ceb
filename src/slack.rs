//! Supports posting and incrementally updating a structured message in a
//! single Slack channel.
//!
//! The layering is intentionally strict: [message::MessageBuilder] owns the
//! blocks, [delivery::Delivery] owns the remote message identity and is the
//! only caller of a [transport::Transport], and [client::SlackClient] ties the
//! two together.

pub mod api;
pub mod auth;
mod backoff;
pub mod block;
pub mod channel;
pub mod client;
pub mod delivery;
pub mod error;
pub mod mention;
pub mod message;
pub mod transport;

#[cfg(test)]
pub(crate) mod stub;
