//! The boundary between message state and whatever actually talks to Slack.
//!
//! [super::api::WebApi] is the production implementation. Every method may
//! fail with [SlackError::RateLimited], which callers are expected to handle.

use super::{
    block::Block,
    channel::{ChannelId, ChannelName},
    error::SlackError,
    mention::MemberId,
};
use async_trait::async_trait;
use std::fmt;

/// Slack identifies a message by the channel it's in and its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdentity {
    pub channel: ChannelId,
    pub ts: Timestamp,
}

/// Slack's message timestamps double as IDs, for example `1503435956.000247`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(pub String);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What Slack tells us about a message it just posted or updated. Nothing is
/// guaranteed present until it's been through [PostedMessage::into_identity].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostedMessage {
    pub channel: Option<String>,
    pub ts: Option<String>,
}

impl PostedMessage {
    pub fn new<C: Into<String>, T: Into<String>>(channel: C, ts: T) -> Self {
        PostedMessage {
            channel: Some(channel.into()),
            ts: Some(ts.into()),
        }
    }

    /// Without both parts we've no way to update the message later.
    pub fn into_identity(self) -> Result<MessageIdentity, SlackError> {
        let channel = self.channel.filter(|x| !x.is_empty());
        let ts = self.ts.filter(|x| !x.is_empty());

        match (channel, ts) {
            (Some(c), Some(t)) => Ok(MessageIdentity {
                channel: ChannelId(c),
                ts: Timestamp(t),
            }),
            (None, None) => Err(missing("channel and ts")),
            (None, Some(_)) => Err(missing("channel")),
            (Some(_), None) => Err(missing("ts")),
        }
    }
}

fn missing(what: &str) -> SlackError {
    SlackError::InconsistentState(format!("response is missing {}", what))
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// <https://api.slack.com/methods/chat.postMessage>
    async fn create_message(
        &self,
        channel: &ChannelName,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError>;

    /// <https://api.slack.com/methods/chat.update>
    async fn update_message(
        &self,
        identity: &MessageIdentity,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError>;

    /// <https://api.slack.com/methods/chat.postMessage>
    async fn post_text(&self, channel: &ChannelName, text: &str) -> Result<(), SlackError>;

    /// <https://api.slack.com/methods/chat.postEphemeral>
    async fn post_ephemeral(
        &self,
        channel: &ChannelName,
        text: &str,
        member: &MemberId,
    ) -> Result<(), SlackError>;
}
