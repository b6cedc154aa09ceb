//! A scripted [Transport] that records every call made to it.

use super::{
    block::Block,
    channel::ChannelName,
    error::SlackError,
    mention::MemberId,
    transport::{MessageIdentity, PostedMessage, Transport},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const CHANNEL_ID: &str = "C0123456789";
pub const TS: &str = "1700000000.000100";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        channel: ChannelName,
        blocks: Vec<Block>,
    },
    Update {
        identity: MessageIdentity,
        blocks: Vec<Block>,
    },
    Text {
        channel: ChannelName,
        text: String,
    },
    Ephemeral {
        channel: ChannelName,
        text: String,
        member: MemberId,
    },
}

impl Call {
    pub fn is_create(&self) -> bool {
        matches!(self, Call::Create { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Call::Update { .. })
    }
}

/// How the stub answers a call. Once the script runs out every call succeeds.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok,
    RateLimited(Option<u64>),
    Remote(&'static str),
    /// Succeeds without identifying the message.
    Malformed,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    replies: VecDeque<Reply>,
}

/// Clones share state, so tests can keep a handle after giving one away.
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Inner>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying<I: IntoIterator<Item = Reply>>(replies: I) -> Self {
        let stub = Self::new();
        stub.inner.lock().unwrap().replies.extend(replies);
        stub
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, call: Call) -> Reply {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        inner.replies.pop_front().unwrap_or(Reply::Ok)
    }
}

fn posted(reply: Reply) -> Result<PostedMessage, SlackError> {
    match reply {
        Reply::Ok => Ok(PostedMessage::new(CHANNEL_ID, TS)),
        Reply::Malformed => Ok(PostedMessage::default()),
        Reply::RateLimited(retry_after) => Err(SlackError::RateLimited { retry_after }),
        Reply::Remote(e) => Err(SlackError::RemoteRequestFailed(e.into())),
    }
}

fn acked(reply: Reply) -> Result<(), SlackError> {
    posted(reply).map(|_| ())
}

#[async_trait]
impl Transport for StubTransport {
    async fn create_message(
        &self,
        channel: &ChannelName,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError> {
        posted(self.record(Call::Create {
            channel: channel.clone(),
            blocks: blocks.to_vec(),
        }))
    }

    async fn update_message(
        &self,
        identity: &MessageIdentity,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError> {
        posted(self.record(Call::Update {
            identity: identity.clone(),
            blocks: blocks.to_vec(),
        }))
    }

    async fn post_text(&self, channel: &ChannelName, text: &str) -> Result<(), SlackError> {
        acked(self.record(Call::Text {
            channel: channel.clone(),
            text: text.to_owned(),
        }))
    }

    async fn post_ephemeral(
        &self,
        channel: &ChannelName,
        text: &str,
        member: &MemberId,
    ) -> Result<(), SlackError> {
        acked(self.record(Call::Ephemeral {
            channel: channel.clone(),
            text: text.to_owned(),
            member: member.clone(),
        }))
    }
}
