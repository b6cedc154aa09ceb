//! Every outbound call goes through here, on its way to a [Transport] or, in a
//! dry run, to the log.
//!
//! The remote message identity lives here too, since only the transport can
//! tell us what it is and only updates need it.

use super::{
    backoff,
    block::Block,
    channel::ChannelName,
    error::SlackError,
    mention::MemberId,
    transport::{MessageIdentity, Transport},
};
use std::future::Future;
use tracing::{info, warn};

/// Which call a [Delivery::dispatch] made, or would have made in a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Create,
    Update,
}

pub struct Delivery<T> {
    transport: T,
    channel: ChannelName,
    send_to_slack: bool,
    identity: Option<MessageIdentity>,
}

impl<T: Transport> Delivery<T> {
    /// With `send_to_slack` unset nothing reaches the transport; calls are
    /// logged instead.
    pub fn new(transport: T, channel: ChannelName, send_to_slack: bool) -> Self {
        Delivery {
            transport,
            channel,
            send_to_slack,
            identity: None,
        }
    }

    pub fn identity(&self) -> Option<&MessageIdentity> {
        self.identity.as_ref()
    }

    /// Post the blocks as a new message if we've not yet got one, otherwise
    /// replace the content of the existing message with them.
    pub async fn dispatch(&mut self, blocks: &[Block]) -> Result<Route, SlackError> {
        if self.identity.is_none() {
            self.create(blocks).await?;
            Ok(Route::Create)
        } else {
            self.update(blocks).await?;
            Ok(Route::Update)
        }
    }

    async fn create(&mut self, blocks: &[Block]) -> Result<(), SlackError> {
        if !self.send_to_slack {
            info!(
                channel = %self.channel,
                blocks = %preview(blocks),
                "Block message to Slack (dry run)"
            );
            return Ok(());
        }

        let transport = &self.transport;
        let channel = &self.channel;
        let posted = retry_once("chat.postMessage", move || {
            transport.create_message(channel, blocks)
        })
        .await?;

        let identity = posted.into_identity()?;
        info!(channel = %identity.channel, ts = %identity.ts, "Successfully sent message block");
        self.identity = Some(identity);

        Ok(())
    }

    /// Replace the content of the message previously posted by this
    /// delivery. Fails if there isn't one, unless this is a dry run.
    pub async fn update(&mut self, blocks: &[Block]) -> Result<(), SlackError> {
        if !self.send_to_slack {
            info!(
                channel = %self.channel,
                blocks = %preview(blocks),
                "Block message update to Slack (dry run)"
            );
            return Ok(());
        }

        let identity = self.identity.as_ref().ok_or_else(|| {
            SlackError::InconsistentState("no message has been posted to update".into())
        })?;

        let transport = &self.transport;
        let posted = retry_once("chat.update", move || {
            transport.update_message(identity, blocks)
        })
        .await?;

        // Leave the previous identity in place should this fail.
        let identity = posted.into_identity()?;
        info!(channel = %identity.channel, ts = %identity.ts, "Successfully updated message block");
        self.identity = Some(identity);

        Ok(())
    }

    /// A standalone message, unrelated to the block message.
    pub async fn post_text(&self, text: &str) -> Result<(), SlackError> {
        if !self.send_to_slack {
            info!(channel = %self.channel, text, "Simple message to Slack (dry run)");
            return Ok(());
        }

        let transport = &self.transport;
        let channel = &self.channel;
        retry_once("chat.postMessage", move || transport.post_text(channel, text)).await?;

        info!(channel = %self.channel, "Successfully posted simple message");
        Ok(())
    }

    /// A standalone message visible only to `member`.
    pub async fn post_ephemeral(&self, text: &str, member: &MemberId) -> Result<(), SlackError> {
        if !self.send_to_slack {
            info!(
                channel = %self.channel,
                member = %member,
                text,
                "Secret message to Slack (dry run)"
            );
            return Ok(());
        }

        let transport = &self.transport;
        let channel = &self.channel;
        let res = retry_once("chat.postEphemeral", move || {
            transport.post_ephemeral(channel, text, member)
        })
        .await;

        match res {
            Ok(()) => {
                info!(channel = %self.channel, member = %member, "Successfully posted secret message");
                Ok(())
            }
            Err(e) if is_unknown_user(&e) => Err(SlackError::InvalidRecipient(member.clone())),
            Err(e) => Err(e),
        }
    }
}

/// Make the call, and should we be rate limited, back off and make it exactly
/// once more. A second rate limit is returned as-is.
async fn retry_once<F, Fut, R>(method: &str, mut call: F) -> Result<R, SlackError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, SlackError>>,
{
    match call().await {
        Err(SlackError::RateLimited { retry_after }) => {
            let delay = backoff::delay(retry_after);
            warn!(
                method,
                ?retry_after,
                delay_secs = delay.as_secs_f64(),
                "Rate limit exceeded, retrying after backoff"
            );

            tokio::time::sleep(delay).await;
            call().await
        }
        res => res,
    }
}

/// Parse Slack's API response error to determine if the recipient of a
/// private message doesn't exist, or can't see the channel.
fn is_unknown_user(e: &SlackError) -> bool {
    match e {
        SlackError::RemoteRequestFailed(e) => e == "user_not_found" || e == "user_not_in_channel",
        _ => false,
    }
}

/// What would have been sent, as Slack would have received it.
fn preview(blocks: &[Block]) -> String {
    serde_json::to_string(blocks).unwrap_or_else(|e| format!("<unserialisable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::channel::ChannelId;
    use crate::slack::stub::{self, Call, Reply, StubTransport};
    use std::time::Duration;
    use tokio::time::Instant;

    fn delivery(stub: &StubTransport, send_to_slack: bool) -> Delivery<StubTransport> {
        Delivery::new(
            stub.clone(),
            ChannelName("data-jobs".into()),
            send_to_slack,
        )
    }

    #[tokio::test]
    async fn test_dispatch_creates_then_updates() {
        let stub = StubTransport::new();
        let mut d = delivery(&stub, true);

        assert_eq!(d.dispatch(&[Block::text("a")]).await.unwrap(), Route::Create);
        assert_eq!(
            d.identity().unwrap().channel,
            ChannelId(stub::CHANNEL_ID.into())
        );

        let blocks = [Block::text("a"), Block::Divider];
        assert_eq!(d.dispatch(&blocks).await.unwrap(), Route::Update);

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            Call::Create {
                channel: ChannelName("data-jobs".into()),
                blocks: vec![Block::text("a")],
            }
        );
        match &calls[1] {
            Call::Update { identity, blocks } => {
                assert_eq!(identity.ts.0, stub::TS);
                assert_eq!(blocks.len(), 2);
            }
            x => panic!("expected update, got {:?}", x),
        }
    }

    #[tokio::test]
    async fn test_dry_run_always_creates() {
        let stub = StubTransport::new();
        let mut d = delivery(&stub, false);

        assert_eq!(d.dispatch(&[Block::Divider]).await.unwrap(), Route::Create);
        assert_eq!(d.dispatch(&[Block::Divider]).await.unwrap(), Route::Create);

        assert!(d.identity().is_none());
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_update_without_identity() {
        let stub = StubTransport::new();
        let mut d = delivery(&stub, false);

        d.update(&[Block::Divider]).await.unwrap();
        d.post_text("hello").await.unwrap();
        d.post_ephemeral("psst", &MemberId::parse("U1").unwrap())
            .await
            .unwrap();

        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_identity() {
        let stub = StubTransport::new();
        let mut d = delivery(&stub, true);

        assert!(matches!(
            d.update(&[Block::Divider]).await,
            Err(SlackError::InconsistentState(_))
        ));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_leaves_identity_absent() {
        let stub = StubTransport::replying([Reply::Remote("channel_not_found")]);
        let mut d = delivery(&stub, true);

        assert!(matches!(
            d.dispatch(&[Block::Divider]).await,
            Err(SlackError::RemoteRequestFailed(e)) if e == "channel_not_found"
        ));
        assert!(d.identity().is_none());

        // The next dispatch tries to create the message again.
        assert_eq!(d.dispatch(&[Block::Divider]).await.unwrap(), Route::Create);
        assert!(stub.calls().iter().all(Call::is_create));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let stub = StubTransport::replying([Reply::Malformed]);
        let mut d = delivery(&stub, true);

        assert!(matches!(
            d.dispatch(&[Block::Divider]).await,
            Err(SlackError::InconsistentState(_))
        ));
        assert!(d.identity().is_none());
    }

    #[tokio::test]
    async fn test_malformed_update_keeps_identity() {
        let stub = StubTransport::replying([Reply::Ok, Reply::Malformed]);
        let mut d = delivery(&stub, true);

        d.dispatch(&[Block::Divider]).await.unwrap();
        let before = d.identity().cloned();

        assert!(matches!(
            d.dispatch(&[Block::Divider]).await,
            Err(SlackError::InconsistentState(_))
        ));
        assert_eq!(d.identity().cloned(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_once() {
        let stub = StubTransport::replying([Reply::RateLimited(Some(2))]);
        let mut d = delivery(&stub, true);

        let start = Instant::now();
        assert_eq!(d.dispatch(&[Block::Divider]).await.unwrap(), Route::Create);
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(2), "{:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(12), "{:?}", elapsed);
        assert_eq!(stub.calls().len(), 2);
        assert!(d.identity().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_twice() {
        let stub = StubTransport::replying([
            Reply::RateLimited(Some(1)),
            Reply::RateLimited(Some(1)),
            Reply::Ok,
        ]);
        let mut d = delivery(&stub, true);

        assert!(matches!(
            d.dispatch(&[Block::Divider]).await,
            Err(SlackError::RateLimited { .. })
        ));
        assert_eq!(stub.calls().len(), 2);
        assert!(d.identity().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_hint_is_capped() {
        let stub = StubTransport::replying([Reply::RateLimited(Some(600))]);
        let d = delivery(&stub, true);

        let start = Instant::now();
        d.post_text("hello").await.unwrap();

        assert!(start.elapsed() <= Duration::from_secs(40));
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_post_ephemeral_unknown_user() {
        let stub = StubTransport::replying([Reply::Remote("user_not_found")]);
        let d = delivery(&stub, true);
        let member = MemberId::parse("U404").unwrap();

        assert!(matches!(
            d.post_ephemeral("psst", &member).await,
            Err(SlackError::InvalidRecipient(m)) if m == member
        ));
    }

    #[tokio::test]
    async fn test_post_ephemeral_other_error() {
        let stub = StubTransport::replying([Reply::Remote("channel_not_found")]);
        let d = delivery(&stub, true);
        let member = MemberId::parse("U1").unwrap();

        assert!(matches!(
            d.post_ephemeral("psst", &member).await,
            Err(SlackError::RemoteRequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_post_text_leaves_identity_alone() {
        let stub = StubTransport::new();
        let d = delivery(&stub, true);

        d.post_text("hello").await.unwrap();

        assert!(d.identity().is_none());
        assert_eq!(
            stub.calls(),
            vec![Call::Text {
                channel: ChannelName("data-jobs".into()),
                text: "hello".into(),
            }]
        );
    }
}
