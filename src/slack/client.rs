//! The client a batch job holds onto for the duration of its run.
//!
//! ```no_run
//! use courier::config::ClientConfig;
//! use courier::slack::{
//!     api::{WebApi, API_BASE},
//!     auth::SlackAccessToken,
//!     channel::ChannelName,
//!     client::SlackClient,
//!     message::AppendOptions,
//! };
//!
//! # async fn run() -> Result<(), courier::slack::error::SlackError> {
//! let token = SlackAccessToken("xoxb-foo".into());
//! let config = ClientConfig::new(token.clone(), ChannelName("data-jobs".into()))
//!     .with_header("Nightly export")
//!     .live(true);
//!
//! let api = WebApi::new(API_BASE.into(), token)?;
//! let mut slack = SlackClient::open(config, api).await?;
//!
//! slack.append_message("Exported 1204 rows", AppendOptions::default()).await?;
//! slack.append_success(false).await?;
//! # Ok(())
//! # }
//! ```

use super::{
    block::Block,
    delivery::Delivery,
    error::SlackError,
    mention::{MemberId, Stakeholders},
    message::{error_blocks, message_block, success_block, AppendOptions, MessageBuilder},
    transport::{MessageIdentity, Transport},
};
use crate::config::ClientConfig;
use chrono::Utc;
use chrono_tz::Tz;
use tracing::{error, warn};

/// One evolving message in one channel.
///
/// Delivery is best effort: failures to reach Slack are logged and otherwise
/// ignored, so that a job's outcome never depends upon Slack. The exceptions
/// are those failures for which [SlackError::is_fatal] holds, and bad input.
pub struct SlackClient<T> {
    builder: MessageBuilder,
    delivery: Delivery<T>,
    stakeholders: Stakeholders,
    timezone: Tz,
    header: Option<String>,
}

impl<T: Transport> SlackClient<T> {
    /// Construct a client without sending anything.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        SlackClient {
            builder: MessageBuilder::new(),
            delivery: Delivery::new(transport, config.channel, config.send_to_slack),
            stakeholders: config.stakeholders,
            timezone: config.timezone,
            header: config.header,
        }
    }

    /// Construct a client and, if the configuration names the job, introduce
    /// it straight away.
    pub async fn open(config: ClientConfig, transport: T) -> Result<Self, SlackError> {
        let mut client = Self::new(config, transport);

        if let Some(header) = client.header.clone() {
            client.initialize(&header).await?;
        }

        Ok(client)
    }

    /// Start the message afresh with an introduction of the job, dated now.
    pub async fn initialize(&mut self, header: &str) -> Result<(), SlackError> {
        let now = Utc::now().with_timezone(&self.timezone);
        self.builder.initialize(header, now)?;
        self.publish().await
    }

    /// Add a progress update. A temporary update is dropped locally once sent,
    /// and so disappears from Slack upon the next change to the message.
    pub async fn append_message(
        &mut self,
        text: &str,
        opts: AppendOptions,
    ) -> Result<(), SlackError> {
        let tags = self.tags(opts.tag_stakeholders);
        self.builder.push(message_block(text, opts.image, tags));

        let res = self.publish().await;

        if opts.temporary {
            self.builder.pop();
        }

        res
    }

    pub async fn append_success(&mut self, tag_stakeholders: bool) -> Result<(), SlackError> {
        let tags = self.tags(tag_stakeholders);
        self.builder.push(success_block(tags));
        self.publish().await
    }

    pub async fn append_error(
        &mut self,
        error_message: Option<&str>,
        tag_stakeholders: bool,
    ) -> Result<(), SlackError> {
        let tags = self.tags(tag_stakeholders);
        self.builder.extend(error_blocks(error_message, tags));
        self.publish().await
    }

    /// Post a standalone message, leaving the block message untouched.
    pub async fn post_plain_message(
        &self,
        text: &str,
        tag_stakeholders: bool,
    ) -> Result<(), SlackError> {
        let mut message = text.to_owned();

        if let Some(tags) = self.tags(tag_stakeholders) {
            message.push('\n');
            message.push_str(&tags);
        }

        report(self.delivery.post_text(&message).await, "simple message")
    }

    /// Post a standalone message visible only to the given member.
    pub async fn post_private_message(&self, text: &str, member_id: &str) -> Result<(), SlackError> {
        let member = MemberId::parse(member_id)?;

        match self.delivery.post_ephemeral(text, &member).await {
            Err(e @ SlackError::InvalidRecipient(_)) => {
                error!(error = %e, "Failed to send secret message to Slack");
                Err(e)
            }
            res => report(res, "secret message"),
        }
    }

    pub fn render_stakeholder_tags(&self) -> String {
        self.stakeholders.render_tags()
    }

    pub fn blocks(&self) -> &[Block] {
        self.builder.blocks()
    }

    pub fn identity(&self) -> Option<&MessageIdentity> {
        self.delivery.identity()
    }

    /// Tags are only worth adding when there's someone to tag.
    fn tags(&self, requested: bool) -> Option<String> {
        if requested && !self.stakeholders.is_empty() {
            Some(self.render_stakeholder_tags())
        } else {
            None
        }
    }

    async fn publish(&mut self) -> Result<(), SlackError> {
        let res = self.delivery.dispatch(self.builder.blocks()).await;
        report(res.map(|_| ()), "block message")
    }
}

/// Apply our delivery policy to the outcome of a send.
fn report(res: Result<(), SlackError>, what: &str) -> Result<(), SlackError> {
    match res {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => {
            error!(error = %e, what, "Failed to send to Slack");
            Err(e)
        }
        Err(e) => {
            warn!(error = %e, what, "Failed to send to Slack, continuing");
            Ok(())
        }
    }
}
