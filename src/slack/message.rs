//! Build up the blocks of a job's message, one step at a time.
//!
//! Nothing here talks to Slack. See [super::client::SlackClient] for that.

use super::{
    block::{Block, Element, Image},
    error::SlackError,
};
use chrono::DateTime;
use chrono_tz::Tz;

pub const SUCCESS_TEXT: &str = " *Job Successful* !! :tada: ";
pub const FAILURE_TEXT: &str = " *Job Unsuccessful* :disappointed_relieved: ";

/// The blocks of one evolving message, in display order.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Discard any existing blocks in favour of an introduction naming the
    /// job, followed by a divider.
    pub fn initialize(&mut self, header: &str, now: DateTime<Tz>) -> Result<(), SlackError> {
        if header.trim().is_empty() {
            return Err(SlackError::InvalidArgument("header is empty".into()));
        }

        self.blocks = vec![intro_block(header, now), Block::Divider];
        Ok(())
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn extend<I: IntoIterator<Item = Block>>(&mut self, blocks: I) {
        self.blocks.extend(blocks);
    }

    pub fn pop(&mut self) -> Option<Block> {
        self.blocks.pop()
    }
}

fn intro_block(header: &str, now: DateTime<Tz>) -> Block {
    Block::text(format!(
        "Invoking *{}* :on: \nDate: {} \tTime: {}",
        header,
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S"),
    ))
}

/// What may accompany the text of a progress message.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Shown before the text.
    pub image: Option<Image>,
    pub tag_stakeholders: bool,
    /// Drop the block locally once sent. It stays visible in Slack until the
    /// next update replaces the message.
    pub temporary: bool,
}

/// Image first, then the text, then any tags.
pub fn message_block(text: &str, image: Option<Image>, tags: Option<String>) -> Block {
    let mut xs = Vec::with_capacity(3);

    if let Some(image) = image {
        xs.push(Element::Image(image));
    }

    xs.push(Element::Text(text.to_owned()));

    if let Some(tags) = tags {
        xs.push(Element::Text(tags));
    }

    Block::Context(xs)
}

pub fn success_block(tags: Option<String>) -> Block {
    let mut xs = vec![Element::Text(SUCCESS_TEXT.to_owned())];

    if let Some(tags) = tags {
        xs.push(Element::Text(tags));
    }

    Block::Context(xs)
}

/// The failure notice, the error itself, and the tags, each in their own
/// block.
pub fn error_blocks(error_message: Option<&str>, tags: Option<String>) -> Vec<Block> {
    let mut xs = Vec::with_capacity(3);

    xs.push(Block::text(FAILURE_TEXT));

    if let Some(e) = error_message {
        xs.push(Block::text(format!(" *Error Message* : {} \n", e)));
    }

    if let Some(tags) = tags {
        xs.push(Block::text(tags));
    }

    xs
}
