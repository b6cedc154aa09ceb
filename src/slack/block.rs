use serde::ser::SerializeStruct;
use serde::{ser, Serialize};
use url::Url;

/// Slack's block API is its most modern, and allows us to mix rich formatting
/// with images. This is our limited subset thereof.
///
/// <https://api.slack.com/reference/block-kit/blocks>
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A row of small text and images.
    ///
    /// <https://api.slack.com/reference/block-kit/blocks#context>
    Context(Vec<Element>),
    Divider,
}

/// The content permitted within a [Block::Context]. Images only exist here,
/// so there's no way to express an image elsewhere in a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// "mrkdwn" is Slack's alternative to Markdown.
    ///
    /// <https://api.slack.com/reference/surfaces/formatting#basics>
    Text(String),
    Image(Image),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub url: Url,
    pub alt_text: String,
}

impl Block {
    /// A context block holding a single piece of text.
    pub fn text<T: Into<String>>(x: T) -> Self {
        Block::Context(vec![Element::Text(x.into())])
    }

    /// All text held within the block, in display order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        let elements: &[Element] = match self {
            Block::Context(xs) => xs,
            Block::Divider => &[],
        };

        elements.iter().filter_map(|x| match x {
            Element::Text(t) => Some(t.as_str()),
            Element::Image(_) => None,
        })
    }
}

/// Messages containing blocks should still provide top-level text, which is
/// used for notifications. The first text in the message is the most
/// descriptive we've got.
pub fn fallback_text(blocks: &[Block]) -> Option<&str> {
    blocks.iter().flat_map(Block::texts).next()
}

impl ser::Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            Block::Context(xs) => {
                let mut state = serializer.serialize_struct("Block", 2)?;
                state.serialize_field("type", "context")?;
                state.serialize_field("elements", xs)?;
                state.end()
            }

            Block::Divider => {
                let mut state = serializer.serialize_struct("Block", 1)?;
                state.serialize_field("type", "divider")?;
                state.end()
            }
        }
    }
}

// Element types differ in their fields, so unlike `Block::Context` these
// can't share a struct shape.
#[derive(Serialize)]
struct RawTextElement<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
struct RawImageElement<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    image_url: &'a str,
    alt_text: &'a str,
}

impl ser::Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            Element::Text(x) => RawTextElement {
                typ: "mrkdwn",
                text: x,
            }
            .serialize(serializer),

            Element::Image(x) => RawImageElement {
                typ: "image",
                image_url: x.url.as_str(),
                alt_text: &x.alt_text,
            }
            .serialize(serializer),
        }
    }
}
