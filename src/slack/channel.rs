//! Channel naming. Consumers configure a channel by name, whereas Slack hands
//! back channel IDs once a message has been posted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel names as are visible in the Slack UI, with or without the leading
/// hash.
///
/// ```
/// use courier::slack::channel::ChannelName;
///
/// let with = ChannelName("#playground".into());
/// let without = ChannelName("playground".into());
/// assert_eq!(with.to_target(), without.to_target());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelName(pub String);

impl ChannelName {
    /// The form `chat.postMessage` accepts in lieu of a channel ID.
    ///
    /// Channel names can't contain hashes, so stripping any supplied hash
    /// before adding our own supports consumers supplying one or not.
    pub fn to_target(&self) -> String {
        format!("#{}", self.0.trim_start_matches('#'))
    }
}

/// Format without the surrounding newtype wrapper.
impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Because channel names can change, Slack refers to channels by their
/// underlying ID in its responses. Updates must target the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_target() {
        assert_eq!(ChannelName("data-jobs".into()).to_target(), "#data-jobs");
        assert_eq!(ChannelName("#data-jobs".into()).to_target(), "#data-jobs");
        assert_eq!(format!("{}", ChannelName("fp".into())), "fp");
    }
}
