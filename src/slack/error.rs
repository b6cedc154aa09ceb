use crate::slack::mention::MemberId;
use std::fmt;

/// Sum type representing every possible unexceptional fail state.
#[derive(Debug)]
pub enum SlackError {
    /// Bad input from the caller, such as an empty header.
    InvalidArgument(String),
    /// Slack doesn't know the recipient of a private message.
    InvalidRecipient(MemberId),
    /// Still rate limited after backing off and retrying.
    RateLimited { retry_after: Option<u64> },
    APIRequestFailed(reqwest::Error),
    /// Slack returned an error code.
    RemoteRequestFailed(String),
    /// The remote message identity is missing or malformed where one was
    /// required.
    InconsistentState(String),
}

impl SlackError {
    /// Fatal failures are raised to the caller even during best-effort
    /// progress reporting, as continuing would silently drop the message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SlackError::RateLimited { .. } | SlackError::InconsistentState(_)
        )
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(e: reqwest::Error) -> Self {
        SlackError::APIRequestFailed(e)
    }
}

impl fmt::Display for SlackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            SlackError::InvalidArgument(e) => format!("Invalid argument: {}", e),
            SlackError::InvalidRecipient(m) => format!("Unknown Slack recipient: {}", m),
            SlackError::RateLimited {
                retry_after: Some(s),
            } => format!("Slack API rate limited, retry after {}s", s),
            SlackError::RateLimited { retry_after: None } => "Slack API rate limited".into(),
            SlackError::APIRequestFailed(e) => format!("Slack API request failed: {:?}", e),
            SlackError::RemoteRequestFailed(e) => format!("Slack API returned error: {}", e),
            SlackError::InconsistentState(e) => format!("Inconsistent message state: {}", e),
        };

        write!(f, "{}", x)
    }
}

impl std::error::Error for SlackError {}
