//! Helpers around Slack's use of OAuth Bearer Authentication.

use std::fmt;

/// A newtype wrapper around Slack bot tokens, typically `xoxb-` prefixed.
#[derive(PartialEq, Eq, Clone)]
pub struct SlackAccessToken(pub String);

/// Tokens end up in config structs that get logged, so never print them.
impl fmt::Debug for SlackAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlackAccessToken(<redacted>)")
    }
}

/// Convert a Slack access token to a `Bearer` `Authorization` header value.
///
/// ```
/// use courier::slack::auth::{to_auth_header_val, SlackAccessToken};
///
/// let token = SlackAccessToken("xoxb-foo".into());
/// assert_eq!(to_auth_header_val(&token), "Bearer xoxb-foo");
/// ```
pub fn to_auth_header_val(t: &SlackAccessToken) -> String {
    format!("Bearer {}", t.0)
}
