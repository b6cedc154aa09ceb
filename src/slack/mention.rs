//! Tagging people in messages.
//!
//! Slack mentions refer to member IDs, which can be found in a user's
//! profile in the UI. Names are for humans reading the configuration only.
//!
//! <https://api.slack.com/reference/surfaces/formatting#mentioning-users>

use super::error::SlackError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// A Slack member ID such as `U024BE7LH`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId(String);

static MEMBER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+$").expect("valid member ID pattern"));

impl MemberId {
    /// Check the ID is syntactically plausible. Whether it refers to a real
    /// member is only known by Slack.
    ///
    /// ```
    /// use courier::slack::mention::MemberId;
    ///
    /// assert!(MemberId::parse("U024BE7LH").is_ok());
    /// assert!(MemberId::parse("").is_err());
    /// assert!(MemberId::parse("not an id").is_err());
    /// ```
    pub fn parse<T: Into<String>>(x: T) -> Result<Self, SlackError> {
        let x = x.into();

        if x.is_empty() {
            return Err(SlackError::InvalidArgument("member ID is empty".into()));
        }

        if !MEMBER_ID.is_match(&x) {
            return Err(SlackError::InvalidArgument(format!(
                "malformed member ID: {}",
                x
            )));
        }

        Ok(MemberId(x))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format a member ID to the syntax Slack expects for a mention.
pub fn fmt_mention(m: &MemberId) -> String {
    format!("<@{}>", m)
}

/// The people to tag in progress and error notifications, keyed by display
/// name. Tags are rendered in the order stakeholders were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stakeholders(Vec<(String, MemberId)>);

impl Stakeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stakeholder, replacing the member ID of any existing stakeholder
    /// of the same name in place.
    pub fn insert<T: Into<String>>(&mut self, name: T, id: MemberId) {
        let name = name.into();

        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = id,
            None => self.0.push((name, id)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.0.iter().map(|(_, id)| id)
    }

    /// One mention per line, each line newline-terminated. An empty registry
    /// renders as an empty string.
    pub fn render_tags(&self) -> String {
        self.member_ids()
            .map(|id| format!("{}\n", fmt_mention(id)))
            .collect()
    }
}

impl<T: Into<String>> FromIterator<(T, MemberId)> for Stakeholders {
    fn from_iter<I: IntoIterator<Item = (T, MemberId)>>(iter: I) -> Self {
        let mut xs = Stakeholders::new();
        for (name, id) in iter {
            xs.insert(name, id);
        }
        xs
    }
}
