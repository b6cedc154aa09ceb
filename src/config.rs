//! Client configuration.
//!
//! The client itself never reads the environment. [from_env] exists for
//! binaries, which are expected to have loaded any `.env` file beforehand.

use crate::slack::{
    auth::SlackAccessToken,
    channel::ChannelName,
    mention::{MemberId, Stakeholders},
};
use chrono_tz::Tz;
use std::{env, fmt};

/// Everything a [crate::slack::client::SlackClient] needs, fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: SlackAccessToken,
    pub channel: ChannelName,
    /// When present the client introduces the job as soon as it's opened.
    pub header: Option<String>,
    pub stakeholders: Stakeholders,
    /// Unless set, messages are logged rather than sent.
    pub send_to_slack: bool,
    /// Used to date the introduction.
    pub timezone: Tz,
}

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Amsterdam;

impl ClientConfig {
    /// A dry-run configuration with no header or stakeholders.
    pub fn new(token: SlackAccessToken, channel: ChannelName) -> Self {
        ClientConfig {
            token,
            channel,
            header: None,
            stakeholders: Stakeholders::new(),
            send_to_slack: false,
            timezone: DEFAULT_TIMEZONE,
        }
    }

    pub fn with_header<T: Into<String>>(mut self, header: T) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_stakeholders(mut self, stakeholders: Stakeholders) -> Self {
        self.stakeholders = stakeholders;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn live(mut self, send_to_slack: bool) -> Self {
        self.send_to_slack = send_to_slack;
        self
    }
}

/// Sum type representing every way configuration can be unusable.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            ConfigError::Missing(k) => format!("No ${} environment variable found", k),
            ConfigError::Invalid { key, reason } => format!("Invalid ${}: {}", key, reason),
        };

        write!(f, "{}", x)
    }
}

impl std::error::Error for ConfigError {}

pub const TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
pub const CHANNEL_VAR: &str = "SLACK_CHANNEL";
pub const HEADER_VAR: &str = "SLACK_JOB_HEADER";
pub const STAKEHOLDERS_VAR: &str = "SLACK_STAKEHOLDERS";
pub const SEND_VAR: &str = "SEND_TO_SLACK";
pub const TIMEZONE_VAR: &str = "SLACK_TIMEZONE";

/// Read configuration from the process environment.
pub fn from_env() -> Result<ClientConfig, ConfigError> {
    from_lookup(|k| env::var(k).ok())
}

/// Read configuration from any source of string variables.
pub fn from_lookup<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &'static str| {
        lookup(key)
            .filter(|x| !x.trim().is_empty())
            .ok_or(ConfigError::Missing(key))
    };
    let optional = |key: &str| lookup(key).filter(|x| !x.trim().is_empty());

    let token = SlackAccessToken(required(TOKEN_VAR)?);
    let channel = ChannelName(required(CHANNEL_VAR)?);

    let stakeholders = match optional(STAKEHOLDERS_VAR) {
        Some(x) => parse_stakeholders(&x)?,
        None => Stakeholders::new(),
    };

    let timezone = match optional(TIMEZONE_VAR) {
        Some(x) => x.trim().parse().map_err(|e| ConfigError::Invalid {
            key: TIMEZONE_VAR,
            reason: format!("{}", e),
        })?,
        None => DEFAULT_TIMEZONE,
    };

    let send_to_slack = optional(SEND_VAR)
        .map(|x| x.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let mut config = ClientConfig::new(token, channel)
        .with_stakeholders(stakeholders)
        .with_timezone(timezone)
        .live(send_to_slack);
    config.header = optional(HEADER_VAR);

    Ok(config)
}

/// Parse comma-separated `name=MEMBERID` pairs.
///
/// ```
/// use courier::config::parse_stakeholders;
///
/// let xs = parse_stakeholders("amy=U1, bo=U2").unwrap();
/// assert_eq!(xs.render_tags(), "<@U1>\n<@U2>\n");
/// ```
pub fn parse_stakeholders(x: &str) -> Result<Stakeholders, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: STAKEHOLDERS_VAR,
        reason,
    };

    x.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, id) = pair
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected name=MEMBERID, found {}", pair)))?;
            let id = MemberId::parse(id.trim()).map_err(|e| invalid(e.to_string()))?;

            Ok((name.trim().to_owned(), id))
        })
        .collect()
}
