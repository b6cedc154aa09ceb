//! Type definitions and helpers for the Slack Web API, and the production
//! [Transport] built upon them.

use super::{
    auth::*,
    block::{fallback_text, Block},
    channel::ChannelName,
    error::SlackError,
    mention::MemberId,
    transport::{MessageIdentity, PostedMessage, Transport},
};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, NoneAsEmptyString};
use tracing::{error, info};

/// The base URL of the Slack API.
pub const API_BASE: &str = "https://slack.com/api";

/// Talks to Slack over HTTP. Holds a connection pool internally, as per
/// [reqwest::Client].
pub struct WebApi {
    client: reqwest::Client,
    base: String,
    token: SlackAccessToken,
}

impl WebApi {
    /// The base URL is configurable so that tests can point it elsewhere.
    pub fn new(base: String, token: SlackAccessToken) -> Result<Self, SlackError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            error!(error = ?e, "Could not initialise Slack client");
            SlackError::from(e)
        })?;

        info!("Successfully initialised Slack client");

        Ok(WebApi {
            client,
            base,
            token,
        })
    }

    /// Create a POST request to any Slack API endpoint, handling authentication.
    fn post<T: ToString>(&self, path: T) -> reqwest::RequestBuilder {
        self.client
            .post(self.base.to_owned() + &path.to_string())
            .header(reqwest::header::AUTHORIZATION, to_auth_header_val(&self.token))
    }

    /// POST a JSON body and interpret Slack's response, distinguishing rate
    /// limiting from any other failure.
    async fn call<B, R>(&self, path: &str, body: &B) -> Result<R, SlackError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let res = self.post(path).json(body).send().await?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(SlackError::RateLimited {
                retry_after: parse_retry_after(&res),
            });
        }

        let res: APIResult<R> = res.json().await?;

        match res {
            APIResult::Ok(x) => Ok(x),
            APIResult::Err(res) if is_rate_limited(&res) => {
                Err(SlackError::RateLimited { retry_after: None })
            }
            APIResult::Err(res) => Err(SlackError::RemoteRequestFailed(res.error)),
        }
    }
}

/// The `Retry-After` header holds a number of seconds.
fn parse_retry_after(res: &reqwest::Response) -> Option<u64> {
    res.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Some methods report rate limiting in the body rather than the status.
fn is_rate_limited(res: &ErrorResponse) -> bool {
    res.error == "ratelimited" || res.error == "rate_limited"
}

/// Slack's API returns a common "untagged" response, representing whether a
/// request was successful.
///
/// ```json
/// {
///     "ok": true,
///     "channel": "C123ABC456",
///     "ts": "1503435956.000247"
/// }
/// ```
///
/// ```json
/// {
///     "ok": false,
///     "error": "invalid_auth"
/// }
/// ```
#[derive(Deserialize)]
#[serde(untagged)]
enum APIResult<T> {
    Ok(T),
    Err(ErrorResponse),
}

/// The universal response in case of an unsuccessful request.
// The `ok` field is checked here, and should be checked on responses too,
// primarily to ensure appropriate deserialization behaviour in case of an
// otherwise empty successful response.
#[derive(Deserialize)]
struct ErrorResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_false")]
    ok: bool,
    error: String,
}

/// <https://api.slack.com/methods/chat.postMessage#args>
#[skip_serializing_none]
#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: String,
    blocks: Option<&'a [Block]>,
    // Used for notifications in the presence of `blocks`.
    text: Option<&'a str>,
}

/// <https://api.slack.com/methods/chat.update#args>
#[skip_serializing_none]
#[derive(Serialize)]
struct UpdateRequest<'a> {
    channel: &'a str,
    ts: &'a str,
    blocks: &'a [Block],
    text: Option<&'a str>,
}

/// <https://api.slack.com/methods/chat.postEphemeral#args>
#[derive(Serialize)]
struct EphemeralRequest<'a> {
    channel: String,
    text: &'a str,
    user: &'a str,
}

/// Both `chat.postMessage` and `chat.update` identify the message.
///
/// <https://api.slack.com/methods/chat.update#examples>
#[serde_as]
#[derive(Deserialize)]
struct MessageResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_true")]
    ok: bool,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    channel: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    ts: Option<String>,
}

impl From<MessageResponse> for PostedMessage {
    fn from(res: MessageResponse) -> Self {
        PostedMessage {
            channel: res.channel,
            ts: res.ts,
        }
    }
}

/// For calls where we only care that Slack accepted them.
#[derive(Deserialize)]
struct AckResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_true")]
    ok: bool,
}

#[async_trait]
impl Transport for WebApi {
    async fn create_message(
        &self,
        channel: &ChannelName,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError> {
        let res: MessageResponse = self
            .call(
                "/chat.postMessage",
                &PostMessageRequest {
                    channel: channel.to_target(),
                    blocks: Some(blocks),
                    text: fallback_text(blocks),
                },
            )
            .await?;

        Ok(res.into())
    }

    async fn update_message(
        &self,
        identity: &MessageIdentity,
        blocks: &[Block],
    ) -> Result<PostedMessage, SlackError> {
        let res: MessageResponse = self
            .call(
                "/chat.update",
                &UpdateRequest {
                    channel: &identity.channel.0,
                    ts: &identity.ts.0,
                    blocks,
                    text: fallback_text(blocks),
                },
            )
            .await?;

        Ok(res.into())
    }

    async fn post_text(&self, channel: &ChannelName, text: &str) -> Result<(), SlackError> {
        let _: AckResponse = self
            .call(
                "/chat.postMessage",
                &PostMessageRequest {
                    channel: channel.to_target(),
                    blocks: None,
                    text: Some(text),
                },
            )
            .await?;

        Ok(())
    }

    async fn post_ephemeral(
        &self,
        channel: &ChannelName,
        text: &str,
        member: &MemberId,
    ) -> Result<(), SlackError> {
        let _: AckResponse = self
            .call(
                "/chat.postEphemeral",
                &EphemeralRequest {
                    channel: channel.to_target(),
                    text,
                    user: member.as_str(),
                },
            )
            .await?;

        Ok(())
    }
}
