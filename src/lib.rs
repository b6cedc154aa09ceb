//! Report the progress of a batch job to a Slack channel as one evolving
//! structured message.
//!
//! A job constructs a [slack::client::SlackClient], initialises it with a
//! header, and then appends progress, success, or failure blocks as it goes.
//! Every change re-sends the whole message, the first time as a new post and
//! thereafter as an update of that same post.
//!
//! Configuration is supplied by the caller; see [config::ClientConfig].

pub mod config;
mod de;
pub mod slack;
