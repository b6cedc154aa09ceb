//! Report a job to Slack from the command line.
//!
//! ```text
//! courier "Exported 1204 rows" "Uploaded to bucket"
//! ```
//!
//! Introduces the job named by `$SLACK_JOB_HEADER`, appends one block per
//! argument, and finishes with a success block. Nothing is sent unless
//! `$SEND_TO_SLACK` is `true`. See [courier::config] for every variable read.

use courier::config;
use courier::slack::{
    api::{WebApi, API_BASE},
    client::SlackClient,
    error::SlackError,
    message::AppendOptions,
};
use dotenvy::dotenv;
use std::{env, process::ExitCode};
use tracing::{error, warn};

const DEFAULT_HEADER: &str = "courier";

/// Application entrypoint. Initialises tracing, checks for environment
/// variables, and reports each argument as a step of the job.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let has_dotenv = dotenv().is_ok();
    if !has_dotenv {
        warn!("No .env found");
    }

    let mut config = match config::from_env() {
        Ok(x) => x,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.header.is_none() {
        config.header = Some(DEFAULT_HEADER.into());
    }

    let steps: Vec<String> = env::args().skip(1).collect();

    match run(config, &steps).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: config::ClientConfig, steps: &[String]) -> Result<(), SlackError> {
    let api = WebApi::new(API_BASE.into(), config.token.clone())?;
    let mut slack = SlackClient::open(config, api).await?;

    for step in steps {
        slack
            .append_message(step, AppendOptions::default())
            .await?;
    }

    slack.append_success(false).await
}
