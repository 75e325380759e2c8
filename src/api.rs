// API client module: a small blocking HTTP client that posts match results
// to the configured scoreboard endpoint. One request per call, no retries.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::settings::Settings;

/// Failures while posting a result.
#[derive(Debug, Error)]
pub enum PostError {
    /// No target configured; nothing was sent.
    #[error("cannot post with empty URL")]
    EmptyUrl,

    /// Server answered with something other than 200 / 201.
    #[error("on request: got code {0}")]
    UnexpectedStatus(u16),

    #[error("request failed")]
    Request(#[from] reqwest::Error),
}

/// Thin wrapper around a reqwest blocking client. No timeout is set, so
/// requests run to the transport defaults.
#[derive(Clone)]
pub struct ResultClient {
    client: Client,
}

impl ResultClient {
    pub fn new() -> Result<Self, PostError> {
        let client = Client::builder()
            .user_agent(concat!("gobeat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ResultClient { client })
    }

    /// POST `"<user> beat <opponent> at <game> with score <score>"` to
    /// `destination` as a plain text body.
    pub fn post_result(
        &self,
        destination: Option<&Url>,
        settings: &Settings,
        opponent: &str,
        score: &str,
    ) -> Result<(), PostError> {
        let url = match destination {
            Some(url) if !url.as_str().is_empty() => url,
            _ => return Err(PostError::EmptyUrl),
        };

        let body = settings.result_message(opponent, score);
        debug!(%url, %body, "posting result");
        let res = self.client.post(url.clone()).body(body).send()?;

        let status = res.status();
        info!(%url, status = status.as_u16(), "result endpoint responded");
        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            other => Err(PostError::UnexpectedStatus(other.as_u16())),
        }
    }
}
