use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use ureq::Agent;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A source of raw now-playing payloads.
pub trait StatusFeed: Send {
    fn fetch(&self) -> Result<Value, FetchError>;
}

/// `GET`s a JSON status document over HTTP.
pub struct HttpFeed {
    agent: Agent,
    url: String,
    user_agent: String,
}

impl HttpFeed {
    pub fn new(url: &str, timeout: Duration, user_agent: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            url: url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    fn transport(&self, source: ureq::Error) -> FetchError {
        FetchError::Transport {
            url: self.url.clone(),
            source,
        }
    }
}

impl StatusFeed for HttpFeed {
    fn fetch(&self) -> Result<Value, FetchError> {
        let mut response = self
            .agent
            .get(&self.url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| self.transport(e))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.transport(e))?;

        Ok(serde_json::from_str(&body)?)
    }
}
