// League data service adapter.
//
// Three read-only queries keyed by league identifier. Responses are decoded
// straight into the typed contracts from `draftcast_core::league`, so a
// response missing a required field fails here rather than deep inside the
// pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use draftcast_core::config::ApiConfig;
use draftcast_core::league::{MatchResults, RawStanding, SquadRecord};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build league HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("league request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("league service returned status {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed league response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// LeagueSource
// ---------------------------------------------------------------------------

/// Read access to one league's standings, squads, and match results.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    async fn standings(&self, league_id: &str) -> Result<Vec<RawStanding>, SourceError>;
    async fn squads(&self, league_id: &str) -> Result<Vec<SquadRecord>, SourceError>;
    async fn match_results(&self, league_id: &str) -> Result<MatchResults, SourceError>;
}

// ---------------------------------------------------------------------------
// HttpLeagueSource
// ---------------------------------------------------------------------------

/// `LeagueSource` backed by the league data service's JSON endpoints:
/// `{base}/leagues/{id}/standings`, `/squads` and `/match-results`.
pub struct HttpLeagueSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLeagueSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, SourceError> {
        Self::new(&api.base_url, Duration::from_secs(api.timeout_secs))
    }

    fn url(&self, league_id: &str, resource: &str) -> String {
        format!("{}/leagues/{league_id}/{resource}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        league_id: &str,
        resource: &str,
    ) -> Result<T, SourceError> {
        let url = self.url(league_id, resource);
        debug!(%url, "fetching league data");

        let transport = |source: reqwest::Error| SourceError::Transport {
            url: url.clone(),
            source,
        };
        let response = self.http.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(SourceError::Status { url, status, body });
        }

        serde_json::from_str(&body).map_err(|source| SourceError::Decode { url, source })
    }
}

#[async_trait]
impl LeagueSource for HttpLeagueSource {
    async fn standings(&self, league_id: &str) -> Result<Vec<RawStanding>, SourceError> {
        self.get_json(league_id, "standings").await
    }

    async fn squads(&self, league_id: &str) -> Result<Vec<SquadRecord>, SourceError> {
        self.get_json(league_id, "squads").await
    }

    async fn match_results(&self, league_id: &str) -> Result<MatchResults, SourceError> {
        self.get_json(league_id, "match-results").await
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
