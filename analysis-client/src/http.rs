//! One-shot HTTP submission of a game for initial analysis.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::error::{ClientError, ClientResult};
use crate::protocol::{InitialAnalysis, SubmitGame};

/// Initial analysis of a full game can take a while on the backend.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct AnalysisApi {
    client: Client,
    base_url: String,
}

impl AnalysisApi {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidAddress(base_url));
        }
        let client = Client::builder()
            .user_agent(concat!("gameview/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.base_url)
    }

    /// POST the game and return the backend's initial analysis.
    pub async fn submit_game(
        &self,
        pgn: &str,
        headers: &BTreeMap<String, String>,
    ) -> ClientResult<InitialAnalysis> {
        let body = SubmitGame {
            pgn: pgn.to_string(),
            headers: headers.clone(),
        };

        let resp = self.client.post(self.analyze_url()).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::HttpStatus(resp.status().as_u16()));
        }

        let analysis: InitialAnalysis = resp.json().await?;
        info!(
            moves = analysis.moves.len(),
            session = analysis.session_id.as_deref().unwrap_or("-"),
            "Received initial analysis"
        );
        Ok(analysis)
    }
}
