/// Blocking client for the remote rewards API.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::reward::{RewardReceipt, RewardSubmitter, SubmitError};

/// Dashboard counters from `GET /estado`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Status {
    #[serde(rename = "puntos_consideracion", default)]
    pub consideration_points: u32,
    #[serde(rename = "estrellas", default)]
    pub stars: u32,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionBody {
    #[serde(alias = "mensaje")]
    message: Option<String>,
    #[serde(alias = "estrellas")]
    stars: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `POST /completar-juego`: grant the stars for a finished mini-game.
    pub fn complete_game(&self) -> Result<RewardReceipt, SubmitError> {
        let resp = self
            .http
            .post(self.url("completar-juego"))
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let resp = check_status(resp)?;
        let text = resp
            .text()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        // The grant already happened; an odd body only costs us the receipt.
        let body = serde_json::from_str::<CompletionBody>(&text).unwrap_or_else(|e| {
            log::debug!("completion body not understood ({e}): {text}");
            CompletionBody::default()
        });
        Ok(RewardReceipt {
            message: body.message,
            stars: body.stars,
        })
    }

    /// `GET /estado`: current points and stars.
    pub fn status(&self) -> Result<Status, SubmitError> {
        let resp = self
            .http
            .get(self.url("estado"))
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        check_status(resp)?
            .json::<Status>()
            .map_err(|e| SubmitError::Decode(e.to_string()))
    }
}

fn check_status(resp: Response) -> Result<Response, SubmitError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().unwrap_or_default();
    Err(SubmitError::Rejected {
        status: status.as_u16(),
        detail: error_detail(&text),
    })
}

/// The service reports failures as `{"detail": "..."}`; anything else is
/// passed through as-is.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: Some(d) }) => d,
        _ if body.trim().is_empty() => "no details".to_string(),
        _ => body.trim().to_string(),
    }
}

impl RewardSubmitter for ApiClient {
    fn submit_match_completion(&mut self) -> Result<RewardReceipt, SubmitError> {
        self.complete_game()
    }
}
