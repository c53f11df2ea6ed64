use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CardId, CardInfo},
    error::{ApiError, ApiException},
    protocol::{Reading, ReadingRequest, ReadingResponse},
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod config;
pub mod controller;
pub mod deck;
pub mod layout;
pub mod loading;
pub mod selection;
pub mod sequencer;
pub mod session;

pub use config::{load_settings, Settings};
pub use controller::{SelectionController, SessionObserver};
pub use deck::Deck;
pub use layout::{CardPlacement, DeckLayout, FanGeometry, SelectionRow};
pub use loading::{LoadingGuard, LoadingIndicator};
pub use selection::{SelectionState, SelectionStatus};
pub use sequencer::{CardFrame, Cue, CueEffect, SequencerTimings, Timeline, TimelinePlayer};
pub use session::{
    reduce, CardVisual, Notice, NoticeLevel, SessionAction, SessionEffect, SessionPhase,
    SessionState, SubmitError,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("reading service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{}", .0.message)]
    Rejected(#[from] ApiException),
    #[error("malformed response from reading service (HTTP {status}): {reason}")]
    Malformed { status: u16, reason: String },
    #[error("invalid reading service endpoint: {0}")]
    Endpoint(String),
    #[error("reading service is not configured")]
    Unavailable,
}

/// The remote side of a session: card metadata and reading generation.
#[async_trait]
pub trait ReadingBackend: Send + Sync {
    async fn fetch_card(&self, id: CardId) -> Result<CardInfo, BackendError>;
    async fn fetch_reading(&self, request: &ReadingRequest) -> Result<Reading, BackendError>;
}

pub struct MissingReadingBackend;

#[async_trait]
impl ReadingBackend for MissingReadingBackend {
    async fn fetch_card(&self, _id: CardId) -> Result<CardInfo, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn fetch_reading(&self, _request: &ReadingRequest) -> Result<Reading, BackendError> {
        Err(BackendError::Unavailable)
    }
}

pub struct HttpReadingBackend {
    http: Client,
    settings: Settings,
}

impl HttpReadingBackend {
    pub fn new(settings: Settings) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl ReadingBackend for HttpReadingBackend {
    async fn fetch_card(&self, id: CardId) -> Result<CardInfo, BackendError> {
        let url = self
            .settings
            .card_url(id.index())
            .map_err(|err| BackendError::Endpoint(err.to_string()))?;
        debug!(card = %id, %url, "fetching card metadata");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(rejection(status, &body).into());
        }
        parse_body(status, &body)
    }

    async fn fetch_reading(&self, request: &ReadingRequest) -> Result<Reading, BackendError> {
        let url = self
            .settings
            .reading_url()
            .map_err(|err| BackendError::Endpoint(err.to_string()))?;
        debug!(
            %url,
            reading_type = %request.reading_type,
            cards = request.selected_cards.len(),
            "requesting reading"
        );

        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let envelope: ReadingResponse = match parse_body(status, &body) {
            Ok(envelope) => envelope,
            Err(err) if !status.is_success() => {
                warn!("unreadable error body from reading service: {err}");
                return Err(rejection(status, &body).into());
            }
            Err(err) => return Err(err),
        };
        Ok(envelope.into_result(status.as_u16())?)
    }
}

fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|err| BackendError::Malformed {
        status: status.as_u16(),
        reason: err.to_string(),
    })
}

fn rejection(status: StatusCode, body: &[u8]) -> ApiException {
    let api_error = serde_json::from_slice::<ApiError>(body)
        .unwrap_or_else(|_| ApiError::new(format!("HTTP {status}")));
    ApiException::from_api_error(status.as_u16(), api_error)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
