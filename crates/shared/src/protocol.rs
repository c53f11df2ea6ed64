use serde::{Deserialize, Serialize};

use crate::{
    domain::{CardId, CardInfo, ReadingType},
    error::{ApiException, ErrorCode},
};

const GENERIC_READING_FAILURE: &str = "Failed to generate reading";

/// Body of the reading request. Card order is the selection order and
/// decides which spread position each card takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRequest {
    pub question: String,
    pub selected_cards: Vec<CardId>,
    pub reading_type: ReadingType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<CardInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadingResponse {
    pub fn success(reading: impl Into<String>, cards: Vec<CardInfo>) -> Self {
        Self {
            success: true,
            reading: Some(reading.into()),
            cards,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reading: None,
            cards: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Folds the envelope into a reading or the error the service reported.
    /// `status` is the HTTP status the envelope arrived with.
    pub fn into_result(self, status: u16) -> Result<Reading, ApiException> {
        if !self.success {
            let message = self
                .error
                .unwrap_or_else(|| GENERIC_READING_FAILURE.to_string());
            let code = if (200..300).contains(&status) {
                ErrorCode::Internal
            } else {
                ErrorCode::from_status(status)
            };
            return Err(ApiException::new(code, message));
        }

        match self.reading {
            Some(text) => Ok(Reading {
                text,
                cards: self.cards,
            }),
            None => Err(ApiException::new(
                ErrorCode::Internal,
                "reading response is missing the reading text",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub text: String,
    pub cards: Vec<CardInfo>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
