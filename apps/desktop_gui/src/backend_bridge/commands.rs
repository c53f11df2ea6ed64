//! Backend commands queued from UI to backend worker.

use shared::{domain::CardId, protocol::ReadingRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    FetchCard { id: CardId },
    FetchReading { request: ReadingRequest },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::FetchCard { .. } => "fetch_card",
            BackendCommand::FetchReading { .. } => "fetch_reading",
        }
    }
}
