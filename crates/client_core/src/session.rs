//! Session state and its transition function.
//!
//! `reduce` is the only way session state changes. It performs no I/O: work
//! that needs the network or a clock is handed back as [`SessionEffect`]s,
//! and results come back in as further actions.

use std::collections::HashMap;

use shared::{
    domain::{CardId, CardInfo, ReadingType},
    protocol::{Reading, ReadingRequest},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    deck::Deck,
    layout::{CardPlacement, DeckLayout, FanGeometry, SelectionRow},
    selection::{DeselectOutcome, SelectOutcome, SelectionState, ToggleOutcome},
    sequencer::{SequencerTimings, Timeline},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Question,
    Selecting,
    Fetching,
    Reading,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please enter your question before beginning the reading.")]
    EmptyQuestion,
    #[error("Please enter a question and select cards.")]
    NoCardsSelected,
    #[error("Select {required} cards before revealing the reading ({selected} selected).")]
    SelectionIncomplete { selected: usize, required: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SetQuestion(String),
    Begin,
    ChangeReadingType(ReadingType),
    ClickCard(CardId),
    CardLoaded {
        id: CardId,
        result: Result<CardInfo, String>,
    },
    Reveal,
    ReadingLoaded(Result<Reading, String>),
    Reset,
    DismissNotice,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SetQuestion(_) => "set_question",
            SessionAction::Begin => "begin",
            SessionAction::ChangeReadingType(_) => "change_reading_type",
            SessionAction::ClickCard(_) => "click_card",
            SessionAction::CardLoaded { .. } => "card_loaded",
            SessionAction::Reveal => "reveal",
            SessionAction::ReadingLoaded(_) => "reading_loaded",
            SessionAction::Reset => "reset",
            SessionAction::DismissNotice => "dismiss_notice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    FetchCard(CardId),
    FetchReading(ReadingRequest),
    PlayReveal(Timeline),
}

/// What a renderer needs to draw one card of the deck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardVisual {
    pub id: CardId,
    pub placement: CardPlacement,
    pub slot: Option<usize>,
    pub dimmed: bool,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    question: String,
    deck: Deck,
    layout: DeckLayout,
    selection: SelectionState,
    cards: HashMap<CardId, CardInfo>,
    reading: Option<Reading>,
    reveal: Option<Timeline>,
    notice: Option<Notice>,
    timings: SequencerTimings,
}

impl SessionState {
    pub fn new(
        deck: Deck,
        geometry: FanGeometry,
        row: SelectionRow,
        timings: SequencerTimings,
    ) -> Self {
        let layout = DeckLayout::new(deck.order(), geometry, row);
        let selection = SelectionState::new(ReadingType::default(), deck.len());
        Self {
            phase: SessionPhase::Question,
            question: String::new(),
            deck,
            layout,
            selection,
            cards: HashMap::new(),
            reading: None,
            reveal: None,
            notice: None,
            timings,
        }
    }

    pub fn with_deck(deck: Deck) -> Self {
        Self::new(
            deck,
            FanGeometry::default(),
            SelectionRow::default(),
            SequencerTimings::default(),
        )
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn layout(&self) -> &DeckLayout {
        &self.layout
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn reading_type(&self) -> ReadingType {
        self.selection.reading_type()
    }

    pub fn card(&self, id: CardId) -> Option<&CardInfo> {
        self.cards.get(&id)
    }

    pub fn reading(&self) -> Option<&Reading> {
        self.reading.as_ref()
    }

    pub fn reveal(&self) -> Option<&Timeline> {
        self.reveal.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn timings(&self) -> &SequencerTimings {
        &self.timings
    }

    pub fn can_reveal(&self) -> bool {
        self.phase == SessionPhase::Selecting && self.selection.is_complete()
    }

    /// Validates the session and builds the request the reveal would send.
    pub fn reading_request(&self) -> Result<ReadingRequest, SubmitError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }
        if self.selection.is_empty() {
            return Err(SubmitError::NoCardsSelected);
        }
        if !self.selection.is_complete() {
            return Err(SubmitError::SelectionIncomplete {
                selected: self.selection.len(),
                required: self.selection.required(),
            });
        }
        Ok(ReadingRequest {
            question: question.to_string(),
            selected_cards: self.selection.selected().to_vec(),
            reading_type: self.selection.reading_type(),
        })
    }

    /// The deck back to front, with cards outside the selection dimmed once
    /// no more picks are possible.
    pub fn card_visuals(&self) -> Vec<CardVisual> {
        let locked = self.selection.is_complete() && self.phase == SessionPhase::Selecting;
        self.layout
            .placements(&self.selection)
            .into_iter()
            .map(|(id, placement)| {
                let slot = self.selection.slot_of(id);
                CardVisual {
                    id,
                    placement,
                    slot,
                    dimmed: locked && slot.is_none(),
                }
            })
            .collect()
    }

    /// Cards shown face down in the reveal area, in slot order.
    pub fn revealed_cards(&self) -> Vec<CardInfo> {
        if let Some(reading) = &self.reading {
            if !reading.cards.is_empty() {
                return reading.cards.clone();
            }
        }
        self.selection
            .selected()
            .iter()
            .map(|id| {
                self.cards
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| CardInfo::placeholder(*id))
            })
            .collect()
    }
}

pub fn reduce(state: &mut SessionState, action: SessionAction) -> Vec<SessionEffect> {
    debug!(action = action.name(), phase = ?state.phase, "session transition");
    match action {
        SessionAction::SetQuestion(question) => {
            if matches!(state.phase, SessionPhase::Question | SessionPhase::Selecting) {
                state.question = question;
            }
            Vec::new()
        }
        SessionAction::Begin => {
            if state.phase != SessionPhase::Question {
                return Vec::new();
            }
            if state.question.trim().is_empty() {
                state.notice = Some(Notice::error(SubmitError::EmptyQuestion.to_string()));
                return Vec::new();
            }
            state.notice = None;
            state.phase = SessionPhase::Selecting;
            Vec::new()
        }
        SessionAction::ChangeReadingType(reading_type) => {
            if matches!(state.phase, SessionPhase::Question | SessionPhase::Selecting) {
                let released = state.selection.change_reading_type(reading_type);
                if !released.is_empty() {
                    debug!(
                        reading_type = %reading_type,
                        released = ?released,
                        "reading type lowered below selection; released latest picks"
                    );
                }
            }
            Vec::new()
        }
        SessionAction::ClickCard(id) => {
            if state.phase != SessionPhase::Selecting {
                return Vec::new();
            }
            match state.selection.toggle(id) {
                ToggleOutcome::Select(SelectOutcome::Selected { slot }) => {
                    debug!(card = %id, slot, "card selected");
                    if state.cards.contains_key(&id) {
                        Vec::new()
                    } else {
                        vec![SessionEffect::FetchCard(id)]
                    }
                }
                ToggleOutcome::Deselect(DeselectOutcome::Deselected { slot, reflowed }) => {
                    debug!(card = %id, slot, reflowed = reflowed.len(), "card deselected");
                    Vec::new()
                }
                outcome => {
                    debug!(card = %id, ?outcome, "card click ignored");
                    Vec::new()
                }
            }
        }
        SessionAction::CardLoaded { id, result } => {
            let info = match result {
                Ok(info) => info,
                Err(err) => {
                    warn!(card = %id, "card metadata unavailable, using placeholder: {err}");
                    CardInfo::placeholder(id)
                }
            };
            state.cards.insert(id, info);
            Vec::new()
        }
        SessionAction::Reveal => {
            if state.phase != SessionPhase::Selecting {
                debug!(phase = ?state.phase, "reveal ignored outside selection");
                return Vec::new();
            }
            match state.reading_request() {
                Ok(request) => {
                    state.notice = None;
                    state.phase = SessionPhase::Fetching;
                    vec![SessionEffect::FetchReading(request)]
                }
                Err(err) => {
                    state.notice = Some(Notice::error(err.to_string()));
                    Vec::new()
                }
            }
        }
        SessionAction::ReadingLoaded(result) => {
            if state.phase != SessionPhase::Fetching {
                return Vec::new();
            }
            match result {
                Ok(reading) => {
                    info!(cards = reading.cards.len(), "reading received");
                    for card in &reading.cards {
                        if let Some(id) = card.id {
                            state.cards.insert(id, card.clone());
                        }
                    }
                    let card_count = if reading.cards.is_empty() {
                        state.selection.len()
                    } else {
                        reading.cards.len()
                    };
                    let timeline = Timeline::reveal(card_count, &state.timings);
                    state.reading = Some(reading);
                    state.reveal = Some(timeline.clone());
                    state.phase = SessionPhase::Reading;
                    vec![SessionEffect::PlayReveal(timeline)]
                }
                Err(err) => {
                    warn!("reading request failed: {err}");
                    state.notice = Some(Notice::error(format!("Error generating reading: {err}")));
                    state.phase = SessionPhase::Selecting;
                    Vec::new()
                }
            }
        }
        SessionAction::Reset => {
            let deck = state.deck.next_session();
            state.layout = state.layout.relayout(deck.order());
            state.selection = SelectionState::new(ReadingType::default(), deck.len());
            state.deck = deck;
            state.question.clear();
            state.reading = None;
            state.reveal = None;
            state.notice = None;
            state.phase = SessionPhase::Question;
            Vec::new()
        }
        SessionAction::DismissNotice => {
            state.notice = None;
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
