//! Async driver around [`reduce`]: runs effects against a [`ReadingBackend`]
//! and notifies observers after every transition.

use std::{collections::VecDeque, sync::Arc};

use tracing::debug;

use crate::{
    loading::LoadingIndicator,
    session::{reduce, SessionAction, SessionEffect, SessionState},
    ReadingBackend,
};

/// Render step. Called with the state as it stands after each transition,
/// together with the effects that transition produced.
pub trait SessionObserver: Send {
    fn on_transition(&mut self, state: &SessionState, effects: &[SessionEffect]);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionState, &[SessionEffect]) + Send,
{
    fn on_transition(&mut self, state: &SessionState, effects: &[SessionEffect]) {
        self(state, effects)
    }
}

pub struct SelectionController {
    state: SessionState,
    backend: Arc<dyn ReadingBackend>,
    loading: LoadingIndicator,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl SelectionController {
    pub fn new(state: SessionState, backend: Arc<dyn ReadingBackend>) -> Self {
        Self {
            state,
            backend,
            loading: LoadingIndicator::new(),
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn loading(&self) -> LoadingIndicator {
        self.loading.clone()
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Applies `action` and every follow-up action its effects produce.
    /// Network effects are awaited one at a time; presentation effects
    /// (the reveal timeline) are returned for the caller to play.
    pub async fn dispatch(&mut self, action: SessionAction) -> Vec<SessionEffect> {
        let mut pending = VecDeque::from([action]);
        let mut presentation = Vec::new();

        while let Some(action) = pending.pop_front() {
            let effects = reduce(&mut self.state, action);
            for observer in &mut self.observers {
                observer.on_transition(&self.state, &effects);
            }

            for effect in effects {
                match effect {
                    SessionEffect::FetchCard(id) => {
                        let result = self
                            .backend
                            .fetch_card(id)
                            .await
                            .map_err(|err| err.to_string());
                        pending.push_back(SessionAction::CardLoaded { id, result });
                    }
                    SessionEffect::FetchReading(request) => {
                        let result = {
                            let _busy = self.loading.acquire();
                            self.backend.fetch_reading(&request).await
                        };
                        pending.push_back(SessionAction::ReadingLoaded(
                            result.map_err(|err| err.to_string()),
                        ));
                    }
                    effect @ SessionEffect::PlayReveal(_) => {
                        debug!("reveal ready for playback");
                        presentation.push(effect);
                    }
                }
            }
        }

        presentation
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
