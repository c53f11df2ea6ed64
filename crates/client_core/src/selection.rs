//! Card selection state machine.
//!
//! The selection is an insertion-ordered list of distinct card ids. A card's
//! position in that list is its reveal slot, and therefore its spread
//! position (past/present/future, ...).

use shared::domain::{CardId, ReadingType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    Selecting,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected { slot: usize },
    AlreadySelected,
    SelectionFull,
    NotInDeck,
}

/// A card that changed reveal slot after another card left the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMove {
    pub card: CardId,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeselectOutcome {
    NotSelected,
    Deselected { slot: usize, reflowed: Vec<SlotMove> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Select(SelectOutcome),
    Deselect(DeselectOutcome),
}

impl ToggleOutcome {
    pub fn changed(&self) -> bool {
        matches!(
            self,
            ToggleOutcome::Select(SelectOutcome::Selected { .. })
                | ToggleOutcome::Deselect(DeselectOutcome::Deselected { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    reading_type: ReadingType,
    selected: Vec<CardId>,
    deck_size: usize,
}

impl SelectionState {
    pub fn new(reading_type: ReadingType, deck_size: usize) -> Self {
        Self {
            reading_type,
            selected: Vec::with_capacity(reading_type.required_count()),
            deck_size,
        }
    }

    pub fn reading_type(&self) -> ReadingType {
        self.reading_type
    }

    pub fn required(&self) -> usize {
        self.reading_type.required_count()
    }

    pub fn selected(&self) -> &[CardId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn status(&self) -> SelectionStatus {
        if self.selected.len() >= self.required() {
            SelectionStatus::Complete
        } else {
            SelectionStatus::Selecting
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == SelectionStatus::Complete
    }

    pub fn is_selected(&self, id: CardId) -> bool {
        self.selected.contains(&id)
    }

    /// Reveal slot of a selected card.
    pub fn slot_of(&self, id: CardId) -> Option<usize> {
        self.selected.iter().position(|selected| *selected == id)
    }

    pub fn select(&mut self, id: CardId) -> SelectOutcome {
        if id.index() >= self.deck_size {
            return SelectOutcome::NotInDeck;
        }
        if self.is_selected(id) {
            return SelectOutcome::AlreadySelected;
        }
        if self.is_complete() {
            return SelectOutcome::SelectionFull;
        }
        self.selected.push(id);
        SelectOutcome::Selected {
            slot: self.selected.len() - 1,
        }
    }

    pub fn deselect(&mut self, id: CardId) -> DeselectOutcome {
        let Some(slot) = self.slot_of(id) else {
            return DeselectOutcome::NotSelected;
        };
        self.selected.remove(slot);
        let reflowed = self.selected[slot..]
            .iter()
            .enumerate()
            .map(|(offset, card)| SlotMove {
                card: *card,
                from: slot + offset + 1,
                to: slot + offset,
            })
            .collect();
        DeselectOutcome::Deselected { slot, reflowed }
    }

    /// Click semantics: a selected card is released, any other is picked up.
    pub fn toggle(&mut self, id: CardId) -> ToggleOutcome {
        if self.is_selected(id) {
            ToggleOutcome::Deselect(self.deselect(id))
        } else {
            ToggleOutcome::Select(self.select(id))
        }
    }

    /// Switches the spread. When the new spread needs fewer cards than are
    /// selected, the most recent picks are released and returned in the
    /// order they were dropped (newest first).
    pub fn change_reading_type(&mut self, reading_type: ReadingType) -> Vec<CardId> {
        self.reading_type = reading_type;
        let required = reading_type.required_count();
        if self.selected.len() <= required {
            return Vec::new();
        }
        let mut released = self.selected.split_off(required);
        released.reverse();
        released
    }

    pub fn clear(&mut self) -> Vec<CardId> {
        std::mem::take(&mut self.selected)
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
