//! Session deck: the order in which the 78 cards are fanned out.
//!
//! The deck is permuted at most once per session. Selecting a card never
//! removes it from the deck; it only changes where the card is drawn.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::domain::{CardId, DECK_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    order: Vec<CardId>,
    seed: Option<u64>,
}

impl Deck {
    /// Deck in id order, 0..77.
    pub fn ordered() -> Self {
        Self {
            order: all_card_ids(),
            seed: None,
        }
    }

    /// Deck permuted with a ChaCha8 stream; the same seed yields the same fan.
    pub fn shuffled(seed: u64) -> Self {
        let mut order = all_card_ids();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        Self {
            order,
            seed: Some(seed),
        }
    }

    pub fn shuffled_from_entropy() -> Self {
        Self::shuffled(rand::thread_rng().gen())
    }

    pub fn for_session(shuffle: bool, seed: Option<u64>) -> Self {
        match (shuffle, seed) {
            (false, _) => Self::ordered(),
            (true, Some(seed)) => Self::shuffled(seed),
            (true, None) => Self::shuffled_from_entropy(),
        }
    }

    /// Deck for the next session. A seeded deck advances its seed so a
    /// reset does not reproduce the previous fan.
    pub fn next_session(&self) -> Self {
        match self.seed {
            Some(seed) => Self::shuffled(seed.wrapping_add(1)),
            None => Self::ordered(),
        }
    }

    pub fn order(&self) -> &[CardId] {
        &self.order
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.order.contains(&id)
    }

    /// First `count` cards in fan order.
    pub fn top(&self, count: usize) -> Vec<CardId> {
        self.order.iter().take(count).copied().collect()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::ordered()
    }
}

fn all_card_ids() -> Vec<CardId> {
    (0..DECK_SIZE as u16).map(CardId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ordered_deck_lists_every_card_once() {
        let deck = Deck::ordered();
        assert_eq!(deck.len(), DECK_SIZE);
        assert_eq!(deck.order()[0], CardId(0));
        assert_eq!(deck.order()[77], CardId(77));
    }

    #[test]
    fn shuffle_is_a_permutation_and_reproducible() {
        let first = Deck::shuffled(42);
        let second = Deck::shuffled(42);
        assert_eq!(first, second);

        let unique: HashSet<CardId> = first.order().iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
        assert_ne!(first.order(), Deck::ordered().order());
    }

    #[test]
    fn next_session_moves_to_a_new_seed() {
        let deck = Deck::shuffled(7);
        let next = deck.next_session();
        assert_eq!(next.seed(), Some(8));
        assert_ne!(deck.order(), next.order());
        assert_eq!(Deck::ordered().next_session(), Deck::ordered());
    }
}
