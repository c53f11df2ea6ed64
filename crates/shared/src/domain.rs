use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cards in a full tarot deck (22 major + 56 minor arcana).
pub const DECK_SIZE: usize = 78;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $inner);
    };
}

id_newtype!(CardId, u16);

impl CardId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn is_in_deck(self) -> bool {
        self.index() < DECK_SIZE
    }

    /// Label used when the backend could not describe the card.
    pub fn placeholder_name(self) -> String {
        format!("Card {}", self.index() + 1)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadingType {
    #[default]
    #[serde(rename = "1-card")]
    OneCard,
    #[serde(rename = "3-card")]
    ThreeCard,
    #[serde(rename = "celtic-cross")]
    CelticCross,
}

const THREE_CARD_POSITIONS: [&str; 3] = ["Past", "Present", "Future"];

const CELTIC_CROSS_POSITIONS: [&str; 10] = [
    "Present",
    "Challenge",
    "Foundation",
    "Recent Past",
    "Potential",
    "Near Future",
    "Self",
    "Environment",
    "Hopes and Fears",
    "Outcome",
];

impl ReadingType {
    pub const ALL: [ReadingType; 3] = [
        ReadingType::OneCard,
        ReadingType::ThreeCard,
        ReadingType::CelticCross,
    ];

    pub fn required_count(self) -> usize {
        match self {
            ReadingType::OneCard => 1,
            ReadingType::ThreeCard => 3,
            ReadingType::CelticCross => 10,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            ReadingType::OneCard => "1-card",
            ReadingType::ThreeCard => "3-card",
            ReadingType::CelticCross => "celtic-cross",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReadingType::OneCard => "Single Card",
            ReadingType::ThreeCard => "Three Cards",
            ReadingType::CelticCross => "Celtic Cross",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            ReadingType::OneCard => "Select 1 card from the deck below for quick insight",
            ReadingType::ThreeCard => {
                "Select 3 cards from the deck below for Past, Present, and Future guidance"
            }
            ReadingType::CelticCross => {
                "Select 10 cards from the deck below for a comprehensive Celtic Cross reading"
            }
        }
    }

    /// Spread position name for a selection slot, if the slot exists.
    pub fn position_label(self, slot: usize) -> Option<&'static str> {
        match self {
            ReadingType::OneCard => (slot == 0).then_some("Insight"),
            ReadingType::ThreeCard => THREE_CARD_POSITIONS.get(slot).copied(),
            ReadingType::CelticCross => CELTIC_CROSS_POSITIONS.get(slot).copied(),
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reading type '{0}' (expected 1-card, 3-card or celtic-cross)")]
pub struct UnknownReadingType(pub String);

impl std::str::FromStr for ReadingType {
    type Err = UnknownReadingType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1-card" | "one" | "1" => Ok(ReadingType::OneCard),
            "3-card" | "three" | "3" => Ok(ReadingType::ThreeCard),
            "celtic-cross" | "celtic" | "10" => Ok(ReadingType::CelticCross),
            _ => Err(UnknownReadingType(raw.to_string())),
        }
    }
}

/// Card metadata as served by the backend. Only `name` and `image` are
/// required; the rest is carried when the backend provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl CardInfo {
    pub fn placeholder(id: CardId) -> Self {
        Self {
            id: Some(id),
            name: id.placeholder_name(),
            image: String::new(),
            description: None,
            keywords: Vec::new(),
        }
    }
}
