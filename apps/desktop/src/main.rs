use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    load_settings, sequencer, CueEffect, Deck, FanGeometry, HttpReadingBackend, SelectionController,
    SelectionRow, SequencerTimings, SessionAction, SessionEffect, SessionPhase, SessionState,
};
use shared::domain::{CardId, ReadingType};
use tracing_subscriber::EnvFilter;

/// Draws cards from a shuffled deck and asks the reading service about them.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    question: String,
    #[arg(long, default_value_t = ReadingType::OneCard)]
    reading_type: ReadingType,
    /// Card ids (0-77) to pick instead of drawing from the top of the deck.
    #[arg(long, num_args = 1..)]
    cards: Vec<u16>,
    #[arg(long)]
    seed: Option<u64>,
    /// Print the reveal without waiting between cues.
    #[arg(long)]
    instant: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    let deck = Deck::for_session(settings.shuffle, args.seed.or(settings.shuffle_seed));
    let timings = if args.instant {
        SequencerTimings::instant()
    } else {
        SequencerTimings::default()
    };
    let picks = pick_cards(&deck, args.reading_type, &args.cards);

    tracing::info!(server = %settings.server_url, deck_seed = ?deck.seed(), "starting reading");
    let backend = HttpReadingBackend::new(settings)?;
    let state = SessionState::new(
        deck,
        FanGeometry::default(),
        SelectionRow::default(),
        timings,
    );
    let mut controller = SelectionController::new(state, Arc::new(backend));
    controller.subscribe(Box::new(
        |state: &SessionState, effects: &[SessionEffect]| {
            tracing::debug!(
                phase = ?state.phase(),
                selected = state.selection().len(),
                effects = effects.len(),
                "session updated"
            );
        },
    ));

    controller
        .dispatch(SessionAction::SetQuestion(args.question.clone()))
        .await;
    controller
        .dispatch(SessionAction::ChangeReadingType(args.reading_type))
        .await;
    controller.dispatch(SessionAction::Begin).await;
    if controller.state().phase() != SessionPhase::Selecting {
        bail!(notice_text(&controller));
    }

    println!("{}", args.reading_type.instruction());
    for id in picks {
        controller.dispatch(SessionAction::ClickCard(id)).await;
        let state = controller.state();
        if let (Some(slot), Some(card)) = (state.selection().slot_of(id), state.card(id)) {
            println!("  picked #{id} {} for slot {}", card.name, slot + 1);
        }
    }

    let effects = controller.dispatch(SessionAction::Reveal).await;
    let Some(timeline) = effects.into_iter().find_map(|effect| match effect {
        SessionEffect::PlayReveal(timeline) => Some(timeline),
        _ => None,
    }) else {
        bail!(notice_text(&controller));
    };

    let state = controller.state();
    let cards = state.revealed_cards();
    let reading_type = state.reading_type();
    let reading = state.reading().map(|reading| reading.text.clone());
    sequencer::play(&timeline, |cue| match cue.effect {
        CueEffect::Appear { slot } => println!("[card {}] dealt face down", slot + 1),
        CueEffect::Flip { slot } => {
            let name = cards.get(slot).map(|card| card.name.as_str()).unwrap_or("?");
            match reading_type.position_label(slot) {
                Some(position) => println!("[card {}] {position}: {name}", slot + 1),
                None => println!("[card {}] {name}", slot + 1),
            }
        }
        CueEffect::ShowReading => {
            if let Some(text) = &reading {
                println!();
                println!("{text}");
            }
        }
    })
    .await;

    Ok(())
}

/// Explicit picks win; otherwise the top of the shuffled deck is drawn.
/// Clicks toggle, so a repeated id is kept only once.
fn pick_cards(deck: &Deck, reading_type: ReadingType, explicit: &[u16]) -> Vec<CardId> {
    if explicit.is_empty() {
        return deck.top(reading_type.required_count());
    }
    let mut picks: Vec<CardId> = Vec::with_capacity(explicit.len());
    for id in explicit.iter().copied().map(CardId) {
        if picks.contains(&id) {
            tracing::warn!(card = %id, "ignoring repeated --cards id");
        } else {
            picks.push(id);
        }
    }
    picks
}

fn notice_text(controller: &SelectionController) -> String {
    controller
        .state()
        .notice()
        .map(|notice| notice.message.clone())
        .unwrap_or_else(|| "reading was not produced".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_from_top_of_deck_without_explicit_cards() {
        let deck = Deck::shuffled(9);
        let picks = pick_cards(&deck, ReadingType::ThreeCard, &[]);
        assert_eq!(picks, deck.order()[..3].to_vec());
    }

    #[test]
    fn explicit_cards_are_used_as_given() {
        let picks = pick_cards(&Deck::ordered(), ReadingType::OneCard, &[5]);
        assert_eq!(picks, vec![CardId(5)]);
    }

    #[test]
    fn repeated_card_ids_are_picked_once() {
        let picks = pick_cards(&Deck::ordered(), ReadingType::ThreeCard, &[5, 5, 9, 5]);
        assert_eq!(picks, vec![CardId(5), CardId(9)]);
    }

    #[test]
    fn parses_reading_type_flag() {
        let args = Args::try_parse_from([
            "desktop",
            "--question",
            "Will I travel?",
            "--reading-type",
            "celtic-cross",
            "--cards",
            "1",
            "2",
        ])
        .expect("args");
        assert_eq!(args.reading_type, ReadingType::CelticCross);
        assert_eq!(args.cards, vec![1, 2]);
        assert!(!args.instant);
    }
}
