use std::{collections::VecDeque, time::Instant};

use client_core::{
    reduce, CueEffect, LoadingIndicator, NoticeLevel, SessionAction, SessionEffect, SessionPhase,
    SessionState, Timeline, TimelinePlayer,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::ReadingType;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::{command_for_effect, dispatch_backend_command},
};
use crate::ui::fan::{self, TableView, CARD_HEIGHT, CARD_WIDTH};

pub const SETTINGS_STORAGE_KEY: &str = "tarot_desktop_settings";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPreferences {
    #[serde(default)]
    pub reading_type: ReadingType,
}

struct RevealPlayback {
    player: TimelinePlayer,
    started: Instant,
    reading_shown: bool,
}

impl RevealPlayback {
    fn new(timeline: Timeline) -> Self {
        Self {
            player: TimelinePlayer::new(timeline),
            started: Instant::now(),
            reading_shown: false,
        }
    }

    fn tick(&mut self) {
        for effect in self.player.advance(self.started.elapsed()) {
            if effect == CueEffect::ShowReading {
                self.reading_shown = true;
            }
        }
    }
}

pub struct TarotApp {
    state: SessionState,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    loading: LoadingIndicator,
    question_draft: String,
    preferred_reading_type: ReadingType,
    playback: Option<RevealPlayback>,
    worker_error: Option<UiError>,
}

impl TarotApp {
    pub fn new(
        state: SessionState,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        loading: LoadingIndicator,
        preferences: Option<PersistedPreferences>,
    ) -> Self {
        let preferences = preferences.unwrap_or_default();
        let mut app = Self {
            state,
            cmd_tx,
            ui_rx,
            loading,
            question_draft: String::new(),
            preferred_reading_type: preferences.reading_type,
            playback: None,
            worker_error: None,
        };
        app.apply(SessionAction::ChangeReadingType(preferences.reading_type));
        app
    }

    /// Runs `action` through the reducer and routes the resulting effects.
    /// A command the worker queue refuses is fed back as a failed result so
    /// the session never waits on a request that was not sent.
    fn apply(&mut self, action: SessionAction) {
        let mut pending = VecDeque::from([action]);
        while let Some(action) = pending.pop_front() {
            for effect in reduce(&mut self.state, action) {
                if let SessionEffect::PlayReveal(timeline) = &effect {
                    self.playback = Some(RevealPlayback::new(timeline.clone()));
                }
                let Some(cmd) = command_for_effect(&effect) else {
                    continue;
                };
                if let Err(message) = dispatch_backend_command(&self.cmd_tx, cmd) {
                    self.worker_error = Some(UiError::from_message(
                        UiErrorContext::General,
                        message.clone(),
                    ));
                    pending.push_back(match effect {
                        SessionEffect::FetchCard(id) => SessionAction::CardLoaded {
                            id,
                            result: Err(message),
                        },
                        _ => SessionAction::ReadingLoaded(Err(message)),
                    });
                }
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Error(err) => {
                    tracing::error!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "{}",
                        err.message()
                    );
                    self.worker_error = Some(err);
                }
                UiEvent::CardLoaded { id, result } => {
                    self.apply(SessionAction::CardLoaded { id, result });
                }
                UiEvent::ReadingLoaded(result) => {
                    self.apply(SessionAction::ReadingLoaded(result));
                }
            }
        }
    }

    fn start_over(&mut self) {
        self.playback = None;
        self.question_draft.clear();
        self.apply(SessionAction::Reset);
        self.apply(SessionAction::ChangeReadingType(self.preferred_reading_type));
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let phase = self.state.phase();
        let editable = matches!(phase, SessionPhase::Question | SessionPhase::Selecting);

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Your question").strong());
            let edit = egui::TextEdit::singleline(&mut self.question_draft)
                .hint_text("What would you like to ask the cards?")
                .desired_width(420.0);
            let response = ui.add_enabled(editable, edit);
            if response.changed() {
                self.apply(SessionAction::SetQuestion(self.question_draft.clone()));
            }
            if response.lost_focus()
                && phase == SessionPhase::Question
                && ui.input(|input| input.key_pressed(egui::Key::Enter))
            {
                self.apply(SessionAction::Begin);
            }

            let mut chosen = self.state.reading_type();
            ui.add_enabled_ui(editable, |ui| {
                egui::ComboBox::from_id_salt("reading_type")
                    .selected_text(chosen.title())
                    .show_ui(ui, |ui| {
                        for reading_type in ReadingType::ALL {
                            ui.selectable_value(&mut chosen, reading_type, reading_type.title());
                        }
                    });
            });
            if chosen != self.state.reading_type() {
                self.preferred_reading_type = chosen;
                self.apply(SessionAction::ChangeReadingType(chosen));
            }
        });

        ui.horizontal(|ui| match phase {
            SessionPhase::Question => {
                ui.label(self.state.reading_type().instruction());
                if ui.button("Begin reading").clicked() {
                    self.apply(SessionAction::Begin);
                }
            }
            SessionPhase::Selecting => {
                let selection = self.state.selection();
                ui.label(format!(
                    "Selected {} of {}",
                    selection.len(),
                    selection.required()
                ));
                let ready = selection.is_complete();
                if ui
                    .add_enabled(ready, egui::Button::new("Reveal reading"))
                    .clicked()
                {
                    self.apply(SessionAction::Reveal);
                }
            }
            SessionPhase::Fetching => {
                if self.shows_spinner() {
                    ui.add(egui::Spinner::new());
                }
                ui.label("Consulting the cards...");
            }
            SessionPhase::Reading => {
                if ui.button("New reading").clicked() {
                    self.start_over();
                }
            }
        });

        self.show_notice(ui);
    }

    fn show_notice(&mut self, ui: &mut egui::Ui) {
        let notice = self.state.notice().map(|notice| {
            let context = if notice.level == NoticeLevel::Error
                && notice.message.starts_with("Error generating reading")
            {
                UiErrorContext::Reading
            } else {
                UiErrorContext::General
            };
            (
                notice.level,
                UiError::from_message(context, notice.message.clone()),
            )
        });

        if let Some((level, err)) = notice {
            let color = match level {
                NoticeLevel::Error => egui::Color32::from_rgb(220, 110, 110),
                NoticeLevel::Info => egui::Color32::from_rgb(140, 180, 220),
            };
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(err.display_text()).color(color));
                let can_retry = err.is_retryable()
                    && self.state.phase() == SessionPhase::Selecting
                    && self.state.selection().is_complete();
                if can_retry && ui.small_button("Retry").clicked() {
                    self.apply(SessionAction::Reveal);
                } else if ui.small_button("Dismiss").clicked() {
                    self.apply(SessionAction::DismissNotice);
                }
            });
        }

        if let Some(err) = &self.worker_error {
            let text = err.display_text();
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(text).color(egui::Color32::from_rgb(220, 110, 110)));
                if ui.small_button("Dismiss").clicked() {
                    self.worker_error = None;
                }
            });
        }
    }

    fn show_table(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let view = TableView::fit(response.rect);

        if self.state.phase() == SessionPhase::Reading {
            self.paint_reveal(&painter, view);
            return;
        }

        let reading_type = self.state.reading_type();
        for visual in self.state.card_visuals() {
            let placement = visual.placement;
            let center = view.to_screen(placement.x, placement.y);
            let size = view.card_size(placement.scale);
            let opacity = if visual.dimmed { 0.35 } else { 1.0 };
            match visual.slot {
                Some(slot) => {
                    let name = self
                        .state
                        .card(visual.id)
                        .map(|card| card.name.clone())
                        .unwrap_or_else(|| visual.id.placeholder_name());
                    fan::paint_card_back(&painter, center, size, placement.rotation, true, 1.0);
                    painter.text(
                        center + egui::vec2(0.0, size.y / 2.0 + 10.0),
                        egui::Align2::CENTER_CENTER,
                        reading_type.position_label(slot).unwrap_or(name.as_str()),
                        egui::FontId::proportional(12.0),
                        egui::Color32::from_rgb(212, 175, 55),
                    );
                }
                None => {
                    fan::paint_card_back(
                        &painter,
                        center,
                        size,
                        placement.rotation,
                        false,
                        opacity,
                    );
                }
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = view.to_layout(pos);
                let hit = self.state.layout().hit_test(
                    x,
                    y,
                    CARD_WIDTH,
                    CARD_HEIGHT,
                    self.state.selection(),
                );
                if let Some(id) = hit {
                    self.apply(SessionAction::ClickCard(id));
                }
            }
        }
    }

    fn paint_reveal(&mut self, painter: &egui::Painter, view: TableView) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        playback.tick();
        let elapsed = playback.started.elapsed();
        let timeline = playback.player.timeline();

        let cards = self.state.revealed_cards();
        let reading_type = self.state.reading_type();
        let layout = self.state.layout();
        for (slot, card) in cards.iter().enumerate() {
            let frame = timeline.frame(slot, elapsed);
            if frame.opacity <= 0.0 {
                continue;
            }
            let placement = layout.selected_slot(slot, cards.len());
            let center = view.to_screen(placement.x, placement.y + frame.rise);
            let full = view.card_size(placement.scale);
            let size = egui::vec2(full.x * (1.0 - 2.0 * frame.flip).abs(), full.y);
            if frame.face_up() {
                fan::paint_card_face(
                    painter,
                    center,
                    size,
                    &card.name,
                    reading_type.position_label(slot),
                    frame.opacity,
                );
            } else {
                fan::paint_card_back(painter, center, size, 0.0, true, frame.opacity);
            }
        }
    }

    fn show_reading_text(&self, ui: &mut egui::Ui) {
        let Some(reading) = self.state.reading() else {
            return;
        };
        ui.label(egui::RichText::new(self.state.question()).italics());
        ui.separator();
        egui::ScrollArea::vertical()
            .max_height(220.0)
            .show(ui, |ui| ui.label(&reading.text));
    }

    /// The reading request is the only wait the user sees; it ends before
    /// the session reaches `Reading`.
    fn shows_spinner(&self) -> bool {
        self.state.phase() == SessionPhase::Fetching
    }

    fn is_animating(&self) -> bool {
        self.loading.is_active()
            || self
                .playback
                .as_ref()
                .is_some_and(|playback| !playback.player.is_finished())
    }
}

impl eframe::App for TarotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("session_controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_controls(ui);
            ui.add_space(4.0);
        });

        let reading_shown = self.state.phase() == SessionPhase::Reading
            && self
                .playback
                .as_ref()
                .is_some_and(|playback| playback.reading_shown);
        if reading_shown {
            egui::TopBottomPanel::bottom("reading_text").show(ctx, |ui| {
                self.show_reading_text(ui);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_table(ui);
        });

        if self.is_animating() {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let preferences = PersistedPreferences {
            reading_type: self.preferred_reading_type,
        };
        if let Ok(serialized) = serde_json::to_string(&preferences) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::Deck;
    use crossbeam_channel::bounded;
    use shared::domain::CardId;

    fn app() -> (TarotApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let app = TarotApp::new(
            SessionState::with_deck(Deck::ordered()),
            cmd_tx,
            ui_rx,
            LoadingIndicator::new(),
            Some(PersistedPreferences {
                reading_type: ReadingType::ThreeCard,
            }),
        );
        (app, cmd_rx, ui_tx)
    }

    #[test]
    fn persisted_reading_type_is_applied_on_start() {
        let (app, _cmd_rx, _ui_tx) = app();
        assert_eq!(app.state.reading_type(), ReadingType::ThreeCard);
    }

    #[test]
    fn card_clicks_queue_metadata_fetch() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.apply(SessionAction::SetQuestion("Career?".to_string()));
        app.apply(SessionAction::Begin);
        app.apply(SessionAction::ClickCard(CardId(4)));

        assert_eq!(
            cmd_rx.try_recv().ok(),
            Some(BackendCommand::FetchCard { id: CardId(4) })
        );

        ui_tx
            .send(UiEvent::CardLoaded {
                id: CardId(4),
                result: Err("connection refused".to_string()),
            })
            .expect("send");
        app.process_ui_events();
        assert_eq!(
            app.state.card(CardId(4)).map(|card| card.name.as_str()),
            Some("Card 5")
        );
    }

    #[test]
    fn disconnected_worker_does_not_strand_the_reveal() {
        let (mut app, cmd_rx, _ui_tx) = app();
        app.apply(SessionAction::SetQuestion("Career?".to_string()));
        app.apply(SessionAction::ChangeReadingType(ReadingType::OneCard));
        app.apply(SessionAction::Begin);
        app.apply(SessionAction::ClickCard(CardId(9)));
        drop(cmd_rx);

        app.apply(SessionAction::Reveal);
        assert_eq!(app.state.phase(), SessionPhase::Selecting);
        assert!(app.worker_error.is_some());
        assert!(app.state.notice().is_some());
    }

    #[test]
    fn spinner_is_limited_to_the_pending_request() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.apply(SessionAction::SetQuestion("Career?".to_string()));
        app.apply(SessionAction::ChangeReadingType(ReadingType::OneCard));
        app.apply(SessionAction::Begin);
        app.apply(SessionAction::ClickCard(CardId(3)));
        assert!(!app.shows_spinner());

        app.apply(SessionAction::Reveal);
        assert!(app.shows_spinner());
        let queued: Vec<BackendCommand> = cmd_rx.try_iter().collect();
        assert!(matches!(
            queued.last(),
            Some(BackendCommand::FetchReading { .. })
        ));

        ui_tx
            .send(UiEvent::ReadingLoaded(Ok(shared::protocol::Reading {
                text: "A new path opens.".to_string(),
                cards: Vec::new(),
            })))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.state.phase(), SessionPhase::Reading);
        assert!(!app.shows_spinner());
        assert!(app.playback.is_some());
    }

    #[test]
    fn new_reading_keeps_preferred_type() {
        let (mut app, _cmd_rx, _ui_tx) = app();
        app.question_draft = "Career?".to_string();
        app.start_over();
        assert_eq!(app.state.phase(), SessionPhase::Question);
        assert_eq!(app.state.reading_type(), ReadingType::ThreeCard);
        assert!(app.question_draft.is_empty());
    }

    #[test]
    fn preferences_survive_storage_round_trip() {
        let text = serde_json::to_string(&PersistedPreferences {
            reading_type: ReadingType::CelticCross,
        })
        .expect("serialize");
        assert_eq!(text, r#"{"reading_type":"celtic-cross"}"#);
        let restored: PersistedPreferences = serde_json::from_str("{}").expect("defaults");
        assert_eq!(restored.reading_type, ReadingType::OneCard);
    }
}
