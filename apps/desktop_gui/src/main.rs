mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{
    load_settings, Deck, FanGeometry, LoadingIndicator, SelectionRow, SequencerTimings,
    SessionState,
};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{PersistedPreferences, TarotApp, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    /// Fixed shuffle seed; the deck is reshuffled from entropy otherwise.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let deck = Deck::for_session(settings.shuffle, args.seed.or(settings.shuffle_seed));
    tracing::info!(server = %settings.server_url, deck_seed = ?deck.seed(), "starting tarot desktop");

    let loading = LoadingIndicator::new();
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(settings, loading.clone(), cmd_rx, ui_tx);

    let state = SessionState::new(
        deck,
        FanGeometry::default(),
        SelectionRow::default(),
        SequencerTimings::default(),
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Tarot Reading")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Tarot Reading",
        options,
        Box::new(move |cc| {
            let preferences = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedPreferences>(&text).ok())
            });
            Ok(Box::new(TarotApp::new(
                state, cmd_tx, ui_rx, loading, preferences,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("desktop gui exited with error: {err}"))
}
