//! Runtime bridge between the UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{HttpReadingBackend, LoadingIndicator, ReadingBackend, Settings};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    settings: Settings,
    loading: LoadingIndicator,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let backend: Arc<dyn ReadingBackend> = match HttpReadingBackend::new(settings) {
            Ok(backend) => Arc::new(backend),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err}"),
                )));
                tracing::error!("failed to build reading service client: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend command received");
                let event = match cmd {
                    BackendCommand::FetchCard { id } => UiEvent::CardLoaded {
                        id,
                        result: backend.fetch_card(id).await.map_err(|err| err.to_string()),
                    },
                    BackendCommand::FetchReading { request } => {
                        let _busy = loading.acquire();
                        UiEvent::ReadingLoaded(
                            backend
                                .fetch_reading(&request)
                                .await
                                .map_err(|err| err.to_string()),
                        )
                    }
                };
                if ui_tx.send(event).is_err() {
                    tracing::debug!("ui event receiver dropped; backend worker exiting");
                    break;
                }
            }
        });
    });
}
