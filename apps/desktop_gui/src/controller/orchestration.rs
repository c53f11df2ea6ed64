//! Routes session effects to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use client_core::SessionEffect;

use crate::backend_bridge::commands::BackendCommand;

/// Network effects become backend commands; presentation effects stay on
/// the UI thread.
pub fn command_for_effect(effect: &SessionEffect) -> Option<BackendCommand> {
    match effect {
        SessionEffect::FetchCard(id) => Some(BackendCommand::FetchCard { id: *id }),
        SessionEffect::FetchReading(request) => Some(BackendCommand::FetchReading {
            request: request.clone(),
        }),
        SessionEffect::PlayReveal(_) => None,
    }
}

/// Queues `cmd` without blocking the frame. Returns the status text to show
/// when the queue refused it.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err("UI command queue is full; please retry".to_string()),
        Err(TrySendError::Disconnected(_)) => Err(
            "Backend command processor disconnected (possible startup/runtime failure)"
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{SequencerTimings, Timeline};
    use crossbeam_channel::bounded;
    use shared::{
        domain::{CardId, ReadingType},
        protocol::ReadingRequest,
    };

    #[test]
    fn reveal_effects_are_not_sent_to_backend() {
        let timeline = Timeline::reveal(1, &SequencerTimings::default());
        assert_eq!(command_for_effect(&SessionEffect::PlayReveal(timeline)), None);
        assert_eq!(
            command_for_effect(&SessionEffect::FetchCard(CardId(7))),
            Some(BackendCommand::FetchCard { id: CardId(7) })
        );
    }

    #[test]
    fn full_queue_reports_retry() {
        let (tx, _rx) = bounded(1);
        let request = ReadingRequest {
            question: "Career?".to_string(),
            selected_cards: vec![CardId(1)],
            reading_type: ReadingType::OneCard,
        };
        assert!(dispatch_backend_command(&tx, BackendCommand::FetchCard { id: CardId(1) }).is_ok());
        let err = dispatch_backend_command(&tx, BackendCommand::FetchReading { request })
            .expect_err("queue is full");
        assert!(err.contains("full"));
    }

    #[test]
    fn dropped_worker_reports_disconnect() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let err = dispatch_backend_command(&tx, BackendCommand::FetchCard { id: CardId(2) })
            .expect_err("worker gone");
        assert!(err.contains("disconnected"));
    }
}
