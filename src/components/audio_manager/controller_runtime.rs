// Player coroutine: the only place the playback controller lives.
use super::{DioxusHost, EngineHandle};
use crate::db::CatalogSettings;
use crate::playback::{PlaybackController, PlaybackSnapshot, SessionEvent};
use dioxus::prelude::*;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, trace};

/// User intents forwarded from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerIntent {
    Start(String),
    TogglePlayPause,
    ToggleMute,
    Seek(f64),
    SetVolume(u8),
    Teardown,
}

enum Inbound {
    Intent(PlayerIntent),
    Event(SessionEvent<EngineHandle>),
}

/// Handle shared through context: send intents, read the latest snapshot.
#[derive(Clone)]
pub struct PlayerHandle {
    intents: Coroutine<PlayerIntent>,
    pub snapshot: Signal<PlaybackSnapshot>,
}

impl PlayerHandle {
    pub fn send(&self, intent: PlayerIntent) {
        self.intents.send(intent);
    }

    pub fn start(&self, media_id: String) {
        self.send(PlayerIntent::Start(media_id));
    }

    pub fn teardown(&self) {
        self.send(PlayerIntent::Teardown);
    }
}

/// Spawns the player coroutine for the calling component. The controller (and with it the
/// live session) is dropped when that component unmounts.
pub fn use_player_controller(settings: Signal<CatalogSettings>) -> PlayerHandle {
    let mut snapshot = use_signal(PlaybackSnapshot::default);

    let intents = use_coroutine(move |intents: UnboundedReceiver<PlayerIntent>| async move {
        let (events_tx, events_rx) = futures_channel::mpsc::unbounded();
        let mut controller = PlaybackController::new(DioxusHost::new(events_tx, settings));
        let mut inbound = stream::select(
            intents.map(Inbound::Intent),
            events_rx.map(Inbound::Event),
        );

        while let Some(message) = inbound.next().await {
            match message {
                Inbound::Intent(intent) => {
                    debug!(?intent, session = ?controller.current_token(), "player intent");
                    match intent {
                        PlayerIntent::Start(media_id) => controller.start(media_id),
                        PlayerIntent::TogglePlayPause => controller.toggle_play_pause(),
                        PlayerIntent::ToggleMute => controller.toggle_mute(),
                        PlayerIntent::Seek(seconds) => controller.seek(seconds),
                        PlayerIntent::SetVolume(level) => controller.set_volume(level),
                        PlayerIntent::Teardown => controller.teardown(),
                    }
                }
                Inbound::Event(event) => {
                    trace!(token = %event.token(), "session event");
                    controller.handle_event(event);
                }
            }

            let next = controller.snapshot();
            if *snapshot.peek() != next {
                snapshot.set(next);
            }
        }
    });

    PlayerHandle { intents, snapshot }
}
