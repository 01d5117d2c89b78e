//! Audio Manager - connects the playback controller to the browser.
//! Async work is spawned on the Dioxus runtime and reports back through one event channel,
//! so the controller only ever runs inside the player coroutine.

use crate::api::YouTubeClient;
use crate::db::CatalogSettings;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::AppError;
use crate::playback::{PlaybackHost, PollTimer, SessionEvent, SessionToken};
use dioxus::core::Task;
use dioxus::prelude::*;
use futures_channel::mpsc::UnboundedSender;
use std::time::Duration;

mod controller_runtime;
#[cfg(target_arch = "wasm32")]
mod youtube_engine;

pub use controller_runtime::*;

#[cfg(target_arch = "wasm32")]
pub use youtube_engine::YouTubeEngine as EngineHandle;

#[cfg(not(target_arch = "wasm32"))]
pub use unavailable::UnavailableEngine as EngineHandle;

pub type EngineEvents = UnboundedSender<SessionEvent<EngineHandle>>;

#[cfg(not(target_arch = "wasm32"))]
mod unavailable {
    use crate::playback::MediaEngine;

    /// Native builds have no embedded player; no value of this type can exist.
    pub enum UnavailableEngine {}

    impl MediaEngine for UnavailableEngine {
        fn play(&mut self) {
            match *self {}
        }
        fn pause(&mut self) {
            match *self {}
        }
        fn mute(&mut self) {
            match *self {}
        }
        fn unmute(&mut self) {
            match *self {}
        }
        fn set_volume(&mut self, _level: u8) {
            match *self {}
        }
        fn seek_to(&mut self, _seconds: f64, _allow_seek_ahead: bool) {
            match *self {}
        }
        fn current_time(&self) -> f64 {
            match *self {}
        }
        fn duration(&self) -> f64 {
            match *self {}
        }
        fn destroy(&mut self) {
            match *self {}
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn poll_delay(interval: Duration) {
    tokio::time::sleep(interval).await;
}

#[cfg(target_arch = "wasm32")]
async fn poll_delay(interval: Duration) {
    gloo_timers::future::TimeoutFuture::new(interval.as_millis() as u32).await;
}

pub struct DioxusHost {
    events: EngineEvents,
    settings: Signal<CatalogSettings>,
    in_flight: Vec<(SessionToken, Task)>,
    #[cfg(target_arch = "wasm32")]
    binder: youtube_engine::YouTubeBinder,
}

impl DioxusHost {
    pub fn new(events: EngineEvents, settings: Signal<CatalogSettings>) -> Self {
        Self {
            events,
            settings,
            in_flight: Vec::new(),
            #[cfg(target_arch = "wasm32")]
            binder: youtube_engine::YouTubeBinder::default(),
        }
    }
}

impl PlaybackHost for DioxusHost {
    type Engine = EngineHandle;

    #[cfg(target_arch = "wasm32")]
    fn bind_engine(&mut self, token: SessionToken, media_id: &str) {
        let task = self.binder.bind(token, media_id, self.events.clone());
        self.in_flight.push((token, task));
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn bind_engine(&mut self, token: SessionToken, _media_id: &str) {
        let _ = self.events.unbounded_send(SessionEvent::EngineFailed {
            token,
            error: AppError::EngineBind(
                "the embedded player is only available in the web build".to_string(),
            ),
        });
    }

    fn fetch_metadata(&mut self, token: SessionToken, media_id: &str) {
        let client = YouTubeClient::new(self.settings.peek().clone());
        let events = self.events.clone();
        let media_id = media_id.to_string();
        let task = spawn(async move {
            let result = client.video_details(&media_id).await;
            let _ = events.unbounded_send(SessionEvent::MetadataLoaded { token, result });
        });
        self.in_flight.push((token, task));
    }

    fn schedule_poll(&mut self, token: SessionToken, interval: Duration) -> PollTimer {
        let events = self.events.clone();
        let task = spawn(async move {
            loop {
                poll_delay(interval).await;
                if events
                    .unbounded_send(SessionEvent::PollTick { token })
                    .is_err()
                {
                    break;
                }
            }
        });
        PollTimer::new(move || task.cancel())
    }

    fn abandon(&mut self, token: SessionToken) {
        self.in_flight.retain(|(owner, task)| {
            if *owner == token {
                task.cancel();
                false
            } else {
                true
            }
        });
        #[cfg(target_arch = "wasm32")]
        self.binder.abandon(token);
    }
}
