use super::engine::{EngineState, MediaEngine};
use std::fmt;

/// Identity of one play session. Every asynchronous result carries the token it was issued
/// under and is dropped unless it still matches the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub(crate) u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Idle,
    Loading,
    /// Part of the published state set. The controller goes straight from `Loading` to
    /// `Playing` because binding always autoplays, so it never reports this state itself.
    #[allow(dead_code)]
    Ready,
    Playing,
    Paused,
    Errored,
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

pub const DEFAULT_VOLUME: u8 = 100;

/// Render-side view of the session. Cloned out of the controller after every message.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub media_id: Option<String>,
    pub play_state: PlayState,
    pub engine_state: EngineState,
    pub muted: bool,
    pub volume: u8,
    pub current_time: f64,
    pub duration: f64,
    pub title: String,
    pub thumbnail_url: String,
    pub metadata_error: bool,
    pub engine_error: bool,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            media_id: None,
            play_state: PlayState::Idle,
            engine_state: EngineState::Unstarted,
            muted: false,
            volume: DEFAULT_VOLUME,
            current_time: 0.0,
            duration: 0.0,
            title: String::new(),
            thumbnail_url: String::new(),
            metadata_error: false,
            engine_error: false,
        }
    }
}

impl PlaybackSnapshot {
    pub fn has_error(&self) -> bool {
        self.metadata_error || self.engine_error
    }

    /// Metadata still outstanding for a live session.
    pub fn is_loading_details(&self) -> bool {
        self.media_id.is_some() && self.title.is_empty() && !self.has_error()
    }
}

/// Cancels a scheduled poll task when dropped.
pub struct PollTimer {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl PollTimer {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for PollTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollTimer")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// One live play session. Dropping it releases the engine handle and stops polling, so every
/// exit path (teardown, reselection, unmount) cleans up the same way.
pub(crate) struct Session<E: MediaEngine> {
    pub(crate) token: SessionToken,
    pub(crate) engine: Option<E>,
    pub(crate) poll: Option<PollTimer>,
    pub(crate) view: PlaybackSnapshot,
}

impl<E: MediaEngine> Session<E> {
    pub(crate) fn new(token: SessionToken, media_id: String) -> Self {
        Self {
            token,
            engine: None,
            poll: None,
            view: PlaybackSnapshot {
                media_id: Some(media_id),
                play_state: PlayState::Loading,
                ..PlaybackSnapshot::default()
            },
        }
    }

    pub(crate) fn media_id(&self) -> &str {
        self.view.media_id.as_deref().unwrap_or_default()
    }

    /// Stops polling and destroys the engine, leaving the view intact.
    pub(crate) fn release(&mut self) {
        self.poll = None;
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}

impl<E: MediaEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn poll_timer_cancels_once_on_drop() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let timer = PollTimer::new(move || counter.set(counter.get() + 1));
        drop(timer);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn explicit_cancel_does_not_fire_again_on_drop() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        PollTimer::new(move || counter.set(counter.get() + 1)).cancel();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn idle_snapshot_is_not_loading() {
        let snapshot = PlaybackSnapshot::default();
        assert!(!snapshot.is_loading_details());
        assert_eq!(snapshot.volume, DEFAULT_VOLUME);
    }
}
