//! Playback session controller.
//!
//! Owns at most one [`Session`] at a time, dispatches user intents to its engine and reconciles
//! engine notifications back into the session view. Everything asynchronous (engine binding,
//! metadata lookups, poll ticks) comes back in as a [`SessionEvent`] tagged with the token of the
//! session that issued it; anything tagged with an older token is dropped.

use super::engine::{EngineState, MediaEngine};
use super::session::{
    PlayState, PlaybackSnapshot, PollTimer, Session, SessionToken, DEFAULT_VOLUME,
};
use crate::api::models::MediaDetails;
use crate::error::AppError;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Side of the controller that talks to the outside world.
pub trait PlaybackHost {
    type Engine: MediaEngine;

    /// Request a player for `media_id` with autoplay enabled. The handle comes back later as
    /// [`SessionEvent::EngineReady`] (or [`SessionEvent::EngineFailed`]).
    fn bind_engine(&mut self, token: SessionToken, media_id: &str);

    /// Look up title and thumbnail. Resolves as [`SessionEvent::MetadataLoaded`].
    fn fetch_metadata(&mut self, token: SessionToken, media_id: &str);

    /// Deliver [`SessionEvent::PollTick`] every `interval` until the returned timer is dropped.
    fn schedule_poll(&mut self, token: SessionToken, interval: Duration) -> PollTimer;

    /// Drop whatever is still in flight for `token`. Results that still arrive are discarded
    /// by the controller anyway.
    fn abandon(&mut self, token: SessionToken);
}

/// Completion of asynchronous work issued by a session.
pub enum SessionEvent<E> {
    EngineReady {
        token: SessionToken,
        engine: E,
        duration: f64,
    },
    EngineStateChanged {
        token: SessionToken,
        state: EngineState,
    },
    EngineFailed {
        token: SessionToken,
        error: AppError,
    },
    MetadataLoaded {
        token: SessionToken,
        result: Result<MediaDetails, AppError>,
    },
    PollTick {
        token: SessionToken,
    },
}

impl<E> SessionEvent<E> {
    pub fn token(&self) -> SessionToken {
        match self {
            Self::EngineReady { token, .. }
            | Self::EngineStateChanged { token, .. }
            | Self::EngineFailed { token, .. }
            | Self::MetadataLoaded { token, .. }
            | Self::PollTick { token } => *token,
        }
    }
}

pub struct PlaybackController<H: PlaybackHost> {
    host: H,
    generation: u64,
    session: Option<Session<H::Engine>>,
}

impl<H: PlaybackHost> PlaybackController<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            generation: 0,
            session: None,
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.session
            .as_ref()
            .map(|session| session.view.clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn play_state(&self) -> PlayState {
        self.session
            .as_ref()
            .map(|session| session.view.play_state)
            .unwrap_or_default()
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|session| session.token)
    }

    /// Replace the live session with a fresh one for `media_id`.
    pub fn start(&mut self, media_id: impl Into<String>) {
        let media_id = media_id.into();
        self.teardown();

        if media_id.trim().is_empty() {
            warn!("ignoring playback start without a media id");
            return;
        }

        self.generation = self.generation.wrapping_add(1);
        let token = SessionToken(self.generation);
        info!(%token, media_id = %media_id, "starting playback session");

        self.session = Some(Session::new(token, media_id.clone()));
        self.host.fetch_metadata(token, &media_id);
        self.host.bind_engine(token, &media_id);
    }

    /// Stop polling, destroy the engine and forget the session. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let token = session.token;
        drop(session);
        self.host.abandon(token);
        debug!(%token, "playback session torn down");
    }

    pub fn handle_event(&mut self, event: SessionEvent<H::Engine>) {
        match event {
            SessionEvent::EngineReady {
                token,
                engine,
                duration,
            } => self.on_engine_ready(token, engine, duration),
            SessionEvent::EngineStateChanged { token, state } => {
                self.on_engine_state_change(token, state)
            }
            SessionEvent::EngineFailed { token, error } => self.fail(token, error),
            SessionEvent::MetadataLoaded { token, result } => self.on_metadata(token, result),
            SessionEvent::PollTick { token } => self.on_poll_tick(token),
        }
    }

    pub fn on_engine_ready(&mut self, token: SessionToken, mut engine: H::Engine, duration: f64) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.token == token)
            .filter(|session| session.engine.is_none())
            .filter(|session| session.view.play_state != PlayState::Errored)
        else {
            debug!(%token, "releasing engine handed to an inactive session");
            engine.destroy();
            return;
        };

        engine.unmute();
        // A level chosen while the player was still loading has not reached it yet.
        if session.view.volume != DEFAULT_VOLUME {
            engine.set_volume(session.view.volume);
        }
        engine.play();
        session.view.muted = false;
        session.view.duration = non_negative(duration);
        session.engine = Some(engine);
        debug!(%token, duration = session.view.duration, "engine ready");
        Self::transition(&mut self.host, session, PlayState::Playing);
    }

    pub fn on_engine_state_change(&mut self, token: SessionToken, state: EngineState) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.token == token)
        else {
            debug!(%token, ?state, "dropping state change from stale session");
            return;
        };
        if session.engine.is_none() {
            debug!(%token, ?state, "state change before engine ready");
            return;
        }

        session.view.engine_state = state;
        if state == EngineState::Ended && session.view.duration > 0.0 {
            session.view.current_time = session.view.duration;
        }
        let next = if state.is_playing() {
            PlayState::Playing
        } else {
            PlayState::Paused
        };
        Self::transition(&mut self.host, session, next);
    }

    fn on_metadata(&mut self, token: SessionToken, result: Result<MediaDetails, AppError>) {
        let details = match result {
            Ok(details) => details,
            Err(error) => return self.fail(token, error),
        };
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.token == token)
        else {
            debug!(%token, "dropping metadata for stale session");
            return;
        };
        if session.view.metadata_error {
            return;
        }
        session.view.title = details.title;
        session.view.thumbnail_url = details.thumbnail_url;
    }

    fn fail(&mut self, token: SessionToken, error: AppError) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.token == token)
        else {
            debug!(%token, %error, "dropping failure from stale session");
            return;
        };
        warn!(%token, media_id = session.media_id(), %error, "playback session failed");

        match error {
            AppError::MetadataFetch(_) => {
                session.view.metadata_error = true;
                session.view.title.clear();
                session.view.thumbnail_url.clear();
            }
            _ => session.view.engine_error = true,
        }
        session.release();
        Self::transition(&mut self.host, session, PlayState::Errored);
        self.host.abandon(token);
    }

    pub fn on_poll_tick(&mut self, token: SessionToken) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.token == token)
        else {
            return;
        };
        if !session.view.play_state.is_playing() {
            return;
        }
        let Some(engine) = session.engine.as_ref() else {
            return;
        };

        if session.view.duration <= 0.0 {
            session.view.duration = non_negative(engine.duration());
        }
        let time = non_negative(engine.current_time());
        session.view.current_time = clamp_to_duration(time, session.view.duration);
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(engine) = session.engine.as_mut() else {
            debug!("play/pause ignored until the engine is ready");
            return;
        };

        let next = if session.view.play_state.is_playing() {
            engine.pause();
            PlayState::Paused
        } else {
            engine.play();
            PlayState::Playing
        };
        Self::transition(&mut self.host, session, next);
    }

    pub fn toggle_mute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(engine) = session.engine.as_mut() else {
            return;
        };

        if session.view.muted {
            engine.unmute();
        } else {
            engine.mute();
        }
        session.view.muted = !session.view.muted;
    }

    pub fn seek(&mut self, target_seconds: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(engine) = session.engine.as_mut() else {
            return;
        };

        let target = clamp_to_duration(non_negative(target_seconds), session.view.duration);
        engine.seek_to(target, true);
        session.view.current_time = target;
    }

    pub fn set_volume(&mut self, level: u8) {
        let level = level.min(100);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.view.play_state == PlayState::Errored {
            return;
        }

        session.view.volume = level;
        if let Some(engine) = session.engine.as_mut() {
            engine.set_volume(level);
        }
    }

    fn transition(host: &mut H, session: &mut Session<H::Engine>, next: PlayState) {
        let previous = session.view.play_state;
        session.view.play_state = next;

        // Only a bound, playing session may hold a poll timer.
        if next.is_playing() && session.engine.is_some() {
            if session.poll.is_none() {
                session.poll = Some(host.schedule_poll(session.token, POLL_INTERVAL));
            }
        } else if let Some(poll) = session.poll.take() {
            poll.cancel();
        }

        if previous != next {
            debug!(token = %session.token, ?previous, ?next, "play state changed");
        }
    }
}

impl<H: PlaybackHost> Drop for PlaybackController<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_to_duration(time: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        time.min(duration)
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Bind(SessionToken, String),
        Fetch(SessionToken, String),
        Schedule(SessionToken),
        CancelPoll(SessionToken),
        Abandon(SessionToken),
        Engine(String, EngineCall),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum EngineCall {
        Play,
        Pause,
        Mute,
        Unmute,
        SetVolume(u8),
        SeekTo(f64, bool),
        ReadTime,
        ReadDuration,
        Destroy,
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct MockEngine {
        media_id: String,
        log: Log,
        clock: Rc<Cell<f64>>,
        duration: f64,
    }

    impl MockEngine {
        fn record(&self, call: EngineCall) {
            self.log
                .borrow_mut()
                .push(Call::Engine(self.media_id.clone(), call));
        }
    }

    impl MediaEngine for MockEngine {
        fn play(&mut self) {
            self.record(EngineCall::Play);
        }
        fn pause(&mut self) {
            self.record(EngineCall::Pause);
        }
        fn mute(&mut self) {
            self.record(EngineCall::Mute);
        }
        fn unmute(&mut self) {
            self.record(EngineCall::Unmute);
        }
        fn set_volume(&mut self, level: u8) {
            self.record(EngineCall::SetVolume(level));
        }
        fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
            self.record(EngineCall::SeekTo(seconds, allow_seek_ahead));
        }
        fn current_time(&self) -> f64 {
            self.record(EngineCall::ReadTime);
            self.clock.get()
        }
        fn duration(&self) -> f64 {
            self.record(EngineCall::ReadDuration);
            self.duration
        }
        fn destroy(&mut self) {
            self.record(EngineCall::Destroy);
        }
    }

    struct MockHost {
        log: Log,
    }

    impl PlaybackHost for MockHost {
        type Engine = MockEngine;

        fn bind_engine(&mut self, token: SessionToken, media_id: &str) {
            self.log
                .borrow_mut()
                .push(Call::Bind(token, media_id.to_string()));
        }

        fn fetch_metadata(&mut self, token: SessionToken, media_id: &str) {
            self.log
                .borrow_mut()
                .push(Call::Fetch(token, media_id.to_string()));
        }

        fn schedule_poll(&mut self, token: SessionToken, interval: Duration) -> PollTimer {
            assert_eq!(interval, POLL_INTERVAL);
            self.log.borrow_mut().push(Call::Schedule(token));
            let log = self.log.clone();
            PollTimer::new(move || log.borrow_mut().push(Call::CancelPoll(token)))
        }

        fn abandon(&mut self, token: SessionToken) {
            self.log.borrow_mut().push(Call::Abandon(token));
        }
    }

    fn controller() -> (PlaybackController<MockHost>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let host = MockHost { log: log.clone() };
        (PlaybackController::new(host), log)
    }

    fn engine_for(log: &Log, media_id: &str) -> (MockEngine, Rc<Cell<f64>>) {
        let clock = Rc::new(Cell::new(0.0));
        let engine = MockEngine {
            media_id: media_id.to_string(),
            log: log.clone(),
            clock: clock.clone(),
            duration: 0.0,
        };
        (engine, clock)
    }

    /// Starts `media_id` and makes its engine ready; returns the engine clock.
    fn start_ready(
        controller: &mut PlaybackController<MockHost>,
        log: &Log,
        media_id: &str,
        duration: f64,
    ) -> Rc<Cell<f64>> {
        controller.start(media_id);
        let token = controller.current_token().expect("session started");
        let (engine, clock) = engine_for(log, media_id);
        controller.handle_event(SessionEvent::EngineReady {
            token,
            engine,
            duration,
        });
        clock
    }

    fn position(log: &Log, call: &Call) -> usize {
        log.borrow()
            .iter()
            .position(|entry| entry == call)
            .unwrap_or_else(|| panic!("{call:?} not recorded"))
    }

    fn count(log: &Log, predicate: impl Fn(&Call) -> bool) -> usize {
        log.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn details(title: &str) -> MediaDetails {
        MediaDetails {
            title: title.to_string(),
            thumbnail_url: format!("https://img.example/{title}.jpg"),
        }
    }

    #[test]
    fn start_issues_metadata_fetch_and_bind() {
        let (mut controller, log) = controller();
        controller.start("abc");
        let token = controller.current_token().unwrap();

        assert_eq!(controller.play_state(), PlayState::Loading);
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Fetch(token, "abc".to_string()),
                Call::Bind(token, "abc".to_string()),
            ]
        );
    }

    #[test]
    fn empty_media_id_leaves_controller_idle() {
        let (mut controller, log) = controller();
        controller.start("  ");
        assert_eq!(controller.play_state(), PlayState::Idle);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn previous_engine_destroyed_before_next_bind() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "id1", 120.0);
        controller.start("id2");
        let second = controller.current_token().unwrap();

        let destroyed = position(&log, &Call::Engine("id1".into(), EngineCall::Destroy));
        let cancelled = log
            .borrow()
            .iter()
            .position(|call| matches!(call, Call::CancelPoll(_)))
            .unwrap();
        let bound = position(&log, &Call::Bind(second, "id2".into()));
        assert!(destroyed < bound);
        assert!(cancelled < bound);
    }

    #[test]
    fn pending_bind_abandoned_before_next_bind() {
        let (mut controller, log) = controller();
        controller.start("x");
        let first = controller.current_token().unwrap();
        controller.start("y");
        let second = controller.current_token().unwrap();

        assert_ne!(first, second);
        assert!(
            position(&log, &Call::Abandon(first)) < position(&log, &Call::Bind(second, "y".into()))
        );
    }

    #[test]
    fn late_ready_from_superseded_session_is_ignored() {
        let (mut controller, log) = controller();
        controller.start("x");
        let stale = controller.current_token().unwrap();
        controller.start("y");

        let (engine, _) = engine_for(&log, "x");
        controller.handle_event(SessionEvent::EngineReady {
            token: stale,
            engine,
            duration: 300.0,
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.media_id.as_deref(), Some("y"));
        assert_eq!(snapshot.play_state, PlayState::Loading);
        assert_eq!(snapshot.duration, 0.0);
        assert_eq!(count(&log, |c| matches!(c, Call::Schedule(_))), 0);
        // The orphaned handle is released, never played.
        assert_eq!(
            count(&log, |c| *c == Call::Engine("x".into(), EngineCall::Destroy)),
            1
        );
        assert_eq!(
            count(&log, |c| *c == Call::Engine("x".into(), EngineCall::Play)),
            0
        );
    }

    #[test]
    fn x_then_y_scenario_keeps_y_state() {
        let (mut controller, log) = controller();
        controller.start("x");
        let x_token = controller.current_token().unwrap();
        controller.start("y");
        let y_token = controller.current_token().unwrap();

        let (y_engine, _) = engine_for(&log, "y");
        controller.handle_event(SessionEvent::EngineReady {
            token: y_token,
            engine: y_engine,
            duration: 180.0,
        });
        controller.handle_event(SessionEvent::MetadataLoaded {
            token: y_token,
            result: Ok(details("Song Y")),
        });

        let (x_engine, _) = engine_for(&log, "x");
        controller.handle_event(SessionEvent::EngineReady {
            token: x_token,
            engine: x_engine,
            duration: 999.0,
        });
        controller.handle_event(SessionEvent::MetadataLoaded {
            token: x_token,
            result: Ok(details("Song X")),
        });
        controller.handle_event(SessionEvent::EngineStateChanged {
            token: x_token,
            state: EngineState::Paused,
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.media_id.as_deref(), Some("y"));
        assert_eq!(snapshot.title, "Song Y");
        assert_eq!(snapshot.duration, 180.0);
        assert_eq!(snapshot.play_state, PlayState::Playing);
    }

    #[test]
    fn callbacks_after_teardown_are_ignored() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();
        controller.teardown();

        controller.handle_event(SessionEvent::EngineStateChanged {
            token,
            state: EngineState::Playing,
        });
        controller.handle_event(SessionEvent::PollTick { token });

        assert_eq!(controller.snapshot(), PlaybackSnapshot::default());
        assert_eq!(count(&log, |c| *c == Call::Engine("abc".into(), EngineCall::ReadTime)), 0);
    }

    #[test]
    fn teardown_is_idempotent() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        controller.teardown();
        controller.teardown();

        assert_eq!(
            count(&log, |c| *c == Call::Engine("abc".into(), EngineCall::Destroy)),
            1
        );
        assert_eq!(count(&log, |c| matches!(c, Call::Abandon(_))), 1);
        assert_eq!(controller.play_state(), PlayState::Idle);
    }

    #[test]
    fn ready_unmutes_plays_and_starts_polling() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();

        let unmute = position(&log, &Call::Engine("abc".into(), EngineCall::Unmute));
        let play = position(&log, &Call::Engine("abc".into(), EngineCall::Play));
        let schedule = position(&log, &Call::Schedule(token));
        assert!(unmute < play && play < schedule);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Playing);
        assert_eq!(snapshot.duration, 200.0);
        assert!(!snapshot.muted);
        assert_eq!(
            count(&log, |c| matches!(c, Call::Engine(_, EngineCall::SetVolume(_)))),
            0
        );
    }

    #[test]
    fn toggle_from_paused_plays_immediately() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();
        controller.handle_event(SessionEvent::EngineStateChanged {
            token,
            state: EngineState::Paused,
        });
        assert_eq!(controller.play_state(), PlayState::Paused);

        log.borrow_mut().clear();
        controller.toggle_play_pause();

        assert_eq!(controller.play_state(), PlayState::Playing);
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Engine("abc".into(), EngineCall::Play),
                Call::Schedule(token),
            ]
        );
    }

    #[test]
    fn engine_notification_overrides_optimistic_toggle() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();

        controller.toggle_play_pause();
        assert_eq!(controller.play_state(), PlayState::Paused);

        controller.handle_event(SessionEvent::EngineStateChanged {
            token,
            state: EngineState::Playing,
        });
        assert_eq!(controller.play_state(), PlayState::Playing);

        controller.handle_event(SessionEvent::EngineStateChanged {
            token,
            state: EngineState::Buffering,
        });
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Paused);
        assert_eq!(snapshot.engine_state, EngineState::Buffering);
    }

    #[test]
    fn no_time_reads_unless_playing() {
        let (mut controller, log) = controller();

        controller.start("abc");
        let token = controller.current_token().unwrap();
        controller.on_poll_tick(token);

        let (engine, _) = engine_for(&log, "abc");
        controller.on_engine_ready(token, engine, 200.0);
        controller.toggle_play_pause();
        assert_eq!(controller.play_state(), PlayState::Paused);
        for _ in 0..3 {
            controller.on_poll_tick(token);
        }
        assert_eq!(count(&log, |c| matches!(c, Call::Engine(_, EngineCall::ReadTime))), 0);

        // Leaving Playing cancels the timer.
        let scheduled = position(&log, &Call::Schedule(token));
        let cancelled = position(&log, &Call::CancelPoll(token));
        assert!(scheduled < cancelled);

        controller.handle_event(SessionEvent::MetadataLoaded {
            token,
            result: Err(AppError::MetadataFetch("quota".into())),
        });
        controller.on_poll_tick(token);
        assert_eq!(count(&log, |c| matches!(c, Call::Engine(_, EngineCall::ReadTime))), 0);
    }

    #[test]
    fn set_volume_issues_exactly_one_command() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);

        for level in [0u8, 1, 37, 99, 100] {
            log.borrow_mut().clear();
            controller.set_volume(level);
            assert_eq!(controller.snapshot().volume, level);
            assert_eq!(
                *log.borrow(),
                vec![Call::Engine("abc".into(), EngineCall::SetVolume(level))]
            );
        }

        controller.set_volume(180);
        assert_eq!(controller.snapshot().volume, 100);
    }

    #[test]
    fn volume_before_ready_is_applied_once_engine_is_ready() {
        let (mut controller, log) = controller();
        controller.start("abc");
        let token = controller.current_token().unwrap();
        controller.set_volume(40);

        assert_eq!(controller.snapshot().volume, 40);
        assert_eq!(count(&log, |c| matches!(c, Call::Engine(..))), 0);

        let (engine, _) = engine_for(&log, "abc");
        controller.on_engine_ready(token, engine, 200.0);

        assert_eq!(controller.snapshot().volume, 40);
        assert_eq!(
            count(&log, |c| matches!(c, Call::Engine(_, EngineCall::SetVolume(_)))),
            1
        );
        let volume = position(&log, &Call::Engine("abc".into(), EngineCall::SetVolume(40)));
        let play = position(&log, &Call::Engine("abc".into(), EngineCall::Play));
        assert!(volume < play);
    }

    #[test]
    fn failures_from_superseded_session_are_ignored() {
        let (mut controller, log) = controller();
        controller.start("x");
        let stale = controller.current_token().unwrap();
        start_ready(&mut controller, &log, "y", 120.0);

        controller.handle_event(SessionEvent::MetadataLoaded {
            token: stale,
            result: Err(AppError::MetadataFetch("timeout".into())),
        });
        controller.handle_event(SessionEvent::EngineFailed {
            token: stale,
            error: AppError::EngineBind("embedding disabled".into()),
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.media_id.as_deref(), Some("y"));
        assert_eq!(snapshot.play_state, PlayState::Playing);
        assert!(!snapshot.has_error());
        assert_eq!(
            count(&log, |c| *c == Call::Engine("y".into(), EngineCall::Destroy)),
            0
        );
    }

    #[test]
    fn intents_before_ready_are_ignored() {
        let (mut controller, log) = controller();
        controller.start("abc");
        controller.toggle_play_pause();
        controller.toggle_mute();
        controller.seek(30.0);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Loading);
        assert!(!snapshot.muted);
        assert_eq!(snapshot.current_time, 0.0);
        assert_eq!(count(&log, |c| matches!(c, Call::Engine(..))), 0);
    }

    #[test]
    fn toggle_mute_sends_inverse_command() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);

        log.borrow_mut().clear();
        controller.toggle_mute();
        assert!(controller.snapshot().muted);
        controller.toggle_mute();
        assert!(!controller.snapshot().muted);
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Engine("abc".into(), EngineCall::Mute),
                Call::Engine("abc".into(), EngineCall::Unmute),
            ]
        );
    }

    #[test]
    fn seek_is_optimistic_and_clamped() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);

        controller.seek(42.0);
        assert_eq!(controller.snapshot().current_time, 42.0);
        controller.seek(500.0);
        assert_eq!(controller.snapshot().current_time, 200.0);
        controller.seek(-3.0);
        assert_eq!(controller.snapshot().current_time, 0.0);

        let seeks: Vec<Call> = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Engine(_, EngineCall::SeekTo(..))))
            .cloned()
            .collect();
        assert_eq!(
            seeks,
            vec![
                Call::Engine("abc".into(), EngineCall::SeekTo(42.0, true)),
                Call::Engine("abc".into(), EngineCall::SeekTo(200.0, true)),
                Call::Engine("abc".into(), EngineCall::SeekTo(0.0, true)),
            ]
        );
    }

    #[test]
    fn end_to_end_abc_scenario() {
        let (mut controller, log) = controller();
        controller.start("abc");
        let token = controller.current_token().unwrap();

        controller.handle_event(SessionEvent::MetadataLoaded {
            token,
            result: Ok(details("Song A")),
        });
        let (engine, clock) = engine_for(&log, "abc");
        controller.handle_event(SessionEvent::EngineReady {
            token,
            engine,
            duration: 200.0,
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Playing);
        assert_eq!(snapshot.duration, 200.0);
        assert_eq!(snapshot.title, "Song A");

        for time in [10.0, 20.0, 31.0] {
            clock.set(time);
            controller.handle_event(SessionEvent::PollTick { token });
        }
        assert_eq!(controller.snapshot().current_time, 31.0);
    }

    #[test]
    fn metadata_failure_is_terminal_for_the_session() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();

        controller.handle_event(SessionEvent::MetadataLoaded {
            token,
            result: Err(AppError::MetadataFetch("404".into())),
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Errored);
        assert!(snapshot.metadata_error);
        assert!(snapshot.title.is_empty());
        assert_eq!(
            count(&log, |c| *c == Call::Engine("abc".into(), EngineCall::Destroy)),
            1
        );

        controller.handle_event(SessionEvent::EngineStateChanged {
            token,
            state: EngineState::Playing,
        });
        controller.toggle_play_pause();
        controller.set_volume(10);
        assert_eq!(controller.play_state(), PlayState::Errored);
        assert_eq!(controller.snapshot().volume, 100);

        controller.start("def");
        assert_eq!(controller.play_state(), PlayState::Loading);
        assert!(!controller.snapshot().metadata_error);
    }

    #[test]
    fn engine_failure_renders_fallback_like_metadata_failure() {
        let (mut controller, log) = controller();
        controller.start("abc");
        let token = controller.current_token().unwrap();

        controller.handle_event(SessionEvent::EngineFailed {
            token,
            error: AppError::EngineBind("embedding disabled".into()),
        });
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Errored);
        assert!(snapshot.engine_error);
        assert!(snapshot.has_error());

        // A handle that still shows up afterwards is released straight away.
        let (engine, _) = engine_for(&log, "abc");
        controller.on_engine_ready(token, engine, 100.0);
        assert_eq!(controller.play_state(), PlayState::Errored);
        assert_eq!(
            count(&log, |c| *c == Call::Engine("abc".into(), EngineCall::Play)),
            0
        );
    }

    #[test]
    fn ended_snaps_time_to_duration() {
        let (mut controller, log) = controller();
        let clock = start_ready(&mut controller, &log, "abc", 200.0);
        let token = controller.current_token().unwrap();
        clock.set(199.0);
        controller.on_poll_tick(token);

        controller.on_engine_state_change(token, EngineState::Ended);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.play_state, PlayState::Paused);
        assert_eq!(snapshot.current_time, 200.0);
    }

    #[test]
    fn poll_picks_up_late_duration_and_clamps_time() {
        let (mut controller, log) = controller();
        controller.start("abc");
        let token = controller.current_token().unwrap();
        let (mut engine, clock) = engine_for(&log, "abc");
        engine.duration = 90.0;
        controller.on_engine_ready(token, engine, 0.0);

        clock.set(95.0);
        controller.on_poll_tick(token);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.duration, 90.0);
        assert_eq!(snapshot.current_time, 90.0);
    }

    #[test]
    fn dropping_controller_releases_session() {
        let (mut controller, log) = controller();
        start_ready(&mut controller, &log, "abc", 200.0);
        drop(controller);

        assert_eq!(
            count(&log, |c| *c == Call::Engine("abc".into(), EngineCall::Destroy)),
            1
        );
        assert_eq!(count(&log, |c| matches!(c, Call::CancelPoll(_))), 1);
    }
}
