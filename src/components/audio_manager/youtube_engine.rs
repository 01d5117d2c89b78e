// YouTube IFrame player binding (wasm only).
use crate::error::AppError;
use crate::playback::{EngineState, MediaEngine, SessionEvent, SessionToken};
use dioxus::core::Task;
use dioxus::prelude::*;
use futures_channel::mpsc::UnboundedSender;
use js_sys::{Array, Function, Object, Reflect};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::window;

const IFRAME_API_SRC: &str = "https://www.youtube.com/iframe_api";
const IFRAME_API_SCRIPT_ID: &str = "tubemusic-iframe-api";
const API_WAIT_STEP_MS: u32 = 100;
const API_WAIT_LIMIT_MS: u32 = 15_000;

type EventSender = UnboundedSender<SessionEvent<YouTubeEngine>>;
type JsCallback = Closure<dyn FnMut(JsValue)>;

fn js_error(context: &str, err: JsValue) -> AppError {
    AppError::EngineBind(format!("{context}: {err:?}"))
}

/// A ready IFrame player. Owned by the session once readiness has been delivered.
pub struct YouTubeEngine {
    player: JsValue,
    mount_id: String,
}

impl YouTubeEngine {
    fn call(&self, method: &str, args: &[JsValue]) -> Option<JsValue> {
        let func: Function = Reflect::get(&self.player, &JsValue::from_str(method))
            .ok()?
            .dyn_into()
            .ok()?;
        let args: Array = args.iter().collect();
        func.apply(&self.player, &args).ok()
    }

    fn read_f64(&self, method: &str) -> f64 {
        self.call(method, &[])
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    }
}

impl MediaEngine for YouTubeEngine {
    fn play(&mut self) {
        self.call("playVideo", &[]);
    }

    fn pause(&mut self) {
        self.call("pauseVideo", &[]);
    }

    fn mute(&mut self) {
        self.call("mute", &[]);
    }

    fn unmute(&mut self) {
        self.call("unMute", &[]);
    }

    fn set_volume(&mut self, level: u8) {
        self.call("setVolume", &[JsValue::from(level)]);
    }

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
        self.call(
            "seekTo",
            &[JsValue::from_f64(seconds), JsValue::from_bool(allow_seek_ahead)],
        );
    }

    fn current_time(&self) -> f64 {
        self.read_f64("getCurrentTime")
    }

    fn duration(&self) -> f64 {
        self.read_f64("getDuration")
    }

    fn destroy(&mut self) {
        self.call("destroy", &[]);
        remove_mount(&self.mount_id);
    }
}

/// Bookkeeping for the player of one session until teardown.
struct Binding {
    token: SessionToken,
    mount_id: String,
    player: Rc<RefCell<Option<JsValue>>>,
    handed_over: Rc<Cell<bool>>,
    callbacks: Rc<RefCell<Vec<JsCallback>>>,
}

impl Binding {
    /// Destroys the player unless the session already owns it.
    fn release(self) {
        if !self.handed_over.get() {
            if let Some(player) = self.player.borrow_mut().take() {
                let engine = YouTubeEngine {
                    player,
                    mount_id: self.mount_id.clone(),
                };
                engine.call("destroy", &[]);
            }
            remove_mount(&self.mount_id);
        }
        debug!(token = %self.token, "player binding released");
    }
}

#[derive(Default)]
pub struct YouTubeBinder {
    current: Option<Binding>,
}

impl YouTubeBinder {
    /// Starts creating a player for `media_id`; readiness, state changes and errors are
    /// reported through `events` tagged with `token`.
    pub fn bind(&mut self, token: SessionToken, media_id: &str, events: EventSender) -> Task {
        if let Some(previous) = self.current.take() {
            previous.release();
        }

        let binding = Binding {
            token,
            mount_id: format!("tubemusic-player-{}", token.0),
            player: Rc::new(RefCell::new(None)),
            handed_over: Rc::new(Cell::new(false)),
            callbacks: Rc::new(RefCell::new(Vec::new())),
        };
        let mount_id = binding.mount_id.clone();
        let player = binding.player.clone();
        let handed_over = binding.handed_over.clone();
        let callbacks = binding.callbacks.clone();
        self.current = Some(binding);

        let media_id = media_id.to_string();
        spawn(async move {
            let created = create_player(
                token,
                &media_id,
                &mount_id,
                player,
                handed_over,
                callbacks,
                events.clone(),
            )
            .await;
            if let Err(error) = created {
                let _ = events.unbounded_send(SessionEvent::EngineFailed { token, error });
            }
        })
    }

    pub fn abandon(&mut self, token: SessionToken) {
        if self
            .current
            .as_ref()
            .is_some_and(|binding| binding.token == token)
        {
            if let Some(binding) = self.current.take() {
                binding.release();
            }
        }
    }
}

async fn create_player(
    token: SessionToken,
    media_id: &str,
    mount_id: &str,
    player_slot: Rc<RefCell<Option<JsValue>>>,
    handed_over: Rc<Cell<bool>>,
    callbacks: Rc<RefCell<Vec<JsCallback>>>,
    events: EventSender,
) -> Result<(), AppError> {
    wait_for_iframe_api().await?;
    mount_hidden_element(mount_id)?;

    let on_ready: JsCallback = {
        let player_slot = player_slot.clone();
        let events = events.clone();
        let mount_id = mount_id.to_string();
        Closure::wrap(Box::new(move |event: JsValue| {
            if handed_over.get() {
                return;
            }
            let player = Reflect::get(&event, &JsValue::from_str("target"))
                .ok()
                .filter(|target| !target.is_undefined())
                .or_else(|| player_slot.borrow().clone());
            let Some(player) = player else {
                return;
            };
            handed_over.set(true);
            let engine = YouTubeEngine {
                player,
                mount_id: mount_id.clone(),
            };
            let duration = engine.duration();
            if let Err(err) = events.unbounded_send(SessionEvent::EngineReady {
                token,
                engine,
                duration,
            }) {
                if let SessionEvent::EngineReady { mut engine, .. } = err.into_inner() {
                    engine.destroy();
                }
            }
        }) as Box<dyn FnMut(JsValue)>)
    };

    let on_state_change: JsCallback = {
        let events = events.clone();
        Closure::wrap(Box::new(move |event: JsValue| {
            let code = Reflect::get(&event, &JsValue::from_str("data"))
                .ok()
                .and_then(|value| value.as_f64())
                .unwrap_or(-1.0) as i32;
            let _ = events.unbounded_send(SessionEvent::EngineStateChanged {
                token,
                state: EngineState::from_code(code),
            });
        }) as Box<dyn FnMut(JsValue)>)
    };

    let on_error: JsCallback = {
        let events = events.clone();
        Closure::wrap(Box::new(move |event: JsValue| {
            let code = Reflect::get(&event, &JsValue::from_str("data"))
                .ok()
                .and_then(|value| value.as_f64())
                .unwrap_or(0.0) as i32;
            warn!(%token, code, "embedded player reported an error");
            let _ = events.unbounded_send(SessionEvent::EngineFailed {
                token,
                error: AppError::EngineBind(player_error_message(code).to_string()),
            });
        }) as Box<dyn FnMut(JsValue)>)
    };

    let player = construct_player(mount_id, media_id, &on_ready, &on_state_change, &on_error)?;
    *player_slot.borrow_mut() = Some(player);
    callbacks
        .borrow_mut()
        .extend([on_ready, on_state_change, on_error]);
    debug!(%token, media_id, "player constructed");
    Ok(())
}

fn set_prop(target: &Object, key: &str, value: &JsValue) -> Result<(), AppError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|err| js_error(key, err))
}

fn construct_player(
    mount_id: &str,
    media_id: &str,
    on_ready: &JsCallback,
    on_state_change: &JsCallback,
    on_error: &JsCallback,
) -> Result<JsValue, AppError> {
    let window = window().ok_or_else(|| AppError::EngineBind("no window".to_string()))?;
    let yt = Reflect::get(&window, &JsValue::from_str("YT")).map_err(|e| js_error("YT", e))?;
    let ctor: Function = Reflect::get(&yt, &JsValue::from_str("Player"))
        .map_err(|e| js_error("YT.Player", e))?
        .dyn_into()
        .map_err(|e| js_error("YT.Player", e))?;

    let player_vars = Object::new();
    set_prop(&player_vars, "autoplay", &JsValue::from(1))?;
    set_prop(&player_vars, "playsinline", &JsValue::from(1))?;

    let handlers = Object::new();
    set_prop(&handlers, "onReady", on_ready.as_ref())?;
    set_prop(&handlers, "onStateChange", on_state_change.as_ref())?;
    set_prop(&handlers, "onError", on_error.as_ref())?;

    let options = Object::new();
    set_prop(&options, "height", &JsValue::from_str("0"))?;
    set_prop(&options, "width", &JsValue::from_str("0"))?;
    set_prop(&options, "videoId", &JsValue::from_str(media_id))?;
    set_prop(&options, "playerVars", &player_vars)?;
    set_prop(&options, "events", &handlers)?;

    let args = Array::of2(&JsValue::from_str(mount_id), &options);
    Reflect::construct(&ctor, &args).map_err(|e| js_error("new YT.Player", e))
}

fn player_error_message(code: i32) -> &'static str {
    match code {
        2 => "invalid video id",
        5 => "the video cannot be played in the HTML5 player",
        100 => "the video was not found or is private",
        101 | 150 => "the owner does not allow embedded playback",
        _ => "the player failed to load",
    }
}

fn iframe_api_ready() -> bool {
    let Some(window) = window() else {
        return false;
    };
    Reflect::get(&window, &JsValue::from_str("YT"))
        .ok()
        .filter(|yt| yt.is_object())
        .and_then(|yt| Reflect::get(&yt, &JsValue::from_str("Player")).ok())
        .is_some_and(|player| player.is_function())
}

fn inject_iframe_api() -> Result<(), AppError> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::EngineBind("no document".to_string()))?;
    if document.get_element_by_id(IFRAME_API_SCRIPT_ID).is_some() {
        return Ok(());
    }

    let script = document
        .create_element("script")
        .map_err(|e| js_error("script", e))?;
    script.set_id(IFRAME_API_SCRIPT_ID);
    script
        .set_attribute("src", IFRAME_API_SRC)
        .map_err(|e| js_error("script src", e))?;
    let body = document
        .body()
        .ok_or_else(|| AppError::EngineBind("no document body".to_string()))?;
    body.append_child(&script)
        .map_err(|e| js_error("append script", e))?;
    Ok(())
}

async fn wait_for_iframe_api() -> Result<(), AppError> {
    if iframe_api_ready() {
        return Ok(());
    }
    inject_iframe_api()?;

    let mut waited = 0;
    while waited < API_WAIT_LIMIT_MS {
        gloo_timers::future::TimeoutFuture::new(API_WAIT_STEP_MS).await;
        waited += API_WAIT_STEP_MS;
        if iframe_api_ready() {
            return Ok(());
        }
    }
    Err(AppError::EngineBind(
        "timed out loading the YouTube player API".to_string(),
    ))
}

fn mount_hidden_element(mount_id: &str) -> Result<(), AppError> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::EngineBind("no document".to_string()))?;
    if document.get_element_by_id(mount_id).is_some() {
        return Ok(());
    }

    let mount = document
        .create_element("div")
        .map_err(|e| js_error("mount", e))?;
    mount.set_id(mount_id);
    mount
        .set_attribute(
            "style",
            "position:absolute;width:0;height:0;overflow:hidden;pointer-events:none;",
        )
        .map_err(|e| js_error("mount style", e))?;
    let body = document
        .body()
        .ok_or_else(|| AppError::EngineBind("no document body".to_string()))?;
    body.append_child(&mount)
        .map_err(|e| js_error("append mount", e))?;
    Ok(())
}

fn remove_mount(mount_id: &str) {
    if let Some(element) = window()
        .and_then(|w| w.document())
        .and_then(|doc| doc.get_element_by_id(mount_id))
    {
        element.remove();
    }
}
