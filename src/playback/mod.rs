//! Playback session core: a single active session bound to an external media engine.
//! Kept free of UI types so the state machine can be exercised without a browser.

mod controller;
mod engine;
mod session;

pub use controller::*;
pub use engine::*;
pub use session::{PlayState, PlaybackSnapshot, PollTimer, SessionToken};
