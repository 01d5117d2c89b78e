/// Capability set the session controller drives.
///
/// Commands are fire-and-forget: the engine confirms them (if at all) through state-change
/// notifications. Only `current_time` and `duration` are treated as instantaneous reads.
pub trait MediaEngine {
    fn play(&mut self);
    fn pause(&mut self);
    fn mute(&mut self);
    fn unmute(&mut self);
    /// `level` is already clamped to 0..=100.
    fn set_volume(&mut self, level: u8);
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    /// Releases the underlying player. Called exactly once per handle.
    fn destroy(&mut self);
}

/// Raw state reported by the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    Other(i32),
}

impl EngineState {
    /// Maps the IFrame player's numeric state codes.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::Unstarted,
            0 => Self::Ended,
            1 => Self::Playing,
            2 => Self::Paused,
            3 => Self::Buffering,
            5 => Self::Cued,
            other => Self::Other(other),
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}
