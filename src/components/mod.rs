//! Presentation layer: the app shell, catalog listing and the player panel.

mod app;
mod audio_manager;
mod icons;
mod player;
mod search_bar;
mod settings_panel;
mod video_list;

pub use app::*;
pub use audio_manager::*;
pub use icons::*;
pub use player::*;
pub use search_bar::*;
pub use settings_panel::*;
pub use video_list::*;
