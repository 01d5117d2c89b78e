use crate::api::models::format_time;
use crate::components::{Icon, PlayerHandle};
use crate::playback::PlayState;
use dioxus::prelude::*;

mod controls;

use controls::{MuteButton, PlayPauseButton, SeekBar, VolumeSlider};

#[component]
pub fn AudioPlayer() -> Element {
    let player = use_context::<PlayerHandle>();
    let snapshot = (player.snapshot)();

    if snapshot.media_id.is_none() {
        return rsx! {};
    }

    if snapshot.has_error() {
        return rsx! {
            div { class: "error-message flex items-center justify-center gap-2 rounded-lg border border-red-300 bg-red-50 p-4 text-red-600",
                Icon { name: "alert".to_string(), class: "w-5 h-5".to_string() }
                "Error loading video details. Please try again later."
            }
        };
    }

    // Controls stay disabled until the engine has reported readiness.
    let engine_bound = matches!(snapshot.play_state, PlayState::Playing | PlayState::Paused);
    let background = if snapshot.thumbnail_url.is_empty() {
        "background-color: #18181b;".to_string()
    } else {
        format!(
            "background-image: url('{}'); background-size: cover; background-position: center;",
            snapshot.thumbnail_url
        )
    };
    let elapsed = format_time(snapshot.current_time);
    let total = format_time(snapshot.duration);

    rsx! {
        div {
            class: "youtube-audio-player p-4 text-white rounded-lg shadow-lg mx-auto",
            style: "{background}",
            div { class: "overlay bg-black/50 p-2 rounded-lg md:p-4",
                if snapshot.is_loading_details() {
                    div { class: "loading-spinner flex items-center gap-2 text-base md:text-2xl mb-2 md:mb-4",
                        Icon { name: "loader".to_string(), class: "w-5 h-5".to_string() }
                        "Loading..."
                    }
                } else {
                    h1 { class: "text-base md:text-2xl mb-2 md:mb-4", "{snapshot.title}" }
                }
                div { class: "controls flex items-center justify-between mt-2 md:mt-4",
                    PlayPauseButton {
                        playing: snapshot.play_state.is_playing(),
                        disabled: !engine_bound,
                    }
                    MuteButton { muted: snapshot.muted, disabled: !engine_bound }
                }
                SeekBar {
                    current_time: snapshot.current_time,
                    duration: snapshot.duration,
                    disabled: !engine_bound,
                }
                div { class: "time-display flex justify-between text-xs md:text-sm mt-1",
                    span { "{elapsed}" }
                    span { "{total}" }
                }
                VolumeSlider { volume: snapshot.volume }
            }
        }
    }
}
