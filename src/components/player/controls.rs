use crate::components::{Icon, PlayerHandle, PlayerIntent};
use dioxus::prelude::*;

#[component]
pub(super) fn PlayPauseButton(playing: bool, disabled: bool) -> Element {
    let player = use_context::<PlayerHandle>();

    rsx! {
        button {
            id: "play-pause-btn",
            r#type: "button",
            class: "text-lg md:text-2xl disabled:opacity-40",
            disabled,
            aria_label: if playing { "Pause" } else { "Play" },
            onclick: move |_| player.send(PlayerIntent::TogglePlayPause),
            Icon {
                name: if playing { "pause".to_string() } else { "play".to_string() },
                class: "w-6 h-6".to_string(),
            }
        }
    }
}

#[component]
pub(super) fn MuteButton(muted: bool, disabled: bool) -> Element {
    let player = use_context::<PlayerHandle>();

    rsx! {
        button {
            id: "mute-btn",
            r#type: "button",
            class: "text-lg md:text-2xl disabled:opacity-40",
            disabled,
            aria_label: if muted { "Unmute" } else { "Mute" },
            onclick: move |_| player.send(PlayerIntent::ToggleMute),
            Icon {
                name: if muted { "volume-mute".to_string() } else { "volume".to_string() },
                class: "w-6 h-6".to_string(),
            }
        }
    }
}

/// Absolute seek slider, one-second steps over `0..=duration`.
#[component]
pub(super) fn SeekBar(current_time: f64, duration: f64, disabled: bool) -> Element {
    let player = use_context::<PlayerHandle>();
    let max = duration.max(0.0).floor();
    let value = current_time.clamp(0.0, max).floor();

    rsx! {
        div { class: "seek-bar mt-2 md:mt-4",
            input {
                r#type: "range",
                class: "w-full",
                min: "0",
                max: "{max}",
                step: "1",
                value: "{value}",
                disabled,
                oninput: move |e: Event<FormData>| {
                    if let Ok(seconds) = e.value().parse::<f64>() {
                        player.send(PlayerIntent::Seek(seconds.clamp(0.0, max)));
                    }
                },
            }
        }
    }
}

#[component]
pub(super) fn VolumeSlider(volume: u8) -> Element {
    let player = use_context::<PlayerHandle>();

    rsx! {
        div { class: "volume-control flex items-center gap-2 mt-2 md:mt-4",
            Icon { name: "volume".to_string(), class: "w-4 h-4".to_string() }
            input {
                r#type: "range",
                class: "w-full",
                min: "0",
                max: "100",
                step: "1",
                value: "{volume}",
                oninput: move |e: Event<FormData>| {
                    if let Ok(level) = e.value().parse::<u32>() {
                        player.send(PlayerIntent::SetVolume(level.min(100) as u8));
                    }
                },
            }
        }
    }
}
