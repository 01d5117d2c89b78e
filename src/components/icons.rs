use dioxus::prelude::*;

#[component]
pub fn Icon(name: String, class: String) -> Element {
    let svg_content = match name.as_str() {
        "search" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                circle { cx: "11", cy: "11", r: "8" }
                path { d: "M21 21l-4.35-4.35" }
            }
        },
        "play" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                polygon { points: "5 3 19 12 5 21 5 3" }
            }
        },
        "pause" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                rect {
                    x: "6",
                    y: "4",
                    width: "4",
                    height: "16",
                }
                rect {
                    x: "14",
                    y: "4",
                    width: "4",
                    height: "16",
                }
            }
        },
        "volume" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                polygon { points: "11 5 6 9 2 9 2 15 6 15 11 19 11 5" }
                path { d: "M15.54 8.46a5 5 0 0 1 0 7.07" }
                path { d: "M19.07 4.93a10 10 0 0 1 0 14.14" }
            }
        },
        "volume-mute" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                polygon { points: "11 5 6 9 2 9 2 15 6 15 11 19 11 5" }
                line {
                    x1: "23",
                    y1: "9",
                    x2: "17",
                    y2: "15",
                }
                line {
                    x1: "17",
                    y1: "9",
                    x2: "23",
                    y2: "15",
                }
            }
        },
        "settings" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                circle { cx: "12", cy: "12", r: "3" }
                path { d: "M19.4 15a1.65 1.65 0 0 0 .33 1.82l.06.06a2 2 0 1 1-2.83 2.83l-.06-.06a1.65 1.65 0 0 0-1.82-.33 1.65 1.65 0 0 0-1 1.51V21a2 2 0 1 1-4 0v-.09A1.65 1.65 0 0 0 9 19.4a1.65 1.65 0 0 0-1.82.33l-.06.06a2 2 0 1 1-2.83-2.83l.06-.06A1.65 1.65 0 0 0 4.68 15a1.65 1.65 0 0 0-1.51-1H3a2 2 0 1 1 0-4h.09A1.65 1.65 0 0 0 4.6 9a1.65 1.65 0 0 0-.33-1.82l-.06-.06a2 2 0 1 1 2.83-2.83l.06.06A1.65 1.65 0 0 0 9 4.68a1.65 1.65 0 0 0 1-1.51V3a2 2 0 1 1 4 0v.09a1.65 1.65 0 0 0 1 1.51 1.65 1.65 0 0 0 1.82-.33l.06-.06a2 2 0 1 1 2.83 2.83l-.06.06A1.65 1.65 0 0 0 19.4 9a1.65 1.65 0 0 0 1.51 1H21a2 2 0 1 1 0 4h-.09a1.65 1.65 0 0 0-1.51 1z" }
            }
        },
        "alert" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                circle { cx: "12", cy: "12", r: "10" }
                line {
                    x1: "12",
                    y1: "8",
                    x2: "12",
                    y2: "12",
                }
                line {
                    x1: "12",
                    y1: "16",
                    x2: "12.01",
                    y2: "16",
                }
            }
        },
        "loader" => rsx! {
            svg {
                class: "{class} animate-spin",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                circle {
                    cx: "12",
                    cy: "12",
                    r: "10",
                    opacity: "0.25",
                }
                path { d: "M12 2a10 10 0 0 1 10 10", opacity: "0.75" }
            }
        },
        _ => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                circle { cx: "12", cy: "12", r: "10" }
            }
        },
    };

    svg_content
}
