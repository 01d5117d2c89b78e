use crate::api::MediaSummary;
use dioxus::prelude::*;

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

#[component]
pub fn VideoList(
    heading: String,
    videos: Vec<MediaSummary>,
    selected: Option<String>,
    on_select: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "bg-gray-100 p-4 rounded-lg shadow-md border",
            h2 { class: "text-lg md:text-2xl font-semibold mb-4", "{heading}" }
            if videos.is_empty() {
                p { class: "text-gray-500 text-sm", "No videos found." }
            }
            ul { class: "space-y-4",
                for (index, video) in videos.into_iter().enumerate() {
                    VideoRow {
                        key: "{index}-{video.id}",
                        is_selected: selected.as_deref() == Some(video.id.as_str()),
                        video: video.clone(),
                        on_select,
                    }
                }
            }
        }
    }
}

#[component]
fn VideoRow(video: MediaSummary, is_selected: bool, on_select: EventHandler<String>) -> Element {
    let row_class = if is_selected {
        "flex items-center p-2 rounded-lg shadow-sm cursor-pointer transition bg-gray-200 hover:bg-white"
    } else {
        "flex items-center p-2 rounded-lg shadow-sm cursor-pointer transition bg-white hover:bg-gray-200"
    };
    let description = video.short_description(DESCRIPTION_PREVIEW_CHARS);
    let id = video.id.clone();

    rsx! {
        li { class: "{row_class}", onclick: move |_| on_select.call(id.clone()),
            img {
                src: "{video.thumbnail_url}",
                alt: "{video.title}",
                class: "size-12 md:size-36 object-cover rounded md:rounded-lg",
            }
            div { class: "ml-4",
                div { class: "w-full",
                    h3 { class: "text-xs text-start md:text-lg text-wrap font-semibold",
                        "{video.title}"
                    }
                    p { class: "text-gray-600 text-wrap text-start text-xs hidden md:block md:text-sm",
                        "{description}"
                    }
                }
            }
        }
    }
}
