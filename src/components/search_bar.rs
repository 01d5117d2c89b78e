use crate::components::Icon;
use dioxus::prelude::*;

/// Submits the raw query; an empty submit asks for the trending chart.
#[component]
pub fn SearchBar(on_search: EventHandler<String>) -> Element {
    let mut query = use_signal(String::new);

    rsx! {
        form {
            class: "flex justify-center mb-4",
            onsubmit: move |evt: FormEvent| {
                evt.prevent_default();
                on_search.call(query().trim().to_string());
            },
            div { class: "relative",
                Icon {
                    name: "search".to_string(),
                    class: "absolute left-2 top-1/2 -translate-y-1/2 w-4 h-4 text-gray-400".to_string(),
                }
                input {
                    r#type: "text",
                    class: "p-2 pl-8 w-64 border border-gray-300 rounded-l-md focus:outline-none focus:ring focus:border-blue-300",
                    placeholder: "Search for music...",
                    value: "{query}",
                    oninput: move |e| query.set(e.value()),
                }
            }
            button {
                r#type: "submit",
                class: "p-2 bg-blue-500 text-white rounded-r-md hover:bg-blue-600",
                "Search"
            }
        }
    }
}
