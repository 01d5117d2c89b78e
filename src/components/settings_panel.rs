use crate::components::Icon;
use crate::db::{save_settings, CatalogSettings};
use dioxus::prelude::*;
use tracing::warn;

/// Collapsible editor for the catalog API key and region.
#[component]
pub fn SettingsPanel(on_saved: EventHandler<()>) -> Element {
    let mut settings = use_context::<Signal<CatalogSettings>>();
    let mut open = use_signal(|| false);
    let mut api_key = use_signal(String::new);
    let mut region_code = use_signal(String::new);
    let mut save_error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);

    let needs_key = settings().api_key.is_empty();

    let on_toggle = move |_| {
        if !open() {
            let current = settings.peek().clone();
            api_key.set(current.api_key);
            region_code.set(current.region_code);
            save_error.set(None);
        }
        open.set(!open());
    };

    let on_save = move |evt: FormEvent| {
        evt.prevent_default();
        if saving() {
            return;
        }
        let updated = CatalogSettings {
            api_key: api_key(),
            region_code: region_code(),
            ..settings.peek().clone()
        }
        .normalized();

        spawn(async move {
            saving.set(true);
            match save_settings(updated.clone()).await {
                Ok(()) => {
                    settings.set(updated);
                    open.set(false);
                    on_saved.call(());
                }
                Err(err) => {
                    warn!(%err, "saving catalog settings failed");
                    save_error.set(Some(err.user_message().to_string()));
                }
            }
            saving.set(false);
        });
    };

    rsx! {
        div { class: "flex flex-col items-center mb-4",
            button {
                r#type: "button",
                class: if needs_key { "flex items-center gap-1 text-sm text-red-500 hover:text-red-600" } else { "flex items-center gap-1 text-sm text-gray-500 hover:text-gray-700" },
                onclick: on_toggle,
                Icon { name: "settings".to_string(), class: "w-4 h-4".to_string() }
                if needs_key {
                    "Set a YouTube API key"
                } else {
                    "Settings"
                }
            }
            if open() {
                form {
                    class: "mt-2 flex flex-wrap items-end justify-center gap-2 rounded-lg border bg-white p-3 shadow-sm",
                    onsubmit: on_save,
                    label { class: "flex flex-col text-xs text-gray-600",
                        "API key"
                        input {
                            r#type: "password",
                            class: "p-2 w-64 border border-gray-300 rounded-md",
                            value: "{api_key}",
                            oninput: move |e| api_key.set(e.value()),
                        }
                    }
                    label { class: "flex flex-col text-xs text-gray-600",
                        "Region"
                        input {
                            r#type: "text",
                            class: "p-2 w-16 border border-gray-300 rounded-md uppercase",
                            maxlength: "2",
                            value: "{region_code}",
                            oninput: move |e| region_code.set(e.value()),
                        }
                    }
                    button {
                        r#type: "submit",
                        disabled: saving(),
                        class: "p-2 bg-blue-500 text-white rounded-md hover:bg-blue-600 disabled:opacity-50",
                        "Save"
                    }
                    if let Some(message) = save_error() {
                        p { class: "w-full text-center text-xs text-red-500", "{message}" }
                    }
                }
            }
        }
    }
}
