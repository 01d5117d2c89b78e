use dioxus::prelude::*;

mod api;
mod components;
mod db;
mod diagnostics;
mod error;
mod playback;

use components::AppShell;

const APP_CSS: Asset = asset!("/assets/styling/app.css");
const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

fn main() {
    dioxus::logger::initialize_default();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Meta { name: "theme-color", content: "#dc2626" }
        document::Title { "TubeMusic" }
        document::Script { src: TAILWIND_CDN }
        document::Stylesheet { href: APP_CSS }

        ErrorBoundary {
            handle_error: |_errors: ErrorContext| rsx! {
                div { class: "text-center text-red-500 p-8", "Something went wrong. Please try again later." }
            },
            AppShell {}
        }
    }
}
