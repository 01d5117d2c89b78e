use crate::api::{MediaSummary, YouTubeClient};
use crate::components::{
    use_player_controller, AudioPlayer, Icon, SearchBar, SettingsPanel, VideoList,
};
use crate::db::{load_settings, CatalogSettings};
use dioxus::prelude::*;
use tracing::{debug, info, warn};

const TRENDING_HEADING: &str = "Trending Music";

/// Catalog listing state behind the shell. Kept out of signals so the search rules stay testable.
#[derive(Debug, Clone, PartialEq)]
struct Listing {
    videos: Vec<MediaSummary>,
    selected: Option<String>,
    loading: bool,
    error: Option<String>,
    heading: String,
    last_query: Option<String>,
    generation: u64,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            heading: TRENDING_HEADING.to_string(),
            last_query: None,
            generation: 0,
        }
    }
}

impl Listing {
    /// Resets the listing for a new query and returns its generation.
    fn begin(&mut self, query: Option<String>) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.videos.clear();
        self.selected = None;
        self.heading = listing_heading(query.as_deref());
        self.last_query = query;
        self.generation
    }

    /// Applies a finished search unless a newer one has started since.
    fn finish(
        &mut self,
        generation: u64,
        result: crate::error::Result<Vec<MediaSummary>>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        match result {
            Ok(found) => {
                info!(count = found.len(), "catalog listing loaded");
                self.videos = found;
            }
            Err(err) => {
                warn!(%err, "catalog listing failed");
                self.videos.clear();
                self.error = Some(err.user_message().to_string());
            }
        }
        self.loading = false;
        true
    }

    /// Marks `media_id` selected. Reselecting the current item only goes through when its
    /// session has failed, so the user can retry it.
    fn select(&mut self, media_id: &str, session_failed: bool) -> bool {
        if self.selected.as_deref() == Some(media_id) && !session_failed {
            return false;
        }
        self.selected = Some(media_id.to_string());
        true
    }
}

fn listing_heading(query: Option<&str>) -> String {
    match query {
        Some(query) => format!("Results for \"{query}\""),
        None => TRENDING_HEADING.to_string(),
    }
}

#[cfg(target_arch = "wasm32")]
fn scroll_to_top() {
    let Some(win) = web_sys::window() else {
        return;
    };
    let options = web_sys::ScrollToOptions::new();
    options.set_top(0.0);
    options.set_behavior(web_sys::ScrollBehavior::Smooth);
    win.scroll_to_with_scroll_to_options(&options);
}

#[cfg(not(target_arch = "wasm32"))]
fn scroll_to_top() {}

#[component]
pub fn AppShell() -> Element {
    let mut settings = use_signal(CatalogSettings::default);
    let mut listing = use_signal(Listing::default);

    use_context_provider(|| settings);
    let player = use_player_controller(settings);
    use_context_provider(|| player.clone());

    let search = {
        let player = player.clone();
        use_callback(move |query: Option<String>| {
            let generation = listing.write().begin(query.clone());
            player.teardown();

            let client = YouTubeClient::new(settings.peek().clone());
            spawn(async move {
                let result = client.search(query.as_deref()).await;
                if !listing.write().finish(generation, result) {
                    debug!(generation, "dropping superseded catalog listing");
                }
            });
        })
    };

    // Load saved settings, then show the trending chart.
    use_effect(move || {
        spawn(async move {
            match load_settings().await {
                Ok(saved) => settings.set(saved),
                Err(err) => warn!(%err, "falling back to default catalog settings"),
            }
            search.call(None);
        });
    });

    let on_search = move |query: String| {
        search.call((!query.is_empty()).then_some(query));
    };

    let on_settings_saved = move |_: ()| {
        let query = listing.peek().last_query.clone();
        search.call(query);
    };

    let on_select = {
        let player = player.clone();
        move |media_id: String| {
            let session_failed = player.snapshot.peek().has_error();
            if !listing.write().select(&media_id, session_failed) {
                return;
            }
            player.start(media_id);
            scroll_to_top();
        }
    };

    let view = listing();

    rsx! {
        div { class: "min-h-screen bg-white text-gray-900",
            div { class: "max-w-4xl mx-auto p-4",
                h1 { class: "text-3xl md:text-5xl font-bold text-center my-4",
                    span { class: "text-red-600", "Tube" }
                    "Music"
                }
                SettingsPanel { on_saved: on_settings_saved }
                SearchBar { on_search }
                if view.loading {
                    div { class: "flex justify-center my-4 text-gray-500",
                        Icon {
                            name: "loader".to_string(),
                            class: "w-8 h-8 animate-spin".to_string(),
                        }
                    }
                }
                if let Some(message) = view.error.clone() {
                    div { class: "flex items-center justify-center gap-2 my-4 text-red-500",
                        Icon { name: "alert".to_string(), class: "w-5 h-5".to_string() }
                        "{message}"
                    }
                }
                if view.selected.is_some() {
                    div { class: "mb-4", AudioPlayer {} }
                }
                if view.error.is_none() {
                    VideoList {
                        heading: view.heading.clone(),
                        videos: view.videos.clone(),
                        selected: view.selected.clone(),
                        on_select,
                    }
                }
            }
        }
    }
}
