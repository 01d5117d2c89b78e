use crate::api::models::*;
use crate::db::CatalogSettings;
use crate::diagnostics::PerfTimer;
use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, warn};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

pub struct YouTubeClient {
    pub settings: CatalogSettings,
}

impl YouTubeClient {
    pub fn new(settings: CatalogSettings) -> Self {
        Self { settings }
    }

    pub(crate) fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{BASE_URL}/{endpoint}?key={}",
            urlencoding::encode(&self.settings.api_key)
        );
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    pub(crate) fn listing_url(&self, query: Option<&str>) -> String {
        let max_results = self.settings.max_results.clamp(1, 50).to_string();
        let category = self.settings.category_id.as_str();
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => self.build_url(
                "search",
                &[
                    ("part", "snippet"),
                    ("maxResults", &max_results),
                    ("q", query),
                    ("type", "video"),
                    ("videoCategoryId", category),
                ],
            ),
            None => self.build_url(
                "videos",
                &[
                    ("part", "snippet"),
                    ("chart", "mostPopular"),
                    ("videoCategoryId", category),
                    ("regionCode", &self.settings.region_code),
                    ("maxResults", &max_results),
                ],
            ),
        }
    }

    async fn get_list(&self, url: &str) -> std::result::Result<VideoListResponse, String> {
        if self.settings.api_key.trim().is_empty() {
            return Err("no API key configured".to_string());
        }

        let response = HTTP_CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_default();
            return Err(if message.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {message}")
            });
        }
        response
            .json::<VideoListResponse>()
            .await
            .map_err(|e| e.to_string())
    }

    /// Search the music category, or list the regional most-popular chart when `query` is
    /// empty. Results keep the order the API returned them in.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<MediaSummary>> {
        let timer = PerfTimer::start();
        let url = self.listing_url(query);
        let response = self.get_list(&url).await.map_err(|message| {
            warn!(%message, "catalog request failed");
            AppError::CatalogFetch(message)
        })?;

        let results: Vec<MediaSummary> = response
            .items
            .into_iter()
            .filter_map(VideoItem::into_summary)
            .collect();
        timer.log(
            "catalog.search",
            &format!("query={:?} results={}", query.unwrap_or_default(), results.len()),
        );
        Ok(results)
    }

    pub async fn video_details(&self, media_id: &str) -> Result<MediaDetails> {
        let url = self.build_url("videos", &[("id", media_id), ("part", "snippet")]);
        let response = self
            .get_list(&url)
            .await
            .map_err(AppError::MetadataFetch)?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::MetadataFetch(format!("no video with id {media_id}")))?;
        debug!(media_id, "video details loaded");
        Ok(item.into_details())
    }
}
