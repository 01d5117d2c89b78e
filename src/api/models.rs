use serde::{Deserialize, Serialize};

/// One entry of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MediaSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl MediaSummary {
    /// Description cut to `max_chars` characters for list rendering.
    pub fn short_description(&self, max_chars: usize) -> String {
        self.description.chars().take(max_chars).collect()
    }
}

/// Display data for the selected item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MediaDetails {
    pub title: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: VideoId,
    #[serde(default)]
    pub snippet: Snippet,
}

/// `search` returns `{ "kind": ..., "videoId": "..." }`, `videos` returns a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VideoId {
    Plain(String),
    Resource {
        #[serde(default, rename = "videoId")]
        video_id: Option<String>,
    },
}

impl VideoId {
    pub fn into_id(self) -> Option<String> {
        match self {
            Self::Plain(id) => Some(id),
            Self::Resource { video_id } => video_id,
        }
        .filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    fn pick(options: [&Option<Thumbnail>; 3]) -> String {
        options
            .into_iter()
            .flatten()
            .map(|thumb| thumb.url.clone())
            .next()
            .unwrap_or_default()
    }

    /// List rows use the medium rendition.
    pub fn list_url(&self) -> String {
        Self::pick([&self.medium, &self.high, &self.default])
    }

    /// Player background uses the high rendition.
    pub fn hero_url(&self) -> String {
        Self::pick([&self.high, &self.medium, &self.default])
    }
}

impl VideoItem {
    pub fn into_summary(self) -> Option<MediaSummary> {
        let thumbnail_url = self.snippet.thumbnails.list_url();
        Some(MediaSummary {
            id: self.id.into_id()?,
            title: self.snippet.title,
            description: self.snippet.description,
            thumbnail_url,
        })
    }

    pub fn into_details(self) -> MediaDetails {
        MediaDetails {
            thumbnail_url: self.snippet.thumbnails.hero_url(),
            title: self.snippet.title,
        }
    }
}

/// `m:ss` with the seconds zero-padded. Negative or non-finite input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
