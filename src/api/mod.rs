pub mod models;
pub mod youtube;

pub use models::*;
pub use youtube::YouTubeClient;
