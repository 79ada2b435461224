use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

const API_BASE: &str = "https://api.unsplash.com";

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: String,
    pub url_regular: String,
    pub url_small: String,
    pub alt_description: Option<String>,
    pub author_name: String,
    pub author_username: String,
}

/// Image-search client with a small in-memory cache so repeated editor
/// queries do not burn the upstream rate limit.
pub struct UnsplashClient {
    http: reqwest::Client,
    access_key: String,
    base_url: String,
    cache: DashMap<String, Vec<Photo>>,
}

impl UnsplashClient {
    pub fn new(access_key: &str) -> Self {
        Self::with_base_url(access_key, API_BASE)
    }

    pub fn with_base_url(access_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("Failed to build Unsplash client"),
            access_key: access_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: DashMap::new(),
        }
    }

    pub async fn random_photo(&self, query: &str) -> Result<Photo, String> {
        let url = format!(
            "{}/photos/random?query={}&orientation=landscape",
            self.base_url,
            urlencode(query)
        );
        let payload = self.call(&url).await?;
        parse_photo(&payload).ok_or_else(|| "Image API returned no photo".to_string())
    }

    pub async fn search_photos(&self, query: &str, per_page: u32) -> Result<Vec<Photo>, String> {
        let cache_key = format!("{query}:{per_page}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached.clone());
        }

        let url = format!(
            "{}/search/photos?query={}&per_page={}",
            self.base_url,
            urlencode(query),
            per_page
        );
        let payload = self.call(&url).await?;

        let photos: Vec<Photo> = payload["results"]
            .as_array()
            .map(|items| items.iter().filter_map(parse_photo).collect())
            .unwrap_or_default();

        self.cache.insert(cache_key, photos.clone());
        Ok(photos)
    }

    /// Maintenance sweep hook; search results go stale quickly enough that
    /// dropping the whole map is fine.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn call(&self, url: &str) -> Result<serde_json::Value, String> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await
            .map_err(|e| format!("Image API request failed: {e}"))?;

        match response.status().as_u16() {
            200 => response
                .json()
                .await
                .map_err(|e| format!("Invalid image API response: {e}")),
            401 | 403 => Err("Image API rejected the access key".to_string()),
            429 => Err("Image API rate limit exceeded".to_string()),
            status => Err(format!("Image API failed with status {status}")),
        }
    }
}

fn parse_photo(value: &serde_json::Value) -> Option<Photo> {
    Some(Photo {
        id: value["id"].as_str()?.to_string(),
        url_regular: value["urls"]["regular"].as_str()?.to_string(),
        url_small: value["urls"]["small"].as_str().unwrap_or_default().to_string(),
        alt_description: value["alt_description"].as_str().map(|s| s.to_string()),
        author_name: value["user"]["name"].as_str().unwrap_or_default().to_string(),
        author_username: value["user"]["username"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    })
}

fn urlencode(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes()).collect()
}
