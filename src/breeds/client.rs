use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::ApiBreed;
use super::types::Breed;
use crate::config::{ApiConfig, Config};

/// A paged source of catalog data.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Fetch one page of breeds. Pages are zero-based.
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Breed>>;
}

/// TheCatAPI client
#[derive(Clone)]
pub struct CatApiClient {
  client: reqwest::Client,
  base_url: Url,
}

impl CatApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    let mut headers = HeaderMap::new();
    if let Some(key) = Config::get_api_key() {
      let mut value =
        HeaderValue::from_str(&key).map_err(|e| eyre!("Invalid API key header: {}", e))?;
      value.set_sensitive(true);
      headers.insert("x-api-key", value);
    }

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }
}

/// `{base}breeds?limit={page_size}&page={page}`
fn breeds_url(base: &Url, page: u32, page_size: u32) -> Result<Url> {
  let mut url = base
    .join("breeds")
    .map_err(|e| eyre!("Failed to build breeds URL: {}", e))?;

  url
    .query_pairs_mut()
    .append_pair("limit", &page_size.to_string())
    .append_pair("page", &page.to_string());

  Ok(url)
}

#[async_trait]
impl RemoteSource for CatApiClient {
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Breed>> {
    let url = breeds_url(&self.base_url, page, page_size)?;
    debug!(%url, "fetching breeds page");

    let breeds: Vec<ApiBreed> = self
      .client
      .get(url)
      .send()
      .await
      .and_then(|response| response.error_for_status())
      .map_err(|e| eyre!("Failed to get breeds page {}: {}", page, e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse breeds page {}: {}", page, e))?;

    Ok(breeds.into_iter().map(ApiBreed::into_breed).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_breeds_url_carries_paging() {
    let base = Url::parse(&ApiConfig::default().base_url).unwrap();

    let url = breeds_url(&base, 2, 10).unwrap();

    assert_eq!(
      url.as_str(),
      "https://api.thecatapi.com/v1/breeds?limit=10&page=2"
    );
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    let config = ApiConfig {
      base_url: "not a url".to_string(),
      ..ApiConfig::default()
    };

    assert!(CatApiClient::new(&config).is_err());
  }
}
