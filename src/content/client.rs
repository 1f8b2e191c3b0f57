use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;

use super::api_types::{ApiResponse, ContactResponse, ContactSubmission};
use super::types::{ContentItem, ResourceKey};

/// Something that can produce the documents of a content collection.
///
/// Implementations report failures as errors; retries and timeouts are their
/// own business. The cache layer decides what to serve when a fetch fails.
pub trait ContentSource: Send + Sync + 'static {
  fn fetch_collection<T: ContentItem>(&self) -> impl Future<Output = Result<Vec<T>>> + Send;
}

/// Content API client over HTTP
#[derive(Clone)]
pub struct HttpContentClient {
  http: reqwest::Client,
  base: Url,
}

impl HttpContentClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("API base URL cannot have paths: {}", config.base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// URL of a named API function below the base URL.
  fn endpoint(&self, name: &str) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(name);
    }
    url
  }

  /// URL serving the documents of `key`.
  pub fn collection_url(&self, key: ResourceKey) -> Url {
    let mut url = self.endpoint("get-content");
    url.query_pairs_mut().append_pair("collection", key.as_str());
    url
  }

  /// Fetch the documents of one collection.
  pub async fn get_collection<T: ContentItem>(&self) -> Result<Vec<T>> {
    let key = T::resource();
    let url = self.collection_url(key);
    debug!(resource = %key, %url, "Requesting collection");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Network error fetching {}: {}", key, e))?
      .error_for_status()
      .map_err(|e| eyre!("Error fetching {}: {}", key, e))?;

    let body: ApiResponse<T> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", key, e))?;

    body.into_documents(key)
  }

  /// Send a contact form submission.
  pub async fn submit_contact(&self, submission: &ContactSubmission) -> Result<ContactResponse> {
    submission.validate()?;

    let response = self
      .http
      .post(self.endpoint("submit-contact"))
      .json(submission)
      .send()
      .await
      .map_err(|e| eyre!("Network error submitting contact form: {}", e))?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse contact response: {}", e))
  }
}

impl ContentSource for HttpContentClient {
  fn fetch_collection<T: ContentItem>(&self) -> impl Future<Output = Result<Vec<T>>> + Send {
    self.get_collection::<T>()
  }
}
