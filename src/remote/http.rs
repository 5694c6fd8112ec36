//! HTTP implementation of the remote source.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{RemoteError, RemoteSource};
use crate::cache::{Entity, Lookup};

/// Catalog REST client.
///
/// - lists: `GET {base}/{endpoint}?page=N&pageSize=M`
/// - by id: `GET {base}/{endpoint}/{id}`
/// - by slug: `GET {base}/{endpoint}?slug=S`, first element of the array
#[derive(Clone)]
pub struct HttpRemote {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl HttpRemote {
  pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> Result<Self, RemoteError> {
    let base = Url::parse(base_url)
      .map_err(|e| RemoteError::Setup(format!("invalid base url {}: {}", base_url, e)))?;
    if base.cannot_be_a_base() {
      return Err(RemoteError::Setup(format!("{} cannot be a base url", base_url)));
    }

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| RemoteError::Setup(format!("failed to build http client: {}", e)))?;

    Ok(Self {
      client,
      base,
      token,
    })
  }

  fn endpoint_url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // `new` rejects cannot-be-a-base urls, so path segments are always available
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn get_json<V: DeserializeOwned>(&self, url: Url) -> Result<V, RemoteError> {
    debug!(url = %url, "GET");

    let mut request = self.client.get(url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| RemoteError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(RemoteError::Server {
        status: status.as_u16(),
      });
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| RemoteError::Network(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
  }
}

impl RemoteSource for HttpRemote {
  async fn list<T: Entity>(&self, page: u32, page_size: u32) -> Result<Vec<T>, RemoteError> {
    let mut url = self.endpoint_url(&[T::ENDPOINT]);
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string())
      .append_pair("pageSize", &page_size.to_string());

    self.get_json(url).await
  }

  async fn get<T: Entity>(&self, lookup: &Lookup) -> Result<T, RemoteError> {
    let result = match lookup {
      Lookup::Id(id) => self.get_json::<T>(self.endpoint_url(&[T::ENDPOINT, id.as_str()])).await,
      Lookup::Slug(slug) => {
        let mut url = self.endpoint_url(&[T::ENDPOINT]);
        url.query_pairs_mut().append_pair("slug", slug);
        self
          .get_json::<Vec<T>>(url)
          .await
          .and_then(|matches| {
            matches
              .into_iter()
              .find(|entity| lookup.matches(entity))
              .ok_or_else(|| RemoteError::not_found::<T>(lookup))
          })
      }
    };

    match result {
      Err(RemoteError::Server { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
        Err(RemoteError::not_found::<T>(lookup))
      }
      other => other,
    }
  }
}
