//! HTTP transport backed by `reqwest`.

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, Url};
use serde_json::Value;
use tracing::debug;

use super::{display_path, RemoteError, RemoteResult, Transport};

/// Default origin of the clinic backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// JSON-over-HTTP transport to the clinic backend.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport for the given origin.
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let base = Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url(&self, path: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    /// Turn a response into JSON, mapping non-2xx statuses to
    /// [`RemoteError::Status`] with the server's `error`/`message` if present.
    async fn read_json(response: Response) -> RemoteResult<Value> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes).ok().and_then(|body| {
                body.get("error")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn get_json(&self, path: &[&str]) -> RemoteResult<Value> {
        debug!(path = %display_path(path), "GET");
        let response = self.client.get(self.url(path)?).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &[&str], body: Value) -> RemoteResult<Value> {
        debug!(path = %display_path(path), "POST");
        let response = self.client.post(self.url(path)?).json(&body).send().await?;
        Self::read_json(response).await
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<Value> {
        debug!(file_name, size = bytes.len(), "POST /upload");
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url(&["upload"])?)
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_segments() {
        let t = HttpTransport::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            t.url(&["weight", "p 1"]).unwrap().as_str(),
            "http://127.0.0.1:5000/weight/p%201"
        );
    }

    #[test]
    fn test_url_keeps_base_prefix() {
        let t = HttpTransport::new("http://clinic.local/api/").unwrap();
        assert_eq!(
            t.url(&["owner", "add"]).unwrap().as_str(),
            "http://clinic.local/api/owner/add"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpTransport::new("mailto:vet@clinic"),
            Err(RemoteError::InvalidUrl(_))
        ));
    }
}
