//! Object storage client for uploaded images.
//!
//! Images are written with an authenticated `PUT` to the bucket endpoint and
//! served back from a separate public base URL.

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Errors that can occur when storing an object.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage backend configured.
    #[error("image uploads are not configured")]
    NotConfigured,

    /// Content type is not an accepted image format.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// Upload exceeds the configured limit.
    #[error("image exceeds {max} bytes")]
    TooLarge { max: usize },

    /// Upload body was empty.
    #[error("image is empty")]
    Empty,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store returned an error response.
    #[error("storage error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Configured URL cannot hold an object key.
    #[error("invalid storage URL: {0}")]
    InvalidUrl(String),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Match a `Content-Type` value, ignoring parameters.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

/// Append an object key to a base URL.
fn object_url(base: &Url, key: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| StorageError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push(key);
    Ok(url)
}

/// Object storage client.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    config: StorageConfig,
}

impl StorageClient {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| StorageError::InvalidUrl(format!("invalid API token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Largest accepted upload in bytes.
    #[must_use]
    pub const fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Check an upload before sending it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedType`, `Empty` or `TooLarge`.
    pub fn validate(&self, content_type: &str, len: usize) -> Result<ImageKind, StorageError> {
        let kind = ImageKind::from_content_type(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;
        if len == 0 {
            return Err(StorageError::Empty);
        }
        if len > self.config.max_upload_bytes {
            return Err(StorageError::TooLarge {
                max: self.config.max_upload_bytes,
            });
        }
        Ok(kind)
    }

    /// Upload an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Self::validate`], or `Http`/`Api` if
    /// the store rejects the upload.
    #[tracing::instrument(skip(self, body), fields(size = body.len()))]
    pub async fn upload_image(&self, content_type: &str, body: Bytes) -> Result<Url, StorageError> {
        let kind = self.validate(content_type, body.len())?;
        let key = format!("{}.{}", Uuid::new_v4(), kind.extension());

        let response = self
            .client
            .put(object_url(&self.config.upload_url, &key)?)
            .header(CONTENT_TYPE, kind.mime())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Object storage rejected upload");
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let url = object_url(&self.config.public_url, &key)?;
        tracing::info!(%url, "Image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(max: usize) -> StorageClient {
        StorageClient::new(StorageConfig {
            upload_url: Url::parse("https://bucket.example.net/uploads").unwrap(),
            public_url: Url::parse("https://cdn.example.net/uploads/").unwrap(),
            api_token: SecretString::from("k8Jq2Lx9Vw4Rt7Zp"),
            max_upload_bytes: max,
        })
        .unwrap()
    }

    #[test]
    fn test_image_kind_from_content_type() {
        assert_eq!(ImageKind::from_content_type("image/png"), Some(ImageKind::Png));
        assert_eq!(
            ImageKind::from_content_type("IMAGE/JPEG; charset=binary"),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(ImageKind::from_content_type("image/svg+xml"), None);
        assert_eq!(ImageKind::from_content_type("text/plain"), None);
    }

    #[test]
    fn test_object_url_handles_trailing_slash() {
        let with = Url::parse("https://cdn.example.net/uploads/").unwrap();
        let without = Url::parse("https://cdn.example.net/uploads").unwrap();
        assert_eq!(
            object_url(&with, "a.png").unwrap().as_str(),
            "https://cdn.example.net/uploads/a.png"
        );
        assert_eq!(
            object_url(&without, "a.png").unwrap().as_str(),
            "https://cdn.example.net/uploads/a.png"
        );
    }

    #[test]
    fn test_validate_upload() {
        let storage = client(10);
        assert_eq!(storage.validate("image/webp", 10).unwrap(), ImageKind::Webp);
        assert!(matches!(
            storage.validate("image/webp", 11),
            Err(StorageError::TooLarge { max: 10 })
        ));
        assert!(matches!(
            storage.validate("image/gif", 0),
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            storage.validate("application/pdf", 5),
            Err(StorageError::UnsupportedType(_))
        ));
    }
}
