//! Where report images go.
//!
//! Images are never processed here. They are either relayed to Cloudinary's
//! signed upload API or written to a local directory that the router serves
//! under `/uploads`.

use std::{path::PathBuf, time::Duration};

use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::ServerConfig;

/// URL prefix under which [`LocalDir`] images are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum ImageError {
  #[error("image host request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("image host rejected upload ({status}): {body}")]
  Rejected {
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("could not write image: {0}")]
  Io(#[from] std::io::Error),
}

/// Which [`ImageHost`] to build, as named in the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
  Cloudinary,
  #[default]
  Local,
  None,
}

/// A file received from the submit form.
#[derive(Debug, Clone)]
pub struct Upload {
  pub bytes:        Bytes,
  pub file_name:    Option<String>,
  pub content_type: Option<String>,
}

pub enum ImageHost {
  Cloudinary(Cloudinary),
  Local(LocalDir),
  /// Images are accepted and dropped.
  Disabled,
}

impl ImageHost {
  pub fn from_config(config: &ServerConfig) -> Result<Self, ImageError> {
    Ok(match config.image_backend {
      ImageBackend::Cloudinary => ImageHost::Cloudinary(Cloudinary::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
        config.cloudinary_folder.clone(),
      )?),
      ImageBackend::Local => ImageHost::Local(LocalDir::new(config.upload_dir.clone())),
      ImageBackend::None => ImageHost::Disabled,
    })
  }

  /// Store `upload` and return the URL it can be fetched from.
  pub async fn store(&self, upload: Upload) -> Result<Option<String>, ImageError> {
    match self {
      ImageHost::Cloudinary(c) => c.upload(upload).await.map(Some),
      ImageHost::Local(l) => l.upload(upload).await.map(Some),
      ImageHost::Disabled => Ok(None),
    }
  }
}

// ─── Cloudinary ──────────────────────────────────────────────────────────────

/// Client for Cloudinary's signed image upload endpoint.
///
/// Clones share one [`reqwest::Client`] connection pool.
#[derive(Clone)]
pub struct Cloudinary {
  client:     reqwest::Client,
  cloud_name: String,
  api_key:    String,
  api_secret: String,
  folder:     String,
}

#[derive(Deserialize)]
struct UploadResponse {
  secure_url: String,
}

impl Cloudinary {
  pub fn new(
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
  ) -> Result<Self, ImageError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self { client, cloud_name, api_key, api_secret, folder })
  }

  fn endpoint(&self) -> String {
    format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cloud_name)
  }

  async fn upload(&self, upload: Upload) -> Result<String, ImageError> {
    let timestamp = Utc::now().timestamp().to_string();

    let mut signed = vec![("timestamp", timestamp.as_str())];
    if !self.folder.is_empty() {
      signed.push(("folder", self.folder.as_str()));
    }
    let signature = sign(&signed, &self.api_secret);

    let file_name = upload.file_name.unwrap_or_else(|| "image".to_owned());
    let mut part = Part::bytes(upload.bytes.to_vec()).file_name(file_name);
    if let Some(mime) = upload.content_type.as_deref() {
      part = part.mime_str(mime)?;
    }

    let mut form = Form::new()
      .part("file", part)
      .text("api_key", self.api_key.clone())
      .text("timestamp", timestamp.clone())
      .text("signature", signature);
    if !self.folder.is_empty() {
      form = form.text("folder", self.folder.clone());
    }

    let resp = self.client.post(self.endpoint()).multipart(form).send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(ImageError::Rejected { status, body });
    }

    let body: UploadResponse = resp.json().await?;
    debug!(url = %body.secure_url, "uploaded image to cloudinary");
    Ok(body.secure_url)
  }
}

/// Cloudinary request signature: the SHA-1 hex digest of the `key=value`
/// pairs sorted by key and joined with `&`, immediately followed by the API
/// secret.
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
  let mut sorted = params.to_vec();
  sorted.sort_by(|a, b| a.0.cmp(b.0));

  let joined = sorted
    .iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&");

  let mut hasher = Sha1::new();
  hasher.update(joined.as_bytes());
  hasher.update(secret.as_bytes());
  hex::encode(hasher.finalize())
}

// ─── Local directory ─────────────────────────────────────────────────────────

/// Content-addressed image files in a local directory.
///
/// Files are named by the SHA-256 of their bytes, so uploading the same image
/// twice yields one file.
pub struct LocalDir {
  dir: PathBuf,
}

impl LocalDir {
  pub fn new(dir: PathBuf) -> Self { Self { dir } }

  pub fn dir(&self) -> &PathBuf { &self.dir }

  async fn upload(&self, upload: Upload) -> Result<String, ImageError> {
    let digest = hex::encode(Sha256::digest(&upload.bytes));
    let name = match extension(upload.file_name.as_deref(), upload.content_type.as_deref()) {
      Some(ext) => format!("{digest}.{ext}"),
      None => digest,
    };

    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(self.dir.join(&name), &upload.bytes).await?;

    debug!(%name, "stored image locally");
    Ok(format!("{UPLOADS_PREFIX}/{name}"))
  }
}

/// File extension for a stored image: the uploaded name's extension if it is
/// short and alphanumeric, otherwise one derived from the MIME type.
fn extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
  let from_name = file_name
    .and_then(|n| n.rsplit_once('.'))
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .filter(|ext| {
      !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
    });

  from_name.or_else(|| {
    let ext = match content_type? {
      "image/jpeg" => "jpg",
      "image/png" => "png",
      "image/gif" => "gif",
      "image/webp" => "webp",
      "image/heic" => "heic",
      _ => return None,
    };
    Some(ext.to_owned())
  })
}
