//! Object storage for event images.
//!
//! [`HttpObjectStorage`] issues path-style `PUT /{bucket}/{object}` requests
//! signed with AWS Signature Version 4, as S3 and MinIO expect.
//! [`InMemoryObjectStorage`] backs tests and local development.

mod sigv4;

pub use sigv4::Credentials;

use async_trait::async_trait;
use chrono::Utc;
use core_config::{ConfigError, FromEnv, env_optional, env_parse, env_required};
use reqwest::Url;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Request signing failed: {0}")]
    Signing(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object storage client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the file at `file` as `bucket/object_name`
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        file: &Path,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Publicly reachable URL of an uploaded object
    fn public_url(&self, bucket: &str, object_name: &str) -> String;
}

/// Storage and upload settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: String,
    pub public_url: Option<String>,
    pub region: String,
    /// Unsigned requests when absent
    pub credentials: Option<Credentials>,
    pub timeout_secs: u64,
    pub upload_dir: PathBuf,
    pub max_page_size: u64,
}

impl FromEnv for StorageConfig {
    /// - STORAGE_BUCKET, STORAGE_ENDPOINT: required
    /// - STORAGE_PUBLIC_URL: base for public links, defaults to the endpoint
    /// - STORAGE_REGION: signing region, defaults to us-east-1
    /// - STORAGE_ACCESS_KEY_ID, STORAGE_SECRET_ACCESS_KEY: set both or neither
    /// - STORAGE_TIMEOUT_SECS: defaults to 30
    /// - UPLOAD_TMP_DIR: defaults to the OS temp dir
    /// - MAX_PAGE_SIZE: defaults to 100
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bucket: env_required("STORAGE_BUCKET")?,
            endpoint: env_required("STORAGE_ENDPOINT")?,
            public_url: env_optional("STORAGE_PUBLIC_URL"),
            region: env_parse("STORAGE_REGION", "us-east-1")?,
            credentials: credentials_from_env()?,
            timeout_secs: env_parse("STORAGE_TIMEOUT_SECS", "30")?,
            upload_dir: env_optional("UPLOAD_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_page_size: env_parse("MAX_PAGE_SIZE", "100")?,
        })
    }
}

fn credentials_from_env() -> Result<Option<Credentials>, ConfigError> {
    match (
        env_optional("STORAGE_ACCESS_KEY_ID"),
        env_optional("STORAGE_SECRET_ACCESS_KEY"),
    ) {
        (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credentials {
            access_key_id,
            secret_access_key,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::MissingEnvVar(
            "STORAGE_SECRET_ACCESS_KEY".to_string(),
        )),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar(
            "STORAGE_ACCESS_KEY_ID".to_string(),
        )),
    }
}

/// S3-compatible storage over HTTP PUT
#[derive(Clone, Debug)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: Url,
    public_base: Url,
    signer: Option<sigv4::Signer>,
}

fn parse_base(url: &str) -> StorageResult<Url> {
    let parsed =
        Url::parse(url).map_err(|e| StorageError::InvalidEndpoint(format!("{}: {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(StorageError::InvalidEndpoint(url.to_string()));
    }
    Ok(parsed)
}

/// `{base}/{bucket}/{object}`; the resulting path is also the canonical URI that gets signed
fn object_url(base: &Url, bucket: &str, object_name: &str) -> Url {
    let mut url = base.clone();
    let path = format!(
        "{}/{}/{}",
        base.path().trim_end_matches('/'),
        sigv4::uri_encode(bucket),
        sigv4::uri_encode(object_name)
    );
    url.set_path(&path);
    url
}

/// `Host` header value as reqwest sends it
fn host_header(url: &Url) -> StorageResult<String> {
    let host = url
        .host_str()
        .ok_or_else(|| StorageError::InvalidEndpoint(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

impl HttpObjectStorage {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let endpoint = parse_base(&config.endpoint)?;
        let public_base = match config.public_url.as_deref() {
            Some(url) => parse_base(url)?,
            None => endpoint.clone(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            public_base,
            signer: config
                .credentials
                .clone()
                .map(|credentials| sigv4::Signer::new(credentials, config.region.clone())),
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        file: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        let body = tokio::fs::read(file).await?;
        let url = object_url(&self.endpoint, bucket, object_name);

        let mut request = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type);

        if let Some(signer) = &self.signer {
            let payload_hash = sigv4::hex_sha256(&body);
            let now = Utc::now();
            let amz_date = sigv4::amz_date(now);
            let authorization = signer.authorization(
                &sigv4::SignableRequest {
                    method: "PUT",
                    path: url.path(),
                    headers: vec![
                        ("content-type", content_type.to_string()),
                        ("host", host_header(&url)?),
                        ("x-amz-content-sha256", payload_hash.clone()),
                        ("x-amz-date", amz_date.clone()),
                    ],
                    payload_hash: &payload_hash,
                },
                now,
            )?;
            request = request
                .header("x-amz-content-sha256", payload_hash)
                .header("x-amz-date", amz_date)
                .header(reqwest::header::AUTHORIZATION, authorization);
        }

        let request = request.body(body);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, bucket, object_name, "Object storage rejected upload");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(bucket, object_name, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        object_url(&self.public_base, bucket, object_name).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory implementation of ObjectStorage (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with [`StorageError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn get(&self, bucket: &str, object_name: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&format!("{}/{}", bucket, object_name))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        file: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory storage set to fail".into()));
        }

        let bytes = tokio::fs::read(file).await?;
        self.objects.write().await.insert(
            format!("{}/{}", bucket, object_name),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!("memory://{}/{}", bucket, object_name)
    }
}
