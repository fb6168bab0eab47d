use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Collection, Entity, Product};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL: {url}")]
    InvalidUrl { url: String },

    #[error("catalog source must be served over http(s), got '{url}' (local files cannot be fetched)")]
    NotHttp { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: u16,
    },

    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape from {url}: {message}")]
    Shape { url: String, message: String },
}

/// How an update reaches the backend. The two admin pages disagree, and the
/// client cannot know which one the backend expects, so callers choose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// `PATCH` with only the changed fields.
    #[default]
    Patch,
    /// `GET` the current record, overlay the changed fields, `PUT` the whole
    /// object back.
    Replace,
}

impl UpdateMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "patch" | "partial" => Some(Self::Patch),
            "replace" | "put" | "full" => Some(Self::Replace),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UpdateMode::Patch => "patch",
            UpdateMode::Replace => "replace",
        }
    }
}

/// Single-request operations against a collection endpoint. No retries, no
/// backoff; every failure goes straight back to the caller.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>, ClientError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Value, ClientError>;

    async fn create(&self, collection: Collection, data: Value) -> Result<Value, ClientError>;

    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, ClientError>;

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Value, ClientError>;

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), ClientError>;
}

pub async fn list<T, B>(backend: &B) -> Result<Vec<T>, ClientError>
where
    T: Entity,
    B: Backend + ?Sized,
{
    let raw = backend.list(T::COLLECTION).await?;
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|source| ClientError::Decode {
                url: format!("/{}", T::COLLECTION),
                source,
            })
        })
        .collect()
}

pub async fn get<T, B>(backend: &B, id: &str) -> Result<T, ClientError>
where
    T: Entity,
    B: Backend + ?Sized,
{
    let raw = backend.get(T::COLLECTION, id).await?;
    serde_json::from_value(raw).map_err(|source| ClientError::Decode {
        url: format!("/{}/{}", T::COLLECTION, id),
        source,
    })
}

/// Applies `fields` to `collection/id` using the requested update mode.
pub async fn update<B>(
    backend: &B,
    collection: Collection,
    id: &str,
    fields: Map<String, Value>,
    mode: UpdateMode,
) -> Result<Value, ClientError>
where
    B: Backend + ?Sized,
{
    match mode {
        UpdateMode::Patch => backend.patch(collection, id, fields).await,
        UpdateMode::Replace => {
            let mut current = backend.get(collection, id).await?;
            let object = current.as_object_mut().ok_or_else(|| ClientError::Shape {
                url: format!("/{collection}/{id}"),
                message: "expected a JSON object".to_string(),
            })?;
            for (key, value) in fields {
                object.insert(key, value);
            }
            object
                .entry("id")
                .or_insert_with(|| Value::String(id.to_string()));
            backend.replace(collection, id, current).await
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HttpOptions {
    /// None leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// When false, mutation responses are accepted whatever their status.
    /// Reads are always checked.
    pub check_status: bool,
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
    check_status: bool,
}

impl HttpBackend {
    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self, ClientError> {
        let base_url = sanitize_base_url(base_url)?;
        let client = build_client(options.timeout)?;
        Ok(Self {
            base_url,
            client,
            check_status: options.check_status,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, collection: Collection, id: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
            })?;
            segments.pop_if_empty().push(collection.path());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        checked: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let mut req = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|source| ClientError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;
        if checked && !resp.status().is_success() {
            return Err(ClientError::Status {
                method,
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }

    async fn read_json(url: &Url, resp: reqwest::Response) -> Result<Value, ClientError> {
        let method = Method::GET;
        let bytes = resp.bytes().await.map_err(|source| ClientError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Mutation bodies are informational; an empty or non-JSON body is Null.
    async fn read_json_lenient(resp: reqwest::Response) -> Value {
        match resp.bytes().await {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>, ClientError> {
        let url = self.url(collection, None)?;
        let resp = self.send(Method::GET, url.clone(), None, true).await?;
        match Self::read_json(&url, resp).await? {
            Value::Array(items) => Ok(items),
            other => Err(ClientError::Shape {
                url: url.to_string(),
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Value, ClientError> {
        let url = self.url(collection, Some(id))?;
        let resp = self.send(Method::GET, url.clone(), None, false).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(ClientError::Status {
                method: Method::GET,
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Self::read_json(&url, resp).await
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<Value, ClientError> {
        let url = self.url(collection, None)?;
        let resp = self
            .send(Method::POST, url, Some(&data), self.check_status)
            .await?;
        Ok(Self::read_json_lenient(resp).await)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url(collection, Some(id))?;
        let body = Value::Object(fields);
        let resp = self
            .send(Method::PATCH, url, Some(&body), self.check_status)
            .await?;
        Ok(Self::read_json_lenient(resp).await)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Value, ClientError> {
        let url = self.url(collection, Some(id))?;
        let resp = self
            .send(Method::PUT, url, Some(&data), self.check_status)
            .await?;
        Ok(Self::read_json_lenient(resp).await)
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), ClientError> {
        let url = self.url(collection, Some(id))?;
        self.send(Method::DELETE, url, None, self.check_status)
            .await?;
        Ok(())
    }
}

/// A static product snapshot (e.g. `db.json`) served over HTTP.
#[derive(Clone, Debug)]
pub struct CatalogSource {
    url: Url,
    client: reqwest::Client,
}

impl CatalogSource {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let trimmed = url.trim();
        let parsed = Url::parse(trimmed).map_err(|_| ClientError::NotHttp {
            url: trimmed.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::NotHttp {
                url: trimmed.to_string(),
            });
        }
        Ok(Self {
            url: parsed,
            client: build_client(timeout)?,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Accepts either a bare array of products or an object with a
    /// `products` array (json-server's db layout).
    pub async fn fetch(&self) -> Result<Vec<Product>, ClientError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: Method::GET,
                url: self.url.to_string(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(ClientError::Status {
                method: Method::GET,
                url: self.url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let doc = HttpBackend::read_json(&self.url, resp).await?;
        parse_catalog(doc).map_err(|message| ClientError::Shape {
            url: self.url.to_string(),
            message,
        })
    }
}

pub fn parse_catalog(doc: Value) -> Result<Vec<Product>, String> {
    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("products") {
            Some(Value::Array(items)) => items,
            _ => return Err("expected an array of products".to_string()),
        },
        other => {
            return Err(format!(
                "expected an array of products, got {}",
                json_kind(&other)
            ))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value::<Product>(item).map_err(|e| format!("product #{idx}: {e}"))
        })
        .collect()
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|source| ClientError::HttpClientBuild { source })
}

fn sanitize_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut base = raw.trim().to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let url = Url::parse(&base).map_err(|_| ClientError::InvalidUrl {
        url: raw.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
